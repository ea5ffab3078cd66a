//! IP4P address decoding.
//!
//! IP4P tunnels an IPv4 endpoint through an AAAA record by storing it in the
//! three low-order hextets of the IPv6 address:
//!
//! ```text
//! 2001:0000:0000:0000:0000:XXXX:YYYY:ZZZZ
//!                          port a.b  c.d
//! ```
//!
//! Resolvers hand the address back in compressed text form (`2001::1bbc:10b0:201e`),
//! so decoding starts by undoing the `::` elision.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};

/// Number of hextets in a full IPv6 address.
const HEXTETS: usize = 8;

/// Textual elision marker.
const ELISION: &str = "::";

/// Position of the port field (XXXX).
const PORT_HEXTET: usize = 5;

/// Position of the high IPv4 octets (YYYY).
const HIGH_HEXTET: usize = 6;

/// Position of the low IPv4 octets (ZZZZ).
const LOW_HEXTET: usize = 7;

/// Leading hextet used when encoding.
const IP4P_PREFIX: u16 = 0x2001;

/// An IPv4 endpoint recovered from an IP4P address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecodedEndpoint {
    /// IPv4 address from YYYY:ZZZZ
    pub ipv4: Ipv4Addr,
    /// Port from XXXX
    pub port: u16,
}

impl DecodedEndpoint {
    /// Create an endpoint from its parts.
    #[must_use]
    pub const fn new(ipv4: Ipv4Addr, port: u16) -> Self {
        Self { ipv4, port }
    }

    /// HTTPS URL a client should be redirected to.
    ///
    /// Example: `16.176.32.30:7100` -> `"https://16.176.32.30:7100"`
    #[must_use]
    pub fn redirect_url(&self) -> String {
        format!("https://{self}")
    }
}

impl fmt::Display for DecodedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ipv4, self.port)
    }
}

/// Expand a compressed IPv6 address to its eight colon-separated hextets.
///
/// The input must contain exactly one `::`. Missing hextets are filled with
/// `0`; hextets that are present are kept verbatim (no zero padding).
///
/// Example: `expand("2001::1bbc:10b0:201e")` -> `"2001:0:0:0:0:1bbc:10b0:201e"`
pub fn expand(address: &str) -> Result<String> {
    let (left, right) = address.split_once(ELISION).ok_or_else(|| {
        DecodeError::MalformedAddress(format!("no '::' elision in '{address}'"))
    })?;

    if right.contains(ELISION) {
        return Err(DecodeError::MalformedAddress(format!(
            "more than one '::' elision in '{address}'"
        )));
    }

    let left = split_group(left, address)?;
    let right = split_group(right, address)?;

    let present = left.len() + right.len();
    let missing = HEXTETS.checked_sub(present).ok_or_else(|| {
        DecodeError::MalformedAddress(format!(
            "'{address}' has {present} hextets, at most {HEXTETS} allowed"
        ))
    })?;

    let hextets: Vec<&str> = left
        .into_iter()
        .chain(std::iter::repeat("0").take(missing))
        .chain(right)
        .collect();

    Ok(hextets.join(":"))
}

/// Decode an IP4P address into its IPv4 endpoint.
///
/// Short YYYY/ZZZZ hextets are left-padded, so `f` stands for `000f`.
///
/// Example: `decode("2001::1bbc:10b0:201e")` -> `16.176.32.30:7100`
pub fn decode(address: &str) -> Result<DecodedEndpoint> {
    let expanded = expand(address)?;

    let hextets: Vec<&str> = expanded.split(':').collect();
    if hextets.len() != HEXTETS {
        return Err(DecodeError::MalformedAddress(format!(
            "expected {HEXTETS} hextets in '{expanded}', got {}",
            hextets.len()
        )));
    }

    let port = parse_port(hextets[PORT_HEXTET])?;
    let [a, b] = parse_octets(hextets[HIGH_HEXTET])?;
    let [c, d] = parse_octets(hextets[LOW_HEXTET])?;

    Ok(DecodedEndpoint::new(Ipv4Addr::new(a, b, c, d), port))
}

/// Encode an endpoint as an IP4P address (`2001::XXXX:YYYY:ZZZZ`).
///
/// This is the record a DDNS client publishes; [`decode`] of its textual
/// form yields the endpoint back.
#[must_use]
pub fn encode(endpoint: &DecodedEndpoint) -> Ipv6Addr {
    let [a, b, c, d] = endpoint.ipv4.octets();
    Ipv6Addr::new(
        IP4P_PREFIX,
        0,
        0,
        0,
        0,
        endpoint.port,
        u16::from_be_bytes([a, b]),
        u16::from_be_bytes([c, d]),
    )
}

/// Split one side of the elision into hextets. An empty side has none.
fn split_group<'a>(group: &'a str, address: &str) -> Result<Vec<&'a str>> {
    if group.is_empty() {
        return Ok(Vec::new());
    }

    let hextets: Vec<&str> = group.split(':').collect();
    if hextets.iter().any(|h| h.is_empty()) {
        return Err(DecodeError::MalformedAddress(format!(
            "empty hextet in '{address}'"
        )));
    }

    Ok(hextets)
}

fn is_hex(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_port(field: &str) -> Result<u16> {
    if !is_hex(field) {
        return Err(DecodeError::InvalidPort(format!(
            "'{field}' is not hexadecimal"
        )));
    }

    let value = u32::from_str_radix(field, 16)
        .map_err(|e| DecodeError::InvalidPort(format!("'{field}': {e}")))?;

    u16::try_from(value)
        .map_err(|_| DecodeError::InvalidPort(format!("{value} exceeds 65535")))
}

/// Parse a hextet into two octets, high digits first.
fn parse_octets(field: &str) -> Result<[u8; 2]> {
    if !is_hex(field) {
        return Err(DecodeError::InvalidOctet(format!(
            "'{field}' is not hexadecimal"
        )));
    }
    if field.len() > 4 {
        return Err(DecodeError::InvalidOctet(format!(
            "'{field}' is longer than four hex digits"
        )));
    }

    let padded = format!("{field:0>4}");
    let (high, low) = padded.split_at(2);

    let octet = |group: &str| {
        u8::from_str_radix(group, 16)
            .map_err(|e| DecodeError::InvalidOctet(format!("'{group}' in '{field}': {e}")))
    };

    Ok([octet(high)?, octet(low)?])
}
