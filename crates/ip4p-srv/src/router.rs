//! Redirect routing: identifier -> domain -> IP4P record -> HTTPS target.
//!
//! Each call is an independent transaction. The mapping table is shared
//! read-only, and resolution is the only step that awaits.

use std::borrow::Cow;
use std::net::Ipv6Addr;
use std::sync::Arc;

use ip4p_core::{DecodedEndpoint, MappingTable};
use tracing::{info, warn};

use crate::error::RouteError;
use crate::resolver::Resolve;

/// Decoder applied to the selected address.
pub type Decoder = fn(&str) -> ip4p_core::Result<DecodedEndpoint>;

/// Where a client should be permanently redirected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    endpoint: DecodedEndpoint,
    location: String,
}

impl RedirectTarget {
    fn new(endpoint: DecodedEndpoint) -> Self {
        Self {
            location: endpoint.redirect_url(),
            endpoint,
        }
    }

    /// Value of the `Location` header, e.g. `https://16.176.32.30:7100`.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Decoded IPv4 endpoint behind the location.
    #[must_use]
    pub const fn endpoint(&self) -> DecodedEndpoint {
        self.endpoint
    }
}

/// Routes identifiers to redirect targets.
pub struct Router<R> {
    mappings: Arc<MappingTable>,
    resolver: R,
    decoder: Decoder,
}

impl<R: Resolve> Router<R> {
    /// Create a router using the standard IP4P decoder.
    pub fn new(mappings: impl Into<Arc<MappingTable>>, resolver: R) -> Self {
        Self {
            mappings: mappings.into(),
            resolver,
            decoder: ip4p_core::decode,
        }
    }

    /// Replace the decoder applied to resolved addresses.
    #[must_use]
    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// The mapping table this router serves.
    #[must_use]
    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    /// Resolve `identifier` to a redirect target.
    ///
    /// One resolution attempt is made; the first IPv6-form address wins and
    /// IPv4 results are ignored. The address is rewritten in canonical
    /// compressed form before decoding, so `2001:0:0:0:0:1bbc:10b0:201e` and
    /// `2001::1bbc:10b0:201e` route the same way.
    pub async fn route(&self, identifier: &str) -> Result<RedirectTarget, RouteError> {
        if identifier.is_empty() {
            return Err(RouteError::BadRequest);
        }

        let domain = self.mappings.lookup(identifier).ok_or_else(|| {
            warn!(identifier, "unknown identifier");
            RouteError::NotFound(identifier.to_string())
        })?;

        let addresses = self.resolver.resolve(domain).await.map_err(|e| {
            warn!(identifier, domain, error = %e, "resolution failed");
            RouteError::ResolutionFailed(e.to_string())
        })?;

        let address = select_ipv6(&addresses).ok_or_else(|| {
            warn!(identifier, domain, ?addresses, "no IPv6 address in resolver answer");
            RouteError::ResolutionFailed(format!("no IPv6 address found for {domain}"))
        })?;

        let canonical = canonicalize(address);
        let endpoint = (self.decoder)(&*canonical).map_err(|e| {
            warn!(identifier, domain, address, kind = e.kind(), error = %e, "IP4P decode failed");
            RouteError::DecodeFailed(e)
        })?;

        let target = RedirectTarget::new(endpoint);
        info!(
            identifier,
            domain,
            address,
            location = target.location(),
            "redirecting"
        );

        Ok(target)
    }
}

/// RFC 5952 text for anything that parses as IPv6; other text is left as is
/// and the decoder reports what is wrong with it.
fn canonicalize(address: &str) -> Cow<'_, str> {
    address
        .parse::<Ipv6Addr>()
        .map_or(Cow::Borrowed(address), |ip| Cow::Owned(ip.to_string()))
}

/// First address in textual IPv6 form.
fn select_ipv6(addresses: &[String]) -> Option<&str> {
    addresses
        .iter()
        .map(String::as_str)
        .find(|address| address.contains(':'))
}
