//! Core types for the IP4P redirector.
//!
//! This crate holds everything that does not touch the network:
//!
//! - **Decoder**: [`expand`] and [`decode`] turn an IP4P-encoded IPv6 address
//!   into a [`DecodedEndpoint`] (IPv4 address + port)
//! - **Mappings**: the immutable [`MappingTable`] of identifier to domain
//! - **Errors**: [`DecodeError`] for every way an address can be rejected
//!
//! # Example
//!
//! ```rust
//! use ip4p_core::decode;
//!
//! let endpoint = decode("2001::1bbc:10b0:201e").unwrap();
//! assert_eq!(endpoint.redirect_url(), "https://16.176.32.30:7100");
//! ```

#![doc(html_root_url = "https://docs.rs/ip4p-core/0.1.0")]

mod error;
pub mod ip4p;
pub mod mapping;

pub use error::{DecodeError, Result};
pub use ip4p::{decode, encode, expand, DecodedEndpoint};
pub use mapping::{Mapping, MappingTable};
