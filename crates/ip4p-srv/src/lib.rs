//! ip4p-srv: HTTPS redirector for hosts behind NAT-mapped IPv4 endpoints.
//!
//! A host whose public IPv4 endpoint changes (port mapping, CGNAT) publishes
//! it through DDNS as an IP4P AAAA record. This server gives that host a
//! stable URL:
//!
//! ```text
//! GET /u1  ->  mappings[u1] = example.com
//!          ->  AAAA example.com = 2001::1bbc:10b0:201e
//!          ->  301 Location: https://16.176.32.30:7100
//! ```
//!
//! The [`router::Router`] does lookup, resolution and decoding; the
//! [`server`] module owns sockets, TLS and HTTP framing.

pub mod config;
pub mod error;
pub mod resolver;
pub mod router;
pub mod server;
pub mod tls;

// Re-exports for convenience.
pub use config::Config;
pub use error::{ResolveError, RouteError, SrvError};
pub use resolver::{DnsResolver, Resolve, StaticResolver};
pub use router::{RedirectTarget, Router};

/// Result type for ip4p-srv operations.
pub type Result<T> = std::result::Result<T, SrvError>;
