//! Error types for the ip4p-srv redirector.

use ip4p_core::DecodeError;
use thiserror::Error;

/// Errors that stop the server from starting or serving.
#[derive(Error, Debug)]
pub enum SrvError {
    /// Configuration is invalid or could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Certificate or key material could not be loaded.
    #[error("tls error: {0}")]
    Tls(String),

    /// DNS resolver could not be constructed.
    #[error("resolver error: {0}")]
    Resolver(String),

    /// Listener failed to bind or accept.
    #[error("server error: {0}")]
    Server(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a [`crate::Resolve`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to resolve {domain}: {reason}")]
pub struct ResolveError {
    /// Domain that was looked up.
    pub domain: String,
    /// Resolver-specific reason.
    pub reason: String,
}

impl ResolveError {
    pub fn new(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            reason: reason.into(),
        }
    }
}

/// Classified failure of a single redirect request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Request path carried no identifier.
    #[error("identifier required")]
    BadRequest,

    /// Percent-decoded path is not valid UTF-8.
    #[error("identifier is not valid UTF-8")]
    InvalidIdentifier,

    /// Identifier is not in the mapping table.
    #[error("identifier not found: {0}")]
    NotFound(String),

    /// Lookup failed or returned no IPv6-form address.
    #[error("resolution failed: {0}")]
    ResolutionFailed(String),

    /// The resolved address is not a valid IP4P address.
    #[error("decode failed: {0}")]
    DecodeFailed(#[from] DecodeError),
}

impl RouteError {
    /// HTTP status code for this failure.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest | Self::InvalidIdentifier => 400,
            Self::NotFound(_) => 404,
            Self::ResolutionFailed(_) | Self::DecodeFailed(_) => 500,
        }
    }

    /// Message safe to return to clients. Never includes addresses or parse details.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "identifier required",
            Self::InvalidIdentifier => "invalid identifier",
            Self::NotFound(_) => "identifier not found",
            Self::ResolutionFailed(_) => "failed to resolve address record",
            Self::DecodeFailed(_) => "failed to parse IP4P address",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RouteError::BadRequest.status_code(), 400);
        assert_eq!(RouteError::InvalidIdentifier.status_code(), 400);
        assert_eq!(RouteError::NotFound("u1".into()).status_code(), 404);
        assert_eq!(
            RouteError::ResolutionFailed("example.com".into()).status_code(),
            500
        );
        assert_eq!(
            RouteError::DecodeFailed(DecodeError::InvalidPort("zz".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_public_message_hides_details() {
        let err = RouteError::DecodeFailed(DecodeError::MalformedAddress(
            "no '::' elision in '2001:0:0:0:0:1:2:3'".into(),
        ));
        assert!(err.to_string().contains("2001:0:0:0:0:1:2:3"));
        assert!(!err.public_message().contains("2001"));
        assert_eq!(err.public_message(), "failed to parse IP4P address");
    }

    #[test]
    fn test_decode_error_converts() {
        let err: RouteError = DecodeError::InvalidOctet("g".into()).into();
        assert!(matches!(
            err,
            RouteError::DecodeFailed(DecodeError::InvalidOctet(_))
        ));
    }
}
