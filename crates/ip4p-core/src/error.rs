use thiserror::Error;

/// Result type alias for decoder operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur while decoding an IP4P address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Elision marker missing or repeated, or the hextet count is not 8
    #[error("malformed address: {0}")]
    MalformedAddress(String),

    /// Port hextet is not hex or does not fit in 16 bits
    #[error("invalid port field: {0}")]
    InvalidPort(String),

    /// One of the IPv4 octet groups is not valid hex
    #[error("invalid IPv4 octet field: {0}")]
    InvalidOctet(String),
}

impl DecodeError {
    /// Short, stable name of the error kind, suitable for log fields
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedAddress(_) => "malformed_address",
            Self::InvalidPort(_) => "invalid_port",
            Self::InvalidOctet(_) => "invalid_octet",
        }
    }
}
