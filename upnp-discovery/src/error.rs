//! Error types for the discovery engine.

use thiserror::Error;

/// Errors that can occur while searching for or monitoring devices.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket creation, configuration or send/receive failures
    #[error("network error: {0}")]
    Network(String),

    /// A datagram that could not be understood
    #[error("parse error: {0}")]
    Parse(String),

    /// A header name that does not satisfy the SSDP header grammar
    #[error("invalid header name '{0}'")]
    InvalidHeader(String),
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
