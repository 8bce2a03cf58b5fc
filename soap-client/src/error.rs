//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication.
///
/// Faults reported by the remote device are not errors in this sense; they
/// are returned as data on the invocation result so the caller can inspect
/// the code and description the device chose to report.
#[derive(Debug, Error)]
pub enum SoapError {
    /// Network or HTTP communication error
    #[error("network/HTTP error: {0}")]
    Network(String),

    /// The response body was not a recognizable SOAP document
    #[error("SOAP parse error: {0}")]
    Parse(String),

    /// Fewer input values were supplied than the action declares in-arguments
    #[error("not enough input values: action declares {expected} in-arguments, got {got}")]
    NotEnoughArguments { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, SoapError>;
