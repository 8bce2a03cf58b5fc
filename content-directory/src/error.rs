use thiserror::Error;

/// Errors raised by directory browse operations.
#[derive(Debug, Error)]
pub enum ContentDirectoryError {
    /// The service's action table has no action with this name
    #[error("action '{0}' is not supported by this service")]
    ActionNotSupported(String),

    /// The device reported a fault for the action
    #[error("action '{action}' failed: {message} (code {code})")]
    Fault {
        action: String,
        code: u16,
        message: String,
    },

    /// The response carried fewer output values than the operation needs
    #[error("invalid number of return arguments: {0}")]
    ShortResponse(usize),

    /// A mandatory numeric field holds non-numeric text
    #[error("field '{field}' has invalid number '{value}'")]
    InvalidNumber { field: String, value: String },

    /// The DIDL-Lite payload could not be deserialized
    #[error("DIDL error: {0}")]
    Didl(String),

    /// A non-DIDL XML payload (feature list) could not be parsed
    #[error("XML error: {0}")]
    Xml(String),

    /// A children fetch made no forward progress
    #[error("pagination stalled at {fetched} of {total} entries")]
    PaginationStalled { fetched: u32, total: u32 },

    /// Transport or envelope failure below the action layer
    #[error("SOAP error: {0}")]
    Soap(#[from] soap_client::SoapError),

    /// Boolean or other schema-level value failure
    #[error("schema error: {0}")]
    Schema(#[from] upnp_schema::SchemaError),
}

pub type Result<T> = std::result::Result<T, ContentDirectoryError>;
