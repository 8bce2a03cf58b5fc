use thiserror::Error;

/// Errors raised while fetching or parsing UPnP description documents.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// A required element is absent from the document
    #[error("required element '{0}' is missing")]
    MissingElement(String),

    /// The document declares a spec version beyond UPnP 1.0
    #[error("unsupported UPnP spec version {major}.{minor}")]
    UnsupportedSpecVersion { major: u32, minor: u32 },

    /// An element that must hold a number holds something else
    #[error("element '{element}' has invalid number '{value}'")]
    InvalidNumber { element: String, value: String },

    /// A value that must be a UPnP boolean is neither true-ish nor false-ish
    #[error("invalid UPnP boolean '{0}'")]
    InvalidBoolean(String),

    /// An argument direction other than "in" or "out"
    #[error("invalid argument direction '{0}'")]
    InvalidDirection(String),

    /// A URL could not be parsed or resolved
    #[error("invalid URL: {0}")]
    Url(String),

    /// An HTTP fetch failed or returned a non-success status
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
