use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    /// The tool wrote diagnostics to stderr. Any stderr output counts as
    /// failure, even with a zero exit status.
    #[error("{program} failed: {stderr}")]
    Tool { program: String, stderr: String },

    #[error("{program} exited with status {status:?}")]
    ExitStatus { program: String, status: Option<i32> },

    #[error("Malformed tool output: {0}")]
    MalformedOutput(String),

    #[error("Tool returned no stream URL for {0}")]
    EmptyUrl(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl MetadataError {
    /// Whether a later attempt may succeed.
    ///
    /// A missing tool binary or unparseable output will not fix itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            MetadataError::Tool { .. }
            | MetadataError::ExitStatus { .. }
            | MetadataError::EmptyUrl(_) => true,
            MetadataError::Bridge(BridgeError::NotAvailable(_)) => false,
            MetadataError::Bridge(_) => true,
            MetadataError::MalformedOutput(_)
            | MetadataError::InvalidMetadata(_)
            | MetadataError::Cancelled => false,
        }
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(err: serde_json::Error) -> Self {
        MetadataError::MalformedOutput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
