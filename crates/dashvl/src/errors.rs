use reqwest::StatusCode;
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Unsupported file format: {extension}. Supported formats: {supported}")]
    UnsupportedFormat {
        extension: String,
        supported: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request failed: {status}\n{body}")]
    Transport { status: StatusCode, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed event stream: {0}")]
    Stream(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render prompt: {0}")]
    Template(#[from] tera::Error),

    #[error("Failed to delete uploaded file {file_id}: {source}")]
    ResourceCleanup {
        file_id: String,
        #[source]
        source: Box<ClientError>,
    },

    #[error("{primary} (cleanup also failed: {cleanup})")]
    CleanupAfterFailure {
        #[source]
        primary: Box<ClientError>,
        cleanup: Box<ClientError>,
    },

    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// The error that caused the request to fail, looking through cleanup wrappers.
    pub fn primary(&self) -> &ClientError {
        match self {
            ClientError::CleanupAfterFailure { primary, .. } => primary.primary(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
