//! Normalized error types for directory lookups.
//!
//! Hides reqwest details behind a few categories callers can act on.

/// Normalized error for directory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The directory could not be reached.
    #[error("directory transport error: {0}")]
    Transport(String),

    /// The directory answered with a non-success status.
    #[error("directory API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("directory decode error: {0}")]
    Decode(String),

    /// The request was rejected before being sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The directory is configured off or deliberately unavailable.
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::Decode(value.to_string());
        }
        match value.status() {
            Some(status) => Self::Api {
                status: status.as_u16(),
                message: value.to_string(),
            },
            None => Self::Transport(value.to_string()),
        }
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}
