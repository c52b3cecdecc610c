use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Why a fetch invocation failed to produce usable data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} from {src}")]
    Status { status: u16, src: String },

    #[error("invalid JSON body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("{message}")]
    Other { message: String },
}

impl FetchError {
    #[must_use]
    pub fn status(status: u16, src: impl Into<String>) -> Self {
        Self::Status {
            status,
            src: src.into(),
        }
    }

    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether the failure came from the HTTP layer rather than the body.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}
