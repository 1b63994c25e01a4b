use thiserror::Error;

/// Every failure seen by callers: transport, backend-reported, or a client-side
/// precondition rejected before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },

    #[error("{0}")]
    Precondition(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        ApiError::Backend {
            status,
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        ApiError::Precondition(message.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True when the request never left the client.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ApiError::Precondition(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(format!("network error: {err}"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
