use serde::{Deserialize, Serialize};

/// `{success, message, data}` wrapper around every backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// Backend message, if it sent a non-blank one.
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }
}
