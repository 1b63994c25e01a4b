use serde_json::Value;

use crate::common::{ApiError, NotificationRequest, Result};
use crate::network::ApiClient;

/// Stateless dispatch and preview commands. Both check their preconditions
/// before anything is sent.
#[derive(Clone)]
pub struct NotificationService {
    api: ApiClient,
}

impl NotificationService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn dispatch(&self, request: &NotificationRequest) -> Result<()> {
        check_request(request)?;
        self.api
            .post::<_, Value>("/notificacoes/enviar", request)
            .await?;
        Ok(())
    }

    /// Renders the notification as inert HTML. Only one channel can be
    /// previewed at a time.
    pub async fn preview(&self, request: &NotificationRequest) -> Result<String> {
        check_request(request)?;
        if request.channels.len() != 1 {
            return Err(ApiError::precondition(
                "preview supports exactly one channel",
            ));
        }
        self.api.post("/notificacoes/preview", request).await
    }
}

fn check_request(request: &NotificationRequest) -> Result<()> {
    if request.installment_id <= 0 {
        return Err(ApiError::precondition("an installment must be selected"));
    }
    if request.channels.is_empty() {
        return Err(ApiError::precondition("select at least one channel"));
    }
    Ok(())
}
