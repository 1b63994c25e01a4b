use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::common::{ApiEnvelope, ApiError, Result};

use super::transport::{HttpRequest, HttpResponse, Method, Transport};

/// Talks to the backend and unwraps the response envelope. Every caller gets
/// either the decoded `data` field or a single normalized [`ApiError`].
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let request_id = Uuid::new_v4().to_string();
        log::debug!("{method} {path} [{request_id}]");

        let response = match self
            .transport
            .send(HttpRequest {
                method,
                path: path.to_string(),
                body,
                request_id: request_id.clone(),
            })
            .await
        {
            Ok(response) => response,
            Err(err) => {
                log::warn!("{method} {path} [{request_id}] transport failure: {err}");
                return Err(err);
            }
        };

        decode_response(method, path, response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::Get, path, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request(Method::Post, path, Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request(Method::Put, path, Some(body)).await
    }

    /// `PUT` without a request body, used for state transitions.
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::Put, path, None).await
    }

    /// An empty success response is a successful deletion.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request::<Value>(Method::Delete, path, None).await?;
        Ok(())
    }
}

fn decode_response<T: DeserializeOwned>(
    method: Method,
    path: &str,
    response: HttpResponse,
) -> Result<T> {
    let status = response.status;

    if response.body.trim().is_empty() {
        if response.is_success() {
            return decode_data(None);
        }
        return Err(ApiError::backend(
            Some(status),
            fallback_message(method, path, status),
        ));
    }

    let envelope = match serde_json::from_str::<ApiEnvelope<Value>>(&response.body) {
        Ok(envelope) => envelope,
        Err(err) if response.is_success() => return Err(err.into()),
        Err(_) => {
            return Err(ApiError::backend(
                Some(status),
                fallback_message(method, path, status),
            ));
        }
    };

    if !response.is_success() || !envelope.success {
        let message = envelope
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback_message(method, path, status));
        return Err(ApiError::backend(Some(status), message));
    }

    decode_data(envelope.data)
}

fn decode_data<T: DeserializeOwned>(data: Option<Value>) -> Result<T> {
    Ok(serde_json::from_value(data.unwrap_or(Value::Null))?)
}

fn fallback_message(method: Method, path: &str, status: u16) -> String {
    if (200..300).contains(&status) {
        format!("{method} {path} was rejected by the server")
    } else {
        format!("{method} {path} failed with status {status}")
    }
}
