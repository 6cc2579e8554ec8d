use reqwest::{Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Failure of a call against a backend REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{status}: {}", .message.as_deref().unwrap_or("request failed"))]
    Status {
        status: StatusCode,
        /// Message extracted from the server's error payload, if any.
        message: Option<String>,
    },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        ApiError::Status { status, message }
    }

    /// HTTP status of the failed call. Transport errors carry one only when
    /// reqwest produced it from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::Decode(_) => None,
        }
    }

    /// True for explicit authentication or authorization rejections (401/403).
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }

    /// Message the server put in its error payload.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text suitable for showing to an end user: the server's message when
    /// it sent one, otherwise the error's own description.
    pub fn user_message(&self) -> String {
        self.server_message()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

/// Pass successful responses through; turn anything else into
/// [`ApiError::Status`] with the server's message extracted from the body.
pub async fn error_for_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = %status, "Backend returned error status");

    Err(ApiError::from_status(status, extract_message(&body)))
}

/// Pull a human-readable message out of an error body. Understands
/// `{"message": ..}`, `{"error": ..}` and `{"error": {"message": ..}}`.
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let candidate = match value.get("message") {
        Some(Value::String(msg)) => Some(msg.clone()),
        _ => match value.get("error") {
            Some(Value::String(msg)) => Some(msg.clone()),
            Some(Value::Object(obj)) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        },
    };

    candidate.filter(|msg| !msg.trim().is_empty())
}
