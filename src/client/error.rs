use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::client::transport::HttpResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    /// No response was received.
    NetworkError,
    /// A non-2xx response other than an authentication failure.
    HttpError,
    /// The body did not match the requested response kind.
    DecodeError,
    /// 401 that survived a failed or skipped refresh.
    Unauthorized,
    /// Short-circuited because an earlier refresh failed.
    SessionExpired,
    Timeout,
    Cancelled,
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::HttpError => "HTTP_ERROR",
            Self::DecodeError => "DECODE_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    fn new(code: ApiErrorCode, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NetworkError, None, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::DecodeError, None, message)
    }

    pub fn timeout() -> Self {
        Self::new(ApiErrorCode::Timeout, None, "request timed out")
    }

    pub fn cancelled() -> Self {
        Self::new(ApiErrorCode::Cancelled, None, "request cancelled")
    }

    pub fn session_expired() -> Self {
        Self::new(
            ApiErrorCode::SessionExpired,
            Some(401),
            "session expired, sign in again",
        )
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Unauthorized, Some(401), message)
    }

    /// Builds an error from a non-2xx response, picking up the server's
    /// `error`/`message`, `code` and `details` fields when the body is JSON.
    pub fn from_response(response: &HttpResponse) -> Self {
        let code = if response.status == 401 {
            ApiErrorCode::Unauthorized
        } else {
            ApiErrorCode::HttpError
        };

        let parsed: Option<Value> = serde_json::from_slice(&response.body).ok();
        let message = parsed
            .as_ref()
            .and_then(|body| {
                body.get("error")
                    .or_else(|| body.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .or_else(|| {
                let text = String::from_utf8_lossy(&response.body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| format!("HTTP {}", response.status));

        let mut details = parsed
            .as_ref()
            .and_then(|body| body.get("details"))
            .cloned();
        if let Some(server_code) = parsed
            .as_ref()
            .and_then(|body| body.get("code"))
            .and_then(Value::as_str)
        {
            details = Some(match details {
                Some(Value::Object(mut map)) => {
                    map.insert("serverCode".to_string(), Value::from(server_code));
                    Value::Object(map)
                }
                Some(other) => serde_json::json!({ "serverCode": server_code, "details": other }),
                None => serde_json::json!({ "serverCode": server_code }),
            });
        }

        Self {
            status: Some(response.status),
            code,
            message,
            details,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(
            self.code,
            ApiErrorCode::Unauthorized | ApiErrorCode::SessionExpired
        )
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}
