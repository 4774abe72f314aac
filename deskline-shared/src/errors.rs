use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Client error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Transport/server errors shared by every client
/// - E1xxx: Session and authentication errors
/// - E5xxx: Notification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ServiceUnavailable,
    BadRequest,
    Conflict,

    // Session (E1xxx)
    SessionMissing,
    SessionExpired,
    TokenInvalid,

    // Notification (E5xxx)
    NotificationNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",
            Self::Conflict => "E0010",

            // Session
            Self::SessionMissing => "E1001",
            Self::SessionExpired => "E1002",
            Self::TokenInvalid => "E1003",

            // Notification
            Self::NotificationNotFound => "E5001",
        }
    }

    /// Map an HTTP status returned by the backend to the closest code.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::BadRequest,
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::Conflict,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Self::ServiceUnavailable,
            _ => Self::InternalError,
        }
    }

    /// Codes that mean the session can no longer be used.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::SessionMissing | Self::SessionExpired | Self::TokenInvalid
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn session_missing() -> Self {
        Self::new(ErrorCode::SessionMissing, "no active session")
    }

    pub fn session_expired() -> Self {
        Self::new(ErrorCode::SessionExpired, "session has expired")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Build an error from a non-success backend response.
    ///
    /// The body is parsed as the shared error envelope when possible, then as
    /// a `{"detail": ...}` object, and otherwise kept verbatim as the message.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let code = ErrorCode::from_status(status);

        if let Ok(envelope) = serde_json::from_str::<ApiErrorResponse>(body) {
            return Self::Known {
                code,
                message: envelope.error.message,
                details: envelope.error.details,
            };
        }

        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(detail) = map.get("detail") {
                let message = match detail {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Self::new(code, message);
            }
        }

        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.trim().to_string()
        };

        Self::with_details(code, message, serde_json::json!({ "status": status.as_u16() }))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Http(err) => match err.status() {
                Some(status) => ErrorCode::from_status(status),
                None => ErrorCode::ServiceUnavailable,
            },
            AppError::Decode(_) | AppError::Storage(_) | AppError::Internal(_) => {
                ErrorCode::InternalError
            }
            AppError::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// 401s and missing/expired sessions. These must reach the auth-error handler.
    pub fn is_auth_failure(&self) -> bool {
        self.code().is_auth()
    }

    /// Failures that the next poll tick or user interaction may clear on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Http(_) => true,
            AppError::Known { code, .. } => matches!(
                code,
                ErrorCode::ServiceUnavailable | ErrorCode::RateLimited | ErrorCode::InternalError
            ),
            _ => false,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
