use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of the user store.
#[derive(Debug, Error)]
pub enum UserError {
    /// Missing or malformed field in a create/update body.
    #[error("{0}")]
    Validation(String),

    /// Path identifier that the storage layer cannot address.
    #[error("invalid user id: {0}")]
    InvalidIdentifier(String),

    /// Anything raised by the storage driver. Not recovered locally.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] anyhow::Error),
}

impl UserError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UserError::Validation(_) | UserError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            UserError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// How failures are mapped onto HTTP status codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatusMode {
    /// 400 for validation and identifier failures, 503 for storage failures.
    #[default]
    Conventional,
    /// Always 200; the failure is only visible in the body.
    Legacy,
}

impl std::str::FromStr for ErrorStatusMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conventional" => Ok(Self::Conventional),
            "legacy" => Ok(Self::Legacy),
            other => anyhow::bail!("unknown ERROR_STATUS_MODE {:?}", other),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// A `UserError` bound to the status mode it should be rendered with.
#[derive(Debug)]
pub struct ApiError {
    pub error: UserError,
    pub mode: ErrorStatusMode,
}

impl ApiError {
    pub fn new(error: UserError, mode: ErrorStatusMode) -> Self {
        Self { error, mode }
    }

    pub fn status(&self) -> StatusCode {
        match self.mode {
            ErrorStatusMode::Conventional => self.error.status(),
            ErrorStatusMode::Legacy => StatusCode::OK,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            message: self.error.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventional_statuses() {
        let cases = [
            (UserError::validation("firstName is required"), StatusCode::BAD_REQUEST),
            (UserError::InvalidIdentifier("x".into()), StatusCode::BAD_REQUEST),
            (
                UserError::StorageUnavailable(anyhow::anyhow!("connection refused")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, expected) in cases {
            let api = ApiError::new(error, ErrorStatusMode::Conventional);
            assert_eq!(api.status(), expected);
        }
    }

    #[test]
    fn legacy_mode_is_always_ok() {
        let api = ApiError::new(
            UserError::StorageUnavailable(anyhow::anyhow!("timeout")),
            ErrorStatusMode::Legacy,
        );
        assert_eq!(api.into_response().status(), StatusCode::OK);
    }

    #[test]
    fn storage_message_keeps_context() {
        let err = UserError::StorageUnavailable(
            anyhow::anyhow!("connection refused").context("insert user"),
        );
        assert_eq!(err.to_string(), "storage unavailable: insert user");
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("LEGACY".parse::<ErrorStatusMode>().unwrap(), ErrorStatusMode::Legacy);
        assert_eq!(
            " conventional ".parse::<ErrorStatusMode>().unwrap(),
            ErrorStatusMode::Conventional
        );
        assert!("teapot".parse::<ErrorStatusMode>().is_err());
    }
}
