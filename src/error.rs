use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::providers::ProviderError;

/// Error taxonomy exposed to callers in the `error_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    AuthenticationError,
    RateLimitError,
    InvalidRequestError,
    ApiError,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {0}")]
    ValidationErrors(#[from] validator::ValidationErrors),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::AuthFailed(msg) => AppError::AuthenticationFailed(msg),
            ProviderError::InvalidRequest(msg) => AppError::InvalidRequest(msg),
            ProviderError::RateLimited(msg) => AppError::RateLimited(msg),
            ProviderError::Api(msg) => AppError::Upstream(msg),
            ProviderError::Timeout(msg) => AppError::Upstream(msg),
            ProviderError::Network(msg) => AppError::Upstream(msg),
            ProviderError::NotConfigured(msg) => AppError::Upstream(msg),
        }
    }
}

impl AppError {
    /// Kind reported to the caller in the error body.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) | AppError::ValidationErrors(_) => ErrorKind::ValidationError,
            AppError::InvalidRequest(_) => ErrorKind::InvalidRequestError,
            AppError::AuthenticationFailed(_) => ErrorKind::AuthenticationError,
            AppError::RateLimited(_) => ErrorKind::RateLimitError,
            AppError::Upstream(_) | AppError::ConfigError(_) | AppError::InternalError(_) => {
                ErrorKind::ApiError
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::ValidationError | ErrorKind::InvalidRequestError => StatusCode::BAD_REQUEST,
            ErrorKind::AuthenticationError => StatusCode::UNAUTHORIZED,
            ErrorKind::RateLimitError => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::ApiError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            success: bool,
            error: String,
            error_type: ErrorKind,
        }

        let status = self.status();
        let kind = self.kind();

        // Don't leak internal causes to callers for 500s.
        let message = match &self {
            AppError::ConfigError(err) | AppError::InternalError(err) => {
                tracing::error!("Internal error: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: message,
                error_type: kind,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_to_expected_kinds() {
        let cases = [
            (
                ProviderError::AuthFailed("bad key".into()),
                ErrorKind::AuthenticationError,
            ),
            (
                ProviderError::InvalidRequest("bad model".into()),
                ErrorKind::InvalidRequestError,
            ),
            (
                ProviderError::RateLimited("slow down".into()),
                ErrorKind::RateLimitError,
            ),
            (ProviderError::Api("boom".into()), ErrorKind::ApiError),
            (
                ProviderError::Timeout("timed out".into()),
                ErrorKind::ApiError,
            ),
            (
                ProviderError::Network("refused".into()),
                ErrorKind::ApiError,
            ),
        ];

        for (provider_err, expected) in cases {
            let app_err = AppError::from(provider_err);
            assert_eq!(app_err.kind(), expected);
        }
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::RateLimitError).unwrap();
        assert_eq!(json, "\"rate_limit_error\"");
    }
}
