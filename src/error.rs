use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Database(sqlx::Error),
    InvalidInput(String),
    MissingParameter(String),
    RateLimited { retry_after: u64 },
    /// Unknown or already-used code. The two are never told apart publicly.
    InvalidCode,
    Unauthorized,
    DuplicateCode(String),
    ServerMisconfigured(String),
    Unexpected(String),
}

/// Server-side detail for a 5xx response, attached as a response extension.
/// Only surfaced to clients when running in development mode.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    pub detail: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidCode => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::DuplicateCode(_) => StatusCode::CONFLICT,
            AppError::ServerMisconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Unexpected(_) => {
                "internal server error, please try again later".to_string()
            }
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::MissingParameter(msg) => msg.clone(),
            AppError::RateLimited { retry_after } => {
                format!("too many attempts, retry after {retry_after}s")
            }
            AppError::InvalidCode => "invalid or already used invite code".to_string(),
            AppError::Unauthorized => "unauthorized".to_string(),
            AppError::DuplicateCode(_) => "invite code already exists".to_string(),
            AppError::ServerMisconfigured(_) => {
                "server configuration error, please contact the administrator".to_string()
            }
        }
    }

    /// Logs and returns the internal detail for server-side failures.
    fn detail(&self) -> Option<String> {
        match self {
            AppError::Database(e) => {
                tracing::error!("database error: {e}");
                Some(e.to_string())
            }
            AppError::ServerMisconfigured(detail) => {
                tracing::error!("server misconfigured: {detail}");
                Some(detail.clone())
            }
            AppError::Unexpected(detail) => {
                tracing::error!("unexpected error: {detail}");
                Some(detail.clone())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "database error: {e}"),
            AppError::DuplicateCode(code) => write!(f, "invite code {code} already exists"),
            AppError::ServerMisconfigured(detail) => write!(f, "server misconfigured: {detail}"),
            AppError::Unexpected(detail) => write!(f, "unexpected error: {detail}"),
            other => f.write_str(&other.message()),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        let detail = self.detail();
        let body = json!({
            "success": false,
            "message": message,
        });

        let mut response = (status, Json(body)).into_response();
        if let AppError::RateLimited { retry_after } = &self {
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(*retry_after));
        }
        if let Some(detail) = detail {
            response
                .extensions_mut()
                .insert(ErrorDetail { message, detail });
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}
