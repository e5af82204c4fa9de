use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

/// Stateless check of a session token issued by the verification endpoint.
pub async fn check_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify(token)?;
    let to_rfc3339 = |secs: i64| {
        Utc.timestamp_opt(secs, 0)
            .single()
            .map(|t| t.to_rfc3339())
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "authenticated": claims.authenticated,
        "issuedAt": to_rfc3339(claims.iat),
        "expiresAt": to_rfc3339(claims.exp),
    })))
}
