use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::db;
use crate::db::invites::MAX_BATCH;
use crate::error::AppError;
use crate::middleware::admin::AdminAuth;
use crate::models::invite::CreateInvites;
use crate::state::AppState;
use crate::validation::validate_code;

pub async fn list_invites(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<Value>, AppError> {
    let invites = db::invites::list_all(&state.db).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": invites,
    })))
}

pub async fn create_invites(
    State(state): State<AppState>,
    _admin: AdminAuth,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let input: CreateInvites = super::parse_json_body(&body)?;

    // An empty or null `code` falls through to the batch branch.
    let explicit = input
        .code
        .filter(|v| !v.is_null() && v.as_str() != Some(""));
    if let Some(raw) = explicit {
        let code = validate_code(&raw).map_err(|e| AppError::InvalidInput(e.to_string()))?;
        let invite = db::invites::create(&state.db, &code).await?;
        tracing::info!(code = %invite.code, "admin created invite code");
        return Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "invite code created",
                "code": invite.code,
            })),
        ));
    }

    let count = match input.count {
        None | Some(Value::Null) => {
            return Err(AppError::MissingParameter(
                "provide either `code` or `count`".to_string(),
            ))
        }
        Some(Value::Number(n)) => batch_count(&n).ok_or_else(|| {
            AppError::InvalidInput(format!("count must be an integer between 1 and {MAX_BATCH}"))
        })?,
        Some(_) => return Err(AppError::InvalidInput("count must be a number".to_string())),
    };

    let codes = db::invites::create_batch(&state.db, count as usize).await?;
    tracing::info!("admin created {} invite code(s)", codes.len());

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": format!("created {} invite code(s)", codes.len()),
            "codes": codes,
        })),
    ))
}

/// Accepts integers and integral floats such as `3.0` within `1..=MAX_BATCH`.
fn batch_count(n: &serde_json::Number) -> Option<u64> {
    let count = match n.as_u64() {
        Some(c) => c,
        None => {
            let f = n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 1.0)?;
            f as u64
        }
    };
    (1..=MAX_BATCH as u64).contains(&count).then_some(count)
}
