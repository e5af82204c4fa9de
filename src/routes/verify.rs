use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::db;
use crate::db::invites::ConsumeOutcome;
use crate::error::AppError;
use crate::middleware::client::ClientId;
use crate::models::invite::VerifyInvite;
use crate::state::AppState;
use crate::validation::validate_code;

/// Exchanges an unused invite code for a session token.
///
/// Validation and rate limiting run before the store is touched. Unknown
/// and already-used codes get the same response; only the log says which.
pub async fn verify_invite(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let input: VerifyInvite = super::parse_json_body(&body)?;

    let raw = match input.code {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
    .ok_or_else(|| AppError::InvalidInput("please provide an invite code".to_string()))?;

    let code = validate_code(&raw).map_err(|e| {
        tracing::debug!(%client, "malformed invite code: {e}");
        AppError::InvalidInput("invalid invite code format".to_string())
    })?;

    let policy = state.verify_policy;
    let decision = state
        .rate_limiter
        .check_and_consume(&client, policy.limit, policy.window);
    if !decision.allowed {
        tracing::warn!(%client, "invite verification rate limited");
        return Err(AppError::RateLimited {
            retry_after: decision.retry_after.as_secs().max(1),
        });
    }

    // A code must never be burnt when no token can be issued for it.
    state.tokens.secret()?;

    match db::invites::find_and_consume(&state.db, &code).await? {
        ConsumeOutcome::Consumed(invite) => {
            tracing::info!(code = %invite.code, %client, "invite code consumed");
        }
        ConsumeOutcome::NotFound => {
            tracing::warn!(%code, %client, "verification failed: unknown invite code");
            return Err(AppError::InvalidCode);
        }
        ConsumeOutcome::AlreadyUsed => {
            tracing::warn!(%code, %client, "verification failed: invite code already used");
            return Err(AppError::InvalidCode);
        }
    }

    let token = state.tokens.issue()?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "verified, welcome",
        "token": token,
    })))
}
