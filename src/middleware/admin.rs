use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;
use crate::validation::validate_admin_credential;

/// Proof that the request carried the configured admin credential.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

/// Pulls the credential out of `Authorization`, with or without a `Bearer ` prefix.
fn presented_credential(parts: &Parts) -> Option<String> {
    let header = parts.headers.get("Authorization")?.to_str().ok()?.trim();
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    Some(token.to_string())
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let presented = presented_credential(parts);
        let authorized =
            validate_admin_credential(presented.as_deref(), state.admin_token.as_deref());

        async move {
            if authorized {
                Ok(AdminAuth)
            } else {
                tracing::warn!("rejected admin request with missing or invalid credential");
                Err(AppError::Unauthorized)
            }
        }
    }
}
