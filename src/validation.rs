//! Pure input checks for invite codes and the admin credential.

use serde_json::Value;
use subtle::ConstantTimeEq;

pub const MIN_CODE_LEN: usize = 6;
pub const MAX_CODE_LEN: usize = 20;

/// Admin credential values shipped in sample configs. Configuring one of
/// these is treated the same as not configuring a credential at all.
const ADMIN_TOKEN_PLACEHOLDERS: &[&str] = &["your_admin_token_here", "admin-secret-token"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("invite code must be a string")]
    InvalidType,
    #[error("invite code must be between 6 and 20 characters")]
    InvalidLength,
    #[error("invite code may only contain letters A-Z and digits 0-9")]
    InvalidFormat,
}

/// Validates a submitted code and returns its canonical (trimmed, upper-case) form.
pub fn validate_code(input: &Value) -> Result<String, CodeError> {
    match input {
        Value::String(raw) => normalize_code(raw),
        _ => Err(CodeError::InvalidType),
    }
}

pub fn normalize_code(raw: &str) -> Result<String, CodeError> {
    let normalized = raw.trim().to_ascii_uppercase();

    let len = normalized.chars().count();
    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
        return Err(CodeError::InvalidLength);
    }

    if !normalized
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(CodeError::InvalidFormat);
    }

    Ok(normalized)
}

/// Checks a presented admin credential against the configured one.
///
/// Fails closed when no credential is configured or a placeholder is in
/// use. Inputs of different length are rejected immediately, which leaks
/// only the length; equal-length inputs are compared without early exit.
pub fn validate_admin_credential(token: Option<&str>, expected: Option<&str>) -> bool {
    let expected = match expected {
        Some(e) if !e.is_empty() && !ADMIN_TOKEN_PLACEHOLDERS.contains(&e) => e,
        _ => {
            tracing::error!("admin credential is not configured or uses a placeholder value");
            return false;
        }
    };

    match token {
        Some(token) => constant_time_eq(token.as_bytes(), expected.as_bytes()),
        None => false,
    }
}

/// Byte comparison whose cost does not depend on where the first mismatch is.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
