use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single-use invite code. `used_at` is present iff `used` is true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviteCode {
    pub code: String,
    pub used: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<String>,
}

/// Body of `POST /verify-invite`. Kept untyped so a non-string code can be
/// reported as such instead of as a generic decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyInvite {
    #[serde(default)]
    pub code: Option<Value>,
}

/// Body of `POST /admin/invites`: either an explicit `code` or a `count`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateInvites {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub count: Option<Value>,
}
