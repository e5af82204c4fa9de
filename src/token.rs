use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const TOKEN_TTL_DAYS: i64 = 30;
pub const AUDIENCE: &str = "web-users";

/// Secrets copied verbatim from sample env files.
const PLACEHOLDER_SECRETS: &[&str] = &["your-secret-key-please-change-this"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub authenticated: bool,
    /// Issuance time in milliseconds since the epoch.
    pub timestamp: i64,
}

/// Mints and checks HS256 session tokens. Holds no record of what it issued.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Option<String>,
    issuer: String,
}

impl TokenIssuer {
    pub fn new(secret: Option<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret,
            issuer: issuer.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret().is_ok()
    }

    /// Returns the signing secret, or `ServerMisconfigured` if it is unset or a placeholder.
    pub fn secret(&self) -> Result<&str, AppError> {
        match self.secret.as_deref() {
            None | Some("") => Err(AppError::ServerMisconfigured(
                "JWT_SECRET is not set".to_string(),
            )),
            Some(s) if PLACEHOLDER_SECRETS.contains(&s) => Err(AppError::ServerMisconfigured(
                "JWT_SECRET uses the sample placeholder value".to_string(),
            )),
            Some(s) => Ok(s),
        }
    }

    pub fn issue(&self) -> Result<String, AppError> {
        self.issue_at(Utc::now())
    }

    pub fn issue_at(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        let secret = self.secret()?;
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            aud: AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
            authenticated: true,
            timestamp: now.timestamp_millis(),
        };

        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Unexpected(format!("failed to sign session token: {e}")))
    }

    /// Checks signature, algorithm, expiry, issuer and audience.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let secret = self.secret()?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud"]);

        jsonwebtoken::decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("rejected session token: {e}");
            AppError::Unauthorized
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(Some("test-signing-secret".to_string()), "https://blog.example")
    }

    #[test]
    fn test_issued_token_verifies() {
        let tokens = issuer();
        let now = Utc::now();
        let token = tokens.issue_at(now).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.iss, "https://blog.example");
        assert_eq!(claims.aud, AUDIENCE);
        assert!(claims.authenticated);
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_DAYS * 24 * 60 * 60);
        assert_eq!(claims.timestamp, now.timestamp_millis());
    }

    #[test]
    fn test_header_declares_hs256() {
        let token = issuer().issue().unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let tokens = issuer();
        let token = tokens.issue().unwrap();
        let (signed, signature) = token.rsplit_once('.').unwrap();
        let mut sig: Vec<char> = signature.chars().collect();
        sig[10] = if sig[10] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{signed}.{}", sig.into_iter().collect::<String>());
        assert!(matches!(tokens.verify(&tampered), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = issuer();
        let token = tokens.issue().unwrap();
        let other = TokenIssuer::new(Some("test-signing-secret".to_string()), "https://evil.example")
            .issue()
            .unwrap();
        // Splice another token's payload under this token's signature.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);
        assert!(matches!(tokens.verify(&spliced), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = TokenIssuer::new(Some("another-secret".to_string()), "https://blog.example")
            .issue()
            .unwrap();
        assert!(matches!(issuer().verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = issuer();
        let issued = Utc::now() - Duration::days(TOKEN_TTL_DAYS + 1);
        let token = tokens.issue_at(issued).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let token = issuer().issue().unwrap();
        let other = TokenIssuer::new(Some("test-signing-secret".to_string()), "gatehouse");
        assert!(matches!(other.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_missing_secret_is_misconfiguration() {
        let tokens = TokenIssuer::new(None, "gatehouse");
        assert!(!tokens.is_configured());
        assert!(matches!(tokens.issue(), Err(AppError::ServerMisconfigured(_))));
    }

    #[test]
    fn test_placeholder_secret_is_misconfiguration() {
        let tokens = TokenIssuer::new(
            Some("your-secret-key-please-change-this".to_string()),
            "gatehouse",
        );
        assert!(!tokens.is_configured());
        assert!(matches!(tokens.issue(), Err(AppError::ServerMisconfigured(_))));
    }
}
