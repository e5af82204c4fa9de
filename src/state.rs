use sqlx::SqlitePool;
use std::time::Duration;

use crate::config::{Config, Environment};
use crate::rate_limit::RateLimiter;
use crate::token::TokenIssuer;

/// Attempts allowed per client on the public verification endpoint.
#[derive(Debug, Clone, Copy)]
pub struct VerifyPolicy {
    pub limit: u32,
    pub window: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub rate_limiter: RateLimiter,
    pub verify_policy: VerifyPolicy,
    pub tokens: TokenIssuer,
    pub admin_token: Option<String>,
    pub allowed_origins: Vec<String>,
    pub trusted_proxy_hops: usize,
    /// Include internal error detail in 5xx responses.
    pub expose_errors: bool,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        Self {
            db,
            rate_limiter: RateLimiter::new(),
            verify_policy: VerifyPolicy {
                limit: config.verify_limit,
                window: config.verify_window,
            },
            tokens: TokenIssuer::new(config.jwt_secret.clone(), config.token_issuer()),
            admin_token: config.admin_token.clone(),
            allowed_origins: config.allowed_origins.clone(),
            trusted_proxy_hops: config.trusted_proxy_hops,
            expose_errors: config.environment == Environment::Development,
        }
    }
}
