use std::time::Duration;

use crate::rate_limit::MAX_WINDOW;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    Production,
    Development,
}

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub admin_token: Option<String>,
    pub jwt_secret: Option<String>,
    pub site_url: Option<String>,
    pub allowed_origins: Vec<String>,
    pub environment: Environment,
    pub verify_limit: u32,
    pub verify_window: Duration,
    pub sweep_interval: Duration,
    /// Number of reverse proxies in front of the server whose
    /// `X-Forwarded-For` entries are trusted. Zero ignores forwarding headers.
    pub trusted_proxy_hops: usize,
}

/// Reads a variable, treating an empty value the same as an unset one.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    non_empty_var(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Reads a duration in whole seconds, clamped to what the rate limiter accepts.
fn seconds_var(name: &str, default: u64) -> Duration {
    Duration::from_secs(parsed_var(name, default)).min(MAX_WINDOW)
}

fn flag_var(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl Config {
    pub fn from_env() -> Self {
        let environment = match non_empty_var("GATEHOUSE_ENV")
            .unwrap_or_else(|| "production".to_string())
            .to_lowercase()
            .as_str()
        {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        };

        let site_url = non_empty_var("SITE_URL");

        let mut allowed_origins: Vec<String> = non_empty_var("GATEHOUSE_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string())
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if let Some(ref site) = site_url {
            let site = site.trim_end_matches('/').to_string();
            if !allowed_origins.contains(&site) {
                allowed_origins.push(site);
            }
        }

        // GATEHOUSE_TRUST_PROXY=true is shorthand for a single proxy.
        let default_hops = usize::from(flag_var("GATEHOUSE_TRUST_PROXY"));

        Self {
            port: parsed_var("PORT", 39100),
            database_url: non_empty_var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:gatehouse.db?mode=rwc".to_string()),
            admin_token: non_empty_var("ADMIN_TOKEN"),
            jwt_secret: non_empty_var("JWT_SECRET"),
            site_url,
            allowed_origins,
            environment,
            verify_limit: parsed_var("GATEHOUSE_VERIFY_LIMIT", 10),
            verify_window: seconds_var("GATEHOUSE_VERIFY_WINDOW_SECS", 60),
            sweep_interval: seconds_var("GATEHOUSE_SWEEP_INTERVAL_SECS", 300)
                .max(Duration::from_secs(1)),
            trusted_proxy_hops: parsed_var("GATEHOUSE_TRUSTED_PROXY_HOPS", default_hops),
        }
    }

    /// Issuer claim for session tokens.
    pub fn token_issuer(&self) -> String {
        self.site_url
            .clone()
            .unwrap_or_else(|| "gatehouse".to_string())
    }
}
