use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::state::AppState;

/// Rate-limit key for the caller: a network address when one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

/// Picks the address the outermost trusted proxy saw.
///
/// Each proxy appends its peer on the right, so with `hops` trusted proxies
/// the client is the `hops`-th entry from the end. Anything further left was
/// written by the client and is ignored.
fn forwarded_for(parts: &Parts, hops: usize) -> Option<String> {
    let entries: Vec<&str> = parts
        .headers
        .get("X-Forwarded-For")?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .collect();

    let index = entries.len().checked_sub(hops)?;
    entries
        .get(index)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

fn real_ip(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("X-Real-IP")?
        .to_str()
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<AppState> for ClientId {
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        // Forwarding headers are client-controlled unless a proxy rewrites them.
        let hops = state.trusted_proxy_hops;
        let forwarded = if hops > 0 {
            forwarded_for(parts, hops).or_else(|| real_ip(parts))
        } else {
            None
        };

        let id = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        async move { Ok(ClientId(id)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(xff: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header("X-Forwarded-For", xff)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_single_hop_uses_rightmost_entry() {
        let parts = parts_with("1.1.1.1, 203.0.113.7");
        assert_eq!(forwarded_for(&parts, 1).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_two_hops_skip_inner_proxy() {
        let parts = parts_with("6.6.6.6, 203.0.113.7, 10.0.0.2");
        assert_eq!(forwarded_for(&parts, 2).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_fewer_entries_than_hops_is_ignored() {
        let parts = parts_with("203.0.113.7");
        assert_eq!(forwarded_for(&parts, 2), None);
    }
}
