mod admin;
mod health;
mod session;
mod verify;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware as axum_mw;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::error_detail::expose_error_detail;
use crate::state::AppState;

/// Build the full application router. Consumes the state so middleware
/// layers that need `State<AppState>` can be wired up.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        .route("/health", get(health::health))
        .route("/version", get(health::version))
        .merge(gate_routes())
        .nest("/api", gate_routes())
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            expose_error_detail,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn gate_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/verify-invite",
            post(verify::verify_invite)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/admin/invites",
            get(admin::list_invites)
                .post(admin::create_invites)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route("/session", get(session::check_session))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("ignoring invalid allowed origin {o:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Bare `OPTIONS` requests that are not CORS preflights still get a 200.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({
            "success": false,
            "message": "method not allowed",
        })),
    )
}

/// Decodes a JSON body, treating an empty body as `{}`.
fn parse_json_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("rejected request body: {e}");
        AppError::InvalidInput("request body must be a JSON object".to_string())
    })
}
