use std::net::SocketAddr;
use tokio::net::TcpListener;

use gatehouse::config::{Config, Environment};
use gatehouse::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let db = gatehouse::db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    let state = AppState::new(db, &config);

    if let Err(e) = state.tokens.secret() {
        tracing::error!("{e}; invite verification will fail until JWT_SECRET is set");
    }
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN is not set; the admin API will reject every request");
    }

    let sweeper = state.rate_limiter.spawn_sweeper(config.sweep_interval);

    let app = gatehouse::routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    sweeper.stop();
    tracing::info!("server stopped");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let env = match config.environment {
        Environment::Production => "production",
        Environment::Development => "development",
    };

    eprintln!();
    eprintln!("  \x1b[1;36mgatehouse\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2menv\x1b[0m          {env}");
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mdatabase\x1b[0m     {}", config.database_url);
    eprintln!("  \x1b[2morigins\x1b[0m      {}", config.allowed_origins.join(", "));
    eprintln!(
        "  \x1b[2mrate limit\x1b[0m   {} per {}s",
        config.verify_limit,
        config.verify_window.as_secs()
    );

    if config.environment == Environment::Development {
        eprintln!();
        eprintln!("  \x1b[33m! development mode: error details are exposed\x1b[0m");
    }

    eprintln!();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
