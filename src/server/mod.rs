//! HTTP server assembly.
//!
//! Builds the axum router from [`api`] and runs it with graceful ctrl-c
//! shutdown. CORS is locked to the configured front-end origin when one is
//! set, and permissive otherwise (local development against a dev server).

pub mod api;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use chrono::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::TokenSigner;
use crate::config::AppConfig;

use api::{AppState, SharedState};

/// Build the application state from startup configuration.
pub fn build_state(config: &AppConfig) -> SharedState {
    Arc::new(AppState {
        tokens: TokenSigner::with_ttl(
            &config.auth.token_secret,
            Duration::seconds(config.auth.token_ttl_secs),
        ),
        executor: config.executor.build(),
        session: config.session.clone(),
        users: Mutex::new(HashMap::new()),
    })
}

/// Build the full application router.
pub fn build_router(state: SharedState, frontend_origin: Option<&str>) -> Result<Router> {
    let cors = match frontend_origin {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid FRONTEND_URL: {origin}"))?;
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        }
        None => CorsLayer::permissive(),
    };

    Ok(api::api_router().layer(cors).with_state(state))
}

/// Start the API server and block until shutdown.
pub async fn start_server(config: AppConfig) -> Result<()> {
    let state = build_state(&config);
    let app = build_router(state, config.frontend_origin.as_deref())?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(addr = %listener.local_addr()?, executor = %config.executor, "Prism API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, SessionConfig};
    use crate::executor::ExecutorKind;

    fn test_config() -> AppConfig {
        AppConfig {
            port: 0,
            frontend_origin: None,
            executor: ExecutorKind::Sandbox,
            auth: AuthConfig {
                token_secret: "test-secret".to_string(),
                token_ttl_secs: 3600,
            },
            session: SessionConfig {
                secret: "test-session".to_string(),
                resave: false,
                save_uninitialized: false,
                secure_cookies: false,
            },
        }
    }

    #[test]
    fn test_build_router_with_origin() {
        let state = build_state(&test_config());
        assert!(build_router(state, Some("http://localhost:5173")).is_ok());
    }

    #[test]
    fn test_build_router_rejects_unparseable_origin() {
        let state = build_state(&test_config());
        assert!(build_router(state, Some("http://bad\norigin")).is_err());
    }
}
