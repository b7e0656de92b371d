//! Application startup and lifecycle management.

use crate::config::RelayConfig;
use crate::handlers;
use crate::services::providers::openrouter::{OpenRouterConfig, OpenRouterTextProvider};
use crate::services::providers::TextProvider;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

/// Shared application state, injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub text_provider: Arc<dyn TextProvider>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration and the
    /// OpenRouter provider.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let provider = OpenRouterTextProvider::new(OpenRouterConfig {
            api_key: config.upstream.api_key.clone(),
            base_url: config.upstream.base_url.clone(),
            http_referer: config.upstream.http_referer.clone(),
            system_prompt: config.upstream.system_prompt.clone(),
            timeout_secs: config.upstream.timeout_secs,
        })
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{}", e)))?;

        tracing::info!(
            base_url = %config.upstream.base_url,
            default_model = %config.generation.default_model,
            "Initialized OpenRouter text provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application with an injected provider. Used by tests
    /// to substitute mocks.
    pub async fn build_with_provider(
        config: RelayConfig,
        text_provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        // Surface a bad credential at startup instead of on the first
        // request; a failing provider is not fatal, the relay still
        // serves /health.
        if let Err(e) = text_provider.health_check().await {
            tracing::warn!("Text provider health check failed: {}", e);
        }

        let state = AppState {
            config: config.clone(),
            text_provider,
        };

        // Port 0 = random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Relay listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router).await
    }

    /// Run the application until stopped or the shutdown future resolves.
    pub async fn run_until_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Build the router with CORS and tracing layers.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.allowed_origins);

    Router::new()
        .route(
            "/health",
            get(handlers::health_check).fallback(handlers::method_not_allowed),
        )
        .route(
            "/generate",
            post(handlers::generate).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
