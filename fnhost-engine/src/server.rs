//! HTTP server bootstrap

use axum::routing::any;
use axum::Router;
use fnhost_core::EngineError;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Contract;
use crate::dispatch::dispatch;

/// Explicit startup configuration for the engine.
///
/// The engine reads nothing from the process environment; hosts resolve
/// their environment into this value before constructing the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline covering body read plus handler execution; expiry completes
    /// the request as 504
    pub handler_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            handler_timeout: Duration::from_secs(30),
        }
    }
}

/// Process-wide dispatch state, fixed at startup and read-only thereafter
pub struct EngineState {
    pub contract: Arc<dyn Contract>,
    pub handler_timeout: Duration,
}

/// Build the router: every path funnels into the dispatcher's fixed 4-way
/// method split
pub fn router(state: Arc<EngineState>) -> Router {
    Router::new()
        .route("/", any(dispatch))
        .route("/*path", any(dispatch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The lifecycle engine's HTTP front end
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<EngineState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, contract: Arc<dyn Contract>) -> Self {
        let state = Arc::new(EngineState {
            contract,
            handler_timeout: config.handler_timeout,
        });
        Self { config, state }
    }

    /// The router, exposed for in-process tests
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind and serve until the process is terminated externally
    pub async fn serve(self) -> Result<(), EngineError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("Listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
