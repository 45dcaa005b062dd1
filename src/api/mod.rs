//! HTTP API server for the companion gateway

pub mod chat;
pub mod health;
pub mod pages;
pub mod tts;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::completion::CompletionGateway;
use crate::orchestrator::SessionOrchestrator;
use crate::persona::Persona;
use crate::session::{MemorySessionStore, SessionStore};
use crate::voice::SpeechSynthesizer;
use crate::Result;

/// JSON error body shared by the API endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: SessionOrchestrator,
    pub tts: Arc<dyn SpeechSynthesizer>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    completion: Arc<dyn CompletionGateway>,
    tts: Arc<dyn SpeechSynthesizer>,
    store: Option<Arc<dyn SessionStore>>,
    persona: Persona,
    port: u16,
    static_dir: PathBuf,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(
        completion: Arc<dyn CompletionGateway>,
        tts: Arc<dyn SpeechSynthesizer>,
        port: u16,
    ) -> Self {
        Self {
            completion,
            tts,
            store: None,
            persona: Persona::default(),
            port,
            static_dir: PathBuf::from("frontend"),
        }
    }

    /// Set the session store (defaults to an in-memory store)
    #[must_use]
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the assistant persona
    #[must_use]
    pub fn persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Set the static files directory for the landing and app pages
    #[must_use]
    pub fn static_dir(mut self, dir: PathBuf) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::default()) as Arc<dyn SessionStore>);

        let orchestrator = SessionOrchestrator::new(store, self.completion, self.persona);

        let state = Arc::new(ApiState {
            orchestrator,
            tts: self.tts,
        });

        ApiServer {
            state,
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: PathBuf,
}

impl ApiServer {
    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let api = chat::router(self.state.clone()).merge(tts::router(self.state.clone()));

        let router = Router::new()
            .nest("/api", api)
            .merge(health::router())
            .merge(pages::router(&self.static_dir))
            .method_not_allowed_fallback(pages::unmatched_method);

        // CORS layer for cross-origin requests from frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(
            port = self.port,
            static_dir = %self.static_dir.display(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
