//! HTTP server for the RAG system

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::OllamaClient;
use crate::indexing::Indexer;
use crate::providers::{LlmProvider, LocalVectorStore, OllamaProvider, VectorStoreProvider};
use crate::readiness::ensure_ready;
use state::AppState;

/// Build the router with all routes
pub fn build_router(state: AppState) -> Router {
    let enable_cors = state.config().server.enable_cors;

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(routes::api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// RAG HTTP Server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server over an already indexed state
    pub fn new(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Connect to Ollama, make sure the models exist, restore and refresh the
    /// index, then assemble the state. Any failure here is fatal.
    pub async fn bootstrap(config: RagConfig) -> Result<Self> {
        let client = OllamaClient::new(&config.llm)?;
        tracing::info!(
            "Using Ollama at {} (chat: {}, embeddings: {})",
            client.base_url(),
            config.llm.chat_model,
            config.llm.embed_model
        );
        let (embedder, llm) = OllamaProvider::new(client).split();

        ensure_ready(
            llm.as_ref(),
            &[config.llm.chat_model.as_str(), config.llm.embed_model.as_str()],
        )
        .await?;

        let store: Arc<dyn VectorStoreProvider> = Arc::new(LocalVectorStore::new(embedder));
        let indexer = Indexer::new(&config.indexing, Arc::clone(&store))?;
        let snapshot = indexer.restore().await?;
        let (snapshot, _report) = indexer.run(snapshot).await?;

        let llm: Arc<dyn LlmProvider> = llm;
        Ok(Self::new(AppState::new(config, store, llm, snapshot)))
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = build_router(self.state);

        tracing::info!("Starting RAG server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
