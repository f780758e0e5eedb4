mod config;
mod db;
mod errors;
mod lesson;
mod llm_client;
mod retrieval;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::GeminiClient;
use crate::retrieval::corpus::CURRICULUM_CORPUS;
use crate::retrieval::{EmbeddingRetriever, Retriever};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aula API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite (schema created on first start)
    let db = create_pool(&config.database_url).await?;

    // Initialize Gemini client
    let llm = GeminiClient::new(config.google_api_key.clone());
    info!(
        "Gemini client initialized (generation: {}, embeddings: {})",
        llm_client::GENERATION_MODEL,
        llm_client::EMBEDDING_MODEL
    );

    // Build the knowledge index before serving — the retriever must exist
    // before the first webhook arrives.
    let retriever: Arc<dyn Retriever> =
        Arc::new(EmbeddingRetriever::from_corpus(llm.clone(), &CURRICULUM_CORPUS).await?);

    // Build app state
    let state = AppState { db, llm, retriever };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
