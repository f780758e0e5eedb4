use std::sync::Arc;

use sqlx::SqlitePool;

use crate::llm_client::GeminiClient;
use crate::retrieval::Retriever;

/// Shared application state injected into all route handlers via Axum extractors.
/// Collaborator handles are constructed once at startup; no request mutates them.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub llm: GeminiClient,
    /// Pluggable retrieval backend. Default: in-process `EmbeddingRetriever`.
    pub retriever: Arc<dyn Retriever>,
}
