//! Retrieval — semantic lookup of curriculum passages for prompt grounding.
//!
//! `AppState` holds an `Arc<dyn Retriever>`, so the backend can be swapped
//! without touching the handler or the prompt assembler.

pub mod corpus;

use async_trait::async_trait;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::{EmbeddingTask, GeminiClient};

/// How many passages a lesson request asks the retriever for.
pub const RETRIEVAL_K: usize = 3;

/// The retrieval seam. Given a query, returns up to `k` passages ranked by
/// relevance, most relevant first. May return fewer, or none.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, AppError>;
}

struct IndexedPassage {
    text: String,
    embedding: Vec<f32>,
}

/// In-process vector index over the fixed curriculum corpus.
///
/// Passages are embedded once at startup with the document task type; each
/// query is embedded with the query task type and ranked by cosine similarity.
pub struct EmbeddingRetriever {
    llm: GeminiClient,
    index: Vec<IndexedPassage>,
}

impl EmbeddingRetriever {
    /// Embeds every corpus passage and builds the index.
    /// Fatal on embedding failure: the service must not start serving
    /// without its knowledge collection.
    pub async fn from_corpus(llm: GeminiClient, documents: &[&str]) -> Result<Self, AppError> {
        let mut index = Vec::with_capacity(documents.len());

        for document in documents {
            let embedding = llm
                .embed(document, EmbeddingTask::Document)
                .await
                .map_err(|e| AppError::Retrieval(format!("corpus embedding failed: {e}")))?;
            index.push(IndexedPassage {
                text: document.to_string(),
                embedding,
            });
        }

        info!("Knowledge index built: {} passages", index.len());
        Ok(Self { llm, index })
    }
}

#[async_trait]
impl Retriever for EmbeddingRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, AppError> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.llm.embed(query, EmbeddingTask::Query).await?;

        Ok(rank_passages(&self.index, &query_embedding, k))
    }
}

/// Ranks indexed passages against a query embedding, best first, truncated to k.
fn rank_passages(index: &[IndexedPassage], query: &[f32], k: usize) -> Vec<String> {
    let mut scored: Vec<(f32, &str)> = index
        .iter()
        .map(|p| (cosine_similarity(&p.embedding, query), p.text.as_str()))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(k)
        .map(|(_, text)| text.to_string())
        .collect()
}

/// Calculates cosine similarity between two vectors.
/// Mismatched lengths and zero-magnitude vectors score 0.0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(text: &str, embedding: Vec<f32>) -> IndexedPassage {
        IndexedPassage {
            text: text.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        let v1 = vec![1.0, 0.0];
        let v2 = vec![0.0, 1.0];
        assert!((cosine_similarity(&v1, &v2)).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite_vectors() {
        let v1 = vec![1.0, 0.0];
        let v2 = vec![-1.0, 0.0];
        assert!((cosine_similarity(&v1, &v2) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        let v1 = vec![1.0, 2.0];
        let v2 = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&v1, &v2), 0.0);
    }

    #[test]
    fn test_cosine_similarity_zero_magnitude() {
        let v1 = vec![0.0, 0.0];
        let v2 = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&v1, &v2), 0.0);
    }

    #[test]
    fn test_rank_passages_orders_by_similarity() {
        let index = vec![
            passage("lejos", vec![0.0, 1.0]),
            passage("cerca", vec![1.0, 0.0]),
            passage("medio", vec![1.0, 1.0]),
        ];
        let ranked = rank_passages(&index, &[1.0, 0.0], 3);
        assert_eq!(ranked, vec!["cerca", "medio", "lejos"]);
    }

    #[test]
    fn test_rank_passages_truncates_to_k() {
        let index = vec![
            passage("a", vec![1.0, 0.0]),
            passage("b", vec![0.9, 0.1]),
            passage("c", vec![0.0, 1.0]),
        ];
        let ranked = rank_passages(&index, &[1.0, 0.0], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0], "a");
    }

    #[test]
    fn test_rank_passages_k_larger_than_index() {
        let index = vec![passage("solo", vec![1.0])];
        let ranked = rank_passages(&index, &[1.0], 5);
        assert_eq!(ranked, vec!["solo"]);
    }
}
