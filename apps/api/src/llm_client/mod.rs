/// LLM Client — the single point of entry for all Gemini API calls in Aula.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All generation and embedding traffic MUST go through this module.
///
/// Models are hardcoded — do not make configurable to prevent drift.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all lesson generation calls.
pub const GENERATION_MODEL: &str = "gemini-2.0-flash";
/// The model used for corpus and query embeddings.
pub const EMBEDDING_MODEL: &str = "text-embedding-004";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Embedding task type, passed explicitly on every embed call.
/// Corpus passages are embedded as documents; lookups as queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    Document,
    Query,
}

impl EmbeddingTask {
    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingTask::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingTask::Query => "RETRIEVAL_QUERY",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    #[serde(rename = "taskType")]
    task_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single Gemini client used by all services in Aula.
/// Wraps the generateContent and embedContent endpoints with retry logic.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Generates a single text completion for the given prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{GEMINI_API_BASE}/{GENERATION_MODEL}:generateContent");
        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self.post_with_retry(&url, &request_body).await?;
        let body: GenerateResponse = response.json().await?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(LlmError::EmptyContent)?;

        debug!("Generation call succeeded ({} chars)", text.len());
        Ok(text)
    }

    /// Generates a vector embedding for the given text.
    /// The task type is an explicit parameter so concurrent document and
    /// query embeddings can never interfere with each other.
    pub async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>, LlmError> {
        let url = format!("{GEMINI_API_BASE}/{EMBEDDING_MODEL}:embedContent");
        // Gemini requires the model name to be prefixed with "models/" in the payload.
        let request_body = EmbedRequest {
            model: format!("models/{EMBEDDING_MODEL}"),
            content: Content {
                parts: vec![Part { text }],
            },
            task_type: task.as_str(),
        };

        let response = self.post_with_retry(&url, &request_body).await?;
        let body: EmbedResponse = response.json().await?;

        Ok(body.embedding.values)
    }

    /// POSTs a JSON body, retrying on 429 (rate limit) and 5xx errors
    /// with exponential backoff.
    async fn post_with_retry<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Gemini call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(url)
                .header("x-goog-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Gemini API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_wire_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hola" }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hola");
    }

    #[test]
    fn test_embed_request_carries_task_type() {
        let request = EmbedRequest {
            model: format!("models/{EMBEDDING_MODEL}"),
            content: Content {
                parts: vec![Part { text: "fracciones" }],
            },
            task_type: EmbeddingTask::Query.as_str(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(json["model"], "models/text-embedding-004");
    }

    #[test]
    fn test_embedding_task_strings() {
        assert_eq!(EmbeddingTask::Document.as_str(), "RETRIEVAL_DOCUMENT");
        assert_eq!(EmbeddingTask::Query.as_str(), "RETRIEVAL_QUERY");
    }

    #[test]
    fn test_generate_response_parses_candidate_text() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "respuesta"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text, "respuesta");
    }

    #[test]
    fn test_generate_response_tolerates_missing_candidates() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
