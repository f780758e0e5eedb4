//! Axum route handlers for the lesson webhook.
//!
//! The webhook always answers 200: failures travel inside the payload, not
//! the status code. Every handled message leaves at least one "user" turn
//! and one bot-labeled turn in the history, even when generation fails.

use axum::{extract::State, Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::lesson::extractor::parse_teacher_message;
use crate::lesson::history::{
    recent_history, save_message, HISTORY_WINDOW_TURNS, ROLE_BOT, ROLE_BOT_RAW, ROLE_USER,
};
use crate::lesson::prompts::build_prompt;
use crate::lesson::recovery::{recover_lesson, LessonDocument};
use crate::retrieval::RETRIEVAL_K;
use crate::state::AppState;

/// Fixed reply for an empty inbound message. No downstream calls are made.
pub const EMPTY_MESSAGE_REPLY: &str = "Por favor envía: Tema, Competencia, Grado y Contexto 📚";

/// Session id assumed when the relay omits the sender field.
pub const DEFAULT_SESSION_ID: &str = "default_user";

/// Form-encoded webhook body (Twilio-style field names).
#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "From", default = "default_session_id")]
    pub from: String,
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

/// POST /webhook
///
/// Consumes a form-encoded message and returns the lesson document as JSON.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Form(form): Form<WebhookForm>,
) -> Json<Value> {
    if form.body.trim().is_empty() {
        return Json(json!({ "error": EMPTY_MESSAGE_REPLY }));
    }

    Json(generate_lesson(&state, &form.from, &form.body).await)
}

/// Runs the full pipeline for one message:
/// extract fields → retrieve passages → fetch history → assemble prompt →
/// generate → recover document → log turns → payload.
pub async fn generate_lesson(state: &AppState, session_id: &str, message: &str) -> Value {
    let inputs = parse_teacher_message(message);

    let query = format!("{} {} {}", inputs.tema, inputs.competencia, inputs.grado);
    let passages = match state.retriever.retrieve(&query, RETRIEVAL_K).await {
        Ok(passages) => passages,
        Err(e) => {
            // Retrieval failure degrades to "no references found".
            warn!("Retrieval failed, continuing without references: {e}");
            Vec::new()
        }
    };

    let history = recent_history(&state.db, session_id, HISTORY_WINDOW_TURNS).await;
    let prompt = build_prompt(&inputs, &passages, &history);

    let (document, raw_output) = match state.llm.generate(&prompt).await {
        Ok(raw) => {
            let document = recover_lesson(&raw);
            (document, Some(raw))
        }
        Err(e) => {
            error!("Generation failed for session {session_id}: {e}");
            let document = LessonDocument::Invalid {
                error: format!("El servicio de generación no está disponible: {e}"),
                raw: String::new(),
                candidate: None,
            };
            (document, None)
        }
    };

    save_message(&state.db, session_id, ROLE_USER, message).await;

    // Keep the raw completion alongside the error document when recovery failed.
    if !document.is_lesson() {
        if let Some(raw) = &raw_output {
            save_message(&state.db, session_id, ROLE_BOT_RAW, raw).await;
        }
    }

    let payload = document.into_payload();
    save_message(&state.db, session_id, ROLE_BOT, &payload.to_string()).await;

    payload
}
