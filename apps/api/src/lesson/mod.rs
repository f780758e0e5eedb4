//! Lesson generation pipeline: field extraction, prompt assembly, model
//! output recovery, conversation history, and the webhook handler.

pub mod extractor;
pub mod handlers;
pub mod history;
pub mod prompts;
pub mod recovery;
