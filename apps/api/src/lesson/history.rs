//! Conversation Log — append-only per-session history in SQLite.
//!
//! Persistence here is best-effort: a history write or read failure is logged
//! and the request continues. Chat memory is not authoritative state.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;

/// How many prior exchanges are replayed into the next prompt.
/// One turn = one user message plus one bot reply.
pub const HISTORY_WINDOW_TURNS: i64 = 3;

/// Role label for inbound teacher messages.
pub const ROLE_USER: &str = "user";
/// Role label for the bot's structured (or error) reply.
pub const ROLE_BOT: &str = "bot";
/// Role label for the raw model output kept when recovery failed.
pub const ROLE_BOT_RAW: &str = "bot_raw";

/// One logged exchange half: who said it and what was said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

/// Appends one record to the session history. Never fails the request:
/// errors are logged and swallowed.
pub async fn save_message(pool: &SqlitePool, session_id: &str, role: &str, content: &str) {
    let result = sqlx::query(
        "INSERT INTO lesson_history (session_id, role, content) VALUES (?, ?, ?)",
    )
    .bind(session_id)
    .bind(role)
    .bind(content)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!("History append failed for session {session_id}: {e}");
    }
}

/// Returns the most recent turns for a session, oldest first.
/// Fetches `n_turns * 2` rows (user + bot halves). Read failures degrade to
/// an empty history.
pub async fn recent_history(
    pool: &SqlitePool,
    session_id: &str,
    n_turns: i64,
) -> Vec<ConversationTurn> {
    let result = sqlx::query_as::<_, (String, String)>(
        "SELECT role, content FROM lesson_history WHERE session_id = ? ORDER BY id DESC LIMIT ?",
    )
    .bind(session_id)
    .bind(n_turns * 2)
    .fetch_all(pool)
    .await;

    match result {
        Ok(mut rows) => {
            rows.reverse();
            rows.into_iter()
                .map(|(role, content)| ConversationTurn { role, content })
                .collect()
        }
        Err(e) => {
            warn!("History read failed for session {session_id}: {e}");
            Vec::new()
        }
    }
}
