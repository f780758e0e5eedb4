use axum::Json;
use serde_json::{json, Value};

/// GET /
/// Returns a simple status object so the relay can verify the service is up.
pub async fn home_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Generador de sesiones educativas corriendo 🚀"
    }))
}
