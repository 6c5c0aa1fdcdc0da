use axum::response::Json;
use serde_json::{Value, json};

/// `GET /health`: liveness check.
///
/// # Returns
///
/// JSON with `status` (always `"ok"`), the `service` name and its `version`.
/// Served outside the session middleware, so it never sets a cookie.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
