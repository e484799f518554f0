//! Kept verbatim from the teacher's trivial `handlers::health::healthz`.

use axum::Json;
use serde_json::{json, Value};

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
