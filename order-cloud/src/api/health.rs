//! 健康检查

use axum::Json;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "order-cloud",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
