use axum::response::{IntoResponse, Json};
use serde_json::json;

// axum handler for `/`, kept out of the OpenAPI document
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/swagger-ui",
    }))
}
