//! Liveness probe and the `/api` fallback.

use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct Health {
  pub status:    &'static str,
  pub timestamp: DateTime<Utc>,
}

/// `GET /health`
pub async fn check() -> Json<Health> {
  Json(Health { status: "ok", timestamp: Utc::now() })
}

/// Any unmatched path under `/api`.
pub async fn not_found() -> impl IntoResponse {
  (StatusCode::NOT_FOUND, Json(json!({ "error": "API route not found" })))
}
