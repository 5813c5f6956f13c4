//! Handlers for `/guide` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/guide/profile` | |
//! | `PATCH` | `/guide/profile` | `isActive` is ignored |
//! | `GET`   | `/guide/projects` | Newest first, with counts |
//! | `POST`  | `/guide/projects` | Body: [`NewProject`]; 201, starts as `DRAFT` |
//! | `GET`   | `/guide/projects/{id}` | 404 unless the caller owns it |
//! | `PATCH` | `/guide/projects/{id}` | Drafts only |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use internhub_core::{
  account::{GuideProfile, GuideProfileView},
  patch::GuideProfilePatch,
  project::{GuideProjectSummary, GuideProjectView, NewProject, ProjectDetail, ProjectPatch},
  service::{Backend, Hub},
};
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{Auth, IdPath, JsonBody},
};

// ─── Profile ─────────────────────────────────────────────────────────────────

pub async fn profile<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
) -> Result<Json<GuideProfileView>, ApiError> {
  Ok(Json(hub.guide_profile(&caller).await?))
}

pub async fn update_profile<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
  JsonBody(patch): JsonBody<GuideProfilePatch>,
) -> Result<Json<GuideProfile>, ApiError> {
  Ok(Json(hub.update_guide_profile(&caller, patch).await?))
}

// ─── Projects ────────────────────────────────────────────────────────────────

pub async fn list_projects<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
) -> Result<Json<Vec<GuideProjectSummary>>, ApiError> {
  Ok(Json(hub.guide_projects(&caller).await?))
}

pub async fn create_project<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
  JsonBody(body): JsonBody<NewProject>,
) -> Result<impl IntoResponse, ApiError> {
  let created = hub.create_project(&caller, body).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_project<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
  IdPath(id): IdPath<Uuid>,
) -> Result<Json<GuideProjectView>, ApiError> {
  Ok(Json(hub.guide_project(&caller, id).await?))
}

pub async fn update_project<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
  IdPath(id): IdPath<Uuid>,
  JsonBody(patch): JsonBody<ProjectPatch>,
) -> Result<Json<ProjectDetail>, ApiError> {
  Ok(Json(hub.update_project(&caller, id, patch).await?))
}
