//! Handlers for `/admin` endpoints. Every route requires the ADMIN role.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/admin/guides` | Newest account first, with project counts |
//! | `POST`  | `/admin/guides` | Body: [`NewGuide`]; 201 with a one-time `tempPassword` |
//! | `PATCH` | `/admin/guides/{id}/status` | Body: `{"isActive": bool}` |
//! | `GET`   | `/admin/projects` | Every project, with its guide |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use internhub_core::{
  account::{GuideListing, GuideProfile},
  project::AdminProjectListing,
  service::{Backend, Hub, NewGuide},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{Auth, IdPath, JsonBody},
};

pub async fn list_guides<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
) -> Result<Json<Vec<GuideListing>>, ApiError> {
  Ok(Json(hub.list_guides(&caller).await?))
}

pub async fn create_guide<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
  JsonBody(body): JsonBody<NewGuide>,
) -> Result<impl IntoResponse, ApiError> {
  let provisioned = hub.provision_guide(&caller, body).await?;
  Ok((StatusCode::CREATED, Json(provisioned)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
  pub is_active: bool,
}

pub async fn set_guide_status<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
  IdPath(id): IdPath<Uuid>,
  JsonBody(body): JsonBody<StatusBody>,
) -> Result<Json<GuideProfile>, ApiError> {
  Ok(Json(hub.set_guide_active(&caller, id, body.is_active).await?))
}

pub async fn list_projects<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
) -> Result<Json<Vec<AdminProjectListing>>, ApiError> {
  Ok(Json(hub.list_all_projects(&caller).await?))
}
