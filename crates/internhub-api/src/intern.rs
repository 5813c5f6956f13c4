//! Handlers for `/intern` endpoints. Every route requires the INTERN role.

use std::sync::Arc;

use axum::{Json, extract::State};
use internhub_core::{
  account::{InternProfile, InternProfileView},
  application::{ApplicationListing, CertificateListing},
  patch::InternProfilePatch,
  service::{Backend, Hub},
};

use crate::{
  error::ApiError,
  extract::{Auth, JsonBody},
};

/// `GET /intern/profile`
pub async fn profile<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
) -> Result<Json<InternProfileView>, ApiError> {
  Ok(Json(hub.intern_profile(&caller).await?))
}

/// `PATCH /intern/profile`. Absent keys are left as they are.
pub async fn update_profile<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
  JsonBody(patch): JsonBody<InternProfilePatch>,
) -> Result<Json<InternProfile>, ApiError> {
  Ok(Json(hub.update_intern_profile(&caller, patch).await?))
}

/// `GET /intern/applications`
pub async fn applications<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
) -> Result<Json<Vec<ApplicationListing>>, ApiError> {
  Ok(Json(hub.intern_applications(&caller).await?))
}

/// `GET /intern/certificates`
pub async fn certificates<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
) -> Result<Json<Vec<CertificateListing>>, ApiError> {
  Ok(Json(hub.intern_certificates(&caller).await?))
}
