//! JSON REST API for InternHub.
//!
//! Exposes an axum [`Router`] backed by a [`Hub`] over any storage
//! [`Backend`]. TLS, CORS and listening are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = internhub_api::api_router(hub.clone());
//! axum::serve(listener, app).await?;
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod extract;
pub mod guide;
pub mod health;
pub mod intern;
pub mod upload;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, patch, post},
};
use internhub_core::service::{Backend, Hub};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Multipart requests may carry a little framing on top of the file itself.
const UPLOAD_BODY_LIMIT: usize = internhub_core::resume::MAX_RESUME_BYTES + 1024 * 1024;

/// Build the API router for `hub`, with every route under `/api`.
pub fn api_router<S: Backend>(hub: Arc<Hub<S>>) -> Router<()> {
  let api = Router::new()
    .route("/health", get(health::check))
    // Auth
    .route("/auth/register", post(auth::register::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/me", get(auth::me::<S>))
    .route("/auth/forgot-password", post(auth::forgot_password::<S>))
    .route("/auth/reset-password", post(auth::reset_password::<S>))
    // Intern
    .route(
      "/intern/profile",
      get(intern::profile::<S>).patch(intern::update_profile::<S>),
    )
    .route("/intern/applications", get(intern::applications::<S>))
    .route("/intern/certificates", get(intern::certificates::<S>))
    // Guide
    .route(
      "/guide/profile",
      get(guide::profile::<S>).patch(guide::update_profile::<S>),
    )
    .route(
      "/guide/projects",
      get(guide::list_projects::<S>).post(guide::create_project::<S>),
    )
    .route(
      "/guide/projects/{id}",
      get(guide::get_project::<S>).patch(guide::update_project::<S>),
    )
    // Admin
    .route(
      "/admin/guides",
      get(admin::list_guides::<S>).post(admin::create_guide::<S>),
    )
    .route("/admin/guides/{id}/status", patch(admin::set_guide_status::<S>))
    .route("/admin/projects", get(admin::list_projects::<S>))
    // Upload
    .route(
      "/upload/resume",
      post(upload::resume::<S>).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
    )
    .route("/upload/resume/{id}/url", get(upload::resume_url::<S>))
    .fallback(health::not_found)
    .with_state(hub);

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}
