//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: [`Registration`]; 201, always an intern |
//! | `POST` | `/auth/login` | Body: `{"email","password"}` |
//! | `GET`  | `/auth/me` | Any authenticated caller |
//! | `POST` | `/auth/forgot-password` | Body: `{"email"}`; same answer for unknown emails |
//! | `POST` | `/auth/reset-password` | Body: `{"token","password"}` |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use internhub_core::service::{Backend, Hub, LoginResponse, Registration, UserView};
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  extract::{Auth, JsonBody},
};

/// `{"message": ...}` for endpoints with nothing else to say.
#[derive(Debug, Serialize)]
pub struct Message {
  pub message: &'static str,
}

/// `POST /auth/register`
pub async fn register<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  JsonBody(body): JsonBody<Registration>,
) -> Result<impl IntoResponse, ApiError> {
  let registered = hub.register_intern(body).await?;
  Ok((StatusCode::CREATED, Json(registered)))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError> {
  Ok(Json(hub.login(&body.email, &body.password).await?))
}

/// `GET /auth/me`
pub async fn me<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
) -> Result<Json<UserView>, ApiError> {
  Ok(Json(hub.me(&caller).await?))
}

#[derive(Debug, Deserialize)]
pub struct ForgotBody {
  pub email: String,
}

/// `POST /auth/forgot-password`
pub async fn forgot_password<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  JsonBody(body): JsonBody<ForgotBody>,
) -> Result<Json<Message>, ApiError> {
  let message = hub.request_password_reset(&body.email).await?;
  Ok(Json(Message { message }))
}

#[derive(Debug, Deserialize)]
pub struct ResetBody {
  pub token:    String,
  pub password: String,
}

/// `POST /auth/reset-password`
pub async fn reset_password<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  JsonBody(body): JsonBody<ResetBody>,
) -> Result<Json<Message>, ApiError> {
  let message = hub.reset_password(&body.token, &body.password).await?;
  Ok(Json(Message { message }))
}
