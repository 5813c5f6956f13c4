//! Request extractors: bearer credentials and JSON bodies with service-style
//! rejections.

use std::sync::Arc;

use axum::{
  extract::{FromRequest, FromRequestParts},
  http::{header, request::Parts},
};
use internhub_core::{
  Error,
  guard::Caller,
  service::{Backend, Hub},
};

use crate::error::ApiError;

/// The resolved caller. A request without an `Authorization` header is
/// anonymous; a malformed or rejected credential fails with 401.
pub struct Auth(pub Caller);

impl<S: Backend> FromRequestParts<Arc<Hub<S>>> for Auth {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    hub: &Arc<Hub<S>>,
  ) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
      return Ok(Self(Caller::anonymous()));
    };
    let token = value
      .to_str()
      .ok()
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(str::trim)
      .ok_or_else(|| Error::unauthenticated("invalid authorization header"))?;
    Ok(Self(hub.authenticate(token).await?))
  }
}

/// `axum::Json` whose rejection is a `body` validation error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path` whose rejection is an `id` validation error.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct IdPath<T>(pub T);
