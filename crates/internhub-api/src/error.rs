//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every service error kind maps to exactly one status code here.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use internhub_core::Error;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self(Error::invalid("body", rejection.body_text()))
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    Self(Error::invalid("id", rejection.body_text()))
  }
}

fn message(status: StatusCode, text: String) -> Response {
  (status, Json(json!({ "error": text }))).into_response()
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self.0 {
      Error::Unauthenticated(msg) => {
        let mut res = message(StatusCode::UNAUTHORIZED, msg);
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        res
      }
      Error::Forbidden(msg) => message(StatusCode::FORBIDDEN, msg),
      Error::NotFound(msg) => message(StatusCode::NOT_FOUND, msg),
      e @ Error::ProfileMissing { .. } => message(StatusCode::NOT_FOUND, e.to_string()),
      Error::Conflict(msg) => message(StatusCode::CONFLICT, msg),
      Error::InvalidState(msg) => message(StatusCode::BAD_REQUEST, msg),
      Error::Validation(errors) => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "validation failed", "errors": errors })),
      )
        .into_response(),
      Error::Upstream(msg) => {
        tracing::warn!(error = %msg, "upstream failure");
        message(StatusCode::BAD_GATEWAY, msg)
      }
      e @ (Error::Storage(_) | Error::Internal(_)) => {
        tracing::error!(error = %e, "request failed");
        message(StatusCode::INTERNAL_SERVER_ERROR, "internal server error".into())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn status_of(e: Error) -> StatusCode { ApiError(e).into_response().status() }

  #[test]
  fn each_kind_has_its_status() {
    assert_eq!(status_of(Error::unauthenticated("x")), StatusCode::UNAUTHORIZED);
    assert_eq!(status_of(Error::Forbidden("x".into())), StatusCode::FORBIDDEN);
    assert_eq!(status_of(Error::not_found("x")), StatusCode::NOT_FOUND);
    assert_eq!(status_of(Error::Conflict("x".into())), StatusCode::CONFLICT);
    assert_eq!(status_of(Error::InvalidState("x".into())), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(Error::invalid("f", "x")), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(Error::Upstream("x".into())), StatusCode::BAD_GATEWAY);
    assert_eq!(
      status_of(Error::Internal("secret detail".into())),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn unauthenticated_carries_challenge() {
    let res = ApiError(Error::unauthenticated("no token provided")).into_response();
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
  }
}
