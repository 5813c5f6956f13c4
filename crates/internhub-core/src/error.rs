//! Error types for `internhub-core`.
//!
//! Every service operation fails with one of these kinds. The HTTP layer maps
//! them to status codes in exactly one place.

use serde::Serialize;
use thiserror::Error;

use crate::account::Role;

/// A single input problem, reported back to the caller as part of a
/// [`Error::Validation`] list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self { field: field.into(), message: message.into() }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// No credential, or a credential the identity provider rejected.
  #[error("{0}")]
  Unauthenticated(String),

  /// Valid credential, wrong role or not the owner of the resource.
  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  /// An account exists for a role but its profile row does not.
  #[error("{role} profile not found for account {account_id}")]
  ProfileMissing { account_id: String, role: Role },

  #[error("{0}")]
  Conflict(String),

  /// The target is in a lifecycle state that forbids the operation.
  #[error("{0}")]
  InvalidState(String),

  #[error("validation failed")]
  Validation(Vec<FieldError>),

  /// An external collaborator (identity provider, object store, mailer)
  /// failed or timed out.
  #[error("upstream failure: {0}")]
  Upstream(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn unauthenticated(msg: impl Into<String>) -> Self {
    Self::Unauthenticated(msg.into())
  }

  pub fn not_found(msg: impl Into<String>) -> Self { Self::NotFound(msg.into()) }

  /// A validation failure on a single field.
  pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Validation(vec![FieldError::new(field, message)])
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self { Self::Internal(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
