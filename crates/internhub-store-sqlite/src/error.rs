//! Error type for `internhub-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rejection raised inside a transaction (not found, wrong
  /// state, duplicate) and carried out of the connection thread.
  #[error(transparent)]
  Core(#[from] internhub_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unexpected column value: {0}")]
  Decode(String),

  #[error("password hashing failed: {0}")]
  Hash(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Wrap a domain error so it can leave a `Connection::call` closure.
pub(crate) fn reject(error: internhub_core::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(error))
}

/// Same as [`reject`] for this crate's own errors (decoding, hashing).
pub(crate) fn escape(error: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(error))
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Other(inner) => {
        let inner = match inner.downcast::<internhub_core::Error>() {
          Ok(core) => return Self::Core(*core),
          Err(other) => other,
        };
        match inner.downcast::<Error>() {
          Ok(own) => *own,
          Err(other) => Self::Database(tokio_rusqlite::Error::Other(other)),
        }
      }
      tokio_rusqlite::Error::Rusqlite(ref r) if is_unique_violation(r) => {
        Self::Core(internhub_core::Error::Conflict(
          "a record with the same key already exists".into(),
        ))
      }
      other => Self::Database(other),
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { tokio_rusqlite::Error::Rusqlite(e).into() }
}

impl From<Error> for internhub_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => internhub_core::Error::Storage(Box::new(other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_errors_survive_the_connection_thread() {
    let err: Error = reject(internhub_core::Error::not_found("nope")).into();
    assert!(matches!(err, Error::Core(internhub_core::Error::NotFound(_))));
  }

  #[test]
  fn storage_failures_become_opaque() {
    let err: internhub_core::Error = Error::DateParse("bad".into()).into();
    assert!(matches!(err, internhub_core::Error::Storage(_)));
  }
}
