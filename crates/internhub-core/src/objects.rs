//! The object-store boundary: where uploaded bytes live.
//!
//! Unlike [`crate::store::HubStore`] this trait is object-safe, since the
//! backend is chosen at runtime from configuration.

use std::{fmt, future::Future, pin::Pin};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Result;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The two fixed logical namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
  Resumes,
  Certificates,
}

impl Bucket {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Resumes => "resumes",
      Self::Certificates => "certificates",
    }
  }
}

impl fmt::Display for Bucket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

pub trait ObjectStore: Send + Sync {
  /// Store `bytes` at `path`. An existing object at `path` is never replaced;
  /// the call fails with [`crate::Error::Conflict`] instead. Returns the
  /// locator to persist.
  fn put<'a>(
    &'a self,
    bucket: Bucket,
    path: &'a str,
    bytes: Bytes,
    content_type: &'a str,
  ) -> BoxFuture<'a, Result<String>>;

  /// A URL a client can fetch the object from.
  fn url<'a>(&'a self, bucket: Bucket, path: &'a str) -> BoxFuture<'a, Result<String>>;

  fn delete<'a>(&'a self, bucket: Bucket, path: &'a str) -> BoxFuture<'a, Result<()>>;

  /// Paths under `prefix` (or the whole bucket).
  fn list<'a>(
    &'a self,
    bucket: Bucket,
    prefix: Option<&'a str>,
  ) -> BoxFuture<'a, Result<Vec<String>>>;
}
