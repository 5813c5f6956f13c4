//! A filesystem [`ObjectStore`] with signed, expiring download links.
//!
//! Objects live at `<root>/<bucket>/<path>`. A link is
//! `<public_url>/files/<bucket>/<path>?expires=<unix>&sig=<hex>`, where the
//! signature is HMAC-SHA256, keyed by the link secret, over the object key and
//! the expiry.

use std::{
  io::ErrorKind,
  path::{Component, Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::{
  Router,
  extract::{Path as UrlPath, Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
  routing::get,
};
use bytes::Bytes;
use chrono::Utc;
use internhub_core::{
  Error, Result,
  objects::{BoxFuture, Bucket, ObjectStore},
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tokio::{fs, io::AsyncWriteExt as _};

type HmacSha256 = Hmac<Sha256>;

pub struct FsObjectStore {
  root:       PathBuf,
  public_url: String,
  link_key:   HmacSha256,
  link_ttl:   Duration,
}

fn unavailable(e: std::io::Error) -> Error { Error::Upstream(format!("object store: {e}")) }

/// Reject anything that could escape the bucket directory.
fn check_path(path: &str) -> Result<()> {
  let ok = !path.is_empty()
    && Path::new(path)
      .components()
      .all(|c| matches!(c, Component::Normal(_)));
  if ok { Ok(()) } else { Err(Error::invalid("path", "invalid object path")) }
}

impl FsObjectStore {
  /// Create the bucket directories under `root` if needed.
  pub async fn open(
    root: impl Into<PathBuf>,
    public_url: impl Into<String>,
    secret: Vec<u8>,
    link_ttl: Duration,
  ) -> std::io::Result<Self> {
    let root = root.into();
    let link_key = HmacSha256::new_from_slice(&secret)
      .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e.to_string()))?;
    for bucket in [Bucket::Resumes, Bucket::Certificates] {
      fs::create_dir_all(root.join(bucket.as_str())).await?;
    }
    Ok(Self {
      root,
      public_url: public_url.into().trim_end_matches('/').to_owned(),
      link_key,
      link_ttl,
    })
  }

  fn locate(&self, bucket: Bucket, path: &str) -> Result<PathBuf> {
    check_path(path)?;
    Ok(self.root.join(bucket.as_str()).join(path))
  }

  fn link_mac(&self, bucket: Bucket, path: &str, expires: i64) -> HmacSha256 {
    let mut mac = self.link_key.clone();
    mac.update(bucket.as_str().as_bytes());
    mac.update(b"/");
    mac.update(path.as_bytes());
    mac.update(&expires.to_be_bytes());
    mac
  }

  fn signature(&self, bucket: Bucket, path: &str, expires: i64) -> String {
    hex::encode(self.link_mac(bucket, path, expires).finalize().into_bytes())
  }

  /// Whether a link presented at `now` is genuine and unexpired.
  pub fn verify(&self, bucket: Bucket, path: &str, expires: i64, sig: &str, now: i64) -> bool {
    let Ok(raw) = hex::decode(sig) else {
      return false;
    };
    expires > now && self.link_mac(bucket, path, expires).verify_slice(&raw).is_ok()
  }

  pub async fn read(&self, bucket: Bucket, path: &str) -> Result<Vec<u8>> {
    match fs::read(self.locate(bucket, path)?).await {
      Ok(bytes) => Ok(bytes),
      Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::not_found("object not found")),
      Err(e) => Err(unavailable(e)),
    }
  }

  fn list_blocking(dir: &Path, rel: &str, out: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
      let entry = entry?;
      let name = entry.file_name().to_string_lossy().into_owned();
      let rel = if rel.is_empty() { name } else { format!("{rel}/{name}") };
      if entry.file_type()?.is_dir() {
        Self::list_blocking(&entry.path(), &rel, out)?;
      } else {
        out.push(rel);
      }
    }
    Ok(())
  }
}

impl ObjectStore for FsObjectStore {
  fn put<'a>(
    &'a self,
    bucket: Bucket,
    path: &'a str,
    bytes: Bytes,
    _content_type: &'a str,
  ) -> BoxFuture<'a, Result<String>> {
    Box::pin(async move {
      let target = self.locate(bucket, path)?;
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await.map_err(unavailable)?;
      }
      let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
        .await
      {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
          return Err(Error::Conflict(format!("object {bucket}/{path} already exists")));
        }
        Err(e) => return Err(unavailable(e)),
      };
      file.write_all(&bytes).await.map_err(unavailable)?;
      file.sync_all().await.map_err(unavailable)?;
      tracing::debug!(%bucket, path, size = bytes.len(), "object stored");
      Ok(format!("{bucket}/{path}"))
    })
  }

  fn url<'a>(&'a self, bucket: Bucket, path: &'a str) -> BoxFuture<'a, Result<String>> {
    Box::pin(async move {
      let target = self.locate(bucket, path)?;
      if !fs::try_exists(&target).await.map_err(unavailable)? {
        return Err(Error::not_found("object not found"));
      }
      let ttl = i64::try_from(self.link_ttl.as_secs()).unwrap_or(i64::MAX);
      let expires = Utc::now().timestamp().saturating_add(ttl);
      let sig = self.signature(bucket, path, expires);
      Ok(format!(
        "{}/files/{bucket}/{path}?expires={expires}&sig={sig}",
        self.public_url
      ))
    })
  }

  fn delete<'a>(&'a self, bucket: Bucket, path: &'a str) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
      match fs::remove_file(self.locate(bucket, path)?).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(unavailable(e)),
      }
    })
  }

  fn list<'a>(
    &'a self,
    bucket: Bucket,
    prefix: Option<&'a str>,
  ) -> BoxFuture<'a, Result<Vec<String>>> {
    Box::pin(async move {
      let dir = self.root.join(bucket.as_str());
      let mut paths = tokio::task::spawn_blocking(move || {
        let mut out = Vec::new();
        Self::list_blocking(&dir, "", &mut out).map(|()| out)
      })
      .await
      .map_err(|e| Error::Internal(e.to_string()))?
      .map_err(unavailable)?;
      if let Some(prefix) = prefix {
        paths.retain(|p| p.starts_with(prefix));
      }
      paths.sort();
      Ok(paths)
    })
  }
}

// ─── Download route ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LinkParams {
  pub expires: i64,
  pub sig:     String,
}

/// `GET /files/{bucket}/{*path}`: serve an object behind a valid signed link.
async fn download(
  State(store): State<Arc<FsObjectStore>>,
  UrlPath((bucket, path)): UrlPath<(Bucket, String)>,
  Query(link): Query<LinkParams>,
) -> Response {
  if !store.verify(bucket, &path, link.expires, &link.sig, Utc::now().timestamp()) {
    return (StatusCode::FORBIDDEN, "invalid or expired link").into_response();
  }
  match store.read(bucket, &path).await {
    Ok(bytes) => {
      let content_type = if path.ends_with(".pdf") {
        "application/pdf"
      } else {
        "application/octet-stream"
      };
      ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
    }
    Err(Error::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
    Err(e) => {
      tracing::warn!(%bucket, %path, error = %e, "download failed");
      StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
  }
}

pub fn download_router(store: Arc<FsObjectStore>) -> Router<()> {
  Router::new()
    .route("/files/{bucket}/{*path}", get(download))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn store() -> FsObjectStore {
    let root = std::env::temp_dir().join(format!("internhub-objects-{}", uuid::Uuid::new_v4()));
    FsObjectStore::open(root, "http://files.test/", b"secret".to_vec(), Duration::from_secs(60))
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn put_never_overwrites() {
    let s = store().await;
    s.put(Bucket::Resumes, "a/cv.pdf", Bytes::from_static(b"one"), "application/pdf")
      .await
      .unwrap();
    let err = s
      .put(Bucket::Resumes, "a/cv.pdf", Bytes::from_static(b"two"), "application/pdf")
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(s.read(Bucket::Resumes, "a/cv.pdf").await.unwrap(), b"one");
  }

  #[tokio::test]
  async fn paths_cannot_escape_the_bucket() {
    let s = store().await;
    for bad in ["../x.pdf", "/etc/passwd", "a/../../x", ""] {
      let err = s
        .put(Bucket::Resumes, bad, Bytes::from_static(b"x"), "application/pdf")
        .await
        .unwrap_err();
      assert!(matches!(err, Error::Validation(_)), "{bad}");
    }
  }

  #[tokio::test]
  async fn list_filters_by_prefix() {
    let s = store().await;
    for path in ["u1/a.pdf", "u1/b.pdf", "u2/c.pdf"] {
      s.put(Bucket::Resumes, path, Bytes::from_static(b"x"), "application/pdf")
        .await
        .unwrap();
    }
    assert_eq!(
      s.list(Bucket::Resumes, Some("u1/")).await.unwrap(),
      ["u1/a.pdf", "u1/b.pdf"]
    );
    assert_eq!(s.list(Bucket::Resumes, None).await.unwrap().len(), 3);
    assert!(s.list(Bucket::Certificates, None).await.unwrap().is_empty());

    s.delete(Bucket::Resumes, "u1/a.pdf").await.unwrap();
    s.delete(Bucket::Resumes, "u1/a.pdf").await.unwrap();
    assert_eq!(s.list(Bucket::Resumes, Some("u1/")).await.unwrap(), ["u1/b.pdf"]);
  }

  #[tokio::test]
  async fn links_are_signed_and_expire() {
    let s = store().await;
    s.put(Bucket::Resumes, "u1/cv.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
      .await
      .unwrap();
    let url = s.url(Bucket::Resumes, "u1/cv.pdf").await.unwrap();
    assert!(url.starts_with("http://files.test/files/resumes/u1/cv.pdf?expires="));

    let query = url.split_once('?').unwrap().1;
    let mut expires = 0;
    let mut sig = "";
    for pair in query.split('&') {
      match pair.split_once('=').unwrap() {
        ("expires", v) => expires = v.parse().unwrap(),
        ("sig", v) => sig = v,
        _ => {}
      }
    }
    let now = Utc::now().timestamp();
    assert!(s.verify(Bucket::Resumes, "u1/cv.pdf", expires, sig, now));
    assert!(!s.verify(Bucket::Resumes, "u1/other.pdf", expires, sig, now));
    assert!(!s.verify(Bucket::Resumes, "u1/cv.pdf", expires, sig, expires + 1));

    assert!(matches!(
      s.url(Bucket::Resumes, "u1/missing.pdf").await.unwrap_err(),
      Error::NotFound(_)
    ));
  }

  #[tokio::test]
  async fn signatures_are_keyed_hmac() {
    use sha2::Digest as _;

    let s = store().await;
    let sig = s.signature(Bucket::Resumes, "u/cv.pdf", 42);

    let mut expected = HmacSha256::new_from_slice(b"secret").unwrap();
    expected.update(b"resumes/u/cv.pdf");
    expected.update(&42i64.to_be_bytes());
    assert_eq!(sig, hex::encode(expected.finalize().into_bytes()));

    let mut prefixed = Sha256::new();
    prefixed.update(b"secret");
    prefixed.update(b"resumes/u/cv.pdf");
    prefixed.update(42i64.to_be_bytes());
    assert_ne!(sig, hex::encode(prefixed.finalize()));

    assert!(s.verify(Bucket::Resumes, "u/cv.pdf", 42, &sig, 0));
    assert!(!s.verify(Bucket::Resumes, "u/cv.pdf", 42, &sig[..62], 0));
    assert!(!s.verify(Bucket::Resumes, "u/cv.pdf", 42, "not hex", 0));
  }

  #[tokio::test]
  async fn download_route_checks_the_signature() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt as _;

    let s = Arc::new(store().await);
    s.put(Bucket::Resumes, "u1/cv.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
      .await
      .unwrap();
    let url = s.url(Bucket::Resumes, "u1/cv.pdf").await.unwrap();
    let path_and_query = url.strip_prefix("http://files.test").unwrap().to_owned();

    let ok = download_router(s.clone())
      .oneshot(Request::builder().uri(&path_and_query).body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(ok.headers()[header::CONTENT_TYPE], "application/pdf");

    let forged = path_and_query.replace("sig=", "sig=00");
    let denied = download_router(s)
      .oneshot(Request::builder().uri(&forged).body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
  }
}
