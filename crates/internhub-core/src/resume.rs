//! Resumes uploaded by interns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FieldError;

/// Largest accepted resume, in bytes.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// The only accepted resume content type.
pub const RESUME_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
  pub id:           Uuid,
  pub intern_id:    Uuid,
  /// Original name as supplied by the uploader.
  pub file_name:    String,
  /// Object-store path inside the `resumes` bucket.
  pub storage_path: String,
  pub file_url:     String,
  pub file_size:    u64,
  pub mime_type:    String,
  /// At most one resume per intern carries this flag.
  pub is_primary:   bool,
  pub uploaded_at:  DateTime<Utc>,
}

/// Input to [`crate::store::HubStore::insert_primary_resume`].
#[derive(Debug, Clone)]
pub struct NewResume {
  pub intern_id:    Uuid,
  pub file_name:    String,
  pub storage_path: String,
  pub file_url:     String,
  pub file_size:    u64,
  pub mime_type:    String,
}

/// A file received from a multipart upload, not yet stored anywhere.
#[derive(Debug, Clone)]
pub struct UploadedFile {
  pub file_name:    String,
  pub content_type: String,
  pub bytes:        bytes::Bytes,
}

impl UploadedFile {
  /// Check the upload against the resume policy. Runs before any write.
  pub fn validate_resume(&self) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if self.file_name.trim().is_empty() {
      errors.push(FieldError::new("resume", "file name is required"));
    }
    if self.content_type != RESUME_MIME_TYPE {
      errors.push(FieldError::new("resume", "only PDF files are allowed"));
    }
    if self.bytes.is_empty() {
      errors.push(FieldError::new("resume", "file is empty"));
    } else if self.bytes.len() > MAX_RESUME_BYTES {
      errors.push(FieldError::new("resume", "file exceeds the 5 MiB limit"));
    }
    errors
  }
}

/// Reduce an uploaded file name to a safe single path segment.
pub fn sanitize_file_name(name: &str) -> String {
  let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
  let cleaned: String = base
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
        c
      } else {
        '_'
      }
    })
    .collect();
  let cleaned = cleaned.trim_start_matches('.');
  if cleaned.is_empty() { "resume.pdf".to_owned() } else { cleaned.to_owned() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pdf(len: usize) -> UploadedFile {
    UploadedFile {
      file_name:    "cv.pdf".into(),
      content_type: RESUME_MIME_TYPE.into(),
      bytes:        bytes::Bytes::from(vec![b'%'; len]),
    }
  }

  #[test]
  fn accepts_small_pdf() {
    assert!(pdf(1024).validate_resume().is_empty());
  }

  #[test]
  fn rejects_oversize_and_wrong_type() {
    assert_eq!(pdf(MAX_RESUME_BYTES + 1).validate_resume().len(), 1);

    let mut doc = pdf(10);
    doc.content_type = "application/msword".into();
    assert_eq!(doc.validate_resume()[0].message, "only PDF files are allowed");
  }

  #[test]
  fn sanitises_paths_and_odd_characters() {
    assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
    assert_eq!(sanitize_file_name("my cv (final).pdf"), "my_cv__final_.pdf");
    assert_eq!(sanitize_file_name("..."), "resume.pdf");
  }
}
