//! Handlers for `/upload` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/upload/resume` | Multipart, file in field `resume`; INTERN only |
//! | `GET`  | `/upload/resume/{id}/url` | Interns may only ask about their own resumes |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Multipart, State, multipart::MultipartRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use internhub_core::{
  Error,
  account::Role,
  resume::{Resume, UploadedFile},
  service::{Backend, Hub},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{Auth, IdPath},
};

const FIELD: &str = "resume";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedResume {
  pub id:          Uuid,
  pub file_name:   String,
  pub file_url:    String,
  pub uploaded_at: DateTime<Utc>,
}

impl From<Resume> for UploadedResume {
  fn from(r: Resume) -> Self {
    Self {
      id:          r.id,
      file_name:   r.file_name,
      file_url:    r.file_url,
      uploaded_at: r.uploaded_at,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
  pub message: &'static str,
  pub resume:  UploadedResume,
}

/// Pull the `resume` file out of the form, ignoring any other fields.
async fn read_resume(mut form: Multipart) -> Result<UploadedFile, Error> {
  let unreadable = |e: axum::extract::multipart::MultipartError| {
    Error::invalid(FIELD, e.body_text())
  };
  while let Some(field) = form.next_field().await.map_err(unreadable)? {
    if field.name() != Some(FIELD) {
      continue;
    }
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let content_type = field.content_type().unwrap_or_default().to_owned();
    let bytes = field.bytes().await.map_err(unreadable)?;
    return Ok(UploadedFile { file_name, content_type, bytes });
  }
  Err(Error::invalid(FIELD, "no file uploaded"))
}

/// `POST /upload/resume`
pub async fn resume<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
  form: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require_role(&[Role::Intern])?;
  let form = form.map_err(|e| Error::invalid(FIELD, e.body_text()))?;
  let file = read_resume(form).await?;

  let resume = hub.upload_resume(&caller, file).await?;
  Ok((
    StatusCode::CREATED,
    Json(UploadResponse {
      message: "Resume uploaded successfully",
      resume:  resume.into(),
    }),
  ))
}

#[derive(Debug, Serialize)]
pub struct ResumeUrl {
  pub url: String,
}

/// `GET /upload/resume/{id}/url`
pub async fn resume_url<S: Backend>(
  State(hub): State<Arc<Hub<S>>>,
  Auth(caller): Auth,
  IdPath(id): IdPath<Uuid>,
) -> Result<Json<ResumeUrl>, ApiError> {
  let url = hub.resume_url(&caller, id).await?;
  Ok(Json(ResumeUrl { url }))
}
