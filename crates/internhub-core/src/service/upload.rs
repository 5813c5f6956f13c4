//! Resume upload and retrieval.

use chrono::Utc;
use rand_core::{OsRng, RngCore};
use uuid::Uuid;

use super::{Backend, Hub};
use crate::{
  Error, Result,
  account::{Profile, Role},
  guard::Caller,
  objects::Bucket,
  resume::{NewResume, Resume, UploadedFile, sanitize_file_name},
  store::HubStore,
};

/// `<accountId>/<unix-millis>-<8 hex>-<sanitised name>`. The random part keeps
/// two uploads in the same millisecond from colliding.
fn object_path(account_id: &str, file_name: &str) -> String {
  format!(
    "{account_id}/{}-{:08x}-{}",
    Utc::now().timestamp_millis(),
    OsRng.next_u32(),
    sanitize_file_name(file_name),
  )
}

impl<S: Backend> Hub<S> {
  /// Store a new resume and make it the intern's primary one.
  ///
  /// Nothing is written unless the file passes validation. If the database
  /// write fails after the bytes were stored, the object is removed again.
  pub async fn upload_resume(&self, caller: &Caller, file: UploadedFile) -> Result<Resume> {
    let (account, intern) = caller.require_intern()?;

    let errors = file.validate_resume();
    if !errors.is_empty() {
      return Err(Error::Validation(errors));
    }

    let path = object_path(&account.id, &file.file_name);
    let file_size = file.bytes.len() as u64;
    let locator = self
      .bounded(
        "object store",
        self
          .objects()
          .put(Bucket::Resumes, &path, file.bytes, &file.content_type),
      )
      .await?;

    let inserted = self
      .store
      .insert_primary_resume(NewResume {
        intern_id: intern.id,
        file_name: file.file_name.trim().to_owned(),
        storage_path: path.clone(),
        file_url: locator,
        file_size,
        mime_type: file.content_type,
      })
      .await;

    match inserted {
      Ok(resume) => {
        tracing::info!(resume = %resume.id, intern = %intern.id, size = file_size, "resume uploaded");
        Ok(resume)
      }
      Err(e) => {
        tracing::warn!(%path, error = %e, "resume insert failed, removing stored object");
        if let Err(cleanup) = self
          .bounded("object store", self.objects().delete(Bucket::Resumes, &path))
          .await
        {
          tracing::error!(%path, error = %cleanup, "orphaned resume object");
        }
        Err(e)
      }
    }
  }

  /// A fetchable URL for a stored resume. Interns may only ask for their own.
  pub async fn resume_url(&self, caller: &Caller, resume_id: Uuid) -> Result<String> {
    let account = caller.require_role(&[Role::Intern, Role::Guide, Role::Admin])?;

    let resume = self
      .store
      .get_resume(resume_id)
      .await?
      .ok_or_else(|| Error::not_found("resume not found"))?;

    if let Profile::Intern(intern) = &account.profile {
      if intern.id != resume.intern_id {
        return Err(Error::Forbidden("access denied".into()));
      }
    }

    self
      .bounded(
        "object store",
        self.objects().url(Bucket::Resumes, &resume.storage_path),
      )
      .await
  }
}
