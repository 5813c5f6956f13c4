//! The `HubStore` trait: everything the services need from persistent storage.
//!
//! The trait is implemented by storage backends (e.g. `internhub-store-sqlite`).
//! Services depend on this abstraction, not on any concrete backend. Every
//! listing that belongs to one profile is scoped by that profile's id, so
//! ownership is a property of the query rather than a check after the fact.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  account::{Account, GuideListing, GuideProfile, InternProfile, NewAccount},
  application::{
    Application, ApplicationListing, Assignment, Certificate, CertificateListing,
    NewApplication, NewAssignment, NewCertificate,
  },
  patch::{GuideProfilePatch, InternProfilePatch},
  project::{
    AdminProjectListing, GuideProjectSummary, GuideProjectView, NewProject, Project,
    ProjectDetail, ProjectPatch, ProjectStatus,
  },
  resume::{NewResume, Resume},
};

/// Abstraction over an InternHub storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
///
/// Lookups that find an account whose profile row is absent fail with
/// [`crate::Error::ProfileMissing`] rather than returning a half-built
/// [`Account`].
pub trait HubStore: Send + Sync {
  // ── Accounts ──────────────────────────────────────────────────────────

  /// Insert an account and its role profile in one transaction.
  ///
  /// Fails with [`crate::Error::Conflict`] if the id or email is taken.
  fn create_account(
    &self,
    account: NewAccount,
  ) -> impl Future<Output = Result<Account>> + Send + '_;

  fn find_account<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Account>>> + Send + 'a;

  /// `email` is normalised before lookup.
  fn find_account_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>>> + Send + 'a;

  fn clear_must_reset_password<'a>(
    &'a self,
    account_id: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Apply `patch` to the intern profile and bump `updated_at`.
  fn update_intern_profile(
    &self,
    intern_id: Uuid,
    patch: InternProfilePatch,
  ) -> impl Future<Output = Result<InternProfile>> + Send + '_;

  fn update_guide_profile(
    &self,
    guide_id: Uuid,
    patch: GuideProfilePatch,
  ) -> impl Future<Output = Result<GuideProfile>> + Send + '_;

  // ── Resumes ───────────────────────────────────────────────────────────

  /// An intern's resumes, newest upload first.
  fn list_resumes(
    &self,
    intern_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Resume>>> + Send + '_;

  /// Demote every resume of the intern and insert `resume` as the primary,
  /// atomically.
  fn insert_primary_resume(
    &self,
    resume: NewResume,
  ) -> impl Future<Output = Result<Resume>> + Send + '_;

  fn get_resume(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Resume>>> + Send + '_;

  // ── Projects ──────────────────────────────────────────────────────────

  /// Insert a `DRAFT` project with its phases and roles in one transaction.
  ///
  /// [`crate::Error::Forbidden`] if the guide has been deactivated, checked
  /// inside the same transaction.
  fn create_project(
    &self,
    guide_id: Uuid,
    project: NewProject,
  ) -> impl Future<Output = Result<ProjectDetail>> + Send + '_;

  /// The guide's projects with counts, newest first.
  fn list_guide_projects(
    &self,
    guide_id: Uuid,
  ) -> impl Future<Output = Result<Vec<GuideProjectSummary>>> + Send + '_;

  /// `None` if the project does not exist or belongs to another guide.
  fn get_guide_project(
    &self,
    guide_id: Uuid,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Option<GuideProjectView>>> + Send + '_;

  /// Update content fields of a project owned by `guide_id`.
  ///
  /// [`crate::Error::Forbidden`] if the guide is inactive,
  /// [`crate::Error::NotFound`] if the guide does not own such a project,
  /// [`crate::Error::InvalidState`] if it is not a draft. The status check and
  /// the write are one transaction; a rejected call changes nothing.
  fn update_draft_project(
    &self,
    guide_id: Uuid,
    project_id: Uuid,
    patch: ProjectPatch,
  ) -> impl Future<Output = Result<ProjectDetail>> + Send + '_;

  /// Move a project along its lifecycle. Edges outside
  /// [`ProjectStatus::can_transition_to`] fail with
  /// [`crate::Error::InvalidState`].
  fn set_project_status(
    &self,
    project_id: Uuid,
    status: ProjectStatus,
  ) -> impl Future<Output = Result<Project>> + Send + '_;

  // ── Administration ────────────────────────────────────────────────────

  /// Every guide with account fields and project count, newest account first.
  fn list_guides(&self) -> impl Future<Output = Result<Vec<GuideListing>>> + Send + '_;

  fn set_guide_active(
    &self,
    guide_id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<GuideProfile>> + Send + '_;

  /// Every project, newest first.
  fn list_all_projects(
    &self,
  ) -> impl Future<Output = Result<Vec<AdminProjectListing>>> + Send + '_;

  // ── Applications, assignments, certificates ──────────────────────────

  fn list_applications(
    &self,
    intern_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ApplicationListing>>> + Send + '_;

  fn list_certificates(
    &self,
    intern_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CertificateListing>>> + Send + '_;

  /// An intern may apply to a given role once.
  fn record_application(
    &self,
    application: NewApplication,
  ) -> impl Future<Output = Result<Application>> + Send + '_;

  fn record_assignment(
    &self,
    assignment: NewAssignment,
  ) -> impl Future<Output = Result<Assignment>> + Send + '_;

  fn issue_certificate(
    &self,
    certificate: NewCertificate,
  ) -> impl Future<Output = Result<Certificate>> + Send + '_;
}
