//! [`SqliteStore`]: the SQLite implementation of [`HubStore`].

use std::path::Path;

use chrono::{Duration, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use internhub_core::{
  Result as HubResult,
  account::{Account, GuideListing, GuideProfile, InternProfile, NewAccount, Role, normalize_email},
  application::{
    Application, ApplicationListing, Assignment, Certificate, CertificateListing,
    NewApplication, NewAssignment, NewCertificate, ProjectApplicant, ProjectAssignee,
  },
  patch::{GuideProfilePatch, InternProfilePatch},
  project::{
    AdminProjectListing, GuideProjectSummary, GuideProjectView, NewProject, Phase,
    PhaseStatus, Project, ProjectCounts, ProjectDetail, ProjectPatch, ProjectRole,
    ProjectStatus,
  },
  resume::{NewResume, Resume},
  store::HubStore,
};

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, ADMIN_COLUMNS, APPLICATION_COLUMNS, APPLICATION_WIDTH,
    ASSIGNMENT_COLUMNS, ASSIGNMENT_WIDTH, CERTIFICATE_COLUMNS, GUIDE_COLUMNS, INTERN_COLUMNS,
    PHASE_COLUMNS, PROJECT_COLUMNS, PROJECT_WIDTH, RESUME_COLUMNS, ROLE_COLUMNS, RawAccount,
    RawAdminProfile, RawApplication, RawAssignment, RawCertificate, RawGuideProfile,
    RawInternProfile, RawPhase, RawProfile, RawProject, RawResume, RawRole, encode_dt,
    encode_list, encode_uuid,
  },
  error::{escape, reject},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An InternHub store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All
/// statements run on the connection's own thread, one at a time.
#[derive(Clone)]
pub struct SqliteStore {
  conn:                   tokio_rusqlite::Connection,
  pub(crate) session_ttl: Duration,
  pub(crate) reset_ttl:   Duration,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store. Useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self {
      conn,
      session_ttl: Duration::hours(1),
      reset_ttl: Duration::hours(1),
    };
    store
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(store)
  }

  /// Lifetime of bearer tokens issued by [`IdentityProvider::sign_in`].
  ///
  /// [`IdentityProvider::sign_in`]: internhub_core::identity::IdentityProvider::sign_in
  pub fn with_session_ttl(mut self, ttl: std::time::Duration) -> Self {
    self.session_ttl = Duration::from_std(ttl).unwrap_or(self.session_ttl);
    self
  }

  pub(crate) async fn call<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Connection) -> tokio_rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    Ok(self.conn.call(f).await?)
  }

  async fn account_where(&self, column: &'static str, value: String) -> Result<Option<Account>> {
    let raw = self
      .call(move |conn| Ok(load_account(conn, column, &value)?))
      .await?;
    raw
      .map(|(account, profile)| account.into_account(profile))
      .transpose()
  }
}

// ─── Row loaders (run on the connection thread) ──────────────────────────────

fn load_account(
  conn: &Connection,
  column: &str,
  value: &str,
) -> rusqlite::Result<Option<(RawAccount, Option<RawProfile>)>> {
  let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts a WHERE a.{column} = ?1");
  let Some(account) = conn
    .query_row(&sql, [value], RawAccount::from_row)
    .optional()?
  else {
    return Ok(None);
  };

  let profile = match account.role.as_str() {
    "INTERN" => conn
      .query_row(
        &format!("SELECT {INTERN_COLUMNS} FROM intern_profiles p WHERE p.account_id = ?1"),
        [&account.id],
        RawInternProfile::from_row,
      )
      .optional()?
      .map(RawProfile::Intern),
    "GUIDE" => conn
      .query_row(
        &format!("SELECT {GUIDE_COLUMNS} FROM guide_profiles g WHERE g.account_id = ?1"),
        [&account.id],
        RawGuideProfile::from_row,
      )
      .optional()?
      .map(RawProfile::Guide),
    "ADMIN" => conn
      .query_row(
        &format!("SELECT {ADMIN_COLUMNS} FROM admin_profiles d WHERE d.account_id = ?1"),
        [&account.id],
        RawAdminProfile::from_row,
      )
      .optional()?
      .map(RawProfile::Admin),
    _ => None,
  };

  Ok(Some((account, profile)))
}

fn load_intern(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawInternProfile>> {
  conn
    .query_row(
      &format!("SELECT {INTERN_COLUMNS} FROM intern_profiles p WHERE p.id = ?1"),
      [id],
      RawInternProfile::from_row,
    )
    .optional()
}

fn load_guide(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawGuideProfile>> {
  conn
    .query_row(
      &format!("SELECT {GUIDE_COLUMNS} FROM guide_profiles g WHERE g.id = ?1"),
      [id],
      RawGuideProfile::from_row,
    )
    .optional()
}

/// Refuse writes on behalf of a guide who is unknown or deactivated.
fn require_active_guide(conn: &Connection, guide_id: &str) -> tokio_rusqlite::Result<()> {
  let active: Option<bool> = conn
    .query_row(
      "SELECT is_active FROM guide_profiles WHERE id = ?1",
      [guide_id],
      |row| row.get(0),
    )
    .optional()?;
  match active {
    Some(true) => Ok(()),
    Some(false) => Err(reject(internhub_core::Error::Forbidden(
      "guide account is inactive".into(),
    ))),
    None => Err(reject(internhub_core::Error::not_found("guide not found"))),
  }
}

/// A project row, optionally restricted to one owning guide.
fn load_project(
  conn: &Connection,
  project_id: &str,
  guide_id: Option<&str>,
) -> rusqlite::Result<Option<RawProject>> {
  match guide_id {
    Some(guide) => conn
      .query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?1 AND p.guide_id = ?2"),
        [project_id, guide],
        RawProject::from_row,
      )
      .optional(),
    None => conn
      .query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?1"),
        [project_id],
        RawProject::from_row,
      )
      .optional(),
  }
}

/// Raw strings for a project together with its phases and roles.
struct RawDetail {
  project: RawProject,
  phases:  Vec<RawPhase>,
  roles:   Vec<RawRole>,
}

impl RawDetail {
  fn into_detail(self) -> Result<ProjectDetail> {
    Ok(ProjectDetail {
      project: self.project.into_project()?,
      phases:  self
        .phases
        .into_iter()
        .map(RawPhase::into_phase)
        .collect::<Result<_>>()?,
      roles:   self
        .roles
        .into_iter()
        .map(RawRole::into_role)
        .collect::<Result<_>>()?,
    })
  }
}

fn load_detail(conn: &Connection, project: RawProject) -> rusqlite::Result<RawDetail> {
  let phases = conn
    .prepare(&format!(
      "SELECT {PHASE_COLUMNS} FROM phases WHERE project_id = ?1 ORDER BY phase_order, rowid"
    ))?
    .query_map([&project.id], RawPhase::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let roles = conn
    .prepare(&format!(
      "SELECT {ROLE_COLUMNS} FROM project_roles WHERE project_id = ?1 ORDER BY rowid"
    ))?
    .query_map([&project.id], RawRole::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(RawDetail { project, phases, roles })
}

// ─── HubStore impl ───────────────────────────────────────────────────────────

impl HubStore for SqliteStore {
  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> HubResult<Account> {
    let now = encode_dt(Utc::now());
    let email = normalize_email(&input.email);

    let raw = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "INSERT INTO accounts (id, email, role, email_verified, must_reset_password,
                                 created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![
            input.id,
            email,
            input.role.as_str(),
            input.email_verified,
            input.must_reset_password,
            now,
          ],
        )?;

        let profile_id = encode_uuid(Uuid::new_v4());
        match input.role {
          Role::Intern => tx.execute(
            "INSERT INTO intern_profiles (id, account_id, first_name, last_name,
                                          created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![profile_id, input.id, input.first_name, input.last_name, now],
          )?,
          Role::Guide => tx.execute(
            "INSERT INTO guide_profiles (id, account_id, first_name, last_name,
                                         is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
            rusqlite::params![profile_id, input.id, input.first_name, input.last_name, now],
          )?,
          Role::Admin => tx.execute(
            "INSERT INTO admin_profiles (id, account_id, first_name, last_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![profile_id, input.id, input.first_name, input.last_name, now],
          )?,
        };

        let loaded = load_account(&tx, "id", &input.id)?;
        tx.commit()?;
        Ok(loaded)
      })
      .await?;

    let (account, profile) =
      raw.ok_or_else(|| Error::Decode("account vanished after insert".into()))?;
    tracing::debug!(account = %account.id, role = %account.role, "account created");
    Ok(account.into_account(profile)?)
  }

  async fn find_account<'a>(&'a self, id: &'a str) -> HubResult<Option<Account>> {
    Ok(self.account_where("id", id.to_owned()).await?)
  }

  async fn find_account_by_email<'a>(&'a self, email: &'a str) -> HubResult<Option<Account>> {
    Ok(self.account_where("email", normalize_email(email)).await?)
  }

  async fn clear_must_reset_password<'a>(&'a self, account_id: &'a str) -> HubResult<()> {
    let id = account_id.to_owned();
    let now = encode_dt(Utc::now());
    self
      .call(move |conn| {
        conn.execute(
          "UPDATE accounts SET must_reset_password = 0, updated_at = ?2 WHERE id = ?1",
          rusqlite::params![id, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn update_intern_profile(
    &self,
    intern_id: Uuid,
    patch: InternProfilePatch,
  ) -> HubResult<InternProfile> {
    let id = encode_uuid(intern_id);
    let now = Utc::now();

    let profile = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let raw = load_intern(&tx, &id)?.ok_or_else(|| {
          reject(internhub_core::Error::not_found("intern profile not found"))
        })?;
        let mut profile = raw.into_profile().map_err(escape)?;
        patch.apply_to(&mut profile);
        profile.updated_at = now;

        tx.execute(
          "UPDATE intern_profiles
              SET first_name = ?2, last_name = ?3, phone = ?4, bio = ?5, skills = ?6,
                  institution = ?7, year_of_study = ?8, updated_at = ?9
            WHERE id = ?1",
          rusqlite::params![
            id,
            profile.first_name,
            profile.last_name,
            profile.phone,
            profile.bio,
            encode_list(&profile.skills).map_err(escape)?,
            profile.institution,
            profile.year_of_study,
            encode_dt(now),
          ],
        )?;
        tx.commit()?;
        Ok(profile)
      })
      .await?;
    Ok(profile)
  }

  async fn update_guide_profile(
    &self,
    guide_id: Uuid,
    patch: GuideProfilePatch,
  ) -> HubResult<GuideProfile> {
    let id = encode_uuid(guide_id);
    let now = Utc::now();

    let profile = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let raw = load_guide(&tx, &id)?.ok_or_else(|| {
          reject(internhub_core::Error::not_found("guide profile not found"))
        })?;
        let mut profile = raw.into_profile().map_err(escape)?;
        patch.apply_to(&mut profile);
        profile.updated_at = now;

        tx.execute(
          "UPDATE guide_profiles
              SET first_name = ?2, last_name = ?3, phone = ?4, bio = ?5, expertise = ?6,
                  organization = ?7, updated_at = ?8
            WHERE id = ?1",
          rusqlite::params![
            id,
            profile.first_name,
            profile.last_name,
            profile.phone,
            profile.bio,
            encode_list(&profile.expertise).map_err(escape)?,
            profile.organization,
            encode_dt(now),
          ],
        )?;
        tx.commit()?;
        Ok(profile)
      })
      .await?;
    Ok(profile)
  }

  // ── Resumes ───────────────────────────────────────────────────────────────

  async fn list_resumes(&self, intern_id: Uuid) -> HubResult<Vec<Resume>> {
    let id = encode_uuid(intern_id);
    let raws = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RESUME_COLUMNS} FROM resumes r
            WHERE r.intern_id = ?1
            ORDER BY r.uploaded_at DESC, r.rowid DESC"
        ))?;
        let rows = stmt
          .query_map([id], |row| RawResume::from_row_at(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawResume::into_resume).collect::<Result<_>>()?)
  }

  async fn insert_primary_resume(&self, input: NewResume) -> HubResult<Resume> {
    let resume = Resume {
      id:           Uuid::new_v4(),
      intern_id:    input.intern_id,
      file_name:    input.file_name,
      storage_path: input.storage_path,
      file_url:     input.file_url,
      file_size:    input.file_size,
      mime_type:    input.mime_type,
      is_primary:   true,
      uploaded_at:  Utc::now(),
    };

    let row = resume.clone();
    self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let intern_id = encode_uuid(row.intern_id);
        tx.execute(
          "UPDATE resumes SET is_primary = 0 WHERE intern_id = ?1 AND is_primary = 1",
          [&intern_id],
        )?;
        tx.execute(
          "INSERT INTO resumes (id, intern_id, file_name, storage_path, file_url,
                                file_size, mime_type, is_primary, uploaded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
          rusqlite::params![
            encode_uuid(row.id),
            intern_id,
            row.file_name,
            row.storage_path,
            row.file_url,
            i64::try_from(row.file_size).unwrap_or(i64::MAX),
            row.mime_type,
            encode_dt(row.uploaded_at),
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(resume)
  }

  async fn get_resume(&self, id: Uuid) -> HubResult<Option<Resume>> {
    let id = encode_uuid(id);
    let raw = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RESUME_COLUMNS} FROM resumes r WHERE r.id = ?1"),
              [id],
              |row| RawResume::from_row_at(row, 0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(raw.map(RawResume::into_resume).transpose()?)
  }

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn create_project(&self, guide_id: Uuid, input: NewProject) -> HubResult<ProjectDetail> {
    let now = Utc::now();
    let project = Project {
      id: Uuid::new_v4(),
      guide_id,
      title: input.title.trim().to_owned(),
      short_description: input.short_description.trim().to_owned(),
      detailed_description: input.detailed_description.trim().to_owned(),
      scope: input.scope.trim().to_owned(),
      use_cases: input.use_cases,
      duration_weeks: input.duration_weeks,
      status: ProjectStatus::Draft,
      created_at: now,
      updated_at: now,
    };
    let mut phases: Vec<Phase> = input
      .phases
      .into_iter()
      .map(|p| Phase {
        id:          Uuid::new_v4(),
        project_id:  project.id,
        title:       p.title.trim().to_owned(),
        description: p.description,
        order:       p.order,
        status:      PhaseStatus::default(),
      })
      .collect();
    // Stable, so equal orders keep their submitted sequence.
    phases.sort_by_key(|p| p.order);
    let roles: Vec<ProjectRole> = input
      .roles
      .into_iter()
      .map(|r| ProjectRole {
        id:              Uuid::new_v4(),
        project_id:      project.id,
        title:           r.title.trim().to_owned(),
        description:     r.description,
        required_skills: r.required_skills,
        max_interns:     r.max_interns.unwrap_or(1),
      })
      .collect();

    let detail = ProjectDetail { project, phases, roles };
    let row = detail.clone();
    self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let p = &row.project;
        let project_id = encode_uuid(p.id);
        let guide_id = encode_uuid(p.guide_id);
        require_active_guide(&tx, &guide_id)?;
        tx.execute(
          "INSERT INTO projects (id, guide_id, title, short_description, detailed_description,
                                 scope, use_cases, duration_weeks, status, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            project_id,
            guide_id,
            p.title,
            p.short_description,
            p.detailed_description,
            p.scope,
            encode_list(&p.use_cases).map_err(escape)?,
            p.duration_weeks,
            p.status.as_str(),
            encode_dt(p.created_at),
          ],
        )?;
        for phase in &row.phases {
          tx.execute(
            "INSERT INTO phases (id, project_id, title, description, phase_order, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              encode_uuid(phase.id),
              project_id,
              phase.title,
              phase.description,
              phase.order,
              phase.status.as_str(),
            ],
          )?;
        }
        for role in &row.roles {
          tx.execute(
            "INSERT INTO project_roles (id, project_id, title, description,
                                        required_skills, max_interns)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              encode_uuid(role.id),
              project_id,
              role.title,
              role.description,
              encode_list(&role.required_skills).map_err(escape)?,
              role.max_interns,
            ],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(detail)
  }

  async fn list_guide_projects(&self, guide_id: Uuid) -> HubResult<Vec<GuideProjectSummary>> {
    let id = encode_uuid(guide_id);
    let rows = self
      .call(move |conn| {
        let conn: &Connection = conn;
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROJECT_COLUMNS},
                  (SELECT COUNT(*) FROM applications x WHERE x.project_id = p.id),
                  (SELECT COUNT(*) FROM assignments s WHERE s.project_id = p.id)
             FROM projects p
            WHERE p.guide_id = ?1
            ORDER BY p.created_at DESC, p.rowid DESC"
        ))?;
        let heads = stmt
          .query_map([id], |row| {
            Ok((
              RawProject::from_row(row)?,
              row.get::<_, i64>(PROJECT_WIDTH)?,
              row.get::<_, i64>(PROJECT_WIDTH + 1)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        heads
          .into_iter()
          .map(|(project, applications, assignments)| {
            Ok((load_detail(conn, project)?, applications, assignments))
          })
          .collect::<tokio_rusqlite::Result<Vec<_>>>()
      })
      .await?;

    let summaries = rows
      .into_iter()
      .map(|(detail, applications, assignments)| {
        Ok(GuideProjectSummary {
          detail: detail.into_detail()?,
          counts: ProjectCounts {
            applications: applications as u64,
            assignments:  assignments as u64,
          },
        })
      })
      .collect::<Result<_>>()?;
    Ok(summaries)
  }

  async fn get_guide_project(
    &self,
    guide_id: Uuid,
    project_id: Uuid,
  ) -> HubResult<Option<GuideProjectView>> {
    let guide = encode_uuid(guide_id);
    let id = encode_uuid(project_id);

    let raw = self
      .call(move |conn| {
        let conn: &Connection = conn;
        let Some(project) = load_project(conn, &id, Some(guide.as_str()))? else {
          return Ok(None);
        };
        let detail = load_detail(conn, project)?;

        let applicants = conn
          .prepare(&format!(
            "SELECT {APPLICATION_COLUMNS}, ip.first_name, ip.last_name, a.email, pr.title,
                    {RESUME_COLUMNS}
               FROM applications x
               JOIN intern_profiles ip ON ip.id = x.intern_id
               JOIN accounts a         ON a.id = ip.account_id
               JOIN project_roles pr   ON pr.id = x.role_id
               LEFT JOIN resumes r     ON r.id = x.resume_id
              WHERE x.project_id = ?1
              ORDER BY x.applied_at DESC, x.rowid DESC"
          ))?
          .query_map([&id], |row| {
            let w = APPLICATION_WIDTH;
            Ok((
              RawApplication::from_row(row)?,
              row.get::<_, String>(w)?,
              row.get::<_, String>(w + 1)?,
              row.get::<_, String>(w + 2)?,
              row.get::<_, String>(w + 3)?,
              RawResume::optional_at(row, w + 4)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let assignees = conn
          .prepare(&format!(
            "SELECT {ASSIGNMENT_COLUMNS}, ip.first_name, ip.last_name, a.email, pr.title
               FROM assignments s
               JOIN intern_profiles ip ON ip.id = s.intern_id
               JOIN accounts a         ON a.id = ip.account_id
               JOIN project_roles pr   ON pr.id = s.role_id
              WHERE s.project_id = ?1
              ORDER BY s.assigned_at DESC, s.rowid DESC"
          ))?
          .query_map([&id], |row| {
            let w = ASSIGNMENT_WIDTH;
            Ok((
              RawAssignment::from_row(row)?,
              row.get::<_, String>(w)?,
              row.get::<_, String>(w + 1)?,
              row.get::<_, String>(w + 2)?,
              row.get::<_, String>(w + 3)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((detail, applicants, assignees)))
      })
      .await?;

    let Some((detail, applicants, assignees)) = raw else {
      return Ok(None);
    };

    let applications = applicants
      .into_iter()
      .map(|(app, first, last, email, role_title, resume)| {
        Ok(ProjectApplicant {
          application: app.into_application()?,
          intern_name: format!("{first} {last}"),
          intern_email: email,
          role_title,
          resume: resume.map(RawResume::into_resume).transpose()?,
        })
      })
      .collect::<Result<_>>()?;
    let assignments = assignees
      .into_iter()
      .map(|(assignment, first, last, email, role_title)| {
        Ok(ProjectAssignee {
          assignment: assignment.into_assignment()?,
          intern_name: format!("{first} {last}"),
          intern_email: email,
          role_title,
        })
      })
      .collect::<Result<_>>()?;

    Ok(Some(GuideProjectView {
      detail: detail.into_detail()?,
      applications,
      assignments,
    }))
  }

  async fn update_draft_project(
    &self,
    guide_id: Uuid,
    project_id: Uuid,
    patch: ProjectPatch,
  ) -> HubResult<ProjectDetail> {
    let guide = encode_uuid(guide_id);
    let id = encode_uuid(project_id);
    let now = Utc::now();

    let detail = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        require_active_guide(&tx, &guide)?;
        let raw = load_project(&tx, &id, Some(guide.as_str()))?
          .ok_or_else(|| reject(internhub_core::Error::not_found("project not found")))?;
        let mut project = raw.into_project().map_err(escape)?;
        if !project.status.is_editable() {
          return Err(reject(internhub_core::Error::InvalidState(
            "only draft projects can be updated".into(),
          )));
        }

        patch.apply_to(&mut project);
        project.updated_at = now;
        let changed = tx.execute(
          "UPDATE projects
              SET title = ?2, short_description = ?3, detailed_description = ?4,
                  scope = ?5, use_cases = ?6, duration_weeks = ?7, updated_at = ?8
            WHERE id = ?1 AND status = 'DRAFT'",
          rusqlite::params![
            id,
            project.title,
            project.short_description,
            project.detailed_description,
            project.scope,
            encode_list(&project.use_cases).map_err(escape)?,
            project.duration_weeks,
            encode_dt(now),
          ],
        )?;
        if changed != 1 {
          return Err(reject(internhub_core::Error::InvalidState(
            "only draft projects can be updated".into(),
          )));
        }

        let fresh = load_project(&tx, &id, Some(guide.as_str()))?
          .ok_or_else(|| reject(internhub_core::Error::not_found("project not found")))?;
        let detail = load_detail(&tx, fresh)?;
        tx.commit()?;
        Ok(detail)
      })
      .await?;

    Ok(detail.into_detail()?)
  }

  async fn set_project_status(&self, project_id: Uuid, next: ProjectStatus) -> HubResult<Project> {
    let id = encode_uuid(project_id);
    let now = Utc::now();

    let project = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let raw = load_project(&tx, &id, None)?
          .ok_or_else(|| reject(internhub_core::Error::not_found("project not found")))?;
        let mut project = raw.into_project().map_err(escape)?;
        if !project.status.can_transition_to(next) {
          return Err(reject(internhub_core::Error::InvalidState(format!(
            "cannot move a {} project to {next}",
            project.status
          ))));
        }
        tx.execute(
          "UPDATE projects SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
          rusqlite::params![id, next.as_str(), encode_dt(now), project.status.as_str()],
        )?;
        tx.commit()?;
        project.status = next;
        project.updated_at = now;
        Ok(project)
      })
      .await?;

    tracing::info!(project = %project.id, status = %project.status, "project status changed");
    Ok(project)
  }

  // ── Administration ────────────────────────────────────────────────────────

  async fn list_guides(&self) -> HubResult<Vec<GuideListing>> {
    let rows = self
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GUIDE_COLUMNS}, a.email, a.email_verified, a.created_at,
                  (SELECT COUNT(*) FROM projects p WHERE p.guide_id = g.id)
             FROM guide_profiles g
             JOIN accounts a ON a.id = g.account_id
            ORDER BY a.created_at DESC, a.rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], |row| {
            Ok((
              RawGuideProfile::from_row(row)?,
              row.get::<_, String>(11)?,
              row.get::<_, bool>(12)?,
              row.get::<_, String>(13)?,
              row.get::<_, i64>(14)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let listings = rows
      .into_iter()
      .map(|(profile, email, email_verified, created_at, projects)| {
        Ok(GuideListing {
          profile: profile.into_profile()?,
          email,
          email_verified,
          account_created_at: crate::encode::decode_dt(&created_at)?,
          project_count: projects as u64,
        })
      })
      .collect::<Result<_>>()?;
    Ok(listings)
  }

  async fn set_guide_active(&self, guide_id: Uuid, active: bool) -> HubResult<GuideProfile> {
    let id = encode_uuid(guide_id);
    let now = encode_dt(Utc::now());

    let raw = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE guide_profiles SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
          rusqlite::params![id, active, now],
        )?;
        if changed == 0 {
          return Err(reject(internhub_core::Error::not_found("guide not found")));
        }
        let raw = load_guide(&tx, &id)?
          .ok_or_else(|| reject(internhub_core::Error::not_found("guide not found")))?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;
    Ok(raw.into_profile()?)
  }

  async fn list_all_projects(&self) -> HubResult<Vec<AdminProjectListing>> {
    let rows = self
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROJECT_COLUMNS}, g.first_name, g.last_name, a.email,
                  (SELECT COUNT(*) FROM applications x WHERE x.project_id = p.id),
                  (SELECT COUNT(*) FROM assignments s WHERE s.project_id = p.id)
             FROM projects p
             JOIN guide_profiles g ON g.id = p.guide_id
             JOIN accounts a       ON a.id = g.account_id
            ORDER BY p.created_at DESC, p.rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], |row| {
            let w = PROJECT_WIDTH;
            Ok((
              RawProject::from_row(row)?,
              row.get::<_, String>(w)?,
              row.get::<_, String>(w + 1)?,
              row.get::<_, String>(w + 2)?,
              row.get::<_, i64>(w + 3)?,
              row.get::<_, i64>(w + 4)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let listings = rows
      .into_iter()
      .map(|(project, first, last, email, applications, assignments)| {
        Ok(AdminProjectListing {
          project:     project.into_project()?,
          guide_name:  format!("{first} {last}"),
          guide_email: email,
          counts:      ProjectCounts {
            applications: applications as u64,
            assignments:  assignments as u64,
          },
        })
      })
      .collect::<Result<_>>()?;
    Ok(listings)
  }

  // ── Applications, assignments, certificates ──────────────────────────────

  async fn list_applications(&self, intern_id: Uuid) -> HubResult<Vec<ApplicationListing>> {
    let id = encode_uuid(intern_id);
    let rows = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {APPLICATION_COLUMNS}, p.title, ga.email, pr.title, {RESUME_COLUMNS}
             FROM applications x
             JOIN projects p       ON p.id = x.project_id
             JOIN guide_profiles g ON g.id = p.guide_id
             JOIN accounts ga      ON ga.id = g.account_id
             JOIN project_roles pr ON pr.id = x.role_id
             LEFT JOIN resumes r   ON r.id = x.resume_id
            WHERE x.intern_id = ?1
            ORDER BY x.applied_at DESC, x.rowid DESC"
        ))?;
        let rows = stmt
          .query_map([id], |row| {
            let w = APPLICATION_WIDTH;
            Ok((
              RawApplication::from_row(row)?,
              row.get::<_, String>(w)?,
              row.get::<_, String>(w + 1)?,
              row.get::<_, String>(w + 2)?,
              RawResume::optional_at(row, w + 3)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let listings = rows
      .into_iter()
      .map(|(app, project_title, guide_email, role_title, resume)| {
        Ok(ApplicationListing {
          application: app.into_application()?,
          project_title,
          guide_email,
          role_title,
          resume: resume.map(RawResume::into_resume).transpose()?,
        })
      })
      .collect::<Result<_>>()?;
    Ok(listings)
  }

  async fn list_certificates(&self, intern_id: Uuid) -> HubResult<Vec<CertificateListing>> {
    let id = encode_uuid(intern_id);
    let rows = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CERTIFICATE_COLUMNS}, p.title, ga.email
             FROM certificates c
             JOIN projects p       ON p.id = c.project_id
             JOIN guide_profiles g ON g.id = p.guide_id
             JOIN accounts ga      ON ga.id = g.account_id
            WHERE c.intern_id = ?1
            ORDER BY c.issued_at DESC, c.rowid DESC"
        ))?;
        let rows = stmt
          .query_map([id], |row| {
            Ok((
              RawCertificate::from_row(row)?,
              row.get::<_, String>(5)?,
              row.get::<_, String>(6)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let listings = rows
      .into_iter()
      .map(|(certificate, project_title, guide_email)| {
        Ok(CertificateListing {
          certificate: certificate.into_certificate()?,
          project_title,
          guide_email,
        })
      })
      .collect::<Result<_>>()?;
    Ok(listings)
  }

  async fn record_application(&self, input: NewApplication) -> HubResult<Application> {
    let application = Application {
      id:            Uuid::new_v4(),
      intern_id:     input.intern_id,
      project_id:    input.project_id,
      role_id:       input.role_id,
      resume_id:     input.resume_id,
      status:        Default::default(),
      fitment_score: input.fitment_score,
      applied_at:    Utc::now(),
    };

    let row = application.clone();
    self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let intern_id = encode_uuid(row.intern_id);
        let project_id = encode_uuid(row.project_id);
        let role_id = encode_uuid(row.role_id);
        ensure_role_in_project(&tx, &role_id, &project_id)?;
        let resume_id = row.resume_id.map(encode_uuid);
        if let Some(resume) = &resume_id {
          let owned: bool = tx
            .query_row(
              "SELECT 1 FROM resumes WHERE id = ?1 AND intern_id = ?2",
              [resume, &intern_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !owned {
            return Err(reject(internhub_core::Error::invalid(
              "resumeId",
              "resume does not belong to this intern",
            )));
          }
        }
        tx.execute(
          "INSERT INTO applications (id, intern_id, project_id, role_id, resume_id,
                                     status, fitment_score, applied_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            encode_uuid(row.id),
            intern_id,
            project_id,
            role_id,
            resume_id,
            row.status.as_str(),
            row.fitment_score,
            encode_dt(row.applied_at),
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(application)
  }

  async fn record_assignment(&self, input: NewAssignment) -> HubResult<Assignment> {
    let assignment = Assignment {
      id:          Uuid::new_v4(),
      intern_id:   input.intern_id,
      project_id:  input.project_id,
      role_id:     input.role_id,
      status:      Default::default(),
      assigned_at: Utc::now(),
    };

    let row = assignment.clone();
    self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let project_id = encode_uuid(row.project_id);
        let role_id = encode_uuid(row.role_id);
        ensure_role_in_project(&tx, &role_id, &project_id)?;
        tx.execute(
          "INSERT INTO assignments (id, intern_id, project_id, role_id, status, assigned_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(row.id),
            encode_uuid(row.intern_id),
            project_id,
            role_id,
            row.status.as_str(),
            encode_dt(row.assigned_at),
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(assignment)
  }

  async fn issue_certificate(&self, input: NewCertificate) -> HubResult<Certificate> {
    let certificate = Certificate {
      id:              Uuid::new_v4(),
      intern_id:       input.intern_id,
      project_id:      input.project_id,
      certificate_url: input.certificate_url,
      issued_at:       Utc::now(),
    };

    let row = certificate.clone();
    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO certificates (id, intern_id, project_id, certificate_url, issued_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            encode_uuid(row.id),
            encode_uuid(row.intern_id),
            encode_uuid(row.project_id),
            row.certificate_url,
            encode_dt(row.issued_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(certificate)
  }
}

fn ensure_role_in_project(
  conn: &Connection,
  role_id: &str,
  project_id: &str,
) -> tokio_rusqlite::Result<()> {
  let found = conn
    .query_row(
      "SELECT 1 FROM project_roles WHERE id = ?1 AND project_id = ?2",
      [role_id, project_id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  if found {
    Ok(())
  } else {
    Err(reject(internhub_core::Error::invalid(
      "roleId",
      "role does not belong to this project",
    )))
  }
}
