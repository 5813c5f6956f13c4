//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with microsecond precision, so they sort
//! lexically. String lists are compact JSON arrays. UUIDs are hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use internhub_core::{
  account::{Account, AdminProfile, GuideProfile, InternProfile, Profile, Role},
  application::{Application, Assignment, Certificate},
  project::{Phase, Project, ProjectRole},
  resume::Resume,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

fn decode_enum<T: std::str::FromStr>(s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode(s.to_owned()))
}

fn decode_count(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(n.to_string()))
}

// ─── Accounts ────────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str =
  "a.id, a.email, a.role, a.email_verified, a.must_reset_password, a.created_at";

pub struct RawAccount {
  pub id:                  String,
  pub email:               String,
  pub role:                String,
  pub email_verified:      bool,
  pub must_reset_password: bool,
  pub created_at:          String,
}

impl RawAccount {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      email:               row.get(1)?,
      role:                row.get(2)?,
      email_verified:      row.get(3)?,
      must_reset_password: row.get(4)?,
      created_at:          row.get(5)?,
    })
  }

  /// Attach the profile. A missing profile row is an integrity fault and is
  /// reported as such rather than papered over.
  pub fn into_account(self, profile: Option<RawProfile>) -> Result<Account> {
    let role: Role = decode_enum(&self.role)?;
    let Some(profile) = profile else {
      return Err(
        internhub_core::Error::ProfileMissing { account_id: self.id, role }.into(),
      );
    };
    let profile = profile.into_profile()?;
    if profile.role() != role {
      return Err(Error::Decode(format!(
        "account {} has role {role} but a {} profile",
        self.id,
        profile.role()
      )));
    }
    Ok(Account {
      id: self.id,
      email: self.email,
      email_verified: self.email_verified,
      must_reset_password: self.must_reset_password,
      created_at: decode_dt(&self.created_at)?,
      profile,
    })
  }
}

pub enum RawProfile {
  Intern(RawInternProfile),
  Guide(RawGuideProfile),
  Admin(RawAdminProfile),
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(match self {
      Self::Intern(p) => Profile::Intern(p.into_profile()?),
      Self::Guide(p) => Profile::Guide(p.into_profile()?),
      Self::Admin(p) => Profile::Admin(p.into_profile()?),
    })
  }
}

pub const INTERN_COLUMNS: &str = "p.id, p.account_id, p.first_name, p.last_name, \
   p.phone, p.bio, p.skills, p.institution, p.year_of_study, p.created_at, p.updated_at";

pub struct RawInternProfile {
  pub id:            String,
  pub account_id:    String,
  pub first_name:    String,
  pub last_name:     String,
  pub phone:         Option<String>,
  pub bio:           Option<String>,
  pub skills:        String,
  pub institution:   Option<String>,
  pub year_of_study: Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawInternProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      account_id:    row.get(1)?,
      first_name:    row.get(2)?,
      last_name:     row.get(3)?,
      phone:         row.get(4)?,
      bio:           row.get(5)?,
      skills:        row.get(6)?,
      institution:   row.get(7)?,
      year_of_study: row.get(8)?,
      created_at:    row.get(9)?,
      updated_at:    row.get(10)?,
    })
  }

  pub fn into_profile(self) -> Result<InternProfile> {
    Ok(InternProfile {
      id:            decode_uuid(&self.id)?,
      account_id:    self.account_id,
      first_name:    self.first_name,
      last_name:     self.last_name,
      phone:         self.phone,
      bio:           self.bio,
      skills:        decode_list(&self.skills)?,
      institution:   self.institution,
      year_of_study: self.year_of_study,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const GUIDE_COLUMNS: &str = "g.id, g.account_id, g.first_name, g.last_name, \
   g.phone, g.bio, g.expertise, g.organization, g.is_active, g.created_at, g.updated_at";

pub struct RawGuideProfile {
  pub id:           String,
  pub account_id:   String,
  pub first_name:   String,
  pub last_name:    String,
  pub phone:        Option<String>,
  pub bio:          Option<String>,
  pub expertise:    String,
  pub organization: Option<String>,
  pub is_active:    bool,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawGuideProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      account_id:   row.get(1)?,
      first_name:   row.get(2)?,
      last_name:    row.get(3)?,
      phone:        row.get(4)?,
      bio:          row.get(5)?,
      expertise:    row.get(6)?,
      organization: row.get(7)?,
      is_active:    row.get(8)?,
      created_at:   row.get(9)?,
      updated_at:   row.get(10)?,
    })
  }

  pub fn into_profile(self) -> Result<GuideProfile> {
    Ok(GuideProfile {
      id:           decode_uuid(&self.id)?,
      account_id:   self.account_id,
      first_name:   self.first_name,
      last_name:    self.last_name,
      phone:        self.phone,
      bio:          self.bio,
      expertise:    decode_list(&self.expertise)?,
      organization: self.organization,
      is_active:    self.is_active,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

pub const ADMIN_COLUMNS: &str =
  "d.id, d.account_id, d.first_name, d.last_name, d.created_at";

pub struct RawAdminProfile {
  pub id:         String,
  pub account_id: String,
  pub first_name: String,
  pub last_name:  String,
  pub created_at: String,
}

impl RawAdminProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      account_id: row.get(1)?,
      first_name: row.get(2)?,
      last_name:  row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_profile(self) -> Result<AdminProfile> {
    Ok(AdminProfile {
      id:         decode_uuid(&self.id)?,
      account_id: self.account_id,
      first_name: self.first_name,
      last_name:  self.last_name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Resumes ─────────────────────────────────────────────────────────────────

pub const RESUME_COLUMNS: &str = "r.id, r.intern_id, r.file_name, r.storage_path, \
   r.file_url, r.file_size, r.mime_type, r.is_primary, r.uploaded_at";

pub struct RawResume {
  pub id:           String,
  pub intern_id:    String,
  pub file_name:    String,
  pub storage_path: String,
  pub file_url:     String,
  pub file_size:    i64,
  pub mime_type:    String,
  pub is_primary:   bool,
  pub uploaded_at:  String,
}

impl RawResume {
  /// Read the nine resume columns starting at `offset`.
  pub fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(offset)?,
      intern_id:    row.get(offset + 1)?,
      file_name:    row.get(offset + 2)?,
      storage_path: row.get(offset + 3)?,
      file_url:     row.get(offset + 4)?,
      file_size:    row.get(offset + 5)?,
      mime_type:    row.get(offset + 6)?,
      is_primary:   row.get(offset + 7)?,
      uploaded_at:  row.get(offset + 8)?,
    })
  }

  /// Like [`Self::from_row_at`] for a `LEFT JOIN`ed resume that may be absent.
  pub fn optional_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<Self>> {
    let id: Option<String> = row.get(offset)?;
    match id {
      Some(_) => Self::from_row_at(row, offset).map(Some),
      None => Ok(None),
    }
  }

  pub fn into_resume(self) -> Result<Resume> {
    Ok(Resume {
      id:           decode_uuid(&self.id)?,
      intern_id:    decode_uuid(&self.intern_id)?,
      file_name:    self.file_name,
      storage_path: self.storage_path,
      file_url:     self.file_url,
      file_size:    u64::try_from(self.file_size)
        .map_err(|_| Error::Decode(self.file_size.to_string()))?,
      mime_type:    self.mime_type,
      is_primary:   self.is_primary,
      uploaded_at:  decode_dt(&self.uploaded_at)?,
    })
  }
}

// ─── Projects ────────────────────────────────────────────────────────────────

pub const PROJECT_COLUMNS: &str = "p.id, p.guide_id, p.title, p.short_description, \
   p.detailed_description, p.scope, p.use_cases, p.duration_weeks, p.status, \
   p.created_at, p.updated_at";

/// Number of columns in [`PROJECT_COLUMNS`].
pub const PROJECT_WIDTH: usize = 11;

pub struct RawProject {
  pub id:                   String,
  pub guide_id:             String,
  pub title:                String,
  pub short_description:    String,
  pub detailed_description: String,
  pub scope:                String,
  pub use_cases:            String,
  pub duration_weeks:       i64,
  pub status:               String,
  pub created_at:           String,
  pub updated_at:           String,
}

impl RawProject {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      guide_id:             row.get(1)?,
      title:                row.get(2)?,
      short_description:    row.get(3)?,
      detailed_description: row.get(4)?,
      scope:                row.get(5)?,
      use_cases:            row.get(6)?,
      duration_weeks:       row.get(7)?,
      status:               row.get(8)?,
      created_at:           row.get(9)?,
      updated_at:           row.get(10)?,
    })
  }

  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      id:                   decode_uuid(&self.id)?,
      guide_id:             decode_uuid(&self.guide_id)?,
      title:                self.title,
      short_description:    self.short_description,
      detailed_description: self.detailed_description,
      scope:                self.scope,
      use_cases:            decode_list(&self.use_cases)?,
      duration_weeks:       decode_count(self.duration_weeks)?,
      status:               decode_enum(&self.status)?,
      created_at:           decode_dt(&self.created_at)?,
      updated_at:           decode_dt(&self.updated_at)?,
    })
  }
}

pub const PHASE_COLUMNS: &str =
  "id, project_id, title, description, phase_order, status";

pub struct RawPhase {
  pub id:          String,
  pub project_id:  String,
  pub title:       String,
  pub description: String,
  pub order:       i64,
  pub status:      String,
}

impl RawPhase {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      project_id:  row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      order:       row.get(4)?,
      status:      row.get(5)?,
    })
  }

  pub fn into_phase(self) -> Result<Phase> {
    Ok(Phase {
      id:          decode_uuid(&self.id)?,
      project_id:  decode_uuid(&self.project_id)?,
      title:       self.title,
      description: self.description,
      order:       decode_count(self.order)?,
      status:      decode_enum(&self.status)?,
    })
  }
}

pub const ROLE_COLUMNS: &str =
  "id, project_id, title, description, required_skills, max_interns";

pub struct RawRole {
  pub id:              String,
  pub project_id:      String,
  pub title:           String,
  pub description:     String,
  pub required_skills: String,
  pub max_interns:     i64,
}

impl RawRole {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      project_id:      row.get(1)?,
      title:           row.get(2)?,
      description:     row.get(3)?,
      required_skills: row.get(4)?,
      max_interns:     row.get(5)?,
    })
  }

  pub fn into_role(self) -> Result<ProjectRole> {
    Ok(ProjectRole {
      id:              decode_uuid(&self.id)?,
      project_id:      decode_uuid(&self.project_id)?,
      title:           self.title,
      description:     self.description,
      required_skills: decode_list(&self.required_skills)?,
      max_interns:     decode_count(self.max_interns)?,
    })
  }
}

// ─── Applications, assignments, certificates ─────────────────────────────────

pub const APPLICATION_COLUMNS: &str = "x.id, x.intern_id, x.project_id, x.role_id, \
   x.resume_id, x.status, x.fitment_score, x.applied_at";

/// Number of columns in [`APPLICATION_COLUMNS`].
pub const APPLICATION_WIDTH: usize = 8;

pub struct RawApplication {
  pub id:            String,
  pub intern_id:     String,
  pub project_id:    String,
  pub role_id:       String,
  pub resume_id:     Option<String>,
  pub status:        String,
  pub fitment_score: Option<f64>,
  pub applied_at:    String,
}

impl RawApplication {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      intern_id:     row.get(1)?,
      project_id:    row.get(2)?,
      role_id:       row.get(3)?,
      resume_id:     row.get(4)?,
      status:        row.get(5)?,
      fitment_score: row.get(6)?,
      applied_at:    row.get(7)?,
    })
  }

  pub fn into_application(self) -> Result<Application> {
    Ok(Application {
      id:            decode_uuid(&self.id)?,
      intern_id:     decode_uuid(&self.intern_id)?,
      project_id:    decode_uuid(&self.project_id)?,
      role_id:       decode_uuid(&self.role_id)?,
      resume_id:     self.resume_id.as_deref().map(decode_uuid).transpose()?,
      status:        decode_enum(&self.status)?,
      fitment_score: self.fitment_score,
      applied_at:    decode_dt(&self.applied_at)?,
    })
  }
}

pub const ASSIGNMENT_COLUMNS: &str =
  "s.id, s.intern_id, s.project_id, s.role_id, s.status, s.assigned_at";

/// Number of columns in [`ASSIGNMENT_COLUMNS`].
pub const ASSIGNMENT_WIDTH: usize = 6;

pub struct RawAssignment {
  pub id:          String,
  pub intern_id:   String,
  pub project_id:  String,
  pub role_id:     String,
  pub status:      String,
  pub assigned_at: String,
}

impl RawAssignment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      intern_id:   row.get(1)?,
      project_id:  row.get(2)?,
      role_id:     row.get(3)?,
      status:      row.get(4)?,
      assigned_at: row.get(5)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      id:          decode_uuid(&self.id)?,
      intern_id:   decode_uuid(&self.intern_id)?,
      project_id:  decode_uuid(&self.project_id)?,
      role_id:     decode_uuid(&self.role_id)?,
      status:      decode_enum(&self.status)?,
      assigned_at: decode_dt(&self.assigned_at)?,
    })
  }
}

pub const CERTIFICATE_COLUMNS: &str =
  "c.id, c.intern_id, c.project_id, c.certificate_url, c.issued_at";

pub struct RawCertificate {
  pub id:              String,
  pub intern_id:       String,
  pub project_id:      String,
  pub certificate_url: String,
  pub issued_at:       String,
}

impl RawCertificate {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      intern_id:       row.get(1)?,
      project_id:      row.get(2)?,
      certificate_url: row.get(3)?,
      issued_at:       row.get(4)?,
    })
  }

  pub fn into_certificate(self) -> Result<Certificate> {
    Ok(Certificate {
      id:              decode_uuid(&self.id)?,
      intern_id:       decode_uuid(&self.intern_id)?,
      project_id:      decode_uuid(&self.project_id)?,
      certificate_url: self.certificate_url,
      issued_at:       decode_dt(&self.issued_at)?,
    })
  }
}
