//! Accounts and their role-specific profiles.
//!
//! An account carries exactly one profile, and the profile variant *is* the
//! role: there is no separate role column in the in-memory model that could
//! disagree with the attached profile.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, resume::Resume};

// ─── Role ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Intern,
  Guide,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Intern => "INTERN",
      Self::Guide => "GUIDE",
      Self::Admin => "ADMIN",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "INTERN" => Ok(Self::Intern),
      "GUIDE" => Ok(Self::Guide),
      "ADMIN" => Ok(Self::Admin),
      other => Err(Error::Internal(format!("unknown role: {other:?}"))),
    }
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternProfile {
  pub id:            Uuid,
  pub account_id:    String,
  pub first_name:    String,
  pub last_name:     String,
  pub phone:         Option<String>,
  pub bio:           Option<String>,
  /// Ordered as the intern entered them.
  pub skills:        Vec<String>,
  pub institution:   Option<String>,
  pub year_of_study: Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideProfile {
  pub id:           Uuid,
  pub account_id:   String,
  pub first_name:   String,
  pub last_name:    String,
  pub phone:        Option<String>,
  pub bio:          Option<String>,
  pub expertise:    Vec<String>,
  pub organization: Option<String>,
  /// Only an admin may flip this. Inactive guides cannot author projects.
  pub is_active:    bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
  pub id:         Uuid,
  pub account_id: String,
  pub first_name: String,
  pub last_name:  String,
  pub created_at: DateTime<Utc>,
}

/// The one profile an account owns. Serialises as
/// `{"role": "INTERN", "profile": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", content = "profile", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Profile {
  Intern(InternProfile),
  Guide(GuideProfile),
  Admin(AdminProfile),
}

impl Profile {
  pub fn role(&self) -> Role {
    match self {
      Self::Intern(_) => Role::Intern,
      Self::Guide(_) => Role::Guide,
      Self::Admin(_) => Role::Admin,
    }
  }

  pub fn display_name(&self) -> String {
    let (first, last) = match self {
      Self::Intern(p) => (&p.first_name, &p.last_name),
      Self::Guide(p) => (&p.first_name, &p.last_name),
      Self::Admin(p) => (&p.first_name, &p.last_name),
    };
    format!("{first} {last}")
  }
}

// ─── Account ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  /// Shared with the identity provider; never generated locally.
  pub id:                  String,
  pub email:               String,
  pub email_verified:      bool,
  /// Set for provisioned guides until they choose their own password.
  pub must_reset_password: bool,
  pub created_at:          DateTime<Utc>,
  #[serde(flatten)]
  pub profile:             Profile,
}

impl Account {
  pub fn role(&self) -> Role { self.profile.role() }

  pub fn intern(&self) -> Option<&InternProfile> {
    match &self.profile {
      Profile::Intern(p) => Some(p),
      _ => None,
    }
  }

  pub fn guide(&self) -> Option<&GuideProfile> {
    match &self.profile {
      Profile::Guide(p) => Some(p),
      _ => None,
    }
  }
}

/// The compact `{id, email, role}` shape returned after registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
  pub id:    String,
  pub email: String,
  pub role:  Role,
}

impl From<&Account> for AccountSummary {
  fn from(a: &Account) -> Self {
    Self { id: a.id.clone(), email: a.email.clone(), role: a.role() }
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// `GET /intern/profile`: the profile with account flags and resumes,
/// newest upload first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternProfileView {
  #[serde(flatten)]
  pub profile:        InternProfile,
  pub email:          String,
  pub email_verified: bool,
  pub resumes:        Vec<Resume>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideProfileView {
  #[serde(flatten)]
  pub profile:        GuideProfile,
  pub email:          String,
  pub email_verified: bool,
}

/// One row of the admin guide roster.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideListing {
  #[serde(flatten)]
  pub profile:            GuideProfile,
  pub email:              String,
  pub email_verified:     bool,
  pub account_created_at: DateTime<Utc>,
  pub project_count:      u64,
}

// ─── NewAccount ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::HubStore::create_account`]. The account row and
/// its profile row are written in one transaction.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub id:                  String,
  pub email:               String,
  pub role:                Role,
  pub email_verified:      bool,
  pub must_reset_password: bool,
  pub first_name:          String,
  pub last_name:           String,
}

/// Lowercase and trim an email address so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
