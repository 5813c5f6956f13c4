//! Applications, assignments and certificates.
//!
//! These rows are produced by workflows outside the authoring flow; this crate
//! only records and lists them.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, resume::Resume};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
  #[default]
  Applied,
  Shortlisted,
  Offer,
  Rejected,
}

impl ApplicationStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Applied => "APPLIED",
      Self::Shortlisted => "SHORTLISTED",
      Self::Offer => "OFFER",
      Self::Rejected => "REJECTED",
    }
  }
}

impl FromStr for ApplicationStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "APPLIED" => Ok(Self::Applied),
      "SHORTLISTED" => Ok(Self::Shortlisted),
      "OFFER" => Ok(Self::Offer),
      "REJECTED" => Ok(Self::Rejected),
      other => Err(Error::Internal(format!("unknown application status: {other:?}"))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
  #[default]
  Active,
  OptedOut,
  Completed,
}

impl AssignmentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "ACTIVE",
      Self::OptedOut => "OPTED_OUT",
      Self::Completed => "COMPLETED",
    }
  }
}

impl FromStr for AssignmentStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ACTIVE" => Ok(Self::Active),
      "OPTED_OUT" => Ok(Self::OptedOut),
      "COMPLETED" => Ok(Self::Completed),
      other => Err(Error::Internal(format!("unknown assignment status: {other:?}"))),
    }
  }
}

// ─── Stored shapes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
  pub id:            Uuid,
  pub intern_id:     Uuid,
  pub project_id:    Uuid,
  pub role_id:       Uuid,
  pub resume_id:     Option<Uuid>,
  pub status:        ApplicationStatus,
  pub fitment_score: Option<f64>,
  pub applied_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub id:          Uuid,
  pub intern_id:   Uuid,
  pub project_id:  Uuid,
  pub role_id:     Uuid,
  pub status:      AssignmentStatus,
  pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
  pub id:              Uuid,
  pub intern_id:       Uuid,
  pub project_id:      Uuid,
  pub certificate_url: String,
  pub issued_at:       DateTime<Utc>,
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// An intern's own application, with the context needed to display it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListing {
  #[serde(flatten)]
  pub application:   Application,
  pub project_title: String,
  pub guide_email:   String,
  pub role_title:    String,
  pub resume:        Option<Resume>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateListing {
  #[serde(flatten)]
  pub certificate:   Certificate,
  pub project_title: String,
  pub guide_email:   String,
}

/// An applicant as seen by the guide who owns the project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectApplicant {
  #[serde(flatten)]
  pub application:  Application,
  pub intern_name:  String,
  pub intern_email: String,
  pub role_title:   String,
  pub resume:       Option<Resume>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAssignee {
  #[serde(flatten)]
  pub assignment:   Assignment,
  pub intern_name:  String,
  pub intern_email: String,
  pub role_title:   String,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewApplication {
  pub intern_id:     Uuid,
  pub project_id:    Uuid,
  pub role_id:       Uuid,
  pub resume_id:     Option<Uuid>,
  pub fitment_score: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
  pub intern_id:  Uuid,
  pub project_id: Uuid,
  pub role_id:    Uuid,
}

#[derive(Debug, Clone)]
pub struct NewCertificate {
  pub intern_id:       Uuid,
  pub project_id:      Uuid,
  pub certificate_url: String,
}
