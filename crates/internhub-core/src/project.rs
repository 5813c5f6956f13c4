//! Projects, their phases and roles, and the project lifecycle.
//!
//! A project's content is editable only while it is a draft. Every later
//! status is driven from outside the authoring flow, and edits against those
//! statuses are rejected uniformly.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error,
  application::{ProjectApplicant, ProjectAssignee},
};

// ─── ProjectStatus ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
  Draft,
  Published,
  Active,
  OnTrack,
  AtRisk,
  Delayed,
  ReadyForReview,
  Completed,
  Cancelled,
}

impl ProjectStatus {
  pub const ALL: [Self; 9] = [
    Self::Draft,
    Self::Published,
    Self::Active,
    Self::OnTrack,
    Self::AtRisk,
    Self::Delayed,
    Self::ReadyForReview,
    Self::Completed,
    Self::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Draft => "DRAFT",
      Self::Published => "PUBLISHED",
      Self::Active => "ACTIVE",
      Self::OnTrack => "ON_TRACK",
      Self::AtRisk => "AT_RISK",
      Self::Delayed => "DELAYED",
      Self::ReadyForReview => "READY_FOR_REVIEW",
      Self::Completed => "COMPLETED",
      Self::Cancelled => "CANCELLED",
    }
  }

  /// Content fields may be changed only in this state.
  pub fn is_editable(self) -> bool { self == Self::Draft }

  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Cancelled)
  }

  /// Whether `self → next` is an edge of the lifecycle graph.
  ///
  /// The three health states (`ON_TRACK`, `AT_RISK`, `DELAYED`) may move
  /// freely between each other while the project runs.
  pub fn can_transition_to(self, next: Self) -> bool {
    use ProjectStatus::*;
    if next == Cancelled {
      return !self.is_terminal();
    }
    match (self, next) {
      (Draft, Published) => true,
      (Published, Active) => true,
      (Active, OnTrack | AtRisk | Delayed) => true,
      (OnTrack | AtRisk | Delayed, OnTrack | AtRisk | Delayed) => self != next,
      (OnTrack | AtRisk | Delayed, ReadyForReview) => true,
      (ReadyForReview, Completed) => true,
      _ => false,
    }
  }
}

impl fmt::Display for ProjectStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProjectStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|st| st.as_str() == s)
      .ok_or_else(|| Error::Internal(format!("unknown project status: {s:?}")))
  }
}

// ─── PhaseStatus ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStatus {
  #[default]
  NotStarted,
  InProgress,
  Completed,
}

impl PhaseStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NotStarted => "NOT_STARTED",
      Self::InProgress => "IN_PROGRESS",
      Self::Completed => "COMPLETED",
    }
  }
}

impl FromStr for PhaseStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "NOT_STARTED" => Ok(Self::NotStarted),
      "IN_PROGRESS" => Ok(Self::InProgress),
      "COMPLETED" => Ok(Self::Completed),
      other => Err(Error::Internal(format!("unknown phase status: {other:?}"))),
    }
  }
}

// ─── Stored shapes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  pub id:                   Uuid,
  pub guide_id:             Uuid,
  pub title:                String,
  pub short_description:    String,
  pub detailed_description: String,
  pub scope:                String,
  pub use_cases:            Vec<String>,
  pub duration_weeks:       u32,
  pub status:               ProjectStatus,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
  pub id:          Uuid,
  pub project_id:  Uuid,
  pub title:       String,
  pub description: String,
  /// Sort key only; gaps and duplicates are allowed.
  pub order:       u32,
  pub status:      PhaseStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRole {
  pub id:              Uuid,
  pub project_id:      Uuid,
  pub title:           String,
  pub description:     String,
  pub required_skills: Vec<String>,
  pub max_interns:     u32,
}

/// A project with its phases (ascending `order`) and roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
  #[serde(flatten)]
  pub project: Project,
  pub phases:  Vec<Phase>,
  pub roles:   Vec<ProjectRole>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCounts {
  pub applications: u64,
  pub assignments:  u64,
}

/// One row of a guide's own project list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideProjectSummary {
  #[serde(flatten)]
  pub detail: ProjectDetail,
  pub counts: ProjectCounts,
}

/// A single project as its owning guide sees it, including who applied and
/// who is assigned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideProjectView {
  #[serde(flatten)]
  pub detail:       ProjectDetail,
  pub applications: Vec<ProjectApplicant>,
  pub assignments:  Vec<ProjectAssignee>,
}

/// One row of the admin-wide project roster.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProjectListing {
  #[serde(flatten)]
  pub project:     Project,
  pub guide_name:  String,
  pub guide_email: String,
  pub counts:      ProjectCounts,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhase {
  pub title:       String,
  pub description: String,
  pub order:       u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectRole {
  pub title:           String,
  pub description:     String,
  #[serde(default)]
  pub required_skills: Vec<String>,
  /// Defaults to 1 when omitted.
  pub max_interns:     Option<u32>,
}

/// Input to [`crate::store::HubStore::create_project`]. Phases and roles are
/// created together with the project and never edited piecemeal afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
  pub title:                String,
  pub short_description:    String,
  pub detailed_description: String,
  pub scope:                String,
  #[serde(default)]
  pub use_cases:            Vec<String>,
  pub duration_weeks:       u32,
  #[serde(default)]
  pub phases:               Vec<NewPhase>,
  #[serde(default)]
  pub roles:                Vec<NewProjectRole>,
}

/// Partial update of a draft project. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
  pub title:                Option<String>,
  pub short_description:    Option<String>,
  pub detailed_description: Option<String>,
  pub scope:                Option<String>,
  pub use_cases:            Option<Vec<String>>,
  pub duration_weeks:       Option<u32>,
}

impl ProjectPatch {
  /// Apply every present field to `project`. Text is stored trimmed.
  pub fn apply_to(&self, project: &mut Project) {
    if let Some(v) = &self.title {
      project.title = v.trim().to_owned();
    }
    if let Some(v) = &self.short_description {
      project.short_description = v.trim().to_owned();
    }
    if let Some(v) = &self.detailed_description {
      project.detailed_description = v.trim().to_owned();
    }
    if let Some(v) = &self.scope {
      project.scope = v.trim().to_owned();
    }
    if let Some(v) = &self.use_cases {
      project.use_cases = v.clone();
    }
    if let Some(v) = self.duration_weeks {
      project.duration_weeks = v;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::ProjectStatus::*;
  use super::*;

  #[test]
  fn only_draft_is_editable() {
    for status in ProjectStatus::ALL {
      assert_eq!(status.is_editable(), status == Draft, "{status}");
    }
  }

  #[test]
  fn happy_path_is_a_chain() {
    let path = [Draft, Published, Active, OnTrack, ReadyForReview, Completed];
    for pair in path.windows(2) {
      assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
    }
  }

  #[test]
  fn cancel_is_reachable_from_every_live_state() {
    for status in ProjectStatus::ALL {
      assert_eq!(status.can_transition_to(Cancelled), !status.is_terminal());
    }
  }

  #[test]
  fn no_skipping_and_no_going_back() {
    assert!(!Draft.can_transition_to(Active));
    assert!(!Published.can_transition_to(Draft));
    assert!(!Completed.can_transition_to(Active));
    assert!(!Active.can_transition_to(Completed));
    assert!(AtRisk.can_transition_to(OnTrack));
    assert!(!AtRisk.can_transition_to(AtRisk));
  }

  #[test]
  fn status_parses_its_own_rendering() {
    for status in ProjectStatus::ALL {
      assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), status);
    }
  }

  fn draft() -> Project {
    let now = Utc::now();
    Project {
      id:                   Uuid::new_v4(),
      guide_id:             Uuid::new_v4(),
      title:                "Old".into(),
      short_description:    "short".into(),
      detailed_description: "long".into(),
      scope:                "scope".into(),
      use_cases:            vec!["a".into()],
      duration_weeks:       4,
      status:               Draft,
      created_at:           now,
      updated_at:           now,
    }
  }

  #[test]
  fn patch_applies_only_present_fields() {
    let mut project = draft();
    let patch = ProjectPatch { duration_weeks: Some(8), ..Default::default() };
    patch.apply_to(&mut project);
    assert_eq!(project.title, "Old");
    assert_eq!(project.duration_weeks, 8);
    assert_eq!(project.use_cases, ["a"]);
  }

  #[test]
  fn patched_text_is_trimmed() {
    let mut project = draft();
    let patch = ProjectPatch {
      title: Some("  Search v2 \n".into()),
      scope: Some("\tbackend ".into()),
      ..Default::default()
    };
    patch.apply_to(&mut project);
    assert_eq!(project.title, "Search v2");
    assert_eq!(project.scope, "backend");
    assert_eq!(project.short_description, "short");
  }
}
