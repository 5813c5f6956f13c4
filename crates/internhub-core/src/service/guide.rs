//! The guide's own profile and project authoring.

use uuid::Uuid;

use super::{Backend, Checks, Hub};
use crate::{
  Error, Result,
  account::{GuideProfile, GuideProfileView},
  guard::Caller,
  patch::GuideProfilePatch,
  project::{GuideProjectSummary, GuideProjectView, NewProject, ProjectDetail, ProjectPatch},
  store::HubStore,
};

fn require_active(guide: &GuideProfile) -> Result<()> {
  if guide.is_active {
    Ok(())
  } else {
    Err(Error::Forbidden("guide account is inactive".into()))
  }
}

fn check_new_project(project: &NewProject) -> Result<()> {
  let mut checks = Checks::new();
  checks.required("title", &project.title);
  checks.required("shortDescription", &project.short_description);
  checks.required("detailedDescription", &project.detailed_description);
  checks.required("scope", &project.scope);
  checks.at_least("durationWeeks", project.duration_weeks, 1);
  for (i, phase) in project.phases.iter().enumerate() {
    checks.required(&format!("phases[{i}].title"), &phase.title);
    checks.at_least(&format!("phases[{i}].order"), phase.order, 1);
  }
  for (i, role) in project.roles.iter().enumerate() {
    checks.required(&format!("roles[{i}].title"), &role.title);
    if let Some(max) = role.max_interns {
      checks.at_least(&format!("roles[{i}].maxInterns"), max, 1);
    }
  }
  checks.finish()
}

fn check_project_patch(patch: &ProjectPatch) -> Result<()> {
  let mut checks = Checks::new();
  checks.required_if_present("title", patch.title.as_deref());
  checks.required_if_present("shortDescription", patch.short_description.as_deref());
  checks.required_if_present("detailedDescription", patch.detailed_description.as_deref());
  checks.required_if_present("scope", patch.scope.as_deref());
  if let Some(weeks) = patch.duration_weeks {
    checks.at_least("durationWeeks", weeks, 1);
  }
  checks.finish()
}

impl<S: Backend> Hub<S> {
  pub async fn guide_profile(&self, caller: &Caller) -> Result<GuideProfileView> {
    let (account, profile) = caller.require_guide()?;
    Ok(GuideProfileView {
      profile:        profile.clone(),
      email:          account.email.clone(),
      email_verified: account.email_verified,
    })
  }

  pub async fn update_guide_profile(
    &self,
    caller: &Caller,
    patch: GuideProfilePatch,
  ) -> Result<GuideProfile> {
    let (_, profile) = caller.require_guide()?;

    let mut checks = Checks::new();
    checks.required_if_present("firstName", patch.first_name.as_deref());
    checks.required_if_present("lastName", patch.last_name.as_deref());
    checks.finish()?;

    self.store.update_guide_profile(profile.id, patch).await
  }

  /// New projects always start as drafts.
  pub async fn create_project(
    &self,
    caller: &Caller,
    project: NewProject,
  ) -> Result<ProjectDetail> {
    let (_, guide) = caller.require_guide()?;
    require_active(guide)?;
    check_new_project(&project)?;

    let created = self.store.create_project(guide.id, project).await?;
    tracing::info!(project = %created.project.id, guide = %guide.id, "project created");
    Ok(created)
  }

  pub async fn guide_projects(&self, caller: &Caller) -> Result<Vec<GuideProjectSummary>> {
    let (_, guide) = caller.require_guide()?;
    self.store.list_guide_projects(guide.id).await
  }

  pub async fn guide_project(
    &self,
    caller: &Caller,
    project_id: Uuid,
  ) -> Result<GuideProjectView> {
    let (_, guide) = caller.require_guide()?;
    self
      .store
      .get_guide_project(guide.id, project_id)
      .await?
      .ok_or_else(|| Error::not_found("project not found"))
  }

  /// Only drafts may be edited.
  pub async fn update_project(
    &self,
    caller: &Caller,
    project_id: Uuid,
    patch: ProjectPatch,
  ) -> Result<ProjectDetail> {
    let (_, guide) = caller.require_guide()?;
    require_active(guide)?;
    check_project_patch(&patch)?;

    self.store.update_draft_project(guide.id, project_id, patch).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::project::{NewPhase, NewProjectRole};

  fn project() -> NewProject {
    NewProject {
      title:                "Search".into(),
      short_description:    "short".into(),
      detailed_description: "long".into(),
      scope:                "scope".into(),
      use_cases:            vec![],
      duration_weeks:       6,
      phases:               vec![NewPhase {
        title:       "Kickoff".into(),
        description: String::new(),
        order:       1,
      }],
      roles:                vec![NewProjectRole {
        title:           "Backend".into(),
        description:     String::new(),
        required_skills: vec![],
        max_interns:     None,
      }],
    }
  }

  #[test]
  fn valid_project_passes() {
    assert!(check_new_project(&project()).is_ok());
  }

  #[test]
  fn nested_fields_are_named_by_position() {
    let mut p = project();
    p.phases[0].order = 0;
    p.roles[0].max_interns = Some(0);
    p.duration_weeks = 0;
    let Err(Error::Validation(errors)) = check_new_project(&p) else {
      panic!("expected validation failure");
    };
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["durationWeeks", "phases[0].order", "roles[0].maxInterns"]);
  }

  #[test]
  fn blank_title_in_patch_is_rejected() {
    let patch = ProjectPatch { title: Some("  ".into()), ..Default::default() };
    assert!(check_project_patch(&patch).is_err());
    assert!(check_project_patch(&ProjectPatch::default()).is_ok());
  }
}
