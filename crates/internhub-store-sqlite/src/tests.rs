//! Integration tests for `SqliteStore` against an in-memory database.

use internhub_core::{
  Error as HubError,
  account::{Account, NewAccount, Role},
  application::{NewApplication, NewAssignment, NewCertificate},
  identity::{IdentityMetadata, IdentityProvider},
  patch::InternProfilePatch,
  project::{NewPhase, NewProject, NewProjectRole, ProjectPatch, ProjectStatus},
  resume::NewResume,
  store::HubStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_account(email: &str, role: Role) -> NewAccount {
  NewAccount {
    id: Uuid::new_v4().to_string(),
    email: email.into(),
    role,
    email_verified: true,
    must_reset_password: false,
    first_name: "Test".into(),
    last_name: "User".into(),
  }
}

async fn intern(s: &SqliteStore, email: &str) -> (Account, Uuid) {
  let account = s.create_account(new_account(email, Role::Intern)).await.unwrap();
  let id = account.intern().unwrap().id;
  (account, id)
}

async fn guide(s: &SqliteStore, email: &str) -> (Account, Uuid) {
  let account = s.create_account(new_account(email, Role::Guide)).await.unwrap();
  let id = account.guide().unwrap().id;
  (account, id)
}

fn new_project(title: &str) -> NewProject {
  NewProject {
    title:                title.into(),
    short_description:    "short".into(),
    detailed_description: "long".into(),
    scope:                "scope".into(),
    use_cases:            vec!["triage".into()],
    duration_weeks:       8,
    phases:               vec![
      NewPhase { title: "Build".into(), description: String::new(), order: 2 },
      NewPhase { title: "Plan".into(), description: String::new(), order: 1 },
    ],
    roles:                vec![NewProjectRole {
      title:           "Backend".into(),
      description:     "APIs".into(),
      required_skills: vec!["rust".into()],
      max_interns:     None,
    }],
  }
}

fn resume_for(intern_id: Uuid, name: &str) -> NewResume {
  NewResume {
    intern_id,
    file_name: name.into(),
    storage_path: format!("{intern_id}/{}-{name}", Uuid::new_v4()),
    file_url: format!("file:///{name}"),
    file_size: 1024,
    mime_type: "application/pdf".into(),
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn account_profile_matches_role() {
  let s = store().await;
  for (email, role) in [
    ("i@example.com", Role::Intern),
    ("g@example.com", Role::Guide),
    ("a@example.com", Role::Admin),
  ] {
    let created = s.create_account(new_account(email, role)).await.unwrap();
    let fetched = s.find_account(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.role(), role);
    assert_eq!(fetched.profile.role(), role);
    assert_eq!(fetched, created);
  }
}

#[tokio::test]
async fn new_guides_start_active() {
  let s = store().await;
  let (account, _) = guide(&s, "g@example.com").await;
  assert!(account.guide().unwrap().is_active);
}

#[tokio::test]
async fn email_lookup_is_case_insensitive() {
  let s = store().await;
  let (account, _) = intern(&s, "Mixed@Example.com").await;
  assert_eq!(account.email, "mixed@example.com");
  let found = s.find_account_by_email("MIXED@example.COM").await.unwrap();
  assert_eq!(found.map(|a| a.id), Some(account.id));
}

#[tokio::test]
async fn duplicate_email_conflicts() {
  let s = store().await;
  intern(&s, "dup@example.com").await;
  let err = s
    .create_account(new_account("dup@example.com", Role::Guide))
    .await
    .unwrap_err();
  assert!(matches!(err, HubError::Conflict(_)), "{err:?}");
}

#[tokio::test]
async fn concurrent_creates_with_one_email_admit_exactly_one() {
  let s = store().await;
  let tasks: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move {
        s.create_account(new_account("race@example.com", Role::Intern)).await
      })
    })
    .collect();

  let mut ok = 0;
  for task in tasks {
    match task.await.unwrap() {
      Ok(_) => ok += 1,
      Err(HubError::Conflict(_)) => {}
      Err(e) => panic!("unexpected error: {e:?}"),
    }
  }
  assert_eq!(ok, 1);
}

#[tokio::test]
async fn reused_account_id_leaves_nothing_behind() {
  let s = store().await;
  let mut input = new_account("half@example.com", Role::Intern);
  let first = s.create_account(input.clone()).await.unwrap();
  input.email = "other@example.com".into();
  assert!(s.create_account(input).await.is_err());
  assert!(s.find_account_by_email("other@example.com").await.unwrap().is_none());
  assert!(s.find_account(&first.id).await.unwrap().is_some());
}

#[tokio::test]
async fn account_without_profile_is_reported() {
  let s = store().await;
  s.call(|conn| {
    conn.execute(
      "INSERT INTO accounts (id, email, role, created_at, updated_at)
       VALUES ('orphan', 'orphan@example.com', 'GUIDE',
               '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
      [],
    )?;
    Ok(())
  })
  .await
  .unwrap();

  let err = s.find_account("orphan").await.unwrap_err();
  assert!(
    matches!(err, HubError::ProfileMissing { ref account_id, role: Role::Guide } if account_id == "orphan"),
    "{err:?}"
  );
}

#[tokio::test]
async fn must_reset_flag_clears() {
  let s = store().await;
  let mut input = new_account("g@example.com", Role::Guide);
  input.must_reset_password = true;
  let account = s.create_account(input).await.unwrap();
  assert!(account.must_reset_password);

  s.clear_must_reset_password(&account.id).await.unwrap();
  let fetched = s.find_account(&account.id).await.unwrap().unwrap();
  assert!(!fetched.must_reset_password);
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn partial_update_touches_only_present_fields() {
  let s = store().await;
  let (_, id) = intern(&s, "i@example.com").await;

  let patch: InternProfilePatch =
    serde_json::from_str(r#"{"bio": "Rustacean", "skills": ["rust", " sql "]}"#).unwrap();
  let first = s.update_intern_profile(id, patch).await.unwrap();
  assert_eq!(first.bio.as_deref(), Some("Rustacean"));
  assert_eq!(first.skills, ["rust", "sql"]);

  let patch: InternProfilePatch = serde_json::from_str(r#"{"firstName": "Ivy"}"#).unwrap();
  let second = s.update_intern_profile(id, patch).await.unwrap();
  assert_eq!(second.first_name, "Ivy");
  assert_eq!(second.last_name, "User");
  assert_eq!(second.bio.as_deref(), Some("Rustacean"));
  assert_eq!(second.skills, ["rust", "sql"]);
  assert!(second.updated_at >= first.updated_at);

  let patch: InternProfilePatch = serde_json::from_str(r#"{"bio": null}"#).unwrap();
  let third = s.update_intern_profile(id, patch).await.unwrap();
  assert_eq!(third.bio, None);
  assert_eq!(third.first_name, "Ivy");
}

#[tokio::test]
async fn updating_unknown_profile_is_not_found() {
  let s = store().await;
  let err = s
    .update_intern_profile(Uuid::new_v4(), InternProfilePatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, HubError::NotFound(_)));
}

// ─── Resumes ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn newest_resume_becomes_primary() {
  let s = store().await;
  let (_, id) = intern(&s, "i@example.com").await;

  let first = s.insert_primary_resume(resume_for(id, "a.pdf")).await.unwrap();
  let second = s.insert_primary_resume(resume_for(id, "b.pdf")).await.unwrap();

  let resumes = s.list_resumes(id).await.unwrap();
  assert_eq!(resumes.len(), 2);
  assert_eq!(resumes[0].id, second.id);
  assert!(resumes[0].is_primary);
  assert_eq!(resumes[1].id, first.id);
  assert!(!resumes[1].is_primary);
}

#[tokio::test]
async fn concurrent_uploads_leave_exactly_one_primary() {
  let s = store().await;
  let (_, id) = intern(&s, "i@example.com").await;

  let tasks: Vec<_> = (0..16)
    .map(|n| {
      let s = s.clone();
      tokio::spawn(async move {
        s.insert_primary_resume(resume_for(id, &format!("cv-{n}.pdf"))).await
      })
    })
    .collect();
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  let resumes = s.list_resumes(id).await.unwrap();
  assert_eq!(resumes.len(), 16);
  assert_eq!(resumes.iter().filter(|r| r.is_primary).count(), 1);
}

#[tokio::test]
async fn primary_flags_are_per_intern() {
  let s = store().await;
  let (_, a) = intern(&s, "a@example.com").await;
  let (_, b) = intern(&s, "b@example.com").await;
  s.insert_primary_resume(resume_for(a, "a.pdf")).await.unwrap();
  s.insert_primary_resume(resume_for(b, "b.pdf")).await.unwrap();

  assert!(s.list_resumes(a).await.unwrap()[0].is_primary);
  assert!(s.list_resumes(b).await.unwrap()[0].is_primary);
}

#[tokio::test]
async fn get_resume_round_trips() {
  let s = store().await;
  let (_, id) = intern(&s, "i@example.com").await;
  let resume = s.insert_primary_resume(resume_for(id, "a.pdf")).await.unwrap();
  assert_eq!(s.get_resume(resume.id).await.unwrap(), Some(resume));
  assert_eq!(s.get_resume(Uuid::new_v4()).await.unwrap(), None);
}

// ─── Projects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn created_project_is_draft_with_sorted_phases() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;

  let detail = s.create_project(g, new_project("Search")).await.unwrap();
  assert_eq!(detail.project.status, ProjectStatus::Draft);
  assert_eq!(detail.roles[0].max_interns, 1);
  let orders: Vec<_> = detail.phases.iter().map(|p| p.order).collect();
  assert_eq!(orders, [1, 2]);

  let view = s.get_guide_project(g, detail.project.id).await.unwrap().unwrap();
  assert_eq!(view.detail, detail);
  assert!(view.applications.is_empty());
}

#[tokio::test]
async fn other_guides_cannot_see_a_project() {
  let s = store().await;
  let (_, owner) = guide(&s, "owner@example.com").await;
  let (_, other) = guide(&s, "other@example.com").await;
  let detail = s.create_project(owner, new_project("Search")).await.unwrap();

  assert!(s.get_guide_project(other, detail.project.id).await.unwrap().is_none());
  let err = s
    .update_draft_project(other, detail.project.id, ProjectPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, HubError::NotFound(_)));
}

#[tokio::test]
async fn draft_update_applies_patch() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;
  let detail = s.create_project(g, new_project("Search")).await.unwrap();

  let patch = ProjectPatch {
    title: Some("Search v2".into()),
    duration_weeks: Some(10),
    ..Default::default()
  };
  let updated = s.update_draft_project(g, detail.project.id, patch).await.unwrap();
  assert_eq!(updated.project.title, "Search v2");
  assert_eq!(updated.project.duration_weeks, 10);
  assert_eq!(updated.project.scope, "scope");
  assert_eq!(updated.phases.len(), 2);
}

#[tokio::test]
async fn non_draft_update_is_rejected_and_changes_nothing() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;
  let detail = s.create_project(g, new_project("Search")).await.unwrap();
  let id = detail.project.id;
  s.set_project_status(id, ProjectStatus::Published).await.unwrap();

  let patch = ProjectPatch { title: Some("Sneaky".into()), ..Default::default() };
  let err = s.update_draft_project(g, id, patch).await.unwrap_err();
  assert!(matches!(err, HubError::InvalidState(_)), "{err:?}");

  let view = s.get_guide_project(g, id).await.unwrap().unwrap();
  assert_eq!(view.detail.project.title, "Search");
  assert_eq!(view.detail.project.status, ProjectStatus::Published);
}

#[tokio::test]
async fn deactivated_guide_cannot_write_projects() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;
  let detail = s.create_project(g, new_project("Search")).await.unwrap();
  s.set_guide_active(g, false).await.unwrap();

  let err = s.create_project(g, new_project("Another")).await.unwrap_err();
  assert!(matches!(err, HubError::Forbidden(_)), "{err:?}");

  let patch = ProjectPatch { title: Some("Sneaky".into()), ..Default::default() };
  let err = s.update_draft_project(g, detail.project.id, patch).await.unwrap_err();
  assert!(matches!(err, HubError::Forbidden(_)), "{err:?}");

  let projects = s.list_guide_projects(g).await.unwrap();
  assert_eq!(projects.len(), 1);
  let view = s.get_guide_project(g, detail.project.id).await.unwrap().unwrap();
  assert_eq!(view.detail.project.title, "Search");
}

#[tokio::test]
async fn projects_need_a_known_guide() {
  let s = store().await;
  let err = s.create_project(Uuid::new_v4(), new_project("Orphan")).await.unwrap_err();
  assert!(matches!(err, HubError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn status_changes_follow_the_lifecycle() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;
  let id = s.create_project(g, new_project("Search")).await.unwrap().project.id;

  let err = s.set_project_status(id, ProjectStatus::Active).await.unwrap_err();
  assert!(matches!(err, HubError::InvalidState(_)));

  for next in [
    ProjectStatus::Published,
    ProjectStatus::Active,
    ProjectStatus::AtRisk,
    ProjectStatus::OnTrack,
    ProjectStatus::ReadyForReview,
    ProjectStatus::Completed,
  ] {
    let project = s.set_project_status(id, next).await.unwrap();
    assert_eq!(project.status, next);
  }

  let err = s.set_project_status(id, ProjectStatus::Cancelled).await.unwrap_err();
  assert!(matches!(err, HubError::InvalidState(_)));
}

#[tokio::test]
async fn unknown_project_status_change_is_not_found() {
  let s = store().await;
  let err = s
    .set_project_status(Uuid::new_v4(), ProjectStatus::Published)
    .await
    .unwrap_err();
  assert!(matches!(err, HubError::NotFound(_)));
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn guide_listing_is_newest_first_with_counts() {
  let s = store().await;
  let (_, older) = guide(&s, "older@example.com").await;
  let (_, newer) = guide(&s, "newer@example.com").await;
  s.create_project(older, new_project("One")).await.unwrap();
  s.create_project(older, new_project("Two")).await.unwrap();

  let guides = s.list_guides().await.unwrap();
  assert_eq!(guides.len(), 2);
  assert_eq!(guides[0].profile.id, newer);
  assert_eq!(guides[0].project_count, 0);
  assert_eq!(guides[1].profile.id, older);
  assert_eq!(guides[1].project_count, 2);
  assert_eq!(guides[1].email, "older@example.com");
}

#[tokio::test]
async fn deactivating_a_guide() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;

  let updated = s.set_guide_active(g, false).await.unwrap();
  assert!(!updated.is_active);

  let err = s.set_guide_active(Uuid::new_v4(), false).await.unwrap_err();
  assert!(matches!(err, HubError::NotFound(_)));
}

#[tokio::test]
async fn applications_and_assignments_are_counted_and_listed() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;
  let (_, i) = intern(&s, "i@example.com").await;
  let detail = s.create_project(g, new_project("Search")).await.unwrap();
  let project_id = detail.project.id;
  let role_id = detail.roles[0].id;
  let resume = s.insert_primary_resume(resume_for(i, "cv.pdf")).await.unwrap();

  s.record_application(NewApplication {
    intern_id: i,
    project_id,
    role_id,
    resume_id: Some(resume.id),
    fitment_score: Some(0.8),
  })
  .await
  .unwrap();
  s.record_assignment(NewAssignment { intern_id: i, project_id, role_id })
    .await
    .unwrap();

  let summaries = s.list_guide_projects(g).await.unwrap();
  assert_eq!(summaries[0].counts.applications, 1);
  assert_eq!(summaries[0].counts.assignments, 1);

  let all = s.list_all_projects().await.unwrap();
  assert_eq!(all[0].guide_email, "g@example.com");
  assert_eq!(all[0].guide_name, "Test User");
  assert_eq!(all[0].counts.applications, 1);

  let view = s.get_guide_project(g, project_id).await.unwrap().unwrap();
  assert_eq!(view.applications[0].intern_email, "i@example.com");
  assert_eq!(view.applications[0].resume.as_ref().map(|r| r.id), Some(resume.id));
  assert_eq!(view.assignments[0].role_title, "Backend");

  let mine = s.list_applications(i).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].project_title, "Search");
  assert_eq!(mine[0].guide_email, "g@example.com");
}

#[tokio::test]
async fn applying_twice_for_one_role_conflicts() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;
  let (_, i) = intern(&s, "i@example.com").await;
  let detail = s.create_project(g, new_project("Search")).await.unwrap();
  let application = NewApplication {
    intern_id:     i,
    project_id:    detail.project.id,
    role_id:       detail.roles[0].id,
    resume_id:     None,
    fitment_score: None,
  };

  s.record_application(application.clone()).await.unwrap();
  let err = s.record_application(application).await.unwrap_err();
  assert!(matches!(err, HubError::Conflict(_)));
}

#[tokio::test]
async fn role_must_belong_to_project() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;
  let (_, i) = intern(&s, "i@example.com").await;
  let one = s.create_project(g, new_project("One")).await.unwrap();
  let two = s.create_project(g, new_project("Two")).await.unwrap();

  let err = s
    .record_application(NewApplication {
      intern_id:     i,
      project_id:    one.project.id,
      role_id:       two.roles[0].id,
      resume_id:     None,
      fitment_score: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, HubError::Validation(_)));
}

#[tokio::test]
async fn certificates_are_listed_for_their_intern() {
  let s = store().await;
  let (_, g) = guide(&s, "g@example.com").await;
  let (_, i) = intern(&s, "i@example.com").await;
  let (_, other) = intern(&s, "o@example.com").await;
  let project_id = s.create_project(g, new_project("Search")).await.unwrap().project.id;

  s.issue_certificate(NewCertificate {
    intern_id: i,
    project_id,
    certificate_url: "file:///cert.pdf".into(),
  })
  .await
  .unwrap();

  let mine = s.list_certificates(i).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].project_title, "Search");
  assert!(s.list_certificates(other).await.unwrap().is_empty());
}

// ─── Identity ────────────────────────────────────────────────────────────────

fn metadata() -> IdentityMetadata {
  IdentityMetadata {
    first_name: "Ada".into(),
    last_name:  "Lovelace".into(),
    role:       Role::Intern,
  }
}

#[tokio::test]
async fn sign_in_issues_a_verifiable_token() {
  let s = store().await;
  let identity = s
    .create_identity("ada@example.com", "correct horse", &metadata(), true)
    .await
    .unwrap();
  assert!(identity.email_confirmed_at.is_some());

  let session = s.sign_in("ADA@example.com", "correct horse").await.unwrap();
  assert_eq!(session.token_type, "Bearer");
  assert_eq!(session.expires_in, 3600);
  assert_eq!(session.access_token.len(), 64);

  let verified = s.verify_token(&session.access_token).await.unwrap();
  assert_eq!(verified, identity);
}

#[tokio::test]
async fn bad_credentials_and_tokens_are_unauthenticated() {
  let s = store().await;
  s.create_identity("ada@example.com", "correct horse", &metadata(), true)
    .await
    .unwrap();

  let wrong = s.sign_in("ada@example.com", "battery staple").await.unwrap_err();
  assert!(matches!(wrong, HubError::Unauthenticated(_)));
  let unknown = s.sign_in("nobody@example.com", "whatever1").await.unwrap_err();
  assert!(matches!(unknown, HubError::Unauthenticated(_)));
  let forged = s.verify_token("deadbeef").await.unwrap_err();
  assert!(matches!(forged, HubError::Unauthenticated(_)));
  let empty = s.verify_token("").await.unwrap_err();
  assert!(matches!(empty, HubError::Unauthenticated(_)));
}

#[tokio::test]
async fn duplicate_identity_conflicts() {
  let s = store().await;
  s.create_identity("ada@example.com", "correct horse", &metadata(), true)
    .await
    .unwrap();
  let err = s
    .create_identity("Ada@Example.com", "another one", &metadata(), false)
    .await
    .unwrap_err();
  assert!(matches!(err, HubError::Conflict(_)));
}

#[tokio::test]
async fn expired_sessions_do_not_verify() {
  let s = store()
    .await
    .with_session_ttl(std::time::Duration::from_secs(0));
  s.create_identity("ada@example.com", "correct horse", &metadata(), true)
    .await
    .unwrap();
  let session = s.sign_in("ada@example.com", "correct horse").await.unwrap();
  assert!(s.verify_token(&session.access_token).await.is_err());
}

#[tokio::test]
async fn reset_tokens_are_single_use_and_revoke_sessions() {
  let s = store().await;
  let identity = s
    .create_identity("ada@example.com", "correct horse", &metadata(), true)
    .await
    .unwrap();
  let session = s.sign_in("ada@example.com", "correct horse").await.unwrap();

  assert_eq!(s.issue_reset_token("nobody@example.com").await.unwrap(), None);
  let token = s.issue_reset_token("ada@example.com").await.unwrap().unwrap();
  // A reset token is not a bearer credential.
  assert!(s.verify_token(&token).await.is_err());

  let owner = s.consume_reset_token(&token).await.unwrap().unwrap();
  assert_eq!(owner.id, identity.id);
  assert_eq!(s.consume_reset_token(&token).await.unwrap(), None);

  s.update_password(&identity.id, "new password").await.unwrap();
  assert!(s.verify_token(&session.access_token).await.is_err());
  assert!(s.sign_in("ada@example.com", "correct horse").await.is_err());
  assert!(s.sign_in("ada@example.com", "new password").await.is_ok());
}

#[tokio::test]
async fn deleting_an_identity_removes_it() {
  let s = store().await;
  let identity = s
    .create_identity("ada@example.com", "correct horse", &metadata(), true)
    .await
    .unwrap();
  s.delete_identity(&identity.id).await.unwrap();
  assert!(s.get_identity(&identity.id).await.unwrap().is_none());
  assert!(s.find_identity_by_email("ada@example.com").await.unwrap().is_none());
}
