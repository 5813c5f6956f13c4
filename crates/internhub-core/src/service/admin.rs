//! Guide provisioning and programme-wide views.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Backend, Checks, Hub, summary};
use crate::{
  Result,
  account::{AccountSummary, GuideListing, GuideProfile, Role, normalize_email},
  guard::Caller,
  mail,
  password::generate_temporary_password,
  project::AdminProjectListing,
  store::HubStore,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGuide {
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
}

/// Returned exactly once, to the provisioning admin. The temporary password
/// is not stored anywhere in cleartext.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedGuide {
  pub user:          AccountSummary,
  pub guide:         GuideProfile,
  pub temp_password: String,
}

impl<S: Backend> Hub<S> {
  pub async fn provision_guide(
    &self,
    caller: &Caller,
    input: NewGuide,
  ) -> Result<ProvisionedGuide> {
    let (admin, _) = caller.require_admin()?;

    let mut checks = Checks::new();
    checks.email("email", &input.email);
    checks.required("firstName", &input.first_name);
    checks.required("lastName", &input.last_name);
    checks.finish()?;

    let email = normalize_email(&input.email);
    let temp_password = generate_temporary_password();
    let account = self
      .enroll(
        &email,
        &temp_password,
        input.first_name.trim().to_owned(),
        input.last_name.trim().to_owned(),
        Role::Guide,
        true,
      )
      .await?;
    let guide = account.guide().cloned().ok_or_else(|| {
      crate::Error::Internal("guide account created without guide profile".into())
    })?;
    tracing::info!(guide = %guide.id, by = %admin.id, "guide provisioned");

    let login_url = format!("{}/login", self.config.frontend_url.trim_end_matches('/'));
    self
      .notify(mail::welcome_guide(&account.email, &account.profile.display_name(), &login_url))
      .await;

    Ok(ProvisionedGuide { user: summary(&account), guide, temp_password })
  }

  pub async fn list_guides(&self, caller: &Caller) -> Result<Vec<GuideListing>> {
    caller.require_admin()?;
    self.store.list_guides().await
  }

  pub async fn set_guide_active(
    &self,
    caller: &Caller,
    guide_id: Uuid,
    active: bool,
  ) -> Result<GuideProfile> {
    let (admin, _) = caller.require_admin()?;
    let guide = self.store.set_guide_active(guide_id, active).await?;
    tracing::info!(guide = %guide_id, active, by = %admin.id, "guide status changed");
    Ok(guide)
  }

  pub async fn list_all_projects(&self, caller: &Caller) -> Result<Vec<AdminProjectListing>> {
    caller.require_admin()?;
    self.store.list_all_projects().await
  }
}
