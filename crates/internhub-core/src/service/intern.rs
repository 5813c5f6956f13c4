//! The intern's own profile and records.

use super::{Backend, Checks, Hub};
use crate::{
  Result,
  account::{InternProfile, InternProfileView},
  application::{ApplicationListing, CertificateListing},
  guard::Caller,
  patch::InternProfilePatch,
  store::HubStore,
};

impl<S: Backend> Hub<S> {
  pub async fn intern_profile(&self, caller: &Caller) -> Result<InternProfileView> {
    let (account, profile) = caller.require_intern()?;
    let resumes = self.store.list_resumes(profile.id).await?;
    Ok(InternProfileView {
      profile: profile.clone(),
      email: account.email.clone(),
      email_verified: account.email_verified,
      resumes,
    })
  }

  pub async fn update_intern_profile(
    &self,
    caller: &Caller,
    patch: InternProfilePatch,
  ) -> Result<InternProfile> {
    let (_, profile) = caller.require_intern()?;

    let mut checks = Checks::new();
    checks.required_if_present("firstName", patch.first_name.as_deref());
    checks.required_if_present("lastName", patch.last_name.as_deref());
    checks.finish()?;

    self.store.update_intern_profile(profile.id, patch).await
  }

  pub async fn intern_applications(&self, caller: &Caller) -> Result<Vec<ApplicationListing>> {
    let (_, profile) = caller.require_intern()?;
    self.store.list_applications(profile.id).await
  }

  pub async fn intern_certificates(&self, caller: &Caller) -> Result<Vec<CertificateListing>> {
    let (_, profile) = caller.require_intern()?;
    self.store.list_certificates(profile.id).await
  }
}
