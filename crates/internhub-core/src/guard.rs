//! Who is making a request, and what they may do.

use crate::{
  Error, Result,
  account::{Account, AdminProfile, GuideProfile, InternProfile, Profile, Role},
};

/// The resolved principal behind a request.
///
/// Built once per request from the bearer credential. Service operations take
/// a `&Caller` and check it before touching any input.
#[derive(Debug, Clone, Default)]
pub struct Caller {
  account: Option<Account>,
}

impl Caller {
  pub fn anonymous() -> Self { Self { account: None } }

  pub fn authenticated(account: Account) -> Self { Self { account: Some(account) } }

  pub fn require_authenticated(&self) -> Result<&Account> {
    self
      .account
      .as_ref()
      .ok_or_else(|| Error::unauthenticated("authentication required"))
  }

  /// The caller must be authenticated and hold one of `allowed`.
  pub fn require_role(&self, allowed: &[Role]) -> Result<&Account> {
    let account = self.require_authenticated()?;
    if allowed.contains(&account.role()) {
      Ok(account)
    } else {
      Err(Error::Forbidden("insufficient permissions".into()))
    }
  }

  pub fn require_intern(&self) -> Result<(&Account, &InternProfile)> {
    let account = self.require_role(&[Role::Intern])?;
    match &account.profile {
      Profile::Intern(p) => Ok((account, p)),
      _ => Err(Error::Internal("role and profile disagree".into())),
    }
  }

  pub fn require_guide(&self) -> Result<(&Account, &GuideProfile)> {
    let account = self.require_role(&[Role::Guide])?;
    match &account.profile {
      Profile::Guide(p) => Ok((account, p)),
      _ => Err(Error::Internal("role and profile disagree".into())),
    }
  }

  pub fn require_admin(&self) -> Result<(&Account, &AdminProfile)> {
    let account = self.require_role(&[Role::Admin])?;
    match &account.profile {
      Profile::Admin(p) => Ok((account, p)),
      _ => Err(Error::Internal("role and profile disagree".into())),
    }
  }
}
