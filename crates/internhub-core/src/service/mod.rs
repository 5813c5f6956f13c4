//! Role-scoped operations over a storage backend and external collaborators.
//!
//! Every public method takes the request's [`Caller`] and runs in the same
//! order: guard, then input validation, then the action. External calls
//! (identity provider, object store, mailer) are bounded by
//! [`HubConfig::upstream_timeout`].

mod admin;
mod auth;
mod guide;
mod intern;
mod upload;

use std::{future::Future, sync::Arc, time::Duration};

pub use admin::{NewGuide, ProvisionedGuide};
pub use auth::{LoginResponse, Registered, Registration, UserView};

use crate::{
  Error, FieldError, Result,
  account::{Account, normalize_email},
  guard::Caller,
  identity::IdentityProvider,
  mail::{Email, Mailer},
  objects::ObjectStore,
  store::HubStore,
};

/// A storage backend that also acts as the identity provider.
pub trait Backend: HubStore + IdentityProvider + Send + Sync + 'static {}

impl<T> Backend for T where T: HubStore + IdentityProvider + Send + Sync + 'static {}

#[derive(Debug, Clone)]
pub struct HubConfig {
  pub upstream_timeout: Duration,
  /// Base URL of the web client, used for links in outgoing mail.
  pub frontend_url:     String,
}

impl Default for HubConfig {
  fn default() -> Self {
    Self {
      upstream_timeout: Duration::from_secs(10),
      frontend_url:     "http://localhost:3000".into(),
    }
  }
}

/// The service layer. Cheap to share behind an `Arc`.
pub struct Hub<S> {
  store:   Arc<S>,
  objects: Arc<dyn ObjectStore>,
  mailer:  Arc<dyn Mailer>,
  config:  HubConfig,
}

impl<S: Backend> Hub<S> {
  pub fn new(
    store: Arc<S>,
    objects: Arc<dyn ObjectStore>,
    mailer: Arc<dyn Mailer>,
    config: HubConfig,
  ) -> Self {
    Self { store, objects, mailer, config }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Resolve a bearer credential to the caller it belongs to.
  ///
  /// The account is looked up by the verified identity's email.
  pub async fn authenticate(&self, token: &str) -> Result<Caller> {
    let identity = self
      .bounded("identity provider", self.store.verify_token(token))
      .await?;
    let email = normalize_email(&identity.email);
    match self.store.find_account_by_email(&email).await {
      Ok(Some(account)) => Ok(Caller::authenticated(account)),
      Ok(None) => Err(Error::not_found("user not found")),
      Err(e @ Error::ProfileMissing { .. }) => {
        tracing::error!(error = %e, "account without profile row");
        Err(e)
      }
      Err(e) => Err(e),
    }
  }

  /// Run an external call under the configured timeout.
  pub(crate) async fn bounded<T>(
    &self,
    what: &str,
    call: impl Future<Output = Result<T>>,
  ) -> Result<T> {
    match tokio::time::timeout(self.config.upstream_timeout, call).await {
      Ok(result) => result,
      Err(_) => {
        tracing::warn!(collaborator = what, "external call timed out");
        Err(Error::Upstream(format!("{what} timed out")))
      }
    }
  }

  /// Deliver a notification. Failures are logged and swallowed.
  pub(crate) async fn notify(&self, email: Email) {
    let to = email.to.clone();
    match tokio::time::timeout(self.config.upstream_timeout, self.mailer.send(email)).await
    {
      Ok(Ok(())) => tracing::debug!(%to, "notification sent"),
      Ok(Err(e)) => tracing::warn!(%to, error = %e, "notification failed"),
      Err(_) => tracing::warn!(%to, "notification timed out"),
    }
  }

  pub(crate) fn objects(&self) -> &dyn ObjectStore { self.objects.as_ref() }
}

// ─── Input checks ────────────────────────────────────────────────────────────

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub(crate) struct Checks(Vec<FieldError>);

impl Checks {
  pub(crate) fn new() -> Self { Self::default() }

  pub(crate) fn push(&mut self, error: Option<FieldError>) {
    self.0.extend(error);
  }

  pub(crate) fn fail(&mut self, field: &str, message: &str) {
    self.0.push(FieldError::new(field, message));
  }

  /// Non-empty after trimming.
  pub(crate) fn required(&mut self, field: &str, value: &str) {
    if value.trim().is_empty() {
      self.fail(field, "is required");
    }
  }

  /// Present values must be non-empty; absent ones are fine.
  pub(crate) fn required_if_present(&mut self, field: &str, value: Option<&str>) {
    if let Some(v) = value {
      self.required(field, v);
    }
  }

  pub(crate) fn email(&mut self, field: &str, value: &str) {
    if !looks_like_email(value) {
      self.fail(field, "must be a valid email address");
    }
  }

  pub(crate) fn at_least(&mut self, field: &str, value: u32, min: u32) {
    if value < min {
      self.fail(field, &format!("must be at least {min}"));
    }
  }

  pub(crate) fn finish(self) -> Result<()> {
    if self.0.is_empty() { Ok(()) } else { Err(Error::Validation(self.0)) }
  }
}

/// A deliberately loose shape check: one `@`, a non-empty local part, and a
/// dotted domain without whitespace.
fn looks_like_email(value: &str) -> bool {
  let value = value.trim();
  let Some((local, domain)) = value.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && domain.contains('.')
    && !domain.starts_with('.')
    && !domain.ends_with('.')
    && !value.chars().any(char::is_whitespace)
}

/// The `{id, email, role}` projection used in several responses.
pub(crate) fn summary(account: &Account) -> crate::account::AccountSummary {
  account.into()
}
