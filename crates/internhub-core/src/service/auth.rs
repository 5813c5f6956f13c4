//! Registration, sign-in and password recovery.

use serde::{Deserialize, Serialize};

use super::{Backend, Checks, Hub, summary};
use crate::{
  Error, Result,
  account::{Account, AccountSummary, NewAccount, Role, normalize_email},
  guard::Caller,
  identity::{IdentityMetadata, IdentityProvider},
  mail,
  password::{check_password, require_password},
  store::HubStore,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub email:      String,
  pub password:   String,
  pub first_name: String,
  pub last_name:  String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
  pub message: &'static str,
  pub user:    AccountSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub access_token: String,
  pub token_type:   &'static str,
  pub expires_in:   i64,
  pub user:         Account,
}

/// `{"user": ...}` for `GET /auth/me`.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
  pub user: Account,
}

const RESET_REQUESTED: &str = "If the email exists, a reset link has been sent";

impl<S: Backend> Hub<S> {
  /// Self-service sign-up. Always creates an intern.
  pub async fn register_intern(&self, input: Registration) -> Result<Registered> {
    let mut checks = Checks::new();
    checks.email("email", &input.email);
    checks.push(check_password("password", &input.password));
    checks.required("firstName", &input.first_name);
    checks.required("lastName", &input.last_name);
    checks.finish()?;

    let email = normalize_email(&input.email);
    let first_name = input.first_name.trim().to_owned();
    let last_name = input.last_name.trim().to_owned();

    let account = self
      .enroll(&email, &input.password, first_name, last_name, Role::Intern, false)
      .await?;
    tracing::info!(account = %account.id, "intern registered");

    self
      .notify(mail::welcome_intern(&account.email, &account.profile.display_name()))
      .await;

    Ok(Registered {
      message: "Registration successful. You can now login.",
      user:    summary(&account),
    })
  }

  pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
    let mut checks = Checks::new();
    checks.email("email", email);
    checks.required("password", password);
    checks.finish()?;

    let email = normalize_email(email);
    let session = self
      .bounded("identity provider", self.store.sign_in(&email, password))
      .await?;
    let account = self
      .store
      .find_account_by_email(&normalize_email(&session.identity.email))
      .await?
      .ok_or_else(|| Error::not_found("user profile not found"))?;

    if !account.email_verified && session.identity.email_confirmed_at.is_none() {
      return Err(Error::unauthenticated(
        "please verify your email before logging in",
      ));
    }

    tracing::debug!(account = %account.id, "signed in");
    Ok(LoginResponse {
      access_token: session.access_token,
      token_type:   session.token_type,
      expires_in:   session.expires_in,
      user:         account,
    })
  }

  pub async fn me(&self, caller: &Caller) -> Result<UserView> {
    let account = caller.require_authenticated()?;
    Ok(UserView { user: account.clone() })
  }

  /// Never reveals whether `email` is registered.
  pub async fn request_password_reset(&self, email: &str) -> Result<&'static str> {
    let mut checks = Checks::new();
    checks.email("email", email);
    checks.finish()?;

    let email = normalize_email(email);
    match self
      .bounded("identity provider", self.store.issue_reset_token(&email))
      .await
    {
      Ok(Some(token)) => {
        let url = format!(
          "{}/reset-password?token={token}",
          self.config.frontend_url.trim_end_matches('/')
        );
        self.notify(mail::password_reset(&email, &url)).await;
      }
      Ok(None) => tracing::debug!("reset requested for unknown email"),
      Err(e) => tracing::warn!(error = %e, "could not issue reset token"),
    }
    Ok(RESET_REQUESTED)
  }

  pub async fn reset_password(&self, token: &str, password: &str) -> Result<&'static str> {
    let mut checks = Checks::new();
    checks.required("token", token);
    checks.push(check_password("password", password));
    checks.finish()?;

    let identity = self
      .bounded("identity provider", self.store.consume_reset_token(token))
      .await?
      .ok_or_else(|| Error::invalid("token", "invalid or expired reset token"))?;
    self
      .bounded(
        "identity provider",
        self.store.update_password(&identity.id, password),
      )
      .await?;

    if let Some(account) = self
      .store
      .find_account_by_email(&normalize_email(&identity.email))
      .await?
    {
      self.store.clear_must_reset_password(&account.id).await?;
    }
    tracing::info!(identity = %identity.id, "password reset");
    Ok("Password reset successfully")
  }

  /// Create the first administrator. Re-running with the email of an
  /// existing admin returns that admin unchanged.
  pub async fn bootstrap_admin(
    &self,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
  ) -> Result<Account> {
    let mut checks = Checks::new();
    checks.email("email", email);
    checks.push(check_password("password", password));
    checks.required("firstName", first_name);
    checks.required("lastName", last_name);
    checks.finish()?;

    let email = normalize_email(email);
    if let Some(existing) = self.store.find_account_by_email(&email).await? {
      return match existing.role() {
        Role::Admin => Ok(existing),
        role => Err(Error::Conflict(format!("{email} is already registered as {role}"))),
      };
    }

    let account = self
      .enroll(
        &email,
        password,
        first_name.trim().to_owned(),
        last_name.trim().to_owned(),
        Role::Admin,
        false,
      )
      .await?;
    tracing::info!(account = %account.id, "admin created");
    Ok(account)
  }

  /// Create an identity, then the account and profile bound to it. The
  /// identity is removed again if the account cannot be written.
  pub(crate) async fn enroll(
    &self,
    email: &str,
    password: &str,
    first_name: String,
    last_name: String,
    role: Role,
    must_reset_password: bool,
  ) -> Result<Account> {
    require_password("password", password)?;
    if self.store.find_account_by_email(email).await?.is_some() {
      return Err(Error::Conflict("email already registered".into()));
    }

    let metadata = IdentityMetadata {
      first_name: first_name.clone(),
      last_name: last_name.clone(),
      role,
    };
    let identity = self
      .bounded(
        "identity provider",
        self.store.create_identity(email, password, &metadata, true),
      )
      .await?;

    let created = self
      .store
      .create_account(NewAccount {
        id: identity.id.clone(),
        email: normalize_email(&identity.email),
        role,
        email_verified: identity.email_confirmed_at.is_some(),
        must_reset_password,
        first_name,
        last_name,
      })
      .await;

    match created {
      Ok(account) => Ok(account),
      Err(e) => {
        tracing::warn!(identity = %identity.id, error = %e, "account insert failed, removing identity");
        if let Err(cleanup) = self
          .bounded("identity provider", self.store.delete_identity(&identity.id))
          .await
        {
          tracing::error!(identity = %identity.id, error = %cleanup, "orphaned identity");
        }
        Err(e)
      }
    }
  }
}
