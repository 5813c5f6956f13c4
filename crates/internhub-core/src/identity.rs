//! The identity-provider boundary.
//!
//! The provider owns passwords and bearer credentials. This crate never sees
//! a stored password; it only exchanges credentials for verified identities.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, account::Role};

/// A verified identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIdentity {
  pub id:                 String,
  pub email:              String,
  pub email_confirmed_at: Option<DateTime<Utc>>,
}

/// Descriptive metadata attached to an identity at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityMetadata {
  pub first_name: String,
  pub last_name:  String,
  pub role:       Role,
}

/// An issued bearer credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub access_token: String,
  pub token_type:   &'static str,
  /// Seconds until the token stops verifying.
  pub expires_in:   i64,
  #[serde(skip)]
  pub identity:     ExternalIdentity,
}

/// Abstraction over the external identity provider.
///
/// Failures that concern the caller's credentials are reported as
/// [`crate::Error::Unauthenticated`]; a duplicate email on creation is
/// [`crate::Error::Conflict`].
pub trait IdentityProvider: Send + Sync {
  /// Create an identity with a password. The identity is confirmed
  /// immediately when `confirmed` is set.
  fn create_identity<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
    metadata: &'a IdentityMetadata,
    confirmed: bool,
  ) -> impl Future<Output = Result<ExternalIdentity>> + Send + 'a;

  fn get_identity<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<ExternalIdentity>>> + Send + 'a;

  fn find_identity_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<ExternalIdentity>>> + Send + 'a;

  /// Remove an identity and every credential issued for it.
  fn delete_identity<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Exchange an email/password pair for a bearer credential.
  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Session>> + Send + 'a;

  /// Resolve a bearer credential to the identity it was issued for.
  fn verify_token<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<ExternalIdentity>> + Send + 'a;

  /// Issue a single-use password-reset token, or `None` for unknown emails.
  fn issue_reset_token<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<String>>> + Send + 'a;

  /// Consume a reset token. Returns the identity it was issued for, or
  /// `None` if the token is unknown, expired or already used.
  fn consume_reset_token<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<ExternalIdentity>>> + Send + 'a;

  /// Replace the password and revoke every outstanding session.
  fn update_password<'a>(
    &'a self,
    id: &'a str,
    new_password: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}
