//! Outbound notifications.
//!
//! Delivery is best effort: callers go through [`crate::service::Hub`], which
//! logs a failed send and carries on.

use thiserror::Error;

use crate::objects::BoxFuture;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
  pub to:      String,
  pub subject: String,
  pub text:    String,
  pub html:    String,
}

#[derive(Debug, Error)]
pub enum MailError {
  #[error("invalid address: {0}")]
  InvalidAddress(String),

  #[error("transport error: {0}")]
  Transport(String),
}

pub trait Mailer: Send + Sync {
  fn send(&self, email: Email) -> BoxFuture<'_, Result<(), MailError>>;
}

/// A mailer that only logs what it would have sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
  fn send(&self, email: Email) -> BoxFuture<'_, Result<(), MailError>> {
    Box::pin(async move {
      tracing::info!(to = %email.to, subject = %email.subject, "email not sent (log mailer)");
      Ok(())
    })
  }
}

// ─── Templates ───────────────────────────────────────────────────────────────

pub fn welcome_intern(to: &str, name: &str) -> Email {
  Email {
    to:      to.to_owned(),
    subject: "Welcome to InternHub".to_owned(),
    text:    format!(
      "Hi {name},\n\nYour account has been created. You can now start exploring \
       projects and applying for internships.\n"
    ),
    html:    format!(
      "<h2>Welcome to InternHub!</h2><p>Hi {name},</p><p>Your account has been \
       created. You can now start exploring projects and applying for \
       internships.</p>"
    ),
  }
}

/// Sent to a freshly provisioned guide. The temporary password is relayed by
/// the admin and never included here.
pub fn welcome_guide(to: &str, name: &str, login_url: &str) -> Email {
  Email {
    to:      to.to_owned(),
    subject: "Your InternHub guide account".to_owned(),
    text:    format!(
      "Hi {name},\n\nAn administrator created a guide account for you. Your \
       administrator will share a temporary password; sign in at {login_url} \
       and choose a new one.\n"
    ),
    html:    format!(
      "<h2>Your guide account is ready</h2><p>Hi {name},</p><p>An administrator \
       created a guide account for you. Your administrator will share a \
       temporary password; sign in at <a href=\"{login_url}\">{login_url}</a> \
       and choose a new one.</p>"
    ),
  }
}

pub fn password_reset(to: &str, reset_url: &str) -> Email {
  Email {
    to:      to.to_owned(),
    subject: "Reset your password - InternHub".to_owned(),
    text:    format!(
      "Follow this link to reset your password:\n{reset_url}\n\nThe link \
       expires in 1 hour.\n"
    ),
    html:    format!(
      "<h2>Reset your password</h2><p>Follow the link below to reset your \
       password:</p><a href=\"{reset_url}\">{reset_url}</a><p>The link expires \
       in 1 hour.</p>"
    ),
  }
}
