//! SMTP delivery for hub notifications.

use internhub_core::{
  mail::{Email, MailError, Mailer},
  objects::BoxFuture,
};
use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
  message::{Mailbox, MultiPart, SinglePart, header::ContentType},
  transport::smtp::{Error as SmtpError, authentication::Credentials},
};

use crate::settings::SmtpConfig;

pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
}

impl SmtpMailer {
  pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
      .map_err(|e: SmtpError| anyhow::anyhow!("smtp relay {}: {e}", config.host))?
      .port(config.port);
    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
      builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }
    let from = config
      .from
      .parse()
      .map_err(|e| anyhow::anyhow!("invalid smtp.from {:?}: {e}", config.from))?;
    Ok(Self { transport: builder.build(), from })
  }

  fn build(&self, email: Email) -> Result<Message, MailError> {
    let to: Mailbox = email
      .to
      .parse()
      .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;
    Message::builder()
      .from(self.from.clone())
      .to(to)
      .subject(email.subject)
      .multipart(
        MultiPart::alternative()
          .singlepart(
            SinglePart::builder()
              .header(ContentType::TEXT_PLAIN)
              .body(email.text),
          )
          .singlepart(
            SinglePart::builder()
              .header(ContentType::TEXT_HTML)
              .body(email.html),
          ),
      )
      .map_err(|e| MailError::Transport(e.to_string()))
  }
}

impl Mailer for SmtpMailer {
  fn send(&self, email: Email) -> BoxFuture<'_, Result<(), MailError>> {
    Box::pin(async move {
      let message = self.build(email)?;
      self
        .transport
        .send(message)
        .await
        .map_err(|e| MailError::Transport(e.to_string()))?;
      Ok(())
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mailer() -> SmtpMailer {
    SmtpMailer::new(&SmtpConfig {
      host:     "smtp.example.com".into(),
      port:     587,
      username: None,
      password: None,
      from:     "InternHub <noreply@example.com>".into(),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn bad_recipient_is_reported_before_sending() {
    let err = mailer()
      .send(internhub_core::mail::welcome_intern("not an address", "Ivy"))
      .await
      .unwrap_err();
    assert!(matches!(err, MailError::InvalidAddress(_)));
  }

  #[tokio::test]
  async fn messages_carry_both_bodies() {
    let message = mailer()
      .build(internhub_core::mail::welcome_intern("ivy@example.com", "Ivy"))
      .unwrap();
    let raw = String::from_utf8(message.formatted()).unwrap();
    assert!(raw.contains("multipart/alternative"));
    assert!(raw.contains("Subject: Welcome to InternHub"));
  }

  #[tokio::test]
  async fn invalid_sender_is_rejected() {
    let result = SmtpMailer::new(&SmtpConfig {
      host:     "smtp.example.com".into(),
      port:     587,
      username: None,
      password: None,
      from:     "nobody".into(),
    });
    assert!(result.is_err());
  }
}
