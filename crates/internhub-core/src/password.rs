//! Password policy and temporary credentials.

use rand_core::{OsRng, RngCore};

use crate::{FieldError, error::Error};

pub const MIN_PASSWORD_LEN: usize = 8;

const TEMP_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const TEMP_RANDOM_LEN: usize = 12;
/// Appended so every temporary password has an uppercase letter, a digit and
/// a symbol regardless of what was drawn.
const TEMP_SUFFIX: &str = "A1!";

/// A fresh one-time password for a provisioned account: twelve characters
/// from `[a-z0-9]` followed by `A1!`.
pub fn generate_temporary_password() -> String {
  let mut out = String::with_capacity(TEMP_RANDOM_LEN + TEMP_SUFFIX.len());
  // Rejection sampling keeps the draw uniform over the alphabet.
  let limit = 256 - (256 % TEMP_ALPHABET.len());
  let mut buf = [0u8; 32];
  while out.len() < TEMP_RANDOM_LEN {
    OsRng.fill_bytes(&mut buf);
    for &b in &buf {
      if (b as usize) < limit && out.len() < TEMP_RANDOM_LEN {
        out.push(TEMP_ALPHABET[b as usize % TEMP_ALPHABET.len()] as char);
      }
    }
  }
  out.push_str(TEMP_SUFFIX);
  out
}

/// Field errors for a user-chosen password, keyed on `field`.
pub fn check_password(field: &str, password: &str) -> Option<FieldError> {
  (password.chars().count() < MIN_PASSWORD_LEN).then(|| {
    FieldError::new(field, format!("must be at least {MIN_PASSWORD_LEN} characters"))
  })
}

/// [`check_password`] as a hard error.
pub fn require_password(field: &str, password: &str) -> Result<(), Error> {
  match check_password(field, password) {
    Some(e) => Err(Error::Validation(vec![e])),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn temporary_password_shape() {
    for _ in 0..50 {
      let pw = generate_temporary_password();
      assert_eq!(pw.len(), 15);
      assert!(pw.ends_with("A1!"));
      assert!(
        pw[..12]
          .bytes()
          .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
      );
    }
  }

  #[test]
  fn temporary_passwords_differ() {
    assert_ne!(generate_temporary_password(), generate_temporary_password());
  }

  #[test]
  fn short_passwords_are_rejected() {
    assert!(check_password("password", "short").is_some());
    assert!(check_password("password", "long enough").is_none());
    assert!(matches!(require_password("password", "1234567"), Err(Error::Validation(_))));
  }
}
