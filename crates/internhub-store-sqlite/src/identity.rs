//! A local [`IdentityProvider`] living in the same database as the hub data.
//!
//! Passwords are stored as argon2 PHC strings. Bearer and reset tokens are 32
//! random bytes, hex-encoded for the client; only their SHA-256 digest is
//! persisted.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use internhub_core::{
  Result as HubResult,
  account::normalize_email,
  identity::{ExternalIdentity, IdentityMetadata, IdentityProvider, Session},
};

use crate::{
  Error, Result,
  encode::{decode_dt, encode_dt},
  error::reject,
  store::SqliteStore,
};

const SESSION: &str = "session";
const RESET: &str = "reset";

fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| Error::Hash(e.to_string()))
  })
  .await
  .map_err(|e| Error::Hash(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> bool {
  tokio::task::spawn_blocking(move || {
    PasswordHash::new(&hash)
      .map(|parsed| {
        Argon2::default()
          .verify_password(password.as_bytes(), &parsed)
          .is_ok()
      })
      .unwrap_or(false)
  })
  .await
  .unwrap_or(false)
}

struct RawIdentity {
  id:                 String,
  email:              String,
  email_confirmed_at: Option<String>,
}

impl RawIdentity {
  fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      email:              row.get(1)?,
      email_confirmed_at: row.get(2)?,
    })
  }

  fn into_identity(self) -> Result<ExternalIdentity> {
    Ok(ExternalIdentity {
      id:                 self.id,
      email:              self.email,
      email_confirmed_at: self.email_confirmed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

fn load_identity(
  conn: &Connection,
  column: &str,
  value: &str,
) -> rusqlite::Result<Option<RawIdentity>> {
  conn
    .query_row(
      &format!("SELECT id, email, email_confirmed_at FROM identities WHERE {column} = ?1"),
      [value],
      RawIdentity::from_row,
    )
    .optional()
}

/// The identity a live token of `purpose` belongs to.
fn load_token_owner(
  conn: &Connection,
  digest: &str,
  purpose: &str,
  now: &str,
) -> rusqlite::Result<Option<RawIdentity>> {
  conn
    .query_row(
      "SELECT i.id, i.email, i.email_confirmed_at
         FROM identity_tokens t
         JOIN identities i ON i.id = t.identity_id
        WHERE t.token_hash = ?1 AND t.purpose = ?2 AND t.expires_at > ?3",
      [digest, purpose, now],
      RawIdentity::from_row,
    )
    .optional()
}

impl SqliteStore {
  async fn identity_where(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<ExternalIdentity>> {
    let raw = self
      .call(move |conn| Ok(load_identity(conn, column, &value)?))
      .await?;
    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn store_token(
    &self,
    identity_id: String,
    purpose: &'static str,
    ttl: chrono::Duration,
  ) -> Result<String> {
    let token = new_token();
    let digest = token_digest(&token);
    let now = Utc::now();
    let (created, expires) = (encode_dt(now), encode_dt(now + ttl));

    self
      .call(move |conn| {
        conn.execute(
          "DELETE FROM identity_tokens WHERE identity_id = ?1 AND expires_at <= ?2",
          [&identity_id, &created],
        )?;
        conn.execute(
          "INSERT INTO identity_tokens (token_hash, identity_id, purpose, expires_at, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![digest, identity_id, purpose, expires, created],
        )?;
        Ok(())
      })
      .await?;
    Ok(token)
  }
}

impl IdentityProvider for SqliteStore {
  async fn create_identity<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
    metadata: &'a IdentityMetadata,
    confirmed: bool,
  ) -> HubResult<ExternalIdentity> {
    let email = normalize_email(email);
    let hash = hash_password(password.to_owned()).await?;
    let metadata = serde_json::to_string(metadata)?;
    let now = Utc::now();
    let identity = ExternalIdentity {
      id: Uuid::new_v4().hyphenated().to_string(),
      email,
      email_confirmed_at: confirmed.then_some(now),
    };

    let row = identity.clone();
    self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if load_identity(&tx, "email", &row.email)?.is_some() {
          return Err(reject(internhub_core::Error::Conflict(
            "email already registered".into(),
          )));
        }
        tx.execute(
          "INSERT INTO identities (id, email, password_hash, email_confirmed_at, metadata,
                                   created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            row.id,
            row.email,
            hash,
            row.email_confirmed_at.map(encode_dt),
            metadata,
            encode_dt(now),
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(identity = %identity.id, "identity created");
    Ok(identity)
  }

  async fn get_identity<'a>(&'a self, id: &'a str) -> HubResult<Option<ExternalIdentity>> {
    Ok(self.identity_where("id", id.to_owned()).await?)
  }

  async fn find_identity_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> HubResult<Option<ExternalIdentity>> {
    Ok(self.identity_where("email", normalize_email(email)).await?)
  }

  async fn delete_identity<'a>(&'a self, id: &'a str) -> HubResult<()> {
    let id = id.to_owned();
    self
      .call(move |conn| {
        conn.execute("DELETE FROM identities WHERE id = ?1", [id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> HubResult<Session> {
    let email = normalize_email(email);
    let found = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, email, email_confirmed_at, password_hash
                 FROM identities WHERE email = ?1",
              [email],
              |row| Ok((RawIdentity::from_row(row)?, row.get::<_, String>(3)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let rejected = || internhub_core::Error::unauthenticated("invalid email or password");
    let Some((raw, hash)) = found else {
      return Err(rejected());
    };
    if !verify_password(password.to_owned(), hash).await {
      return Err(rejected());
    }

    let identity = raw.into_identity()?;
    let access_token = self
      .store_token(identity.id.clone(), SESSION, self.session_ttl)
      .await?;
    Ok(Session {
      access_token,
      token_type: "Bearer",
      expires_in: self.session_ttl.num_seconds(),
      identity,
    })
  }

  async fn verify_token<'a>(&'a self, token: &'a str) -> HubResult<ExternalIdentity> {
    if token.is_empty() {
      return Err(internhub_core::Error::unauthenticated("no token provided"));
    }
    let digest = token_digest(token);
    let now = encode_dt(Utc::now());
    let raw = self
      .call(move |conn| Ok(load_token_owner(conn, &digest, SESSION, &now)?))
      .await?;
    match raw {
      Some(raw) => Ok(raw.into_identity()?),
      None => Err(internhub_core::Error::unauthenticated("invalid token")),
    }
  }

  async fn issue_reset_token<'a>(&'a self, email: &'a str) -> HubResult<Option<String>> {
    let Some(identity) = self.identity_where("email", normalize_email(email)).await? else {
      return Ok(None);
    };
    let token = self.store_token(identity.id, RESET, self.reset_ttl).await?;
    Ok(Some(token))
  }

  async fn consume_reset_token<'a>(
    &'a self,
    token: &'a str,
  ) -> HubResult<Option<ExternalIdentity>> {
    let digest = token_digest(token);
    let now = encode_dt(Utc::now());
    let raw = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = load_token_owner(&tx, &digest, RESET, &now)?;
        tx.execute("DELETE FROM identity_tokens WHERE token_hash = ?1", [&digest])?;
        tx.commit()?;
        Ok(owner)
      })
      .await?;
    Ok(raw.map(RawIdentity::into_identity).transpose()?)
  }

  async fn update_password<'a>(&'a self, id: &'a str, new_password: &'a str) -> HubResult<()> {
    let hash = hash_password(new_password.to_owned()).await?;
    let id = id.to_owned();
    self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE identities SET password_hash = ?2 WHERE id = ?1",
          [&id, &hash],
        )?;
        if changed == 0 {
          return Err(reject(internhub_core::Error::not_found("identity not found")));
        }
        tx.execute(
          "DELETE FROM identity_tokens WHERE identity_id = ?1 AND purpose = ?2",
          [id.as_str(), SESSION],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
