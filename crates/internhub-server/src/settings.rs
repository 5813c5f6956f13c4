//! Runtime configuration: an optional TOML file layered under `INTERNHUB_*`
//! environment variables.
//!
//! Nested keys use a double underscore, e.g. `INTERNHUB_SMTP__HOST`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_database_path")]
  pub database_path:         PathBuf,
  /// Root directory of the `resumes` and `certificates` buckets.
  #[serde(default = "default_objects_dir")]
  pub objects_dir:           PathBuf,
  /// Externally reachable base URL of this server, used in object links.
  #[serde(default = "default_public_url")]
  pub public_url:            String,
  /// The web client: allowed CORS origin and base of links in emails.
  #[serde(default = "default_frontend_url")]
  pub frontend_url:          String,
  #[serde(default = "default_session_ttl_secs")]
  pub session_ttl_secs:      u64,
  /// How long a signed object link stays valid.
  #[serde(default = "default_link_ttl_secs")]
  pub link_ttl_secs:         u64,
  /// Bound on every identity-provider, object-store and mail call.
  #[serde(default = "default_upstream_timeout_secs")]
  pub upstream_timeout_secs: u64,
  /// Hex-encoded key for signing object links. A random key is generated at
  /// startup when unset, so links do not survive a restart.
  #[serde(default)]
  pub link_secret:           Option<String>,
  /// Without this block mail is only logged.
  #[serde(default)]
  pub smtp:                  Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
  pub host:     String,
  #[serde(default = "default_smtp_port")]
  pub port:     u16,
  pub username: Option<String>,
  pub password: Option<String>,
  pub from:     String,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 5000 }
fn default_database_path() -> PathBuf { "internhub.db".into() }
fn default_objects_dir() -> PathBuf { "objects".into() }
fn default_public_url() -> String { "http://localhost:5000".into() }
fn default_frontend_url() -> String { "http://localhost:3000".into() }
fn default_session_ttl_secs() -> u64 { 3600 }
fn default_link_ttl_secs() -> u64 { 3600 }
fn default_upstream_timeout_secs() -> u64 { 10 }
fn default_smtp_port() -> u16 { 587 }

impl ServerConfig {
  /// Read `path` if it exists, then apply the environment on top.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("INTERNHUB")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
