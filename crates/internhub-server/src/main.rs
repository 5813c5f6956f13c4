//! InternHub server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and object directory, and serves the JSON API over HTTP.
//!
//! # Creating the first administrator
//!
//! ```text
//! cargo run -p internhub-server -- seed-admin --email root@example.com \
//!   --first-name Ada --last-name Root
//! ```
//!
//! The password is read from stdin.

mod mail;
mod objects;
mod settings;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use axum::http::{HeaderValue, Method, header};
use clap::{Parser, Subcommand};
use internhub_core::{
  mail::{LogMailer, Mailer},
  service::{Hub, HubConfig},
};
use internhub_store_sqlite::SqliteStore;
use rand_core::{OsRng, RngCore};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use mail::SmtpMailer;
use objects::{FsObjectStore, download_router};
use settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "InternHub API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Create the first administrator. Reads the password from stdin.
  SeedAdmin {
    #[arg(long)]
    email:      String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name:  String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let database_path = expand_tilde(&cfg.database_path);
  let store = SqliteStore::open(&database_path)
    .await
    .with_context(|| format!("failed to open store at {database_path:?}"))?
    .with_session_ttl(Duration::from_secs(cfg.session_ttl_secs));

  let objects_dir = expand_tilde(&cfg.objects_dir);
  let objects = Arc::new(
    FsObjectStore::open(
      objects_dir.clone(),
      cfg.public_url.clone(),
      link_secret(&cfg)?,
      Duration::from_secs(cfg.link_ttl_secs),
    )
    .await
    .with_context(|| format!("failed to open object directory {objects_dir:?}"))?,
  );

  let mailer: Arc<dyn Mailer> = match &cfg.smtp {
    Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
    None => {
      tracing::warn!("no [smtp] configured; outgoing mail is only logged");
      Arc::new(LogMailer)
    }
  };

  let hub = Arc::new(Hub::new(
    Arc::new(store),
    objects.clone(),
    mailer,
    HubConfig {
      upstream_timeout: Duration::from_secs(cfg.upstream_timeout_secs),
      frontend_url:     cfg.frontend_url.clone(),
    },
  ));

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(&cfg, hub, objects).await,
    Command::SeedAdmin { email, first_name, last_name } => {
      let password = read_password()?;
      let admin = hub
        .bootstrap_admin(&email, &password, &first_name, &last_name)
        .await
        .context("failed to create administrator")?;
      println!("administrator {} ({})", admin.email, admin.id);
      Ok(())
    }
  }
}

async fn serve(
  cfg: &ServerConfig,
  hub: Arc<Hub<SqliteStore>>,
  objects: Arc<FsObjectStore>,
) -> anyhow::Result<()> {
  let origin: HeaderValue = cfg
    .frontend_url
    .parse()
    .with_context(|| format!("invalid frontend_url {:?}", cfg.frontend_url))?;
  let cors = CorsLayer::new()
    .allow_origin(origin)
    .allow_methods([Method::GET, Method::POST, Method::PATCH])
    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
    .allow_credentials(true);

  let app = internhub_api::api_router(hub)
    .merge(download_router(objects))
    .layer(cors);

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// The configured link key, or 32 fresh random bytes.
fn link_secret(cfg: &ServerConfig) -> anyhow::Result<Vec<u8>> {
  match &cfg.link_secret {
    Some(hex_key) => hex::decode(hex_key).context("link_secret must be hex"),
    None => {
      let mut key = vec![0u8; 32];
      OsRng.fill_bytes(&mut key);
      Ok(key)
    }
  }
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
