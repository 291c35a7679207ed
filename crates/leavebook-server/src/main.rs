//! leavebook server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, seeds the directory and global leave types from
//! the config, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an account's `password_hash`:
//!
//! ```text
//! cargo run -p leavebook-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use leavebook_core::notify::{Notifier, TracingNotifier};
use leavebook_server::{AppState, ServerConfig, sweep};
use leavebook_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Leavebook leave management server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    let password = rpassword_or_stdin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("LEAVEBOOK"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  let sweep_policy = server_cfg
    .sweep_policy()
    .context("invalid auto_escalate_after_hours")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Seed the directory and the shared leave types.
  for profile in server_cfg.users.iter().cloned() {
    let user_id = profile.user_id;
    store
      .upsert_user(profile)
      .await
      .with_context(|| format!("failed to seed user {user_id}"))?;
  }
  for leave_type in server_cfg.global_leave_types.iter().cloned() {
    let name = leave_type.name.clone();
    store
      .ensure_global_leave_type(leave_type)
      .await
      .with_context(|| format!("failed to seed leave type {name:?}"))?;
  }
  tracing::info!(
    users = server_cfg.users.len(),
    leave_types = server_cfg.global_leave_types.len(),
    accounts = server_cfg.accounts.len(),
    "configuration applied"
  );

  let store = Arc::new(store);
  let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

  if let Some(policy) = sweep_policy {
    let every = server_cfg.sweep_interval();
    tracing::info!(?every, reason = %policy.reason(), "auto-escalation enabled");
    tokio::spawn(sweep::run_sweep(store.clone(), notifier.clone(), policy, every));
  }

  let state = AppState {
    store,
    auth: Arc::new(server_cfg.auth()),
    notifier,
  };

  let app = leavebook_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
