//! Siren server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `SIREN_*`
//! environment variables, opens the SQLite store, and serves the JSON API
//! over HTTP. The remaining subcommands are operator tools that work on the
//! same store.
//!
//! ```text
//! siren serve
//! siren add-emergency-type --name Fire --description "Structure fires"
//! siren add-responder --username engine7 --email e7@example.org \
//!   --organization "Engine 7" --contact-number 555-0107 \
//!   --emergency-type <uuid> --latitude 40.71 --longitude -74.0
//! siren hash-password
//! ```

mod settings;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use siren_api::{AppState, auth::hash_password};
use siren_core::{
  account::{NewAccount, Role},
  emergency::NewEmergencyType,
  geo::Coordinate,
  responder::{self, Enlistment},
  store::DispatchStore,
};
use siren_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Siren emergency dispatch server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,

  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,

  /// Add an entry to the emergency type reference list.
  AddEmergencyType {
    #[arg(long)]
    name:        String,
    #[arg(long, default_value = "")]
    description: String,
  },

  /// Provision a responder account. The password is read from stdin.
  AddResponder {
    #[arg(long)]
    username:        String,
    #[arg(long)]
    email:           String,
    #[arg(long)]
    first_name:      Option<String>,
    #[arg(long)]
    last_name:       Option<String>,
    #[arg(long)]
    organization:    String,
    #[arg(long)]
    contact_number:  String,
    /// Repeat for each emergency type the responder handles.
    #[arg(long = "emergency-type")]
    emergency_types: Vec<Uuid>,
    #[arg(long, allow_negative_numbers = true)]
    latitude:        f64,
    #[arg(long, allow_negative_numbers = true)]
    longitude:       f64,
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

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => {
      let password = read_password()?;
      println!("{}", hash_password(&password)?);
      Ok(())
    }
    Command::Serve => {
      let (cfg, store) = open_store(&cli.config).await?;
      serve(cfg, store).await
    }
    Command::AddEmergencyType { name, description } => {
      let (_, store) = open_store(&cli.config).await?;
      let added = store
        .add_emergency_type(NewEmergencyType { name, description })
        .await
        .context("failed to add emergency type")?;
      println!("{}\t{}", added.emergency_type_id, added.name);
      Ok(())
    }
    Command::AddResponder {
      username,
      email,
      first_name,
      last_name,
      organization,
      contact_number,
      emergency_types,
      latitude,
      longitude,
    } => {
      let location = Coordinate::new(latitude, longitude)?;
      let (_, store) = open_store(&cli.config).await?;
      let password = read_password()?;
      let (account, profile) = responder::enlist(
        &store,
        NewAccount {
          username,
          email,
          first_name,
          last_name,
          phone_number: Some(contact_number.clone()),
          role: Role::Responder,
          password_hash: hash_password(&password)?,
        },
        Enlistment { organization, contact_number, emergency_types, location },
      )
      .await?;
      println!("{}\t{}\t{}", account.account_id, profile.responder_id, account.username);
      Ok(())
    }
  }
}

/// Load configuration and open the store it points at.
async fn open_store(config_path: &Path) -> anyhow::Result<(ServerConfig, SqliteStore)> {
  let cfg = ServerConfig::load(config_path)?;
  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  Ok((cfg, store))
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let app = siren_api::router(AppState::new(store));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']).to_string();
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
}
