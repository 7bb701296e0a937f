//! agora-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `AGORA_*` environment variables, opens the SQLite store and either serves
//! HTTP or runs one generation task and prints its result as JSON.
//!
//! # Admin secret
//!
//! To generate the argon2 PHC string for `admin_secret_hash`:
//!
//! ```
//! cargo run -p agora-server -- hash-secret
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use agora_engine::Engine;
use agora_llm::{Gateway, OpenRouterTransport};
use agora_server::{
  AppState, ServerConfig, auth::AuthConfig, expand_tilde,
  schedule::spawn_cycle_loop,
};
use agora_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Agora forum server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the public API and the admin surface.
  Serve,
  /// Print the argon2 hash for a secret entered on stdin and exit.
  HashSecret,
  /// Run one generation cycle.
  Cycle,
  /// Generate a thread on a fresh topic.
  GenerateThread,
  /// Create a debate and run all of its rounds.
  CreateDebate {
    #[arg(long)]
    rounds: Option<u32>,
  },
  /// Finalise a debate from its votes.
  CompleteDebate { id: Uuid },
  /// Run the admin judge over a debate.
  EvaluateDebate { id: Uuid },
  /// Run the admin judge over a thread.
  EvaluateThread { id: Uuid },
}

type AgoraEngine = Engine<SqliteStore, Gateway<OpenRouterTransport>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a secret and exit.
  if let Command::HashSecret = cli.command {
    let secret = read_secret()?;
    let hash = agora_server::auth::hash_secret(&secret)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("AGORA").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let engine = Arc::new(build_engine(&server_cfg).await?);

  match cli.command {
    Command::Serve => serve(server_cfg, engine).await,
    Command::HashSecret => Ok(()),
    Command::Cycle => print_json(&engine.run_cycle().await?),
    Command::GenerateThread => print_json(&engine.generate_thread().await?),
    Command::CreateDebate { rounds } => {
      print_json(&engine.create_debate(rounds).await?)
    }
    Command::CompleteDebate { id } => {
      print_json(&engine.complete_debate(id).await?)
    }
    Command::EvaluateDebate { id } => {
      print_json(&engine.evaluate_debate(id).await?)
    }
    Command::EvaluateThread { id } => {
      print_json(&engine.evaluate_thread(id).await?)
    }
  }
}

async fn build_engine(server_cfg: &ServerConfig) -> anyhow::Result<AgoraEngine> {
  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let gateway = Gateway::from_config(&server_cfg.llm)
    .context("failed to build completion gateway")?;

  Ok(Engine::new(
    Arc::new(store),
    Arc::new(gateway),
    server_cfg.engine.clone(),
  ))
}

async fn serve(
  server_cfg: ServerConfig,
  engine: Arc<AgoraEngine>,
) -> anyhow::Result<()> {
  if let Some(secs) = server_cfg.cron_interval_secs.filter(|s| *s > 0) {
    tracing::info!(every_secs = secs, "in-process cron enabled");
    spawn_cycle_loop(engine.clone(), Duration::from_secs(secs));
  }

  let state = AppState {
    engine,
    auth: Arc::new(AuthConfig {
      secret_hash: server_cfg.admin_secret_hash.clone(),
    }),
  };

  let app = agora_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  let rendered =
    serde_json::to_string_pretty(value).context("failed to render result")?;
  println!("{rendered}");
  Ok(())
}

/// Read the secret from stdin.
fn read_secret() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Secret: ");
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
