//! vigil binary.
//!
//! Reads `vigil.toml` (or the path given with `--config`), opens the SQLite
//! document tree, and runs the alert and reminder schedulers until Ctrl-C.
//!
//! ```text
//! vigil --once --dry-run   # one tick per kind, log mail instead of sending
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use strum::IntoEnumIterator as _;
use tokio::sync::watch;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigil_bridge::{Deadlines, ReminderRepository, StoreBridge, TreeDirectory};
use vigil_core::record::RecordKind;
use vigil_engine::{Dispatcher, Scheduler};
use vigil_server::{ServerConfig, mail::Mailer};
use vigil_store_sqlite::SqliteTree;

#[derive(Parser)]
#[command(author, version, about = "Vigil equipment-check notification engine")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "vigil.toml")]
  config: PathBuf,

  /// Run a single tick for each kind, print the reports, and exit.
  #[arg(long)]
  once: bool,

  /// Log outgoing mail instead of sending it.
  #[arg(long)]
  dry_run: bool,
}

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

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("VIGIL")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let tree = SqliteTree::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mailer = Mailer::from_config(server_cfg.smtp.as_ref(), cli.dry_run)
    .context("failed to set up mail transport")?;
  if matches!(mailer, Mailer::Log(_)) {
    tracing::warn!("no SMTP transport in use; notices will only be logged");
  }

  // Wire the engine.
  let bridge = StoreBridge::new(
    Arc::new(tree),
    Deadlines::from(&server_cfg.engine.deadlines),
  );
  let engine_cfg = Arc::new(server_cfg.engine);
  let dispatcher = Dispatcher::new(
    Arc::new(TreeDirectory::new(bridge.clone())),
    Arc::new(mailer),
    engine_cfg.administrator_role.clone(),
  );
  let scheduler = Scheduler::new(ReminderRepository::new(bridge), dispatcher, engine_cfg);

  if cli.once {
    let now = Utc::now();
    for kind in RecordKind::iter() {
      let report = scheduler.run_tick(kind, now).await;
      println!("{}", serde_json::to_string(&report)?);
    }
    return Ok(());
  }

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let loops: Vec<_> = RecordKind::iter()
    .map(|kind| scheduler.spawn(kind, shutdown_rx.clone()))
    .collect();

  tokio::signal::ctrl_c()
    .await
    .context("failed to listen for ctrl-c")?;
  tracing::info!("shutdown requested; letting in-flight ticks finish");
  shutdown_tx.send_replace(true);

  for handle in loops {
    handle.await.context("scheduler task panicked")?;
  }
  tracing::info!("stopped");
  Ok(())
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
