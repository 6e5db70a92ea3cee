//! folio bot
//!
//! Portfolio tracker for Moscow Exchange securities, served over Telegram or
//! an interactive console.
//!
//! # Usage
//!
//! ```bash
//! # Telegram long polling
//! export TELEGRAM_BOT_TOKEN="123456:ABC..."
//! cargo run --bin folio-bot -p folio-bot
//!
//! # Console session as user 1, holdings kept in memory
//! cargo run --bin folio-bot -p folio-bot -- --mode repl --memory
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use folio_bot::platforms::{CliBot, TelegramBot};
use folio_bot::{BotConfig, PortfolioBot, Storage};
use folio_core::UserId;
use folio_utils::{LogFormat, ProcessEnv, init_tracing};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_LOG_DIRECTIVE: &str =
    "warn,folio_bot=info,folio_core=info,folio_moex=info,folio_ledger=info";

/// How often idle dialogue slots are swept
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Telegram Bot API long polling
    Telegram,
    /// Interactive console as a single user
    Repl,
}

#[derive(Parser, Debug)]
#[command(name = "folio-bot")]
#[command(about = "Chat portfolio tracker for Moscow Exchange securities", long_about = None)]
struct Args {
    /// Front-end to run
    #[arg(long, value_enum, default_value_t = Mode::Telegram)]
    mode: Mode,

    /// SQLite database file (overrides FOLIO_DB_PATH)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Keep holdings in memory instead of SQLite
    #[arg(long, conflicts_with = "db")]
    memory: bool,

    /// User id of the console session
    #[arg(long, env = "FOLIO_REPL_USER", default_value_t = 1)]
    user_id: i64,

    /// Emit logs as JSON (overrides FOLIO_LOG_FORMAT)
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = BotConfig::from_env(&ProcessEnv).context("invalid configuration")?;
    if let Some(path) = args.db {
        config.storage = Storage::Sqlite(path);
    }
    if args.memory {
        config.storage = Storage::Memory;
    }
    if args.json_logs {
        config.log_format = LogFormat::Json;
    }

    init_tracing(DEFAULT_LOG_DIRECTIVE, config.log_format);
    info!(mode = ?args.mode, storage = ?config.storage, "starting folio-bot");

    let bot = Arc::new(PortfolioBot::from_config(&config).context("failed to start the bot")?);
    let janitor = bot.store().spawn_janitor(PRUNE_INTERVAL);

    match args.mode {
        Mode::Telegram => {
            let telegram = config.require_telegram()?.clone();
            let telegram = TelegramBot::new(telegram, Arc::clone(&bot), config.conversation_ttl)?;
            telegram.run_until(shutdown_signal()).await?;
        }
        Mode::Repl => {
            CliBot::new(Arc::clone(&bot), UserId(args.user_id))
                .run_stdio()
                .await?;
        }
    }

    janitor.abort();
    info!("folio-bot stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received");
}
