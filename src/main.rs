//! # workspace-monitor
//!
//! Keeps a Markdown summary of today's Claude Code sessions up to date, so
//! several concurrent sessions can be followed at a glance.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────────┐
//! │ ~/.claude/      │──▶│ scanner  │──▶│ selector │──▶│ extractor │──▶│ render +     │
//! │ projects/*.jsonl│   │ (today)  │   │ (top 3)  │   │ (3 prompts│   │ atomic write │
//! └─────────────────┘   └──────────┘   └──────────┘   └───────────┘   └──────────────┘
//!                              ▲                                              │
//!                              └──────── scheduler: sleep(interval) ◀─────────┘
//! ```
//!
//! Every cycle starts from scratch; nothing is carried over from the
//! previous one except the report file on disk.
//!
//! ## Configuration
//!
//! - `WORKSPACE_MONITOR_INTERVAL` / `--interval` - seconds between cycles (180)
//! - `WORKSPACE_MONITOR_OUTPUT` / `--output` - report path
//! - `WORKSPACE_MONITOR_CLAUDE_DIR` / `--claude-dir` - Claude dir (`~/.claude`)
//! - `WORKSPACE_MONITOR_MAX_CHARS` / `--max-chars` - characters per prompt (300)
//! - `RUST_LOG` - log filter (`workspace_monitor=info`)
//!
//! Any of these may also be set in a `.env.local` file in the working
//! directory. Variables already in the environment take precedence.

mod config;
mod error;
mod extractor;
mod output;
mod render;
mod scanner;
mod scheduler;
mod selector;
mod sessions;

use crate::config::{Args, Config};
use crate::scheduler::{Scheduler, SystemClock, TokioSleeper};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// One cycle at a time on one thread: the interrupt handler can only run
// while the loop is parked in its sleep, never in the middle of a write.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Before the subscriber, so RUST_LOG can come from the file too
    let env_file = config::load_env_file(Path::new(config::ENV_FILE));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("workspace_monitor=info")))
        .init();

    match env_file {
        Ok(true) => info!("Loaded {}", config::ENV_FILE),
        Ok(false) => {}
        Err(e) => warn!("Failed to load {}: {}", config::ENV_FILE, e),
    }

    let args = Args::parse();

    let config = match Config::from_args(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting workspace-monitor v{}", env!("CARGO_PKG_VERSION"));
    info!("Sessions: {}", config.projects_dir.display());
    info!("Output: {}", config.output_path.display());

    if args.once {
        return match scheduler::run_cycle(&config, &SystemClock) {
            Ok(outcome) => {
                info!(
                    "Updated {} ({} projects, {} sessions)",
                    config.output_path.display(),
                    outcome.projects,
                    outcome.sessions
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Cycle failed: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    info!("Polling interval: {} seconds", config.interval.as_secs());

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping");
                interrupt.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
    // let the listener register before the first (non-yielding) cycle
    tokio::task::yield_now().await;

    Scheduler::new(config, SystemClock, TokioSleeper, cancel).run().await;

    info!("Stopped.");
    ExitCode::SUCCESS
}
