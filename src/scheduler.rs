//! The monitoring loop: scan → select → extract → render → write, then
//! sleep, until cancelled.
//!
//! A cycle is a plain synchronous function of the config and the current
//! time. The only await point is the sleep between cycles, which is raced
//! against the cancellation token. A cycle that has started always runs to
//! completion, so an interrupt can never land in the middle of a write.

use crate::config::Config;
use crate::error::{CycleError, ScanError};
use crate::extractor::extract_session;
use crate::output::write_report;
use crate::render::render_markdown;
use crate::scanner::{scan_sessions, start_of_day};
use crate::selector::group_and_select;
use crate::sessions::Report;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Source of "now" for the day boundary and the report timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// The wait between cycles.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// What one successful cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    pub projects: usize,
    pub sessions: usize,
    pub bytes: usize,
}

/// Totals for a finished [`Scheduler::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: usize,
    pub failed: usize,
}

/// Build today's report from disk. Pure apart from reading the filesystem.
pub fn build_report(config: &Config, now: DateTime<Local>) -> Result<Report, ScanError> {
    let candidates = scan_sessions(&config.projects_dir, start_of_day(now))?;

    let projects = if config.hide_empty {
        // Emptiness is only known after extraction, so extract first and let
        // the cap pick among sessions that will actually be shown.
        let shown = candidates
            .map(|s| extract_session(s, config.max_prompts))
            .filter(|s| !s.is_empty() || s.diagnostic.is_some());
        group_and_select(shown, config.max_sessions)
    } else {
        let mut groups = group_and_select(candidates, config.max_sessions);
        for group in &mut groups {
            group.sessions = std::mem::take(&mut group.sessions)
                .into_iter()
                .map(|s| extract_session(s, config.max_prompts))
                .collect();
        }
        groups
    };

    Ok(Report {
        generated_at: now,
        max_chars: config.max_chars,
        projects,
    })
}

/// Run one full cycle and replace the report file.
pub fn run_cycle(config: &Config, clock: &dyn Clock) -> Result<CycleOutcome, CycleError> {
    let report = build_report(config, clock.now())?;
    let markdown = render_markdown(&report);
    write_report(&config.output_path, &markdown)?;

    Ok(CycleOutcome {
        projects: report.projects.len(),
        sessions: report.session_count(),
        bytes: markdown.len(),
    })
}

pub struct Scheduler<C, S> {
    config: Config,
    clock: C,
    sleeper: S,
    cancel: CancellationToken,
}

impl<C: Clock, S: Sleeper> Scheduler<C, S> {
    pub fn new(config: Config, clock: C, sleeper: S, cancel: CancellationToken) -> Self {
        Self { config, clock, sleeper, cancel }
    }

    /// Loop until the token is cancelled. Cycle failures are logged and the
    /// loop carries on; the previous report stays on disk.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        while !self.cancel.is_cancelled() {
            summary.cycles += 1;
            debug!("Starting cycle {}", summary.cycles);

            match run_cycle(&self.config, &self.clock) {
                Ok(outcome) => info!(
                    "Updated {} ({} projects, {} sessions, {} bytes)",
                    self.config.output_path.display(),
                    outcome.projects,
                    outcome.sessions,
                    outcome.bytes
                ),
                Err(e) => {
                    summary.failed += 1;
                    error!("Cycle {} failed, keeping previous report: {}", summary.cycles, e);
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.sleeper.sleep(self.config.interval) => {}
            }
        }

        info!("Stopped after {} cycles ({} failed)", summary.cycles, summary.failed);
        summary
    }
}
