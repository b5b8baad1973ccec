//! Runtime configuration, read from CLI flags or `WORKSPACE_MONITOR_*`
//! environment variables.

use crate::error::ConfigError;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

pub const DEFAULT_INTERVAL_SECS: u64 = 180;
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 300;
pub const MAX_PROMPTS_PER_SESSION: usize = 3;
pub const MAX_SESSIONS_PER_PROJECT: usize = 3;

const DEFAULT_OUTPUT_FILE: &str = "active_chat.md";

/// Read from the working directory before flags and env vars are parsed.
pub const ENV_FILE: &str = ".env.local";

/// Summarize today's Claude Code sessions into a Markdown file.
#[derive(Debug, Clone, Parser)]
#[command(name = "workspace-monitor", version, about)]
pub struct Args {
    /// Seconds between the start of two cycles
    #[arg(long, env = "WORKSPACE_MONITOR_INTERVAL", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Where the Markdown report is written [default: ~/workspace-monitor/active_chat.md]
    #[arg(long, env = "WORKSPACE_MONITOR_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Claude config directory; sessions are read from its `projects/` folder [default: ~/.claude]
    #[arg(long, env = "WORKSPACE_MONITOR_CLAUDE_DIR")]
    pub claude_dir: Option<PathBuf>,

    /// Maximum characters shown per prompt
    #[arg(long, env = "WORKSPACE_MONITOR_MAX_CHARS", default_value_t = DEFAULT_MAX_PROMPT_CHARS)]
    pub max_chars: usize,

    /// Prompts shown per session
    #[arg(long, env = "WORKSPACE_MONITOR_MAX_PROMPTS", default_value_t = MAX_PROMPTS_PER_SESSION)]
    pub max_prompts: usize,

    /// Sessions shown per project
    #[arg(long, env = "WORKSPACE_MONITOR_MAX_SESSIONS", default_value_t = MAX_SESSIONS_PER_PROJECT)]
    pub max_sessions: usize,

    /// Leave out sessions that have no user prompts yet
    #[arg(long, env = "WORKSPACE_MONITOR_HIDE_EMPTY")]
    pub hide_empty: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

/// Validated settings handed to every cycle.
#[derive(Debug, Clone)]
pub struct Config {
    /// `<claude_dir>/projects`
    pub projects_dir: PathBuf,
    pub output_path: PathBuf,
    pub interval: Duration,
    pub max_chars: usize,
    pub max_prompts: usize,
    pub max_sessions: usize,
    pub hide_empty: bool,
}

impl Config {
    /// Resolve defaults and check everything that must hold before the
    /// first cycle. Creates the output directory if needed.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let home = dirs::home_dir();

        let claude_dir = match (&args.claude_dir, &home) {
            (Some(dir), _) => dir.clone(),
            (None, Some(home)) => home.join(".claude"),
            (None, None) => return Err(ConfigError::NoHomeDir),
        };
        let output_path = match (&args.output, &home) {
            (Some(path), _) => path.clone(),
            (None, Some(home)) => home.join("workspace-monitor").join(DEFAULT_OUTPUT_FILE),
            (None, None) => return Err(ConfigError::NoHomeDir),
        };

        if args.interval == 0 {
            return Err(ConfigError::Zero { name: "interval" });
        }
        if args.max_prompts == 0 {
            return Err(ConfigError::Zero { name: "max-prompts" });
        }
        if args.max_sessions == 0 {
            return Err(ConfigError::Zero { name: "max-sessions" });
        }

        if !claude_dir.is_dir() {
            return Err(ConfigError::ClaudeDirMissing(claude_dir));
        }
        let projects_dir = claude_dir.join("projects");
        if !projects_dir.is_dir() {
            return Err(ConfigError::ProjectsDirMissing(projects_dir));
        }
        fs::read_dir(&projects_dir).map_err(|source| ConfigError::ProjectsDirUnreadable {
            path: projects_dir.clone(),
            source,
        })?;

        ensure_output_writable(&output_path)?;

        Ok(Self {
            projects_dir,
            output_path,
            interval: Duration::from_secs(args.interval),
            max_chars: args.max_chars,
            max_prompts: args.max_prompts,
            max_sessions: args.max_sessions,
            hide_empty: args.hide_empty,
        })
    }
}

/// Create the output's directory and prove a report can be written there.
fn ensure_output_writable(output_path: &Path) -> Result<(), ConfigError> {
    if output_path.is_dir() {
        return Err(ConfigError::OutputIsDirectory(output_path.to_path_buf()));
    }

    let parent = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| ConfigError::OutputDirUnusable {
        path: parent.to_path_buf(),
        source,
    })?;

    // Dropped right away; the report itself goes through the same kind of temp file
    NamedTempFile::new_in(parent).map_err(|source| ConfigError::OutputNotWritable {
        path: parent.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Load `KEY=value` lines from `path` into the process environment.
///
/// Variables already set win. A missing file is not an error: returns
/// `Ok(false)`.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}
