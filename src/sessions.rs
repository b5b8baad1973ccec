//! Shared session types for one monitoring cycle.
//!
//! Every value here is built fresh by a cycle and dropped when the cycle
//! ends. Nothing is cached or shared between cycles.

use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Appended to a prompt that was cut to fit the character budget.
pub const TRUNCATION_MARKER: &str = "…";

/// Why a transcript produced no prompts even though it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// The file could not be opened or read.
    Unreadable,
    /// The file has content but not a single line parsed as JSON.
    Malformed,
}

impl Diagnostic {
    pub fn label(&self) -> &'static str {
        match self {
            Diagnostic::Unreadable => "transcript unreadable",
            Diagnostic::Malformed => "transcript malformed",
        }
    }
}

/// One user-authored message, in transcript order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// 0-based position among the session's user prompts
    pub ordinal: usize,
    /// Whitespace-collapsed text, never truncated
    pub text: String,
}

impl Prompt {
    /// The text as shown in the report, cut to at most `max_chars` characters.
    pub fn display_text(&self, max_chars: usize) -> String {
        truncate_chars(&self.text, max_chars)
    }
}

/// Cut `text` to `max_chars` Unicode scalar values, marker included.
///
/// Text that already fits is returned unchanged. Otherwise the kept prefix
/// plus [`TRUNCATION_MARKER`] is exactly `max_chars` long. A budget smaller
/// than the marker yields the marker alone.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    let keep = max_chars.saturating_sub(marker_len);

    // char_indices keeps the cut on a UTF-8 boundary
    let end = text
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());

    format!("{}{}", &text[..end], TRUNCATION_MARKER)
}

/// A transcript file that was modified today.
#[derive(Debug, Clone)]
pub struct Session {
    /// File stem, e.g. the session UUID
    pub id: String,
    /// Parent directory name under the projects root
    pub project: String,
    pub path: PathBuf,
    pub last_modified: DateTime<Local>,
    /// Filled in by the extractor
    pub prompts: Vec<Prompt>,
    /// Working directory recorded in the transcript, if any
    pub cwd: Option<String>,
    pub diagnostic: Option<Diagnostic>,
}

impl Session {
    pub fn new(id: String, project: String, path: PathBuf, last_modified: DateTime<Local>) -> Self {
        Self {
            id,
            project,
            path,
            last_modified,
            prompts: Vec::new(),
            cwd: None,
            diagnostic: None,
        }
    }

    /// First 8 characters of the id, enough to tell sessions apart.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// The selected sessions of one project, most recent first.
#[derive(Debug, Clone)]
pub struct ProjectGroup {
    pub project: String,
    pub sessions: Vec<Session>,
}

impl ProjectGroup {
    /// Modification time of the newest session in the group.
    pub fn latest_activity(&self) -> Option<DateTime<Local>> {
        self.sessions.iter().map(|s| s.last_modified).max()
    }

    /// Human-readable name: the recorded cwd of the most recent session
    /// that has one, otherwise the project directory name.
    pub fn label(&self) -> &str {
        self.sessions
            .iter()
            .find_map(|s| s.cwd.as_deref())
            .unwrap_or(&self.project)
    }
}

/// The result of one cycle, ready to render.
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    /// Budget applied to every prompt's display text
    pub max_chars: usize,
    pub projects: Vec<ProjectGroup>,
}

impl Report {
    pub fn session_count(&self) -> usize {
        self.projects.iter().map(|p| p.sessions.len()).sum()
    }
}
