//! Markdown rendering of a [`Report`].
//!
//! Layout:
//!
//! ```text
//! # Workspace activity
//!
//! *Last updated: 2026-10-18 14:03:00*
//!
//! ---
//!
//! ## /home/me/app            <- project (cwd, or directory name)
//! `-home-me-app`
//!
//! ### 3f2a9c1e · 14:01        <- session (short id, mtime)
//! 1. first prompt
//! 2. second prompt
//! ```

use crate::sessions::{ProjectGroup, Report, Session};
use std::fmt::Write;

const TITLE: &str = "# Workspace activity";
const NO_SESSIONS: &str = "No active sessions today.";
const NO_PROMPTS: &str = "_(no prompts yet)_";

/// Render the report. Same report in, same bytes out.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", TITLE);
    let _ = writeln!(out);
    let _ = writeln!(out, "*Last updated: {}*", report.generated_at.format("%Y-%m-%d %H:%M:%S"));

    if report.projects.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", NO_SESSIONS);
        return out;
    }

    for group in &report.projects {
        render_project(&mut out, group, report.max_chars);
    }

    out
}

fn render_project(out: &mut String, group: &ProjectGroup, max_chars: usize) {
    let label = group.label();

    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = writeln!(out);
    let _ = writeln!(out, "## {}", label);
    if label != group.project {
        let _ = writeln!(out, "`{}`", group.project);
    }

    for session in &group.sessions {
        render_session(out, session, max_chars);
    }
}

fn render_session(out: &mut String, session: &Session, max_chars: usize) {
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "### {} · {}",
        session.short_id(),
        session.last_modified.format("%H:%M")
    );

    if let Some(diagnostic) = session.diagnostic {
        let _ = writeln!(out, "> ⚠ {}", diagnostic.label());
    }

    if session.prompts.is_empty() {
        let _ = writeln!(out, "{}", NO_PROMPTS);
        return;
    }

    for prompt in &session.prompts {
        let _ = writeln!(out, "{}. {}", prompt.ordinal + 1, prompt.display_text(max_chars));
    }
}
