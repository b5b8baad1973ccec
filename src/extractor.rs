//! Prompt extraction - pulls the first few user-authored prompts out of a
//! session transcript.
//!
//! Claude stores sessions as JSONL with various record types:
//! - "user": user prompts, but also tool results and injected command output
//! - "assistant": Claude responses
//! - "system", "summary", snapshots...: bookkeeping
//!
//! Each line is read into a loose [`RawRecord`] and classified into a
//! [`TranscriptEntry`]. Anything that doesn't look like a prompt a human
//! typed is ignored, so format drift fails closed.

use crate::sessions::{Diagnostic, Prompt, Session};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Markers of text injected by the CLI rather than typed by the user
const INJECTED_TAGS: &[&str] = &[
    "<command-name>",
    "<local-command-stdout>",
    "<system-reminder>",
    "<task-notification>",
    "<task-id>",
    "<output-file>",
];

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    record_type: Option<String>,
    message: Option<serde_json::Value>,
    #[serde(rename = "isMeta")]
    is_meta: Option<bool>,
    cwd: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    role: Option<String>,
    content: Option<serde_json::Value>, // string or array of content blocks
}

/// What a single transcript line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    /// A prompt typed by the user, whitespace already collapsed
    User(String),
    Assistant,
    /// Harness-generated: meta records, command output, reminders
    System,
    /// Tool results, which Claude files under "user"
    Tool,
    Unknown,
}

impl TranscriptEntry {
    fn classify(record: &RawRecord) -> Self {
        match record.record_type.as_deref() {
            Some("user") => classify_user(record),
            Some("assistant") => TranscriptEntry::Assistant,
            Some("system") => TranscriptEntry::System,
            _ => TranscriptEntry::Unknown,
        }
    }
}

fn classify_user(record: &RawRecord) -> TranscriptEntry {
    if record.is_meta.unwrap_or(false) {
        return TranscriptEntry::System;
    }

    let Some(message) = record
        .message
        .as_ref()
        .and_then(|m| serde_json::from_value::<RawMessage>(m.clone()).ok())
    else {
        return TranscriptEntry::Unknown;
    };

    if message.role.as_deref() != Some("user") {
        return TranscriptEntry::System;
    }

    let raw = match message.content {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Array(blocks)) => {
            let is_tool_result = blocks
                .iter()
                .any(|b| b.get("type").and_then(|t| t.as_str()) == Some("tool_result"));
            if is_tool_result {
                return TranscriptEntry::Tool;
            }
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join(" ")
        }
        _ => return TranscriptEntry::Unknown,
    };

    if INJECTED_TAGS.iter().any(|tag| raw.contains(tag)) {
        return TranscriptEntry::System;
    }

    // Unbalanced markup would break the rendered Markdown
    let (opens, closes) = count_tags(&raw);
    if opens != closes {
        return TranscriptEntry::System;
    }

    let text = collapse_whitespace(&raw);
    if text.is_empty() {
        return TranscriptEntry::Unknown;
    }
    TranscriptEntry::User(text)
}

/// Count `<name ...>` opening and `</name>` closing tags.
fn count_tags(text: &str) -> (usize, usize) {
    let bytes = text.as_bytes();
    let (mut opens, mut closes) = (0, 0);
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        let closing = bytes.get(i + 1) == Some(&b'/');
        let name_start = if closing { i + 2 } else { i + 1 };
        if !bytes.get(name_start).map_or(false, |b| b.is_ascii_alphabetic()) {
            i += 1;
            continue;
        }

        let mut j = name_start + 1;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'-') {
            j += 1;
        }

        match bytes.get(j) {
            Some(b'>') => {
                if closing { closes += 1 } else { opens += 1 }
                i = j + 1;
            }
            Some(b) if !closing && b.is_ascii_whitespace() => {
                // attributes run to the next '>'
                match bytes[j..].iter().position(|&b| b == b'>') {
                    Some(off) => {
                        opens += 1;
                        i = j + off + 1;
                    }
                    None => i = j,
                }
            }
            _ => i = j,
        }
    }

    (opens, closes)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A classified line plus the working directory it was recorded in.
#[derive(Debug)]
pub struct ParsedLine {
    pub entry: TranscriptEntry,
    pub cwd: Option<String>,
}

/// Parse one JSONL line. Fails only if the line isn't a JSON object.
pub fn parse_line(line: &str) -> Result<ParsedLine, serde_json::Error> {
    let record: RawRecord = serde_json::from_str(line)?;
    Ok(ParsedLine {
        entry: TranscriptEntry::classify(&record),
        cwd: record.cwd.filter(|c| !c.is_empty()),
    })
}

/// What was pulled out of one transcript.
#[derive(Debug, Default)]
pub struct Extraction {
    pub prompts: Vec<Prompt>,
    pub cwd: Option<String>,
    pub diagnostic: Option<Diagnostic>,
}

/// Read the first `max_prompts` user prompts from a transcript.
///
/// Never fails: an unreadable or entirely malformed file gives no prompts
/// and a diagnostic. Single bad lines (e.g. a half-written last line of a
/// live session) are skipped.
pub fn extract_prompts(path: &Path, max_prompts: usize) -> Extraction {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return unreadable();
        }
    };

    let mut out = Extraction::default();
    let mut saw_content = false;
    let mut parsed_any = false;

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return unreadable();
            }
        }
        // A line cut mid-character is skipped like any other partial line
        let line = match std::str::from_utf8(&buf) {
            Ok(l) => l.trim(),
            Err(e) => {
                saw_content = true;
                debug!("Skipping non-UTF-8 line in {}: {}", path.display(), e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        saw_content = true;

        let parsed = match parse_line(line) {
            Ok(p) => p,
            Err(e) => {
                debug!("Skipping malformed line in {}: {}", path.display(), e);
                continue;
            }
        };
        parsed_any = true;

        if out.cwd.is_none() {
            out.cwd = parsed.cwd;
        }
        if let TranscriptEntry::User(text) = parsed.entry {
            out.prompts.push(Prompt { ordinal: out.prompts.len(), text });
            if out.prompts.len() >= max_prompts {
                break;
            }
        }
    }

    if saw_content && !parsed_any {
        warn!("No parseable records in {}", path.display());
        out.diagnostic = Some(Diagnostic::Malformed);
    }

    out
}

fn unreadable() -> Extraction {
    Extraction {
        diagnostic: Some(Diagnostic::Unreadable),
        ..Extraction::default()
    }
}

/// Fill a session's prompts, cwd and diagnostic from its transcript.
pub fn extract_session(mut session: Session, max_prompts: usize) -> Session {
    let extraction = extract_prompts(&session.path, max_prompts);
    session.prompts = extraction.prompts;
    session.cwd = extraction.cwd;
    session.diagnostic = extraction.diagnostic;
    session
}
