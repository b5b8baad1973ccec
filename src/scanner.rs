//! Session discovery - finds transcripts under the projects root that were
//! modified since the start of today.
//!
//! Layout:
//! - `<root>/<project_id>/<session_id>.jsonl` (main sessions, picked up)
//! - `<root>/<project_id>/<session_id>/subagents/*.jsonl` (ignored, too deep)
//! - `<root>/<project_id>/agent-*.jsonl` (sidechains, ignored)
//!
//! Recognition is purely structural; file contents are not looked at here.

use crate::error::ScanError;
use crate::sessions::Session;
use chrono::{DateTime, Duration, Local, LocalResult, NaiveTime};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Depth of `<root>/<project>/<file>` relative to the root
const SESSION_DEPTH: usize = 2;

/// Start of the local calendar day containing `now`.
///
/// When local midnight does not exist (DST jump at 00:00) the boundary falls
/// back to midnight at `now`'s UTC offset.
pub fn start_of_day(now: DateTime<Local>) -> DateTime<Local> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match midnight.and_local_timezone(Local) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let offset = *now.offset();
            let utc = midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
            DateTime::from_naive_utc_and_offset(utc, offset)
        }
    }
}

/// Lazily yield every session under `root` modified at or after `since`.
///
/// The root itself must be a readable directory. Anything that goes wrong
/// below it (permissions, files vanishing mid-walk) only drops that entry.
pub fn scan_sessions(
    root: &Path,
    since: DateTime<Local>,
) -> Result<impl Iterator<Item = Session>, ScanError> {
    check_root(root)?;

    // Symlinks are not followed, so a file is never reached twice.
    let walker = WalkDir::new(root)
        .min_depth(SESSION_DEPTH)
        .max_depth(SESSION_DEPTH)
        .follow_links(false)
        .sort_by_file_name();

    let sessions = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(is_session_file)
        .filter_map(move |entry| session_from_entry(&entry, since));

    Ok(sessions)
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    let meta = match fs::metadata(root) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ScanError::RootMissing(root.to_path_buf()));
        }
        Err(source) => {
            return Err(ScanError::RootUnreadable { path: root.to_path_buf(), source });
        }
    };

    if !meta.is_dir() {
        return Err(ScanError::RootUnreadable {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    fs::read_dir(root)
        .map(|_| ())
        .map_err(|source| ScanError::RootUnreadable { path: root.to_path_buf(), source })
}

fn is_session_file(entry: &DirEntry) -> bool {
    if !entry.file_type().is_file() {
        return false;
    }
    let path = entry.path();
    if path.extension().map_or(true, |e| e != "jsonl") {
        return false;
    }
    // Sidechain transcripts live next to sessions but aren't sessions
    path.file_stem()
        .and_then(|s| s.to_str())
        .map_or(false, |stem| !stem.is_empty() && !stem.starts_with("agent-"))
}

fn session_from_entry(entry: &DirEntry, since: DateTime<Local>) -> Option<Session> {
    let path = entry.path();

    let modified = match entry.metadata().map_err(io::Error::from).and_then(|m| m.modified()) {
        Ok(t) => DateTime::<Local>::from(t),
        Err(e) => {
            debug!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };

    if modified < since {
        return None;
    }

    let id = path.file_stem()?.to_str()?.to_string();
    let project = path.parent()?.file_name()?.to_str()?.to_string();

    Some(Session::new(id, project, path.to_path_buf(), modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use std::fs::File;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn touch(path: &Path, mtime: DateTime<Local>) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}\n").unwrap();
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::from(mtime)).unwrap();
    }

    fn ids(root: &Path, since: DateTime<Local>) -> Vec<String> {
        let mut ids: Vec<String> = scan_sessions(root, since)
            .unwrap()
            .map(|s| format!("{}/{}", s.project, s.id))
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_start_of_day() {
        let now = Local.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).single().unwrap();
        let start = start_of_day(now);
        assert_eq!(start.date_naive(), now.date_naive());
        assert_eq!((start.hour(), start.minute(), start.second()), (0, 0, 0));
    }

    #[test]
    fn test_filters_by_boundary() {
        let tmp = TempDir::new().unwrap();
        let since = Local::now() - Duration::hours(1);

        touch(&tmp.path().join("-proj-a/today.jsonl"), since + Duration::minutes(10));
        touch(&tmp.path().join("-proj-a/exact.jsonl"), since);
        touch(&tmp.path().join("-proj-a/yesterday.jsonl"), since - Duration::hours(1));

        assert_eq!(ids(tmp.path(), since), vec!["-proj-a/exact", "-proj-a/today"]);
    }

    #[test]
    fn test_structural_recognition() {
        let tmp = TempDir::new().unwrap();
        let since = Local::now() - Duration::hours(1);
        let t = since + Duration::minutes(5);

        touch(&tmp.path().join("-proj/s1.jsonl"), t);
        touch(&tmp.path().join("-proj/notes.txt"), t);
        touch(&tmp.path().join("-proj/agent-1234.jsonl"), t);
        touch(&tmp.path().join("-proj/s1/subagents/agent-x.jsonl"), t);
        touch(&tmp.path().join("stray.jsonl"), t);

        assert_eq!(ids(tmp.path(), since), vec!["-proj/s1"]);
    }

    #[test]
    fn test_missing_root() {
        let tmp = TempDir::new().unwrap();
        let err = scan_sessions(&tmp.path().join("gone"), Local::now()).err().unwrap();
        assert!(matches!(err, ScanError::RootMissing(_)));
    }

    #[test]
    fn test_root_is_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, "x").unwrap();
        let err = scan_sessions(&file, Local::now()).err().unwrap();
        assert!(matches!(err, ScanError::RootUnreadable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_project_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let since = Local::now() - Duration::hours(1);
        let t = since + Duration::minutes(5);
        touch(&tmp.path().join("-ok/s1.jsonl"), t);
        touch(&tmp.path().join("-locked/s2.jsonl"), t);

        let locked = tmp.path().join("-locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let found = ids(tmp.path(), since);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // root can read anything, so only assert the readable one survives
        assert!(found.contains(&"-ok/s1".to_string()));
    }
}
