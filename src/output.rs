//! Atomic report replacement.
//!
//! The report is written to a temporary file in the target's directory and
//! renamed over the target. A reader sees either the previous report or the
//! new one, never a half-written file. If anything fails, the temporary
//! file is removed and the previous report stays in place.

use crate::error::WriteError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// Replace the file at `path` with `content`.
pub fn write_report(path: &Path, content: &str) -> Result<(), WriteError> {
    write_atomic_with(path, |file| file.write_all(content.as_bytes()))
}

fn write_atomic_with<F>(path: &Path, fill: F) -> Result<(), WriteError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let temp_err = |source| WriteError::Temp { dir: dir.to_path_buf(), source };

    // Same directory as the target so the rename can't cross filesystems.
    // A dropped NamedTempFile deletes itself, which covers every early return.
    let mut tmp: NamedTempFile = Builder::new()
        .prefix(".workspace-monitor.")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(temp_err)?;

    fill(tmp.as_file_mut()).map_err(temp_err)?;
    tmp.as_file_mut().flush().map_err(temp_err)?;
    tmp.as_file().sync_all().map_err(temp_err)?;

    tmp.persist(path).map_err(|e| WriteError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_creates_and_replaces() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("nested").join("report.md");

        write_report(&target, "first").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "first");

        write_report(&target, "second").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        assert_eq!(dir_entries(target.parent().unwrap()), vec!["report.md"]);
    }

    #[test]
    fn test_failed_write_keeps_previous_report() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("report.md");
        write_report(&target, "# good report\n").unwrap();

        let result = write_atomic_with(&target, |file| {
            file.write_all(b"# half a rep")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        });

        assert!(matches!(result, Err(WriteError::Temp { .. })));
        assert_eq!(fs::read_to_string(&target).unwrap(), "# good report\n");
        assert_eq!(dir_entries(tmp.path()), vec!["report.md"]);
    }

    #[test]
    fn test_failed_first_write_leaves_nothing() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("report.md");

        let result = write_atomic_with(&target, |_| Err(io::Error::new(io::ErrorKind::Other, "boom")));

        assert!(result.is_err());
        assert!(dir_entries(tmp.path()).is_empty());
    }

    #[test]
    fn test_persist_failure_cleans_up() {
        let tmp = TempDir::new().unwrap();
        // A non-empty directory in the way makes the rename fail
        let target = tmp.path().join("report.md");
        fs::create_dir_all(target.join("occupied")).unwrap();

        let result = write_report(&target, "content");

        assert!(matches!(result, Err(WriteError::Persist { .. })));
        assert_eq!(dir_entries(tmp.path()), vec!["report.md"]);
        assert!(target.join("occupied").is_dir());
    }
}
