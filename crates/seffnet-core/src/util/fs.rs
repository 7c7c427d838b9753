//! File helpers for inputs and outputs.
//!
//! Outputs (edge lists, JSON reports) are written through
//! [`write_all_or_nothing`], which stages content in a sibling file and only
//! renames it into place once the writer closure has succeeded.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Fail with [`Error::MissingInputFile`] unless `path` exists.
///
/// # Examples
///
/// ```
/// use seffnet_core::util::fs::require_file;
///
/// let err = require_file("mapping", "/definitely/not/here.tsv").unwrap_err();
/// assert!(err.to_string().contains("mapping"));
/// ```
pub fn require_file(kind: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        Ok(())
    } else {
        Err(Error::missing_input(kind, path))
    }
}

/// Write `path` through `write`, leaving any previous file untouched on failure.
pub fn write_all_or_nothing<F>(path: impl AsRef<Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
        }
    }

    let staging = staging_path(path);
    let file = File::create(&staging).map_err(|e| Error::io_with_path(e, &staging))?;
    let mut writer = BufWriter::new(file);

    let written = write(&mut writer).and_then(|()| writer.flush());
    drop(writer);

    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_file(&staging) {
            log::warn!(
                "Could not remove staging file {}: {cleanup}",
                staging.display()
            );
        }
        return Err(Error::io_with_path(e, path));
    }

    std::fs::rename(&staging, path).map_err(|e| Error::io_with_path(e, path))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Name of the invoking user, as recorded in evaluation reports.
pub fn current_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_require_file_present() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("present.tsv");
        std::fs::write(&path, "x").unwrap();
        assert!(require_file("cluster", &path).is_ok());
    }

    #[test]
    fn test_require_file_absent() {
        let dir = TempDir::new().unwrap();
        let err = require_file("cluster", dir.path().join("absent.tsv")).unwrap_err();
        assert!(matches!(err, Error::MissingInputFile { .. }));
    }

    #[test]
    fn test_write_all_or_nothing_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        write_all_or_nothing(&path, |w| writeln!(w, "a b")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a b\n");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_write_all_or_nothing_keeps_previous_on_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old").unwrap();

        let result = write_all_or_nothing(&path, |w| {
            writeln!(w, "half")?;
            Err(std::io::Error::other("boom"))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_write_error_survives_failed_cleanup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let staging = staging_path(&path);

        // The writer removes its own staging file, so the cleanup fails.
        let err = write_all_or_nothing(&path, |_| {
            std::fs::remove_file(&staging)?;
            Err(std::io::Error::other("boom"))
        })
        .unwrap_err();

        match err {
            Error::Io { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!path.exists());
        assert!(!staging.exists());
    }

    #[test]
    fn test_current_user_not_empty() {
        assert!(!current_user().is_empty());
    }
}
