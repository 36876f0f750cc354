//! Directory scanning with an extension allow-list.
//!
//! Recursion is controlled by [`ScanConfig::recursive`]: when false only
//! the direct children of the root are listed. Results are absolute paths
//! under the canonicalized root and are sorted by path unless
//! [`ScanConfig::sort`] is turned off, in which case walk order is kept.
//! Files whose path is not valid UTF-8 are skipped with a warning, since
//! manifests store paths as UTF-8 text.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::ScanConfig;

/// Errors that can occur while scanning a directory.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid file name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// A file found by [`scan_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Absolute path of the file, always valid UTF-8.
    pub absolute: PathBuf,
    /// Path relative to the scan root.
    pub relative: PathBuf,
}

impl ScanEntry {
    /// First component of the relative path when the file sits in a
    /// subdirectory (`cat/0001.jpg` gives `cat`).
    pub fn top_level_dir(&self) -> Option<&str> {
        let mut components = self.relative.components();
        let first = components.next()?;
        components.next()?;
        first.as_os_str().to_str()
    }
}

fn compile_pattern(config: &ScanConfig) -> Result<Option<Regex>> {
    config
        .pattern
        .as_deref()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ScanError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        })
        .transpose()
}

/// List files under `root` matching the scan configuration.
///
/// # Errors
///
/// Returns `DirectoryNotFound` if `root` is not an existing directory,
/// `InvalidPattern` for a bad regex, and `Walk` if an entry cannot be read.
pub fn scan_directory<P: AsRef<Path>>(root: P, config: &ScanConfig) -> Result<Vec<ScanEntry>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(ScanError::DirectoryNotFound(root.to_path_buf()));
    }
    let root = fs::canonicalize(root).map_err(|_| ScanError::DirectoryNotFound(root.to_path_buf()))?;
    let pattern = compile_pattern(config)?;

    let mut walker = WalkDir::new(&root).min_depth(1).follow_links(config.follow_links);
    if !config.recursive {
        walker = walker.max_depth(1);
    }

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !config.accepts_extension(path) {
            continue;
        }
        if path.to_str().is_none() {
            log::warn!("skipping non-UTF-8 path: {}", path.display());
            continue;
        }
        if let Some(regex) = &pattern {
            let name = entry.file_name().to_string_lossy();
            if !regex.is_match(&name) {
                continue;
            }
        }

        let relative = path.strip_prefix(&root).unwrap_or(path).to_path_buf();
        entries.push(ScanEntry {
            absolute: path.to_path_buf(),
            relative,
        });
    }

    if config.sort {
        entries.sort_by(|a, b| a.absolute.cmp(&b.absolute));
    }

    log::debug!("{}: {} matching files", root.display(), entries.len());

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap();
    }

    fn names(entries: &[ScanEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.relative.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_scan_filters_and_sorts() -> Result<()> {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.jpg");
        touch(dir.path(), "a.PNG");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "sub/c.jpeg");

        let entries = scan_directory(dir.path(), &ScanConfig::images())?;
        assert_eq!(names(&entries), vec!["a.PNG", "b.jpg", "sub/c.jpeg"]);
        assert!(entries.iter().all(|e| e.absolute.is_absolute()));

        Ok(())
    }

    #[test]
    fn test_scan_non_recursive() -> Result<()> {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "top.wav");
        touch(dir.path(), "nested/deep.wav");

        let config = ScanConfig {
            recursive: false,
            ..ScanConfig::audio()
        };
        let entries = scan_directory(dir.path(), &config)?;
        assert_eq!(names(&entries), vec!["top.wav"]);

        Ok(())
    }

    #[test]
    fn test_scan_empty_directory() -> Result<()> {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "readme.md");

        let entries = scan_directory(dir.path(), &ScanConfig::images())?;
        assert!(entries.is_empty());

        Ok(())
    }

    #[test]
    fn test_scan_unsorted_keeps_same_entries() -> Result<()> {
        let dir = TempDir::new().unwrap();
        for rel in ["z.jpg", "a.jpg", "m/b.png", "c/d.gif", "k.bmp"] {
            touch(dir.path(), rel);
        }

        let sorted = scan_directory(dir.path(), &ScanConfig::images())?;
        let config = ScanConfig {
            sort: false,
            ..ScanConfig::images()
        };
        let unsorted = scan_directory(dir.path(), &config)?;

        assert_eq!(unsorted.len(), sorted.len());
        let mut resorted = unsorted.clone();
        resorted.sort_by(|a, b| a.absolute.cmp(&b.absolute));
        assert_eq!(resorted, sorted);

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_follow_links() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        touch(&root, "own.jpg");
        touch(dir.path(), "elsewhere/linked.jpg");
        std::os::unix::fs::symlink(dir.path().join("elsewhere"), root.join("link")).unwrap();

        let entries = scan_directory(&root, &ScanConfig::images())?;
        assert_eq!(names(&entries), vec!["own.jpg"]);

        let config = ScanConfig {
            follow_links: true,
            ..ScanConfig::images()
        };
        let entries = scan_directory(&root, &config)?;
        assert_eq!(names(&entries), vec!["link/linked.jpg", "own.jpg"]);

        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_scan_skips_non_utf8_names() -> Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "good.jpg");
        File::create(dir.path().join(OsStr::from_bytes(b"bad\xff.jpg"))).unwrap();

        let entries = scan_directory(dir.path(), &ScanConfig::images())?;
        assert_eq!(names(&entries), vec!["good.jpg"]);

        Ok(())
    }

    #[test]
    fn test_scan_missing_directory() {
        let err = scan_directory("/no/such/dir", &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_scan_with_pattern() -> Result<()> {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "cat_0001.jpg");
        touch(dir.path(), "dog_0001.jpg");

        let config = ScanConfig {
            pattern: Some(r"^cat_\d+".to_string()),
            ..ScanConfig::images()
        };
        let entries = scan_directory(dir.path(), &config)?;
        assert_eq!(names(&entries), vec!["cat_0001.jpg"]);

        Ok(())
    }

    #[test]
    fn test_scan_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let config = ScanConfig {
            pattern: Some("(".to_string()),
            ..ScanConfig::images()
        };
        let err = scan_directory(dir.path(), &config).unwrap_err();
        assert!(matches!(err, ScanError::InvalidPattern { .. }));
    }

    #[test]
    fn test_top_level_dir() {
        let nested = ScanEntry {
            absolute: PathBuf::from("/d/cat/1.jpg"),
            relative: PathBuf::from("cat/1.jpg"),
        };
        let flat = ScanEntry {
            absolute: PathBuf::from("/d/1.jpg"),
            relative: PathBuf::from("1.jpg"),
        };
        assert_eq!(nested.top_level_dir(), Some("cat"));
        assert_eq!(flat.top_level_dir(), None);
    }
}
