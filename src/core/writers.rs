//! Manifest writer.
//!
//! Writes dataset items back to the delimited format read by
//! [`read_manifest`](super::loaders::read_manifest).

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use super::loaders::{DatasetItem, ABSOLUTE_PATH, RELATIVE_PATH};
use crate::config::ManifestConfig;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to flush data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// An item does not share the header of the first item.
    #[error("item {index} has columns {found:?}, expected {expected:?}")]
    HeaderMismatch {
        index: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// An item has an empty `absolute_path`, which the reader rejects.
    #[error("item {index} has an empty absolute_path")]
    EmptyPath { index: usize },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Write items to a manifest file.
///
/// The header is taken from the first item; an empty slice produces a
/// header-only `absolute_path,relative_path` manifest. Every item must carry
/// the same columns as the first one.
///
/// # Errors
///
/// Returns an error if:
/// - Items have different headers or an empty `absolute_path` (checked
///   before anything is written)
/// - Parent directories cannot be created
/// - File cannot be created or written to
///
/// # Example
///
/// ```no_run
/// use dataset_iter::config::ManifestConfig;
/// use dataset_iter::core::loaders::DatasetItem;
/// use dataset_iter::core::writers::write_manifest;
/// use std::path::Path;
///
/// let items = vec![DatasetItem::new("/data/a.jpg", "a.jpg")];
/// write_manifest(Path::new("annotation.csv"), &items, &ManifestConfig::default()).unwrap();
/// ```
pub fn write_manifest(path: &Path, items: &[DatasetItem], config: &ManifestConfig) -> Result<()> {
    let header: Vec<String> = match items.first() {
        Some(first) => first.header().to_vec(),
        None => vec![ABSOLUTE_PATH.to_string(), RELATIVE_PATH.to_string()],
    };

    if let Some(first) = items.first() {
        if let Some((index, item)) = items.iter().enumerate().find(|(_, item)| !item.same_header(first)) {
            return Err(WriteError::HeaderMismatch {
                index,
                expected: header,
                found: item.header().to_vec(),
            });
        }
    }

    if let Some(index) = items.iter().position(|item| item.absolute_path().trim().is_empty()) {
        return Err(WriteError::EmptyPath { index });
    }

    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter_byte())
        .from_writer(BufWriter::new(file));

    let path_str = path.display().to_string();

    csv_writer
        .write_record(&header)
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for item in items {
        csv_writer
            .write_record(item.values())
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    log::debug!("{}: wrote {} items", path.display(), items.len());

    Ok(())
}
