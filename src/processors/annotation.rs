//! Annotation manifests for class-per-directory datasets.

use std::path::Path;

use thiserror::Error;

use crate::config::{ManifestConfig, ScanConfig};
use crate::core::loaders::DatasetItem;
use crate::core::scanner::{scan_directory, ScanEntry, ScanError};
use crate::core::writers::{write_manifest, WriteError};

/// Errors that can occur while building or copying datasets.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} -> {to}: {source}")]
    Copy {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Two source files map to the same destination name: {0}")]
    NameCollision(String),
}

/// Result type for processor operations.
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Label of a scanned file: its top-level directory under the root, or an
/// empty string for files directly in the root.
pub fn label_for(entry: &ScanEntry) -> String {
    entry.top_level_dir().unwrap_or_default().to_string()
}

/// Scan `root` and turn every matching file into a labelled item.
pub fn labelled_items(root: &Path, scan: &ScanConfig) -> Result<Vec<DatasetItem>> {
    let entries = scan_directory(root, scan)?;
    Ok(entries
        .iter()
        .map(|entry| {
            DatasetItem::with_label(
                entry.absolute.to_string_lossy(),
                entry.relative.to_string_lossy(),
                label_for(entry),
            )
        })
        .collect())
}

/// Write an annotation manifest for a dataset laid out as `root/<label>/<file>`.
///
/// The manifest has the columns `absolute_path,relative_path,label`.
///
/// # Arguments
///
/// * `root` - Dataset root directory
/// * `manifest_path` - Output manifest (parent directories are created)
/// * `scan` - Which files to include
/// * `manifest` - Output delimiter
///
/// # Returns
///
/// The items written, in manifest order.
pub fn annotate_directory(
    root: &Path,
    manifest_path: &Path,
    scan: &ScanConfig,
    manifest: &ManifestConfig,
) -> Result<Vec<DatasetItem>> {
    let items = labelled_items(root, scan)?;
    write_manifest(manifest_path, &items, manifest)?;

    log::info!(
        "{}: annotated {} files -> {}",
        root.display(),
        items.len(),
        manifest_path.display()
    );

    Ok(items)
}
