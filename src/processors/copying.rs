//! Copy a class-per-directory dataset into one flat directory.
//!
//! Two naming schemes are supported: `<label>_<file name>`, and unique random
//! numbers (`<n>.<ext>`). Both write a manifest describing the copies, in
//! scan order. File copies run in parallel using rayon.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rayon::prelude::*;

use super::annotation::{label_for, ProcessError, Result};
use crate::config::{ManifestConfig, ScanConfig};
use crate::core::loaders::DatasetItem;
use crate::core::scanner::{scan_directory, ScanEntry};
use crate::core::writers::write_manifest;

/// Lower bound of the random name range.
const MIN_RANDOM_RANGE: usize = 10_000;

/// Work item for parallel copying.
#[derive(Clone)]
struct CopyTask {
    src: PathBuf,
    dest: PathBuf,
    name: String,
    label: String,
}

/// Name a copy `<label>_<file name>`, or just the file name when unlabelled.
fn labelled_name(entry: &ScanEntry) -> String {
    let file_name = entry
        .absolute
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match entry.top_level_dir() {
        Some(label) => format!("{}_{}", label, file_name),
        None => file_name,
    }
}

/// Draw `count` distinct numbers from `0..max(MIN_RANDOM_RANGE, 10 * count)`.
fn random_ids(count: usize, seed: Option<u64>) -> Vec<usize> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let upper = MIN_RANDOM_RANGE.max(count.saturating_mul(10));
    index::sample(&mut rng, upper, count).into_vec()
}

fn random_name(entry: &ScanEntry, id: usize) -> String {
    match entry.absolute.extension() {
        Some(ext) => format!("{}.{}", id, ext.to_string_lossy()),
        None => id.to_string(),
    }
}

fn create_dir(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).map_err(|e| ProcessError::CreateDirectory {
        path: path.display().to_string(),
        source: e,
    })?;
    fs::canonicalize(path).map_err(|e| ProcessError::CreateDirectory {
        path: path.display().to_string(),
        source: e,
    })
}

/// Copy `entries` into `dest_dir` under `names` and write the manifest.
fn copy_entries(
    entries: &[ScanEntry],
    names: Vec<String>,
    dest_dir: &Path,
    manifest_path: &Path,
    manifest: &ManifestConfig,
) -> Result<Vec<DatasetItem>> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(ProcessError::NameCollision(name.clone()));
        }
    }

    let dest_dir = create_dir(dest_dir)?;

    let tasks: Vec<CopyTask> = entries
        .iter()
        .zip(names)
        .map(|(entry, name)| CopyTask {
            src: entry.absolute.clone(),
            dest: dest_dir.join(&name),
            name,
            label: label_for(entry),
        })
        .collect();

    tasks
        .par_iter()
        .map(|task| {
            fs::copy(&task.src, &task.dest)
                .map(|_| ())
                .map_err(|e| ProcessError::Copy {
                    from: task.src.display().to_string(),
                    to: task.dest.display().to_string(),
                    source: e,
                })
        })
        .collect::<Result<Vec<()>>>()?;

    let items: Vec<DatasetItem> = tasks
        .into_iter()
        .map(|task| DatasetItem::with_label(task.dest.to_string_lossy(), task.name, task.label))
        .collect();

    write_manifest(manifest_path, &items, manifest)?;

    log::info!(
        "Copied {} files -> {} (manifest {})",
        items.len(),
        dest_dir.display(),
        manifest_path.display()
    );

    Ok(items)
}

/// Copy a dataset into a flat directory, naming files `<label>_<file name>`.
///
/// # Arguments
///
/// * `source_root` - Dataset root laid out as `root/<label>/<file>`
/// * `dest_dir` - Flat output directory (created if needed)
/// * `manifest_path` - Manifest describing the copies
/// * `scan` - Which files to include
/// * `manifest` - Output delimiter
///
/// # Errors
///
/// Fails if two files map to the same name, before anything is copied.
pub fn copy_dataset(
    source_root: &Path,
    dest_dir: &Path,
    manifest_path: &Path,
    scan: &ScanConfig,
    manifest: &ManifestConfig,
) -> Result<Vec<DatasetItem>> {
    let entries = scan_directory(source_root, scan)?;
    let names = entries.iter().map(labelled_name).collect();
    copy_entries(&entries, names, dest_dir, manifest_path, manifest)
}

/// Copy a dataset into a flat directory under unique random numeric names.
///
/// The label column keeps the original class. A `seed` makes the names
/// reproducible.
pub fn copy_dataset_randomized(
    source_root: &Path,
    dest_dir: &Path,
    manifest_path: &Path,
    scan: &ScanConfig,
    manifest: &ManifestConfig,
    seed: Option<u64>,
) -> Result<Vec<DatasetItem>> {
    let entries = scan_directory(source_root, scan)?;
    let names = entries
        .iter()
        .zip(random_ids(entries.len(), seed))
        .map(|(entry, id)| random_name(entry, id))
        .collect();
    copy_entries(&entries, names, dest_dir, manifest_path, manifest)
}
