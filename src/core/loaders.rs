//! Manifest loading and the dataset item type.
//!
//! A manifest ("annotation file") is a delimited text file with a header row
//! and one row per dataset item:
//!
//! ```text
//! absolute_path,relative_path,label
//! /data/cat/0001.jpg,cat/0001.jpg,cat
//! ```
//!
//! Only `absolute_path` is mandatory. Extra columns are kept on the item in
//! header order.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::ReaderBuilder;
use thiserror::Error;

use crate::config::ManifestConfig;

/// Column holding the absolute path of an item.
pub const ABSOLUTE_PATH: &str = "absolute_path";

/// Column holding the path relative to the dataset root.
pub const RELATIVE_PATH: &str = "relative_path";

/// Column holding the category label.
pub const LABEL: &str = "label";

/// Column names accepted as the category label, in lookup order.
const LABEL_ALIASES: &[&str] = &[LABEL, "class", "category"];

/// Errors that can occur while loading a manifest.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("malformed manifest '{}' at line {line}: {reason}", .path.display())]
    MalformedManifest {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Normalize a header cell: `" Absolute Path"` becomes `"absolute_path"`.
pub fn normalize_column(name: &str) -> String {
    name.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// One enumerated unit of a dataset.
///
/// An item is an ordered list of named string fields sharing a header with
/// the other items of the same manifest. The `absolute_path` field is always
/// present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetItem {
    header: Arc<[String]>,
    values: Vec<String>,
    path_idx: usize,
}

impl DatasetItem {
    /// Creates an item with the canonical `absolute_path,relative_path` header.
    pub fn new(absolute_path: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            header: Arc::from(vec![ABSOLUTE_PATH.to_string(), RELATIVE_PATH.to_string()]),
            values: vec![absolute_path.into(), relative_path.into()],
            path_idx: 0,
        }
    }

    /// Creates an item with an additional `label` column.
    pub fn with_label(
        absolute_path: impl Into<String>,
        relative_path: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            header: Arc::from(vec![
                ABSOLUTE_PATH.to_string(),
                RELATIVE_PATH.to_string(),
                LABEL.to_string(),
            ]),
            values: vec![absolute_path.into(), relative_path.into(), label.into()],
            path_idx: 0,
        }
    }

    /// Builds an item from arbitrary columns.
    ///
    /// Returns `None` if the lengths differ, or if there is no non-empty
    /// `absolute_path` column.
    pub fn from_record<H, V>(header: &[H], values: Vec<V>) -> Option<Self>
    where
        H: AsRef<str>,
        V: Into<String>,
    {
        if header.len() != values.len() {
            return None;
        }
        let header: Arc<[String]> = header.iter().map(|h| normalize_column(h.as_ref())).collect();
        let path_idx = header.iter().position(|h| h == ABSOLUTE_PATH)?;
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values[path_idx].is_empty() {
            return None;
        }
        Some(Self {
            header,
            values,
            path_idx,
        })
    }

    /// The mandatory absolute path.
    #[inline]
    pub fn absolute_path(&self) -> &str {
        &self.values[self.path_idx]
    }

    /// The absolute path as a `Path`.
    #[inline]
    pub fn path(&self) -> &Path {
        Path::new(self.absolute_path())
    }

    pub fn relative_path(&self) -> Option<&str> {
        self.get(RELATIVE_PATH)
    }

    /// The category label, looked up under `label`, `class` or `category`.
    pub fn label(&self) -> Option<&str> {
        LABEL_ALIASES.iter().find_map(|name| self.get(name))
    }

    /// Looks up a field by column name (normalized before comparison).
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = normalize_column(name);
        self.header
            .iter()
            .position(|h| *h == name)
            .map(|idx| self.values[idx].as_str())
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Iterates `(column, value)` pairs in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }

    /// Returns true if both items carry the same column names.
    pub fn same_header(&self, other: &DatasetItem) -> bool {
        Arc::ptr_eq(&self.header, &other.header) || self.header == other.header
    }
}

/// Load all items from a manifest file.
///
/// The whole file is read before returning; no handle is kept open.
///
/// # Errors
///
/// - `ResourceNotFound` if the file does not exist, or if `verify_exists`
///   is set and an item path is missing.
/// - `MalformedManifest` if the header is missing, has no `absolute_path`
///   column, or (in strict mode) a row is ragged or has an empty path.
pub fn read_manifest<P: AsRef<Path>>(path: P, config: &ManifestConfig) -> Result<Vec<DatasetItem>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoaderError::ResourceNotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoaderError::ResourceNotFound(path.to_path_buf()),
        _ => LoaderError::Io(e),
    })?;

    parse_manifest(BufReader::new(file), path, config)
}

/// Report csv decoding failures (bad UTF-8, ragged records) as malformed
/// manifest errors; other csv errors pass through unchanged.
fn classify_csv_error(err: csv::Error, path: &Path) -> LoaderError {
    let line_of = |pos: &Option<csv::Position>| pos.as_ref().map_or(0, |p| p.line());
    let malformed = match err.kind() {
        csv::ErrorKind::Utf8 { pos, err: utf8 } => Some((line_of(pos), format!("invalid UTF-8: {}", utf8))),
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => Some((
            line_of(pos),
            format!("expected {} fields, found {}", expected_len, len),
        )),
        _ => None,
    };

    match malformed {
        Some((line, reason)) => LoaderError::MalformedManifest {
            path: path.to_path_buf(),
            line,
            reason,
        },
        None => LoaderError::Csv(err),
    }
}

/// Parse manifest content from any reader.
///
/// `path` is only used to label errors.
pub fn parse_manifest<R: Read>(
    source: R,
    path: &Path,
    config: &ManifestConfig,
) -> Result<Vec<DatasetItem>> {
    let malformed = |line: u64, reason: String| LoaderError::MalformedManifest {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter_byte())
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let raw_headers = reader
        .headers()
        .map_err(|e| classify_csv_error(e, path))?
        .clone();
    if raw_headers.iter().all(|h| h.trim().is_empty()) {
        return Err(malformed(1, "missing header row".to_string()));
    }

    let header: Arc<[String]> = raw_headers.iter().map(normalize_column).collect();
    let path_idx = header
        .iter()
        .position(|h| h == ABSOLUTE_PATH)
        .ok_or_else(|| malformed(1, format!("no '{}' column in header", ABSOLUTE_PATH)))?;

    let mut items = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result.map_err(|e| classify_csv_error(e, path))?;
        let line = record.position().map_or(0, |p| p.line());

        if record.len() != header.len() {
            let reason = format!("expected {} fields, found {}", header.len(), record.len());
            if config.strict {
                return Err(malformed(line, reason));
            }
            log::warn!("{}: skipping line {}: {}", path.display(), line, reason);
            skipped += 1;
            continue;
        }

        let absolute = record.get(path_idx).unwrap_or_default();
        if absolute.trim().is_empty() {
            let reason = format!("empty '{}' field", ABSOLUTE_PATH);
            if config.strict {
                return Err(malformed(line, reason));
            }
            log::warn!("{}: skipping line {}: {}", path.display(), line, reason);
            skipped += 1;
            continue;
        }

        if config.verify_exists && !Path::new(absolute).exists() {
            return Err(LoaderError::ResourceNotFound(PathBuf::from(absolute)));
        }

        items.push(DatasetItem {
            header: Arc::clone(&header),
            values: record.iter().map(str::to_string).collect(),
            path_idx,
        });
    }

    log::debug!(
        "{}: loaded {} items ({} skipped)",
        path.display(),
        items.len(),
        skipped
    );

    Ok(items)
}
