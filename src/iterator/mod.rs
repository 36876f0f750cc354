//! Forward iteration over a dataset described by a manifest or a directory.
//!
//! A [`DatasetIterator`] is built from exactly one [`SourceDescriptor`]. The
//! whole item list is materialized at construction; afterwards the iterator
//! only moves a cursor over that immutable snapshot.
//!
//! # Example
//!
//! ```no_run
//! use dataset_iter::config::DatasetConfig;
//! use dataset_iter::iterator::{DatasetIterator, SourceDescriptor};
//!
//! let source = SourceDescriptor::Manifest("annotation.csv".into());
//! let mut iter = DatasetIterator::open(&source, &DatasetConfig::default()).unwrap();
//! while iter.has_next() {
//!     let item = iter.next_item().unwrap();
//!     println!("{}", item.absolute_path());
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{DatasetConfig, ManifestConfig, ScanConfig, SourceSpec};
use crate::core::loaders::{self, DatasetItem, LoaderError};
use crate::core::scanner::{self, ScanError};

/// Errors raised by dataset iterators.
#[derive(Debug, Error)]
pub enum IteratorError {
    #[error("invalid source descriptor: {0}")]
    InvalidSourceDescriptor(String),

    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("malformed manifest '{}' at line {line}: {reason}", .path.display())]
    MalformedManifest {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("end of sequence")]
    EndOfSequence,

    #[error("no previous element")]
    NoPreviousElement,

    #[error("no current element: nothing has been fetched since construction or reset")]
    NoCurrentElement,

    #[error(transparent)]
    Load(LoaderError),

    #[error(transparent)]
    Scan(ScanError),
}

impl From<LoaderError> for IteratorError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::ResourceNotFound(path) => Self::ResourceNotFound(path),
            LoaderError::MalformedManifest { path, line, reason } => {
                Self::MalformedManifest { path, line, reason }
            }
            other => Self::Load(other),
        }
    }
}

impl From<ScanError> for IteratorError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::DirectoryNotFound(path) => Self::ResourceNotFound(path),
            other => Self::Scan(other),
        }
    }
}

/// Result type for iterator operations.
pub type Result<T> = std::result::Result<T, IteratorError>;

/// Where a dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// A manifest file with a header row and one row per item.
    Manifest(PathBuf),
    /// A directory scanned for files with allowed extensions.
    Directory(PathBuf),
}

impl SourceDescriptor {
    /// Build a descriptor from two optional paths, exactly one of which must
    /// be set. No file system access happens here.
    pub fn from_parts(manifest: Option<PathBuf>, directory: Option<PathBuf>) -> Result<Self> {
        match (manifest, directory) {
            (Some(path), None) => Ok(Self::Manifest(path)),
            (None, Some(path)) => Ok(Self::Directory(path)),
            (Some(_), Some(_)) => Err(IteratorError::InvalidSourceDescriptor(
                "both a manifest and a directory were given".to_string(),
            )),
            (None, None) => Err(IteratorError::InvalidSourceDescriptor(
                "neither a manifest nor a directory was given".to_string(),
            )),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Manifest(path) | Self::Directory(path) => path,
        }
    }
}

impl TryFrom<SourceSpec> for SourceDescriptor {
    type Error = IteratorError;

    fn try_from(spec: SourceSpec) -> Result<Self> {
        Self::from_parts(spec.manifest, spec.directory)
    }
}

/// A loader that materializes the full item list of a dataset.
pub trait ItemSource {
    /// Human-readable description used in log messages.
    fn describe(&self) -> String;

    /// Load every item, in iteration order.
    fn load(&self) -> Result<Vec<DatasetItem>>;
}

/// Items listed in a manifest file, in row order.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    path: PathBuf,
    config: ManifestConfig,
}

impl ManifestSource {
    pub fn new(path: impl Into<PathBuf>, config: ManifestConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }
}

impl ItemSource for ManifestSource {
    fn describe(&self) -> String {
        format!("manifest {}", self.path.display())
    }

    fn load(&self) -> Result<Vec<DatasetItem>> {
        Ok(loaders::read_manifest(&self.path, &self.config)?)
    }
}

/// Files found by scanning a directory.
///
/// Items carry `absolute_path` and `relative_path` (relative to the root).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    config: ScanConfig,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }
}

impl ItemSource for DirectorySource {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn load(&self) -> Result<Vec<DatasetItem>> {
        let entries = scanner::scan_directory(&self.root, &self.config)?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                DatasetItem::new(
                    entry.absolute.to_string_lossy(),
                    entry.relative.to_string_lossy(),
                )
            })
            .collect())
    }
}

/// Cursor-based iterator over a materialized list of dataset items.
///
/// `cursor` is the index of the next item `next_item` will return. Both
/// `next_item` and `previous` follow read-at-cursor semantics:
/// `next_item` reads `items[cursor]` then increments, `previous` decrements
/// then reads `items[cursor]`. Calling `previous` right after `next_item`
/// therefore returns the same item again.
#[derive(Debug, Clone, Default)]
pub struct DatasetIterator {
    items: Vec<DatasetItem>,
    cursor: usize,
    last: Option<usize>,
}

impl DatasetIterator {
    /// Construct from a source descriptor, loading everything up front.
    ///
    /// With `config.empty_on_error` set, load failures are logged and an
    /// empty iterator is returned instead.
    pub fn open(source: &SourceDescriptor, config: &DatasetConfig) -> Result<Self> {
        let result = match source {
            SourceDescriptor::Manifest(path) => {
                Self::from_source(&ManifestSource::new(path, config.manifest.clone()))
            }
            SourceDescriptor::Directory(path) => {
                Self::from_source(&DirectorySource::new(path, config.scan.clone()))
            }
        };

        match result {
            Err(e) if config.empty_on_error => {
                log::error!("{}: {}; continuing with an empty dataset", source.path().display(), e);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Construct from separately supplied manifest/directory paths.
    ///
    /// The descriptor check runs before any I/O, so misuse is reported as
    /// `InvalidSourceDescriptor` even when the paths do not exist.
    pub fn open_parts(
        manifest: Option<PathBuf>,
        directory: Option<PathBuf>,
        config: &DatasetConfig,
    ) -> Result<Self> {
        let source = SourceDescriptor::from_parts(manifest, directory)?;
        Self::open(&source, config)
    }

    /// Construct from any item source.
    pub fn from_source(source: &dyn ItemSource) -> Result<Self> {
        let items = source.load()?;
        log::debug!("{}: {} items", source.describe(), items.len());
        Ok(Self::from_items(items))
    }

    pub fn from_items(items: Vec<DatasetItem>) -> Self {
        Self {
            items,
            cursor: 0,
            last: None,
        }
    }

    /// Returns true if `next_item` would succeed.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.cursor < self.items.len()
    }

    /// Return the item at the cursor and advance.
    pub fn next_item(&mut self) -> Result<&DatasetItem> {
        if !self.has_next() {
            return Err(IteratorError::EndOfSequence);
        }
        let idx = self.cursor;
        self.cursor += 1;
        self.last = Some(idx);
        Ok(&self.items[idx])
    }

    /// Step the cursor back by one and return the item there.
    pub fn previous(&mut self) -> Result<&DatasetItem> {
        if self.cursor == 0 {
            return Err(IteratorError::NoPreviousElement);
        }
        self.cursor -= 1;
        self.last = Some(self.cursor);
        Ok(&self.items[self.cursor])
    }

    /// The item most recently returned by `next_item` or `previous`.
    pub fn current(&self) -> Result<&DatasetItem> {
        self.last
            .and_then(|idx| self.items.get(idx))
            .ok_or(IteratorError::NoCurrentElement)
    }

    /// Rewind to the first item.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.last = None;
    }

    /// Total number of items; constant for the iterator's lifetime.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the next item to be returned.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    pub fn items(&self) -> &[DatasetItem] {
        &self.items
    }

    /// A fresh iterator over the items carrying `label`.
    pub fn with_label(&self, label: &str) -> DatasetIterator {
        Self::from_items(
            self.items
                .iter()
                .filter(|item| item.label() == Some(label))
                .cloned()
                .collect(),
        )
    }
}

impl Iterator for DatasetIterator {
    type Item = DatasetItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().ok().cloned()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DatasetIterator {}
