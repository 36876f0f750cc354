//! Dataset manifests and path iterators for image and audio datasets.
//!
//! This crate provides tools for:
//! - Reading and writing CSV "annotation" manifests of dataset files
//! - Scanning directories for files with an extension allow-list
//! - Iterating a dataset from either source behind one cursor API
//! - Annotating and flattening class-per-directory datasets
//!
//! # Example
//!
//! ```no_run
//! use dataset_iter::{DatasetConfig, DatasetIterator, SourceDescriptor};
//!
//! let source = SourceDescriptor::Directory("images".into());
//! let iter = DatasetIterator::open(&source, &DatasetConfig::default()).unwrap();
//! for item in iter {
//!     println!("{}", item.absolute_path());
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod iterator;
pub mod processors;

pub use config::{DatasetConfig, ManifestConfig, ScanConfig, SourceSpec};
pub use crate::core::loaders::DatasetItem;
pub use iterator::{DatasetIterator, IteratorError, SourceDescriptor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
