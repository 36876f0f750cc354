//! Dataset processing: annotation manifests and flat copies.

pub mod annotation;
pub mod copying;

// Re-export key types for convenience
pub use annotation::{annotate_directory, label_for, labelled_items, ProcessError};
pub use copying::{copy_dataset, copy_dataset_randomized};
