//! Core data types and I/O: manifest reader, directory scanner, manifest writer.

pub mod loaders;
pub mod scanner;
pub mod writers;

pub use loaders::{read_manifest, DatasetItem, LoaderError};
pub use scanner::{scan_directory, ScanEntry, ScanError};
pub use writers::{write_manifest, WriteError};
