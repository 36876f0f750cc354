//! Configuration types for dataset manifests and directory scans.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extensions accepted by [`ScanConfig::images`].
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// Extensions accepted by [`ScanConfig::audio`].
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac", "aac"];

/// Configuration for reading and writing manifest files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Field delimiter (single ASCII character, usually ',' or ';')
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Reject ragged rows instead of skipping them
    #[serde(default = "default_strict")]
    pub strict: bool,

    /// Check that every absolute_path still exists when loading
    #[serde(default)]
    pub verify_exists: bool,
}

fn default_delimiter() -> char {
    ','
}

fn default_strict() -> bool {
    true
}

impl ManifestConfig {
    /// Delimiter as the byte the csv crate expects.
    ///
    /// Non-ASCII delimiters cannot be represented by the csv reader and
    /// fall back to ','.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            strict: default_strict(),
            verify_exists: false,
        }
    }
}

/// Configuration for directory scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Allowed file extensions, case-insensitive, leading dot optional.
    /// An empty list accepts every file.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Descend into subdirectories
    #[serde(default = "default_recursive")]
    pub recursive: bool,

    /// Sort results by path (otherwise walk order)
    #[serde(default = "default_sort")]
    pub sort: bool,

    /// Follow symbolic links while walking
    #[serde(default)]
    pub follow_links: bool,

    /// Optional regex matched against each file name
    #[serde(default)]
    pub pattern: Option<String>,
}

fn default_extensions() -> Vec<String> {
    IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_recursive() -> bool {
    true
}

fn default_sort() -> bool {
    true
}

impl ScanConfig {
    /// Scan configuration for image datasets.
    pub fn images() -> Self {
        Self::default()
    }

    /// Scan configuration for audio datasets.
    pub fn audio() -> Self {
        Self::with_extensions(AUDIO_EXTENSIONS)
    }

    /// Scan configuration with a custom allow-list.
    pub fn with_extensions<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    /// Returns true if `path` carries one of the allowed extensions.
    pub fn accepts_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext,
            None => return false,
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            recursive: default_recursive(),
            sort: default_sort(),
            follow_links: false,
            pattern: None,
        }
    }
}

/// Serialized form of a dataset source: exactly one field must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSpec {
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Main configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    /// Log construction failures and yield an empty iterator instead of failing
    #[serde(default)]
    pub empty_on_error: bool,

    /// Default source used by the CLI when no flag is given
    #[serde(default)]
    pub source: Option<SourceSpec>,
}

impl DatasetConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: DatasetConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_dataset_config() {
        let config = DatasetConfig::default();
        assert_eq!(config.manifest.delimiter, ',');
        assert!(config.manifest.strict);
        assert!(!config.manifest.verify_exists);
        assert!(config.scan.recursive);
        assert!(config.scan.sort);
        assert!(!config.empty_on_error);
    }

    #[test]
    fn test_accepts_extension_case_insensitive() {
        let config = ScanConfig::with_extensions(&[".JPG", "png"]);
        assert!(config.accepts_extension(Path::new("a/b.jpg")));
        assert!(config.accepts_extension(Path::new("a/b.PNG")));
        assert!(!config.accepts_extension(Path::new("a/b.gif")));
        assert!(!config.accepts_extension(Path::new("a/noext")));
    }

    #[test]
    fn test_empty_allow_list_accepts_everything() {
        let config = ScanConfig::with_extensions::<&str>(&[]);
        assert!(config.accepts_extension(Path::new("x.anything")));
        assert!(config.accepts_extension(Path::new("noext")));
    }

    #[test]
    fn test_audio_preset() {
        let config = ScanConfig::audio();
        assert!(config.accepts_extension(Path::new("song.Mp3")));
        assert!(!config.accepts_extension(Path::new("cat.jpg")));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "manifest:\n  delimiter: ';'\nscan:\n  recursive: false\n";
        let config: DatasetConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.manifest.delimiter_byte(), b';');
        assert!(config.manifest.strict);
        assert!(!config.scan.recursive);
        assert_eq!(config.scan.extensions, default_extensions());
    }

    #[test]
    fn test_yaml_roundtrip_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dataset.yaml");
        let mut config = DatasetConfig::default();
        config.empty_on_error = true;
        config.scan = ScanConfig::audio();

        config.to_yaml(&path).unwrap();
        let loaded = DatasetConfig::from_yaml(&path).unwrap();

        assert!(loaded.empty_on_error);
        assert_eq!(loaded.scan.extensions, config.scan.extensions);
    }
}
