//! Command-line interface for dataset manifests.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{DatasetConfig, ScanConfig};
use crate::iterator::{DatasetIterator, SourceDescriptor};

#[derive(Parser)]
#[command(name = "dataset-iter")]
#[command(about = "Dataset annotation manifests and path iteration", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Manifest delimiter (overrides config)
    #[arg(short, long, global = true)]
    delimiter: Option<char>,

    /// Allowed file extensions for directory scans (overrides config)
    #[arg(short, long, global = true, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Only scan the top level of directories
    #[arg(long, global = true)]
    flat: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an annotation manifest for a root/<label>/<file> dataset
    Annotate {
        /// Dataset root directory
        directory: PathBuf,
        /// Output manifest path
        manifest: PathBuf,
    },

    /// Print dataset items from a manifest or a directory
    List {
        /// Read items from this manifest
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Scan this directory for items
        #[arg(short = 'D', long)]
        directory: Option<PathBuf>,
        /// Only items with this label
        #[arg(short, long)]
        label: Option<String>,
        /// Stop after this many items
        #[arg(long)]
        limit: Option<usize>,
        /// Skip ragged manifest rows instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Count dataset items, per label when labels are present
    Count {
        /// Read items from this manifest
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Scan this directory for items
        #[arg(short = 'D', long)]
        directory: Option<PathBuf>,
    },

    /// Copy a dataset into one flat directory and write its manifest
    Copy {
        /// Dataset root directory
        source: PathBuf,
        /// Flat output directory
        dest: PathBuf,
        /// Output manifest path (defaults to <dest>.csv)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Use random numeric file names
        #[arg(long)]
        random: bool,
        /// Seed for random names
        #[arg(long, requires = "random")]
        seed: Option<u64>,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            let head: String = value.chars().take(36).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Apply global CLI overrides on top of the loaded config.
fn apply_overrides(cli: &Cli, config: &mut DatasetConfig) {
    if let Some(delimiter) = cli.delimiter {
        config.manifest.delimiter = delimiter;
    }
    if let Some(extensions) = &cli.extensions {
        config.scan = ScanConfig {
            extensions: extensions.clone(),
            ..config.scan.clone()
        };
    }
    if cli.flat {
        config.scan.recursive = false;
    }
}

/// Resolve the dataset source from flags, falling back to the config file.
fn resolve_source(
    manifest: Option<PathBuf>,
    directory: Option<PathBuf>,
    config: &DatasetConfig,
) -> Result<SourceDescriptor> {
    let source = match (&manifest, &directory, &config.source) {
        (None, None, Some(spec)) => SourceDescriptor::try_from(spec.clone()),
        _ => SourceDescriptor::from_parts(manifest, directory),
    };
    source.context("pass exactly one of --manifest or --directory")
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let mut config = match &cli.config {
        Some(path) => match DatasetConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                DatasetConfig::default()
            }
        },
        None => DatasetConfig::default(),
    };
    apply_overrides(&cli, &mut config);

    let result = match cli.command {
        Commands::Annotate { directory, manifest } => cmd_annotate(&directory, &manifest, &config),
        Commands::List { manifest, directory, label, limit, lenient } => {
            if lenient {
                config.manifest.strict = false;
            }
            cmd_list(manifest, directory, label, limit, &config)
        }
        Commands::Count { manifest, directory } => cmd_count(manifest, directory, &config),
        Commands::Copy { source, dest, manifest, random, seed } => {
            cmd_copy(&source, &dest, manifest, random, seed, &config)
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn cmd_annotate(directory: &Path, manifest: &Path, config: &DatasetConfig) -> Result<()> {
    use crate::processors::annotation;

    let start = Instant::now();
    let spinner = create_spinner("Scanning dataset directory...");

    let result = annotation::annotate_directory(directory, manifest, &config.scan, &config.manifest);
    spinner.finish_and_clear();
    let items = result.with_context(|| format!("annotating {}", directory.display()))?;

    print_summary(
        "Annotation Complete",
        &[
            ("Directory", directory.display().to_string()),
            ("Manifest", manifest.display().to_string()),
            ("Files", items.len().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

fn cmd_list(
    manifest: Option<PathBuf>,
    directory: Option<PathBuf>,
    label: Option<String>,
    limit: Option<usize>,
    config: &DatasetConfig,
) -> Result<()> {
    let source = resolve_source(manifest, directory, config)?;
    let mut iter = DatasetIterator::open(&source, config)
        .with_context(|| format!("loading {}", source.path().display()))?;
    if let Some(label) = &label {
        iter = iter.with_label(label);
    }

    for item in iter.take(limit.unwrap_or(usize::MAX)) {
        println!("{}", item.absolute_path());
    }
    Ok(())
}

fn cmd_count(manifest: Option<PathBuf>, directory: Option<PathBuf>, config: &DatasetConfig) -> Result<()> {
    let start = Instant::now();
    let source = resolve_source(manifest, directory, config)?;
    let iter = DatasetIterator::open(&source, config)
        .with_context(|| format!("loading {}", source.path().display()))?;

    let mut per_label: BTreeMap<String, usize> = BTreeMap::new();
    for item in iter.items() {
        if let Some(label) = item.label() {
            *per_label.entry(label.to_string()).or_insert(0) += 1;
        }
    }

    let label_rows: Vec<(String, String)> = per_label
        .iter()
        .map(|(label, count)| {
            let name = if label.is_empty() { "<none>" } else { label.as_str() };
            (format!("  {}", name), count.to_string())
        })
        .collect();
    let mut rows = vec![
        ("Source", source.path().display().to_string()),
        ("Items", iter.len().to_string()),
    ];
    rows.extend(label_rows.iter().map(|(k, v)| (k.as_str(), v.clone())));
    rows.push(("Duration", format!("{:.2?}", start.elapsed())));

    print_summary("Dataset Count", &rows);
    Ok(())
}

fn cmd_copy(
    source: &Path,
    dest: &Path,
    manifest: Option<PathBuf>,
    random: bool,
    seed: Option<u64>,
    config: &DatasetConfig,
) -> Result<()> {
    use crate::processors::copying;

    let start = Instant::now();
    let manifest = manifest.unwrap_or_else(|| dest.with_extension("csv"));

    let spinner = create_spinner("Copying dataset files...");
    let result = if random {
        copying::copy_dataset_randomized(source, dest, &manifest, &config.scan, &config.manifest, seed)
    } else {
        copying::copy_dataset(source, dest, &manifest, &config.scan, &config.manifest)
    };
    spinner.finish_and_clear();
    let items = result.with_context(|| format!("copying {}", source.display()))?;

    print_summary(
        "Copy Complete",
        &[
            ("Source", source.display().to_string()),
            ("Destination", dest.display().to_string()),
            ("Manifest", manifest.display().to_string()),
            ("Files copied", items.len().to_string()),
            ("Random names", random.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceSpec;

    #[test]
    fn test_cli_parses_list() {
        let cli = Cli::try_parse_from([
            "dataset-iter",
            "-v",
            "--extensions",
            "wav,mp3",
            "list",
            "--manifest",
            "a.csv",
            "--limit",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.extensions, Some(vec!["wav".to_string(), "mp3".to_string()]));
        assert!(matches!(cli.command, Commands::List { limit: Some(3), .. }));
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::try_parse_from(["dataset-iter", "-d", ";", "--flat", "count", "-D", "images"]).unwrap();
        let mut config = DatasetConfig::default();
        apply_overrides(&cli, &mut config);
        assert_eq!(config.manifest.delimiter, ';');
        assert!(!config.scan.recursive);
    }

    #[test]
    fn test_resolve_source_uses_config_fallback() {
        let config = DatasetConfig {
            source: Some(SourceSpec {
                manifest: Some(PathBuf::from("ann.csv")),
                directory: None,
            }),
            ..DatasetConfig::default()
        };
        let source = resolve_source(None, None, &config).unwrap();
        assert_eq!(source, SourceDescriptor::Manifest(PathBuf::from("ann.csv")));

        let source = resolve_source(None, Some(PathBuf::from("imgs")), &config).unwrap();
        assert_eq!(source, SourceDescriptor::Directory(PathBuf::from("imgs")));

        assert!(resolve_source(Some("a.csv".into()), Some("imgs".into()), &config).is_err());
        assert!(resolve_source(None, None, &DatasetConfig::default()).is_err());
    }

    #[test]
    fn test_seed_requires_random() {
        let parsed = Cli::try_parse_from(["dataset-iter", "copy", "src", "dst", "--seed", "4"]);
        assert!(parsed.is_err());
    }
}
