//! Batch augmentation of delimited tabular datasets.
//!
//! Scans a data directory, and for every matching file writes
//! `iterations` noisy, row-subsampled variants under
//! `<out_dir>/<base>/<base>_<i>.<ext>`.

use anyhow::Context;
use clap::Parser;
use itertools::Itertools as _;
use log::{error, info, warn};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tabaug::{AugmentOptions, Augmentor, Dataset};

#[derive(Debug, Parser)]
#[command(about = "Generate noisy, row-subsampled variants of tabular datasets")]
struct Args {
    /// Directory containing the source tables
    #[arg(short, long)]
    data_dir: PathBuf,

    /// Output root (default: augmented_datasets next to the data directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Process only files whose name contains one of these substrings
    #[arg(short, long)]
    filter: Vec<String>,

    /// Standard deviation of the Gaussian noise added to feature columns
    #[arg(long, default_value_t = 0.05)]
    noise_std_dev: f64,

    /// Fraction of rows removed from each variant
    #[arg(long, default_value_t = 0.02)]
    removal_fraction: f64,

    /// Number of variants generated per input file
    #[arg(short = 'n', long, default_value_t = NonZeroUsize::new(5000).expect("never fails"))]
    iterations: NonZeroUsize,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    anyhow::ensure!(
        args.data_dir.is_dir(),
        "data directory {} does not exist",
        args.data_dir.display()
    );
    let out_root = args.out_dir.clone().unwrap_or_else(|| {
        args.data_dir
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("augmented_datasets")
    });

    let files = discover_files(&args.data_dir, &args.filter)?;
    if files.is_empty() {
        warn!("no matching files in {}", args.data_dir.display());
        return Ok(());
    }
    info!(
        "found {} file(s): {}",
        files.len(),
        files.iter().map(|p| p.display()).join(", ")
    );

    for file in &files {
        if let Err(e) = process_file(file, &out_root, &args) {
            error!("error processing {}: {:#}", file.display(), e);
        }
    }

    info!("data augmentation complete");
    Ok(())
}

fn discover_files(dir: &Path, filters: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let entries = dir
        .read_dir()
        .with_context(|| format!("failed to list {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if filters.is_empty() || filters.iter().any(|f| name.contains(f.as_str())) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn process_file(path: &Path, out_root: &Path, args: &Args) -> anyhow::Result<()> {
    let dataset = Dataset::load(path)?;
    info!(
        "processing {}: {} rows, {} feature column(s)",
        path.display(),
        dataset.table().rows_len(),
        dataset.table().features_len()
    );

    let mut options = AugmentOptions::new()
        .noise_std_dev(args.noise_std_dev)
        .removal_fraction(args.removal_fraction)
        .iterations(args.iterations);
    if let Some(seed) = args.seed {
        options = options.seed(seed);
    }

    let augmentor = Augmentor::new(dataset.table(), options)?;
    let total = augmentor.len();
    for (i, variant) in augmentor.enumerate() {
        let iteration = i + 1;
        let written = dataset.write_variant(out_root, iteration, &variant)?;
        if iteration % 100 == 0 || iteration == total {
            info!("saved {}", written.display());
        }
    }
    Ok(())
}
