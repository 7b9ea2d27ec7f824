//! Yoloprep: YOLO dataset preparation.
//!
//! Yoloprep turns raw, mixed-format annotation dumps into training-ready
//! YOLO dataset packages: it detects the task kind of a directory, rewrites
//! VOC-XML and polygon-JSON annotations into YOLO label records, splits the
//! samples into train/val/test, materializes the split as the canonical
//! `images/` + `labels/` layout with a `data.yaml` manifest, and merges
//! already-packaged datasets with vocabulary checks and count reporting.
//!
//! # Modules
//!
//! - [`detect`]: task-kind detection (classification vs detection)
//! - [`convert`]: annotation conversion and sample collection
//! - [`split`]: train/val/test splitting
//! - [`organize`]: on-disk layout and manifest writing
//! - [`merge`]: merging organized dataset packages
//! - [`error`]: error types for yoloprep operations

pub mod archive;
pub mod convert;
pub mod detect;
pub mod error;
pub mod manifest;
pub mod merge;
pub mod organize;
pub mod scan;
pub mod split;
pub mod vocab;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::detect::TaskKind;
use crate::split::SplitRatios;

pub use error::YoloprepError;

/// The yoloprep CLI application.
#[derive(Parser)]
#[command(name = "yoloprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Detect whether directories hold a classification or detection dataset.
    Detect(DetectArgs),
    /// Convert VOC-XML or polygon-JSON annotations to YOLO label files.
    Convert(ConvertArgs),
    /// Run the full pipeline: convert, split, organize, and package.
    Prepare(PrepareArgs),
    /// Merge previously organized dataset packages into one.
    Merge(MergeArgs),
}

/// Arguments for the detect subcommand.
#[derive(clap::Args)]
struct DetectArgs {
    /// Dataset directories to inspect.
    #[arg(required = true)]
    dirs: Vec<PathBuf>,
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory whose annotations are rewritten in place.
    dir: PathBuf,
}

/// Arguments for the prepare subcommand.
#[derive(clap::Args)]
struct PrepareArgs {
    /// Source dataset directories.
    #[arg(required = true)]
    dirs: Vec<PathBuf>,

    /// Output directory for the organized dataset.
    #[arg(long, default_value = "yolo_dataset")]
    out: PathBuf,

    /// Fraction of samples assigned to the training split.
    #[arg(long, default_value_t = 0.8)]
    train_ratio: f64,

    /// Fraction of samples assigned to the validation split.
    #[arg(long, default_value_t = 0.1)]
    val_ratio: f64,

    /// Seed for the split shuffle.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Also package the output directory as a zip archive.
    #[arg(long)]
    zip: bool,
}

/// Arguments for the merge subcommand.
#[derive(clap::Args)]
struct MergeArgs {
    /// Organized dataset directories to merge, in order.
    #[arg(required = true)]
    datasets: Vec<PathBuf>,

    /// Output directory for the merged dataset.
    #[arg(long, default_value = "merged_dataset")]
    out: PathBuf,

    /// Also package the merged directory as a zip archive.
    #[arg(long)]
    zip: bool,
}

/// Run the yoloprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), YoloprepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Detect(args)) => run_detect(args),
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Prepare(args)) => run_prepare(args),
        Some(Commands::Merge(args)) => run_merge(args),
        None => {
            println!("yoloprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("YOLO dataset preparation.");
            println!();
            println!("Run 'yoloprep --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the detect subcommand.
fn run_detect(args: DetectArgs) -> Result<(), YoloprepError> {
    let kind = detect::detect_task(&args.dirs)?;
    println!("{kind}");
    Ok(())
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), YoloprepError> {
    let names = convert::collect_class_names(&args.dir)?;
    let vocabulary = vocab::ClassVocabulary::from_names(names);
    let outcome = convert::convert_annotations(&args.dir, &vocabulary)?;
    println!(
        "Converted {} label file(s), skipped {}",
        outcome.labels_written, outcome.skipped
    );
    println!("Classes: {:?}", vocabulary.names());
    Ok(())
}

/// Execute the prepare subcommand.
fn run_prepare(args: PrepareArgs) -> Result<(), YoloprepError> {
    let ratios = SplitRatios::new(args.train_ratio, args.val_ratio)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let kind = detect::detect_task(&args.dirs)?;
    info!("detected task kind: {kind}");

    match kind {
        TaskKind::Detection => {
            // Pool the class names from every input directory first, so
            // the ids written into label files match the vocabulary the
            // manifest publishes.
            let mut names = Vec::new();
            for dir in &args.dirs {
                names.extend(convert::collect_class_names(dir)?);
            }
            let vocabulary = vocab::ClassVocabulary::from_names(names);

            let mut samples = Vec::new();
            for dir in &args.dirs {
                convert::convert_annotations(dir, &vocabulary)?;
                samples.extend(convert::collect_detection_samples(dir)?);
            }

            println!("Classes: {:?}", vocabulary.names());
            println!("Samples: {}", samples.len());

            let split = split::split_samples(samples, &ratios, &mut rng);
            organize::organize_detection(&split, &args.out, vocabulary.names().to_vec())?;
        }
        TaskKind::Classification => {
            let classes = convert::collect_classification_samples(&args.dirs)?;
            println!("Classes: {:?}", classes.keys().collect::<Vec<_>>());

            let by_class = split::split_by_class(classes, &ratios, &mut rng);
            organize::organize_classification(&by_class, &args.out)?;
        }
    }

    if args.zip {
        archive::zip_dir(&args.out, &args.out.with_extension("zip"))?;
    }

    println!("Prepared dataset at {}", args.out.display());
    Ok(())
}

/// Execute the merge subcommand.
fn run_merge(args: MergeArgs) -> Result<(), YoloprepError> {
    let report = merge::merge_datasets(&args.datasets, &args.out)?;
    print!("{report}");

    if args.zip {
        archive::zip_dir(&args.out, &args.out.with_extension("zip"))?;
    }

    Ok(())
}
