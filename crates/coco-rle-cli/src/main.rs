use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use coco_rle::dataset::{annotation_stats, convert_dataset};
use coco_rle::{counts, ConvertParams, Dataset, SegmentationKind};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coco-rle")]
#[command(about = "Inspect and convert the segmentation encodings of COCO annotation files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every segmentation of an annotations file to another format
    Convert {
        /// Path to the COCO annotations JSON file
        json_path: PathBuf,

        /// Destination format
        #[arg(long, short, value_enum, default_value_t = Format::Rle)]
        format: Format,

        /// Where to write the edited file (defaults to editing in place)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Leave annotations that cannot be converted as they are
        #[arg(long)]
        skip_unsupported: bool,

        /// Write JSON without indentation
        #[arg(long)]
        compact: bool,
    },

    /// Decode a compressed counts string and print the plain RLE as JSON
    Decode {
        /// The encoded counts string
        #[arg(long)]
        counts: String,

        /// Mask height
        #[arg(long)]
        height: u32,

        /// Mask width
        #[arg(long)]
        width: u32,
    },

    /// Print the area and bounding box of every RLE annotation
    Stats {
        /// Path to the COCO annotations JSON file
        json_path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Polygon,
    Rle,
    EncodedRle,
}

impl From<Format> for SegmentationKind {
    fn from(format: Format) -> Self {
        match format {
            Format::Polygon => SegmentationKind::Polygon,
            Format::Rle => SegmentationKind::Rle,
            Format::EncodedRle => SegmentationKind::EncodedRle,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Convert {
            json_path,
            format,
            output,
            skip_unsupported,
            compact,
        } => {
            info!("Loading annotations from {:?}", json_path);
            let mut dataset = Dataset::load(&json_path)
                .with_context(|| format!("failed to load {}", json_path.display()))?;

            let mut params = ConvertParams::new(format.into());
            params.skip_unsupported = skip_unsupported;
            convert_dataset(&mut dataset, &params)?;

            let output = output.unwrap_or(json_path);
            info!("Saving the edited annotations to {:?}", output);
            dataset
                .save(&output, !compact)
                .with_context(|| format!("failed to write {}", output.display()))?;
        }
        Command::Decode {
            counts,
            height,
            width,
        } => {
            let rle = counts::decode_rle(&counts, height, width)
                .context("failed to decode counts")?;
            println!("{}", serde_json::to_string(&rle.counts)?);
        }
        Command::Stats { json_path } => {
            let dataset = Dataset::load(&json_path)
                .with_context(|| format!("failed to load {}", json_path.display()))?;
            for ann in &dataset.annotations {
                match annotation_stats(ann) {
                    Ok(stats) => {
                        let [x, y, w, h] = stats.bbox;
                        println!(
                            "{} area={} bbox=[{}, {}, {}, {}]",
                            ann.label(),
                            stats.area,
                            x,
                            y,
                            w,
                            h
                        );
                    }
                    Err(err) => warn!("{:#}", anyhow::Error::new(err)),
                }
            }
        }
    }

    Ok(())
}
