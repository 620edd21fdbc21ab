//! COCO annotation files: loading, converting segmentations, and saving.
//!
//! Only the fields the codec needs are typed. Everything else (image and
//! category records, `info`, `licenses`, extra annotation keys) is carried as
//! raw JSON so a converted file keeps all of its content.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{CodecError, DatasetError};
use crate::mask;
use crate::segmentation;
use crate::types::{Segmentation, SegmentationKind};

/// Top-level COCO dataset structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Dataset {
    #[serde(default)]
    pub images: Vec<Value>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub categories: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An annotation record. The id is kept as raw JSON since some datasets use
/// string ids; `image_id`, `category_id` and the rest stay in `extra`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Segmentation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    /// The id as shown in logs and errors.
    pub fn label(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            Value::Null => "<no id>".to_string(),
            other => other.to_string(),
        }
    }
}

impl Dataset {
    /// Load a COCO annotation JSON file.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the dataset as JSON, indented when `pretty` is set.
    pub fn save(&self, path: &Path, pretty: bool) -> Result<(), DatasetError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer, pretty)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W, pretty: bool) -> Result<(), DatasetError> {
        if pretty {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_json::to_writer(writer, self)?;
        }
        Ok(())
    }
}

/// Settings for [`convert_dataset`].
#[derive(Debug, Clone)]
pub struct ConvertParams {
    /// Storage kind every segmentation should end up in.
    pub target: SegmentationKind,
    /// Leave annotations whose conversion fails untouched instead of aborting.
    pub skip_unsupported: bool,
}

impl ConvertParams {
    /// Abort on the first failing annotation.
    pub fn new(target: SegmentationKind) -> Self {
        ConvertParams {
            target,
            skip_unsupported: false,
        }
    }
}

/// Counts of what [`convert_dataset`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertReport {
    pub converted: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

enum Outcome {
    Converted(Segmentation),
    Unchanged,
    Skipped(CodecError),
}

fn convert_annotation(ann: &Annotation, params: &ConvertParams) -> Result<Outcome, DatasetError> {
    let seg = ann
        .segmentation
        .as_ref()
        .ok_or_else(|| DatasetError::MissingSegmentation {
            annotation_id: ann.label(),
        })?;
    if seg.kind() == params.target {
        return Ok(Outcome::Unchanged);
    }
    match segmentation::convert(seg, params.target) {
        Ok(converted) => Ok(Outcome::Converted(converted)),
        Err(err) if params.skip_unsupported => Ok(Outcome::Skipped(err)),
        Err(source) => Err(DatasetError::Codec {
            annotation_id: ann.label(),
            source,
        }),
    }
}

/// Convert every annotation's segmentation to `params.target`.
///
/// Annotations are converted in parallel. On error the dataset is left
/// unmodified and the error of the first failing annotation is returned.
pub fn convert_dataset(
    dataset: &mut Dataset,
    params: &ConvertParams,
) -> Result<ConvertReport, DatasetError> {
    info!(
        "Converting {} annotations to {}",
        dataset.annotations.len(),
        params.target
    );

    let outcomes: Vec<Result<Outcome, DatasetError>> = dataset
        .annotations
        .par_iter()
        .map(|ann| convert_annotation(ann, params))
        .collect();
    let outcomes = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;

    let mut report = ConvertReport::default();
    for (ann, outcome) in dataset.annotations.iter_mut().zip(outcomes) {
        match outcome {
            Outcome::Converted(seg) => {
                debug!("annotation {}: {} -> {}", ann.label(), seg_kind(ann), params.target);
                ann.segmentation = Some(seg);
                report.converted += 1;
            }
            Outcome::Unchanged => report.unchanged += 1,
            Outcome::Skipped(err) => {
                warn!("Skipping annotation {}: {}", ann.label(), err);
                report.skipped += 1;
            }
        }
    }

    info!(
        "Converted {}, unchanged {}, skipped {}",
        report.converted, report.unchanged, report.skipped
    );
    Ok(report)
}

fn seg_kind(ann: &Annotation) -> String {
    ann.segmentation
        .as_ref()
        .map_or_else(|| "none".to_string(), |s| s.kind().to_string())
}

/// Area and bounding box of an annotation's mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskStats {
    pub area: u64,
    /// `[x, y, w, h]`
    pub bbox: [f64; 4],
}

/// Compute the `area` and `bbox` fields of an RLE annotation from its runs.
pub fn annotation_stats(ann: &Annotation) -> Result<MaskStats, DatasetError> {
    let seg = ann
        .segmentation
        .as_ref()
        .ok_or_else(|| DatasetError::MissingSegmentation {
            annotation_id: ann.label(),
        })?;
    let rle = segmentation::to_rle(seg).map_err(|source| DatasetError::Codec {
        annotation_id: ann.label(),
        source,
    })?;
    Ok(MaskStats {
        area: mask::area(&rle),
        bbox: mask::to_bbox(&rle),
    })
}
