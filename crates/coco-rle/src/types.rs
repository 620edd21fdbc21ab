use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// A dense object mask: `true` where the pixel belongs to the object.
///
/// Masks built by this crate use column-major (Fortran) memory layout, but
/// all operations index pixels logically, so any layout is accepted as input.
pub type Mask = ndarray::Array2<bool>;

/// Segmentation field of a COCO annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segmentation {
    /// Polygon format: list of polygons, each a flat list of [x, y, x, y, ...] coordinates.
    Polygon(Vec<Vec<f64>>),
    /// Compressed RLE: counts serialized as an ASCII varint string.
    EncodedRle { size: [u32; 2], counts: String },
    /// Uncompressed RLE: counts stored as a plain integer list.
    Rle { size: [u32; 2], counts: Vec<u32> },
}

impl Segmentation {
    pub fn kind(&self) -> SegmentationKind {
        match self {
            Segmentation::Polygon(_) => SegmentationKind::Polygon,
            Segmentation::EncodedRle { .. } => SegmentationKind::EncodedRle,
            Segmentation::Rle { .. } => SegmentationKind::Rle,
        }
    }
}

/// The three ways a COCO segmentation can be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentationKind {
    Polygon,
    Rle,
    EncodedRle,
}

impl fmt::Display for SegmentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentationKind::Polygon => "polygon",
            SegmentationKind::Rle => "RLE",
            SegmentationKind::EncodedRle => "encoded RLE",
        };
        f.write_str(name)
    }
}

impl FromStr for SegmentationKind {
    type Err = CodecError;

    /// Parses `polygon`, `rle` and `encoded_rle` (`-` also accepted), ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "polygon" => Ok(SegmentationKind::Polygon),
            "rle" => Ok(SegmentationKind::Rle),
            "encoded_rle" => Ok(SegmentationKind::EncodedRle),
            _ => Err(CodecError::UnsupportedFormat(format!(
                "unknown segmentation format '{s}'"
            ))),
        }
    }
}

/// Run-length encoding for masks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rle {
    pub h: u32,
    pub w: u32,
    /// Run counts: alternating runs of 0s and 1s, starting with 0s.
    pub counts: Vec<u32>,
}

impl Rle {
    /// Number of pixels the mask covers, `h * w`.
    pub fn num_pixels(&self) -> u64 {
        u64::from(self.h) * u64::from(self.w)
    }

    /// Number of pixels the runs cover.
    pub fn covered(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }
}

impl From<Rle> for Segmentation {
    fn from(rle: Rle) -> Self {
        Segmentation::Rle {
            size: [rle.h, rle.w],
            counts: rle.counts,
        }
    }
}
