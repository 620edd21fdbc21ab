//! Codec for COCO segmentation masks.
//!
//! Converts between dense masks, uncompressed run-length encodings, and the
//! compressed RLE strings found in COCO annotation files. Runs are always laid
//! out in column-major pixel order.

pub mod counts;
pub mod dataset;
pub mod error;
pub mod mask;
pub mod segmentation;
pub mod types;

pub use dataset::{ConvertParams, ConvertReport, Dataset};
pub use error::{CodecError, DatasetError, Result};
pub use types::{Mask, Rle, Segmentation, SegmentationKind};
