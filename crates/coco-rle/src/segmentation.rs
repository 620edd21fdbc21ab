//! Decoding and converting annotation segmentation records.

use rayon::prelude::*;

use crate::counts;
use crate::error::{CodecError, Result};
use crate::mask;
use crate::types::{Mask, Rle, Segmentation, SegmentationKind};

fn not_implemented(from: SegmentationKind, to: SegmentationKind) -> CodecError {
    CodecError::UnsupportedFormat(format!("{from} -> {to} is not implemented"))
}

/// Decode a segmentation record into an `h x w` mask.
///
/// Plain RLE counts are expanded directly; encoded counts are decoded first.
/// Polygon records are rejected with [`CodecError::UnsupportedFormat`].
pub fn decode_segmentation(seg: &Segmentation, h: u32, w: u32) -> Result<Mask> {
    match seg {
        Segmentation::Rle { counts, .. } => mask::runs_to_mask(counts, h, w),
        Segmentation::EncodedRle { counts, .. } => {
            let runs = counts::decode(counts)?;
            mask::runs_to_mask(&runs, h, w)
        }
        Segmentation::Polygon(_) => Err(not_implemented(
            SegmentationKind::Polygon,
            SegmentationKind::Rle,
        )),
    }
}

/// Decode a segmentation record using its own `size` field.
pub fn decode(seg: &Segmentation) -> Result<Mask> {
    mask::decode(&to_rle(seg)?)
}

/// Plain-RLE segmentation record for a mask.
pub fn encode_segmentation(mask: &Mask) -> Result<Segmentation> {
    Ok(mask::encode(mask)?.into())
}

/// Extract the plain RLE of a record, checking that it covers its `size`.
pub fn to_rle(seg: &Segmentation) -> Result<Rle> {
    match seg {
        Segmentation::Rle { size, counts } => {
            let rle = Rle {
                h: size[0],
                w: size[1],
                counts: counts.clone(),
            };
            if rle.covered() != rle.num_pixels() {
                return Err(CodecError::DimensionMismatch {
                    expected: rle.num_pixels(),
                    actual: rle.covered(),
                });
            }
            Ok(rle)
        }
        Segmentation::EncodedRle { size, counts } => counts::decode_rle(counts, size[0], size[1]),
        Segmentation::Polygon(_) => Err(not_implemented(
            SegmentationKind::Polygon,
            SegmentationKind::Rle,
        )),
    }
}

/// Convert a record to another storage kind.
///
/// Only encoded RLE -> RLE and identity conversions are available. The
/// others fail with [`CodecError::UnsupportedFormat`].
pub fn convert(seg: &Segmentation, target: SegmentationKind) -> Result<Segmentation> {
    let from = seg.kind();
    match (from, target) {
        (a, b) if a == b => Ok(seg.clone()),
        (SegmentationKind::EncodedRle, SegmentationKind::Rle) => Ok(to_rle(seg)?.into()),
        (a, b) => Err(not_implemented(a, b)),
    }
}

/// Decode many records in parallel, each with its own `size`.
///
/// Results are returned in input order.
pub fn decode_all(segs: &[Segmentation]) -> Vec<Result<Mask>> {
    segs.par_iter().map(decode).collect()
}

#[cfg(test)]
mod tests {
    use ndarray::s;

    use super::*;

    fn square() -> Mask {
        let mut mask = Mask::from_elem((4, 4), false);
        mask.slice_mut(s![1..3, 1..3]).fill(true);
        mask
    }

    #[test]
    fn test_plain_and_encoded_agree() {
        let plain = Segmentation::Rle {
            size: [4, 4],
            counts: vec![5, 2, 2, 2, 5],
        };
        // 5, 2, 2, then 2 - counts[1] = 0 and 5 - counts[2] = 3
        let encoded = Segmentation::EncodedRle {
            size: [4, 4],
            counts: "52203".into(),
        };
        assert_eq!(decode_segmentation(&plain, 4, 4).unwrap(), square());
        assert_eq!(decode_segmentation(&encoded, 4, 4).unwrap(), square());
    }

    #[test]
    fn test_polygon_rejected() {
        let poly = Segmentation::Polygon(vec![vec![0.0, 0.0, 2.0, 0.0, 2.0, 2.0]]);
        assert!(matches!(
            decode_segmentation(&poly, 4, 4),
            Err(CodecError::UnsupportedFormat(_))
        ));
        assert!(matches!(to_rle(&poly), Err(CodecError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_target_dimensions_checked() {
        let plain = Segmentation::Rle {
            size: [4, 4],
            counts: vec![5, 2, 2, 2, 5],
        };
        assert_eq!(
            decode_segmentation(&plain, 4, 5),
            Err(CodecError::DimensionMismatch {
                expected: 20,
                actual: 16
            })
        );
    }

    #[test]
    fn test_encode_segmentation() {
        let seg = encode_segmentation(&square()).unwrap();
        assert_eq!(
            seg,
            Segmentation::Rle {
                size: [4, 4],
                counts: vec![5, 2, 2, 2, 5],
            }
        );
        assert_eq!(decode(&seg).unwrap(), square());
    }

    #[test]
    fn test_convert_encoded_to_plain() {
        let encoded = Segmentation::EncodedRle {
            size: [4, 4],
            counts: "52203".into(),
        };
        let plain = convert(&encoded, SegmentationKind::Rle).unwrap();
        assert_eq!(plain, encode_segmentation(&square()).unwrap());
        assert_eq!(convert(&plain, SegmentationKind::Rle).unwrap(), plain);
    }

    #[test]
    fn test_convert_unsupported_directions() {
        let plain = encode_segmentation(&square()).unwrap();
        let err = convert(&plain, SegmentationKind::EncodedRle).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnsupportedFormat("RLE -> encoded RLE is not implemented".into())
        );
        assert!(convert(&plain, SegmentationKind::Polygon).is_err());
        let poly = Segmentation::Polygon(vec![]);
        assert!(convert(&poly, SegmentationKind::Rle).is_err());
    }

    #[test]
    fn test_convert_to_same_kind_keeps_record() {
        let poly = Segmentation::Polygon(vec![vec![0.0, 0.0, 2.0, 0.0, 2.0, 2.0]]);
        assert_eq!(convert(&poly, SegmentationKind::Polygon).unwrap(), poly);

        let encoded = Segmentation::EncodedRle {
            size: [4, 4],
            counts: "52203".into(),
        };
        let kind: SegmentationKind = "encoded-rle".parse().unwrap();
        assert_eq!(convert(&encoded, kind).unwrap(), encoded);
    }

    #[test]
    fn test_convert_checks_size() {
        let encoded = Segmentation::EncodedRle {
            size: [4, 5],
            counts: "52203".into(),
        };
        assert!(matches!(
            convert(&encoded, SegmentationKind::Rle),
            Err(CodecError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_all_keeps_order() {
        let segs = vec![
            encode_segmentation(&square()).unwrap(),
            Segmentation::Polygon(vec![]),
            Segmentation::EncodedRle {
                size: [2, 2],
                counts: "4".into(),
            },
        ];
        let masks = decode_all(&segs);
        assert_eq!(masks.len(), 3);
        assert_eq!(masks[0].as_ref().unwrap(), &square());
        assert!(masks[1].is_err());
        assert_eq!(masks[2].as_ref().unwrap(), &Mask::from_elem((2, 2), false));
    }
}
