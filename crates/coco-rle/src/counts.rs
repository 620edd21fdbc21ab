//! Decoder for the compressed RLE string format used in COCO annotation files.
//!
//! Each run is stored as a signed LEB128-like integer with 5 payload bits per
//! byte instead of 7: bit 5 (`0x20`) is the continuation flag and bit 4
//! (`0x10`) of the final byte carries the sign. Every byte is offset by ASCII
//! `'0'` so the string stays printable. From the fourth run on, each value is a
//! delta against the run two positions back, i.e. the previous run of the same
//! color.
//!
//! This matches `rleFrString` in `maskApi.c`. The inverse direction is not
//! provided.

use crate::error::{CodecError, Result};
use crate::types::Rle;

/// ASCII offset added to every 6-bit group.
const OFFSET: u8 = b'0';
/// Largest valid byte: `'0' + 0x3f`.
const LAST: u8 = b'o';
/// Groups start at bit 0, 5, ..., 55. A 13th group could not be sign-extended in 64 bits.
const MAX_SHIFT: u32 = 55;

/// Decode a compressed counts string into plain run lengths.
///
/// An empty string decodes to an empty sequence.
pub fn decode(encoded: &str) -> Result<Vec<u32>> {
    let bytes = encoded.as_bytes();
    let mut counts: Vec<u32> = Vec::with_capacity(bytes.len());
    let mut p = 0usize;

    while p < bytes.len() {
        let start = p;
        let mut x: i64 = 0;
        let mut shift: u32 = 0;
        loop {
            let Some(&raw) = bytes.get(p) else {
                return Err(CodecError::Truncated { offset: p });
            };
            if !(OFFSET..=LAST).contains(&raw) {
                return Err(CodecError::InvalidByte { offset: p, byte: raw });
            }
            if shift > MAX_SHIFT {
                return Err(CodecError::Overflow { offset: start });
            }
            let c = i64::from(raw - OFFSET);
            x |= (c & 0x1f) << shift;
            p += 1;
            shift += 5;
            if c & 0x20 == 0 {
                if c & 0x10 != 0 {
                    x |= !0i64 << shift;
                }
                break;
            }
        }

        let m = counts.len();
        if m > 2 {
            x += i64::from(counts[m - 2]);
        }
        let run = u32::try_from(x).map_err(|_| CodecError::InvalidRun { index: m, value: x })?;
        counts.push(run);
    }

    Ok(counts)
}

/// Decode a compressed counts string and check it covers an `h x w` mask.
pub fn decode_rle(encoded: &str, h: u32, w: u32) -> Result<Rle> {
    let rle = Rle {
        h,
        w,
        counts: decode(encoded)?,
    };
    if rle.covered() != rle.num_pixels() {
        return Err(CodecError::DimensionMismatch {
            expected: rle.num_pixels(),
            actual: rle.covered(),
        });
    }
    Ok(rle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        assert_eq!(decode("").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_single_group_values() {
        assert_eq!(decode("0").unwrap(), vec![0]);
        assert_eq!(decode("1").unwrap(), vec![1]);
        // 15 is the largest positive value that fits a single group
        assert_eq!(decode("?").unwrap(), vec![15]);
    }

    #[test]
    fn test_multi_group_values() {
        assert_eq!(decode("n0").unwrap(), vec![30]);
        assert_eq!(decode("0o0").unwrap(), vec![0, 31]);
        assert_eq!(decode("Q5").unwrap(), vec![161]);
        assert_eq!(decode("iX1").unwrap(), vec![1305]);
        // A redundant zero continuation group is still valid.
        assert_eq!(decode("P0").unwrap(), vec![0]);
    }

    #[test]
    fn test_delta_starts_at_fourth_run() {
        // Runs 0..=2 are absolute, run 3 is 2 + counts[1], run 4 is -1 + counts[2].
        assert_eq!(decode("5232O").unwrap(), vec![5, 2, 3, 4, 2]);
        assert_eq!(decode("iX13a>").unwrap(), vec![1305, 3, 465]);
    }

    #[test]
    fn test_negative_absolute_run() {
        // '@' is a lone group with the sign bit set: -16.
        assert_eq!(
            decode("@"),
            Err(CodecError::InvalidRun {
                index: 0,
                value: -16
            })
        );
    }

    #[test]
    fn test_negative_after_delta() {
        // 'M' is -3, added to counts[1] = 2.
        assert_eq!(
            decode("523M"),
            Err(CodecError::InvalidRun {
                index: 3,
                value: -1
            })
        );
    }

    #[test]
    fn test_truncated() {
        assert_eq!(decode("a"), Err(CodecError::Truncated { offset: 1 }));
        assert_eq!(decode("iX"), Err(CodecError::Truncated { offset: 2 }));
        assert_eq!(decode("52iX"), Err(CodecError::Truncated { offset: 4 }));
    }

    #[test]
    fn test_invalid_byte() {
        assert_eq!(
            decode("1 2"),
            Err(CodecError::InvalidByte {
                offset: 1,
                byte: b' '
            })
        );
        assert_eq!(
            decode("p"),
            Err(CodecError::InvalidByte {
                offset: 0,
                byte: b'p'
            })
        );
    }

    #[test]
    fn test_overflow() {
        let encoded = format!("1{}0", "o".repeat(12));
        assert_eq!(decode(&encoded), Err(CodecError::Overflow { offset: 1 }));
        // Twelve groups still fit.
        let encoded = format!("{}0", "P".repeat(11));
        assert_eq!(decode(&encoded).unwrap(), vec![0]);
    }

    #[test]
    fn test_decode_rle_checks_size() {
        let rle = decode_rle("5232O", 4, 4).unwrap();
        assert_eq!(rle.counts, vec![5, 2, 3, 4, 2]);
        assert_eq!(
            decode_rle("5232O", 4, 5),
            Err(CodecError::DimensionMismatch {
                expected: 20,
                actual: 16
            })
        );
    }
}
