//! Conversion between dense masks and uncompressed RLE.
//!
//! Runs are laid over the pixels in column-major order: all rows of column 0
//! top to bottom, then column 1, and so on. Pixel `(row, col)` is flat index
//! `row + h * col`. Even-indexed runs are background, odd-indexed runs are
//! foreground, and the first run is background even when it is empty.

use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2, ShapeBuilder};

use crate::error::{CodecError, Result};
use crate::types::{Mask, Rle};

/// A pixel type that can be read as mask membership.
pub trait Pixel: Copy {
    fn is_foreground(self) -> bool;
}

impl Pixel for bool {
    fn is_foreground(self) -> bool {
        self
    }
}

macro_rules! impl_pixel {
    ($zero:expr => $($t:ty),*) => {
        $(
            impl Pixel for $t {
                fn is_foreground(self) -> bool {
                    self != $zero
                }
            }
        )*
    };
}

impl_pixel!(0 => u8, u16, u32);
impl_pixel!(0.0 => f32, f64);

/// Expand runs into an `h x w` mask.
///
/// Fails with [`CodecError::DimensionMismatch`] unless the runs sum to exactly `h * w`.
pub fn runs_to_mask(runs: &[u32], h: u32, w: u32) -> Result<Mask> {
    let expected = u64::from(h) * u64::from(w);
    let actual: u64 = runs.iter().map(|&r| u64::from(r)).sum();
    if actual != expected {
        return Err(CodecError::DimensionMismatch { expected, actual });
    }

    let mut mask = Mask::from_elem((h as usize, w as usize).f(), false);
    {
        // Reversing the axes makes logical iteration order column-major.
        let mut pixels = mask.view_mut().reversed_axes().into_iter();
        let mut v = false;
        for &r in runs {
            for px in pixels.by_ref().take(r as usize) {
                *px = v;
            }
            v = !v;
        }
    }
    Ok(mask)
}

/// Compute the runs of a mask.
///
/// Accepts `(h, w)` or `(h, w, 1)`; any other shape fails with
/// [`CodecError::UnsupportedShape`], as does a mask with more than `u32::MAX`
/// pixels. Non-zero pixels are foreground.
pub fn mask_to_runs<P: Pixel>(mask: ArrayViewD<'_, P>) -> Result<Vec<u32>> {
    let shape = mask.shape().to_vec();
    let mask = match shape.as_slice() {
        [_, _, 1] => mask.index_axis_move(Axis(2), 0),
        _ => mask,
    };
    let mask = mask
        .into_dimensionality::<Ix2>()
        .map_err(|_| CodecError::UnsupportedShape { shape })?;
    scan_runs(mask)
}

fn scan_runs<P: Pixel>(mask: ArrayView2<'_, P>) -> Result<Vec<u32>> {
    // Runs and dimensions are u32, so the pixel count must be too.
    let (h, w) = mask.dim();
    let fits = |n: usize| u32::try_from(n).is_ok();
    if !(fits(h) && fits(w) && fits(mask.len())) {
        return Err(CodecError::UnsupportedShape {
            shape: mask.shape().to_vec(),
        });
    }
    if mask.is_empty() {
        return Ok(Vec::new());
    }

    let mut counts = Vec::new();
    let mut prev = false;
    let mut run: u32 = 0;
    for &px in mask.reversed_axes().iter() {
        let v = px.is_foreground();
        if v != prev {
            counts.push(run);
            run = 0;
            prev = v;
        }
        run += 1;
    }
    counts.push(run);
    Ok(counts)
}

/// Encode a 2D mask into RLE.
///
/// Fails with [`CodecError::UnsupportedShape`] above `u32::MAX` pixels.
pub fn encode(mask: &Mask) -> Result<Rle> {
    let counts = scan_runs(mask.view())?;
    // scan_runs has checked both dimensions fit.
    let (h, w) = mask.dim();
    Ok(Rle {
        h: h as u32,
        w: w as u32,
        counts,
    })
}

/// Decode an RLE to a dense mask.
pub fn decode(rle: &Rle) -> Result<Mask> {
    runs_to_mask(&rle.counts, rle.h, rle.w)
}

/// Compute the area (number of foreground pixels) of an RLE mask.
///
/// Only sums the odd-indexed runs (which represent 1s).
pub fn area(rle: &Rle) -> u64 {
    rle.counts.iter().skip(1).step_by(2).map(|&c| u64::from(c)).sum()
}

/// Compute the bounding box `[x, y, w, h]` of an RLE mask without decoding it.
///
/// An empty mask yields `[0, 0, 0, 0]`.
pub fn to_bbox(rle: &Rle) -> [f64; 4] {
    let h = u64::from(rle.h);
    if h == 0 {
        return [0.0; 4];
    }

    let (mut xs, mut xe) = (u64::MAX, 0u64);
    let (mut ys, mut ye) = (u64::MAX, 0u64);
    let mut pos = 0u64;
    for (i, &c) in rle.counts.iter().enumerate() {
        let c = u64::from(c);
        if i % 2 == 1 && c > 0 {
            let (x1, y1) = (pos / h, pos % h);
            let last = pos + c - 1;
            let (x2, y2) = (last / h, last % h);
            xs = xs.min(x1);
            xe = xe.max(x2 + 1);
            if x1 == x2 {
                ys = ys.min(y1);
                ye = ye.max(y2 + 1);
            } else {
                // A run wrapping into the next column touches the bottom and top rows.
                ys = 0;
                ye = h;
            }
        }
        pos += c;
    }

    if xe == 0 {
        return [0.0; 4];
    }
    [xs as f64, ys as f64, (xe - xs) as f64, (ye - ys) as f64]
}
