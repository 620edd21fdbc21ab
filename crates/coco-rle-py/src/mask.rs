use coco_rle::mask::{self as rmask, Pixel};
use coco_rle::{counts, segmentation, Segmentation, SegmentationKind};
use ndarray::ArrayViewD;
use numpy::{PyArray2, PyReadonlyArrayDyn};
use pyo3::prelude::*;

use crate::convert::{codec_err, py_to_segmentation, segmentation_to_py};

/// Runs of a bool or uint8 array of shape (h, w) or (h, w, 1), with its height and width.
fn runs_of<'py>(mask: &Bound<'py, PyAny>) -> PyResult<(Vec<u32>, u32, u32)> {
    fn scan<P: Pixel>(view: ArrayViewD<'_, P>) -> PyResult<(Vec<u32>, u32, u32)> {
        let shape = view.shape().to_vec();
        let runs = rmask::mask_to_runs(view).map_err(codec_err)?;
        Ok((runs, shape[0] as u32, shape[1] as u32))
    }
    if let Ok(arr) = mask.extract::<PyReadonlyArrayDyn<'py, bool>>() {
        return scan(arr.as_array());
    }
    let arr: PyReadonlyArrayDyn<'py, u8> = mask.extract()?;
    scan(arr.as_array())
}

#[pyfunction]
pub fn encoded_rle_to_rle(encoded: &str) -> PyResult<Vec<u32>> {
    counts::decode(encoded).map_err(codec_err)
}

#[pyfunction]
pub fn rle_to_mask(
    py: Python<'_>,
    rle: Vec<u32>,
    height: u32,
    width: u32,
) -> PyResult<Py<PyArray2<bool>>> {
    let mask = rmask::runs_to_mask(&rle, height, width).map_err(codec_err)?;
    Ok(PyArray2::from_owned_array(py, mask).unbind())
}

#[pyfunction]
pub fn mask_to_rle(mask: &Bound<'_, PyAny>) -> PyResult<Vec<u32>> {
    let (runs, _, _) = runs_of(mask)?;
    Ok(runs)
}

#[pyfunction]
pub fn decode_segmentation(
    py: Python<'_>,
    seg: &Bound<'_, PyAny>,
    height: u32,
    width: u32,
) -> PyResult<Py<PyArray2<bool>>> {
    let seg = py_to_segmentation(seg)?;
    let mask = segmentation::decode_segmentation(&seg, height, width).map_err(codec_err)?;
    Ok(PyArray2::from_owned_array(py, mask).unbind())
}

#[pyfunction]
pub fn encode_segmentation(py: Python<'_>, mask: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let (counts, h, w) = runs_of(mask)?;
    let seg = Segmentation::Rle {
        size: [h, w],
        counts,
    };
    segmentation_to_py(py, &seg)
}

/// Convert a segmentation record to `format` ("polygon", "rle" or "encoded_rle").
#[pyfunction]
pub fn convert_segmentation(
    py: Python<'_>,
    seg: &Bound<'_, PyAny>,
    format: &str,
) -> PyResult<PyObject> {
    let target: SegmentationKind = format.parse().map_err(codec_err)?;
    let seg = py_to_segmentation(seg)?;
    let converted = segmentation::convert(&seg, target).map_err(codec_err)?;
    segmentation_to_py(py, &converted)
}
