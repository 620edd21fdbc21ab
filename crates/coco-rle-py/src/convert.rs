use coco_rle::{CodecError, Segmentation};
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

pub fn codec_err(err: CodecError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

pub fn segmentation_to_py(py: Python<'_>, seg: &Segmentation) -> PyResult<PyObject> {
    match seg {
        Segmentation::Polygon(polys) => {
            let list = PyList::empty(py);
            for poly in polys {
                list.append(PyList::new(py, poly.iter())?)?;
            }
            Ok(list.into_any().unbind())
        }
        Segmentation::EncodedRle { size, counts } => {
            let dict = PyDict::new(py);
            dict.set_item("size", vec![size[0], size[1]])?;
            dict.set_item("counts", counts)?;
            Ok(dict.into_any().unbind())
        }
        Segmentation::Rle { size, counts } => {
            let dict = PyDict::new(py);
            dict.set_item("size", vec![size[0], size[1]])?;
            dict.set_item("counts", counts.clone())?;
            Ok(dict.into_any().unbind())
        }
    }
}

pub fn py_to_segmentation(obj: &Bound<'_, PyAny>) -> PyResult<Segmentation> {
    // Dicts are RLE records, with either a string or a list of counts
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let size: [u32; 2] = dict
            .get_item("size")?
            .ok_or_else(|| PyKeyError::new_err("segmentation has no 'size'"))?
            .extract()?;
        let counts_obj = dict
            .get_item("counts")?
            .ok_or_else(|| PyKeyError::new_err("segmentation has no 'counts'"))?;
        if let Ok(s) = counts_obj.extract::<String>() {
            return Ok(Segmentation::EncodedRle { size, counts: s });
        }
        let counts: Vec<u32> = counts_obj.extract()?;
        return Ok(Segmentation::Rle { size, counts });
    }
    // Otherwise it's a polygon (list of lists)
    let polys: Vec<Vec<f64>> = obj.extract()?;
    Ok(Segmentation::Polygon(polys))
}
