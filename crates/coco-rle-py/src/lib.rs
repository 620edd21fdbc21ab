use pyo3::prelude::*;

mod convert;
mod mask;

#[pymodule]
fn coco_rle_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(mask::encoded_rle_to_rle, m)?)?;
    m.add_function(wrap_pyfunction!(mask::rle_to_mask, m)?)?;
    m.add_function(wrap_pyfunction!(mask::mask_to_rle, m)?)?;
    m.add_function(wrap_pyfunction!(mask::decode_segmentation, m)?)?;
    m.add_function(wrap_pyfunction!(mask::encode_segmentation, m)?)?;
    m.add_function(wrap_pyfunction!(mask::convert_segmentation, m)?)?;
    Ok(())
}
