//! Python bindings, built with the `python` feature

use crate::core::{BandSelector, IndexEngine, IndexResult};
use crate::types::{IndexType, SadarError};
use numpy::{PyArray2, PyReadonlyArray2, ToPyArray};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(err: SadarError) -> PyErr {
    match err {
        SadarError::InsufficientBands { .. }
        | SadarError::ShapeMismatch { .. }
        | SadarError::UnknownIndex(_) => PyErr::new::<PyValueError, _>(format!("{}", err)),
        other => PyErr::new::<PyRuntimeError, _>(format!("{}", other)),
    }
}

#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyIndexResult>()?;
    m.add_function(wrap_pyfunction!(select_bands, m)?)?;
    m.add_function(wrap_pyfunction!(compute_index, m)?)?;
    Ok(())
}

/// (band_index1, band_index2, description) for an index and band count
#[pyfunction]
fn select_bands(index_type: &str, band_count: usize) -> PyResult<(usize, usize, String)> {
    let index_type: IndexType = index_type.parse().map_err(to_py_err)?;
    let selection = BandSelector::select(index_type, band_count).map_err(to_py_err)?;
    Ok((
        selection.band_index1,
        selection.band_index2,
        selection.source_description,
    ))
}

#[pyfunction]
fn compute_index(
    index_type: &str,
    band1: PyReadonlyArray2<f64>,
    band2: PyReadonlyArray2<f64>,
    threshold: f64,
) -> PyResult<PyIndexResult> {
    let index_type: IndexType = index_type.parse().map_err(to_py_err)?;
    let band1 = band1.as_array().to_owned();
    let band2 = band2.as_array().to_owned();

    let inner = IndexEngine::new(index_type)
        .compute(&band1, &band2, threshold)
        .map_err(to_py_err)?;
    Ok(PyIndexResult { inner })
}

/// Python wrapper for IndexResult
#[pyclass(name = "IndexResult")]
struct PyIndexResult {
    inner: IndexResult,
}

#[pymethods]
impl PyIndexResult {
    #[getter]
    fn index_type(&self) -> String {
        self.inner.index_type().to_string()
    }

    #[getter]
    fn threshold(&self) -> f64 {
        self.inner.threshold()
    }

    #[getter]
    fn values<'py>(&self, py: Python<'py>) -> &'py PyArray2<f64> {
        self.inner.values().to_pyarray(py)
    }

    /// (min, max, mean, std)
    #[getter]
    fn statistics(&self) -> (f64, f64, f64, f64) {
        let s = self.inner.statistics();
        (s.min, s.max, s.mean, s.std)
    }

    /// (total, valid, nodata, positive, negative)
    #[getter]
    fn pixel_counts(&self) -> (usize, usize, usize, usize, usize) {
        let c = self.inner.pixel_counts();
        (c.total, c.valid, c.nodata, c.positive, c.negative)
    }

    #[getter]
    fn histogram(&self) -> Vec<usize> {
        self.inner.histogram().buckets.to_vec()
    }

    #[getter]
    fn class_labels(&self) -> (String, String) {
        let labels = self.inner.class_labels();
        (labels.positive.clone(), labels.negative.clone())
    }

    fn __repr__(&self) -> String {
        let s = self.inner.statistics();
        format!(
            "IndexResult(index_type='{}', threshold={:.2}, mean={:.4}, valid={})",
            self.inner.index_type(),
            self.inner.threshold(),
            s.mean,
            self.inner.pixel_counts().valid
        )
    }
}
