//! Python bindings for the window stage

use pyo3::prelude::*;
use numpy::PyArray1;
use crate::memory::Allocator;
use crate::window::{WindowConfig, WindowState};
use super::to_py_err;

/// Window state exposed to Python
#[pyclass(name = "WindowState")]
pub struct PyWindowState {
    state: WindowState,
}

#[pymethods]
impl PyWindowState {
    /// Allocate window buffers and compute coefficients
    ///
    /// Args:
    ///     frame_duration_ms: Frame length in milliseconds
    ///     step_duration_ms: Hop length in milliseconds
    ///     sample_rate: Sample rate in Hz
    #[new]
    #[pyo3(signature = (frame_duration_ms=25, step_duration_ms=10, sample_rate=16000))]
    pub(super) fn new(frame_duration_ms: u32, step_duration_ms: u32, sample_rate: u32) -> PyResult<Self> {
        let config = WindowConfig::new(frame_duration_ms, step_duration_ms);
        let state = WindowState::new(&config, sample_rate, &Allocator::default())
            .map_err(to_py_err)?;

        Ok(Self { state })
    }

    /// Frame length in samples
    #[getter]
    pub(super) fn size(&self) -> usize {
        self.state.size
    }

    /// Hop length in samples
    #[getter]
    fn step(&self) -> usize {
        self.state.step
    }

    /// Fixed-point window coefficients
    ///
    /// Returns:
    ///     int16 numpy array of length `size`
    pub(super) fn coefficients<'py>(&self, py: Python<'py>) -> &'py PyArray1<i16> {
        PyArray1::from_slice(py, self.state.coefficients())
    }

    /// Clear buffered samples
    fn reset(&mut self) {
        self.state.reset();
    }
}
