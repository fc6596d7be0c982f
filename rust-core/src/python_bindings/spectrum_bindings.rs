//! Python bindings for the spectral stage

use pyo3::prelude::*;
use crate::memory::Allocator;
use crate::spectrum::{FftState, FixedRealFft};
use super::to_py_err;

/// FFT state exposed to Python
#[pyclass(name = "FftState")]
pub struct PyFftState {
    state: FftState,
}

#[pymethods]
impl PyFftState {
    /// Allocate FFT buffers and plan memory
    ///
    /// Args:
    ///     input_size: Samples per transform before zero padding
    #[new]
    pub(super) fn new(input_size: usize) -> PyResult<Self> {
        let state = FftState::new(input_size, &Allocator::default(), &FixedRealFft::new())
            .map_err(to_py_err)?;

        Ok(Self { state })
    }

    #[getter]
    fn input_size(&self) -> usize {
        self.state.input_size
    }

    /// Transform length (power of two)
    #[getter]
    pub(super) fn fft_size(&self) -> usize {
        self.state.fft_size
    }

    /// Number of complex output bins
    #[getter]
    pub(super) fn num_bins(&self) -> usize {
        self.state.num_bins()
    }

    /// Plan memory in bytes
    #[getter]
    fn scratch_size(&self) -> usize {
        self.state.scratch_size
    }

    /// Zero input and output buffers
    fn reset(&mut self) {
        self.state.reset();
    }
}
