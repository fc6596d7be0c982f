//! PyO3 bindings for Python integration

use pyo3::prelude::*;
use crate::error::{ErrorKind, FrontendError};

mod spectrum_bindings;
mod window_bindings;

/// Map init failures onto Python exceptions
fn to_py_err(err: FrontendError) -> PyErr {
    match err.kind() {
        ErrorKind::AllocationFailure => {
            PyErr::new::<pyo3::exceptions::PyMemoryError, _>(err.to_string())
        }
        ErrorKind::LibraryContractViolation => {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(err.to_string())
        }
    }
}

/// Python module definition
#[pymodule]
fn micro_frontend(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<window_bindings::PyWindowState>()?;
    m.add_class::<spectrum_bindings::PyFftState>()?;

    m.add("WINDOW_BITS", crate::window::WINDOW_BITS)?;

    Ok(())
}
