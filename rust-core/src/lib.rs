//! Micro Frontend Core - fixed-point audio front-end bootstrap
//!
//! Sizes and allocates the buffers of a windowed FFT pipeline and
//! precomputes fixed-point window coefficients, once per configuration.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod error;
pub mod memory;
pub mod spectrum;
pub mod window;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use error::{ContractViolation, ErrorKind, FrontendError, Result};
pub use memory::{Allocator, Buffer, MemoryConfig, MemoryPool};
pub use spectrum::{FftLibrary, FftState, FixedRealFft, PlanHandle};
pub use window::{WindowConfig, WindowState, WINDOW_BITS};
