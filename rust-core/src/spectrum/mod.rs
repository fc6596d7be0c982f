//! Spectral stage bootstrap: FFT buffers and plan memory

pub mod fft;
pub mod plan;

pub use fft::{fft_size_for, FftState, SCRATCH_ALIGN};
pub use plan::{FftLibrary, FixedRealFft, PlanHandle, PlanView, ScratchQuery};
