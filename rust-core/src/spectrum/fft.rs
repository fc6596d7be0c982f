//! FFT working buffers for fixed-point spectral analysis
//!
//! Sizes the real FFT to a power of two and negotiates scratch memory with
//! the FFT library so the plan lives entirely in memory owned here.

use super::plan::{FftLibrary, PlanHandle};
use crate::error::{ContractViolation, FrontendError, Result};
use crate::memory::{Allocator, Buffer};
use num_complex::Complex;

/// Alignment of scratch memory handed to the FFT library, enough for any
/// plan struct it places there
pub const SCRATCH_ALIGN: usize = 16;

/// Smallest power of two that holds `input_size` samples
///
/// `0` maps to `1`. Returns `None` only if the result does not fit in `usize`.
pub fn fft_size_for(input_size: usize) -> Option<usize> {
    input_size.checked_next_power_of_two()
}

/// Buffers and plan memory for one real FFT
///
/// A failed [`populate`](Self::populate) keeps the buffers allocated before
/// the failing step; call [`free_contents`](Self::free_contents) (or drop the
/// state) after any init attempt.
#[derive(Debug, Default)]
pub struct FftState {
    /// Requested logical size (e.g. window length)
    pub input_size: usize,

    /// Transform length, a power of two >= `input_size`
    pub fft_size: usize,

    /// `fft_size` samples; samples past `input_size` are zero padding
    /// the caller writes before each transform
    pub input: Option<Buffer<i16>>,

    /// `fft_size / 2 + 1` complex bins, interleaved re/im
    pub output: Option<Buffer<i16>>,

    /// Plan memory handed to the FFT library
    pub scratch: Option<Buffer<u8>>,

    /// Scratch bytes requested by the FFT library
    pub scratch_size: usize,

    plan: PlanHandle,
}

impl FftState {
    /// Allocate and plan a new FFT state
    ///
    /// # Arguments
    /// * `input_size` - Number of samples per transform before padding
    /// * `allocator` - Pool policy for all buffers
    /// * `library` - FFT library that will own the plan
    pub fn new<L: FftLibrary + ?Sized>(input_size: usize, allocator: &Allocator, library: &L) -> Result<Self> {
        let mut state = Self::default();
        state.populate(input_size, allocator, library)?;
        Ok(state)
    }

    /// Size, allocate and plan in place
    pub fn populate<L: FftLibrary + ?Sized>(
        &mut self,
        input_size: usize,
        allocator: &Allocator,
        library: &L,
    ) -> Result<()> {
        self.input_size = input_size;
        self.fft_size = fft_size_for(input_size).ok_or_else(|| {
            log::error!("FFT size for {} samples overflows", input_size);
            FrontendError::Allocation {
                buffer: "fft input buffer",
                bytes: usize::MAX,
            }
        })?;

        self.input = Some(allocator.allocate(self.fft_size, "fft input buffer")?);
        self.output = Some(allocator.allocate(2 * self.num_bins(), "fft output buffer")?);

        // Ask the library how much memory it wants. A real plan here means
        // it did not follow the sizing protocol.
        let query = library.size_scratch(self.fft_size);
        if query.handle.is_configured() {
            log::error!("FFT memory sizing failed for length {}", self.fft_size);
            return Err(ContractViolation::SizingReturnedPlan {
                transform_len: self.fft_size,
            }
            .into());
        }

        let scratch = self
            .scratch
            .insert(allocator.allocate_aligned(query.required_bytes, SCRATCH_ALIGN, "fft scratch buffer")?);
        self.scratch_size = query.required_bytes;

        // Let the library configure the scratch space we just allocated
        self.plan = library.init_plan(self.fft_size, scratch);
        if self.plan.addr() != scratch.as_ptr() as usize {
            log::error!("FFT memory preallocation strategy failed for length {}", self.fft_size);
            return Err(ContractViolation::PlanOutsideScratch {
                transform_len: self.fft_size,
            }
            .into());
        }

        log::debug!(
            "FFT state ready: {} samples -> {} point transform, {} scratch bytes",
            self.input_size,
            self.fft_size,
            self.scratch_size
        );
        Ok(())
    }

    /// Release input, output and scratch buffers
    ///
    /// Buffers that were never allocated are skipped, and calling this again
    /// is a no-op.
    pub fn free_contents(&mut self) {
        self.input = None;
        self.output = None;
        self.scratch = None;
        self.plan = PlanHandle::NOT_CONFIGURED;
    }

    /// Zero the input and output buffers
    pub fn reset(&mut self) {
        for buffer in [self.input.as_deref_mut(), self.output.as_deref_mut()].into_iter().flatten() {
            buffer.fill(0);
        }
    }

    /// Number of complex bins produced by a real transform
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Output buffer viewed as complex bins
    pub fn bins(&self) -> impl Iterator<Item = Complex<i16>> + '_ {
        self.output
            .as_deref()
            .unwrap_or(&[])
            .chunks_exact(2)
            .map(|pair| Complex::new(pair[0], pair[1]))
    }

    /// Plan handle returned by the library, or the sentinel before a
    /// successful init
    pub fn plan_handle(&self) -> PlanHandle {
        self.plan
    }

    /// True once every buffer is allocated and the plan is in scratch
    pub fn is_ready(&self) -> bool {
        self.input.is_some() && self.output.is_some() && self.scratch.is_some() && self.plan.is_configured()
    }
}
