//! Window stage state: frame buffers and coefficient table

use super::coefficients::fill_hann;
use super::config::WindowConfig;
use crate::error::Result;
use crate::memory::{Allocator, Buffer};

/// Frame-sized buffers plus a precomputed window
///
/// Like [`FftState`](crate::spectrum::FftState), a failed init keeps the
/// buffers allocated before the failing step until
/// [`free_contents`](Self::free_contents) or drop.
#[derive(Debug, Default)]
pub struct WindowState {
    /// Frame length in samples
    pub size: usize,

    /// Hop length in samples
    pub step: usize,

    /// `size` fixed-point Hann coefficients, read-only after init
    pub coefficients: Option<Buffer<i16>>,

    /// Samples accumulated for the next frame
    pub input: Option<Buffer<i16>>,

    /// Windowed frame
    pub output: Option<Buffer<i16>>,

    /// Valid samples currently held in `input`
    pub input_used: usize,
}

impl WindowState {
    /// Allocate buffers and compute the window for `sample_rate`
    pub fn new(config: &WindowConfig, sample_rate: u32, allocator: &Allocator) -> Result<Self> {
        let mut state = Self::default();
        state.populate(config, sample_rate, allocator)?;
        Ok(state)
    }

    /// Size, allocate and fill in place
    ///
    /// Degenerate configurations (empty frames, hop longer than the frame)
    /// are accepted and only logged.
    pub fn populate(&mut self, config: &WindowConfig, sample_rate: u32, allocator: &Allocator) -> Result<()> {
        self.size = config.frame_samples(sample_rate);
        self.step = config.step_samples(sample_rate);

        if self.size == 0 {
            log::warn!(
                "{} ms at {} Hz gives an empty window",
                config.frame_duration_ms,
                sample_rate
            );
        } else if self.step > self.size {
            log::warn!("Window step ({}) exceeds window size ({})", self.step, self.size);
        }

        let coefficients = self
            .coefficients
            .insert(allocator.allocate(self.size, "window coefficients")?);
        fill_hann(coefficients);

        self.input = Some(allocator.allocate(self.size, "window input")?);
        self.output = Some(allocator.allocate(self.size, "window output")?);
        self.input_used = 0;

        log::debug!(
            "Window state ready: {} samples, step {} at {} Hz",
            self.size,
            self.step,
            sample_rate
        );
        Ok(())
    }

    /// Release coefficients, input and output buffers
    pub fn free_contents(&mut self) {
        self.coefficients = None;
        self.input = None;
        self.output = None;
    }

    /// Clear buffered samples, keeping the coefficient table
    pub fn reset(&mut self) {
        for buffer in [self.input.as_deref_mut(), self.output.as_deref_mut()].into_iter().flatten() {
            buffer.fill(0);
        }
        self.input_used = 0;
    }

    pub fn coefficients(&self) -> &[i16] {
        self.coefficients.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, FrontendError};
    use crate::memory::{BoundedPool, TrackingPool};
    use crate::window::coefficients::{hann_coefficient, WINDOW_UNITY};
    use std::sync::Arc;

    #[test]
    fn test_default_config_at_16khz() {
        let state = WindowState::new(&WindowConfig::default(), 16000, &Allocator::default()).unwrap();

        assert_eq!(state.size, 400);
        assert_eq!(state.step, 160);
        assert_eq!(state.coefficients().len(), 400);
        assert!(state.coefficients().iter().all(|&c| (0..=WINDOW_UNITY).contains(&c)));
        assert_eq!(state.input.as_ref().unwrap().len(), 400);
        assert_eq!(state.output.as_ref().unwrap().len(), 400);
        assert_eq!(state.input_used, 0);
    }

    #[test]
    fn test_coefficients_follow_formula() {
        let config = WindowConfig::new(30, 10);
        for sample_rate in [8000, 16000, 44100] {
            let state = WindowState::new(&config, sample_rate, &Allocator::default()).unwrap();
            let size = state.size;
            for index in [0, size / 3, size / 2, size - 1] {
                assert_eq!(state.coefficients()[index], hann_coefficient(index, size));
            }
        }
    }

    #[test]
    fn test_second_allocation_failure_keeps_coefficients() {
        let pool = Arc::new(TrackingPool::system().with_limit(1));
        let allocator = Allocator::new(pool.clone());
        let mut state = WindowState::default();

        let err = state
            .populate(&WindowConfig::default(), 16000, &allocator)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AllocationFailure);
        assert_eq!(
            err,
            FrontendError::Allocation {
                buffer: "window input",
                bytes: 800
            }
        );

        assert_eq!(state.coefficients().len(), 400);
        assert!(state.input.is_none());
        assert!(state.output.is_none());

        state.free_contents();
        assert_eq!(pool.frees(), 1);
        assert_eq!(pool.live_allocations(), 0);
    }

    #[test]
    fn test_output_allocation_failure() {
        let pool = Arc::new(TrackingPool::system().with_limit(2));
        let allocator = Allocator::new(pool.clone());
        let mut state = WindowState::default();

        let err = state
            .populate(&WindowConfig::default(), 8000, &allocator)
            .unwrap_err();
        assert_eq!(
            err,
            FrontendError::Allocation {
                buffer: "window output",
                bytes: 400
            }
        );
        assert!(state.input.is_some());

        state.free_contents();
        state.free_contents();
        assert_eq!(pool.frees(), 2);
    }

    #[test]
    fn test_preferred_pool_spills_to_heap() {
        // Room for the coefficient table only
        let external = Arc::new(BoundedPool::new("external", 800));
        let allocator = Allocator::system().with_preferred(external.clone());

        let state = WindowState::new(&WindowConfig::default(), 16000, &allocator).unwrap();
        assert_eq!(state.coefficients.as_ref().unwrap().pool_name(), Some("external"));
        assert_eq!(state.input.as_ref().unwrap().pool_name(), Some("system"));
        assert_eq!(state.output.as_ref().unwrap().pool_name(), Some("system"));

        drop(state);
        assert_eq!(external.used(), 0);
    }

    #[test]
    fn test_degenerate_window_is_not_rejected() {
        let state = WindowState::new(&WindowConfig::default(), 10, &Allocator::default()).unwrap();
        assert_eq!(state.size, 0);
        assert!(state.coefficients().is_empty());
    }

    #[test]
    fn test_reset_keeps_coefficients() {
        let mut state = WindowState::new(&WindowConfig::default(), 16000, &Allocator::default()).unwrap();
        let table = state.coefficients().to_vec();

        state.input.as_deref_mut().unwrap()[..160].fill(1000);
        state.input_used = 160;
        state.reset();

        assert_eq!(state.input_used, 0);
        assert!(state.input.as_deref().unwrap().iter().all(|&s| s == 0));
        assert_eq!(state.coefficients(), &table[..]);
    }
}
