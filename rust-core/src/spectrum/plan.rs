//! FFT library contract and a fixed-point real FFT planner
//!
//! Libraries are driven in two phases: a sizing call that reports how much
//! scratch memory a plan needs (and must not produce a plan), then an init
//! call that builds the plan inside caller-provided scratch and returns a
//! handle equal to that scratch address.

use num_complex::Complex;
use std::f64::consts::PI;
use std::num::NonZeroUsize;

/// Plan handle returned by an [`FftLibrary`]
///
/// Carries only the address of the plan, so it can be compared against the
/// scratch buffer the plan was supposed to live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanHandle(Option<NonZeroUsize>);

impl PlanHandle {
    /// Sentinel for "no plan configured"
    pub const NOT_CONFIGURED: PlanHandle = PlanHandle(None);

    pub fn from_ptr(ptr: *const u8) -> Self {
        PlanHandle(NonZeroUsize::new(ptr as usize))
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    /// Plan address, 0 for the sentinel
    pub fn addr(&self) -> usize {
        self.0.map_or(0, NonZeroUsize::get)
    }
}

/// Result of the sizing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchQuery {
    /// Must be [`PlanHandle::NOT_CONFIGURED`]
    pub handle: PlanHandle,

    /// Scratch bytes needed by `init_plan`
    pub required_bytes: usize,
}

/// External real-FFT library, as seen by the front-end
pub trait FftLibrary {
    /// Report scratch requirements for a real transform of `transform_len`
    fn size_scratch(&self, transform_len: usize) -> ScratchQuery;

    /// Configure a plan entirely inside `scratch`
    ///
    /// # Returns
    /// Handle whose address equals `scratch.as_ptr()` on success
    fn init_plan(&self, transform_len: usize, scratch: &mut [u8]) -> PlanHandle;
}

/// Marks the start of a [`FixedRealFft`] plan
pub const PLAN_MAGIC: u32 = 0x4B46_5231;

/// Capacity of the radix factor table
pub const MAX_FACTORS: usize = 32;

/// Full-scale value of Q15 twiddles
const Q15_MAX: f64 = 32767.0;

const HEADER_BYTES: usize = 16;
const FACTOR_BYTES: usize = MAX_FACTORS * 2 * 4;
const COMPLEX_BYTES: usize = 4;

/// Byte offsets of a plan laid out in scratch memory
#[derive(Debug, Clone, Copy)]
struct PlanLayout {
    nfft: usize,
    ncfft: usize,
    twiddles_at: usize,
    super_twiddles_at: usize,
    temp_at: usize,
    total: usize,
}

impl PlanLayout {
    /// Real transforms are computed as a half-length complex transform, so
    /// only even, non-zero lengths can be planned.
    fn for_length(nfft: usize) -> Option<Self> {
        if nfft == 0 || nfft % 2 != 0 || u32::try_from(nfft).is_err() {
            return None;
        }
        let ncfft = nfft / 2;

        let twiddles_at = HEADER_BYTES + FACTOR_BYTES;
        let super_twiddles_at = twiddles_at + ncfft * COMPLEX_BYTES;
        let temp_at = super_twiddles_at + (ncfft / 2) * COMPLEX_BYTES;
        let total = temp_at + ncfft * COMPLEX_BYTES;

        Some(Self {
            nfft,
            ncfft,
            twiddles_at,
            super_twiddles_at,
            temp_at,
            total,
        })
    }
}

/// Fixed-point (Q15) real FFT planner using kissfft's memory strategy
///
/// This is the reference [`FftLibrary`]: the default library behind
/// [`FftState`](super::FftState) and the Python bindings. It only builds
/// plans; running the transform is left to the executor that consumes the
/// plan, which reads the tables back through [`PlanView`].
///
/// Plan layout inside scratch:
/// header (magic, nfft, ncfft, factor count), factor table of
/// `(radix, remaining)` pairs, `ncfft` twiddles, `ncfft / 2` real-split
/// twiddles, and `ncfft` complex temporary slots.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedRealFft;

impl FixedRealFft {
    pub fn new() -> Self {
        Self
    }

    /// Read back a plan written by [`FftLibrary::init_plan`]
    pub fn view(scratch: &[u8]) -> Option<PlanView<'_>> {
        if scratch.len() < HEADER_BYTES || read_u32(scratch, 0) != PLAN_MAGIC {
            return None;
        }
        let layout = PlanLayout::for_length(read_u32(scratch, 4) as usize)?;
        if scratch.len() < layout.total {
            return None;
        }
        Some(PlanView { bytes: scratch, layout })
    }
}

impl FftLibrary for FixedRealFft {
    fn size_scratch(&self, transform_len: usize) -> ScratchQuery {
        ScratchQuery {
            handle: PlanHandle::NOT_CONFIGURED,
            required_bytes: PlanLayout::for_length(transform_len).map_or(0, |layout| layout.total),
        }
    }

    fn init_plan(&self, transform_len: usize, scratch: &mut [u8]) -> PlanHandle {
        let Some(layout) = PlanLayout::for_length(transform_len) else {
            log::error!("Real FFT length must be even and non-zero (got {})", transform_len);
            return PlanHandle::NOT_CONFIGURED;
        };
        if scratch.len() < layout.total {
            return PlanHandle::NOT_CONFIGURED;
        }

        let factors = factor(layout.ncfft);
        write_u32(scratch, 0, PLAN_MAGIC);
        write_u32(scratch, 4, layout.nfft as u32);
        write_u32(scratch, 8, layout.ncfft as u32);
        write_u32(scratch, 12, factors.len() as u32);
        for (i, &(radix, remaining)) in factors.iter().enumerate() {
            write_u32(scratch, HEADER_BYTES + i * 8, radix);
            write_u32(scratch, HEADER_BYTES + i * 8 + 4, remaining);
        }

        for i in 0..layout.ncfft {
            let phase = -2.0 * PI * i as f64 / layout.ncfft as f64;
            write_complex(scratch, layout.twiddles_at + i * COMPLEX_BYTES, q15_cexp(phase));
        }

        for i in 0..layout.ncfft / 2 {
            let phase = -PI * ((i + 1) as f64 / layout.ncfft as f64 + 0.5);
            write_complex(scratch, layout.super_twiddles_at + i * COMPLEX_BYTES, q15_cexp(phase));
        }

        scratch[layout.temp_at..layout.total].fill(0);

        PlanHandle::from_ptr(scratch.as_ptr())
    }
}

/// Read-only view of a configured [`FixedRealFft`] plan
///
/// Gives a transform executor (or a test) access to the factor and twiddle
/// tables without knowing the byte layout.
#[derive(Debug, Clone, Copy)]
pub struct PlanView<'a> {
    bytes: &'a [u8],
    layout: PlanLayout,
}

impl PlanView<'_> {
    /// Real transform length
    pub fn nfft(&self) -> usize {
        self.layout.nfft
    }

    /// Length of the inner complex transform
    pub fn ncfft(&self) -> usize {
        self.layout.ncfft
    }

    /// `(radix, remaining length)` stages of the complex transform
    pub fn factors(&self) -> Vec<(u32, u32)> {
        let count = (read_u32(self.bytes, 12) as usize).min(MAX_FACTORS);
        (0..count)
            .map(|i| {
                (
                    read_u32(self.bytes, HEADER_BYTES + i * 8),
                    read_u32(self.bytes, HEADER_BYTES + i * 8 + 4),
                )
            })
            .collect()
    }

    pub fn twiddle(&self, index: usize) -> Option<Complex<i16>> {
        (index < self.layout.ncfft)
            .then(|| read_complex(self.bytes, self.layout.twiddles_at + index * COMPLEX_BYTES))
    }

    /// Twiddles used to split the half-length complex result into real bins
    pub fn super_twiddle(&self, index: usize) -> Option<Complex<i16>> {
        (index < self.layout.ncfft / 2)
            .then(|| read_complex(self.bytes, self.layout.super_twiddles_at + index * COMPLEX_BYTES))
    }
}

/// Radix decomposition, radix 4 first, then 2, then odd radices
fn factor(mut n: usize) -> Vec<(u32, u32)> {
    let floor_sqrt = (n as f64).sqrt().floor() as usize;
    let mut p = 4;
    let mut factors = Vec::new();

    while n > 1 {
        while n % p != 0 {
            p = match p {
                4 => 2,
                2 => 3,
                _ => p + 2,
            };
            if p > floor_sqrt {
                p = n;
            }
        }
        n /= p;
        factors.push((p as u32, n as u32));
    }

    factors
}

fn q15(x: f64) -> i16 {
    (Q15_MAX * x + 0.5).floor() as i16
}

fn q15_cexp(phase: f64) -> Complex<i16> {
    Complex::new(q15(phase.cos()), q15(phase.sin()))
}

fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_ne_bytes(raw)
}

fn write_complex(bytes: &mut [u8], offset: usize, value: Complex<i16>) {
    bytes[offset..offset + 2].copy_from_slice(&value.re.to_ne_bytes());
    bytes[offset + 2..offset + 4].copy_from_slice(&value.im.to_ne_bytes());
}

fn read_complex(bytes: &[u8], offset: usize) -> Complex<i16> {
    let re = i16::from_ne_bytes([bytes[offset], bytes[offset + 1]]);
    let im = i16::from_ne_bytes([bytes[offset + 2], bytes[offset + 3]]);
    Complex::new(re, im)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(nfft: usize) -> Vec<u8> {
        let lib = FixedRealFft::new();
        let query = lib.size_scratch(nfft);
        let mut scratch = vec![0u8; query.required_bytes];
        let handle = lib.init_plan(nfft, &mut scratch);
        assert_eq!(handle.addr(), scratch.as_ptr() as usize);
        scratch
    }

    #[test]
    fn test_sizing_never_returns_plan() {
        let lib = FixedRealFft::new();
        for nfft in [2, 8, 512, 4096] {
            let query = lib.size_scratch(nfft);
            assert_eq!(query.handle, PlanHandle::NOT_CONFIGURED);
            assert!(query.required_bytes > 0);
        }
    }

    #[test]
    fn test_scratch_size_for_512() {
        // 16 header + 256 factors + 256 twiddles + 128 super twiddles + 256 temp
        let query = FixedRealFft::new().size_scratch(512);
        assert_eq!(query.required_bytes, 16 + 256 + 256 * 4 + 128 * 4 + 256 * 4);
    }

    #[test]
    fn test_plan_lives_in_scratch() {
        let scratch = configured(512);
        let view = FixedRealFft::view(&scratch).expect("valid plan");

        assert_eq!(view.nfft(), 512);
        assert_eq!(view.ncfft(), 256);
        assert_eq!(view.factors(), vec![(4, 64), (4, 16), (4, 4), (4, 1)]);
    }

    #[test]
    fn test_factors_with_trailing_radix_2() {
        let scratch = configured(256);
        let view = FixedRealFft::view(&scratch).unwrap();
        assert_eq!(view.factors(), vec![(4, 32), (4, 8), (4, 2), (2, 1)]);
    }

    #[test]
    fn test_twiddles_q15() {
        let scratch = configured(64);
        let view = FixedRealFft::view(&scratch).unwrap();

        // ncfft = 32: twiddle k = exp(-2πik/32)
        assert_eq!(view.twiddle(0), Some(Complex::new(32767, 0)));
        assert_eq!(view.twiddle(8), Some(Complex::new(0, -32767)));
        assert_eq!(view.twiddle(16), Some(Complex::new(-32767, 0)));
        assert_eq!(view.twiddle(32), None);

        // super twiddle 15 = exp(-πi(16/32 + 0.5)) = exp(-πi) = -1
        assert_eq!(view.super_twiddle(15), Some(Complex::new(-32767, 0)));
        assert_eq!(view.super_twiddle(16), None);
    }

    #[test]
    fn test_odd_and_zero_lengths_rejected() {
        let lib = FixedRealFft::new();
        for nfft in [0, 1, 7] {
            let query = lib.size_scratch(nfft);
            assert_eq!(query.required_bytes, 0);

            let mut scratch = vec![0u8; 64];
            assert_eq!(lib.init_plan(nfft, &mut scratch), PlanHandle::NOT_CONFIGURED);
        }
    }

    #[test]
    fn test_short_scratch_rejected() {
        let lib = FixedRealFft::new();
        let needed = lib.size_scratch(128).required_bytes;
        let mut scratch = vec![0u8; needed - 1];
        assert!(!lib.init_plan(128, &mut scratch).is_configured());
        assert!(FixedRealFft::view(&scratch).is_none());
    }

    #[test]
    fn test_handle_addresses() {
        assert_eq!(PlanHandle::NOT_CONFIGURED.addr(), 0);
        assert_eq!(PlanHandle::from_ptr(std::ptr::null()), PlanHandle::NOT_CONFIGURED);

        let byte = 0u8;
        let handle = PlanHandle::from_ptr(&byte);
        assert!(handle.is_configured());
        assert_eq!(handle.addr(), &byte as *const u8 as usize);
    }
}
