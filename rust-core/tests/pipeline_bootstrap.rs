//! Integration tests: bootstrapping both stages of a front-end pipeline

use micro_frontend::memory::{BoundedPool, TrackingPool};
use micro_frontend::{Allocator, ErrorKind, FftState, FixedRealFft, WindowConfig, WindowState, WINDOW_BITS};
use realfft::RealFftPlanner;
use std::sync::Arc;

#[test]
fn test_window_feeds_fft() {
    let allocator = Allocator::default();
    let window = WindowState::new(&WindowConfig::default(), 16000, &allocator).unwrap();
    let mut fft = FftState::new(window.size, &allocator, &FixedRealFft::new()).unwrap();

    assert_eq!(window.size, 400);
    assert_eq!(fft.fft_size, 512);

    // Copy a full-scale frame through the window and zero-pad the rest
    let frame: Vec<i16> = window
        .coefficients()
        .iter()
        .map(|&c| ((i32::from(i16::MAX) * i32::from(c)) >> WINDOW_BITS) as i16)
        .collect();
    let input = fft.input.as_deref_mut().unwrap();
    input[..frame.len()].copy_from_slice(&frame);
    input[frame.len()..].fill(0);

    assert!(input[400..].iter().all(|&s| s == 0));
    assert!(input[200] > 32000);
}

#[test]
fn test_bin_count_matches_realfft() {
    let mut planner = RealFftPlanner::<f32>::new();
    for input_size in [100, 400, 480, 1000] {
        let state = FftState::new(input_size, &Allocator::default(), &FixedRealFft::new()).unwrap();
        let r2c = planner.plan_fft_forward(state.fft_size);

        assert_eq!(state.bins().count(), r2c.make_output_vec().len());
        assert_eq!(state.input.as_ref().unwrap().len(), r2c.make_input_vec().len());
    }
}

#[test]
fn test_external_ram_shared_by_both_stages() {
    let external = Arc::new(BoundedPool::new("external", 2048));
    let allocator = Allocator::system().with_preferred(external.clone());

    let window = WindowState::new(&WindowConfig::default(), 16000, &allocator).unwrap();
    let fft = FftState::new(window.size, &allocator, &FixedRealFft::new()).unwrap();

    // Two 800-byte window buffers fit, everything after spills to the heap
    assert_eq!(external.used(), 1600);
    assert_eq!(fft.input.as_ref().unwrap().pool_name(), Some("system"));

    drop(window);
    drop(fft);
    assert_eq!(external.used(), 0);
}

#[test]
fn test_exhaustion_midway_through_pipeline() {
    let pool = Arc::new(TrackingPool::system().with_limit(4));
    let allocator = Allocator::new(pool.clone());

    let mut window = WindowState::default();
    let mut fft = FftState::default();

    window.populate(&WindowConfig::default(), 16000, &allocator).unwrap();
    let err = fft.populate(window.size, &allocator, &FixedRealFft::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailure);
    assert!(fft.input.is_some());
    assert!(fft.output.is_none());

    fft.free_contents();
    window.free_contents();
    assert_eq!(pool.allocations(), 4);
    assert_eq!(pool.frees(), 4);
    assert_eq!(pool.live_bytes(), 0);
}
