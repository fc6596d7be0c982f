//! Allocation policy for front-end buffers
//!
//! Every buffer is requested from a preferred pool first (typically slower
//! external RAM) and from the fallback pool when the preferred one is absent
//! or exhausted. Which pools exist is decided when the [`Allocator`] is
//! built, not at each call site.

pub mod buffer;
pub mod pool;

pub use buffer::{Buffer, Sample};
pub use pool::{BoundedPool, MemoryPool, SystemPool, TrackingPool};

use crate::error::{FrontendError, Result};
use std::sync::Arc;

/// Memory layout configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    /// Size of the external RAM region to prefer, `None` for heap only
    pub external_ram_bytes: Option<usize>,
}

/// Preferred-then-fallback allocation strategy
#[derive(Clone)]
pub struct Allocator {
    preferred: Option<Arc<dyn MemoryPool>>,
    fallback: Arc<dyn MemoryPool>,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::system()
    }
}

impl Allocator {
    /// Heap only, no preferred pool
    pub fn system() -> Self {
        Self::new(Arc::new(SystemPool))
    }

    /// Allocator serving everything from `fallback`
    pub fn new(fallback: Arc<dyn MemoryPool>) -> Self {
        Self {
            preferred: None,
            fallback,
        }
    }

    /// Try `pool` before the fallback pool
    pub fn with_preferred(mut self, pool: Arc<dyn MemoryPool>) -> Self {
        self.preferred = Some(pool);
        self
    }

    /// Build the allocator described by `config`
    pub fn from_config(config: &MemoryConfig) -> Self {
        let allocator = Self::system();
        match config.external_ram_bytes {
            Some(capacity) => allocator.with_preferred(Arc::new(BoundedPool::new("external", capacity))),
            None => allocator,
        }
    }

    pub fn preferred_pool(&self) -> Option<&'static str> {
        self.preferred.as_ref().map(|pool| pool.name())
    }

    pub fn fallback_pool(&self) -> &'static str {
        self.fallback.name()
    }

    /// Allocate `len` zeroed elements
    ///
    /// # Arguments
    /// * `len` - Number of elements
    /// * `label` - Buffer name for diagnostics
    pub fn allocate<T: Sample>(&self, len: usize, label: &'static str) -> Result<Buffer<T>> {
        self.allocate_aligned(len, std::mem::align_of::<T>(), label)
    }

    /// Allocate `len` zeroed elements aligned to at least `align` bytes
    ///
    /// `align` must be a power of two; other values fail as an allocation
    /// error.
    pub fn allocate_aligned<T: Sample>(&self, len: usize, align: usize, label: &'static str) -> Result<Buffer<T>> {
        let bytes = len.saturating_mul(std::mem::size_of::<T>());

        if let Some(pool) = &self.preferred {
            if let Some(buffer) = Buffer::allocate_aligned_in(pool, len, align) {
                return Ok(buffer);
            }
            log::debug!(
                "{} pool cannot hold {} ({} bytes), falling back to {}",
                pool.name(),
                label,
                bytes,
                self.fallback.name()
            );
        }

        Buffer::allocate_aligned_in(&self.fallback, len, align).ok_or_else(|| {
            log::error!("Failed to alloc {} ({} bytes)", label, bytes);
            FrontendError::Allocation { buffer: label, bytes }
        })
    }
}
