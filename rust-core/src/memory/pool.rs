//! Memory pools backing front-end buffers
//!
//! A pool is a capability: hand out memory for a layout or report exhaustion.
//! Pools never panic on exhaustion, they return `None`.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Source of raw memory for [`Buffer`](super::Buffer)s
///
/// # Safety
/// A pointer returned by `allocate` must be valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and not aliased by
/// any other live allocation until it is passed to `deallocate`.
///
/// Implementing the trait therefore needs `unsafe impl`:
///
/// ```compile_fail
/// use micro_frontend::memory::MemoryPool;
/// use std::alloc::Layout;
/// use std::ptr::NonNull;
///
/// struct LyingPool;
///
/// impl MemoryPool for LyingPool {
///     fn name(&self) -> &'static str {
///         "lying"
///     }
///
///     fn allocate(&self, _layout: Layout) -> Option<NonNull<u8>> {
///         Some(NonNull::dangling())
///     }
///
///     unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
/// }
/// ```
pub unsafe trait MemoryPool: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Allocate memory for `layout`, or `None` when the pool cannot serve it.
    ///
    /// Callers never pass zero-sized layouts.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Return memory to the pool.
    ///
    /// # Safety
    /// `ptr` must have been returned by `allocate` on this same pool with
    /// the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// General-purpose heap (the global allocator)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPool;

// SAFETY: memory comes from the global allocator with the requested layout
unsafe impl MemoryPool for SystemPool {
    fn name(&self) -> &'static str {
        "system"
    }

    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: layout has a non-zero size
        NonNull::new(unsafe { alloc::alloc(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        alloc::dealloc(ptr.as_ptr(), layout);
    }
}

/// Pool with a fixed byte budget
///
/// Models a small external RAM region (e.g. PSRAM on a microcontroller).
/// Memory comes from the global allocator, but the pool refuses requests
/// once `capacity` bytes are outstanding.
#[derive(Debug)]
pub struct BoundedPool {
    name: &'static str,
    capacity: usize,
    used: AtomicUsize,
}

impl BoundedPool {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            used: AtomicUsize::new(0),
        }
    }

    /// Total budget in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently handed out
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    /// Bytes still available
    pub fn available(&self) -> usize {
        self.capacity - self.used()
    }

    fn reserve(&self, bytes: usize) -> bool {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes).filter(|&total| total <= self.capacity)
            })
            .is_ok()
    }
}

// SAFETY: memory comes from the global allocator with the requested layout
unsafe impl MemoryPool for BoundedPool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if !self.reserve(layout.size()) {
            return None;
        }
        let ptr = SystemPool.allocate(layout);
        if ptr.is_none() {
            self.used.fetch_sub(layout.size(), Ordering::AcqRel);
        }
        ptr
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        SystemPool.deallocate(ptr, layout);
        self.used.fetch_sub(layout.size(), Ordering::AcqRel);
    }
}

/// Instrumented wrapper around another pool
///
/// Counts allocations, frees and live bytes, and can be limited to a fixed
/// number of successful allocations to simulate exhaustion at a chosen step.
pub struct TrackingPool {
    inner: Arc<dyn MemoryPool>,
    max_allocations: Option<usize>,
    attempts: AtomicUsize,
    allocations: AtomicUsize,
    frees: AtomicUsize,
    live_bytes: AtomicUsize,
}

impl TrackingPool {
    pub fn new(inner: Arc<dyn MemoryPool>) -> Self {
        Self {
            inner,
            max_allocations: None,
            attempts: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
        }
    }

    /// Wrap the system heap
    pub fn system() -> Self {
        Self::new(Arc::new(SystemPool))
    }

    /// Serve at most `max_allocations` requests; every later request fails.
    ///
    /// `with_limit(1)` makes the second allocation of an init fail.
    pub fn with_limit(mut self, max_allocations: usize) -> Self {
        self.max_allocations = Some(max_allocations);
        self
    }

    /// Allocation requests seen, including refused ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Acquire)
    }

    /// Successful allocations
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Acquire)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::Acquire)
    }

    /// Allocations not yet returned
    pub fn live_allocations(&self) -> usize {
        self.allocations() - self.frees()
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Acquire)
    }
}

// SAFETY: forwards to `inner`, which upholds the contract
unsafe impl MemoryPool for TrackingPool {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        let attempt = self.attempts.fetch_add(1, Ordering::AcqRel);
        if self.max_allocations.is_some_and(|max| attempt >= max) {
            return None;
        }
        let ptr = self.inner.allocate(layout)?;
        self.allocations.fetch_add(1, Ordering::AcqRel);
        self.live_bytes.fetch_add(layout.size(), Ordering::AcqRel);
        Some(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.inner.deallocate(ptr, layout);
        self.frees.fetch_add(1, Ordering::AcqRel);
        self.live_bytes.fetch_sub(layout.size(), Ordering::AcqRel);
    }
}
