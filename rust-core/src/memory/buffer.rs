//! Owned, zero-initialised sample buffers
//!
//! A `Buffer` remembers the pool it came from and returns its memory there
//! on drop.

use super::pool::MemoryPool;
use std::alloc::Layout;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;
use std::sync::Arc;

/// Element types that may live in a [`Buffer`]
///
/// # Safety
/// The all-zero bit pattern must be a valid value of the type.
pub unsafe trait Sample: Copy + Send + Sync + 'static {}

unsafe impl Sample for u8 {}
unsafe impl Sample for i16 {}
unsafe impl Sample for u16 {}
unsafe impl Sample for i32 {}
unsafe impl Sample for u32 {}

/// Fixed-length buffer owned by exactly one state object
pub struct Buffer<T: Sample> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
    /// `None` for zero-sized buffers, which never touch a pool
    pool: Option<Arc<dyn MemoryPool>>,
}

// SAFETY: `Buffer` owns its memory exclusively, like `Box<[T]>`
unsafe impl<T: Sample> Send for Buffer<T> {}
unsafe impl<T: Sample> Sync for Buffer<T> {}

impl<T: Sample> Buffer<T> {
    /// Try to allocate `len` zeroed elements from `pool`
    ///
    /// # Returns
    /// `None` if the size overflows or the pool is exhausted
    pub(crate) fn allocate_in(pool: &Arc<dyn MemoryPool>, len: usize) -> Option<Self> {
        Self::allocate_aligned_in(pool, len, std::mem::align_of::<T>())
    }

    /// Like [`allocate_in`](Self::allocate_in), with at least `align` bytes
    /// of alignment
    ///
    /// A pool that hands back a pointer below the requested alignment is
    /// treated as exhausted and the memory is returned to it.
    pub(crate) fn allocate_aligned_in(pool: &Arc<dyn MemoryPool>, len: usize, align: usize) -> Option<Self> {
        let layout = Layout::array::<T>(len).ok()?.align_to(align).ok()?;
        if layout.size() == 0 {
            return Some(Self::empty());
        }

        let raw = pool.allocate(layout)?;
        if (raw.as_ptr() as usize) % layout.align() != 0 {
            log::error!(
                "{} pool returned memory aligned below {} bytes",
                pool.name(),
                layout.align()
            );
            // SAFETY: `raw` came from this pool's `allocate` with `layout`
            unsafe { pool.deallocate(raw, layout) };
            return None;
        }

        // SAFETY: the `MemoryPool` contract makes `raw` valid for
        // `layout.size()` writable bytes, and zero is a valid `T` per the
        // `Sample` contract
        unsafe { raw.as_ptr().write_bytes(0, layout.size()) };

        Some(Self {
            ptr: raw.cast(),
            len,
            layout,
            pool: Some(Arc::clone(pool)),
        })
    }

    /// Zero-length buffer that owns no memory
    pub fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            layout: Layout::new::<T>(),
            pool: None,
        }
    }

    /// Size in bytes
    pub fn byte_len(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// Name of the pool that served this buffer, if any
    pub fn pool_name(&self) -> Option<&'static str> {
        self.pool.as_ref().map(|pool| pool.name())
    }
}

impl<T: Sample> Deref for Buffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: ptr is valid for `len` initialised elements (or dangling
        // and aligned with len == 0)
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Sample> DerefMut for Buffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: as in `deref`, and `&mut self` guarantees exclusivity
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Sample> Drop for Buffer<T> {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            // SAFETY: ptr/layout are exactly what `pool.allocate` returned
            unsafe { pool.deallocate(self.ptr.cast(), self.layout) };
        }
    }
}

impl<T: Sample> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len)
            .field("pool", &self.pool_name())
            .finish()
    }
}
