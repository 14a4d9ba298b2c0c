// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ptr::NonNull;
use std::sync::Arc;

use crate::Result;
use crate::pool::MemoryPool;

/// Owns one region of pooled storage, paired with the pool that produced it.
///
/// The pointer, the capacity and the pool handle travel together so that the region
/// can only ever be released through the pool that allocated it, with the exact
/// capacity that was allocated. [`drop()`][Drop] is the single code path that calls
/// [`MemoryPool::free()`], which is what makes the pool's byte-accurate accounting
/// trustworthy.
///
/// An `Arc<Allocation>` is the shared-ownership substrate behind every buffer:
/// buffers and views hold clones of the `Arc`, and the storage is returned to the
/// pool when the last holder drops.
#[derive(Debug)]
pub(crate) struct Allocation {
    ptr: NonNull<u8>,
    capacity: usize,
    pool: Arc<dyn MemoryPool>,
}

impl Allocation {
    /// Allocates `capacity` zeroed bytes from `pool`.
    ///
    /// `capacity` must be non-zero; zero-capacity buffers hold no allocation at all.
    pub(crate) fn new(pool: &Arc<dyn MemoryPool>, capacity: usize) -> Result<Self> {
        debug_assert!(capacity > 0, "zero-capacity buffers must not allocate");

        let ptr = pool.allocate(capacity)?;

        Ok(Self {
            ptr,
            capacity,
            pool: Arc::clone(pool),
        })
    }

    pub(crate) fn ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for Allocation {
    #[cfg_attr(test, mutants::skip)] // Mutations can violate memory safety and cause UB.
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `pool.allocate(capacity)` with this exact capacity,
        // and this destructor runs exactly once.
        unsafe { self.pool.free(self.ptr, self.capacity) };
    }
}

// SAFETY: The region is plain bytes obtained from a thread-safe pool. Which thread
// reads or writes the bytes is governed by the buffer types above this one; the
// handle itself only carries the pointer and releases it once, from whichever
// thread drops last.
unsafe impl Send for Allocation {}

// SAFETY: See above - `&Allocation` exposes nothing but the pointer value and the
// capacity, both immutable after construction.
unsafe impl Sync for Allocation {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SystemPool;

    #[test]
    fn drop_releases_exactly_the_allocated_capacity() {
        let pool: Arc<dyn MemoryPool> = Arc::new(SystemPool::new());

        let allocation = Allocation::new(&pool, 192).expect("system-backed allocation failed");
        assert_eq!(allocation.capacity(), 192);
        assert_eq!(pool.bytes_allocated(), 192);

        drop(allocation);
        assert_eq!(pool.bytes_allocated(), 0);
    }

    #[test]
    fn shared_holders_release_only_on_last_drop() {
        let pool: Arc<dyn MemoryPool> = Arc::new(SystemPool::new());

        let first = Arc::new(Allocation::new(&pool, 64).expect("system-backed allocation failed"));
        let second = Arc::clone(&first);

        drop(first);
        assert_eq!(pool.bytes_allocated(), 64);

        drop(second);
        assert_eq!(pool.bytes_allocated(), 0);
    }
}
