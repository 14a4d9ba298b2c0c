// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use nm::{Event, Magnitude};

use crate::pool::MemoryPool;
use crate::{ALLOCATION_ALIGNMENT, MemoryError, Result};

/// A memory pool that obtains memory from the Rust global allocator.
///
/// This is the default pool implementation. It performs no pooling or placement
/// strategy of its own - every allocation goes straight to the system allocator -
/// but it keeps byte-accurate accounting so callers can observe live usage and the
/// high-water mark.
///
/// Prefer constructing a pool explicitly and injecting it where buffers are created.
/// When there is no pool to inject, [`default_pool()`] provides a lazily initialized
/// process-wide instance.
#[derive(Debug, Default)]
pub struct SystemPool {
    bytes_allocated: AtomicUsize,
    max_memory: AtomicUsize,
}

impl SystemPool {
    /// Creates a new pool with empty accounting.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryPool for SystemPool {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        ALLOCATION_REQUESTED_SIZE.with(|e| e.observe(size));

        if size == 0 {
            return Ok(NonNull::dangling());
        }

        let Ok(layout) = Layout::from_size_align(size, ALLOCATION_ALIGNMENT) else {
            // The size is too large to describe as a layout; report it the same way
            // as an allocator refusal, which is what it would become anyway.
            return Err(MemoryError::OutOfMemory { requested: size });
        };

        // Buffers hand out `&[u8]` over this capacity, so it must start initialized.
        //
        // SAFETY: The layout has non-zero size (guarded above).
        let ptr = unsafe { alloc::alloc_zeroed(layout) };

        let Some(ptr) = NonNull::new(ptr) else {
            return Err(MemoryError::OutOfMemory { requested: size });
        };

        let live = self.bytes_allocated.fetch_add(size, Ordering::Relaxed) + size;
        self.max_memory.fetch_max(live, Ordering::Relaxed);

        Ok(ptr)
    }

    #[cfg_attr(test, mutants::skip)] // Mutations can violate memory safety and cause UB.
    unsafe fn free(&self, ptr: NonNull<u8>, size: usize) {
        if size == 0 {
            return;
        }

        let layout = Layout::from_size_align(size, ALLOCATION_ALIGNMENT)
            .expect("freed region was allocated with this exact layout, so it must be valid");

        // SAFETY: The caller guarantees that `ptr` came from `allocate(size)` on this
        // pool, which used this exact layout, and that it is freed only once.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) };

        self.bytes_allocated.fetch_sub(size, Ordering::Relaxed);
    }

    fn bytes_allocated(&self) -> usize {
        self.bytes_allocated.load(Ordering::Relaxed)
    }

    fn max_memory(&self) -> usize {
        self.max_memory.load(Ordering::Relaxed)
    }
}

/// Returns the process-wide default memory pool.
///
/// The instance is created lazily on first use and lives for the remainder of the
/// process. This exists as a convenience for the outermost construction boundary
/// (e.g. [`PoolBuffer::with_default_pool()`][1]); code deeper in the call graph
/// should receive its pool explicitly.
///
/// [1]: crate::PoolBuffer::with_default_pool
#[must_use]
pub fn default_pool() -> Arc<dyn MemoryPool> {
    static DEFAULT: OnceLock<Arc<SystemPool>> = OnceLock::new();

    let pool: Arc<SystemPool> = Arc::clone(DEFAULT.get_or_init(|| Arc::new(SystemPool::new())));

    pool
}

// Histogram buckets for the requested allocation size.
const ALLOCATION_SIZE_BUCKETS: &[Magnitude] = &[
    0, 64, 256, 1024, 4096, 16_384, 65_536, 262_144, 1_048_576,
];

thread_local! {
    static ALLOCATION_REQUESTED_SIZE: Event = Event::builder()
        .name("poolbuf_system_pool_allocation_requested_size")
        .histogram(ALLOCATION_SIZE_BUCKETS)
        .build();
}
