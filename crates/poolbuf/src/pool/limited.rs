// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(any(test, feature = "test-util"))]

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::pool::{MemoryPool, SystemPool};
use crate::{MemoryError, Result};

/// A memory pool with a fixed byte budget, for exercising allocation failure.
///
/// Requests that would push live usage past the budget fail with
/// [`MemoryError::OutOfMemory`] while leaving the pool untouched, which makes this
/// the tool for verifying that buffer operations are atomic under allocation
/// failure. The pool also counts successful allocations so tests can assert that
/// an operation did (or did not) reallocate.
///
/// This is a test aid, not a memory-pressure mechanism for real code.
#[derive(Debug)]
pub struct LimitedPool {
    inner: SystemPool,
    limit: usize,
    allocation_count: AtomicUsize,
}

impl LimitedPool {
    /// Creates a pool that refuses to hold more than `limit` live bytes.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            inner: SystemPool::new(),
            limit,
            allocation_count: AtomicUsize::new(0),
        }
    }

    /// The number of non-zero-sized allocations served so far.
    #[must_use]
    pub fn allocation_count(&self) -> usize {
        self.allocation_count.load(Ordering::Relaxed)
    }
}

impl MemoryPool for LimitedPool {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        if size == 0 {
            return self.inner.allocate(0);
        }

        let would_be_live = self.inner.bytes_allocated().saturating_add(size);
        if would_be_live > self.limit {
            return Err(MemoryError::OutOfMemory { requested: size });
        }

        let ptr = self.inner.allocate(size)?;
        self.allocation_count.fetch_add(1, Ordering::Relaxed);

        Ok(ptr)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize) {
        // SAFETY: Forwarding the caller's guarantees unchanged.
        unsafe { self.inner.free(ptr, size) };
    }

    fn bytes_allocated(&self) -> usize {
        self.inner.bytes_allocated()
    }

    fn max_memory(&self) -> usize {
        self.inner.max_memory()
    }
}
