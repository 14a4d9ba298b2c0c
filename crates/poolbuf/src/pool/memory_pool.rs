// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::ptr::NonNull;

use crate::Result;

/// Provides raw memory capacity for buffers, with byte-accurate accounting.
///
/// This is the only external collaborator of the buffer types. A pool hands out
/// regions via [`allocate()`][Self::allocate] and takes them back via
/// [`free()`][Self::free]; the two calls must be paired with the exact same size,
/// which is how the pool keeps its accounting correct without storing per-region
/// headers. The buffer types encapsulate that pairing in a single owning handle so
/// a stale size can never reach `free()`.
///
/// # Resource management
///
/// Pools are shared via `Arc` and may be used from any thread; implementations must
/// keep their accounting safe under concurrent allocate/free traffic.
pub trait MemoryPool: Debug + Send + Sync {
    /// Allocates `size` bytes, aligned to [`ALLOCATION_ALIGNMENT`][1] and
    /// zero-initialized.
    ///
    /// Returns [`MemoryError::OutOfMemory`][2] when the pool cannot satisfy the
    /// request; the pool's state is unchanged by a failed allocation.
    ///
    /// # Zero-sized allocations
    ///
    /// Allocating zero bytes is valid and returns a dangling (but well-aligned)
    /// pointer that must not be dereferenced. Zero-sized allocations are not
    /// accounted and need not be freed, though freeing them is harmless.
    ///
    /// [1]: crate::ALLOCATION_ALIGNMENT
    /// [2]: crate::MemoryError::OutOfMemory
    fn allocate(&self, size: usize) -> Result<NonNull<u8>>;

    /// Releases a region previously returned by [`allocate()`][Self::allocate]
    /// on this same pool.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate(size)` on this pool with this
    /// exact `size`, must not have been freed before, and must not be accessed
    /// after this call.
    unsafe fn free(&self, ptr: NonNull<u8>, size: usize);

    /// The number of bytes currently allocated from this pool and not yet freed.
    fn bytes_allocated(&self) -> usize;

    /// The high-water mark of [`bytes_allocated()`][Self::bytes_allocated] over
    /// the lifetime of the pool.
    fn max_memory(&self) -> usize;
}
