// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ptr;
use std::sync::Arc;

use crate::allocation::Allocation;
use crate::pool::MemoryPool;
use crate::{Buffer, ReadableBuffer, ResizableBuffer, Result, WritableBuffer, round_up_to_alignment};

/// A writable, growable buffer backed by a memory pool.
///
/// A `PoolBuffer` starts with zero capacity. Storage is obtained only through
/// [`reserve()`][Self::reserve] and [`resize()`][Self::resize], which round the
/// request up to the allocation alignment unit and, when growth is needed, allocate
/// fresh storage and copy the live contents over. Capacity never shrinks: resizing
/// to a smaller length only moves the logical length, trading peak memory retention
/// for the absence of churn on shrink/grow cycles.
///
/// Storage is returned to the pool that allocated it, with the exact capacity that
/// was allocated, when the last holder drops - usually the buffer itself, but a
/// view taken via [`immutable_view()`][Self::immutable_view] pins the storage it
/// was taken over, so superseded storage from before a grow survives until the
/// views over it are gone.
///
/// # Failure atomicity
///
/// A failed allocation during `reserve`/`resize` propagates as an error and leaves
/// the buffer exactly as it was: same storage, same capacity, same length, same
/// contents. Nothing is leaked and no partial state is observable.
#[derive(Debug)]
pub struct PoolBuffer {
    pool: Arc<dyn MemoryPool>,
    allocation: Option<Arc<Allocation>>,
    len: usize,
}

impl PoolBuffer {
    /// Creates an empty buffer bound to `pool`. No storage is allocated.
    #[must_use]
    pub fn new(pool: Arc<dyn MemoryPool>) -> Self {
        Self {
            pool,
            allocation: None,
            len: 0,
        }
    }

    /// Creates an empty buffer bound to the process-wide default pool.
    #[must_use]
    pub fn with_default_pool() -> Self {
        Self::new(crate::pool::default_pool())
    }

    /// Ensures capacity is at least `new_capacity` bytes, reallocating if needed.
    ///
    /// When storage already covers the request this is a no-op. Otherwise the
    /// request is rounded up to the allocation alignment unit, fresh zeroed storage
    /// is allocated, the first [`len()`][Self::len] bytes (the live contents, not
    /// the full capacity) are copied over, and the old storage is released. The
    /// logical length is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the pool's allocation failure unchanged, with the buffer left
    /// exactly as it was before the call.
    pub fn reserve(&mut self, new_capacity: usize) -> Result<()> {
        if self.allocation.is_some() && new_capacity <= self.capacity() {
            return Ok(());
        }

        let rounded = round_up_to_alignment(new_capacity);
        if rounded == 0 {
            return Ok(());
        }

        // Allocate before touching any state, so a failure leaves us untouched.
        let new_allocation = Arc::new(Allocation::new(&self.pool, rounded)?);

        if let Some(old_allocation) = &self.allocation {
            // Only the live contents are worth carrying over; bytes beyond `len`
            // are zero in both the old and the new storage.
            //
            // SAFETY: Source and destination are distinct allocations, each at
            // least `len` bytes (`len <= old capacity <= rounded`).
            unsafe {
                ptr::copy_nonoverlapping(old_allocation.ptr().as_ptr(), new_allocation.ptr().as_ptr(), self.len);
            }
        }

        // The old storage is released here with its exact old capacity, unless
        // live views still pin it.
        self.allocation = Some(new_allocation);

        Ok(())
    }

    /// Sets the logical length to `new_len` bytes, growing capacity first if
    /// needed. Capacity is never reduced, even when `new_len` is smaller than the
    /// current length.
    ///
    /// # Errors
    ///
    /// Returns the pool's allocation failure unchanged, with neither the length
    /// nor the storage modified.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        self.reserve(new_len)?;
        self.len = new_len;

        Ok(())
    }

    /// The buffer's contents.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match &self.allocation {
            None => &[],
            // SAFETY: The allocation holds at least `len` initialized bytes and
            // outlives this borrow.
            Some(allocation) => unsafe { std::slice::from_raw_parts(allocation.ptr().as_ptr(), self.len) },
        }
    }

    /// The buffer's contents, writable.
    ///
    /// Views created via [`immutable_view()`][Self::immutable_view] share this
    /// storage and will observe the writes. Writing while another thread reads a
    /// view is a data race; the caller must uphold single-writer discipline when
    /// sharing views across threads.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match &self.allocation {
            None => &mut [],
            // SAFETY: The allocation holds at least `len` initialized bytes and
            // outlives this borrow. The slice is materialized only for the duration
            // of the borrow; concurrent readers are excluded by the single-writer
            // discipline documented above.
            Some(allocation) => unsafe { std::slice::from_raw_parts_mut(allocation.ptr().as_ptr(), self.len) },
        }
    }

    /// The logical length of the buffer, in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer has a logical length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The allocated length backing the buffer, in bytes. Zero until the first
    /// successful [`reserve()`][Self::reserve] or [`resize()`][Self::resize].
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.allocation.as_ref().map_or(0, |allocation| allocation.capacity())
    }

    /// Returns a read-only [`Buffer`] covering this buffer's current extent.
    ///
    /// The view shares storage with this buffer, so later writes through
    /// [`as_mut_slice()`][Self::as_mut_slice] remain visible through it. A later
    /// grow, however, moves this buffer to fresh storage: the view keeps observing
    /// the storage it was taken over, which stays alive until the view drops.
    #[must_use]
    pub fn immutable_view(&self) -> Buffer {
        match &self.allocation {
            None => Buffer::empty(),
            Some(allocation) => Buffer::from_allocation(Arc::clone(allocation), self.len, self.len),
        }
    }

    /// Consumes the buffer, converting it into a read-only [`Buffer`] zero-copy.
    #[must_use]
    pub fn freeze(self) -> Buffer {
        match self.allocation {
            None => Buffer::empty(),
            Some(allocation) => {
                let capacity = allocation.capacity();
                Buffer::from_allocation(allocation, self.len, capacity)
            }
        }
    }
}

impl ReadableBuffer for PoolBuffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn as_slice(&self) -> &[u8] {
        self.as_slice()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn capacity(&self) -> usize {
        self.capacity()
    }
}

impl WritableBuffer for PoolBuffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn as_mut_slice(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl ResizableBuffer for PoolBuffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn reserve(&mut self, new_capacity: usize) -> Result<()> {
        self.reserve(new_capacity)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn resize(&mut self, new_len: usize) -> Result<()> {
        self.resize(new_len)
    }
}
