// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use crate::allocation::Allocation;
use crate::pool::MemoryPool;
use crate::{Buffer, ReadableBuffer, Result, WritableBuffer, round_up_to_alignment};

/// A writable buffer of fixed logical extent, allocated from a memory pool.
///
/// The storage is allocated once, zero-initialized, at construction; use
/// [`PoolBuffer`][crate::PoolBuffer] when the extent needs to grow.
///
/// Read-only consumers are served through [`immutable_view()`][Self::immutable_view],
/// which shares the storage under a type that has no write path, or through
/// [`freeze()`][Self::freeze], which gives up writability altogether. Either way the
/// storage is returned to the pool only when the writer and every view have been
/// dropped.
#[derive(Debug)]
pub struct MutableBuffer {
    allocation: Option<Arc<Allocation>>,
    len: usize,
}

impl MutableBuffer {
    /// Allocates a writable buffer of `len` zeroed bytes from `pool`.
    ///
    /// The allocation is rounded up to the allocation alignment unit, so capacity
    /// may exceed `len`.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool cannot satisfy the allocation.
    pub fn allocate(len: usize, pool: Arc<dyn MemoryPool>) -> Result<Self> {
        let capacity = round_up_to_alignment(len);

        let allocation = if capacity == 0 {
            None
        } else {
            Some(Arc::new(Allocation::new(&pool, capacity)?))
        };

        Ok(Self { allocation, len })
    }

    /// Allocates a writable buffer of `len` zeroed bytes from the process-wide
    /// default pool.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool cannot satisfy the allocation.
    pub fn with_default_pool(len: usize) -> Result<Self> {
        Self::allocate(len, crate::pool::default_pool())
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

    /// The allocated length backing the buffer, in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.allocation.as_ref().map_or(0, |allocation| allocation.capacity())
    }

    /// Returns a read-only [`Buffer`] covering this buffer's full extent.
    ///
    /// This is a type-level restriction, not a copy: the view shares the same
    /// storage, so writes made through this buffer after the view is created remain
    /// visible through it - the view merely offers no write path of its own. The
    /// view holds shared ownership of the storage, so the storage outlives whichever
    /// of the two is dropped last.
    #[must_use]
    pub fn immutable_view(&self) -> Buffer {
        match &self.allocation {
            None => Buffer::empty(),
            Some(allocation) => Buffer::from_allocation(Arc::clone(allocation), self.len, self.len),
        }
    }

    /// Consumes the buffer, converting it into a read-only [`Buffer`] zero-copy.
    ///
    /// Unlike [`immutable_view()`][Self::immutable_view] this removes the write
    /// path entirely, so the resulting buffer's contents can never change.
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

impl ReadableBuffer for MutableBuffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn as_slice(&self) -> &[u8] {
        self.as_slice()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn capacity(&self) -> usize {
        self.capacity()
    }
}

impl WritableBuffer for MutableBuffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn as_mut_slice(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::pool::SystemPool;

    assert_impl_all!(MutableBuffer: Send, Sync, ReadableBuffer, WritableBuffer);

    fn system_pool() -> Arc<dyn MemoryPool> {
        Arc::new(SystemPool::new())
    }

    #[test]
    fn allocation_is_rounded_and_zeroed() {
        let mut buffer = MutableBuffer::allocate(100, system_pool()).expect("allocation failed");

        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.capacity(), 128);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
        assert_eq!(buffer.as_mut_slice().len(), 100);
    }

    #[test]
    fn zero_length_buffer_holds_no_storage() {
        let pool = system_pool();

        let mut buffer = MutableBuffer::allocate(0, Arc::clone(&pool)).expect("allocation failed");

        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.as_mut_slice(), &mut [] as &mut [u8]);
        assert_eq!(pool.bytes_allocated(), 0);

        assert!(buffer.immutable_view().is_empty());
        assert!(buffer.freeze().is_empty());
    }

    #[test]
    fn writes_are_readable_back() {
        let mut buffer = MutableBuffer::allocate(4, system_pool()).expect("allocation failed");

        buffer.as_mut_slice().copy_from_slice(b"data");

        assert_eq!(buffer.as_slice(), b"data");
    }

    #[test]
    fn immutable_view_covers_full_extent() {
        let mut buffer = MutableBuffer::allocate(10, system_pool()).expect("allocation failed");
        buffer.as_mut_slice().copy_from_slice(b"0123456789");

        let view = buffer.immutable_view();

        assert_eq!(view.len(), buffer.len());
        assert_eq!(view.capacity(), view.len());
        assert_eq!(view.as_slice(), b"0123456789");
    }

    #[test]
    fn view_observes_later_writes() {
        let mut buffer = MutableBuffer::allocate(5, system_pool()).expect("allocation failed");

        let view = buffer.immutable_view();
        buffer.as_mut_slice().copy_from_slice(b"later");

        assert_eq!(view.as_slice(), b"later");
    }

    #[test]
    fn view_keeps_storage_alive_after_writer_drops() {
        let pool = system_pool();

        let mut buffer = MutableBuffer::allocate(3, Arc::clone(&pool)).expect("allocation failed");
        buffer.as_mut_slice().copy_from_slice(b"pin");

        let view = buffer.immutable_view();
        drop(buffer);

        assert_eq!(pool.bytes_allocated(), 64);
        assert_eq!(view.as_slice(), b"pin");

        drop(view);
        assert_eq!(pool.bytes_allocated(), 0);
    }

    #[test]
    fn freeze_is_zero_copy() {
        let pool = system_pool();

        let mut buffer = MutableBuffer::allocate(6, Arc::clone(&pool)).expect("allocation failed");
        buffer.as_mut_slice().copy_from_slice(b"frozen");
        let data = buffer.as_slice().as_ptr();

        let frozen = buffer.freeze();

        assert_eq!(frozen.as_slice(), b"frozen");
        assert_eq!(frozen.as_ptr(), data);
        assert_eq!(frozen.capacity(), 64);
        assert_eq!(pool.bytes_allocated(), 64);

        drop(frozen);
        assert_eq!(pool.bytes_allocated(), 0);
    }
}
