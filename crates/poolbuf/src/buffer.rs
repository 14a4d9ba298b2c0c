// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ptr::NonNull;
use std::sync::Arc;

use crate::ReadableBuffer;
use crate::allocation::Allocation;

/// An immutable view over a byte region.
///
/// A `Buffer` either roots its own pooled storage (obtained by freezing a writable
/// buffer or taking an immutable view of one), references `'static` data, or is a
/// zero-copy slice of a parent `Buffer`. In the slice case the child holds shared
/// ownership of its parent, so the parent's storage cannot be released while any
/// slice of it is alive - ownership always points from child to parent, never the
/// reverse, so no cycles can form.
///
/// There is no write path through this type. Writability is granted by
/// [`MutableBuffer`][crate::MutableBuffer] and [`PoolBuffer`][crate::PoolBuffer];
/// a `Buffer` view taken from one of those shares the same storage, which means
/// writes made through the owner remain visible through the view (single-writer
/// discipline applies, see the crate documentation).
#[derive(Debug)]
pub struct Buffer {
    data: NonNull<u8>,
    len: usize,
    capacity: usize,
    ownership: Ownership,
}

/// What keeps a buffer's bytes alive.
#[derive(Debug)]
enum Ownership {
    /// A slice keeping its parent buffer alive.
    Parent(Arc<Buffer>),

    /// A root view keeping pooled storage alive.
    Storage(Arc<Allocation>),

    /// Nothing to keep alive: `'static` data or an empty buffer.
    None,
}

impl Buffer {
    /// Creates an empty buffer with no backing storage.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: NonNull::dangling(),
            len: 0,
            capacity: 0,
            ownership: Ownership::None,
        }
    }

    /// Creates a zero-copy buffer over `'static` data.
    #[must_use]
    pub fn from_static(data: &'static [u8]) -> Self {
        Self {
            data: NonNull::from(data).cast::<u8>(),
            len: data.len(),
            capacity: data.len(),
            ownership: Ownership::None,
        }
    }

    /// Creates a root view over pooled storage.
    ///
    /// `len` and `capacity` must not exceed the allocation's capacity.
    pub(crate) fn from_allocation(allocation: Arc<Allocation>, len: usize, capacity: usize) -> Self {
        debug_assert!(len <= capacity);
        debug_assert!(capacity <= allocation.capacity());

        Self {
            data: allocation.ptr(),
            len,
            capacity,
            ownership: Ownership::Storage(allocation),
        }
    }

    /// Creates a zero-copy slice covering `length` bytes of this buffer starting
    /// at `offset`.
    ///
    /// The slice shares the parent's storage rather than copying it, and it holds
    /// shared ownership of the parent, keeping the storage alive for as long as the
    /// slice exists. A slice does not over-allocate: its capacity equals its length.
    ///
    /// # Panics
    ///
    /// Panics if `offset + length` is out of bounds. An out-of-range slice is a
    /// caller bug, not a recoverable condition.
    #[must_use]
    pub fn slice(self: &Arc<Self>, offset: usize, length: usize) -> Self {
        let end = offset.checked_add(length).expect("slice bounds overflow usize");
        assert!(
            end <= self.len,
            "slice range {offset}..{end} out of bounds for buffer of length {}",
            self.len
        );

        // SAFETY: `offset <= self.len`, so the result stays within the storage that
        // the parent (kept alive below) points into.
        let data = unsafe { self.data.add(offset) };

        Self {
            data,
            len: length,
            capacity: length,
            ownership: Ownership::Parent(Arc::clone(self)),
        }
    }

    /// The buffer's contents.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `data` points to `len` initialized bytes that `ownership` keeps
        // alive for at least as long as this buffer.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    /// A raw pointer to the first byte, valid for `len()` bytes of reads while
    /// this buffer is alive.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
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

    /// The allocated length backing the buffer. Equal to [`len()`][Self::len] for
    /// pure slice views.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The parent this buffer is a slice of, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Self>> {
        match &self.ownership {
            Ownership::Parent(parent) => Some(parent),
            Ownership::Storage(_) | Ownership::None => None,
        }
    }
}

impl ReadableBuffer for Buffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn as_slice(&self) -> &[u8] {
        self.as_slice()
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn capacity(&self) -> usize {
        self.capacity()
    }
}

// SAFETY: The bytes are immutable through this type and the owning chain
// (`Arc<Buffer>` / `Arc<Allocation>`) uses atomic reference counting, so a
// `Buffer` may move freely between threads.
unsafe impl Send for Buffer {}

// SAFETY: `&Buffer` only permits reads of immutable state; see above.
unsafe impl Sync for Buffer {}
