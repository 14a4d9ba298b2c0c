// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Reference-counted, pool-backed memory buffers for columnar data.
//!
//! Columnar storage engines move large binary regions around constantly: the same
//! region is typically referenced by several logical views at once, grown
//! incrementally while being filled, and must be returned to its allocator exactly
//! once no matter how many views referenced it. This crate provides the buffer
//! types that make that safe:
//!
//! * [`Buffer`] - an immutable view over a byte region, possibly a zero-copy slice
//!   of another buffer's storage. A slice keeps its parent alive through shared
//!   ownership, so storage is released only when the last holder drops.
//! * [`MutableBuffer`] - a writable buffer of fixed extent, allocated from a pool.
//! * [`PoolBuffer`] - a writable, growable buffer that obtains and grows its
//!   storage through an explicit memory pool.
//!
//! Capability is expressed in the type system rather than at runtime: the
//! [`ReadableBuffer`], [`WritableBuffer`] and [`ResizableBuffer`] traits form
//! progressively richer interfaces, and each concrete buffer type implements
//! exactly the capabilities it offers. A [`Buffer`] has no write path at all,
//! which is what makes handing out views safe.
//!
//! # Growing a buffer
//!
//! A [`PoolBuffer`] starts empty. [`resize()`][PoolBuffer::resize] grows storage
//! (rounded up to the 64-byte allocation alignment unit) and sets the logical
//! length; [`reserve()`][PoolBuffer::reserve] grows storage without touching the
//! length. Capacity never shrinks.
//!
//! ```
//! use poolbuf::PoolBuffer;
//!
//! let mut buf = PoolBuffer::with_default_pool();
//!
//! buf.resize(3)?;
//! assert_eq!(buf.capacity(), 64);
//!
//! buf.as_mut_slice().copy_from_slice(b"abc");
//!
//! // Growth reallocates and carries the live contents over.
//! buf.resize(100)?;
//! assert_eq!(buf.capacity(), 128);
//! assert_eq!(&buf.as_slice()[..3], b"abc");
//! # Ok::<(), poolbuf::MemoryError>(())
//! ```
//!
//! Allocation failure is recoverable: `reserve` and `resize` return a
//! [`MemoryError`] and leave the buffer exactly as it was, so the caller can back
//! out of the enclosing operation without corrupting state.
//!
//! # Sharing without copying
//!
//! Freezing a writable buffer or taking an immutable view of one yields a
//! [`Buffer`] over the same storage; slicing a `Buffer` yields another `Buffer`
//! over a sub-range of the same storage. No bytes are copied at any step.
//!
//! ```
//! use std::sync::Arc;
//!
//! use poolbuf::MutableBuffer;
//!
//! let mut writable = MutableBuffer::with_default_pool(10)?;
//! writable.as_mut_slice().copy_from_slice(b"0123456789");
//!
//! let parent = Arc::new(writable.freeze());
//! let slice = parent.slice(2, 4);
//!
//! assert_eq!(slice.as_slice(), b"2345");
//!
//! // The slice holds shared ownership of its parent: dropping the parent handle
//! // does not release the storage while the slice is alive.
//! drop(parent);
//! assert_eq!(slice.as_slice(), b"2345");
//! # Ok::<(), poolbuf::MemoryError>(())
//! ```
//!
//! # Memory pools
//!
//! All storage comes from a [`MemoryPool`], the crate's only external collaborator.
//! A pool hands out zeroed, 64-byte-aligned regions and keeps byte-accurate
//! accounting; regions are released back with the exact size they were allocated
//! with, a pairing the buffer types encapsulate so it cannot be gotten wrong.
//!
//! Construct a pool explicitly and inject it where buffers are created. The
//! process-wide [`default_pool()`] exists for the outermost boundary where there
//! is nothing to inject.
//!
//! ```
//! use std::sync::Arc;
//!
//! use poolbuf::{MemoryPool, PoolBuffer, SystemPool};
//!
//! let pool: Arc<dyn MemoryPool> = Arc::new(SystemPool::new());
//!
//! let mut buf = PoolBuffer::new(Arc::clone(&pool));
//! buf.resize(100)?;
//!
//! assert_eq!(pool.bytes_allocated(), 128);
//!
//! drop(buf);
//! assert_eq!(pool.bytes_allocated(), 0);
//! # Ok::<(), poolbuf::MemoryError>(())
//! ```
//!
//! # Thread safety
//!
//! Buffers and views may move between threads, and multiple views may read the
//! same storage concurrently. Reference counting and pool accounting are atomic.
//! What is *not* synchronized is the payload: mutating one buffer's contents, or
//! calling `reserve`/`resize` on one `PoolBuffer`, concurrently with any other
//! access to the same buffer requires external synchronization (single-writer
//! discipline). There is no internal locking.
//!
//! # Testing
//!
//! Behind the `test-util` Cargo feature this crate exposes
//! [`LimitedPool`][pool::LimitedPool], a pool with a fixed byte budget for
//! exercising allocation-failure paths in code that consumes buffers.

mod alignment;
mod allocation;
mod buffer;
mod error;
mod mutable;
mod pool_buffer;
mod traits;

pub mod pool;

pub use alignment::{ALLOCATION_ALIGNMENT, round_up_to_alignment};
pub use buffer::Buffer;
pub use error::{MemoryError, Result};
pub use mutable::MutableBuffer;
pub use pool::{MemoryPool, SystemPool, default_pool};
pub use pool_buffer::PoolBuffer;
pub use traits::{ReadableBuffer, ResizableBuffer, WritableBuffer};
