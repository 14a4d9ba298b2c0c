// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// An error arising from a memory pool that could not satisfy a request.
///
/// Allocation failure is the only recoverable failure in this crate. It is returned
/// from capacity-changing operations such as [`PoolBuffer::reserve()`][1] and
/// [`PoolBuffer::resize()`][2], leaving the buffer exactly as it was before the call,
/// so the caller is free to retry, fall back or abort the enclosing operation.
///
/// Precondition violations (e.g. an out-of-range slice) are caller bugs and panic
/// instead of returning an error result.
///
/// # Thread safety
///
/// This type is thread-safe.
///
/// [1]: crate::PoolBuffer::reserve
/// [2]: crate::PoolBuffer::resize
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MemoryError {
    /// The pool could not provide the requested number of bytes.
    #[error("memory pool could not satisfy an allocation of {requested} bytes")]
    OutOfMemory {
        /// The size of the allocation request that failed, in bytes.
        requested: usize,
    },
}

/// A specialized `Result` for use with memory pool operations.
pub type Result<T> = std::result::Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    #[test]
    fn thread_safe_type() {
        assert_impl_all!(MemoryError: Send, Sync);
    }

    #[test]
    fn out_of_memory_reports_requested_size() {
        let e = MemoryError::OutOfMemory { requested: 4096 };

        assert_eq!(e.to_string(), "memory pool could not satisfy an allocation of 4096 bytes");
    }
}
