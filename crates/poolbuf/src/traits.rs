// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Result;

/// Read-only access to a buffer's bytes.
///
/// This is the lowest capability level: every buffer type satisfies it, and code
/// that only consumes bytes should require nothing more.
pub trait ReadableBuffer {
    /// The buffer's contents, covering its logical length.
    fn as_slice(&self) -> &[u8];

    /// The logical length of the buffer, in bytes.
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the buffer has a logical length of zero.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The allocated length backing the buffer, in bytes. Always at least
    /// [`len()`][Self::len].
    fn capacity(&self) -> usize;
}

/// Write access to a buffer's bytes, on top of read access.
///
/// Writability is a property of the buffer's type, not a runtime mode: a type that
/// does not implement this trait has no write path at all, which is how read-only
/// views enforce their immutability at compile time.
pub trait WritableBuffer: ReadableBuffer {
    /// The buffer's contents, writable, covering its logical length.
    fn as_mut_slice(&mut self) -> &mut [u8];
}

/// Capacity management on top of write access.
///
/// The two operations grow storage but never shrink it: capacity is monotonically
/// non-decreasing for the lifetime of a resizable buffer.
pub trait ResizableBuffer: WritableBuffer {
    /// Ensures capacity is at least `new_capacity`, reallocating if necessary.
    ///
    /// The logical length is unchanged. On allocation failure the buffer is left
    /// exactly as it was before the call.
    fn reserve(&mut self, new_capacity: usize) -> Result<()>;

    /// Sets the logical length to `new_len`, growing capacity first if needed.
    ///
    /// On allocation failure neither the length nor the storage changes.
    fn resize(&mut self, new_len: usize) -> Result<()>;
}

impl<B: ReadableBuffer + ?Sized> ReadableBuffer for &B {
    fn as_slice(&self) -> &[u8] {
        (*self).as_slice()
    }

    fn capacity(&self) -> usize {
        (*self).capacity()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEight {
        bytes: [u8; 8],
    }

    impl ReadableBuffer for FixedEight {
        fn as_slice(&self) -> &[u8] {
            &self.bytes
        }

        fn capacity(&self) -> usize {
            self.bytes.len()
        }
    }

    fn total<B: ReadableBuffer>(buffer: B) -> u64 {
        buffer.as_slice().iter().map(|&b| u64::from(b)).sum()
    }

    #[test]
    fn default_length_comes_from_slice() {
        let buffer = FixedEight { bytes: [1; 8] };

        assert_eq!(buffer.len(), 8);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn reference_forwards_read_access() {
        let buffer = FixedEight { bytes: [2; 8] };

        assert_eq!(total(&buffer), 16);
        assert_eq!(total(buffer), 16);
    }
}
