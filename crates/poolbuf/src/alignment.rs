// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The allocation-size rounding policy shared by all memory pools.

/// The alignment unit for pooled allocations, in bytes.
///
/// Every allocation is sized and aligned to a multiple of this unit so that buffer
/// contents remain friendly to vectorized access patterns typical of columnar data.
pub const ALLOCATION_ALIGNMENT: usize = 64;

/// Rounds `n` up to the next multiple of [`ALLOCATION_ALIGNMENT`].
///
/// Values so large that rounding would wrap around are returned unchanged. Such a
/// request cannot be satisfied anyway, and passing it through unmodified lets the
/// allocator reject it loudly instead of silently truncating the size.
#[must_use]
pub fn round_up_to_alignment(n: usize) -> usize {
    const FORCE_CARRY_ADDEND: usize = ALLOCATION_ALIGNMENT - 1;
    const TRUNCATE_BITMASK: usize = !FORCE_CARRY_ADDEND;
    const MAX_ROUNDABLE: usize = usize::MAX - ALLOCATION_ALIGNMENT;

    if n <= MAX_ROUNDABLE {
        (n + FORCE_CARRY_ADDEND) & TRUNCATE_BITMASK
    } else {
        n
    }
}
