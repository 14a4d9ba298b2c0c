// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Types for using and implementing memory pools.

mod memory_pool;
mod system;

#[cfg(any(test, feature = "test-util"))]
mod limited;

pub use memory_pool::MemoryPool;
pub use system::{SystemPool, default_pool};

#[cfg(any(test, feature = "test-util"))]
pub use limited::LimitedPool;
