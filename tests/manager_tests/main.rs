//! Tests for the FileSystem manager
//!
//! These tests verify:
//! - create/write/read/delete/list semantics and error kinds
//! - Deterministic block allocation and reuse
//! - Persistence across close and reopen
//! - Rollback and reload when the backing store fails
//! - Concurrent access through one shared handle

mod concurrency_tests;
mod failure_tests;

use blockfs::storage::{Geometry, MemoryDisk};
use blockfs::FileSystem;

/// 128-byte blocks, 5 files, 10 blocks (2 metadata + 8 data)
pub fn default_geometry() -> Geometry {
    Geometry::new(128, 5, 10).unwrap()
}

pub fn memory_fs() -> FileSystem<MemoryDisk> {
    let geometry = default_geometry();
    FileSystem::with_device(geometry, MemoryDisk::new(128, geometry.max_blocks())).unwrap()
}

/// Deterministic content of `len` bytes
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}
