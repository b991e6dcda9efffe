//! Disk Geometry
//!
//! Fixed sizes of the on-disk tables and the block arithmetic derived from
//! them. Computed once when the file system is opened.

use crate::error::{FsError, Result};

/// Width of the name field in an entry record
pub const NAME_LEN: usize = 11;

/// Entry record: name (11) + size (2) + first_block (2)
pub const ENTRY_RECORD_SIZE: usize = NAME_LEN + 2 + 2;

/// Block node record: self_marker (4) + next (4)
pub const NODE_RECORD_SIZE: usize = 4 + 4;

/// Largest block count addressable by the 2-byte signed `first_block` field
pub const MAX_ADDRESSABLE_BLOCKS: usize = i16::MAX as usize + 1;

/// Largest file size representable by the 2-byte `size` field
pub const MAX_FILE_SIZE: usize = u16::MAX as usize;

/// Shape of a formatted backing store
///
/// ```text
/// block 0                      metadata_blocks            max_blocks
/// ├──────────────────────────────┼──────────────────────────┤
/// │ entry table │ node table │pad│ data blocks              │
/// └──────────────────────────────┴──────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    block_size: usize,
    max_files: usize,
    max_blocks: usize,
    metadata_blocks: usize,
}

impl Geometry {
    /// Validate the table sizes and compute the reserved metadata region
    pub fn new(block_size: usize, max_files: usize, max_blocks: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(FsError::Config("block size must be non-zero".to_string()));
        }
        if max_files == 0 {
            return Err(FsError::Config("max files must be non-zero".to_string()));
        }
        if max_blocks > MAX_ADDRESSABLE_BLOCKS {
            return Err(FsError::Config(format!(
                "max blocks {} exceeds addressable limit {}",
                max_blocks, MAX_ADDRESSABLE_BLOCKS
            )));
        }

        let table_bytes = max_files * ENTRY_RECORD_SIZE + max_blocks * NODE_RECORD_SIZE;
        let metadata_blocks = table_bytes.div_ceil(block_size);

        if metadata_blocks >= max_blocks {
            return Err(FsError::Config(format!(
                "metadata needs {} blocks, leaving no data blocks out of {}",
                metadata_blocks, max_blocks
            )));
        }

        Ok(Self {
            block_size,
            max_files,
            max_blocks,
            metadata_blocks,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    /// Number of leading blocks reserved for the serialized tables
    pub fn metadata_blocks(&self) -> usize {
        self.metadata_blocks
    }

    /// Number of blocks available for file data
    pub fn data_blocks(&self) -> usize {
        self.max_blocks - self.metadata_blocks
    }

    /// Bytes occupied by the entry table and node table together
    pub fn table_len(&self) -> usize {
        self.max_files * ENTRY_RECORD_SIZE + self.max_blocks * NODE_RECORD_SIZE
    }

    /// Minimum backing store size in bytes
    pub fn store_len(&self) -> u64 {
        (self.max_blocks * self.block_size) as u64
    }

    /// Whether `block` lies in the data region
    pub fn is_data_block(&self, block: usize) -> bool {
        block >= self.metadata_blocks && block < self.max_blocks
    }

    /// Blocks needed to hold `len` bytes
    pub fn blocks_for(&self, len: usize) -> usize {
        len.div_ceil(self.block_size)
    }
}
