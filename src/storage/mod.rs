//! Storage Module
//!
//! On-disk structures of the file system and the allocator that manages
//! them.
//!
//! ## Responsibilities
//! - Block-addressed access to the backing store
//! - The flat entry table (namespace)
//! - Block chains and free-block allocation
//! - Persisting both tables to the metadata region
//!
//! ## Store Layout
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Metadata Region (metadata_blocks)      │
//! │ ┌────────────────────────────────────┐ │
//! │ │ Entry Table: MAXFILES × 15 bytes   │ │
//! │ ├────────────────────────────────────┤ │
//! │ │ Node Table: MAXBLOCKS × 8 bytes    │ │
//! │ ├────────────────────────────────────┤ │
//! │ │ Zero padding to a block boundary   │ │
//! │ └────────────────────────────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Data Region                            │
//! │   [block][block] ... up to MAXBLOCKS   │
//! └────────────────────────────────────────┘
//! ```

mod alloc;
mod device;
mod entry;
mod layout;
mod metadata;

pub use alloc::{BlockNode, BlockTable};
pub use device::{BlockDevice, FileDisk, MemoryDisk};
pub use entry::{validate_name, EntryTable, FileEntry, FileInfo};
pub use layout::{
    Geometry, ENTRY_RECORD_SIZE, MAX_ADDRESSABLE_BLOCKS, MAX_FILE_SIZE, NAME_LEN,
    NODE_RECORD_SIZE,
};
pub use metadata::Metadata;
