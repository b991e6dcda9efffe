//! Metadata Codec
//!
//! Serializes the entry table followed by the block node table into the
//! leading blocks of the store. Both `save` and `load` go through the same
//! record types, so the layout is defined exactly once.
//!
//! ## Record Layout (little endian)
//! ```text
//! Entry (15 bytes):  Name [u8; 11] (zero padded) | Size: u16 | FirstBlock: i16 (-1 = none)
//! Node  (8 bytes):   SelfMarker: i32 (i = used, -(i + 1) = free) | Next: i32 (-1 = end)
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{FsError, Result};

use super::alloc::{BlockNode, BlockTable};
use super::device::BlockDevice;
use super::entry::{validate_name, EntryTable, FileEntry};
use super::layout::{Geometry, ENTRY_RECORD_SIZE, NAME_LEN, NODE_RECORD_SIZE};

/// Sentinel for "no block" in both `first_block` and `next`
const NO_BLOCK: i32 = -1;

#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    name: [u8; NAME_LEN],
    size: u16,
    first_block: i16,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    self_marker: i32,
    next: i32,
}

impl EntryRecord {
    fn from_entry(entry: &FileEntry) -> Self {
        let mut name = [0u8; NAME_LEN];
        if entry.is_used() {
            let bytes = entry.name.as_bytes();
            name[..bytes.len()].copy_from_slice(bytes);
        }
        let first_block = match (entry.is_used(), entry.first_block) {
            (true, Some(block)) => block as i16,
            _ => NO_BLOCK as i16,
        };
        Self {
            name,
            size: if entry.is_used() { entry.size } else { 0 },
            first_block,
        }
    }

    fn into_entry(self, slot: usize) -> Result<FileEntry> {
        let len = self
            .name
            .iter()
            .rposition(|&b| b != 0 && b != b' ')
            .map_or(0, |last| last + 1);

        if len == 0 {
            return Ok(FileEntry::default());
        }

        let name = std::str::from_utf8(&self.name[..len])
            .map_err(|_| FsError::Corruption(format!("entry {} has a non UTF-8 name", slot)))?
            .to_string();

        let first_block = match self.first_block as i32 {
            NO_BLOCK => None,
            b if b >= 0 => Some(b as usize),
            b => {
                return Err(FsError::Corruption(format!(
                    "entry {} has invalid first block {}",
                    slot, b
                )))
            }
        };

        Ok(FileEntry {
            name,
            size: self.size,
            first_block,
        })
    }
}

impl NodeRecord {
    fn from_node(index: usize, node: BlockNode) -> Self {
        match node {
            BlockNode::Free => Self {
                self_marker: -(index as i32) - 1,
                next: NO_BLOCK,
            },
            BlockNode::Used { next } => Self {
                self_marker: index as i32,
                next: next.map_or(NO_BLOCK, |n| n as i32),
            },
        }
    }

    fn into_node(self, index: usize) -> Result<BlockNode> {
        if self.self_marker < 0 {
            if -(self.self_marker + 1) as usize != index {
                return Err(FsError::Corruption(format!(
                    "free marker {} stored at block {}",
                    self.self_marker, index
                )));
            }
            return Ok(BlockNode::Free);
        }

        if self.self_marker as usize != index {
            return Err(FsError::Corruption(format!(
                "used marker {} stored at block {}",
                self.self_marker, index
            )));
        }

        let next = match self.next {
            NO_BLOCK => None,
            n if n >= 0 => Some(n as usize),
            n => {
                return Err(FsError::Corruption(format!(
                    "block {} has invalid next pointer {}",
                    index, n
                )))
            }
        };
        Ok(BlockNode::Used { next })
    }
}

/// In-memory copy of everything stored in the metadata region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub entries: EntryTable,
    pub blocks: BlockTable,
}

impl Metadata {
    /// Metadata of a freshly formatted store
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            entries: EntryTable::new(geometry.max_files()),
            blocks: BlockTable::new(geometry.max_blocks(), geometry.metadata_blocks()),
        }
    }

    /// Serialize into a buffer spanning the whole metadata region
    pub fn encode(&self, geometry: &Geometry) -> Result<Vec<u8>> {
        let region = geometry.metadata_blocks() * geometry.block_size();
        let mut buf = Vec::with_capacity(region);

        for entry in self.entries.slots() {
            bincode::serialize_into(&mut buf, &EntryRecord::from_entry(entry))?;
        }
        for (index, node) in self.blocks.nodes().iter().enumerate() {
            bincode::serialize_into(&mut buf, &NodeRecord::from_node(index, *node))?;
        }

        if buf.len() != geometry.table_len() {
            return Err(FsError::Serialization(format!(
                "encoded tables are {} bytes, layout expects {}",
                buf.len(),
                geometry.table_len()
            )));
        }

        buf.resize(region, 0);
        Ok(buf)
    }

    /// Inverse of `encode`; `bytes` must hold at least the table bytes
    pub fn decode(bytes: &[u8], geometry: &Geometry) -> Result<Self> {
        if bytes.len() < geometry.table_len() {
            return Err(FsError::Corruption(format!(
                "metadata region is {} bytes, need {}",
                bytes.len(),
                geometry.table_len()
            )));
        }

        let mut slots = Vec::with_capacity(geometry.max_files());
        for (slot, record) in bytes
            .chunks_exact(ENTRY_RECORD_SIZE)
            .take(geometry.max_files())
            .enumerate()
        {
            let record: EntryRecord = bincode::deserialize(record)?;
            slots.push(record.into_entry(slot)?);
        }

        let node_bytes = &bytes[geometry.max_files() * ENTRY_RECORD_SIZE..];
        let mut nodes = Vec::with_capacity(geometry.max_blocks());
        for (index, record) in node_bytes
            .chunks_exact(NODE_RECORD_SIZE)
            .take(geometry.max_blocks())
            .enumerate()
        {
            let record: NodeRecord = bincode::deserialize(record)?;
            nodes.push(record.into_node(index)?);
        }

        Ok(Self {
            entries: EntryTable::from_slots(slots),
            blocks: BlockTable::from_nodes(nodes, geometry.metadata_blocks()),
        })
    }

    /// Write the metadata region starting at block 0
    pub fn save<D: BlockDevice + ?Sized>(&self, device: &mut D, geometry: &Geometry) -> Result<()> {
        let bytes = self.encode(geometry)?;
        for (block, chunk) in bytes.chunks_exact(geometry.block_size()).enumerate() {
            device.write_block(block, chunk)?;
        }
        device.sync()?;
        Ok(())
    }

    /// Read and validate the metadata region
    pub fn load<D: BlockDevice + ?Sized>(device: &mut D, geometry: &Geometry) -> Result<Self> {
        let block_size = geometry.block_size();
        let mut bytes = vec![0u8; geometry.metadata_blocks() * block_size];
        for (block, chunk) in bytes.chunks_exact_mut(block_size).enumerate() {
            device.read_block(block, chunk)?;
        }

        let metadata = Self::decode(&bytes, geometry)?;
        metadata.validate(geometry)?;
        Ok(metadata)
    }

    /// True if the whole metadata region reads as zeroes
    ///
    /// A formatted store never looks like this: block 0 is always marked
    /// used with a `-1` terminator. A zeroed region is a store that was
    /// pre-sized but never formatted.
    pub fn region_is_zeroed<D: BlockDevice + ?Sized>(
        device: &mut D,
        geometry: &Geometry,
    ) -> Result<bool> {
        let mut buf = vec![0u8; geometry.block_size()];
        for block in 0..geometry.metadata_blocks() {
            device.read_block(block, &mut buf)?;
            if buf.iter().any(|&b| b != 0) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Check every structural invariant of the two tables
    ///
    /// Returns the number of used data blocks no file owns. Those are
    /// reported rather than rejected; they are only unusable space.
    pub fn validate(&self, geometry: &Geometry) -> Result<usize> {
        if self.entries.capacity() != geometry.max_files()
            || self.blocks.nodes().len() != geometry.max_blocks()
        {
            return Err(FsError::Corruption(
                "table sizes do not match the geometry".to_string(),
            ));
        }

        for block in 0..geometry.metadata_blocks() {
            if self.blocks.node(block) != Some(BlockNode::Used { next: None }) {
                return Err(FsError::Corruption(format!(
                    "reserved metadata block {} is not marked used",
                    block
                )));
            }
        }

        let mut names = HashSet::new();
        let mut owned = HashSet::new();

        for (slot, entry) in self.entries.iter_used() {
            validate_name(&entry.name)
                .map_err(|e| FsError::Corruption(format!("entry {}: {}", slot, e)))?;

            if !names.insert(entry.name.as_str()) {
                return Err(FsError::Corruption(format!(
                    "duplicate file name {}",
                    entry.name
                )));
            }

            match (entry.size, entry.first_block) {
                (0, None) => continue,
                (0, Some(block)) => {
                    return Err(FsError::Corruption(format!(
                        "empty file {} points at block {}",
                        entry.name, block
                    )))
                }
                (_, None) => {
                    return Err(FsError::Corruption(format!(
                        "file {} has {} bytes but no blocks",
                        entry.name, entry.size
                    )))
                }
                (size, Some(first)) => {
                    if !geometry.is_data_block(first) {
                        return Err(FsError::Corruption(format!(
                            "file {} starts outside the data region at block {}",
                            entry.name, first
                        )));
                    }
                    let chain = self.blocks.chain(Some(first))?;
                    if chain.len() * geometry.block_size() < size as usize {
                        return Err(FsError::Corruption(format!(
                            "file {} has {} bytes but only {} blocks",
                            entry.name,
                            size,
                            chain.len()
                        )));
                    }
                    for block in chain {
                        if !owned.insert(block) {
                            return Err(FsError::Corruption(format!(
                                "block {} is shared by more than one file",
                                block
                            )));
                        }
                    }
                }
            }
        }

        let used = self.blocks.nodes()[geometry.metadata_blocks()..]
            .iter()
            .filter(|n| !n.is_free())
            .count();
        let leaked = used - owned.len();
        if leaked > 0 {
            tracing::warn!("{} used data blocks are not owned by any file", leaked);
        }

        Ok(leaked)
    }
}
