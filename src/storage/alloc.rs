//! Block Allocator
//!
//! One `BlockNode` per block of the store, metadata blocks included. Used
//! nodes link a file's blocks into a singly-linked chain, a minimal file
//! allocation table.
//!
//! ## Allocation Policy
//! Lowest-indexed free blocks first, so allocation order is reproducible.
//! The leading `reserved` blocks hold metadata and never enter the free pool.

use crate::error::{FsError, Result};

use super::device::BlockDevice;

/// State of a single block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockNode {
    Free,
    /// Part of a chain; `next` is `None` for the last block
    Used { next: Option<usize> },
}

impl BlockNode {
    pub fn is_free(&self) -> bool {
        matches!(self, BlockNode::Free)
    }
}

/// The block node table and the allocator operating on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTable {
    nodes: Vec<BlockNode>,
    reserved: usize,
}

impl BlockTable {
    /// Fresh table: reserved blocks used, every data block free
    pub fn new(total: usize, reserved: usize) -> Self {
        let nodes = (0..total)
            .map(|i| {
                if i < reserved {
                    BlockNode::Used { next: None }
                } else {
                    BlockNode::Free
                }
            })
            .collect();
        Self { nodes, reserved }
    }

    /// Build a table from decoded nodes
    pub fn from_nodes(nodes: Vec<BlockNode>, reserved: usize) -> Self {
        Self { nodes, reserved }
    }

    pub fn nodes(&self) -> &[BlockNode] {
        &self.nodes
    }

    pub fn node(&self, block: usize) -> Option<BlockNode> {
        self.nodes.get(block).copied()
    }

    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Free blocks in the data region
    pub fn free_count(&self) -> usize {
        self.nodes[self.reserved..]
            .iter()
            .filter(|n| n.is_free())
            .count()
    }

    /// Pick the `n` lowest-indexed free data blocks
    ///
    /// Nothing is marked used until the blocks are passed to `link`.
    pub fn allocate(&self, n: usize) -> Result<Vec<usize>> {
        let chain: Vec<usize> = (self.reserved..self.nodes.len())
            .filter(|&i| self.nodes[i].is_free())
            .take(n)
            .collect();

        if chain.len() < n {
            return Err(FsError::InsufficientSpace {
                needed: n,
                available: chain.len(),
            });
        }
        Ok(chain)
    }

    /// Mark every block of `chain` used, each pointing at its successor
    pub fn link(&mut self, chain: &[usize]) {
        for (pos, &block) in chain.iter().enumerate() {
            self.nodes[block] = BlockNode::Used {
                next: chain.get(pos + 1).copied(),
            };
        }
    }

    /// Blocks of the chain starting at `first`, in order
    ///
    /// Fails on dangling links, free or reserved blocks inside the chain,
    /// and cycles.
    pub fn chain(&self, first: Option<usize>) -> Result<Vec<usize>> {
        let mut blocks = Vec::new();
        let mut cursor = first;

        while let Some(block) = cursor {
            if blocks.len() >= self.nodes.len() {
                return Err(FsError::Corruption(format!(
                    "cycle in chain starting at block {:?}",
                    first
                )));
            }
            if block < self.reserved {
                return Err(FsError::Corruption(format!(
                    "chain enters reserved block {}",
                    block
                )));
            }
            match self.nodes.get(block) {
                Some(BlockNode::Used { next }) => {
                    blocks.push(block);
                    cursor = *next;
                }
                Some(BlockNode::Free) => {
                    return Err(FsError::Corruption(format!(
                        "chain references free block {}",
                        block
                    )));
                }
                None => {
                    return Err(FsError::Corruption(format!(
                        "chain references block {} beyond table of {}",
                        block,
                        self.nodes.len()
                    )));
                }
            }
        }

        Ok(blocks)
    }

    /// Release the chain starting at `first`, zeroing each block on `device`
    ///
    /// An empty chain is a no-op, and the walk stops at a block that is
    /// already free. Returns the number of blocks released.
    pub fn free<D: BlockDevice + ?Sized>(
        &mut self,
        first: Option<usize>,
        device: &mut D,
    ) -> Result<usize> {
        let mut released = 0;
        let mut cursor = first;

        while let Some(block) = cursor {
            if block < self.reserved || block >= self.nodes.len() {
                return Err(FsError::Corruption(format!(
                    "cannot free block {} outside the data region",
                    block
                )));
            }
            if released >= self.nodes.len() {
                return Err(FsError::Corruption(format!(
                    "cycle in chain starting at block {:?}",
                    first
                )));
            }

            let next = match self.nodes[block] {
                BlockNode::Free => break,
                BlockNode::Used { next } => next,
            };

            device.zero_block(block)?;
            self.nodes[block] = BlockNode::Free;
            released += 1;
            cursor = next;
        }

        Ok(released)
    }
}
