//! Entry Table
//!
//! The flat namespace: a fixed number of slots, each either unused or
//! describing one file. Pure in-memory state, no I/O.

use crate::error::{FsError, Result};

use super::layout::NAME_LEN;

/// One slot of the entry table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileEntry {
    /// File name; empty means the slot is unused
    pub name: String,
    /// Number of valid content bytes
    pub size: u16,
    /// First block of the data chain, `None` while the file holds no data
    pub first_block: Option<usize>,
}

impl FileEntry {
    /// A file with no content
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size: 0,
            first_block: None,
        }
    }

    pub fn is_used(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Name and size of an existing file, as reported by `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: usize,
}

/// Check that `name` fits the fixed-width name field
///
/// Names are 1..=11 bytes and may not contain NUL, whitespace or control
/// characters (the on-disk field is zero padded and the line protocol is
/// whitespace delimited).
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FsError::InvalidArgument("filename is empty".to_string()));
    }
    if name.len() > NAME_LEN {
        return Err(FsError::InvalidArgument(format!(
            "filename too large: {} bytes (max {})",
            name.len(),
            NAME_LEN
        )));
    }
    if name.chars().any(|c| c == '\0' || c.is_whitespace() || c.is_control()) {
        return Err(FsError::InvalidArgument(format!(
            "filename {:?} contains whitespace or control characters",
            name
        )));
    }
    Ok(())
}

/// Fixed-capacity table of file entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTable {
    slots: Vec<FileEntry>,
}

impl EntryTable {
    /// A table of `capacity` unused slots
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![FileEntry::default(); capacity],
        }
    }

    /// Build a table from decoded slots
    pub fn from_slots(slots: Vec<FileEntry>) -> Self {
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot index of the file called `name`
    pub fn lookup(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.slots.iter().position(|e| e.name == name)
    }

    /// Lowest-indexed unused slot
    pub fn allocate_slot(&self) -> Result<usize> {
        self.slots
            .iter()
            .position(|e| !e.is_used())
            .ok_or(FsError::CapacityExceeded {
                max_files: self.slots.len(),
            })
    }

    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.slots.get(index)
    }

    /// Overwrite slot `index`
    pub fn replace(&mut self, index: usize, entry: FileEntry) {
        self.slots[index] = entry;
    }

    /// Return slot `index` to the unused state
    pub fn clear(&mut self, index: usize) {
        self.slots[index] = FileEntry::default();
    }

    /// All slots in table order, used or not
    pub fn slots(&self) -> &[FileEntry] {
        &self.slots
    }

    /// Used slots in table order
    pub fn iter_used(&self) -> impl Iterator<Item = (usize, &FileEntry)> {
        self.slots.iter().enumerate().filter(|(_, e)| e.is_used())
    }

    pub fn used_count(&self) -> usize {
        self.slots.iter().filter(|e| e.is_used()).count()
    }
}
