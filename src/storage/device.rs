//! Backing Store
//!
//! A fixed-length byte region addressed in whole blocks. `FileDisk` keeps
//! it in a regular file; `MemoryDisk` keeps it in a `Vec<u8>`.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Block-addressed storage the file system is built on
///
/// Every buffer passed to `read_block`/`write_block` must be exactly
/// `block_size()` bytes long.
pub trait BlockDevice: Send {
    /// Size of one block in bytes
    fn block_size(&self) -> usize;

    /// Number of whole blocks the device holds
    fn block_count(&self) -> usize;

    /// True if the device held no prior content when it was opened
    fn is_blank(&self) -> bool;

    /// Read block `block` into `buf`
    fn read_block(&mut self, block: usize, buf: &mut [u8]) -> io::Result<()>;

    /// Write `buf` into block `block`
    fn write_block(&mut self, block: usize, buf: &[u8]) -> io::Result<()>;

    /// Flush buffered writes to durable storage
    fn sync(&mut self) -> io::Result<()>;

    /// Overwrite block `block` with zeroes
    fn zero_block(&mut self, block: usize) -> io::Result<()> {
        let zeroes = vec![0u8; self.block_size()];
        self.write_block(block, &zeroes)
    }
}

/// Reject out-of-range block numbers and mis-sized buffers
fn check_access(block: usize, len: usize, block_size: usize, block_count: usize) -> io::Result<()> {
    if block >= block_count {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("block {} out of range (device has {} blocks)", block, block_count),
        ));
    }
    if len != block_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("buffer of {} bytes does not match block size {}", len, block_size),
        ));
    }
    Ok(())
}

// =============================================================================
// FileDisk
// =============================================================================

/// Backing store kept in a single regular file
#[derive(Debug)]
pub struct FileDisk {
    path: PathBuf,
    file: File,
    block_size: usize,
    block_count: usize,
    blank: bool,
}

impl FileDisk {
    /// Open or create the store at `path`
    ///
    /// The file is extended to `total_size` bytes if it is shorter. A file
    /// that did not exist or was empty is reported as blank.
    pub fn open(path: &Path, total_size: u64, block_size: usize) -> io::Result<Self> {
        if block_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "block size must be non-zero",
            ));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let current_len = file.metadata()?.len();
        let blank = current_len == 0;

        if current_len < total_size {
            file.set_len(total_size)?;
        }

        let len = current_len.max(total_size);

        Ok(Self {
            path: path.to_path_buf(),
            file,
            block_size,
            block_count: (len / block_size as u64) as usize,
            blank,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn offset(&self, block: usize) -> u64 {
        block as u64 * self.block_size as u64
    }
}

impl BlockDevice for FileDisk {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> usize {
        self.block_count
    }

    fn is_blank(&self) -> bool {
        self.blank
    }

    fn read_block(&mut self, block: usize, buf: &mut [u8]) -> io::Result<()> {
        check_access(block, buf.len(), self.block_size, self.block_count)?;
        self.file.seek(SeekFrom::Start(self.offset(block)))?;
        self.file.read_exact(buf)
    }

    fn write_block(&mut self, block: usize, buf: &[u8]) -> io::Result<()> {
        check_access(block, buf.len(), self.block_size, self.block_count)?;
        self.file.seek(SeekFrom::Start(self.offset(block)))?;
        self.file.write_all(buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

// =============================================================================
// MemoryDisk
// =============================================================================

/// Backing store held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryDisk {
    bytes: Vec<u8>,
    block_size: usize,
    blank: bool,
}

impl MemoryDisk {
    /// A zero-filled, blank store of `block_count` blocks
    pub fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            bytes: vec![0u8; block_size * block_count],
            block_size,
            blank: true,
        }
    }

    /// Wrap an existing image, e.g. one taken with `into_bytes`
    ///
    /// A trailing partial block is ignored.
    pub fn from_bytes(bytes: Vec<u8>, block_size: usize) -> Self {
        Self {
            bytes,
            block_size,
            blank: false,
        }
    }

    /// Raw image of the store
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn range(&self, block: usize) -> std::ops::Range<usize> {
        let start = block * self.block_size;
        start..start + self.block_size
    }
}

impl BlockDevice for MemoryDisk {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> usize {
        if self.block_size == 0 {
            0
        } else {
            self.bytes.len() / self.block_size
        }
    }

    fn is_blank(&self) -> bool {
        self.blank
    }

    fn read_block(&mut self, block: usize, buf: &mut [u8]) -> io::Result<()> {
        check_access(block, buf.len(), self.block_size, self.block_count())?;
        let range = self.range(block);
        buf.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn write_block(&mut self, block: usize, buf: &[u8]) -> io::Result<()> {
        check_access(block, buf.len(), self.block_size, self.block_count())?;
        let range = self.range(block);
        self.bytes[range].copy_from_slice(buf);
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}
