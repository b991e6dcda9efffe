//! Configuration for blockfs
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{FsError, Result};
use crate::storage::Geometry;

/// Main configuration for a blockfs instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Backing store file (created on first open)
    pub disk_path: PathBuf,

    /// Size of the backing store in bytes
    pub total_size: u64,

    /// Size of one block in bytes
    pub block_size: usize,

    /// Number of slots in the entry table
    pub max_files: usize,

    /// Number of blocks tracked by the node table (metadata blocks included)
    pub max_blocks: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections (size of the worker pool)
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            disk_path: PathBuf::from("./disk.dat"),
            total_size: 1280,
            block_size: 128,
            max_files: 5,
            max_blocks: 10,
            listen_addr: "127.0.0.1:12345".to_string(),
            max_connections: 64,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validate the storage settings and derive the disk geometry
    pub fn geometry(&self) -> Result<Geometry> {
        let geometry = Geometry::new(self.block_size, self.max_files, self.max_blocks)?;

        if self.total_size < geometry.store_len() {
            return Err(FsError::Config(format!(
                "total size {} is smaller than {} blocks of {} bytes",
                self.total_size, self.max_blocks, self.block_size
            )));
        }

        Ok(geometry)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing store path
    pub fn disk_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.disk_path = path.into();
        self
    }

    /// Set the backing store size (in bytes)
    pub fn total_size(mut self, size: u64) -> Self {
        self.config.total_size = size;
        self
    }

    /// Set the block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    /// Set the number of entry table slots
    pub fn max_files(mut self, count: usize) -> Self {
        self.config.max_files = count;
        self
    }

    /// Set the number of blocks
    pub fn max_blocks(mut self, count: usize) -> Self {
        self.config.max_blocks = count;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
