//! File System Manager
//!
//! The public surface of the file system: create, write, read, delete and
//! list, composed from the entry table, the block allocator and the
//! metadata codec.
//!
//! ## Responsibilities
//! - Format a blank store or load the metadata of an existing one
//! - Serialize access with a single reader-writer lock
//! - Persist metadata after every mutation
//! - Keep memory in sync with the store when a mutation fails

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{FsError, Result};
use crate::protocol::{Command, Response};
use crate::storage::{
    validate_name, BlockDevice, FileDisk, FileEntry, FileInfo, Geometry, Metadata, MAX_FILE_SIZE,
};

/// Lock-protected state
struct State {
    /// Last committed metadata, identical to what the store holds
    metadata: Metadata,

    /// Cleared when a failed mutation could not be followed by a reload
    available: bool,
}

/// A flat file system over one block device
///
/// ## Concurrency Model: one reader-writer lock for everything
///
/// - **Mutations** (create/write/delete): exclusive `state` lock, held from
///   the name lookup through data I/O to the metadata persist.
/// - **Queries** (read/list): shared `state` lock; many may run at once.
/// - The device sits behind its own `Mutex` because positioned I/O needs
///   `&mut`. It is only ever taken while `state` is held (state → device),
///   so it never serializes anything a writer would not already block.
///
/// There is no per-file locking: writes to unrelated files are fully
/// serialized against each other.
///
/// ## Mutation Model: stage, write, persist, commit
///
/// Each mutation runs against a clone of the committed metadata. Only after
/// the data blocks and the metadata region have been written is the clone
/// swapped in. On failure the clone is dropped; if the failure was an I/O
/// error the metadata is also re-read from the store, because the store may
/// have been partially updated.
///
/// The reload restores the tables, not file content. A rewrite frees the
/// old chain and allocates lowest-index first, so the new chain usually
/// reuses the old blocks. If the metadata save then fails, the reloaded
/// entry still has the old size and first block but those blocks already
/// hold the new bytes: a read returns the new content cut to the old size.
pub struct FileSystem<D: BlockDevice = FileDisk> {
    geometry: Geometry,
    state: RwLock<State>,
    device: Mutex<D>,
}

impl FileSystem<FileDisk> {
    /// Open or create the file-backed store described by `config`
    pub fn open(config: &Config) -> Result<Self> {
        let geometry = config.geometry()?;
        let disk = FileDisk::open(&config.disk_path, config.total_size, geometry.block_size())?;

        tracing::info!(
            "Opening {} ({} bytes, {} blocks of {} bytes)",
            config.disk_path.display(),
            config.total_size,
            geometry.max_blocks(),
            geometry.block_size()
        );

        Self::with_device(geometry, disk)
    }
}

impl<D: BlockDevice> FileSystem<D> {
    /// Mount `device`, formatting it first if it is blank
    ///
    /// A device whose metadata region is all zeroes (pre-sized but never
    /// formatted, or a first format that did not finish) is formatted too.
    pub fn with_device(geometry: Geometry, mut device: D) -> Result<Self> {
        if device.block_size() != geometry.block_size() {
            return Err(FsError::Config(format!(
                "device block size {} does not match configured {}",
                device.block_size(),
                geometry.block_size()
            )));
        }
        if device.block_count() < geometry.max_blocks() {
            return Err(FsError::Config(format!(
                "device holds {} blocks, need {}",
                device.block_count(),
                geometry.max_blocks()
            )));
        }

        let metadata = if device.is_blank() {
            Self::format(&mut device, &geometry)?
        } else if Metadata::region_is_zeroed(&mut device, &geometry)? {
            tracing::info!("Metadata region is all zeroes; formatting");
            Self::format(&mut device, &geometry)?
        } else {
            let metadata = Metadata::load(&mut device, &geometry)?;
            tracing::info!(
                "Loaded metadata: {} files, {} free blocks",
                metadata.entries.used_count(),
                metadata.blocks.free_count()
            );
            metadata
        };

        Ok(Self {
            geometry,
            state: RwLock::new(State {
                metadata,
                available: true,
            }),
            device: Mutex::new(device),
        })
    }

    /// Zero the data region and write empty tables
    fn format(device: &mut D, geometry: &Geometry) -> Result<Metadata> {
        for block in geometry.metadata_blocks()..geometry.max_blocks() {
            device.zero_block(block)?;
        }

        let metadata = Metadata::new(geometry);
        metadata.save(device, geometry)?;

        tracing::info!(
            "Formatted blank store: {} metadata blocks, {} data blocks",
            geometry.metadata_blocks(),
            geometry.data_blocks()
        );
        Ok(metadata)
    }

    // =========================================================================
    // Public API
    // =========================================================================

    /// Create an empty file
    pub fn create(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let slot = self.mutate("create", name, |metadata, _device| {
            if metadata.entries.lookup(name).is_some() {
                return Err(FsError::AlreadyExists(name.to_string()));
            }
            let slot = metadata.entries.allocate_slot()?;
            metadata.entries.replace(slot, FileEntry::empty(name));
            Ok(slot)
        })?;

        tracing::debug!("Created file {} in slot {}", name, slot);
        Ok(())
    }

    /// Replace the whole content of `name` with `data`
    ///
    /// The space check counts the blocks `name` already owns as available,
    /// and runs before anything is freed; an `InsufficientSpace` failure
    /// leaves the old content in place.
    pub fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        if data.len() > MAX_FILE_SIZE {
            return Err(FsError::InvalidArgument(format!(
                "content too large: {} bytes (max {})",
                data.len(),
                MAX_FILE_SIZE
            )));
        }

        let geometry = self.geometry;
        let chain = self.mutate("write", name, |metadata, device| {
            let slot = metadata
                .entries
                .lookup(name)
                .ok_or_else(|| FsError::NotFound(name.to_string()))?;
            let old_first = metadata.entries.get(slot).and_then(|e| e.first_block);

            let needed = geometry.blocks_for(data.len());
            let owned = metadata.blocks.chain(old_first)?.len();
            let available = metadata.blocks.free_count() + owned;
            if needed > available {
                return Err(FsError::InsufficientSpace { needed, available });
            }

            metadata.blocks.free(old_first, device)?;
            let chain = metadata.blocks.allocate(needed)?;
            metadata.blocks.link(&chain);

            let mut buf = vec![0u8; geometry.block_size()];
            for (&block, chunk) in chain.iter().zip(data.chunks(geometry.block_size())) {
                buf[..chunk.len()].copy_from_slice(chunk);
                buf[chunk.len()..].fill(0);
                device.write_block(block, &buf)?;
            }

            metadata.entries.replace(
                slot,
                FileEntry {
                    name: name.to_string(),
                    size: data.len() as u16,
                    first_block: chain.first().copied(),
                },
            );
            Ok(chain)
        })?;

        tracing::debug!("Wrote {} bytes to {} (blocks {:?})", data.len(), name, chain);
        Ok(())
    }

    /// Read the whole content of `name`
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let state = self.state.read();
        if !state.available {
            return Err(FsError::Unavailable);
        }

        let entry = state
            .metadata
            .entries
            .lookup(name)
            .and_then(|slot| state.metadata.entries.get(slot))
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;

        let size = entry.size as usize;
        if size == 0 {
            return Ok(Vec::new());
        }

        let chain = state.metadata.blocks.chain(entry.first_block)?;
        let block_size = self.geometry.block_size();
        let mut data = Vec::with_capacity(size);
        let mut buf = vec![0u8; block_size];

        let mut device = self.device.lock();
        for block in chain {
            if data.len() >= size {
                break;
            }
            device.read_block(block, &mut buf)?;
            let take = block_size.min(size - data.len());
            data.extend_from_slice(&buf[..take]);
        }

        if data.len() < size {
            return Err(FsError::Corruption(format!(
                "chain of {} holds {} of {} bytes",
                name,
                data.len(),
                size
            )));
        }

        tracing::debug!("Read {} bytes from {}", size, name);
        Ok(data)
    }

    /// Delete `name`, zeroing and releasing its blocks
    pub fn delete(&self, name: &str) -> Result<()> {
        let released = self.mutate("delete", name, |metadata, device| {
            let slot = metadata
                .entries
                .lookup(name)
                .ok_or_else(|| FsError::NotFound(name.to_string()))?;
            let first = metadata.entries.get(slot).and_then(|e| e.first_block);

            let released = metadata.blocks.free(first, device)?;
            metadata.entries.clear(slot);
            Ok(released)
        })?;

        tracing::debug!("Deleted file {} ({} blocks released)", name, released);
        Ok(())
    }

    /// Names and sizes of all files, in table-slot order
    pub fn list(&self) -> Vec<FileInfo> {
        let state = self.state.read();
        state
            .metadata
            .entries
            .iter_used()
            .map(|(_, entry)| FileInfo {
                name: entry.name.clone(),
                size: entry.size as usize,
            })
            .collect()
    }

    /// Execute a protocol command
    ///
    /// Routes commands to the matching operation and formats the success
    /// reply; failures are returned for the caller to report.
    pub fn execute(&self, command: Command) -> Result<Response> {
        match command {
            Command::Create { name } => {
                self.create(&name)?;
                Ok(Response::ok("OK: File created"))
            }
            Command::Write { name, content } => {
                self.write(&name, content.as_bytes())?;
                Ok(Response::ok("OK: Content written"))
            }
            Command::Read { name } => {
                let data = self.read(&name)?;
                Ok(Response::ok(String::from_utf8_lossy(&data)))
            }
            Command::Delete { name } => {
                self.delete(&name)?;
                Ok(Response::ok("OK: File deleted"))
            }
            Command::List => {
                let files = self.list();
                if files.is_empty() {
                    return Ok(Response::ok("No files"));
                }
                let listing: Vec<String> = files
                    .iter()
                    .map(|f| format!("{} ({} bytes)", f.name, f.size))
                    .collect();
                Ok(Response::ok(listing.join(", ")))
            }
            Command::Exit => Ok(Response::ok("OK: Bye")),
        }
    }

    /// Discard in-memory metadata and re-read it from the store
    ///
    /// Also clears the `Unavailable` state on success.
    pub fn reload(&self) -> Result<()> {
        let mut state = self.state.write();
        let mut device = self.device.lock();

        state.metadata = Metadata::load(&mut *device, &self.geometry)?;
        state.available = true;

        tracing::info!("Metadata reloaded from backing store");
        Ok(())
    }

    /// Re-check every metadata invariant
    ///
    /// Returns the number of used data blocks that no file owns.
    pub fn verify(&self) -> Result<usize> {
        let state = self.state.read();
        state.metadata.validate(&self.geometry)
    }

    /// Sync and release the store, handing the device back
    pub fn into_device(self) -> Result<D> {
        let mut device = self.device.into_inner();
        device.sync()?;
        Ok(device)
    }

    /// Sync and release the store
    pub fn close(self) -> Result<()> {
        self.into_device()?;
        tracing::info!("File system closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Free blocks in the data region
    pub fn free_blocks(&self) -> usize {
        self.state.read().metadata.blocks.free_count()
    }

    /// Number of existing files
    pub fn file_count(&self) -> usize {
        self.state.read().metadata.entries.used_count()
    }

    /// Blocks holding the content of `name`, in chain order
    pub fn chain(&self, name: &str) -> Result<Vec<usize>> {
        let state = self.state.read();
        let entry = state
            .metadata
            .entries
            .lookup(name)
            .and_then(|slot| state.metadata.entries.get(slot))
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        state.metadata.blocks.chain(entry.first_block)
    }

    /// Snapshot of the committed metadata
    pub fn metadata(&self) -> Metadata {
        self.state.read().metadata.clone()
    }

    /// False once a failed mutation could not be followed by a reload
    pub fn is_available(&self) -> bool {
        self.state.read().available
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Run `apply` against staged metadata under the exclusive lock
    ///
    /// The staged copy is persisted and committed only if `apply` succeeds.
    fn mutate<T>(
        &self,
        op: &str,
        name: &str,
        apply: impl FnOnce(&mut Metadata, &mut D) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.write();
        if !state.available {
            return Err(FsError::Unavailable);
        }

        let mut device = self.device.lock();
        let mut staged = state.metadata.clone();

        let outcome = apply(&mut staged, &mut *device).and_then(|value| {
            staged.save(&mut *device, &self.geometry)?;
            Ok(value)
        });

        match outcome {
            Ok(value) => {
                state.metadata = staged;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!("{} {} failed: {}", op, name, err);
                if matches!(err, FsError::Io(_)) {
                    match Metadata::load(&mut *device, &self.geometry) {
                        Ok(metadata) => {
                            state.metadata = metadata;
                            tracing::info!("Metadata reloaded after failed {}", op);
                        }
                        Err(reload_err) => {
                            state.available = false;
                            tracing::error!(
                                "Reload after failed {} also failed, file system unavailable: {}",
                                op,
                                reload_err
                            );
                        }
                    }
                }
                Err(err)
            }
        }
    }
}
