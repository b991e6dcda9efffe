//! Tests for behavior when the backing store fails mid-operation

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use blockfs::storage::{BlockDevice, MemoryDisk};
use blockfs::{FileSystem, FsError};

use crate::{default_geometry, pattern};

/// Switches shared between a test and its `FaultyDisk`
struct Faults {
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    /// Block writes allowed before every further write fails
    /// (`usize::MAX` = unlimited)
    writes_left: AtomicUsize,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            writes_left: AtomicUsize::new(usize::MAX),
        }
    }
}

/// In-memory store that can be told to fail reads or writes
struct FaultyDisk {
    inner: MemoryDisk,
    faults: Arc<Faults>,
}

fn injected() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "injected fault")
}

impl BlockDevice for FaultyDisk {
    fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    fn block_count(&self) -> usize {
        self.inner.block_count()
    }

    fn is_blank(&self) -> bool {
        self.inner.is_blank()
    }

    fn read_block(&mut self, block: usize, buf: &mut [u8]) -> io::Result<()> {
        if self.faults.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.read_block(block, buf)
    }

    fn write_block(&mut self, block: usize, buf: &[u8]) -> io::Result<()> {
        if self.faults.fail_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let budget = self
            .faults
            .writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                usize::MAX => Some(n),
                0 => None,
                n => Some(n - 1),
            });
        if budget.is_err() {
            return Err(injected());
        }
        self.inner.write_block(block, buf)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.inner.sync()
    }
}

fn faulty_fs() -> (FileSystem<FaultyDisk>, Arc<Faults>) {
    let faults = Arc::new(Faults::default());
    let disk = FaultyDisk {
        inner: MemoryDisk::new(128, 10),
        faults: Arc::clone(&faults),
    };
    let fs = FileSystem::with_device(default_geometry(), disk).unwrap();
    (fs, faults)
}

#[test]
fn test_failed_create_leaves_table_unchanged() {
    let (fs, faults) = faulty_fs();
    faults.fail_writes.store(true, Ordering::SeqCst);

    let result = fs.create("a.txt");

    assert!(matches!(result, Err(FsError::Io(_))));
    assert!(fs.list().is_empty());
    assert!(fs.is_available());
}

#[test]
fn test_failed_write_reloads_committed_metadata() {
    let (fs, faults) = faulty_fs();
    fs.create("a.txt").unwrap();
    fs.create("b.txt").unwrap();
    fs.write("b.txt", &pattern(200, 4)).unwrap();
    let before = fs.metadata();

    faults.fail_writes.store(true, Ordering::SeqCst);
    let result = fs.write("a.txt", &pattern(300, 1));

    assert!(matches!(result, Err(FsError::Io(_))));
    assert_eq!(fs.metadata(), before);
    assert!(fs.is_available());
    assert_eq!(fs.read("b.txt").unwrap(), pattern(200, 4));

    faults.fail_writes.store(false, Ordering::SeqCst);
    fs.write("a.txt", &pattern(300, 1)).unwrap();
    assert_eq!(fs.read("a.txt").unwrap(), pattern(300, 1));
}

#[test]
fn test_failed_delete_keeps_file() {
    let (fs, faults) = faulty_fs();
    fs.create("a.txt").unwrap();
    fs.write("a.txt", b"hello").unwrap();

    faults.fail_writes.store(true, Ordering::SeqCst);
    let result = fs.delete("a.txt");

    assert!(matches!(result, Err(FsError::Io(_))));
    assert_eq!(fs.file_count(), 1);
    assert_eq!(fs.chain("a.txt").unwrap(), vec![2]);
}

#[test]
fn test_unavailable_until_reload_succeeds() {
    let (fs, faults) = faulty_fs();
    fs.create("a.txt").unwrap();
    fs.write("a.txt", b"hello").unwrap();

    faults.fail_writes.store(true, Ordering::SeqCst);
    faults.fail_reads.store(true, Ordering::SeqCst);
    assert!(matches!(fs.create("b.txt"), Err(FsError::Io(_))));
    assert!(!fs.is_available());

    faults.fail_writes.store(false, Ordering::SeqCst);
    faults.fail_reads.store(false, Ordering::SeqCst);
    assert!(matches!(fs.create("b.txt"), Err(FsError::Unavailable)));
    assert!(matches!(fs.read("a.txt"), Err(FsError::Unavailable)));

    fs.reload().unwrap();

    assert!(fs.is_available());
    assert_eq!(fs.read("a.txt").unwrap(), b"hello".to_vec());
    fs.create("b.txt").unwrap();
    assert_eq!(fs.file_count(), 2);
}

#[test]
fn test_reload_fails_while_store_unreadable() {
    let (fs, faults) = faulty_fs();
    faults.fail_writes.store(true, Ordering::SeqCst);
    faults.fail_reads.store(true, Ordering::SeqCst);
    let _ = fs.create("a.txt");

    assert!(matches!(fs.reload(), Err(FsError::Io(_))));
    assert!(!fs.is_available());
}

#[test]
fn test_rejected_operation_does_not_touch_store() {
    let (fs, faults) = faulty_fs();
    fs.create("a.txt").unwrap();

    // Fails validation before any I/O, so no reload is attempted
    faults.fail_writes.store(true, Ordering::SeqCst);
    faults.fail_reads.store(true, Ordering::SeqCst);
    assert!(matches!(fs.create("a.txt"), Err(FsError::AlreadyExists(_))));
    assert!(matches!(
        fs.write("a.txt", &vec![0u8; 2000]),
        Err(FsError::InsufficientSpace { .. })
    ));

    assert!(fs.is_available());
}

#[test]
fn test_failed_save_after_data_write_exposes_truncated_new_content() {
    let (fs, faults) = faulty_fs();
    fs.create("a.txt").unwrap();
    fs.write("a.txt", b"hello").unwrap();

    // Zeroing the old block and writing the new data succeed; the
    // metadata save that follows does not
    faults.writes_left.store(2, Ordering::SeqCst);
    let result = fs.write("a.txt", b"WORLD!");

    assert!(matches!(result, Err(FsError::Io(_))));
    assert!(fs.is_available());
    assert_eq!(fs.chain("a.txt").unwrap(), vec![2]);
    // Old size, new bytes: the reused block already holds the rewrite
    assert_eq!(fs.read("a.txt").unwrap(), b"WORLD".to_vec());
}

#[test]
fn test_failed_data_write_exposes_zeroed_block() {
    let (fs, faults) = faulty_fs();
    fs.create("a.txt").unwrap();
    fs.write("a.txt", b"hello").unwrap();

    // Only the zeroing of the old block goes through
    faults.writes_left.store(1, Ordering::SeqCst);
    let result = fs.write("a.txt", b"WORLD!");

    assert!(matches!(result, Err(FsError::Io(_))));
    assert_eq!(fs.read("a.txt").unwrap(), vec![0u8; 5]);
}
