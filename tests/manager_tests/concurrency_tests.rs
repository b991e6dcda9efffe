//! Tests for concurrent use of one shared FileSystem

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use blockfs::storage::MemoryDisk;
use blockfs::{FileSystem, FsError, Geometry};

use crate::{memory_fs, pattern};

#[test]
fn test_writers_on_distinct_files() {
    let geometry = Geometry::new(128, 16, 64).unwrap();
    let fs = Arc::new(FileSystem::with_device(geometry, MemoryDisk::new(128, 64)).unwrap());

    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let fs = Arc::clone(&fs);
            thread::spawn(move || {
                let name = format!("file{}", i);
                fs.create(&name).unwrap();
                for round in 0..20u8 {
                    let data = pattern(100 + 10 * round as usize, i.wrapping_add(round));
                    fs.write(&name, &data).unwrap();
                    assert_eq!(fs.read(&name).unwrap(), data);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(fs.file_count(), 8);
    for i in 0..8u8 {
        let name = format!("file{}", i);
        assert_eq!(fs.read(&name).unwrap(), pattern(290, i.wrapping_add(19)));
    }
    assert_eq!(fs.verify().unwrap(), 0);
}

#[test]
fn test_readers_never_see_partial_writes() {
    let fs = Arc::new(memory_fs());
    fs.create("shared").unwrap();
    fs.write("shared", &[b'a'; 200]).unwrap();

    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let fs = Arc::clone(&fs);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0;
                while !done.load(Ordering::SeqCst) || reads == 0 {
                    let data = fs.read("shared").unwrap();
                    let whole_a = data.len() == 200 && data.iter().all(|&b| b == b'a');
                    let whole_b = data.len() == 300 && data.iter().all(|&b| b == b'b');
                    assert!(whole_a || whole_b, "torn read of {} bytes", data.len());
                    reads += 1;
                }
            })
        })
        .collect();

    for round in 0..200 {
        if round % 2 == 0 {
            fs.write("shared", &[b'b'; 300]).unwrap();
        } else {
            fs.write("shared", &[b'a'; 200]).unwrap();
        }
    }
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_concurrent_create_same_name() {
    let fs = Arc::new(memory_fs());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let fs = Arc::clone(&fs);
            thread::spawn(move || fs.create("race.txt"))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let created = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(FsError::AlreadyExists(_))))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(fs.file_count(), 1);
}

#[test]
fn test_list_during_creates_and_deletes() {
    let fs = Arc::new(memory_fs());

    let writer = {
        let fs = Arc::clone(&fs);
        thread::spawn(move || {
            for _ in 0..100 {
                fs.create("tmp").unwrap();
                fs.delete("tmp").unwrap();
            }
        })
    };

    for _ in 0..100 {
        let files = fs.list();
        assert!(files.len() <= 1);
    }

    writer.join().unwrap();
    assert!(fs.list().is_empty());
}
