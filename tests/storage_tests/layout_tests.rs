//! Tests for Geometry

use blockfs::storage::Geometry;
use blockfs::FsError;

#[test]
fn test_default_geometry_reserves_two_blocks() {
    // 5 * 15 + 10 * 8 = 155 bytes -> 2 blocks of 128
    let geometry = Geometry::new(128, 5, 10).unwrap();

    assert_eq!(geometry.table_len(), 155);
    assert_eq!(geometry.metadata_blocks(), 2);
    assert_eq!(geometry.data_blocks(), 8);
    assert_eq!(geometry.store_len(), 1280);
}

#[test]
fn test_exact_fit_needs_no_extra_block() {
    let geometry = Geometry::new(155, 5, 10).unwrap();

    assert_eq!(geometry.metadata_blocks(), 1);
    assert_eq!(geometry.data_blocks(), 9);
}

#[test]
fn test_metadata_consuming_every_block_is_rejected() {
    // 155 bytes in 16-byte blocks needs 10 blocks, the whole store
    let result = Geometry::new(16, 5, 10);

    assert!(matches!(result, Err(FsError::Config(_))));
}

#[test]
fn test_too_many_blocks_for_first_block_field() {
    let result = Geometry::new(4096, 5, 40_000);

    assert!(matches!(result, Err(FsError::Config(_))));
}

#[test]
fn test_zero_sizes_rejected() {
    assert!(matches!(Geometry::new(0, 5, 10), Err(FsError::Config(_))));
    assert!(matches!(Geometry::new(128, 0, 10), Err(FsError::Config(_))));
}

#[test]
fn test_blocks_for_rounds_up() {
    let geometry = Geometry::new(128, 5, 10).unwrap();

    assert_eq!(geometry.blocks_for(0), 0);
    assert_eq!(geometry.blocks_for(1), 1);
    assert_eq!(geometry.blocks_for(128), 1);
    assert_eq!(geometry.blocks_for(129), 2);
    assert_eq!(geometry.blocks_for(1024), 8);
}

#[test]
fn test_data_region_bounds() {
    let geometry = Geometry::new(128, 5, 10).unwrap();

    assert!(!geometry.is_data_block(0));
    assert!(!geometry.is_data_block(1));
    assert!(geometry.is_data_block(2));
    assert!(geometry.is_data_block(9));
    assert!(!geometry.is_data_block(10));
}
