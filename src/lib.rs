//! # blockfs
//!
//! A small persistent file store over a single fixed-size backing file:
//! - Flat namespace of fixed-width entries
//! - File data kept in singly-linked block chains (a minimal FAT)
//! - Metadata persisted after every mutation
//! - Single reader-writer lock around every operation
//! - Line-based TCP protocol for remote clients
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  FileSystem Manager                          │
//! │        (RwLock: shared for read/list, exclusive for          │
//! │              create/write/delete)                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────┐
//!          │            │             │
//!          ▼            ▼             ▼
//!   ┌────────────┐ ┌───────────┐ ┌────────────┐
//!   │ Entry      │ │ Block     │ │ Metadata   │
//!   │ Table      │ │ Allocator │ │ Codec      │
//!   └────────────┘ └─────┬─────┘ └─────┬──────┘
//!                        │             │
//!                        ▼             ▼
//!                  ┌─────────────────────────┐
//!                  │      Backing Store      │
//!                  │   (fixed-size blocks)   │
//!                  └─────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod manager;
pub mod network;
pub mod protocol;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{FsError, Result};
pub use manager::FileSystem;
pub use storage::{FileInfo, Geometry};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blockfs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
