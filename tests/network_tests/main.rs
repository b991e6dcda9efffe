//! Tests for the TCP server and client
//!
//! These tests verify:
//! - End-to-end request handling over real sockets
//! - Error replies that keep the connection open
//! - Session end on EXIT
//! - Concurrent clients against one shared file system
//! - Clean shutdown
