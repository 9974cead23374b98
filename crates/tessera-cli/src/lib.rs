//! Tessera CLI library
//!
//! Command handlers behind the `tessera` binary. Each handler returns the text
//! it would print so the commands can be exercised without a process.

#![forbid(unsafe_code)]

/// Command handlers
pub mod handlers;

/// File loading helpers
pub mod io;
