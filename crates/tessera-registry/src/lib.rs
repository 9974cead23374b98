//! Tessera Registry - storage, submission and API surface
//!
//! Everything between a publisher's upload or a client's resolve request and
//! the pure core crates:
//!
//! - [`store`]: the [`ManifestStore`] trait and an in-memory implementation
//!   with atomic insert-if-absent
//! - [`submission`]: strip, validate, verify and store one manifest
//! - [`api`]: JSON request handlers mapping the error taxonomy onto HTTP
//!   status codes

#![forbid(unsafe_code)]

/// JSON request handlers
pub mod api;

/// Manifest storage
pub mod store;

/// Submission pipeline
pub mod submission;

pub use api::{handle_resolve, handle_submit, ApiResponse, ResolveRequest};
pub use store::{InMemoryStore, ManifestStore};
pub use submission::{submit, SubmissionReceipt, SubmitOptions};
