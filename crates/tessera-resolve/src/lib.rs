//! Tessera Resolve - dependency resolution
//!
//! Turns a root `id@version` and a [`Catalog`](tessera_core::Catalog) snapshot
//! into an ordered install plan:
//!
//! - [`graph`]: depth-first walk with gray/black coloring, highest satisfying
//!   version selection, cycle and version-clash detection, and a longest-path
//!   depth bound
//! - [`interfaces`]: `requires` versus `provides` across the resolved set
//! - [`orchestrator`]: validation, signatures, walk and interface check
//!   composed into [`resolve`]
//!
//! All of it is synchronous and reads the catalog immutably; concurrent
//! resolve calls need no coordination.

#![forbid(unsafe_code)]

/// Dependency graph walk
pub mod graph;

/// Interface satisfaction
pub mod interfaces;

/// Resolution entry point
pub mod orchestrator;

pub use graph::{DependencyGraphResolver, PlanAction, PlanEntry, Resolution, ResolutionNode};
pub use interfaces::{check as check_interfaces, InterfaceReport};
pub use orchestrator::{resolve, ResolveOptions, ResolveOutcome};
