//! yoes-core library.
//!
//! Headwords, typed relations between them, and the two structures derived
//! from that graph: the subclass hierarchy and the teaching-order check.
//!
//! # Conventions
//!
//! - **Errors**: engine mutations return [`error::GraphError`]; persistence,
//!   config and lock plumbing return `anyhow::Result` with context.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod lock;
pub mod model;
pub mod persist;
pub mod store;

pub use error::{ErrorCode, GraphError};
pub use graph::{HierarchyFinding, HierarchyForest, TreeNode, Violation, build_hierarchy, validate};
pub use model::{Edge, EdgeKind, Headword, Level};
pub use persist::{NullPersistence, Persistence, PersistentGraph};
pub use store::{EdgeCommit, GraphStore, SharedStore};
