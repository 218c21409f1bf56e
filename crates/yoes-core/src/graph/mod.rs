//! Read-only structures derived from the headword graph.
//!
//! Both consumers borrow a [`GraphStore`](crate::store::GraphStore) (or
//! plain data taken from one) and return owned values, so they can run
//! side by side against the same snapshot.
//!
//! ## Submodules
//!
//! - [`hierarchy`]: forest of `SubClass` trees rooted at level-0 headwords,
//!   with cycle and unattached-headword findings.
//! - [`sequence`]: reports `Depends` edges that point forward in a teaching
//!   order.

pub mod hierarchy;
pub mod sequence;

pub use hierarchy::{HierarchyFinding, HierarchyForest, TreeNode, build_hierarchy};
pub use sequence::{DependencyLink, SequenceValidator, Violation, Violations, validate};

use crate::store::GraphStore;

/// Build the forest and validate the store's `Depends` edges against its
/// flattened order.
pub fn check_store(store: &GraphStore) -> (HierarchyForest, Vec<Violation>) {
    let forest = build_hierarchy(store);
    let violations = validate(&forest.flatten(), store.depends_edges());
    (forest, violations)
}
