//! Teaching-order validation for `Depends` edges.
//!
//! Given a linear order over headwords (usually
//! [`HierarchyForest::flatten`](super::hierarchy::HierarchyForest::flatten))
//! and a collection of dependency edges, report every edge whose target is
//! introduced after its source: a headword cannot depend on something
//! taught later.
//!
//! # Rules
//!
//! - `Depends(from, to)` is a violation iff `pos(to) > pos(from)`.
//! - Edges with an endpoint missing from the order are skipped; partial
//!   orders are normal while the hierarchy is being edited.
//! - Edges of any other kind are ignored.
//! - Violations come out lazily, in the iteration order of the input edges.
//!
//! The validator never fails. "No violations" and "nothing to check" are
//! both an empty sequence.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
)]

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::model::{Edge, EdgeKind, headword_key};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Something that may carry a dependency `(from, to)`.
///
/// [`Edge`] yields its endpoints only when it is a `Depends` edge. Plain
/// name pairs are always read as dependencies.
pub trait DependencyLink {
    fn dependency(&self) -> Option<(&str, &str)>;
}

impl DependencyLink for Edge {
    fn dependency(&self) -> Option<(&str, &str)> {
        (self.kind == EdgeKind::Depends).then_some((self.from.as_str(), self.to.as_str()))
    }
}

impl<A: AsRef<str>, B: AsRef<str>> DependencyLink for (A, B) {
    fn dependency(&self) -> Option<(&str, &str)> {
        Some((self.0.as_ref(), self.1.as_ref()))
    }
}

impl<T: DependencyLink + ?Sized> DependencyLink for &T {
    fn dependency(&self) -> Option<(&str, &str)> {
        (**self).dependency()
    }
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// A dependency whose target is positioned after its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Violation {
    pub from: String,
    pub to: String,
    pub from_pos: usize,
    pub to_pos: usize,
}

impl Violation {
    /// How many places too late the dependency is introduced.
    pub const fn distance(&self) -> usize {
        self.to_pos - self.from_pos
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' (#{}) depends on '{}' (#{}), which is introduced later",
            self.from, self.from_pos, self.to, self.to_pos
        )
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Position index over one linear order.
#[derive(Debug, Clone, Default)]
pub struct SequenceValidator {
    /// key → position of first occurrence.
    positions: HashMap<String, usize>,
    len: usize,
}

impl SequenceValidator {
    /// Index `order`. A repeated name keeps its first position.
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positions = HashMap::new();
        let mut len = 0;
        for (pos, name) in order.into_iter().enumerate() {
            positions.entry(headword_key(name.as_ref())).or_insert(pos);
            len = pos + 1;
        }
        Self { positions, len }
    }

    /// Position of `name` in the order, matching by key.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(&headword_key(name)).copied()
    }

    /// Length of the indexed order.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lazily enumerate the violations among `edges`.
    ///
    /// Nothing is computed until the iterator is advanced. Calling this
    /// again (or cloning the iterator when the source is `Clone`) starts
    /// over.
    pub fn violations<I>(&self, edges: I) -> Violations<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: DependencyLink,
    {
        Violations {
            validator: self,
            edges: edges.into_iter(),
        }
    }

    fn check(&self, link: &impl DependencyLink) -> Option<Violation> {
        let (from, to) = link.dependency()?;
        let from_pos = self.position(from)?;
        let to_pos = self.position(to)?;
        (to_pos > from_pos).then(|| Violation {
            from: from.to_string(),
            to: to.to_string(),
            from_pos,
            to_pos,
        })
    }
}

/// Lazy iterator returned by [`SequenceValidator::violations`].
#[derive(Debug, Clone)]
pub struct Violations<'v, It> {
    validator: &'v SequenceValidator,
    edges: It,
}

impl<It> Iterator for Violations<'_, It>
where
    It: Iterator,
    It::Item: DependencyLink,
{
    type Item = Violation;

    fn next(&mut self) -> Option<Self::Item> {
        let validator = self.validator;
        self.edges.find_map(|link| validator.check(&link))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.edges.size_hint().1)
    }
}

/// Validate `edges` against `order` and collect every violation.
pub fn validate<S, I>(order: &[S], edges: I) -> Vec<Violation>
where
    S: AsRef<str>,
    I: IntoIterator,
    I::Item: DependencyLink,
{
    SequenceValidator::new(order).violations(edges).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
