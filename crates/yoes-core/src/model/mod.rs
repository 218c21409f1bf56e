//! Value types shared by the store, the hierarchy builder, and the sequence
//! validator.

pub mod edge;
pub mod headword;

pub use edge::{Edge, EdgeKind};
pub use headword::{Headword, Level, headword_key, normalize_name};

use std::fmt;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}
