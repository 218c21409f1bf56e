use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;
use crate::error::GraphError;

/// Collapse whitespace runs to single spaces and trim both ends.
///
/// Returns `None` when nothing visible remains.
pub fn normalize_name(raw: &str) -> Option<String> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Identity key for a headword name: normalized and case-folded.
///
/// Two names with the same key refer to the same headword. An empty key
/// means the name is invalid.
pub fn headword_key(raw: &str) -> String {
    normalize_name(raw)
        .map(|name| name.to_lowercase())
        .unwrap_or_default()
}

/// Declared depth of a headword in the hierarchy.
///
/// Persisted as an integer: `-1` for [`Level::Unknown`], the depth otherwise.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "i64", try_from = "i64")]
pub enum Level {
    /// Not yet classified.
    #[default]
    Unknown,
    /// Depth below a root; `Depth(0)` is a root.
    Depth(u32),
}

impl Level {
    pub const ROOT: Self = Self::Depth(0);

    /// Returns `true` for `Depth(0)`.
    pub const fn is_root(self) -> bool {
        matches!(self, Self::Depth(0))
    }

    /// Integer form used by persistence: `-1` or the depth.
    pub fn to_raw(self) -> i64 {
        match self {
            Self::Unknown => -1,
            Self::Depth(depth) => i64::from(depth),
        }
    }
}

impl TryFrom<i64> for Level {
    type Error = GraphError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(Self::Unknown),
            depth if depth >= 0 => u32::try_from(depth)
                .map(Self::Depth)
                .map_err(|_| GraphError::InvalidLevel(raw)),
            _ => Err(GraphError::InvalidLevel(raw)),
        }
    }
}

impl From<Level> for i64 {
    fn from(level: Level) -> Self {
        level.to_raw()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Depth(depth) => write!(f, "{depth}"),
        }
    }
}

impl FromStr for Level {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("unknown") {
            return Ok(Self::Unknown);
        }
        trimmed
            .parse::<i64>()
            .ok()
            .and_then(|raw| Self::try_from(raw).ok())
            .ok_or_else(|| ParseEnumError {
                expected: "level",
                got: s.to_string(),
            })
    }
}

/// A named topic node in the encyclopedia graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headword {
    /// Display spelling, already whitespace-normalized.
    pub name: String,
    pub level: Level,
}

impl Headword {
    /// Build a headword from raw text.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidName`] if `raw` is empty after
    /// normalization.
    pub fn new(raw: &str, level: Level) -> Result<Self, GraphError> {
        let name = normalize_name(raw).ok_or_else(|| GraphError::InvalidName(raw.to_string()))?;
        Ok(Self { name, level })
    }

    /// Identity key of this headword.
    pub fn key(&self) -> String {
        headword_key(&self.name)
    }
}
