use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// Typed relation between two headwords.
///
/// `RDepends` and `SuperClass` are view-level inverses: they are never
/// stored. [`EdgeKind::canonicalize`] maps them onto the forward kind with
/// swapped endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// A reference with no declared meaning.
    Undefined,
    /// `from` requires `to` to be understood first.
    Depends,
    /// `from` is a specialization of `to` and sits under it in the hierarchy.
    SubClass,
    /// Inverse of `Depends`: `to` requires `from`.
    RDepends,
    /// Inverse of `SubClass`: `to` is a specialization of `from`.
    SuperClass,
}

impl EdgeKind {
    pub const ALL: [Self; 5] = [
        Self::Undefined,
        Self::Depends,
        Self::SubClass,
        Self::RDepends,
        Self::SuperClass,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Depends => "depends",
            Self::SubClass => "subclass",
            Self::RDepends => "rdepends",
            Self::SuperClass => "superclass",
        }
    }

    /// Returns `true` for the kinds that are stored as-is.
    pub const fn is_canonical(self) -> bool {
        matches!(self, Self::Undefined | Self::Depends | Self::SubClass)
    }

    /// Map a kind onto its stored form.
    ///
    /// Returns the canonical kind and whether the endpoints must be swapped.
    pub const fn canonicalize(self) -> (Self, bool) {
        match self {
            Self::RDepends => (Self::Depends, true),
            Self::SuperClass => (Self::SubClass, true),
            other => (other, false),
        }
    }

    /// The kind that reads the same relation from the other endpoint.
    pub const fn inverse(self) -> Self {
        match self {
            Self::Undefined => Self::Undefined,
            Self::Depends => Self::RDepends,
            Self::SubClass => Self::SuperClass,
            Self::RDepends => Self::Depends,
            Self::SuperClass => Self::SubClass,
        }
    }

    /// Integer code used by persistence. Inverse kinds have none.
    pub const fn type_code(self) -> Option<i64> {
        match self {
            Self::Undefined => Some(0),
            Self::Depends => Some(1),
            Self::SubClass => Some(2),
            Self::RDepends | Self::SuperClass => None,
        }
    }

    /// Decode a persisted integer code.
    pub const fn from_type_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Undefined),
            1 => Some(Self::Depends),
            2 => Some(Self::SubClass),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "undefined" => Ok(Self::Undefined),
            "depends" => Ok(Self::Depends),
            "subclass" => Ok(Self::SubClass),
            "rdepends" => Ok(Self::RDepends),
            "superclass" => Ok(Self::SuperClass),
            _ => Err(ParseEnumError {
                expected: "edge kind",
                got: s.to_string(),
            }),
        }
    }
}

/// A typed directed edge between two headwords, by display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }

    /// Rewrite an inverse-kind edge into its stored form.
    #[must_use]
    pub fn canonical(self) -> Self {
        match self.kind.canonicalize() {
            (kind, true) => Self {
                from: self.to,
                to: self.from,
                kind,
            },
            (kind, false) => Self { kind, ..self },
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.kind, self.to)
    }
}
