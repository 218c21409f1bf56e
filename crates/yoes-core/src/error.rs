use std::fmt;

/// Machine-readable error codes for host-side decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidName,
    UnknownHeadword,
    SelfReference,
    InvalidLevel,
    InvalidEdgeKind,
    NotInHierarchy,
    CycleDetected,
    CorruptStore,
    StoreWriteFailed,
    LockContention,
    SequenceViolation,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidName => "E2001",
            Self::UnknownHeadword => "E2002",
            Self::SelfReference => "E2003",
            Self::InvalidLevel => "E2004",
            Self::InvalidEdgeKind => "E2005",
            Self::NotInHierarchy => "E2006",
            Self::CycleDetected => "E3001",
            Self::SequenceViolation => "E3002",
            Self::CorruptStore => "E4001",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidName => "Invalid headword name",
            Self::UnknownHeadword => "Headword not found",
            Self::SelfReference => "Edge endpoints are identical",
            Self::InvalidLevel => "Invalid headword level",
            Self::InvalidEdgeKind => "Invalid edge kind",
            Self::NotInHierarchy => "Headword is not in the hierarchy",
            Self::CycleDetected => "Subclass cycle in hierarchy",
            Self::SequenceViolation => "Dependency introduced after its dependent",
            Self::CorruptStore => "Corrupt headword store",
            Self::StoreWriteFailed => "Store write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to the editor.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `yoes init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .yoes/config.toml and retry."),
            Self::InvalidName => Some("Headword names must contain at least one visible character."),
            Self::UnknownHeadword => Some("Add the headword first with `yoes add <name>`."),
            Self::SelfReference => Some("A headword cannot reference itself."),
            Self::InvalidLevel => Some("Use -1 (unknown) or a non-negative depth."),
            Self::InvalidEdgeKind => {
                Some("Use one of: undefined, depends, subclass, rdepends, superclass.")
            }
            Self::NotInHierarchy => {
                Some("Link it under a level-0 headword with `yoes link <name> <parent> --kind subclass`.")
            }
            Self::CycleDetected => Some("Remove one subclass link to break the loop."),
            Self::SequenceViolation => {
                Some("Reorder the hierarchy or reverse the dependency link.")
            }
            Self::CorruptStore => Some("The store references missing headwords; restore a backup."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `yoes` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by Graph Store mutations.
///
/// Every variant is raised before the store is touched, so a failed call
/// leaves the store exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The name is empty after whitespace normalization.
    #[error("invalid headword name: {0:?}")]
    InvalidName(String),

    /// The operation referenced a headword that is not in the store.
    #[error("unknown headword: '{0}'")]
    UnknownHeadword(String),

    /// Both edge endpoints name the same headword.
    #[error("headword '{0}' cannot reference itself")]
    SelfReference(String),

    /// A raw level value below -1.
    #[error("invalid level {0}: expected -1 (unknown) or a non-negative depth")]
    InvalidLevel(i64),
}

impl GraphError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidName(_) => ErrorCode::InvalidName,
            Self::UnknownHeadword(_) => ErrorCode::UnknownHeadword,
            Self::SelfReference(_) => ErrorCode::SelfReference,
            Self::InvalidLevel(_) => ErrorCode::InvalidLevel,
        }
    }
}
