//! Subcommand handlers and the project plumbing they share.

pub mod add;
pub mod check;
pub mod init;
pub mod level;
pub mod link;
pub mod list;
pub mod remove;
pub mod show;
pub mod tree;
pub mod unlink;

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use yoes_core::config::{self, PROJECT_DIR, ProjectConfig};
use yoes_core::db::SqlitePersistence;
use yoes_core::error::{ErrorCode, GraphError};
use yoes_core::lock::{DEFAULT_LOCK_TIMEOUT, StoreLock};
use yoes_core::persist::PersistentGraph;

/// The graph as every handler sees it.
pub type ProjectGraph = PersistentGraph<SqlitePersistence>;

// ---------------------------------------------------------------------------
// Host errors
// ---------------------------------------------------------------------------

/// Failures that only exist at the command-line boundary.
#[derive(Debug)]
pub enum HostError {
    /// No `.yoes/` directory in the working directory or any ancestor.
    NotInitialized(PathBuf),
    /// The store loaded but its rows break a graph invariant.
    CorruptStore { path: PathBuf, detail: String },
    /// `yoes check` found violations and the project treats them as fatal.
    Violations(usize),
    /// The headword exists but no root reaches it.
    NotInHierarchy(String),
}

impl HostError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized(_) => ErrorCode::NotInitialized,
            Self::CorruptStore { .. } => ErrorCode::CorruptStore,
            Self::Violations(_) => ErrorCode::SequenceViolation,
            Self::NotInHierarchy(_) => ErrorCode::NotInHierarchy,
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized(dir) => {
                write!(f, "no yoes project found at or above {}", dir.display())
            }
            Self::CorruptStore { path, detail } => {
                write!(f, "store {} is inconsistent: {detail}", path.display())
            }
            Self::Violations(1) => f.write_str("1 sequence violation"),
            Self::Violations(n) => write!(f, "{n} sequence violations"),
            Self::NotInHierarchy(name) => {
                write!(f, "{name} is unattached: no level-0 headword reaches it")
            }
        }
    }
}

impl std::error::Error for HostError {}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// An initialized project: its root directory and effective config.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    /// Find the project that contains `cwd` and load its config.
    pub fn discover(cwd: &Path) -> Result<Self> {
        let root = config::find_project_root(cwd)
            .ok_or_else(|| HostError::NotInitialized(cwd.to_path_buf()))?;
        let config = config::load_project_config(&root)?;
        debug!(root = %root.display(), "project found");
        Ok(Self { root, config })
    }

    pub fn lock_path(&self) -> PathBuf {
        lock_path(&self.root)
    }

    pub fn store_path(&self) -> PathBuf {
        self.config.store_path(&self.root)
    }

    /// Load the graph under an exclusive lock for a mutating command.
    pub fn open_write(&self) -> Result<(StoreLock, ProjectGraph)> {
        let lock = StoreLock::exclusive(&self.lock_path(), DEFAULT_LOCK_TIMEOUT)?;
        let graph = self.load()?;
        Ok((lock, graph))
    }

    /// Load the graph under a shared lock for a read-only command.
    pub fn open_read(&self) -> Result<(StoreLock, ProjectGraph)> {
        let lock = StoreLock::shared(&self.lock_path(), DEFAULT_LOCK_TIMEOUT)?;
        let graph = self.load()?;
        Ok((lock, graph))
    }

    fn load(&self) -> Result<ProjectGraph> {
        let path = self.store_path();
        let persistence = SqlitePersistence::open(&path)?;
        PersistentGraph::open(persistence).map_err(|err| {
            if err.chain().any(|cause| cause.is::<GraphError>()) {
                HostError::CorruptStore {
                    path,
                    detail: format!("{err:#}"),
                }
                .into()
            } else {
                err
            }
        })
    }
}

/// Lock file guarding the store of the project rooted at `root`.
pub fn lock_path(root: &Path) -> PathBuf {
    root.join(PROJECT_DIR).join("yoes.lock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_outside_project_is_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::discover(dir.path()).unwrap_err();
        let host = err.downcast_ref::<HostError>().unwrap();
        assert_eq!(host.code(), ErrorCode::NotInitialized);
    }

    #[test]
    fn discover_walks_up_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(PROJECT_DIR)).unwrap();
        let nested = dir.path().join("chapters/physics");
        std::fs::create_dir_all(&nested).unwrap();

        let project = Project::discover(&nested).unwrap();
        assert_eq!(project.root, dir.path());
        assert_eq!(project.lock_path(), dir.path().join(".yoes/yoes.lock"));
        assert_eq!(project.store_path(), dir.path().join(".yoes/yoes.db"));
    }

    #[test]
    fn write_then_read_round_trips_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(PROJECT_DIR)).unwrap();
        let project = Project::discover(dir.path()).unwrap();

        {
            let (_lock, mut graph) = project.open_write().unwrap();
            graph
                .upsert_headword("Force", yoes_core::Level::ROOT)
                .unwrap();
        }

        let (_lock, graph) = project.open_read().unwrap();
        assert!(graph.store().contains("force"));
    }

    #[test]
    fn violation_count_reads_naturally() {
        assert_eq!(HostError::Violations(1).to_string(), "1 sequence violation");
        assert_eq!(HostError::Violations(3).to_string(), "3 sequence violations");
    }
}
