use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding project state, relative to the project root.
pub const PROJECT_DIR: &str = ".yoes";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    #[serde(default)]
    pub sequence: SequenceConfig,
}

impl ProjectConfig {
    /// Absolute path of the SQLite store for a project rooted at `root`.
    ///
    /// Relative `store.path` values resolve against the `.yoes/` directory.
    #[must_use]
    pub fn store_path(&self, root: &Path) -> PathBuf {
        let dir = root.join(PROJECT_DIR);
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            dir.join(&self.store.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Label of the pseudo-root that groups unattached headwords in output.
    #[serde(default = "default_unattached_bucket")]
    pub unattached_bucket: String,
    #[serde(default = "default_true")]
    pub show_unattached: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            unattached_bucket: default_unattached_bucket(),
            show_unattached: default_true(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(default)]
    pub fail_on_violation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// Path of the project config file for a project rooted at `project_root`.
#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR).join("config.toml")
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("yoes/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Walk up from `start` to the nearest directory containing `.yoes/`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Write a default project config unless one already exists.
///
/// Returns `true` when a file was written.
pub fn write_default_project_config(project_root: &Path) -> Result<bool> {
    let path = project_config_path(project_root);
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(&ProjectConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

const fn default_true() -> bool {
    true
}

fn default_store_path() -> PathBuf {
    PathBuf::from("yoes.db")
}

fn default_unattached_bucket() -> String {
    "Undefined".to_string()
}
