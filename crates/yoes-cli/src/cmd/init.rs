use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::{Context as _, Result, bail};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use yoes_core::config::{self, PROJECT_DIR, ProjectConfig};
use yoes_core::db::SqlitePersistence;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-initialize even if `.yoes/` already exists. Existing data is kept.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "yoes.db*\nyoes.lock\n";

#[derive(Debug, Serialize)]
struct InitReport {
    root: PathBuf,
    store: PathBuf,
    config_written: bool,
}

/// Execute `yoes init`. Creates the project skeleton:
///
/// ```text
/// .yoes/
///   config.toml   (default project config)
///   yoes.db       (empty, migrated store)
///   .gitignore    (store and lock files)
/// ```
///
/// # Errors
///
/// Returns an error if `.yoes/` already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let yoes_dir = project_root.join(PROJECT_DIR);
    if yoes_dir.exists() && !args.force {
        bail!("{PROJECT_DIR}/ already exists. Use `yoes init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&yoes_dir)
        .with_context(|| format!("Failed to create {}", yoes_dir.display()))?;
    let config_written = config::write_default_project_config(project_root)?;

    let config: ProjectConfig = config::load_project_config(project_root)?;
    let store = config.store_path(project_root);
    drop(SqlitePersistence::open(&store)?);

    let gitignore = yoes_dir.join(".gitignore");
    if !gitignore.exists() {
        std::fs::write(&gitignore, GITIGNORE)
            .with_context(|| format!("Failed to write {}", gitignore.display()))?;
    }

    info!(root = %project_root.display(), "project initialized");

    let report = InitReport {
        root: project_root.to_path_buf(),
        store,
        config_written,
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "initialized {}", r.root.display()),
        |r, w| {
            pretty_section(w, "Initialized yoes project")?;
            pretty_kv(w, "root", r.root.display().to_string())?;
            pretty_kv(w, "store", r.store.display().to_string())?;
            pretty_kv(
                w,
                "config",
                if r.config_written { "written" } else { "kept" },
            )
        },
    )
}
