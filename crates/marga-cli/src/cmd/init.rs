use anyhow::{Context as _, Result};
use clap::Args;
use marga_core::config::{CONFIG_TEMPLATE, MARGA_DIR, load_project_config};
use marga_core::store::SqliteStore;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::output::{OutputMode, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite the config template even if `.marga/` already exists.
    /// The project store is kept.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitOutput {
    config: String,
    store: String,
}

/// Execute `mg init`. Creates the workspace skeleton:
///
/// ```text
/// .marga/
///   config.toml   (default config template)
///   marga.db      (empty project store, at the configured path)
/// ```
///
/// # Errors
///
/// Returns an error if `.marga/` already exists and `--force` is not set,
/// or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let marga_dir = project_root.join(MARGA_DIR);

    if marga_dir.exists() && !args.force {
        anyhow::bail!("{MARGA_DIR}/ already exists. Use `mg init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&marga_dir)
        .with_context(|| format!("Failed to create {}", marga_dir.display()))?;

    let config_path = marga_dir.join("config.toml");
    std::fs::write(&config_path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let config = load_project_config(project_root)?;
    let store_path = config.store.resolve(project_root);
    SqliteStore::open(&store_path)
        .with_context(|| format!("Failed to create project store: {}", store_path.display()))?;

    info!(root = %project_root.display(), "workspace initialized");

    let payload = InitOutput {
        config: config_path.display().to_string(),
        store: store_path.display().to_string(),
    };
    render_mode(
        output,
        &payload,
        |p, w| writeln!(w, "{}\t{}", p.config, p.store),
        |p, w| {
            writeln!(w, "✓ Initialized {MARGA_DIR}/ workspace.")?;
            writeln!(w)?;
            pretty_kv(w, "Config", &p.config)?;
            pretty_kv(w, "Store", &p.store)?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(
                w,
                "  mg project create --name \"Jalan Melati\" --start 2024-01-01 --end 2024-06-30"
            )?;
            writeln!(w, "  mg boq add <project> --quantity 100 --unit-price 250000")
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_config_and_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).expect("init");
        assert!(dir.path().join(".marga/config.toml").is_file());
        assert!(dir.path().join(".marga/marga.db").is_file());
    }

    #[test]
    fn second_init_requires_force() {
        let dir = tempfile::tempdir().expect("temp dir");
        run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).expect("init");
        let err = run_init(&InitArgs { force: false }, OutputMode::Json, dir.path())
            .expect_err("already initialized");
        assert!(err.to_string().contains("--force"));
        run_init(&InitArgs { force: true }, OutputMode::Json, dir.path()).expect("forced");
    }
}
