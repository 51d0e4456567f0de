//! Command: forget that setup has completed.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::config::SETTINGS_FILE;
use crate::config::settings::Settings;
use crate::config::toml_loader;
use crate::logging::Log;
use crate::resources::marker::MarkerResource;
use crate::resources::{Applicable as _, ResourceChange};

/// Remove the completion marker.
///
/// The marker location comes from the repository settings when a root can
/// be resolved, and from the defaults otherwise.
///
/// # Errors
///
/// Returns an error if `HOME` is unset, the settings file is malformed, or
/// the marker cannot be removed.
pub fn run(global: &GlobalOpts, log: &dyn Log) -> Result<()> {
    let settings = match super::resolve_root(global) {
        Ok(root) => toml_loader::load_config::<Settings>(&root.join(SETTINGS_FILE))?,
        Err(_) => Settings::default(),
    };
    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    let marker = PathBuf::from(home).join(&settings.paths.marker);
    reset_marker(&marker, global.dry_run, log)
}

/// Delete the marker at `path`; absence is reported, not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn reset_marker(path: &Path, dry_run: bool, log: &dyn Log) -> Result<()> {
    let marker = MarkerResource::new(path.to_path_buf());
    if !marker.exists() {
        log.info(&format!("no marker at {}; nothing to reset", path.display()));
        return Ok(());
    }
    if dry_run {
        log.dry_run(&format!("would remove {}", marker.description()));
        return Ok(());
    }
    if marker.remove()? == ResourceChange::Applied {
        log.info(&format!("removed {}", path.display()));
    }
    Ok(())
}
