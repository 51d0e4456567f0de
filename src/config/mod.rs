//! Static configuration: package manifests, the symlink table, and settings.
pub mod manifest;
pub mod settings;
pub mod symlinks;
pub mod toml_loader;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::platform::HostFacts;

/// Settings file name at the repository root.
pub const SETTINGS_FILE: &str = "dotsetup.toml";

/// All loaded configuration for this host.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository root.
    pub root: PathBuf,
    /// Parsed `dotsetup.toml` (defaults when absent).
    pub settings: settings::Settings,
    /// Desired packages from every applicable tier, de-duplicated.
    pub packages: Vec<manifest::PackageSpec>,
    /// Managed configuration links.
    pub symlinks: Vec<symlinks::Symlink>,
}

impl Config {
    /// Load settings, the manifests that apply to `facts`, and the link table.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is malformed or a manifest
    /// exists but cannot be read.
    pub fn load(root: &Path, facts: &HostFacts) -> Result<Self> {
        let settings = toml_loader::load_config(&root.join(SETTINGS_FILE))
            .with_context(|| format!("loading {SETTINGS_FILE}"))?;
        let packages = manifest::load_tiers(&root.join("packages"), &facts.manifest_tiers())
            .context("loading package manifests")?;
        Ok(Self {
            root: root.to_path_buf(),
            settings,
            packages,
            symlinks: symlinks::table(facts.os),
        })
    }

    /// Directory holding link sources.
    #[must_use]
    pub fn symlinks_dir(&self) -> PathBuf {
        self.root.join("symlinks")
    }
}
