//! User-tunable settings from `dotsetup.toml`.
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Interactive shells the configurator knows how to set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    /// Z shell with oh-my-zsh.
    Zsh,
    /// fish with fisher.
    Fish,
}

impl ShellKind {
    /// Executable and package name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Top-level settings document. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `[shell]`
    pub shell: ShellSettings,
    /// `[symlinks]`
    pub symlinks: SymlinkSettings,
    /// `[paths]`
    pub paths: PathSettings,
    /// `[network]`
    pub network: NetworkSettings,
}

/// Shell preference and login-shell switching.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSettings {
    /// Preference order: the first shell that can be installed wins.
    pub preferred: Vec<ShellKind>,
    /// Offer to switch the login shell (always asks first).
    pub change_default: bool,
    /// System list of permitted login shells.
    pub allowed_shells_file: PathBuf,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            preferred: vec![ShellKind::Zsh, ShellKind::Fish],
            change_default: true,
            allowed_shells_file: PathBuf::from("/etc/shells"),
        }
    }
}

/// Symlink manager settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymlinkSettings {
    /// Inserted between the target name and the backup timestamp.
    pub backup_suffix: String,
}

impl Default for SymlinkSettings {
    fn default() -> Self {
        Self {
            backup_suffix: ".backup".to_string(),
        }
    }
}

/// Paths relative to `$HOME`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    /// Completion marker file.
    pub marker: PathBuf,
    /// Destination for downloaded release binaries.
    pub bin_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            marker: PathBuf::from(".dotfiles_setup_complete"),
            bin_dir: PathBuf::from(".local/bin"),
        }
    }
}

/// Limits for network-bound operations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSettings {
    /// Upper bound for API calls and downloads, in seconds.
    pub timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}
