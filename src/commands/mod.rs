//! Top-level subcommand orchestration.
pub mod reset;
pub mod run;
pub mod version;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;

/// Environment variable naming the repository root.
pub const ROOT_ENV: &str = "DOTSETUP_ROOT";

/// Whether `dir` looks like a provisioning repository.
#[must_use]
pub fn looks_like_root(dir: &Path) -> bool {
    dir.join("packages").is_dir() || dir.join("symlinks").is_dir()
}

/// Resolve the repository root: `--root`, then `DOTSETUP_ROOT`, then the
/// binary's location, then the current directory.
///
/// # Errors
///
/// Returns an error if none of the candidates is a repository.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(ref root) = global.root {
        return Ok(root.clone());
    }

    if let Ok(root) = std::env::var(ROOT_ENV)
        && !root.is_empty()
    {
        return Ok(PathBuf::from(root));
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(parent) = exe.parent()
    {
        // target/release/ or bin/
        for candidate in [parent.join("../.."), parent.join("..")] {
            if looks_like_root(&candidate) {
                return Ok(dunce::canonicalize(&candidate)?);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    if looks_like_root(&cwd) {
        return Ok(cwd);
    }

    anyhow::bail!("cannot determine repository root. Use --root or set {ROOT_ENV}");
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let global = GlobalOpts {
            root: Some(PathBuf::from("/explicit/path")),
            ..GlobalOpts::default()
        };
        assert_eq!(resolve_root(&global).unwrap(), PathBuf::from("/explicit/path"));
    }

    #[test]
    fn repository_markers() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!looks_like_root(dir.path()));
        std::fs::create_dir(dir.path().join("symlinks")).unwrap();
        assert!(looks_like_root(dir.path()));
    }
}
