//! Symlink resource with backup-before-overwrite.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::fs::{backup_path, backup_timestamp, ensure_parent_dir, entry_exists};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::SymlinkError;

/// What [`SymlinkResource::ensure`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The target already pointed at the source; nothing was touched.
    AlreadyCorrect,
    /// The link was created. Holds the backup path if something was moved aside.
    Linked {
        /// Where the previous target was renamed to.
        backup: Option<PathBuf>,
    },
}

/// A symlink from `target` to `source`.
///
/// Whatever previously occupied `target` (file, directory, or a symlink
/// pointing elsewhere) is renamed to `<target><suffix>.<timestamp>`. Nothing
/// is ever deleted, and a correct link is left untouched, so repeated runs
/// create no further backups.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The source file/directory (what the symlink points to).
    pub source: PathBuf,
    /// The target path (where the symlink will be created).
    pub target: PathBuf,
    /// Suffix placed before the backup timestamp (e.g. `.backup`).
    pub backup_suffix: String,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub fn new(source: PathBuf, target: PathBuf, backup_suffix: &str) -> Self {
        Self {
            source,
            target,
            backup_suffix: backup_suffix.to_string(),
        }
    }

    /// Whether `target` is a symlink resolving to `source`.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        std::fs::read_link(&self.target)
            .is_ok_and(|existing| points_to(&self.target, &existing, &self.source))
    }

    /// Make `target` a symlink to `source`, backing up anything in the way.
    ///
    /// # Errors
    ///
    /// Returns [`SymlinkError`] if the source is missing, the parent directory
    /// cannot be created, the backup rename fails, or the link cannot be made.
    pub fn ensure(&self) -> Result<LinkOutcome, SymlinkError> {
        if !self.source.exists() {
            return Err(SymlinkError::SourceMissing(self.source.clone()));
        }
        if self.is_correct() {
            return Ok(LinkOutcome::AlreadyCorrect);
        }

        ensure_parent_dir(&self.target).map_err(|source| SymlinkError::CreateParent {
            path: self.target.parent().map(Path::to_path_buf).unwrap_or_default(),
            source,
        })?;

        let backup = if entry_exists(&self.target) {
            let backup = backup_path(&self.target, &self.backup_suffix, &backup_timestamp())
                .ok_or_else(|| SymlinkError::BackupNamesExhausted(self.target.clone()))?;
            std::fs::rename(&self.target, &backup).map_err(|source| SymlinkError::Backup {
                target: self.target.clone(),
                backup: backup.clone(),
                source,
            })?;
            Some(backup)
        } else {
            None
        };

        create_symlink(&self.source, &self.target).map_err(|source| SymlinkError::Link {
            target: self.target.clone(),
            source_path: self.source.clone(),
            source,
        })?;

        Ok(LinkOutcome::Linked { backup })
    }
}

impl Applicable for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        Ok(match self.ensure()? {
            LinkOutcome::AlreadyCorrect => ResourceChange::AlreadyCorrect,
            LinkOutcome::Linked { .. } => ResourceChange::Applied,
        })
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.source.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }
        if self.is_correct() {
            return Ok(ResourceState::Correct);
        }
        Ok(match std::fs::read_link(&self.target) {
            Ok(existing) => ResourceState::Incorrect {
                current: format!("points to {}", existing.display()),
            },
            Err(_) if entry_exists(&self.target) => ResourceState::Incorrect {
                current: if self.target.is_dir() {
                    "target is a directory".to_string()
                } else {
                    "target is a regular file".to_string()
                },
            },
            Err(_) => ResourceState::Missing,
        })
    }
}

/// Whether the link at `link` whose raw value is `value` resolves to `source`.
///
/// Relative link values are resolved against the link's parent directory.
fn points_to(link: &Path, value: &Path, source: &Path) -> bool {
    let resolved = if value.is_relative() {
        link.parent().map_or_else(|| value.to_path_buf(), |p| p.join(value))
    } else {
        value.to_path_buf()
    };
    if resolved == source {
        return true;
    }
    match (dunce::canonicalize(&resolved), dunce::canonicalize(source)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }
    #[cfg(windows)]
    {
        if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn backups_in(dir: &Path, name: &str) -> Vec<PathBuf> {
        let prefix = format!("{name}.backup.");
        std::fs::read_dir(dir)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .map(|e| e.path())
            .collect()
    }

    fn fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("repo/zshrc");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, "export EDITOR=nvim\n").unwrap();
        let target = dir.path().join("home/.zshrc");
        (dir, source, target)
    }

    #[test]
    fn source_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let link = SymlinkResource::new(dir.path().join("nope"), dir.path().join("t"), ".backup");
        assert!(matches!(
            link.ensure().unwrap_err(),
            SymlinkError::SourceMissing(_)
        ));
        assert!(matches!(
            link.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn creates_parent_and_link() {
        let (_dir, source, target) = fixture();
        let link = SymlinkResource::new(source.clone(), target.clone(), ".backup");
        assert_eq!(link.current_state().unwrap(), ResourceState::Missing);
        assert_eq!(link.ensure().unwrap(), LinkOutcome::Linked { backup: None });
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
        assert_eq!(link.current_state().unwrap(), ResourceState::Correct);
    }

    #[cfg(unix)]
    #[test]
    fn second_run_creates_no_backups() {
        let (_dir, source, target) = fixture();
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "old rc").unwrap();
        let link = SymlinkResource::new(source, target.clone(), ".backup");

        link.ensure().unwrap();
        let home = target.parent().unwrap();
        let after_first = backups_in(home, ".zshrc").len();
        assert_eq!(link.ensure().unwrap(), LinkOutcome::AlreadyCorrect);
        let after_second = backups_in(home, ".zshrc").len();
        assert_eq!(after_first, 1);
        assert_eq!(after_second - after_first, 0);
    }

    #[cfg(unix)]
    #[test]
    fn regular_file_is_backed_up_with_timestamp() {
        let (_dir, source, target) = fixture();
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "old rc").unwrap();
        let link = SymlinkResource::new(source.clone(), target.clone(), ".backup");

        let LinkOutcome::Linked { backup: Some(backup) } = link.ensure().unwrap() else {
            panic!("expected a backup");
        };
        let backups = backups_in(target.parent().unwrap(), ".zshrc");
        assert_eq!(backups, vec![backup.clone()]);
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".zshrc.backup."));
        let ts = name.trim_start_matches(".zshrc.backup.");
        assert_eq!(ts.len(), 14);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "old rc");
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[cfg(unix)]
    #[test]
    fn wrong_symlink_is_backed_up() {
        let (dir, source, target) = fixture();
        let other = dir.path().join("other");
        std::fs::write(&other, "x").unwrap();
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(&other, &target).unwrap();
        let link = SymlinkResource::new(source.clone(), target.clone(), ".backup");
        assert!(matches!(
            link.current_state().unwrap(),
            ResourceState::Incorrect { .. }
        ));
        link.ensure().unwrap();
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
        let backups = backups_in(target.parent().unwrap(), ".zshrc");
        assert_eq!(std::fs::read_link(&backups[0]).unwrap(), other);
    }

    #[cfg(unix)]
    #[test]
    fn directory_target_is_renamed_not_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("repo/nvim");
        std::fs::create_dir_all(&source).unwrap();
        let target = dir.path().join("home/.config/nvim");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("init.lua"), "-- mine").unwrap();

        let link = SymlinkResource::new(source.clone(), target.clone(), ".backup");
        link.ensure().unwrap();
        let backups = backups_in(target.parent().unwrap(), "nvim");
        assert_eq!(backups.len(), 1);
        assert!(backups[0].join("init.lua").exists());
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[cfg(unix)]
    #[test]
    fn relative_link_to_source_is_correct() {
        let (_dir, source, target) = fixture();
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink("../repo/zshrc", &target).unwrap();
        let link = SymlinkResource::new(source, target, ".backup");
        assert!(link.is_correct());
        assert_eq!(link.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn description_shows_both_paths() {
        let link = SymlinkResource::new(
            PathBuf::from("/repo/symlinks/tmux/tmux.conf"),
            PathBuf::from("/home/u/.tmux.conf"),
            ".backup",
        );
        assert_eq!(
            link.description(),
            "/home/u/.tmux.conf -> /repo/symlinks/tmux/tmux.conf"
        );
    }
}
