//! File-system helpers shared by resources.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Timestamp format used in backup names: `YYYYMMDDHHMMSS`.
const BACKUP_TIMESTAMP: &str = "%Y%m%d%H%M%S";

/// Ensure the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Whether anything (including a dangling symlink) exists at `path`.
#[must_use]
pub fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Current local time formatted for backup names.
#[must_use]
pub fn backup_timestamp() -> String {
    chrono::Local::now().format(BACKUP_TIMESTAMP).to_string()
}

/// Number of `.<n>` variants tried after the plain backup name.
const MAX_BACKUP_VARIANTS: u32 = 999;

/// Build `<path><suffix>.<timestamp>`, appending `.<n>` if that name is taken.
///
/// Returns `None` when every candidate already exists, so an earlier backup
/// is never overwritten.
#[must_use]
pub fn backup_path(path: &Path, suffix: &str, timestamp: &str) -> Option<PathBuf> {
    let mut base = path.as_os_str().to_os_string();
    base.push(format!("{suffix}.{timestamp}"));
    let candidate = PathBuf::from(&base);
    if !entry_exists(&candidate) {
        return Some(candidate);
    }
    (1..=MAX_BACKUP_VARIANTS)
        .map(|n| {
            let mut name = base.clone();
            name.push(format!(".{n}"));
            PathBuf::from(name)
        })
        .find(|p| !entry_exists(p))
}

/// Find the first regular file named `name` below `dir` (depth-first).
#[must_use]
pub fn find_file(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if entry.file_name() == name {
            return Some(path);
        }
    }
    subdirs.iter().find_map(|d| find_file(d, name))
}

/// Copy `src` to `dest` and mark it executable (0755).
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, the copy
/// fails, or permissions cannot be set.
pub fn install_executable(src: &Path, dest: &Path) -> Result<()> {
    ensure_parent_dir(dest).with_context(|| format!("create parent: {}", dest.display()))?;
    std::fs::copy(src, dest)
        .with_context(|| format!("copy {} to {}", src.display(), dest.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        std::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("chmod 755 {}", dest.display()))?;
    }
    Ok(())
}
