//! Setup completion marker.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::fs::ensure_parent_dir;
use super::{Applicable, Resource, ResourceChange, ResourceState};

const STAMP_PREFIX: &str = "setup completed ";

/// A sentinel file whose existence records that first-time setup finished.
///
/// The content is an RFC 3339 timestamp for humans; only presence is read.
#[derive(Debug, Clone)]
pub struct MarkerResource {
    /// Absolute path to the marker file.
    pub path: PathBuf,
}

impl MarkerResource {
    /// Create a marker resource at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Whether setup has completed before.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// When setup last completed, as written by [`apply`](Applicable::apply).
    ///
    /// `None` when there is no marker; `Some("unknown time")` when the
    /// content is not one we wrote.
    #[must_use]
    pub fn completed_at(&self) -> Option<String> {
        if !self.exists() {
            return None;
        }
        let stamp = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|c| c.strip_prefix(STAMP_PREFIX).map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty());
        Some(stamp.unwrap_or_else(|| "unknown time".to_string()))
    }
}

impl Applicable for MarkerResource {
    fn description(&self) -> String {
        format!("completion marker {}", self.path.display())
    }

    /// Write (or refresh) the marker with the current local time.
    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(&self.path)
            .with_context(|| format!("creating parent of {}", self.path.display()))?;
        let stamp = chrono::Local::now().to_rfc3339();
        std::fs::write(&self.path, format!("{STAMP_PREFIX}{stamp}\n"))
            .with_context(|| format!("writing marker {}", self.path.display()))?;
        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        if !self.exists() {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("removing marker {}", self.path.display()))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for MarkerResource {
    fn current_state(&self) -> Result<ResourceState> {
        if self.exists() {
            Ok(ResourceState::Correct)
        } else if self.path.exists() {
            Ok(ResourceState::Invalid {
                reason: format!("{} exists but is not a file", self.path.display()),
            })
        } else {
            Ok(ResourceState::Missing)
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_absent_created_removed() {
        let dir = tempfile::tempdir().unwrap();
        let marker = MarkerResource::new(dir.path().join(".dotfiles_setup_complete"));
        assert_eq!(marker.current_state().unwrap(), ResourceState::Missing);

        assert_eq!(marker.apply().unwrap(), ResourceChange::Applied);
        assert!(marker.exists());
        let content = std::fs::read_to_string(&marker.path).unwrap();
        assert!(content.starts_with("setup completed "));

        assert_eq!(marker.remove().unwrap(), ResourceChange::Applied);
        assert!(!marker.exists());
        assert_eq!(marker.remove().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn completed_at_reads_back_the_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let marker = MarkerResource::new(dir.path().join("done"));
        assert_eq!(marker.completed_at(), None);

        marker.apply().unwrap();
        let stamp = marker.completed_at().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok(), "{stamp}");

        std::fs::write(&marker.path, "touched by hand").unwrap();
        assert_eq!(marker.completed_at().as_deref(), Some("unknown time"));
    }

    #[test]
    fn apply_creates_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let marker = MarkerResource::new(dir.path().join("state/dotsetup/done"));
        marker.apply().unwrap();
        assert_eq!(marker.current_state().unwrap(), ResourceState::Correct);
    }

    #[test]
    fn directory_at_marker_path_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let marker = MarkerResource::new(dir.path().to_path_buf());
        assert!(matches!(
            marker.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
    }
}
