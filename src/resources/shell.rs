//! Login shell resource.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;
use crate::platform::Elevation;
use crate::prompt::Prompter;

/// Whether `shell` is listed in the allowed-shells file content.
#[must_use]
pub fn is_listed(content: &str, shell: &Path) -> bool {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('#'))
        .any(|l| Path::new(l) == shell)
}

/// A resource for configuring the default login shell.
///
/// Applying it registers the shell in the allowed-shells file when missing
/// and then asks before running `chsh`. The login shell is never changed
/// without an explicit "yes".
#[derive(Debug)]
pub struct DefaultShellResource<'a> {
    /// Absolute path of the desired shell interpreter.
    shell_path: PathBuf,
    /// Current login shell (usually `$SHELL`).
    current: Option<String>,
    /// System list of permitted login shells.
    allowed_shells_file: PathBuf,
    elevation: Elevation,
    executor: &'a dyn Executor,
    prompter: &'a dyn Prompter,
}

impl<'a> DefaultShellResource<'a> {
    /// Create a new default shell resource.
    #[must_use]
    pub const fn new(
        shell_path: PathBuf,
        current: Option<String>,
        allowed_shells_file: PathBuf,
        elevation: Elevation,
        executor: &'a dyn Executor,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            shell_path,
            current,
            allowed_shells_file,
            elevation,
            executor,
            prompter,
        }
    }

    fn shell_name(&self) -> String {
        self.shell_path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().to_string())
    }

    /// Append the shell to the allowed-shells file unless already present.
    ///
    /// Returns `false` when it is missing and cannot be added without
    /// elevation.
    fn register(&self) -> Result<bool> {
        let content = std::fs::read_to_string(&self.allowed_shells_file).unwrap_or_default();
        if is_listed(&content, &self.shell_path) {
            return Ok(true);
        }
        let script = format!(
            "printf '%s\\n' '{}' >> '{}'",
            self.shell_path.display(),
            self.allowed_shells_file.display()
        );
        let Some((program, args)) = self.elevation.wrap("sh", &["-c", &script]) else {
            return Ok(false);
        };
        self.executor
            .run_interactive(program, &args)
            .with_context(|| format!("registering {}", self.shell_path.display()))?;
        Ok(true)
    }
}

impl Applicable for DefaultShellResource<'_> {
    fn description(&self) -> String {
        format!("default shell → {}", self.shell_name())
    }

    fn apply(&self) -> Result<ResourceChange> {
        if !self.register()? {
            return Ok(ResourceChange::Skipped {
                reason: format!(
                    "{} is not in {} and elevation is unavailable",
                    self.shell_path.display(),
                    self.allowed_shells_file.display()
                ),
            });
        }
        let question = format!("Change your login shell to {}?", self.shell_path.display());
        if !self.prompter.confirm(&question, false) {
            return Ok(ResourceChange::Skipped {
                reason: "declined by user".to_string(),
            });
        }
        let path = self.shell_path.to_string_lossy();
        self.executor
            .run_interactive("chsh", &["-s", &path])
            .context("chsh failed")?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for DefaultShellResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        let current = self.current.as_deref().unwrap_or_default();
        let suffix = format!("/{}", self.shell_name());

        if current.is_empty() {
            Ok(ResourceState::Missing)
        } else if Path::new(current) == self.shell_path || current.ends_with(&suffix) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: current.to_string(),
            })
        }
    }
}
