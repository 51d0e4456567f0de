//! Everything a task needs: configuration, host facts, and the seams it
//! talks to the outside world through.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::HostFacts;
use crate::prompt::Prompter;
use crate::resources::release::ReleaseSource;

/// Shared context for task execution.
///
/// Everything a task touches outside its own arguments (host facts,
/// configuration, processes, prompts, network) is reached through here.
pub struct Context {
    /// Configuration loaded from the repository.
    pub config: Arc<Config>,
    /// Host facts, detected once at startup.
    pub facts: Arc<HostFacts>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Answers interactive questions.
    pub prompter: Arc<dyn Prompter>,
    /// Latest-release lookup for binary downloads.
    pub releases: Arc<dyn ReleaseSource>,
    /// User's home directory path.
    pub home: PathBuf,
    /// Current login shell (`$SHELL`), if set.
    pub login_shell: Option<String>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("facts", &self.facts)
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("prompter", &"<dyn Prompter>")
            .field("releases", &"<dyn ReleaseSource>")
            .field("home", &self.home)
            .field("login_shell", &self.login_shell)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Seams injected into a [`Context`].
#[derive(Debug)]
pub struct Seams {
    /// Process execution.
    pub executor: Arc<dyn Executor>,
    /// Interactive questions.
    pub prompter: Arc<dyn Prompter>,
    /// Release lookup.
    pub releases: Arc<dyn ReleaseSource>,
}

impl Context {
    /// Creates a new context, reading `HOME` and `SHELL` from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HOME environment variable is not set.
    pub fn new(
        config: Arc<Config>,
        facts: Arc<HostFacts>,
        log: Arc<dyn Log>,
        seams: Seams,
        dry_run: bool,
    ) -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))?;
        Ok(Self {
            config,
            facts,
            log,
            executor: seams.executor,
            prompter: seams.prompter,
            releases: seams.releases,
            home: PathBuf::from(home),
            login_shell: std::env::var("SHELL").ok().filter(|s| !s.is_empty()),
            dry_run,
        })
    }

    /// Resolve a path relative to the home directory.
    #[must_use]
    pub fn home_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.home.join(relative)
    }

    /// Directory that receives downloaded release binaries.
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.home_path(&self.config.settings.paths.bin_dir)
    }

    /// Path of the setup completion marker.
    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.home_path(&self.config.settings.paths.marker)
    }

    /// Symlinks source directory.
    #[must_use]
    pub fn symlinks_dir(&self) -> PathBuf {
        self.config.symlinks_dir()
    }
}
