// Shared helpers for integration tests.
//
// Provides a temporary repository plus home directory, a scriptable fake
// executor, and a context builder so each integration test can drive the
// pipeline without touching the real host.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dotsetup::config::Config;
use dotsetup::error::InstallError;
use dotsetup::exec::{ExecResult, Executor, display_command};
use dotsetup::logging::{Log, Tally, TaskStatus};
use dotsetup::platform::{Elevation, HostFacts, Os};
use dotsetup::prompt::{Prompter, ScriptedPrompter};
use dotsetup::resources::package_manager::PackageManager;
use dotsetup::resources::release::ReleaseSource;
use dotsetup::tasks::Context;

/// Executor answering by command-line prefix and recording every call.
///
/// `tar -xzf <archive> -C <dir>` drops each configured archive member into
/// `<dir>` so that release downloads can complete.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    rules: Vec<(String, bool, String)>,
    which: HashMap<String, PathBuf>,
    archive_members: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer command lines starting with `prefix`.
    pub fn respond(mut self, prefix: &str, success: bool, stdout: &str) -> Self {
        self.rules
            .push((prefix.to_string(), success, stdout.to_string()));
        self
    }

    /// Put `program` on PATH at `path`.
    pub fn on_path(mut self, program: &str, path: &str) -> Self {
        self.which.insert(program.to_string(), PathBuf::from(path));
        self
    }

    /// File created by `tar` in the extraction directory.
    pub fn archive_member(mut self, name: &str) -> Self {
        self.archive_members.push(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    fn answer(&self, program: &str, args: &[&str]) -> (bool, String) {
        let line = display_command(program, args);
        self.calls.lock().unwrap().push(line.clone());
        if program == "tar"
            && let Some(pos) = args.iter().position(|a| *a == "-C")
        {
            let dir = Path::new(args[pos + 1]);
            for member in &self.archive_members {
                std::fs::write(dir.join(member), "#!/bin/sh\n").unwrap();
            }
            return (true, String::new());
        }
        self.rules
            .iter()
            .find(|(prefix, _, _)| line.starts_with(prefix.as_str()))
            .map_or((false, String::new()), |(_, ok, out)| (*ok, out.clone()))
    }
}

impl Executor for FakeExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let result = self.run_unchecked(program, args)?;
        if !result.success {
            anyhow::bail!("{program} failed");
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let (success, stdout) = self.answer(program, args);
        Ok(ExecResult {
            stdout,
            stderr: String::new(),
            success,
            code: Some(i32::from(!success)),
        })
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> anyhow::Result<()> {
        self.run(program, args).map(|_| ())
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.which.get(program).cloned()
    }
}

/// Log that keeps messages and task records in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
    tasks: Mutex<Vec<(String, TaskStatus)>>,
    tallies: Mutex<Vec<Tally>>,
}

impl MemoryLog {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }

    pub fn status_of(&self, task: &str) -> Option<TaskStatus> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, status)| *status)
    }

    pub fn tallies(&self) -> Vec<Tally> {
        self.tallies.lock().unwrap().clone()
    }

    fn push(&self, msg: &str) {
        self.lines.lock().unwrap().push(msg.to_string());
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push(msg);
    }
    fn info(&self, msg: &str) {
        self.push(msg);
    }
    fn debug(&self, msg: &str) {
        self.push(msg);
    }
    fn warn(&self, msg: &str) {
        self.push(msg);
    }
    fn error(&self, msg: &str) {
        self.push(msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push(msg);
    }
    fn record_task(&self, name: &str, status: TaskStatus, _message: Option<&str>) {
        self.tasks.lock().unwrap().push((name.to_string(), status));
    }
    fn record_tally(&self, tally: Tally) {
        self.tallies.lock().unwrap().push(tally);
    }
}

/// Release source pinned to one tag.
#[derive(Debug)]
pub struct PinnedRelease(pub &'static str);

impl ReleaseSource for PinnedRelease {
    fn latest_tag(&self, _repo: &str) -> Result<String, InstallError> {
        Ok(self.0.to_string())
    }
}

/// A repository and a home directory, both temporary.
pub struct TestHost {
    pub repo: tempfile::TempDir,
    pub home: tempfile::TempDir,
}

impl TestHost {
    pub fn new() -> Self {
        let repo = tempfile::tempdir().expect("create repo dir");
        std::fs::create_dir_all(repo.path().join("packages")).expect("create packages dir");
        std::fs::create_dir_all(repo.path().join("symlinks")).expect("create symlinks dir");
        Self {
            repo,
            home: tempfile::tempdir().expect("create home dir"),
        }
    }

    /// Write `packages/<tier>.txt`.
    pub fn manifest(&self, tier: &str, content: &str) -> &Self {
        std::fs::write(
            self.repo.path().join("packages").join(format!("{tier}.txt")),
            content,
        )
        .expect("write manifest");
        self
    }

    /// Create a file under `symlinks/`.
    pub fn source(&self, rel: &str) -> &Self {
        let path = self.repo.path().join("symlinks").join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create source parent");
        std::fs::write(path, "# managed\n").expect("write source");
        self
    }

    pub fn home_path(&self, rel: &str) -> PathBuf {
        self.home.path().join(rel)
    }

    /// Load the repository's configuration for `facts`.
    pub fn config(&self, facts: &HostFacts) -> Config {
        Config::load(self.repo.path(), facts).expect("load config")
    }

    /// Build a context over this host.
    pub fn context(
        &self,
        facts: HostFacts,
        executor: Arc<FakeExecutor>,
        prompter: Arc<ScriptedPrompter>,
        dry_run: bool,
    ) -> (Context, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::default());
        let config = self.config(&facts);
        let ctx = Context {
            config: Arc::new(config),
            facts: Arc::new(facts),
            log: Arc::clone(&log) as Arc<dyn Log>,
            executor: executor as Arc<dyn Executor>,
            prompter: prompter as Arc<dyn Prompter>,
            releases: Arc::new(PinnedRelease("14.1.0")),
            home: self.home.path().to_path_buf(),
            login_shell: None,
            dry_run,
        };
        (ctx, log)
    }
}

/// Linux host facts.
pub fn linux(manager: Option<PackageManager>, elevation: Elevation) -> HostFacts {
    HostFacts {
        os: Os::Linux,
        distro: Some("debian".to_string()),
        family: None,
        arch: "x86_64".to_string(),
        package_manager: manager,
        elevation,
    }
}
