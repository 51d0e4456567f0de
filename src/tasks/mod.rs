//! Named tasks run in a fixed, linear order by the `run` command.
pub mod conda;
pub mod context;
pub mod fallback;
pub mod packages;
pub mod refresh;
pub mod shell;
pub mod symlinks;

pub use context::{Context, Seams};

use anyhow::Result;

use crate::error::InstallError;
use crate::logging::TaskStatus;

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use dotsetup::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("no package manager".into());
/// let dry = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(dry, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped (nothing to do, or not possible on this host).
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

/// Counters for batch tasks that process many items.
///
/// # Examples
///
/// ```
/// use dotsetup::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok, 3 skipped");
/// assert_eq!(stats.summary(true), "1 would change, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default)]
pub struct TaskStats {
    /// Number of items changed or applied.
    pub changed: u32,
    /// Number of items already in the correct state.
    pub already_ok: u32,
    /// Number of items skipped due to errors or inapplicability.
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the appropriate `TaskResult`.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether this task applies to the current host and configuration.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task could not complete. The error is recorded
    /// in the summary and the pipeline continues, unless it is
    /// [`InstallError::Aborted`].
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The tasks run by the `run` command, in execution order.
#[must_use]
pub fn all_run_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(refresh::RefreshPackageIndex),
        Box::new(packages::InstallPackages),
        Box::new(symlinks::InstallSymlinks),
        Box::new(shell::ConfigureShell),
    ]
}

/// Execute a task, recording the result in the logger.
///
/// # Errors
///
/// Returns the task's error only when the user aborted; every other failure
/// is recorded and swallowed so the pipeline can continue.
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<()> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
        }
        Err(e) if matches!(e.downcast_ref::<InstallError>(), Some(InstallError::Aborted)) => {
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some("aborted by user"));
            return Err(e);
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
        }
    }
    Ok(())
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::test_helpers::ContextBuilder;
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use std::sync::Arc;

    struct Fixed(&'static str, fn() -> Result<TaskResult>, bool);

    impl Task for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        fn should_run(&self, _: &Context) -> bool {
            self.2
        }
        fn run(&self, _: &Context) -> Result<TaskResult> {
            (self.1)()
        }
    }

    #[test]
    fn run_tasks_are_in_pipeline_order() {
        let names: Vec<String> = all_run_tasks()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "Refresh package index",
                "Install packages",
                "Install symlinks",
                "Configure shell"
            ]
        );
    }

    #[test]
    fn execute_records_each_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, log) = ContextBuilder::new(dir.path(), dir.path(), Arc::new(MockExecutor::new())).build();

        execute(&Fixed("a", || Ok(TaskResult::Ok), true), &ctx).unwrap();
        execute(&Fixed("b", || Ok(TaskResult::Skipped("nothing".into())), true), &ctx).unwrap();
        execute(&Fixed("c", || anyhow::bail!("boom"), true), &ctx).unwrap();
        execute(&Fixed("d", || Ok(TaskResult::Ok), false), &ctx).unwrap();

        let statuses: Vec<TaskStatus> = log.tasks().iter().map(|t| t.1).collect();
        assert_eq!(
            statuses,
            vec![
                TaskStatus::Ok,
                TaskStatus::Skipped,
                TaskStatus::Failed,
                TaskStatus::NotApplicable
            ]
        );
        assert!(log.contains("error: c: boom"));
    }

    #[test]
    fn execute_propagates_abort_only() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, log) = ContextBuilder::new(dir.path(), dir.path(), Arc::new(MockExecutor::new())).build();
        let err = execute(&Fixed("x", || Err(InstallError::Aborted.into()), true), &ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::Aborted)
        ));
        assert_eq!(log.tasks()[0].1, TaskStatus::Failed);
    }

    #[test]
    fn stats_summary_without_skips() {
        let stats = TaskStats {
            changed: 5,
            already_ok: 12,
            skipped: 0,
        };
        assert_eq!(stats.summary(false), "5 changed, 12 already ok");
    }
}
