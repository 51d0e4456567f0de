//! Task: refresh the package index before installing.
use anyhow::Result;

use super::{Context, Task, TaskResult};

/// Refresh the package manager's repository metadata.
///
/// Skipped when the manager needs elevation the run does not have. Failure
/// is reported but never fails the run.
#[derive(Debug)]
pub struct RefreshPackageIndex;

impl Task for RefreshPackageIndex {
    fn name(&self) -> &'static str {
        "Refresh package index"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.facts.package_manager.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(manager) = ctx.facts.package_manager else {
            return Ok(TaskResult::Skipped("no package manager".to_string()));
        };
        if manager.needs_elevation() && !ctx.facts.sudo_allowed() {
            return Ok(TaskResult::Skipped(
                "privilege-restricted mode".to_string(),
            ));
        }
        if ctx.dry_run {
            let (program, args) = manager.refresh_command();
            ctx.log.dry_run(&format!(
                "would run {}",
                crate::exec::display_command(program, args)
            ));
            return Ok(TaskResult::DryRun);
        }
        match manager.refresh_index(ctx.executor.as_ref(), ctx.facts.elevation) {
            Ok(()) => {
                ctx.log.info(&format!("{manager} index refreshed"));
                Ok(TaskResult::Ok)
            }
            Err(e) => {
                ctx.log.warn(&format!("index refresh failed: {e}"));
                Ok(TaskResult::Skipped(format!("refresh failed: {e}")))
            }
        }
    }
}
