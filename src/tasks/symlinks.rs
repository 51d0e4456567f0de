//! Task: link configuration files into the home directory.
use anyhow::{Result, bail};

use super::{Context, Task, TaskResult, TaskStats};
use crate::logging::{LinkTally, Tally};
use crate::resources::symlink::{LinkOutcome, SymlinkResource};

/// Link configuration files from `symlinks/` into `$HOME`.
///
/// Each pair is independent: a failure is reported and the remaining pairs
/// are still processed.
#[derive(Debug)]
pub struct InstallSymlinks;

impl InstallSymlinks {
    fn resources(ctx: &Context) -> Vec<SymlinkResource> {
        let dir = ctx.symlinks_dir();
        let suffix = &ctx.config.settings.symlinks.backup_suffix;
        ctx.config
            .symlinks
            .iter()
            .map(|link| {
                SymlinkResource::new(dir.join(&link.source), ctx.home_path(&link.target), suffix)
            })
            .collect()
    }
}

impl Task for InstallSymlinks {
    fn name(&self) -> &'static str {
        "Install symlinks"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.symlinks.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        let mut failed = Vec::new();

        for link in Self::resources(ctx) {
            let target = link.target.display().to_string();
            if ctx.dry_run {
                if link.is_correct() {
                    stats.already_ok += 1;
                } else if link.source.exists() {
                    ctx.log.dry_run(&format!(
                        "would link {target} -> {}",
                        link.source.display()
                    ));
                    stats.changed += 1;
                } else {
                    ctx.log
                        .warn(&format!("source missing: {}", link.source.display()));
                    stats.skipped += 1;
                }
                continue;
            }

            match link.ensure() {
                Ok(LinkOutcome::AlreadyCorrect) => {
                    ctx.log.debug(&format!("ok: {target}"));
                    stats.already_ok += 1;
                }
                Ok(LinkOutcome::Linked { backup }) => {
                    if let Some(backup) = backup {
                        ctx.log.info(&format!(
                            "backed up {target} to {}",
                            backup.display()
                        ));
                    }
                    ctx.log.debug(&format!(
                        "linked {target} -> {}",
                        link.source.display()
                    ));
                    stats.changed += 1;
                }
                Err(e) => {
                    ctx.log.error(&e.to_string());
                    stats.skipped += 1;
                    failed.push(target);
                }
            }
        }

        ctx.log.record_tally(Tally::Links(LinkTally {
            linked: stats.changed,
            correct: stats.already_ok,
            failed: stats.skipped,
        }));
        if failed.is_empty() {
            return Ok(stats.finish(ctx));
        }
        ctx.log.info(&stats.summary(ctx.dry_run));
        bail!("{} symlink(s) failed: {}", failed.len(), failed.join(", "))
    }
}
