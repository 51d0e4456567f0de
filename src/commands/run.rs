//! Command: provision the host.
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{GlobalOpts, RunOpts};
use crate::config::Config;
use crate::error::PlatformError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::platform::HostFacts;
use crate::prompt::TerminalPrompter;
use crate::resources::Applicable as _;
use crate::resources::marker::MarkerResource;
use crate::resources::release::GithubReleases;
use crate::tasks::{self, Context, Seams, Task};

/// Tool that must be on PATH before anything else happens.
pub const DOWNLOADER: &str = "curl";

/// Run the provisioning pipeline against the real host.
///
/// # Errors
///
/// Returns an error on a hard stop: the downloader is missing, the platform
/// cannot be identified, configuration is malformed, or the user aborted.
pub fn run(global: &GlobalOpts, opts: &RunOpts, log: &Arc<Logger>) -> Result<()> {
    log.info(&format!("dotsetup {}", super::version::version()));
    let root = super::resolve_root(global)?;
    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
    require_tool(executor.as_ref(), DOWNLOADER)?;

    log.stage("Detecting platform");
    let facts = HostFacts::probe(executor.as_ref(), global.no_sudo)?;
    describe_host(log.as_ref(), &facts);

    log.stage("Loading configuration");
    let config = Config::load(&root, &facts)?;
    log.info(&format!(
        "loaded {} packages, {} symlinks",
        config.packages.len(),
        config.symlinks.len()
    ));

    let timeout = Duration::from_secs(config.settings.network.timeout_secs);
    let seams = Seams {
        executor,
        prompter: Arc::new(TerminalPrompter),
        releases: Arc::new(GithubReleases::new(timeout)),
    };
    let ctx = Context::new(
        Arc::new(config),
        Arc::new(facts),
        Arc::clone(log) as Arc<dyn Log>,
        seams,
        global.dry_run,
    )?;

    let result = run_pipeline(&ctx, opts);
    log.print_summary(global.dry_run);
    let failures = log.failure_count();
    if failures > 0 {
        log.warn(&format!(
            "{failures} task(s) did not complete; rerun after fixing them, finished work is kept"
        ));
    }
    result
}

/// Fail unless `tool` resolves on PATH.
///
/// # Errors
///
/// Returns [`PlatformError::MissingTool`].
pub fn require_tool(executor: &dyn Executor, tool: &str) -> Result<(), PlatformError> {
    executor
        .which(tool)
        .map(|_| ())
        .ok_or_else(|| PlatformError::MissingTool(tool.to_string()))
}

fn describe_host(log: &dyn Log, facts: &HostFacts) {
    let distro = facts.distro.as_deref().map_or_else(String::new, |d| format!(" ({d})"));
    log.info(&format!("platform: {}{distro} {}", facts.os, facts.arch));
    match facts.package_manager {
        Some(m) => log.info(&format!("package manager: {m}")),
        None => log.warn("no supported package manager found"),
    }
    log.debug(&format!("elevation: {:?}", facts.elevation));
}

/// Pipeline tasks filtered by `--only` / `--skip` (case-insensitive substring).
#[must_use]
pub fn select_tasks<'a>(all: &'a [Box<dyn Task>], opts: &RunOpts) -> Vec<&'a dyn Task> {
    all.iter()
        .filter(|t| {
            let name = t.name().to_lowercase();
            if !opts.only.is_empty() {
                return opts.only.iter().any(|o| name.contains(&o.to_lowercase()));
            }
            !opts.skip.iter().any(|s| name.contains(&s.to_lowercase()))
        })
        .map(AsRef::as_ref)
        .collect()
}

/// Execute the selected tasks in order, then write the completion marker.
///
/// Task failures are recorded and the pipeline continues.
///
/// # Errors
///
/// Returns an error only when the user aborted.
pub fn run_pipeline(ctx: &Context, opts: &RunOpts) -> Result<()> {
    announce_previous_run(ctx);
    let all = tasks::all_run_tasks();
    for task in select_tasks(&all, opts) {
        tasks::execute(task, ctx)?;
    }
    write_marker(ctx);
    Ok(())
}

fn announce_previous_run(ctx: &Context) {
    match MarkerResource::new(ctx.marker_path()).completed_at() {
        Some(stamp) => ctx.log.info(&format!(
            "setup already completed on {stamp}; re-checking everything"
        )),
        None => ctx.log.debug("no completion marker; first run on this host"),
    }
}

fn write_marker(ctx: &Context) {
    let marker = MarkerResource::new(ctx.marker_path());
    if ctx.dry_run {
        ctx.log.dry_run(&format!("would write {}", marker.description()));
        return;
    }
    match marker.apply() {
        Ok(_) => ctx.log.debug(&format!("wrote {}", marker.description())),
        Err(e) => ctx.log.warn(&format!("cannot write marker: {e:#}")),
    }
}
