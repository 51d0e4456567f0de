//! Package installation orchestrator.
use std::path::Path;

use anyhow::{Result, bail};

use super::{Context, Task, TaskResult, conda, fallback};
use crate::config::manifest::PackageSpec;
use crate::error::InstallError;
use crate::logging::{PackageTally, Tally};
use crate::resources::package::{PackageStatus, package_status};
use crate::resources::package_manager::PackageManager;

/// Packages whose external installs can be migrated to the managed version.
const MIGRATABLE: &[&str] = &["conda"];

/// Options offered for an external migratable install.
const MIGRATION_CHOICES: [&str; 3] = ["Skip", "Migrate", "Abort"];

/// Per-run package tallies.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallSummary {
    /// Installed during this run (or that would be, in dry-run mode).
    pub installed: Vec<String>,
    /// Already tracked by the package manager.
    pub already_present: Vec<String>,
    /// Present on PATH from another source and left alone.
    pub external: Vec<String>,
    /// `(package, reason)` for every failure.
    pub failed: Vec<(String, String)>,
}

impl InstallSummary {
    /// One-line counts, e.g. `2 installed, 5 already present, 1 external, 0 failed`.
    #[must_use]
    pub fn counts(&self, dry_run: bool) -> String {
        self.tally().counts(dry_run)
    }

    /// Counts for the run summary.
    #[must_use]
    pub fn tally(&self) -> PackageTally {
        PackageTally {
            installed: self.installed.len(),
            present: self.already_present.len(),
            external: self.external.len(),
            failed: self.failed_names().into_iter().map(String::from).collect(),
        }
    }

    /// Names of failed packages.
    #[must_use]
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// What happened to one package.
enum Outcome {
    Installed,
    Present,
    External,
}

/// Bring every package in `packages` to an installed state.
///
/// Failures are collected per package and never stop the loop.
///
/// # Errors
///
/// Returns [`InstallError::Aborted`] if the user chose to abort at a
/// migration prompt; nothing else is propagated.
pub fn install_from_list(
    ctx: &Context,
    packages: &[PackageSpec],
) -> Result<InstallSummary, InstallError> {
    let mut summary = InstallSummary::default();
    if packages.is_empty() {
        ctx.log.info("no packages found");
        return Ok(summary);
    }

    let manager = ctx.facts.package_manager;
    match manager {
        Some(m) => ctx.log.debug(&format!("using {m} package manager")),
        None => ctx.log.warn("no supported package manager found"),
    }
    if !ctx.facts.sudo_allowed() {
        ctx.log
            .info("privilege-restricted mode: using user-space installers");
    }

    for spec in packages {
        match install_one(ctx, spec, manager) {
            Ok(Outcome::Installed) => summary.installed.push(spec.name.clone()),
            Ok(Outcome::Present) => summary.already_present.push(spec.name.clone()),
            Ok(Outcome::External) => summary.external.push(spec.name.clone()),
            Err(InstallError::Aborted) => return Err(InstallError::Aborted),
            Err(e) => {
                ctx.log.error(&format!("{}: {e}", spec.name));
                summary.failed.push((spec.name.clone(), e.to_string()));
            }
        }
    }
    Ok(summary)
}

fn install_one(
    ctx: &Context,
    spec: &PackageSpec,
    manager: Option<PackageManager>,
) -> Result<Outcome, InstallError> {
    match package_status(spec, manager, ctx.executor.as_ref())? {
        PackageStatus::ManagedBy(m) => {
            ctx.log.debug(&format!("{}: installed ({m})", spec.name));
            Ok(Outcome::Present)
        }
        PackageStatus::NotInstalled => {
            install_missing(ctx, spec, manager)?;
            Ok(Outcome::Installed)
        }
        PackageStatus::External(path) => resolve_external(ctx, spec, manager, &path),
    }
}

/// Install a package that is absent, through the system manager or, when
/// privilege-restricted, the user-space chain.
///
/// # Errors
///
/// Returns the [`InstallError`] of the chosen route.
pub fn install_missing(
    ctx: &Context,
    spec: &PackageSpec,
    manager: Option<PackageManager>,
) -> Result<(), InstallError> {
    let restricted = !ctx.facts.sudo_allowed();
    if ctx.dry_run {
        let route = match manager {
            _ if restricted => "user-space fallback".to_string(),
            Some(m) => m.to_string(),
            None => return Err(InstallError::NoPackageManager),
        };
        ctx.log
            .dry_run(&format!("would install {} via {route}", spec.name));
        return Ok(());
    }
    if restricted {
        let tier = fallback::install(ctx, &spec.name)?;
        ctx.log.info(&format!("{}: installed via {tier}", spec.name));
        return Ok(());
    }
    let manager = manager.ok_or(InstallError::NoPackageManager)?;
    manager.install(ctx.executor.as_ref(), ctx.facts.elevation, &spec.name)?;
    ctx.log
        .info(&format!("{}: installed via {manager}", spec.name));
    Ok(())
}

fn resolve_external(
    ctx: &Context,
    spec: &PackageSpec,
    manager: Option<PackageManager>,
    path: &Path,
) -> Result<Outcome, InstallError> {
    ctx.log.info(&format!(
        "{} is installed outside the package manager at {}",
        spec.name,
        path.display()
    ));

    if MIGRATABLE.contains(&spec.name.as_str()) {
        let question = format!(
            "{} found at {}. Migrate its environments to the managed install?",
            spec.name,
            path.display()
        );
        return match ctx.prompter.choose(&question, &MIGRATION_CHOICES) {
            1 => migrate(ctx, spec, manager, path),
            2 => Err(InstallError::Aborted),
            _ => Ok(Outcome::External),
        };
    }

    let question = format!(
        "{} is already installed at {}. Install the managed version anyway?",
        spec.name,
        path.display()
    );
    if !ctx.prompter.confirm(&question, false) {
        return Ok(Outcome::External);
    }
    install_missing(ctx, spec, manager)?;
    Ok(Outcome::Installed)
}

fn migrate(
    ctx: &Context,
    spec: &PackageSpec,
    manager: Option<PackageManager>,
    path: &Path,
) -> Result<Outcome, InstallError> {
    let Some(manager) =
        manager.filter(|m| !m.needs_elevation() || ctx.facts.sudo_allowed())
    else {
        return Err(InstallError::Unsupported {
            package: spec.name.clone(),
            reason: "migration needs a system package manager it is allowed to use".to_string(),
        });
    };
    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would migrate {} environments to {manager}",
            path.display()
        ));
        return Ok(Outcome::Installed);
    }
    let report = conda::migrate(ctx, path, manager, &spec.name).map_err(|e| {
        InstallError::CommandFailed {
            program: "conda migration".to_string(),
            detail: format!("{e:#}"),
        }
    })?;
    let failed = report.failed();
    if !failed.is_empty() {
        ctx.log.warn(&format!(
            "environments not restored: {} (exports in {})",
            failed.join(", "),
            report.backup_dir.display()
        ));
    }
    Ok(Outcome::Installed)
}

/// Install every package from the loaded manifests.
#[derive(Debug)]
pub struct InstallPackages;

impl Task for InstallPackages {
    fn name(&self) -> &'static str {
        "Install packages"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let summary = install_from_list(ctx, &ctx.config.packages)?;
        if ctx.config.packages.is_empty() {
            return Ok(TaskResult::Skipped("no packages found".to_string()));
        }
        ctx.log.info(&summary.counts(ctx.dry_run));
        ctx.log.record_tally(Tally::Packages(summary.tally()));
        if !summary.failed.is_empty() {
            bail!(
                "{} package(s) failed: {}",
                summary.failed.len(),
                summary.failed_names().join(", ")
            );
        }
        Ok(if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        })
    }
}
