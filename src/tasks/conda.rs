//! Migration from an externally installed conda to the managed one.
//!
//! The protocol is:
//!
//! 1. export every non-base environment twice (exact spec and portable YAML)
//!    into `~/.conda-migration-<timestamp>/`;
//! 2. rename the old installation to `<base>.backup.<timestamp>`;
//! 3. install conda with the system package manager;
//! 4. restore each environment, falling back from the exact spec to the YAML
//!    export to a YAML export with every version constraint removed;
//! 5. validate each restored environment by running `echo` inside it.
//!
//! A failing environment never stops the others.
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use serde::Deserialize;
use serde_yaml::Value;

use crate::resources::fs::{backup_path, backup_timestamp};
use crate::resources::package_manager::PackageManager;

use super::Context;

/// How an environment was recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreTier {
    /// `conda create --file <spec.txt>`.
    ExactSpec,
    /// `conda env create -f <env.yml>`.
    PortableYaml,
    /// YAML with version and build constraints stripped.
    UnpinnedYaml,
}

impl fmt::Display for RestoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExactSpec => "exact spec",
            Self::PortableYaml => "portable yaml",
            Self::UnpinnedYaml => "unpinned yaml",
        })
    }
}

/// Result for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOutcome {
    /// Recreated and passed validation.
    Restored(RestoreTier),
    /// Recreated but `conda run` failed inside it.
    Unvalidated(RestoreTier),
    /// No tier could recreate it; backups are kept.
    Failed,
}

/// Per-environment results of a migration.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Directory holding the exports.
    pub backup_dir: PathBuf,
    /// Where the old installation was moved.
    pub old_install: Option<PathBuf>,
    /// `(environment, outcome)` in discovery order.
    pub environments: Vec<(String, EnvOutcome)>,
}

impl MigrationReport {
    /// Names of environments that could not be restored.
    #[must_use]
    pub fn failed(&self) -> Vec<&str> {
        self.environments
            .iter()
            .filter(|(_, o)| *o == EnvOutcome::Failed)
            .map(|(n, _)| n.as_str())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct EnvList {
    envs: Vec<PathBuf>,
}

/// Names of the non-base environments in `conda env list --json` output.
///
/// # Errors
///
/// Returns an error if the output is not the expected JSON document.
pub fn parse_env_list(json: &str, base: &Path) -> Result<Vec<String>> {
    let list: EnvList = serde_json::from_str(json).context("parsing conda env list")?;
    Ok(list
        .envs
        .iter()
        .filter(|p| p.as_path() != base)
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect())
}

/// Cut a dependency spec down to its name.
///
/// `numpy=1.26.4=py311h64a7726_0` → `numpy`, `requests==2.31.0` →
/// `requests`, `conda-forge::python>=3.11` → `conda-forge::python`.
#[must_use]
pub fn strip_constraint(dep: &str) -> &str {
    let end = dep
        .find(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | ' ' | ';'))
        .unwrap_or(dep.len());
    dep.get(..end).unwrap_or(dep).trim()
}

/// Rewrite an `environment.yml` export without `prefix` and version pins.
///
/// # Errors
///
/// Returns an error if the document is not valid YAML.
pub fn strip_environment_yaml(content: &str) -> Result<String> {
    let mut doc: Value = serde_yaml::from_str(content).context("parsing environment yaml")?;
    if let Value::Mapping(map) = &mut doc {
        map.remove("prefix");
        if let Some(Value::Sequence(deps)) = map.get_mut("dependencies") {
            for dep in deps.iter_mut() {
                strip_value(dep);
            }
        }
    }
    serde_yaml::to_string(&doc).context("writing environment yaml")
}

fn strip_value(dep: &mut Value) {
    match dep {
        Value::String(s) => *s = strip_constraint(s).to_string(),
        Value::Mapping(nested) => {
            for (_, inner) in nested.iter_mut() {
                if let Value::Sequence(items) = inner {
                    items.iter_mut().for_each(strip_value);
                }
            }
        }
        _ => {}
    }
}

/// Run the migration for the external conda at `conda`.
///
/// # Errors
///
/// Returns an error if the environments cannot be listed, none of them could
/// be exported, the old installation cannot be moved, or the managed conda
/// cannot be installed; in the last case the old installation is moved back
/// first. Per-environment restore failures are reported, not returned.
pub fn migrate(
    ctx: &Context,
    conda: &Path,
    manager: PackageManager,
    package: &str,
) -> Result<MigrationReport> {
    let old = conda.to_string_lossy().to_string();
    let stamp = backup_timestamp();

    let base = ctx
        .executor
        .run(&old, &["info", "--base"])
        .context("locating conda base")?
        .stdout
        .trim()
        .to_string();
    if base.is_empty() {
        bail!("conda reported an empty base prefix");
    }
    let base = PathBuf::from(base);

    let listing = ctx
        .executor
        .run(&old, &["env", "list", "--json"])
        .context("listing conda environments")?;
    let envs = parse_env_list(&listing.stdout, &base)?;
    ctx.log.info(&format!(
        "backing up {} environment(s) from {}",
        envs.len(),
        base.display()
    ));

    let backup_dir = ctx.home_path(format!(".conda-migration-{stamp}"));
    std::fs::create_dir_all(&backup_dir)
        .with_context(|| format!("creating {}", backup_dir.display()))?;
    let mut exported = Vec::new();
    for env in &envs {
        match export_env(ctx, &old, env, &backup_dir) {
            Ok(()) => exported.push(env.clone()),
            Err(e) => ctx.log.warn(&format!("cannot back up {env}: {e:#}")),
        }
    }

    if !envs.is_empty() && exported.is_empty() {
        bail!(
            "no environment could be backed up; {} left in place",
            base.display()
        );
    }

    let moved = backup_path(&base, ".backup", &stamp)
        .with_context(|| format!("no free backup name for {}", base.display()))?;
    std::fs::rename(&base, &moved)
        .with_context(|| format!("moving {} to {}", base.display(), moved.display()))?;
    ctx.log
        .info(&format!("moved old installation to {}", moved.display()));

    if let Err(e) = manager.install(ctx.executor.as_ref(), ctx.facts.elevation, package) {
        return Err(roll_back(ctx, &moved, &base, e.into()));
    }

    let mut report = MigrationReport {
        backup_dir: backup_dir.clone(),
        old_install: Some(moved),
        environments: Vec::new(),
    };
    for env in envs {
        let outcome = if exported.contains(&env) {
            restore_env(ctx, &env, &backup_dir)
        } else {
            EnvOutcome::Failed
        };
        match &outcome {
            EnvOutcome::Restored(tier) => ctx.log.info(&format!("{env}: restored ({tier})")),
            EnvOutcome::Unvalidated(tier) => ctx.log.warn(&format!(
                "{env}: recreated ({tier}) but does not run"
            )),
            EnvOutcome::Failed => ctx.log.error(&format!(
                "{env}: could not be restored; exports kept in {}",
                backup_dir.display()
            )),
        }
        report.environments.push((env, outcome));
    }
    Ok(report)
}

/// Put the old installation back after the managed install failed.
fn roll_back(ctx: &Context, moved: &Path, base: &Path, err: anyhow::Error) -> anyhow::Error {
    match std::fs::rename(moved, base) {
        Ok(()) => {
            ctx.log
                .warn(&format!("install failed; restored {}", base.display()));
            err.context(format!(
                "installing managed conda (original restored to {})",
                base.display()
            ))
        }
        Err(re) => err.context(format!(
            "installing managed conda (original still at {}: {re})",
            moved.display()
        )),
    }
}

fn spec_file(dir: &Path, env: &str) -> PathBuf {
    dir.join(format!("{env}.spec.txt"))
}

fn yaml_file(dir: &Path, env: &str) -> PathBuf {
    dir.join(format!("{env}.yml"))
}

fn export_env(ctx: &Context, conda: &str, env: &str, dir: &Path) -> Result<()> {
    let spec = ctx
        .executor
        .run(conda, &["list", "-n", env, "--explicit"])?;
    std::fs::write(spec_file(dir, env), spec.stdout)?;
    let yaml = ctx
        .executor
        .run(conda, &["env", "export", "-n", env, "--no-builds"])?;
    std::fs::write(yaml_file(dir, env), yaml.stdout)?;
    Ok(())
}

fn restore_env(ctx: &Context, env: &str, dir: &Path) -> EnvOutcome {
    let spec = spec_file(dir, env).to_string_lossy().to_string();
    let yaml = yaml_file(dir, env);
    let yaml_str = yaml.to_string_lossy().to_string();
    let stripped = dir.join(format!("{env}.unpinned.yml"));
    let stripped_str = stripped.to_string_lossy().to_string();

    let tiers: [(RestoreTier, Vec<&str>); 3] = [
        (
            RestoreTier::ExactSpec,
            vec!["create", "-y", "-n", env, "--file", spec.as_str()],
        ),
        (
            RestoreTier::PortableYaml,
            vec!["env", "create", "-n", env, "-f", yaml_str.as_str()],
        ),
        (
            RestoreTier::UnpinnedYaml,
            vec!["env", "create", "-n", env, "-f", stripped_str.as_str()],
        ),
    ];

    for (tier, args) in tiers {
        if tier == RestoreTier::UnpinnedYaml
            && let Err(e) = write_unpinned(&yaml, &stripped)
        {
            ctx.log.debug(&format!("{env}: {e:#}"));
            continue;
        }
        ctx.log.debug(&format!("{env}: trying {tier}"));
        if ctx.executor.run("conda", &args).is_ok() {
            let validated = ctx
                .executor
                .run("conda", &["run", "-n", env, "echo", "ok"])
                .is_ok();
            return if validated {
                EnvOutcome::Restored(tier)
            } else {
                EnvOutcome::Unvalidated(tier)
            };
        }
        let _ = ctx
            .executor
            .run_unchecked("conda", &["env", "remove", "-y", "-n", env]);
    }
    EnvOutcome::Failed
}

fn write_unpinned(yaml: &Path, out: &Path) -> Result<()> {
    let content = std::fs::read_to_string(yaml)?;
    std::fs::write(out, strip_environment_yaml(&content)?)?;
    Ok(())
}
