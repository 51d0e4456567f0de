//! User-space install chain for privilege-restricted hosts.
//!
//! Tiers are tried in order and the first success wins:
//!
//! 1. a curated package → user-space manager map (pip, cargo, conda-forge),
//!    used only for packages on that manager's allow-list;
//! 2. the user's default conda channel, skipped for Rust-native tools;
//! 3. a prebuilt binary from GitHub releases for a few tools.
//!
//! No tier ever invokes the system package manager or `sudo`.
use std::fmt;
use std::path::PathBuf;

use crate::error::InstallError;
use crate::exec::{Executor, display_command};
use crate::resources::binary::{self, BinaryDownload};

use super::Context;

/// One way of installing a package without elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// `pip3 install --user`.
    Pip,
    /// `cargo install --locked`.
    Cargo,
    /// `conda install -c conda-forge`.
    CondaForge,
    /// `conda install` from the default channel.
    Conda,
    /// Release archive download.
    Binary,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pip => "pip",
            Self::Cargo => "cargo",
            Self::CondaForge => "conda-forge",
            Self::Conda => "conda",
            Self::Binary => "binary download",
        })
    }
}

/// Packages installable with `pip --user`.
const PIP_PACKAGES: &[&str] = &["httpie", "glances", "pgcli", "mycli", "yamllint", "tldr"];

/// Packages installable with cargo, with crate names where they differ.
const CARGO_CRATES: &[(&str, &str)] = &[
    ("bat", "bat"),
    ("eza", "eza"),
    ("ripgrep", "ripgrep"),
    ("fd", "fd-find"),
    ("fd-find", "fd-find"),
    ("delta", "git-delta"),
    ("git-delta", "git-delta"),
    ("dust", "du-dust"),
    ("du-dust", "du-dust"),
    ("zoxide", "zoxide"),
    ("starship", "starship"),
    ("tealdeer", "tealdeer"),
    ("bottom", "bottom"),
    ("hyperfine", "hyperfine"),
];

/// Packages published on conda-forge.
const CONDA_FORGE_PACKAGES: &[&str] = &[
    "jq", "tmux", "neovim", "zsh", "fish", "htop", "fzf", "git", "gh", "shellcheck", "tree",
];

/// Tools written in Rust. The default conda channel lacks most of them, so
/// tier 2 is skipped.
const RUST_NATIVE: &[&str] = &[
    "bat", "eza", "exa", "ripgrep", "fd", "fd-find", "delta", "git-delta", "dust", "du-dust",
    "zoxide", "starship", "tealdeer", "bottom", "hyperfine",
];

/// Tiers applicable to `package` given the tools on PATH, in try order.
#[must_use]
pub fn candidates(package: &str, executor: &dyn Executor) -> Vec<Tier> {
    let on_path = |tool: &str| executor.which(tool).is_some();
    let has_conda = on_path("conda");
    let mut tiers = Vec::new();

    if PIP_PACKAGES.contains(&package) && on_path("pip3") {
        tiers.push(Tier::Pip);
    }
    if cargo_crate(package).is_some() && on_path("cargo") {
        tiers.push(Tier::Cargo);
    }
    if CONDA_FORGE_PACKAGES.contains(&package) && has_conda {
        tiers.push(Tier::CondaForge);
    }
    if has_conda && !RUST_NATIVE.contains(&package) {
        tiers.push(Tier::Conda);
    }
    if binary::lookup(package).is_some() {
        tiers.push(Tier::Binary);
    }
    tiers
}

fn cargo_crate(package: &str) -> Option<&'static str> {
    CARGO_CRATES
        .iter()
        .find(|(pkg, _)| *pkg == package)
        .map(|(_, krate)| *krate)
}

/// Install `package` through the first tier that succeeds.
///
/// # Errors
///
/// Returns [`InstallError::Unsupported`] if no tier applies and
/// [`InstallError::Exhausted`] if every applicable tier failed.
pub fn install(ctx: &Context, package: &str) -> Result<Tier, InstallError> {
    let tiers = candidates(package, ctx.executor.as_ref());
    if tiers.is_empty() {
        return Err(InstallError::Unsupported {
            package: package.to_string(),
            reason: "no user-space install method available".to_string(),
        });
    }

    let mut tried = Vec::new();
    for tier in tiers {
        ctx.log.debug(&format!("{package}: trying {tier}"));
        match attempt(ctx, tier, package) {
            Ok(()) => return Ok(tier),
            Err(e) => {
                ctx.log.debug(&format!("{package}: {tier} failed: {e}"));
                tried.push(tier.to_string());
            }
        }
    }
    Err(InstallError::Exhausted {
        package: package.to_string(),
        tried,
    })
}

fn attempt(ctx: &Context, tier: Tier, package: &str) -> Result<(), InstallError> {
    let run = |program: &str, args: &[&str]| {
        ctx.executor
            .run(program, args)
            .map(|_| ())
            .map_err(|e| InstallError::CommandFailed {
                program: display_command(program, args),
                detail: format!("{e:#}"),
            })
    };
    match tier {
        Tier::Pip => run("pip3", &["install", "--user", package]),
        Tier::Cargo => {
            let krate = cargo_crate(package).unwrap_or(package);
            run("cargo", &["install", "--locked", krate])
        }
        Tier::CondaForge => run("conda", &["install", "-y", "-c", "conda-forge", package]),
        Tier::Conda => run("conda", &["install", "-y", package]),
        Tier::Binary => {
            let bin_dir = ctx.bin_dir();
            let work_dir = download_dir();
            let download = BinaryDownload {
                os: ctx.facts.os,
                arch: &ctx.facts.arch,
                bin_dir: &bin_dir,
                work_dir: &work_dir,
                timeout_secs: ctx.config.settings.network.timeout_secs,
                releases: ctx.releases.as_ref(),
                executor: ctx.executor.as_ref(),
            };
            let path = download.install(package)?;
            ctx.log
                .debug(&format!("{package}: installed {}", path.display()));
            Ok(())
        }
    }
}

/// Per-process scratch directory for release archives.
fn download_dir() -> PathBuf {
    std::env::temp_dir().join(format!("dotsetup-{}", std::process::id()))
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::ContextBuilder;
    use std::sync::Arc;

    #[test]
    fn candidates_respect_allow_lists_and_path() {
        let exec = MockExecutor::new().with_which(&["cargo", "conda", "pip3"]);
        assert_eq!(
            candidates("ripgrep", &exec),
            vec![Tier::Cargo, Tier::Binary]
        );
        assert_eq!(
            candidates("jq", &exec),
            vec![Tier::CondaForge, Tier::Conda]
        );
        assert_eq!(candidates("httpie", &exec), vec![Tier::Pip, Tier::Conda]);
        assert_eq!(candidates("ripgrep", &MockExecutor::new()), vec![Tier::Binary]);
        assert!(candidates("jq", &MockExecutor::new()).is_empty());
    }

    #[test]
    fn rust_native_tools_skip_default_conda() {
        let exec = MockExecutor::new().with_which(&["conda"]);
        assert!(!candidates("zoxide", &exec).contains(&Tier::Conda));
        assert!(candidates("htop", &exec).contains(&Tier::Conda));
    }

    #[test]
    fn cargo_uses_crate_name() {
        let dir = tempfile::tempdir().unwrap();
        let exec = Arc::new(
            MockExecutor::new()
                .with_which(&["cargo"])
                .respond("cargo install", true, ""),
        );
        let (ctx, _log) = ContextBuilder::new(dir.path(), dir.path(), exec.clone()).build();
        assert_eq!(install(&ctx, "delta").unwrap(), Tier::Cargo);
        assert_eq!(exec.calls(), vec!["cargo install --locked git-delta"]);
    }

    #[test]
    fn first_failure_falls_through_to_next_tier() {
        let dir = tempfile::tempdir().unwrap();
        let exec = Arc::new(
            MockExecutor::new()
                .with_which(&["conda"])
                .respond("conda install -y -c conda-forge", false, "")
                .respond("conda install -y tmux", true, ""),
        );
        let (ctx, _log) = ContextBuilder::new(dir.path(), dir.path(), exec.clone()).build();
        assert_eq!(install(&ctx, "tmux").unwrap(), Tier::Conda);
        assert_eq!(exec.calls().len(), 2);
    }

    #[test]
    fn all_tiers_failing_is_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let exec = Arc::new(MockExecutor::new().with_which(&["conda"]));
        let (ctx, _log) = ContextBuilder::new(dir.path(), dir.path(), exec).build();
        let err = install(&ctx, "jq").unwrap_err();
        match err {
            InstallError::Exhausted { package, tried } => {
                assert_eq!(package, "jq");
                assert_eq!(tried, vec!["conda-forge", "conda"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nothing_applicable_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let exec = Arc::new(MockExecutor::new());
        let (ctx, _log) = ContextBuilder::new(dir.path(), dir.path(), exec.clone()).build();
        assert!(matches!(
            install(&ctx, "xclip").unwrap_err(),
            InstallError::Unsupported { .. }
        ));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn never_calls_sudo_or_system_manager() {
        let dir = tempfile::tempdir().unwrap();
        let exec = Arc::new(MockExecutor::new().with_which(&["pip3", "cargo", "conda", "apt-get"]));
        let (ctx, _log) = ContextBuilder::new(dir.path(), dir.path(), exec.clone()).build();
        let _ = install(&ctx, "httpie");
        let _ = install(&ctx, "bat");
        assert!(exec.calls().iter().all(|c| !c.starts_with("sudo") && !c.contains("apt-get")));
    }
}
