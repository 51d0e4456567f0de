//! Interactive shell setup: interpreter, plugin manager, plugins, rc file,
//! and (with confirmation) the login shell.
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use super::{Context, Task, TaskResult, packages};
use crate::config::manifest::PackageSpec;
use crate::config::settings::ShellKind;
use crate::resources::shell::DefaultShellResource;
use crate::resources::symlink::{LinkOutcome, SymlinkResource};
use crate::resources::{Applicable, Resource, ResourceChange, ResourceState};

const OH_MY_ZSH_REPO: &str = "https://github.com/ohmyzsh/ohmyzsh.git";

/// zsh plugins cloned into oh-my-zsh's custom plugin directory.
const ZSH_PLUGINS: &[&str] = &[
    "zsh-autosuggestions",
    "zsh-syntax-highlighting",
    "zsh-completions",
];

const FISHER_BOOTSTRAP: &str = "curl -sL https://raw.githubusercontent.com/jorgebucaran/fisher/main/functions/fisher.fish | source && fisher install jorgebucaran/fisher";

/// fish plugins installed through fisher.
const FISH_PLUGINS: &[&str] = &["PatrickF1/fzf.fish", "jethrokuan/z"];

/// Managed rc file for `kind` as `(source under symlinks/, target under $HOME)`.
const fn rc_link(kind: ShellKind) -> (&'static str, &'static str) {
    match kind {
        ShellKind::Zsh => ("zsh/zshrc", ".zshrc"),
        ShellKind::Fish => ("fish/config.fish", ".config/fish/config.fish"),
    }
}

/// Install and configure the first available preferred shell.
#[derive(Debug)]
pub struct ConfigureShell;

impl Task for ConfigureShell {
    fn name(&self) -> &'static str {
        "Configure shell"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.facts.os.supports_shell_setup() && !ctx.config.settings.shell.preferred.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some((kind, path)) = select_shell(ctx) else {
            return Ok(TaskResult::Skipped(
                "no preferred shell could be installed".to_string(),
            ));
        };
        ctx.log.info(&format!("using {kind}"));

        match kind {
            ShellKind::Zsh => install_zsh_plugins(ctx),
            ShellKind::Fish => install_fish_plugins(ctx),
        }

        let rc_failed = link_rc(ctx, kind).err();

        if ctx.config.settings.shell.change_default {
            match path {
                Some(path) => change_login_shell(ctx, path),
                None => ctx
                    .log
                    .dry_run(&format!("would offer to make {kind} the login shell")),
            }
        }

        if let Some(e) = rc_failed {
            bail!("rc file not linked: {e}");
        }
        Ok(if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        })
    }
}

/// First preferred shell that is on PATH or can be installed.
///
/// The path is `None` only in dry-run mode, for a shell that would be
/// installed.
fn select_shell(ctx: &Context) -> Option<(ShellKind, Option<PathBuf>)> {
    for &kind in &ctx.config.settings.shell.preferred {
        if let Some(path) = ctx.executor.which(kind.name()) {
            return Some((kind, Some(path)));
        }
        let spec = PackageSpec::new(kind.name());
        match packages::install_missing(ctx, &spec, ctx.facts.package_manager) {
            Ok(()) if ctx.dry_run => return Some((kind, None)),
            Ok(()) => {
                if let Some(path) = ctx.executor.which(kind.name()) {
                    return Some((kind, Some(path)));
                }
                ctx.log
                    .warn(&format!("{kind} installed but not found on PATH"));
            }
            Err(e) => ctx.log.warn(&format!("cannot install {kind}: {e}")),
        }
    }
    None
}

/// Run one best-effort step, downgrading failure to a warning.
fn best_effort(ctx: &Context, what: &str, program: &str, args: &[&str]) -> bool {
    if ctx.dry_run {
        ctx.log.dry_run(&format!("would install {what}"));
        return true;
    }
    match ctx.executor.run(program, args) {
        Ok(_) => {
            ctx.log.debug(&format!("installed {what}"));
            true
        }
        Err(e) => {
            ctx.log.warn(&format!("{what} not installed: {e:#}"));
            false
        }
    }
}

fn install_zsh_plugins(ctx: &Context) {
    let omz = ctx.home_path(".oh-my-zsh");
    let omz_str = omz.to_string_lossy();
    if !omz.exists()
        && !best_effort(
            ctx,
            "oh-my-zsh",
            "git",
            &["clone", "--depth=1", OH_MY_ZSH_REPO, &omz_str],
        )
    {
        ctx.log.warn("skipping zsh plugins");
        return;
    }

    let plugin_dir = omz.join("custom").join("plugins");
    for plugin in ZSH_PLUGINS {
        let dest = plugin_dir.join(plugin);
        if dest.exists() {
            ctx.log.debug(&format!("ok: {plugin}"));
            continue;
        }
        let url = format!("https://github.com/zsh-users/{plugin}.git");
        let dest_str = dest.to_string_lossy();
        best_effort(ctx, plugin, "git", &["clone", "--depth=1", &url, &dest_str]);
    }
}

/// Plugins recorded by fisher in `fish_plugins`.
fn fisher_plugins(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

fn install_fish_plugins(ctx: &Context) {
    let fish_dir = ctx.home_path(".config/fish");
    if !fish_dir.join("functions/fisher.fish").exists()
        && !best_effort(ctx, "fisher", "fish", &["-c", FISHER_BOOTSTRAP])
    {
        ctx.log.warn("skipping fish plugins");
        return;
    }

    let installed = fisher_plugins(&fish_dir.join("fish_plugins"));
    for plugin in FISH_PLUGINS {
        if installed.iter().any(|p| p == plugin) {
            ctx.log.debug(&format!("ok: {plugin}"));
            continue;
        }
        best_effort(ctx, plugin, "fish", &["-c", &format!("fisher install {plugin}")]);
    }
}

fn link_rc(ctx: &Context, kind: ShellKind) -> Result<()> {
    let (source, target) = rc_link(kind);
    let link = SymlinkResource::new(
        ctx.symlinks_dir().join(source),
        ctx.home_path(target),
        &ctx.config.settings.symlinks.backup_suffix,
    );
    if ctx.dry_run {
        if !link.is_correct() {
            ctx.log.dry_run(&format!("would link {}", link.description()));
        }
        return Ok(());
    }
    match link.ensure() {
        Ok(LinkOutcome::AlreadyCorrect) => ctx.log.debug(&format!("ok: {}", link.description())),
        Ok(LinkOutcome::Linked { backup }) => {
            if let Some(backup) = backup {
                ctx.log
                    .info(&format!("backed up {} to {}", link.target.display(), backup.display()));
            }
            ctx.log.info(&format!("linked {}", link.description()));
        }
        Err(e) => {
            ctx.log.error(&e.to_string());
            return Err(e.into());
        }
    }
    Ok(())
}

fn change_login_shell(ctx: &Context, path: PathBuf) {
    let resource = DefaultShellResource::new(
        path,
        ctx.login_shell.clone(),
        ctx.config.settings.shell.allowed_shells_file.clone(),
        ctx.facts.elevation,
        ctx.executor.as_ref(),
        ctx.prompter.as_ref(),
    );
    match resource.current_state() {
        Ok(ResourceState::Correct) => {
            ctx.log.debug("login shell already set");
            return;
        }
        Ok(_) => {}
        Err(e) => {
            ctx.log.warn(&format!("cannot read login shell: {e:#}"));
            return;
        }
    }
    if ctx.dry_run {
        ctx.log
            .dry_run(&format!("would offer to change {}", resource.description()));
        return;
    }
    match resource.apply() {
        Ok(ResourceChange::Applied) => ctx.log.info(&format!("changed {}", resource.description())),
        Ok(ResourceChange::Skipped { reason }) => {
            ctx.log.info(&format!("login shell unchanged: {reason}"));
        }
        Ok(ResourceChange::AlreadyCorrect) => {}
        Err(e) => ctx.log.warn(&format!("login shell unchanged: {e:#}")),
    }
}
