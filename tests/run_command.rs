#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `run` command: the pipeline task list and the
//! task filtering applied by `--skip` and `--only`.

mod common;

use std::collections::HashSet;

use clap::Parser;
use dotsetup::cli::{Cli, Command, RunOpts};
use dotsetup::commands::run::select_tasks;
use dotsetup::tasks;

fn selected(opts: &RunOpts) -> Vec<String> {
    let all = tasks::all_run_tasks();
    select_tasks(&all, opts)
        .iter()
        .map(|t| t.name().to_string())
        .collect()
}

/// Regression guard for the pipeline order.
#[test]
fn run_task_names() {
    let all = tasks::all_run_tasks();
    let names: Vec<&str> = all.iter().map(|t| t.name()).collect();
    insta::assert_snapshot!(names.join("\n"), @r"
    Refresh package index
    Install packages
    Install symlinks
    Configure shell
    ");
}

#[test]
fn run_task_names_are_unique() {
    let all = tasks::all_run_tasks();
    let names: HashSet<&str> = all.iter().map(|t| t.name()).collect();
    assert_eq!(names.len(), all.len());
}

#[test]
fn no_filters_selects_everything() {
    assert_eq!(selected(&RunOpts::default()).len(), tasks::all_run_tasks().len());
}

#[test]
fn only_takes_precedence_over_skip() {
    let opts = RunOpts {
        only: vec!["shell".to_string()],
        skip: vec!["shell".to_string()],
    };
    assert_eq!(selected(&opts), vec!["Configure shell"]);
}

#[test]
fn filters_from_command_line() {
    let cli = Cli::parse_from(["dotsetup", "--no-sudo", "run", "--skip", "Shell,INDEX"]);
    assert!(cli.global.no_sudo);
    let Command::Run(opts) = cli.command else {
        unreachable!("expected run");
    };
    assert_eq!(selected(&opts), vec!["Install packages", "Install symlinks"]);
}

#[test]
fn unknown_filter_selects_nothing() {
    let opts = RunOpts {
        only: vec!["fonts".to_string()],
        skip: vec![],
    };
    assert!(selected(&opts).is_empty());
}
