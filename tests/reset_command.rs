#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `reset` command and its interaction with `run`.

mod common;

use std::sync::Arc;

use common::*;
use dotsetup::cli::RunOpts;
use dotsetup::commands::reset::reset_marker;
use dotsetup::commands::run::run_pipeline;
use dotsetup::platform::Elevation;
use dotsetup::prompt::ScriptedPrompter;

#[test]
fn reset_removes_marker_written_by_run() {
    let host = TestHost::new();
    let (ctx, log) = host.context(
        linux(None, Elevation::None),
        Arc::new(FakeExecutor::new()),
        Arc::new(ScriptedPrompter::default()),
        false,
    );
    let opts = RunOpts {
        only: vec!["packages".to_string()],
        skip: vec![],
    };
    run_pipeline(&ctx, &opts).unwrap();
    let marker = ctx.marker_path();
    assert!(marker.is_file());

    reset_marker(&marker, false, log.as_ref()).unwrap();
    assert!(!marker.exists());
    assert!(log.contains("removed"));

    reset_marker(&marker, false, log.as_ref()).unwrap();
    assert!(log.contains("nothing to reset"));
}

#[test]
fn custom_marker_path_from_settings() {
    let host = TestHost::new();
    std::fs::write(
        host.repo.path().join("dotsetup.toml"),
        "[paths]\nmarker = \".local/state/dotsetup-done\"\n",
    )
    .unwrap();
    let (ctx, _log) = host.context(
        linux(None, Elevation::None),
        Arc::new(FakeExecutor::new()),
        Arc::new(ScriptedPrompter::default()),
        false,
    );
    run_pipeline(&ctx, &RunOpts { only: vec!["packages".to_string()], skip: vec![] }).unwrap();
    assert!(host.home_path(".local/state/dotsetup-done").is_file());
}

#[test]
fn rerun_message_disappears_after_reset() {
    let host = TestHost::new();
    let opts = RunOpts {
        only: vec!["packages".to_string()],
        skip: vec![],
    };
    let run = || {
        let (ctx, log) = host.context(
            linux(None, Elevation::None),
            Arc::new(FakeExecutor::new()),
            Arc::new(ScriptedPrompter::default()),
            false,
        );
        run_pipeline(&ctx, &opts).unwrap();
        (ctx.marker_path(), log)
    };

    let (_, first) = run();
    assert!(!first.contains("setup already completed on"));
    let (marker, second) = run();
    assert!(second.contains("setup already completed on"));

    reset_marker(&marker, false, second.as_ref()).unwrap();
    let (_, third) = run();
    assert!(!third.contains("setup already completed on"));
}
