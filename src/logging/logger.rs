//! The [`Log`] seam tasks write through, and its tracing-backed [`Logger`].
use std::path::PathBuf;
use std::sync::Mutex;

use super::event::{DRY_RUN_TARGET, STAGE_TARGET, SUMMARY_TARGET};
use super::report::{Report, Tally, TaskStatus, Tone};

/// Where tasks send progress and outcomes.
///
/// Passed around as `Arc<dyn Log>` so tests can capture output without a
/// global subscriber.
pub trait Log: Send + Sync {
    /// Section header, one per task.
    fn stage(&self, msg: &str);
    /// Progress worth showing by default.
    fn info(&self, msg: &str);
    /// Console shows these only with `--debug`; the log file always does.
    fn debug(&self, msg: &str);
    /// Something went wrong but the task carries on.
    fn warn(&self, msg: &str);
    /// Something the user has to fix.
    fn error(&self, msg: &str);
    /// A change that would have been made without `--dry-run`.
    fn dry_run(&self, msg: &str);
    /// Note how a task ended.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
    /// Attach item counts from a batch task.
    fn record_tally(&self, tally: Tally);
}

/// [`Log`] over the global tracing subscriber, collecting a [`Report`] for
/// the end-of-run summary.
#[derive(Debug)]
pub struct Logger {
    report: Mutex<Report>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// `log_file` is only displayed; the file layer owns the file itself.
    #[must_use]
    pub fn new(log_file: Option<PathBuf>) -> Self {
        Self {
            report: Mutex::new(Report::default()),
            log_file,
        }
    }

    /// Number of tasks recorded as failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.report.lock().map_or(0, |r| r.failures())
    }

    /// Emit the summary: task outcomes, package and symlink counts, totals
    /// and the log file location.
    pub fn print_summary(&self, dry_run: bool) {
        let lines = self
            .report
            .lock()
            .map_or_else(|_| Vec::new(), |r| r.render(dry_run));
        if lines.is_empty() {
            return;
        }
        self.stage("Summary");
        for line in lines {
            tracing::info!(target: SUMMARY_TARGET, tone = line.tone.as_str(), "{}", line.text);
        }
        if let Some(path) = &self.log_file {
            tracing::info!(
                target: SUMMARY_TARGET,
                tone = Tone::Muted.as_str(),
                "log: {}",
                path.display()
            );
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut report) = self.report.lock() {
            report.record(name, status, message);
        }
    }

    fn record_tally(&self, tally: Tally) {
        if let Ok(mut report) = self.report.lock() {
            report.tally(tally);
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::file::FileLayer;
    use crate::logging::report::PackageTally;
    use tracing_subscriber::layer::SubscriberExt as _;

    /// Run `f` with a file layer at a temporary path; return the file text.
    fn captured(f: impl FnOnce(&Logger)) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let subscriber =
            tracing_subscriber::registry().with(FileLayer::create(&path, "run").unwrap());
        let log = Logger::new(Some(path.clone()));
        tracing::subscriber::with_default(subscriber, || f(&log));
        std::fs::read_to_string(&path).unwrap()
    }

    #[test]
    fn failure_count_tracks_failed_tasks_only() {
        let log = Logger::new(None);
        log.record_task("Refresh package index", TaskStatus::Skipped, Some("refresh failed"));
        log.record_task("Install packages", TaskStatus::Failed, Some("1 package(s) failed: jq"));
        log.record_task("Install symlinks", TaskStatus::Ok, None);
        assert_eq!(log.failure_count(), 1);
    }

    #[test]
    fn summary_includes_package_failures_and_log_path() {
        let text = captured(|log| {
            log.record_task("Install packages", TaskStatus::Failed, None);
            log.record_tally(Tally::Packages(PackageTally {
                installed: 2,
                failed: vec!["jq".into()],
                ..PackageTally::default()
            }));
            log.print_summary(false);
        });
        assert!(text.contains("stage   Summary"));
        assert!(text.contains("summary ✗ Install packages"));
        assert!(text.contains("packages: 2 installed, 0 already present, 0 external, 1 failed (jq)"));
        assert!(text.contains("summary log: "));
    }

    #[test]
    fn nothing_recorded_prints_no_summary() {
        let text = captured(|log| log.print_summary(false));
        assert!(!text.contains("Summary"));
    }

    #[test]
    fn trait_methods_are_tagged_by_kind() {
        let text = captured(|log| {
            let log: &dyn Log = log;
            log.warn("index refresh failed");
            log.dry_run("would install git via apt");
            log.error("jq: not found");
        });
        assert!(text.contains("warn    index refresh failed"));
        assert!(text.contains("dry-run would install git via apt"));
        assert!(text.contains("error   jq: not found"));
    }
}
