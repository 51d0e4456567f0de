//! Persistent per-command log file.
//!
//! Every event at `DEBUG` and above is appended as one plain line:
//! `HH:MM:SS <tag> <message>`, so a failed run can be inspected after the
//! terminal is gone.
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::event::{self, Kind};

/// `$XDG_CACHE_HOME/dotsetup/<command>.log`, falling back to
/// `$HOME/.cache`. Returns `None` when the directory cannot be created.
#[must_use]
pub fn log_file_path(command: &str) -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))?;
    let dir = base.join("dotsetup");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

const fn tag(kind: Kind) -> &'static str {
    match kind {
        Kind::Stage => "stage",
        Kind::DryRun => "dry-run",
        Kind::Summary(_) => "summary",
        Kind::Info => "info",
        Kind::Debug => "debug",
        Kind::Warn => "warn",
        Kind::Error => "error",
    }
}

fn line(time: &str, kind: Kind, msg: &str) -> String {
    format!("{time} {:<7} {msg}", tag(kind))
}

/// [`tracing_subscriber::Layer`] writing to the log file.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<File>,
}

impl FileLayer {
    /// Truncate `path` and start it with a header naming the command.
    pub(super) fn create(path: &Path, command: &str) -> io::Result<Self> {
        let mut file = File::create(path)?;
        writeln!(
            file,
            "# dotsetup {} {command} started {}",
            crate::commands::version::version(),
            chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
        )?;
        drop(file);
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let (kind, msg) = event::read(event);
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line(&time, kind, &msg));
        }
    }
}
