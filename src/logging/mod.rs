//! Run logging: styled console output, a per-command log file, and the
//! end-of-run report.
mod console;
mod event;
mod file;
mod logger;
mod report;

pub use file::log_file_path;
pub use logger::{Log, Logger};
pub use report::{LinkTally, PackageTally, Tally, TaskStatus};

use std::path::Path;

/// Install the global subscriber.
///
/// Warnings and errors go to stderr, everything else to stdout; `verbose`
/// lets debug lines through to the console. When `log_file` can be created
/// it receives every event at `DEBUG` and above. Call once, before logging.
pub fn init_subscriber(verbose: bool, command: &str, log_file: Option<&Path>) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .or_else(std::io::stdout);
    let console = fmt::layer()
        .event_format(console::ConsoleFormat)
        .with_writer(writer)
        .with_filter(level);
    let file = log_file
        .and_then(|path| file::FileLayer::create(path, command).ok())
        .map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();
}
