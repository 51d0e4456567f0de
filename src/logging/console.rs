//! Terminal rendering: coloured stage headers, indented messages.
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::event::{self, Kind};
use super::report::Tone;

const RESET: &str = "\x1b[0m";

const fn colour(tone: Tone) -> &'static str {
    match tone {
        Tone::Plain => "",
        Tone::Good => "\x1b[32m",
        Tone::Muted => "\x1b[2m",
        Tone::Caution => "\x1b[33m",
        Tone::Bad => "\x1b[31m",
    }
}

/// One console line for an event of `kind`.
pub(super) fn paint(kind: Kind, msg: &str) -> String {
    match kind {
        Kind::Stage => format!("\x1b[1;36m::\x1b[0m \x1b[1m{msg}{RESET}"),
        Kind::DryRun => match msg.strip_prefix("would ") {
            Some(rest) => format!("   {}would{RESET} {rest}", colour(Tone::Caution)),
            None => format!("   {}[dry run]{RESET} {msg}", colour(Tone::Caution)),
        },
        Kind::Summary(Tone::Plain) | Kind::Info => format!("   {msg}"),
        Kind::Summary(tone) => format!("   {}{msg}{RESET}", colour(tone)),
        Kind::Debug => format!("   {}{msg}{RESET}", colour(Tone::Muted)),
        Kind::Warn => format!("{}warning:{RESET} {msg}", colour(Tone::Caution)),
        Kind::Error => format!("{}error:{RESET} {msg}", colour(Tone::Bad)),
    }
}

/// [`FormatEvent`] that ignores spans and metadata and prints [`paint`]ed lines.
#[derive(Debug)]
pub(super) struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let (kind, msg) = event::read(event);
        writeln!(writer, "{}", paint(kind, &msg))
    }
}
