//! Classification of tracing events shared by the console and file outputs.
use tracing::field::{Field, Visit};

use super::report::Tone;

/// Target for stage headers.
pub(super) const STAGE_TARGET: &str = "dotsetup::stage";
/// Target for dry-run previews.
pub(super) const DRY_RUN_TARGET: &str = "dotsetup::dry_run";
/// Target for summary lines; these carry a `tone` field.
pub(super) const SUMMARY_TARGET: &str = "dotsetup::summary";

/// What an event is, as far as rendering cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Kind {
    Stage,
    DryRun,
    Summary(Tone),
    Info,
    Debug,
    Warn,
    Error,
}

#[derive(Default)]
struct Fields {
    message: String,
    tone: Option<String>,
}

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "tone" => self.tone = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

/// Split an event into its kind and message text.
pub(super) fn read(event: &tracing::Event<'_>) -> (Kind, String) {
    let mut fields = Fields::default();
    event.record(&mut fields);
    let meta = event.metadata();
    let kind = match *meta.level() {
        tracing::Level::ERROR => Kind::Error,
        tracing::Level::WARN => Kind::Warn,
        tracing::Level::INFO => match meta.target() {
            STAGE_TARGET => Kind::Stage,
            DRY_RUN_TARGET => Kind::DryRun,
            SUMMARY_TARGET => Kind::Summary(Tone::parse(fields.tone.as_deref().unwrap_or(""))),
            _ => Kind::Info,
        },
        _ => Kind::Debug,
    };
    (kind, fields.message)
}
