//! End-of-run report: how each task ended plus package and symlink tallies.

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Completed with nothing left to do.
    Ok,
    /// Did not apply to this host.
    NotApplicable,
    /// Ran but chose not to act; the reason is kept as the detail.
    Skipped,
    /// Previewed only.
    DryRun,
    /// Left work undone. The run still continues.
    Failed,
}

impl TaskStatus {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::NotApplicable => "·",
            Self::Skipped => "○",
            Self::DryRun => "~",
            Self::Failed => "✗",
        }
    }

    const fn tone(self) -> Tone {
        match self {
            Self::Ok => Tone::Good,
            Self::NotApplicable | Self::DryRun => Tone::Muted,
            Self::Skipped => Tone::Caution,
            Self::Failed => Tone::Bad,
        }
    }
}

/// Colour class of a summary line, carried as the `tone` field of the
/// tracing event so the file output stays plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Good,
    Muted,
    Caution,
    Bad,
}

impl Tone {
    pub(super) const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Good => "good",
            Self::Muted => "muted",
            Self::Caution => "caution",
            Self::Bad => "bad",
        }
    }

    pub(super) fn parse(s: &str) -> Self {
        match s {
            "good" => Self::Good,
            "muted" => Self::Muted,
            "caution" => Self::Caution,
            "bad" => Self::Bad,
            _ => Self::Plain,
        }
    }
}

/// Package outcomes for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageTally {
    /// Installed (or, in a dry run, that would be).
    pub installed: usize,
    /// Already tracked by the package manager.
    pub present: usize,
    /// Found on PATH from another source and left alone.
    pub external: usize,
    /// Names of packages that could not be installed.
    pub failed: Vec<String>,
}

impl PackageTally {
    /// `2 installed, 5 already present, 1 external, 0 failed`
    #[must_use]
    pub fn counts(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would install" } else { "installed" };
        format!(
            "{} {verb}, {} already present, {} external, {} failed",
            self.installed,
            self.present,
            self.external,
            self.failed.len()
        )
    }
}

/// Symlink outcomes for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkTally {
    /// Created or replaced (after a backup).
    pub linked: u32,
    /// Already pointing at the right source.
    pub correct: u32,
    /// Not linked because of an error or a missing source.
    pub failed: u32,
}

/// Item counts a batch task reports alongside its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tally {
    /// From the package task.
    Packages(PackageTally),
    /// From the symlink task.
    Links(LinkTally),
}

#[derive(Debug, Clone)]
struct TaskRecord {
    name: String,
    status: TaskStatus,
    detail: Option<String>,
}

/// One rendered summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub tone: Tone,
    pub text: String,
}

impl SummaryLine {
    const fn new(tone: Tone, text: String) -> Self {
        Self { tone, text }
    }
}

/// Everything the summary needs, accumulated while the pipeline runs.
#[derive(Debug, Default)]
pub struct Report {
    tasks: Vec<TaskRecord>,
    packages: Option<PackageTally>,
    links: Option<LinkTally>,
}

impl Report {
    pub fn record(&mut self, name: &str, status: TaskStatus, detail: Option<&str>) {
        self.tasks.push(TaskRecord {
            name: name.to_string(),
            status,
            detail: detail.map(String::from),
        });
    }

    /// Keep the latest tally of each kind.
    pub fn tally(&mut self, tally: Tally) {
        match tally {
            Tally::Packages(p) => self.packages = Some(p),
            Tally::Links(l) => self.links = Some(l),
        }
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .count()
    }

    /// Render the summary; empty when no task was recorded.
    #[must_use]
    pub fn render(&self, dry_run: bool) -> Vec<SummaryLine> {
        if self.tasks.is_empty() {
            return Vec::new();
        }
        let mut lines: Vec<SummaryLine> = self
            .tasks
            .iter()
            .map(|t| {
                let detail = t
                    .detail
                    .as_ref()
                    .map_or_else(String::new, |d| format!(" ({d})"));
                SummaryLine::new(
                    t.status.tone(),
                    format!("{} {}{detail}", t.status.symbol(), t.name),
                )
            })
            .collect();

        if let Some(p) = &self.packages {
            let mut text = format!("packages: {}", p.counts(dry_run));
            let tone = if p.failed.is_empty() {
                Tone::Plain
            } else {
                text.push_str(&format!(" ({})", p.failed.join(", ")));
                Tone::Bad
            };
            lines.push(SummaryLine::new(tone, text));
        }
        if let Some(l) = self.links {
            let verb = if dry_run { "would link" } else { "linked" };
            let tone = if l.failed > 0 { Tone::Bad } else { Tone::Plain };
            lines.push(SummaryLine::new(
                tone,
                format!(
                    "symlinks: {} {verb}, {} already correct, {} failed",
                    l.linked, l.correct, l.failed
                ),
            ));
        }

        let count = |s: TaskStatus| self.tasks.iter().filter(|t| t.status == s).count();
        let failed = self.failures();
        lines.push(SummaryLine::new(
            if failed > 0 { Tone::Bad } else { Tone::Good },
            format!(
                "{} tasks: {} ok, {} n/a, {} skipped, {} dry-run, {failed} failed",
                self.tasks.len(),
                count(TaskStatus::Ok),
                count(TaskStatus::NotApplicable),
                count(TaskStatus::Skipped),
                count(TaskStatus::DryRun),
            ),
        ));
        lines
    }
}
