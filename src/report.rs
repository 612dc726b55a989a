use std::io::{self, IsTerminal, Write};

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Outcome of a run: the entries produced, in order, and success/failure counts.
pub struct Report {
    entries: Vec<String>,
    succeeded: usize,
    failed: usize,
    color: bool,
}

impl Report {
    pub fn new(color: bool) -> Self {
        Report {
            entries: Vec::new(),
            succeeded: 0,
            failed: 0,
            color,
        }
    }

    pub fn success(&mut self, entry: String) {
        self.succeeded += 1;
        self.entries.push(entry);
    }

    pub fn failure(&mut self, what: &str, err: &anyhow::Error) {
        self.failed += 1;
        tracing::error!("{what}: {err:#}");
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// A progress bar on stderr, hidden when stderr is not a terminal.
    pub fn progress(&self, len: u64) -> ProgressBar {
        if !io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉ "),
        );
        pb
    }

    /// Entries separated by blank lines.
    pub fn write_entries(&self, w: &mut dyn Write) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(w, "{entry}")?;
            writeln!(w)?;
        }
        Ok(())
    }

    pub fn write_summary(&self, w: &mut dyn Write) -> io::Result<()> {
        let ok = format!("✓ {}", self.succeeded);
        let bad = format!("✗ {}", self.failed);
        if self.color {
            writeln!(w, "{} {}", ok.green(), bad.red())
        } else {
            writeln!(w, "{ok} {bad}")
        }
    }
}
