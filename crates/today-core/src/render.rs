use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::{format_day_header, format_local};
use crate::error::Alert;
use crate::filter::FilterSummary;
use crate::task::Task;

const HEADERS: [&str; 5] = ["ID", "", "Description", "Estimate", "Done"];

/// One table cell: plain text plus the ANSI code it is painted with.
struct Cell {
    text: String,
    code: Option<&'static str>,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    fn painted(text: impl Into<String>, code: &'static str) -> Self {
        Self {
            text: text.into(),
            code: Some(code),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Header with today's date and counts, then the visible tasks.
    #[tracing::instrument(skip_all)]
    pub fn write_screen<W: Write>(
        &self,
        mut out: W,
        all: &[Task],
        shown: &[Task],
        show_done: bool,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let summary = FilterSummary::of(all);
        writeln!(out, "Today  {}", format_day_header(now))?;
        writeln!(
            out,
            "{} pending, {} done{}",
            summary.pending,
            summary.done,
            if show_done { "" } else { " (done hidden)" }
        )?;
        writeln!(out)?;

        if shown.is_empty() {
            writeln!(out, "No tasks.")?;
            return Ok(());
        }

        let rows: Vec<[Cell; 5]> = shown.iter().map(|task| task_row(task, now)).collect();

        let mut widths = HEADERS.map(|header| header.width());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.text.width());
            }
        }

        for (header, width) in HEADERS.iter().zip(widths) {
            write!(out, "{header:width$} ")?;
        }
        writeln!(out)?;
        for width in widths {
            write!(out, "{} ", "-".repeat(width))?;
        }
        writeln!(out)?;

        for row in &rows {
            for (cell, width) in row.iter().zip(widths) {
                let pad = " ".repeat(width.saturating_sub(cell.text.width()));
                match cell.code {
                    Some(code) if self.color => {
                        write!(out, "\x1b[{code}m{}\x1b[0m{pad} ", cell.text)?
                    }
                    _ => write!(out, "{}{pad} ", cell.text)?,
                }
            }
            writeln!(out)?;
        }

        Ok(())
    }

    pub fn print_screen(
        &self,
        all: &[Task],
        shown: &[Task],
        show_done: bool,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.write_screen(io::stdout().lock(), all, shown, show_done, now)
    }

    pub fn print_alert(&self, alert: &Alert) -> anyhow::Result<()> {
        let mut err = io::stderr().lock();
        writeln!(err, "{}: {}", alert.title, alert.message)?;
        Ok(())
    }
}

// Done tasks are struck through; late pending ones show their estimate in red.
fn task_row(task: &Task, now: DateTime<Utc>) -> [Cell; 5] {
    let estimate = format_local(task.estimate_at);
    [
        Cell::painted(task.id.to_string(), "33"),
        Cell::plain(if task.is_done() { "[x]" } else { "[ ]" }),
        if task.is_done() {
            Cell::painted(task.description.clone(), "9")
        } else {
            Cell::plain(task.description.clone())
        },
        if task.is_overdue(now) {
            Cell::painted(estimate, "31")
        } else {
            Cell::plain(estimate)
        },
        Cell::plain(task.done_at.map(format_local).unwrap_or_default()),
    ]
}
