//! Terminal status-line sink, rendered via `indicatif`.
//!
//! One spinner line carries the stage icon, stage name, the rendered bar,
//! and the current page counts. On `Finished` the spinner stops and a
//! per-stage timing table is printed.

use crate::classify::PageYield;
use crate::config::MonitorOptions;
use crate::events::{BuildSummary, ProgressEvent, ProgressSink};
use crate::ui::bar;
use crate::ui::icons::stage_icon;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct StatusLine {
    spinner: ProgressBar,
    options: MonitorOptions,
}

impl StatusLine {
    pub fn new(options: &MonitorOptions) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .expect("status line template is a valid static string"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("waiting for build output...");
        Self {
            spinner,
            options: options.clone(),
        }
    }

    /// Print a line above the spinner without tearing it.
    fn print_line(&self, msg: impl AsRef<str>) {
        self.spinner.println(msg.as_ref());
    }

    fn print_summary(&self, summary: &BuildSummary) {
        if summary.ledger.is_empty() {
            return;
        }
        self.print_line(format!("{}", style("Stage timings:").underlined()));
        for stage in summary.ledger.stages() {
            let pages = stage.page_count();
            let pages_str = if pages > 0 {
                format!("{pages} pages")
            } else {
                "no pages".to_string()
            };
            self.print_line(format!(
                "  {} {}  {}  {} wait, {} total",
                style(stage_icon(self.options.icon_set, stage.key.number)).cyan(),
                style(&stage.key.name).yellow(),
                style(&pages_str).dim(),
                format_millis(stage.wait_millis()),
                format_millis(stage.total_millis()),
            ));
        }
    }
}

impl ProgressSink for StatusLine {
    fn emit(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Reset {
                stage, name, pages, ..
            } => {
                let rendered = bar::render(0.0, self.options.bar_width, self.options.bar_style);
                let hint = match pages {
                    PageYield::No => "",
                    _ => " (starting...)",
                };
                self.spinner.set_message(format!(
                    "{} {} {}{}",
                    style(stage_icon(self.options.icon_set, *stage)).cyan(),
                    style(name).yellow(),
                    rendered,
                    style(hint).dim(),
                ));
            }
            ProgressEvent::Update {
                stage,
                name,
                page,
                unit_millis,
                pages_total,
                ..
            } => {
                let fraction = event.fraction().unwrap_or(0.0);
                let rendered =
                    bar::render(fraction, self.options.bar_width, self.options.bar_style);
                let counts = match (page, pages_total) {
                    (Some(p), Some(total)) => format!("page {p}/{total}"),
                    (Some(p), None) => format!("page {p}"),
                    _ => "working".to_string(),
                };
                self.spinner.set_message(format!(
                    "{} {} {} {} {}",
                    style(stage_icon(self.options.icon_set, *stage)).cyan(),
                    style(name).yellow(),
                    rendered,
                    counts,
                    style(format!("({})", format_millis(*unit_millis))).dim(),
                ));
            }
            ProgressEvent::Finished { summary } => {
                self.spinner.finish_with_message(format!(
                    "build finished in {}",
                    style(format_millis(summary.total_millis)).green().bold()
                ));
                self.print_summary(summary);
            }
        }
    }
}

/// Format milliseconds as `Xms`, `X.Ys`, or `Xm Ys`.
fn format_millis(millis: u64) -> String {
    if millis < 1_000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", millis as f64 / 1000.0)
    } else {
        let secs = millis / 1000;
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
