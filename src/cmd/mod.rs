//! Command implementations for the texpulse binary.
//!
//! Both commands own the single-writer ingestion loop: lines arrive in
//! order, feed the monitor, and the resulting signals go to one sink.

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use texpulse::config::MonitorOptions;
use texpulse::events::ProgressSink;
use texpulse::monitor::BuildMonitor;
use texpulse::ui::{JsonLines, StatusLine};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// The engine's own log line announcing the final page count, e.g.
/// `Output written on main.pdf (12 pages, 48160 bytes).` — an authoritative
/// total that supersedes the running estimate.
static OUTPUT_WRITTEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Output written on .* \((\d+) pages?").expect("output pattern is valid")
});

fn page_total_in(line: &str) -> Option<u32> {
    OUTPUT_WRITTEN_REGEX
        .captures(line)
        .and_then(|cap| cap[1].parse().ok())
}

fn make_sink(options: &MonitorOptions, json: bool) -> Box<dyn ProgressSink> {
    if json {
        Box::new(JsonLines::new(std::io::stdout()))
    } else {
        Box::new(StatusLine::new(options))
    }
}

fn ingest(monitor: &mut BuildMonitor, line: &str, sink: &mut dyn ProgressSink) -> Result<()> {
    monitor.append_output(line, sink)?;
    if let Some(total) = page_total_in(line) {
        monitor.set_page_total(total);
    }
    Ok(())
}

/// Spawn the build command and stream its combined stdout/stderr into the
/// monitor. Returns the child's exit code.
pub async fn run(options: &MonitorOptions, command: &[String], json: bool) -> Result<i32> {
    let (program, args) = command.split_first().context("empty build command")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn build command '{program}'"))?;

    let stdout = child.stdout.take().context("failed to capture stdout")?;
    let stderr = child.stderr.take().context("failed to capture stderr")?;

    // Merge both streams into one line channel; lines keep arrival order.
    let (tx, mut rx) = mpsc::channel::<String>(256);
    let stderr_tx = tx.clone();
    let stdout_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if stderr_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut sink = make_sink(options, json);
    let mut monitor = BuildMonitor::new(options);
    let _completion = monitor.start()?;

    while let Some(line) = rx.recv().await {
        ingest(&mut monitor, &line, sink.as_mut())?;
    }

    let _ = (stdout_task.await, stderr_task.await);
    let status = child.wait().await.context("failed to wait for build command")?;
    monitor.end(sink.as_mut())?;

    Ok(status.code().unwrap_or(-1))
}

/// Track build output piped to stdin (`latexmk ... 2>&1 | texpulse watch`).
pub async fn watch(options: &MonitorOptions, json: bool) -> Result<()> {
    let mut sink = make_sink(options, json);
    let mut monitor = BuildMonitor::new(options);
    let _completion = monitor.start()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        ingest(&mut monitor, &line, sink.as_mut())?;
    }
    monitor.end(sink.as_mut())?;
    Ok(())
}
