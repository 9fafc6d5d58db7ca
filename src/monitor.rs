//! Build session lifecycle and event application.
//!
//! [`BuildMonitor`] owns at most one live [`BuildSession`] at a time
//! (Idle → Running → Idle). Raw output lines flow in through
//! [`BuildMonitor::append_output`]; every line shifts the session's rolling
//! window, runs the classifier, and applies the resulting signal to the
//! timing ledger and page estimate before emitting a progress signal to the
//! caller's sink.
//!
//! The monitor is single-writer: all methods take `&mut self` and never
//! block. Multi-threaded hosts serialize access with their own lock.

use crate::classify::{self, PageYield, Signal};
use crate::config::MonitorOptions;
use crate::errors::EngineError;
use crate::events::{BuildSummary, ProgressEvent, ProgressSink};
use crate::ledger::{StageKey, StepKind, TimingLedger};
use crate::window::{RollingWindow, WINDOW_LINES};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tokio::sync::oneshot;
use uuid::Uuid;

/// State for one build run, created on `start` and discarded on `end`.
struct BuildSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    last_event: Instant,
    window: RollingWindow,
    ledger: TimingLedger,
    /// 1-based stage counter; 0 until the first stage is recognized.
    stage: u32,
    stage_name: String,
    pages: PageYield,
    estimate: Option<u32>,
    authoritative: bool,
    done_tx: oneshot::Sender<BuildSummary>,
}

impl BuildSession {
    fn new(done_tx: oneshot::Sender<BuildSummary>) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: now,
            last_event: now,
            window: RollingWindow::new(WINDOW_LINES),
            ledger: TimingLedger::new(),
            stage: 0,
            stage_name: String::new(),
            // No stage yet, so there is nothing to attribute pages to.
            pages: PageYield::No,
            estimate: None,
            authoritative: false,
            done_tx,
        }
    }

    fn ingest_line(&mut self, line: &str, sink: &mut dyn ProgressSink) {
        self.window.push(line);
        match classify::classify(&self.window, self.pages) {
            Some(Signal::StageStart { tool, pages }) => self.apply_stage_start(tool, pages, sink),
            Some(Signal::Page(page)) => self.apply_page(page, sink),
            None => {}
        }
    }

    fn apply_stage_start(&mut self, tool: String, pages: PageYield, sink: &mut dyn ProgressSink) {
        let now = Instant::now();
        let wait = now.duration_since(self.last_event).as_millis() as u64;

        self.stage += 1;
        self.stage_name = tool;
        self.pages = pages;
        self.ledger
            .begin_stage(StageKey::new(self.stage, self.stage_name.clone()));
        self.ledger.record(StepKind::Wait, wait);
        self.last_event = now;

        tracing::debug!(stage = self.stage, tool = %self.stage_name, ?pages, "stage started");
        sink.emit(&ProgressEvent::Reset {
            session: self.id,
            stage: self.stage,
            name: self.stage_name.clone(),
            pages,
            at: Utc::now(),
        });
    }

    fn apply_page(&mut self, page: u32, sink: &mut dyn ProgressSink) {
        let now = Instant::now();

        // A marker while the flag is unknown settles it.
        if self.pages == PageYield::Unknown {
            self.pages = PageYield::Yes;
        }

        // Reprocessed pages accumulate their total time rather than resetting it.
        let prior = self.ledger.take_page(page);

        if prior.is_none() && !self.authoritative {
            let seen = self.ledger.current_page_count() as u32 + 1;
            self.estimate = Some(self.estimate.map_or(seen, |e| e.max(seen)));
        }

        let unit = now.duration_since(self.last_event).as_millis() as u64 + prior.unwrap_or(0);
        self.ledger.record(StepKind::Page(page), unit);
        self.last_event = now;

        tracing::debug!(stage = self.stage, page, unit_millis = unit, "page completed");
        sink.emit(&ProgressEvent::Update {
            session: self.id,
            stage: self.stage,
            name: self.stage_name.clone(),
            page: Some(page),
            unit_millis: unit,
            pages_total: self.estimate,
            at: Utc::now(),
        });
    }

    fn finish(self, sink: &mut dyn ProgressSink) -> BuildSummary {
        let BuildSession {
            id,
            started_at,
            started,
            last_event,
            mut ledger,
            pages,
            done_tx,
            ..
        } = self;

        if pages == PageYield::Unknown {
            // End of build settles the flag: no marker ever appeared.
            tracing::debug!("final stage produced no pages");
        }

        // Close the final stage's timeline with the tail since the last event.
        if !ledger.is_empty() {
            let tail = last_event.elapsed().as_millis() as u64;
            ledger.record(StepKind::Step, tail);
        }

        let summary = BuildSummary {
            session: id,
            started_at,
            total_millis: started.elapsed().as_millis() as u64,
            ledger,
        };

        sink.emit(&ProgressEvent::Finished {
            summary: summary.clone(),
        });
        // The receiver may have been dropped; completion is best-effort.
        let _ = done_tx.send(summary.clone());
        summary
    }
}

/// The session controller. Owns the current session (absent when idle) and
/// the enabled flag captured once at construction.
pub struct BuildMonitor {
    enabled: bool,
    session: Option<BuildSession>,
    /// Completion channel for a session started while disabled, so awaiting
    /// callers still resolve on `end()`.
    disabled_done: Option<oneshot::Sender<BuildSummary>>,
}

impl BuildMonitor {
    pub fn new(options: &MonitorOptions) -> Self {
        Self {
            enabled: options.enabled,
            session: None,
            disabled_done: None,
        }
    }

    /// Whether a session slot is currently taken.
    pub fn is_running(&self) -> bool {
        self.session.is_some() || self.disabled_done.is_some()
    }

    /// Begin a new build session. The returned receiver resolves exactly
    /// once, with the session's summary, when [`Self::end`] runs.
    ///
    /// Starting while a session is already running fails with
    /// [`EngineError::AlreadyRunning`] — deterministically, in both enabled
    /// and disabled modes.
    pub fn start(&mut self) -> Result<oneshot::Receiver<BuildSummary>, EngineError> {
        if self.is_running() {
            return Err(EngineError::AlreadyRunning);
        }
        let (tx, rx) = oneshot::channel();
        if !self.enabled {
            self.disabled_done = Some(tx);
            return Ok(rx);
        }
        let session = BuildSession::new(tx);
        tracing::debug!(session = %session.id, "build session started");
        self.session = Some(session);
        Ok(rx)
    }

    /// Feed raw build output. The chunk is split into lines; each line shifts
    /// the rolling window and may produce one signal. Delivery is assumed
    /// line-oriented: a chunk may carry several complete lines but the engine
    /// never reassembles a line split across chunks.
    ///
    /// Fails with [`EngineError::NotStarted`] while idle (a programmer
    /// error); malformed build output never fails.
    pub fn append_output(
        &mut self,
        chunk: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), EngineError> {
        if !self.enabled {
            return Ok(());
        }
        let session = self.session.as_mut().ok_or(EngineError::NotStarted)?;
        for line in chunk.lines() {
            session.ingest_line(line, sink);
        }
        Ok(())
    }

    /// Record an authoritative total-page count (e.g. from a log parser that
    /// saw `Output written on main.pdf (12 pages)`). Never decreases the
    /// estimate; no-op while idle or disabled.
    pub fn set_page_total(&mut self, total: u32) {
        if let Some(session) = self.session.as_mut() {
            session.authoritative = true;
            session.estimate = Some(session.estimate.map_or(total, |e| e.max(total)));
        }
    }

    /// End the current session: close the final stage, emit `Finished`,
    /// resolve the completion channel, and return to idle.
    pub fn end(&mut self, sink: &mut dyn ProgressSink) -> Result<BuildSummary, EngineError> {
        if !self.enabled {
            let summary = BuildSummary::empty();
            if let Some(tx) = self.disabled_done.take() {
                let _ = tx.send(summary.clone());
            }
            return Ok(summary);
        }
        let session = self.session.take().ok_or(EngineError::NotStarted)?;
        tracing::debug!(session = %session.id, "build session ended");
        Ok(session.finish(sink))
    }
}
