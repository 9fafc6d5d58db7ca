//! Progress signal types emitted by the build monitor.
//!
//! Three signals cover the engine's external surface:
//!
//! - `Reset` — a new stage began, the visual indicator restarts from zero
//! - `Update` — page or generic-step progress within the current stage
//! - `Finished` — the session ended, with the total wall-clock time
//!
//! Signals are in-process values; the integrating application maps them onto
//! whatever presentation channel it uses via [`ProgressSink`].

use crate::classify::PageYield;
use crate::ledger::TimingLedger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discrete progress signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A new stage began; no page number is known yet.
    Reset {
        session: Uuid,
        stage: u32,
        name: String,
        pages: PageYield,
        at: DateTime<Utc>,
    },
    /// Progress within the current stage.
    Update {
        session: Uuid,
        stage: u32,
        name: String,
        /// Page just completed, absent for generic steps.
        page: Option<u32>,
        /// Time spent on this unit, in milliseconds.
        unit_millis: u64,
        /// Best current guess at total pages, if any.
        pages_total: Option<u32>,
        at: DateTime<Utc>,
    },
    /// The session ended.
    Finished { summary: BuildSummary },
}

impl ProgressEvent {
    /// Completion fraction for display, when one can be derived.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            ProgressEvent::Update {
                page: Some(p),
                pages_total: Some(total),
                ..
            } if *total > 0 => Some((f64::from(*p) / f64::from(*total)).clamp(0.0, 1.0)),
            ProgressEvent::Finished { .. } => Some(1.0),
            _ => None,
        }
    }
}

/// Everything recorded about one finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub session: Uuid,
    pub started_at: DateTime<Utc>,
    /// Total elapsed wall-clock time, in milliseconds.
    pub total_millis: u64,
    pub ledger: TimingLedger,
}

impl BuildSummary {
    /// The summary a disabled monitor resolves its completion channel with.
    pub fn empty() -> Self {
        Self {
            session: Uuid::nil(),
            started_at: Utc::now(),
            total_millis: 0,
            ledger: TimingLedger::new(),
        }
    }
}

/// Consumer of progress signals. Implementations must not block: signals are
/// emitted from the synchronous ingestion path.
pub trait ProgressSink {
    fn emit(&mut self, event: &ProgressEvent);
}

/// Sink that drops every signal. Useful when only the returned summary or
/// the completion channel matters.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&mut self, _event: &ProgressEvent) {}
}
