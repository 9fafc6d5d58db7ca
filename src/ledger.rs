//! Per-stage timing ledger.
//!
//! Each recognized stage owns an ordered sequence of timed entries. Entries
//! are tagged variants rather than string-encoded labels, so page lookups and
//! retroactive replacement need no string parsing. Within one stage there is
//! at most one entry per page number at any time: recording a page that was
//! already seen removes the old entry and the caller folds its duration into
//! the new one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one stage: the 1-based stage counter paired with the tool
/// name, so repeated invocations of the same tool stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageKey {
    pub number: u32,
    pub name: String,
}

impl StageKey {
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for StageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.number, self.name)
    }
}

/// What a ledger entry measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// Gap between the previous event and this stage's first recognized output.
    Wait,
    /// A generic unit of work with no page number (e.g. the tail of the
    /// final stage at build end).
    Step,
    /// Completion of output page `n`.
    Page(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub at: DateTime<Utc>,
    pub kind: StepKind,
    pub millis: u64,
}

/// One stage's ordered timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub key: StageKey,
    pub entries: Vec<LedgerEntry>,
}

impl StageRecord {
    /// Total recorded time across all entries.
    pub fn total_millis(&self) -> u64 {
        self.entries.iter().map(|e| e.millis).sum()
    }

    /// Time spent before the stage produced recognizable output.
    pub fn wait_millis(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.kind == StepKind::Wait)
            .map(|e| e.millis)
            .sum()
    }

    /// Distinct pages recorded so far.
    pub fn page_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind, StepKind::Page(_)))
            .count()
    }
}

/// Ordered per-stage timing ledger for one build session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingLedger {
    stages: Vec<StageRecord>,
}

impl TimingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new stage. All subsequent `record`/`take_page` calls apply to
    /// it until the next `begin_stage`.
    pub fn begin_stage(&mut self, key: StageKey) {
        debug_assert!(
            !self.stages.iter().any(|s| s.key == key),
            "stage key repeated within one session"
        );
        self.stages.push(StageRecord {
            key,
            entries: Vec::new(),
        });
    }

    /// Append an entry to the current stage, timestamped now. Ignored when no
    /// stage has been opened (nothing to attribute the time to).
    pub fn record(&mut self, kind: StepKind, millis: u64) {
        if let Some(stage) = self.stages.last_mut() {
            stage.entries.push(LedgerEntry {
                at: Utc::now(),
                kind,
                millis,
            });
        }
    }

    /// Remove the current stage's entry for `page`, returning its duration.
    /// `None` when the page has not been seen in this stage.
    pub fn take_page(&mut self, page: u32) -> Option<u64> {
        let stage = self.stages.last_mut()?;
        let idx = stage
            .entries
            .iter()
            .position(|e| e.kind == StepKind::Page(page))?;
        Some(stage.entries.remove(idx).millis)
    }

    /// Distinct pages recorded in the current stage.
    pub fn current_page_count(&self) -> usize {
        self.stages.last().map_or(0, StageRecord::page_count)
    }

    pub fn current_stage(&self) -> Option<&StageRecord> {
        self.stages.last()
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
