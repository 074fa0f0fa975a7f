//! Per-row load outcomes.
//!
//! Loaders never fail on a single bad row. Each skipped row is recorded with a
//! reason so callers (and tests) can inspect counts instead of console text.

use std::collections::BTreeMap;

use serde::Serialize;

/// Why a row (or column, for the production layout) was not loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No month label at this position.
    MissingLabel,
    /// The month label is not `<Month name> <Year>`.
    BadLabel,
    /// Outside the analysis year window.
    OutOfRange,
    /// Empty cell or the `..` "not available" marker.
    NoData,
    /// A value that does not parse as a finite number.
    BadNumber,
    /// A month cell that is not one of the twelve month names.
    UnknownMonth,
    /// A month row seen before any year row.
    NoYear,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// Row index (rail) or block column offset (production) in the raw grid.
    pub position: usize,
    pub reason: SkipReason,
}

/// Aggregate outcome of one loader pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub skipped: Vec<SkippedRow>,
}

impl LoadSummary {
    pub fn keep(&mut self) {
        self.rows_read += 1;
        self.rows_kept += 1;
    }

    pub fn skip(&mut self, position: usize, reason: SkipReason) {
        self.rows_read += 1;
        self.skipped.push(SkippedRow { position, reason });
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }

    /// Skip counts keyed by reason, in a stable order.
    pub fn skip_counts(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for s in &self.skipped {
            *counts.entry(s.reason).or_insert(0) += 1;
        }
        counts
    }

    /// Emit the summary at `info`, and each skipped row at `debug`.
    pub fn log(&self, source: &str) {
        for s in &self.skipped {
            tracing::debug!(source, position = s.position, reason = ?s.reason, "skipped row");
        }
        tracing::info!(
            source,
            read = self.rows_read,
            kept = self.rows_kept,
            skipped = self.skipped.len(),
            reasons = ?self.skip_counts(),
            "loaded"
        );
    }
}
