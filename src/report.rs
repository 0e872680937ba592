use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{CatalogEntry, EntryOutcome, SourceTag};

/// Run-wide accepted-download counters, one per source. Created at run
/// start, updated as downloads land, displayed at run end; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    counts: BTreeMap<SourceTag, u64>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: chrono::Utc::now().to_rfc3339(),
            counts: BTreeMap::new(),
        }
    }

    /// Counts one accepted download and returns the source's running total.
    pub fn record(&mut self, source: SourceTag) -> u64 {
        let count = self.counts.entry(source).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, source: SourceTag) -> u64 {
        self.counts.get(&source).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// How one entry ended, for the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct EntryResult {
    pub entry: CatalogEntry,
    pub outcome: EntryOutcome,
    pub achieved: u32,
    pub quota: u32,
}

/// Everything a finished run reports back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub report: RunReport,
    pub entries: Vec<EntryResult>,
}

impl RunSummary {
    pub fn complete_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|result| result.outcome.is_complete())
            .count()
    }

    pub fn incomplete_count(&self) -> usize {
        self.entries.len() - self.complete_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_per_source_totals() {
        let mut report = RunReport::new();
        assert_eq!(report.record(SourceTag::DuckDuckGo), 1);
        assert_eq!(report.record(SourceTag::DuckDuckGo), 2);
        assert_eq!(report.record(SourceTag::Imslp), 1);
        assert_eq!(report.count(SourceTag::DuckDuckGo), 2);
        assert_eq!(report.count(SourceTag::Mutopia), 0);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn summary_counts_outcomes() {
        let entry = CatalogEntry::new("1", "Bach", "Minuet").unwrap();
        let summary = RunSummary {
            report: RunReport::new(),
            entries: vec![
                EntryResult {
                    entry: entry.clone(),
                    outcome: EntryOutcome::Complete,
                    achieved: 3,
                    quota: 3,
                },
                EntryResult {
                    entry: entry.clone(),
                    outcome: EntryOutcome::Incomplete,
                    achieved: 1,
                    quota: 3,
                },
                EntryResult {
                    entry,
                    outcome: EntryOutcome::Aborted("disk full".to_string()),
                    achieved: 0,
                    quota: 3,
                },
            ],
        };
        assert_eq!(summary.complete_count(), 1);
        assert_eq!(summary.incomplete_count(), 2);
    }
}
