use std::thread;

use tracing::{debug, info, warn};

use crate::config::RunSettings;
use crate::dedup::FingerprintSet;
use crate::domain::{Candidate, CatalogEntry, EntryOutcome, TitleVariant};
use crate::download::{HttpPdfFetcher, PdfFetcher};
use crate::error::ScoreError;
use crate::queries;
use crate::relevance;
use crate::report::{EntryResult, RunReport, RunSummary};
use crate::sources::{
    DuckDuckGoSource, ImslpSource, InternetArchiveSource, MutopiaSource, SourceConnector,
    SourceRequest,
};
use crate::store::{remote_basename, ScoreStore};

/// Per-entry acquisition state: how many scores are already banked and which
/// content sizes they occupy. Lives from entry start to outcome
/// classification and is never persisted.
#[derive(Debug, Clone)]
pub struct AcquisitionState {
    pub quota: u32,
    pub achieved: u32,
    pub fingerprints: FingerprintSet,
}

impl AcquisitionState {
    pub fn new(quota: u32) -> Self {
        Self {
            quota,
            achieved: 0,
            fingerprints: FingerprintSet::new(),
        }
    }

    pub fn quota_met(&self) -> bool {
        self.achieved >= self.quota
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Drives the whole acquisition run: per entry, a narrowing loop over title
/// variants, each iteration one cascade across the sources in fixed
/// precedence order, stopping the moment the quota is met.
pub struct Acquirer<F: PdfFetcher> {
    store: ScoreStore,
    sources: Vec<Box<dyn SourceConnector>>,
    fetcher: F,
    settings: RunSettings,
}

impl Acquirer<HttpPdfFetcher> {
    /// The production wiring: search engine first, then IMSLP, the Internet
    /// Archive, and Mutopia.
    pub fn with_default_sources(
        store: ScoreStore,
        settings: RunSettings,
    ) -> Result<Self, ScoreError> {
        let sources: Vec<Box<dyn SourceConnector>> = vec![
            Box::new(DuckDuckGoSource::new()?),
            Box::new(ImslpSource::new()?),
            Box::new(InternetArchiveSource::new()?),
            Box::new(MutopiaSource::new()?),
        ];
        Ok(Self::new(store, sources, HttpPdfFetcher::new()?, settings))
    }
}

impl<F: PdfFetcher> Acquirer<F> {
    pub fn new(
        store: ScoreStore,
        sources: Vec<Box<dyn SourceConnector>>,
        fetcher: F,
        settings: RunSettings,
    ) -> Self {
        Self {
            store,
            sources,
            fetcher,
            settings,
        }
    }

    /// Processes every catalog entry in order and returns the run summary.
    /// Only catalog-level problems escape; per-entry failures are folded
    /// into that entry's outcome.
    pub fn run(
        &self,
        entries: &[CatalogEntry],
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, ScoreError> {
        self.store.ensure_root()?;
        let mut report = RunReport::new();
        let mut results = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let (outcome, achieved) = self.process_entry(entry, &mut report, sink);
            results.push(EntryResult {
                entry: entry.clone(),
                outcome,
                achieved,
                quota: self.settings.quota,
            });
            if index + 1 < entries.len() {
                thread::sleep(self.settings.entry_delay);
            }
        }

        Ok(RunSummary {
            report,
            entries: results,
        })
    }

    /// Classifies entries from on-disk state alone: no network, no writes.
    /// Backs both `status` and dry runs.
    pub fn plan(
        &self,
        entries: &[CatalogEntry],
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, ScoreError> {
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            let state = self.seed_state(entry)?;
            let outcome = if state.quota_met() {
                EntryOutcome::Complete
            } else {
                EntryOutcome::Incomplete
            };
            sink.event(ProgressEvent {
                message: format!("{entry}: {}/{} on disk", state.achieved, state.quota),
            });
            results.push(EntryResult {
                entry: entry.clone(),
                outcome,
                achieved: state.achieved,
                quota: state.quota,
            });
        }
        Ok(RunSummary {
            report: RunReport::new(),
            entries: results,
        })
    }

    fn process_entry(
        &self,
        entry: &CatalogEntry,
        report: &mut RunReport,
        sink: &dyn ProgressSink,
    ) -> (EntryOutcome, u32) {
        let mut state = match self.seed_state(entry) {
            Ok(state) => state,
            Err(err) => {
                warn!(%entry, error = %err, "could not seed entry state");
                return (EntryOutcome::Aborted(err.to_string()), 0);
            }
        };

        if state.quota_met() {
            sink.event(ProgressEvent {
                message: format!("skipping {entry}: already have {} scores", state.achieved),
            });
            return (EntryOutcome::Complete, state.achieved);
        }

        sink.event(ProgressEvent {
            message: format!("processing {entry}"),
        });

        match self.narrow_until_done(entry, &mut state, report, sink) {
            Ok(()) => {
                let outcome = if state.quota_met() {
                    EntryOutcome::Complete
                } else {
                    EntryOutcome::Incomplete
                };
                info!(%entry, achieved = state.achieved, quota = state.quota, "entry finished");
                (outcome, state.achieved)
            }
            Err(err) => {
                warn!(%entry, error = %err, "entry aborted");
                (EntryOutcome::Aborted(err.to_string()), state.achieved)
            }
        }
    }

    fn seed_state(&self, entry: &CatalogEntry) -> Result<AcquisitionState, ScoreError> {
        let existing = self.store.existing_sizes(entry)?;
        let mut state = AcquisitionState::new(self.settings.quota);
        state.achieved = existing.len() as u32;
        state.fingerprints = FingerprintSet::seed(existing);
        Ok(state)
    }

    /// The outer loop: cascade with the full title, then keep dropping the
    /// last title token and cascading again until the quota is met or the
    /// single-token variant has had its attempt.
    fn narrow_until_done(
        &self,
        entry: &CatalogEntry,
        state: &mut AcquisitionState,
        report: &mut RunReport,
        sink: &dyn ProgressSink,
    ) -> Result<(), ScoreError> {
        let mut variant = TitleVariant::full(&entry.title);
        loop {
            self.cascade(entry, &variant, state, report, sink)?;
            if state.quota_met() {
                return Ok(());
            }
            match variant.narrowed() {
                Some(next) => {
                    sink.event(ProgressEvent {
                        message: format!("retrying with shortened title: {next}"),
                    });
                    variant = next;
                }
                None => return Ok(()),
            }
        }
    }

    /// One ordered pass across all sources for a single title variant.
    /// Every step re-checks the quota and the whole cascade stops the
    /// instant it is met.
    fn cascade(
        &self,
        entry: &CatalogEntry,
        variant: &TitleVariant,
        state: &mut AcquisitionState,
        report: &mut RunReport,
        sink: &dyn ProgressSink,
    ) -> Result<(), ScoreError> {
        for source in &self.sources {
            if state.quota_met() {
                return Ok(());
            }
            let queries: Vec<Option<String>> = if source.consumes_queries() {
                queries::generate(variant, &entry.composer)
                    .into_iter()
                    .map(Some)
                    .collect()
            } else {
                vec![None]
            };

            for query in &queries {
                if state.quota_met() {
                    return Ok(());
                }
                if let Some(query) = query {
                    debug!(source = %source.tag(), query = %query, "searching");
                }
                let request = SourceRequest {
                    query: query.as_deref(),
                    variant,
                    composer: &entry.composer,
                    max_results: self.settings.results_per_query,
                };
                for url in source.fetch(&request) {
                    if state.quota_met() {
                        return Ok(());
                    }
                    let candidate = Candidate {
                        url,
                        source: source.tag(),
                        variant: variant.text(),
                    };
                    self.consider(entry, variant, &candidate, state, report, sink)?;
                }
            }
        }
        Ok(())
    }

    /// Filter, probe, download, dedupe one candidate. Increments `achieved`
    /// at most once and observes the courtesy delay after an accepted
    /// download.
    fn consider(
        &self,
        entry: &CatalogEntry,
        variant: &TitleVariant,
        candidate: &Candidate,
        state: &mut AcquisitionState,
        report: &mut RunReport,
        sink: &dyn ProgressSink,
    ) -> Result<(), ScoreError> {
        if !relevance::is_relevant(&candidate.url, variant, &entry.composer) {
            debug!(
                url = %candidate.url,
                source = %candidate.source,
                variant = %candidate.variant,
                "skipping irrelevant candidate"
            );
            return Ok(());
        }

        if let Some(size) = self.fetcher.probe_size(&candidate.url) {
            if state.fingerprints.contains(size) {
                debug!(url = %candidate.url, size, "skipping duplicate before download");
                return Ok(());
            }
        }

        let destination = self
            .store
            .file_path(entry, &remote_basename(&candidate.url));
        let Some(bytes) = self.fetcher.download(&candidate.url, &destination)? else {
            return Ok(());
        };

        // The on-disk byte count is the fingerprint; the probed header was
        // only a pre-download gate.
        if !state.fingerprints.insert(bytes) {
            self.store.remove_file(&destination)?;
            debug!(url = %candidate.url, bytes, "removed duplicate after download");
            return Ok(());
        }

        state.achieved += 1;
        let source_total = report.record(candidate.source);
        sink.event(ProgressEvent {
            message: format!(
                "saved {} ({} bytes) via {}: {}/{} for this piece, {} total from {}",
                destination
                    .file_name()
                    .unwrap_or(candidate.url.as_str()),
                bytes,
                candidate.source,
                state.achieved,
                state.quota,
                source_total,
                candidate.source,
            ),
        });
        thread::sleep(self.settings.download_delay);
        Ok(())
    }
}
