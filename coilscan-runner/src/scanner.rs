//! Concurrent scanner: fetch and classify every candidate on a bounded pool.
//!
//! Each candidate is one task that owns its fetch-and-classify pipeline. Tasks
//! send their outcome over a channel to a single collector running on the
//! calling thread; the collector is the only place counters and hits live.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use coilscan_core::data::SeriesFetcher;
use coilscan_core::domain::Listing;
use coilscan_core::screening::{screen_series, CriteriaError, ScanHit, Screening, ScreeningCriteria};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::{ScanObserver, ScanProgress};
use crate::result_set::{ResultSet, ScanSummary, SkipReason};

pub const DEFAULT_WORKERS: usize = 10;
pub const MAX_WORKERS: usize = 64;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid screening criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),

    #[error("worker count must be between 1 and 64 (got {0})")]
    InvalidWorkers(usize),

    #[error("failed to build worker pool: {0}")]
    Pool(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Pool size. Valid range 1..=64.
    pub workers: usize,
    /// Calendar days of history requested per symbol.
    pub lookback_days: u32,
    /// Notify the observer every this many completed symbols.
    pub progress_every: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            // ~490 sessions, comfortably above the 245-bar minimum.
            lookback_days: 730,
            progress_every: 50,
        }
    }
}

impl ScannerConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ScanError::InvalidWorkers(self.workers));
        }
        Ok(())
    }
}

/// Result of one candidate's task.
#[derive(Debug)]
enum Outcome {
    Hit(ScanHit),
    Skipped(SkipReason),
}

pub struct Scanner {
    fetcher: Arc<dyn SeriesFetcher>,
    config: ScannerConfig,
    cancel: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(fetcher: Arc<dyn SeriesFetcher>, config: ScannerConfig) -> Self {
        Self {
            fetcher,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Setting this flag stops tasks that have not started yet.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Run one candidate's pipeline. A panic inside the fetcher or the
    /// indicator math is contained to this symbol.
    fn evaluate(&self, listing: &Listing, criteria: &ScreeningCriteria) -> Outcome {
        if self.is_cancelled() {
            return Outcome::Skipped(SkipReason::Cancelled);
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.fetch_and_screen(listing, criteria))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into());
                tracing::warn!(symbol = %listing.code, %message, "symbol task panicked");
                Outcome::Skipped(SkipReason::ComputationError)
            }
        }
    }

    fn fetch_and_screen(&self, listing: &Listing, criteria: &ScreeningCriteria) -> Outcome {
        if !self.fetcher.is_available() {
            tracing::debug!(symbol = %listing.code, fetcher = self.fetcher.name(), "skipped: source unavailable");
            return Outcome::Skipped(SkipReason::DataUnavailable);
        }

        let series = match self.fetcher.fetch(listing, self.config.lookback_days) {
            Ok(series) => series,
            Err(e) => {
                tracing::debug!(symbol = %listing.code, error = %e, "skipped: data unavailable");
                return Outcome::Skipped(SkipReason::DataUnavailable);
            }
        };

        match screen_series(listing, &series, criteria) {
            Screening::Hit(hit) => Outcome::Hit(hit),
            Screening::NoMatch => Outcome::Skipped(SkipReason::NoMatch),
            Screening::Excluded(exclusion) => {
                tracing::debug!(symbol = %listing.code, reason = %exclusion, "skipped");
                Outcome::Skipped(SkipReason::from(&exclusion))
            }
        }
    }

    /// Scan `candidates` against `criteria`.
    ///
    /// Per-symbol failures are counted in the summary and never abort the scan.
    /// Returns `Err` only when the scan cannot start.
    pub fn scan(
        &self,
        candidates: &[Listing],
        criteria: &ScreeningCriteria,
        observer: &dyn ScanObserver,
    ) -> Result<ResultSet, ScanError> {
        criteria.validate()?;
        self.config.validate()?;

        let started = Instant::now();
        let total = candidates.len();
        let mut summary = ScanSummary::new(total);

        if candidates.is_empty() {
            tracing::warn!("no candidates to scan");
            observer.on_complete(&summary);
            return Ok(ResultSet::empty(summary));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("coilscan-worker-{i}"))
            .build()
            .map_err(|e| ScanError::Pool(e.to_string()))?;

        tracing::info!(
            candidates = total,
            workers = self.config.workers,
            fetcher = self.fetcher.name(),
            "scan started"
        );

        let progress_every = self.config.progress_every.max(1);
        let mut hits: Vec<ScanHit> = Vec::new();
        let (tx, rx) = mpsc::channel::<Outcome>();

        std::thread::scope(|s| {
            let pool = &pool;
            s.spawn(move || {
                pool.install(|| {
                    candidates.par_iter().for_each_with(tx, |tx, listing| {
                        // The collector outlives every sender.
                        let _ = tx.send(self.evaluate(listing, criteria));
                    });
                });
            });

            for outcome in rx {
                match outcome {
                    Outcome::Hit(hit) => {
                        summary.record_hit();
                        hits.push(hit);
                    }
                    Outcome::Skipped(reason) => summary.record_skip(reason),
                }

                if summary.processed % progress_every == 0 || summary.processed == total {
                    observer.on_progress(&ScanProgress {
                        processed: summary.processed,
                        total,
                        hits: summary.hits,
                        elapsed: started.elapsed(),
                    });
                }
            }
        });

        summary.cancelled = summary.skipped_for(SkipReason::Cancelled) > 0;
        summary.elapsed = started.elapsed();

        tracing::info!(
            processed = summary.processed,
            hits = summary.hits,
            data_unavailable = summary.skipped_for(SkipReason::DataUnavailable),
            insufficient_history = summary.skipped_for(SkipReason::InsufficientHistory),
            liquidity_filtered = summary.skipped_for(SkipReason::LiquidityFiltered),
            computation_error = summary.skipped_for(SkipReason::ComputationError),
            cancelled = summary.cancelled,
            "{summary}"
        );

        observer.on_complete(&summary);
        Ok(ResultSet::new(hits, summary))
    }
}
