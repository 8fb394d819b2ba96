//! Scan progress reporting.
//!
//! The scanner's collector owns the counters; observers only ever see a copy.
//! Observers are called on the thread that invoked `Scanner::scan`, never from
//! a pool worker, so they need not be `Sync`.

use std::time::Duration;

use crate::result_set::{ScanSummary, SkipReason};

/// Snapshot of a running scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub processed: usize,
    pub total: usize,
    pub hits: usize,
    pub elapsed: Duration,
}

impl ScanProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }

    pub fn is_finished(&self) -> bool {
        self.processed >= self.total
    }
}

/// Receives progress while a scan runs.
pub trait ScanObserver {
    /// Called every `progress_every` completed symbols and on the last one.
    fn on_progress(&self, progress: &ScanProgress);

    /// Called once after the last symbol is collected.
    fn on_complete(&self, _summary: &ScanSummary) {}
}

/// Discards every update.
pub struct NullObserver;

impl ScanObserver for NullObserver {
    fn on_progress(&self, _progress: &ScanProgress) {}
}

/// Reports progress through `tracing`.
pub struct LogObserver;

impl ScanObserver for LogObserver {
    fn on_progress(&self, p: &ScanProgress) {
        tracing::info!(
            processed = p.processed,
            total = p.total,
            hits = p.hits,
            elapsed_secs = p.elapsed.as_secs_f64(),
            "scan progress {:.0}%",
            p.fraction() * 100.0
        );
    }

    fn on_complete(&self, summary: &ScanSummary) {
        tracing::info!("{summary}");
    }
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutObserver;

impl ScanObserver for StdoutObserver {
    fn on_progress(&self, p: &ScanProgress) {
        println!(
            "[{}/{}] {} matches so far ({:.1}s)",
            p.processed,
            p.total,
            p.hits,
            p.elapsed.as_secs_f64()
        );
    }

    fn on_complete(&self, summary: &ScanSummary) {
        println!("\n{summary}");
        for reason in SkipReason::ALL {
            let count = summary.skipped_for(reason);
            if count > 0 {
                println!("  {reason}: {count}");
            }
        }
    }
}
