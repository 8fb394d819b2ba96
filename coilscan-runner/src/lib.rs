//! CoilScan Runner — scan orchestration on top of `coilscan-core`.
//!
//! This crate provides:
//! - Candidate selection (universe, tagged symbols, or tagged-with-fallback)
//! - The concurrent scanner (bounded rayon pool, channel fan-in, cancellation)
//! - Progress observers
//! - Result sets and scan summaries
//! - TOML scan configuration with content fingerprints
//! - CSV and JSON result sinks

pub mod candidates;
pub mod config;
pub mod export;
pub mod progress;
pub mod result_set;
pub mod scanner;

pub use candidates::{select_candidates, CandidateMode};
pub use config::{ConfigError, FetchConfig, ScanConfig, ScannerSection};
pub use export::{
    export_hits_csv, export_json, import_json, render_table, CsvSink, ExportError, JsonSink,
    ResultSink, ScanReport,
};
pub use progress::{LogObserver, NullObserver, ScanObserver, ScanProgress, StdoutObserver};
pub use result_set::{ResultSet, ScanSummary, SkipReason, SortKey};
pub use scanner::{ScanError, Scanner, ScannerConfig};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn scanner_is_send_sync() {
        assert_send::<Scanner>();
        assert_sync::<Scanner>();
    }

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<ResultSet>();
        assert_sync::<ResultSet>();
        assert_send::<ScanSummary>();
        assert_sync::<ScanSummary>();
        assert_send::<ScanReport>();
        assert_sync::<ScanReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<ScanConfig>();
        assert_sync::<ScanConfig>();
        assert_send::<ScannerConfig>();
        assert_sync::<ScannerConfig>();
    }

    #[test]
    fn progress_is_send_sync() {
        assert_send::<ScanProgress>();
        assert_sync::<ScanProgress>();
    }
}
