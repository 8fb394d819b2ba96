//! CoilScan Core — the breakout-screening engine.
//!
//! This crate contains everything needed to decide whether one stock shows a
//! "coiled spring" setup:
//! - Domain types (price bars, validated series, registry listings)
//! - Symbol universe built from a registry (primary-board equities only)
//! - Series fetchers (Yahoo Finance, synthetic) with bounded retry and a circuit breaker
//! - Indicators (SMA, EMA, MACD)
//! - Indicator snapshot, screening criteria and the breakout classifier
//! - Report tags used to narrow the candidate list

pub mod data;
pub mod domain;
pub mod indicators;
pub mod screening;
pub mod tags;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed to scanner worker threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::Series>();
        require_sync::<domain::Series>();
        require_send::<domain::Listing>();
        require_sync::<domain::Listing>();

        require_send::<screening::ScreeningCriteria>();
        require_sync::<screening::ScreeningCriteria>();
        require_send::<screening::IndicatorSnapshot>();
        require_sync::<screening::IndicatorSnapshot>();
        require_send::<screening::ScanHit>();
        require_sync::<screening::ScanHit>();
        require_send::<screening::Screening>();
        require_sync::<screening::Screening>();

        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<data::YahooFetcher>();
        require_sync::<data::YahooFetcher>();
        require_send::<data::SyntheticFetcher>();
        require_sync::<data::SyntheticFetcher>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
    }

    /// Architecture contract: the classifier sees only a snapshot and criteria.
    ///
    /// No fetcher, no registry, no shared scan state; if this signature changes
    /// the classifier stops being a pure function and this stops compiling.
    #[test]
    fn classifier_takes_no_scan_state() {
        fn _check(
            listing: &domain::Listing,
            snapshot: &screening::IndicatorSnapshot,
            criteria: &screening::ScreeningCriteria,
        ) -> Option<screening::ScanHit> {
            screening::classify(listing, snapshot, criteria)
        }
    }
}
