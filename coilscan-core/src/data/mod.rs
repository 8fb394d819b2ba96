//! Market data: symbol registries, series fetchers, retry and circuit breaking

pub mod circuit_breaker;
pub mod provider;
pub mod retry;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use provider::{DataError, SeriesFetcher};
pub use retry::{Backoff, RetryPolicy};
pub use synthetic::SyntheticFetcher;
pub use universe::{FileRegistry, RegistryError, StaticRegistry, SymbolRegistry, Universe};
pub use yahoo::YahooFetcher;
