//! Domain types for CoilScan

pub mod bar;
pub mod listing;
pub mod series;

pub use bar::{PriceBar, SHARES_PER_LOT};
pub use listing::{Board, Category, Listing};
pub use series::{canonicalize, Series, SeriesError};
