//! Symbol universe: the scannable equities taken from a symbol registry.
//!
//! Registries are stored as TOML files of `[[listings]]` tables. The universe
//! keeps only 4-digit ordinary shares on the TWSE and TPEx boards; ETFs,
//! warrants and beneficiary certificates are dropped. An unreachable registry
//! yields an empty universe, never an error.

use crate::domain::{Board, Listing};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("read registry file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse registry TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// Source of instrument listings.
pub trait SymbolRegistry: Send + Sync {
    fn list_symbols(&self) -> Result<Vec<Listing>, RegistryError>;
}

/// In-memory registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticRegistry {
    pub listings: Vec<Listing>,
}

impl StaticRegistry {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    pub fn from_toml(content: &str) -> Result<Self, RegistryError> {
        Ok(toml::from_str(content)?)
    }
}

impl SymbolRegistry for StaticRegistry {
    fn list_symbols(&self) -> Result<Vec<Listing>, RegistryError> {
        Ok(self.listings.clone())
    }
}

/// Registry read from a TOML file on every lookup, so edits to the file are
/// picked up by the next scan.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolRegistry for FileRegistry {
    fn list_symbols(&self) -> Result<Vec<Listing>, RegistryError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(StaticRegistry::from_toml(&content)?.listings)
    }
}

/// The scannable equity universe, keyed by code.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    listings: BTreeMap<String, Listing>,
}

impl Universe {
    /// Build from raw registry rows, keeping scannable equities only.
    /// Duplicate codes keep the first row.
    pub fn from_listings(rows: impl IntoIterator<Item = Listing>) -> Self {
        let mut listings = BTreeMap::new();
        for listing in rows.into_iter().filter(Listing::is_scannable_equity) {
            listings.entry(listing.code.clone()).or_insert(listing);
        }
        Self { listings }
    }

    /// Load from a registry. A failing registry produces an empty universe.
    pub fn load(registry: &dyn SymbolRegistry) -> Self {
        match registry.list_symbols() {
            Ok(rows) => {
                let total = rows.len();
                let universe = Self::from_listings(rows);
                tracing::debug!(
                    registry_rows = total,
                    scannable = universe.len(),
                    "loaded symbol universe"
                );
                universe
            }
            Err(e) => {
                tracing::warn!(error = %e, "symbol registry unavailable, universe is empty");
                Self::default()
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&Listing> {
        self.listings.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.listings.contains_key(code)
    }

    /// All listings in code order.
    pub fn listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values()
    }

    pub fn on_board(&self, board: Board) -> impl Iterator<Item = &Listing> {
        self.listings.values().filter(move |l| l.board == board)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Listings whose code appears in `codes`, in code order.
    pub fn restrict_to<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> Vec<Listing> {
        let mut picked: Vec<Listing> = codes
            .into_iter()
            .filter_map(|c| self.listings.get(c).cloned())
            .collect();
        picked.sort_by(|a, b| a.code.cmp(&b.code));
        picked.dedup_by(|a, b| a.code == b.code);
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;

    const REGISTRY: &str = r#"
[[listings]]
code = "2330"
name = "台積電"
board = "twse"
category = "equity"

[[listings]]
code = "6488"
name = "環球晶"
board = "tpex"
category = "equity"

[[listings]]
code = "0050"
name = "元大台灣50"
board = "twse"
category = "etf"

[[listings]]
code = "03056P"
name = "台積電購01"
board = "twse"
category = "warrant"

[[listings]]
code = "01001T"
name = "土銀富邦R1"
board = "twse"
category = "beneficiary_certificate"

[[listings]]
code = "7795"
name = "長廣"
board = "other"
category = "equity"
"#;

    struct BrokenRegistry;

    impl SymbolRegistry for BrokenRegistry {
        fn list_symbols(&self) -> Result<Vec<Listing>, RegistryError> {
            Err(RegistryError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn keeps_only_primary_board_equities() {
        let registry = StaticRegistry::from_toml(REGISTRY).unwrap();
        assert_eq!(registry.listings.len(), 6);
        let u = Universe::load(&registry);
        let codes: Vec<&str> = u.listings().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["2330", "6488"]);
        assert_eq!(u.get("6488").unwrap().board, Board::Tpex);
        assert_eq!(u.on_board(Board::Twse).count(), 1);
    }

    #[test]
    fn unavailable_registry_gives_empty_universe() {
        let u = Universe::load(&BrokenRegistry);
        assert!(u.is_empty());
    }

    #[test]
    fn missing_file_gives_empty_universe() {
        let u = Universe::load(&FileRegistry::new("/nonexistent/registry.toml"));
        assert!(u.is_empty());
    }

    #[test]
    fn file_registry_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        std::fs::write(&path, REGISTRY).unwrap();
        let u = Universe::load(&FileRegistry::new(&path));
        assert_eq!(u.len(), 2);
    }

    #[test]
    fn restrict_to_intersects_and_dedups() {
        let u = Universe::from_listings(vec![
            Listing::equity("2330", "台積電", Board::Twse),
            Listing::equity("2317", "鴻海", Board::Twse),
            Listing::new("0050", "", Board::Twse, Category::Etf),
        ]);
        let picked = u.restrict_to(["2330", "0050", "9999", "2330"]);
        let codes: Vec<&str> = picked.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["2330"]);
    }
}
