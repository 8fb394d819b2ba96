//! Listing: a registry row describing one tradable instrument.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange board the instrument trades on.
///
/// The board decides the ticker suffix the data provider expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Board {
    /// Taiwan Stock Exchange main board (上市).
    Twse,
    /// Taipei Exchange OTC board (上櫃).
    Tpex,
    /// Emerging or any other board. Not part of the scan universe.
    Other,
}

impl Board {
    pub fn ticker_suffix(self) -> Option<&'static str> {
        match self {
            Board::Twse => Some(".TW"),
            Board::Tpex => Some(".TWO"),
            Board::Other => None,
        }
    }

    pub fn is_primary(self) -> bool {
        matches!(self, Board::Twse | Board::Tpex)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Board::Twse => write!(f, "TWSE"),
            Board::Tpex => write!(f, "TPEx"),
            Board::Other => write!(f, "other"),
        }
    }
}

/// Instrument classification from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Equity,
    Etf,
    Warrant,
    BeneficiaryCertificate,
    Other,
}

/// One instrument as listed in the symbol registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Listing {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub board: Board,
    pub category: Category,
}

impl Listing {
    pub fn new(code: impl Into<String>, name: impl Into<String>, board: Board, category: Category) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            board,
            category,
        }
    }

    /// Shorthand for an ordinary equity listing.
    pub fn equity(code: impl Into<String>, name: impl Into<String>, board: Board) -> Self {
        Self::new(code, name, board, Category::Equity)
    }

    /// Provider ticker, e.g. `2330.TW` or `6488.TWO`.
    pub fn ticker(&self) -> String {
        match self.board.ticker_suffix() {
            Some(suffix) => format!("{}{suffix}", self.code),
            None => self.code.clone(),
        }
    }

    /// True for a 4-digit ordinary share on one of the two primary boards.
    pub fn is_scannable_equity(&self) -> bool {
        self.code.len() == 4
            && self.code.bytes().all(|b| b.is_ascii_digit())
            && self.board.is_primary()
            && self.category == Category::Equity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_uses_board_suffix() {
        assert_eq!(Listing::equity("2330", "台積電", Board::Twse).ticker(), "2330.TW");
        assert_eq!(Listing::equity("6488", "環球晶", Board::Tpex).ticker(), "6488.TWO");
        assert_eq!(Listing::equity("7777", "", Board::Other).ticker(), "7777");
    }

    #[test]
    fn scannable_requires_four_digit_primary_equity() {
        assert!(Listing::equity("2330", "台積電", Board::Twse).is_scannable_equity());
        assert!(!Listing::equity("00878", "", Board::Twse).is_scannable_equity());
        assert!(!Listing::equity("2330", "", Board::Other).is_scannable_equity());
        assert!(!Listing::new("0050", "", Board::Twse, Category::Etf).is_scannable_equity());
        assert!(!Listing::new("03056P", "", Board::Twse, Category::Warrant).is_scannable_equity());
        assert!(!Listing::new("01001T", "", Board::Twse, Category::BeneficiaryCertificate)
            .is_scannable_equity());
        assert!(!Listing::equity("23A0", "", Board::Twse).is_scannable_equity());
    }

    #[test]
    fn category_serde_names() {
        let json = serde_json::to_string(&Category::BeneficiaryCertificate).unwrap();
        assert_eq!(json, "\"beneficiary_certificate\"");
        let board: Board = serde_json::from_str("\"tpex\"").unwrap();
        assert_eq!(board, Board::Tpex);
    }
}
