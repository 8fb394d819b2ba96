//! Candidate selection: which listings a scan visits.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use coilscan_core::data::Universe;
use coilscan_core::domain::Listing;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateMode {
    /// Every listing in the universe.
    #[default]
    Universe,
    /// Only tagged symbols that are also in the universe. No tags, no candidates.
    Tagged,
    /// Tagged symbols when there are any, otherwise the whole universe.
    TaggedOrUniverse,
}

impl fmt::Display for CandidateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CandidateMode::Universe => "universe",
            CandidateMode::Tagged => "tagged",
            CandidateMode::TaggedOrUniverse => "tagged_or_universe",
        };
        f.write_str(s)
    }
}

impl FromStr for CandidateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "universe" | "all" => Ok(CandidateMode::Universe),
            "tagged" => Ok(CandidateMode::Tagged),
            "tagged_or_universe" => Ok(CandidateMode::TaggedOrUniverse),
            other => Err(format!("unknown candidate mode: {other}")),
        }
    }
}

/// Resolve the candidate list for a scan, in code order.
///
/// Tagged codes outside the universe (delisted, non-equity) are dropped.
pub fn select_candidates(
    universe: &Universe,
    tagged: &BTreeSet<String>,
    mode: CandidateMode,
) -> Vec<Listing> {
    let candidates = match mode {
        CandidateMode::Universe => universe.listings().cloned().collect(),
        CandidateMode::Tagged => universe.restrict_to(tagged.iter().map(String::as_str)),
        CandidateMode::TaggedOrUniverse => {
            let restricted = universe.restrict_to(tagged.iter().map(String::as_str));
            if restricted.is_empty() {
                tracing::info!("no tagged symbols in the universe, scanning all of it");
                universe.listings().cloned().collect()
            } else {
                restricted
            }
        }
    };

    if mode != CandidateMode::Universe && !tagged.is_empty() {
        let dropped = tagged.iter().filter(|c| !universe.contains(c.as_str())).count();
        if dropped > 0 {
            tracing::debug!(dropped, "tagged symbols outside the universe ignored");
        }
    }

    candidates
}
