use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalizer::normalize_state;

/// Property count for one `(state, county)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionAggregate {
    pub state: String,
    pub county: String,
    pub count: u64,
}

impl RegionAggregate {
    pub fn new(state: impl Into<String>, county: impl Into<String>, count: u64) -> Self {
        Self {
            state: state.into(),
            county: county.into(),
            count,
        }
    }
}

/// One polygon of the boundary dataset. `display_name` is not unique across states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryFeature {
    pub boundary_id: String,
    pub display_name: String,
}

impl BoundaryFeature {
    pub fn new(boundary_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            boundary_id: boundary_id.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// Exactly one aggregate carries the boundary's county name.
    Exact,
    /// Several states share the name; the match came from the tie-break.
    Ambiguous,
    None,
}

impl MatchConfidence {
    pub fn label(self) -> &'static str {
        match self {
            MatchConfidence::Exact => "exact",
            MatchConfidence::Ambiguous => "ambiguous",
            MatchConfidence::None => "none",
        }
    }
}

impl fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A boundary annotated with the aggregate chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRegion {
    pub boundary_id: String,
    pub display_name: String,
    pub matched_aggregate: Option<RegionAggregate>,
    pub match_confidence: MatchConfidence,
}

impl ResolvedRegion {
    /// Matched count, or zero when nothing matched.
    pub fn count(&self) -> u64 {
        self.matched_aggregate
            .as_ref()
            .map(|aggregate| aggregate.count)
            .unwrap_or(0)
    }
}

/// States the viewer is focused on; preferred when a county name is ambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeHint {
    states: BTreeSet<String>,
}

impl ScopeHint {
    pub fn new<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let states = states
            .into_iter()
            .map(|state| normalize_state(state.as_ref()))
            .filter(|state| !state.is_empty())
            .collect();
        Self { states }
    }

    pub fn contains(&self, state: &str) -> bool {
        self.states.contains(&normalize_state(state))
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for ScopeHint {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<String>> for ScopeHint {
    fn from(states: Vec<String>) -> Self {
        Self::new(states)
    }
}

impl From<ScopeHint> for Vec<String> {
    fn from(hint: ScopeHint) -> Self {
        hint.states.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_hint_normalizes_and_dedupes_codes() {
        let hint = ScopeHint::new([" oh", "OH", "", "ga "]);
        assert_eq!(hint.states().collect::<Vec<_>>(), vec!["GA", "OH"]);
        assert!(hint.contains("oh"));
        assert!(!hint.contains("FL"));
    }

    #[test]
    fn scope_hint_round_trips_as_a_list() {
        let hint: ScopeHint = serde_json::from_str(r#"["fl","ga"]"#).expect("hint parses");
        assert!(hint.contains("FL"));
        assert_eq!(
            serde_json::to_string(&hint).expect("hint serializes"),
            r#"["FL","GA"]"#
        );
    }

    #[test]
    fn unmatched_region_counts_zero() {
        let region = ResolvedRegion {
            boundary_id: "13001".to_string(),
            display_name: "Appling".to_string(),
            matched_aggregate: None,
            match_confidence: MatchConfidence::None,
        };
        assert_eq!(region.count(), 0);
    }
}
