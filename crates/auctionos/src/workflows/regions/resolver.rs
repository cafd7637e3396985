use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use super::domain::{BoundaryFeature, MatchConfidence, RegionAggregate, ResolvedRegion, ScopeHint};
use super::normalizer::{normalize_county, normalize_state};

/// Match every boundary to at most one aggregate by county name.
///
/// A name carried by exactly one aggregate is an `Exact` match. When several aggregates
/// share it the result is `Ambiguous` and the pick prefers states in `scope_hint`, then the
/// highest count, then the lexicographically first state. Boundaries are keyed by
/// `boundary_id`; if the dataset repeats an id the first feature wins.
///
/// Pure: repeated calls with equal inputs yield equal output.
pub fn resolve(
    aggregates: &[RegionAggregate],
    boundaries: &[BoundaryFeature],
    scope_hint: Option<&ScopeHint>,
) -> BTreeMap<String, ResolvedRegion> {
    let scope = scope_hint.filter(|hint| !hint.is_empty());
    let index = index_by_county(aggregates);
    let mut resolved = BTreeMap::new();

    for boundary in boundaries {
        if resolved.contains_key(&boundary.boundary_id) {
            debug!(boundary_id = %boundary.boundary_id, "skipping repeated boundary id");
            continue;
        }

        let candidates = index
            .get(&normalize_county(&boundary.display_name))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let (matched_aggregate, match_confidence) = match candidates {
            [] => (None, MatchConfidence::None),
            [only] => (Some((*only).clone()), MatchConfidence::Exact),
            many => (pick(many, scope).cloned(), MatchConfidence::Ambiguous),
        };

        resolved.insert(
            boundary.boundary_id.clone(),
            ResolvedRegion {
                boundary_id: boundary.boundary_id.clone(),
                display_name: boundary.display_name.clone(),
                matched_aggregate,
                match_confidence,
            },
        );
    }

    resolved
}

fn index_by_county(aggregates: &[RegionAggregate]) -> HashMap<String, Vec<&RegionAggregate>> {
    let mut index: HashMap<String, Vec<&RegionAggregate>> = HashMap::new();
    for aggregate in aggregates {
        index
            .entry(normalize_county(&aggregate.county))
            .or_default()
            .push(aggregate);
    }
    index
}

fn pick<'a>(
    candidates: &[&'a RegionAggregate],
    scope: Option<&ScopeHint>,
) -> Option<&'a RegionAggregate> {
    let in_scope = |aggregate: &RegionAggregate| {
        scope
            .map(|hint| hint.contains(&aggregate.state))
            .unwrap_or(false)
    };

    candidates.iter().copied().min_by(|left, right| {
        in_scope(right)
            .cmp(&in_scope(left))
            .then_with(|| right.count.cmp(&left.count))
            .then_with(|| normalize_state(&left.state).cmp(&normalize_state(&right.state)))
            .then_with(|| left.county.cmp(&right.county))
    })
}

/// Match counts across one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub exact: usize,
    pub ambiguous: usize,
    pub unmatched: usize,
}

impl ResolutionSummary {
    pub fn from_regions<'a, I>(regions: I) -> Self
    where
        I: IntoIterator<Item = &'a ResolvedRegion>,
    {
        regions
            .into_iter()
            .fold(Self::default(), |mut summary, region| {
                match region.match_confidence {
                    MatchConfidence::Exact => summary.exact += 1,
                    MatchConfidence::Ambiguous => summary.ambiguous += 1,
                    MatchConfidence::None => summary.unmatched += 1,
                }
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_groups_case_and_spacing_variants() {
        let aggregates = vec![
            RegionAggregate::new("FL", "St. Johns", 3),
            RegionAggregate::new("FL", "st.  johns ", 1),
        ];
        let index = index_by_county(&aggregates);
        assert_eq!(index.len(), 1);
        assert_eq!(index["st. johns"].len(), 2);
    }

    #[test]
    fn pick_breaks_full_ties_by_county_text() {
        let first = RegionAggregate::new("FL", "Lee", 2);
        let second = RegionAggregate::new("FL", "LEE", 2);
        let chosen = pick(&[&first, &second], None).expect("candidate chosen");
        assert_eq!(chosen.county, "LEE");
    }

    #[test]
    fn summary_counts_each_confidence() {
        let region = |id: &str, confidence| ResolvedRegion {
            boundary_id: id.to_string(),
            display_name: id.to_string(),
            matched_aggregate: None,
            match_confidence: confidence,
        };
        let regions = [
            region("1", MatchConfidence::Exact),
            region("2", MatchConfidence::Ambiguous),
            region("3", MatchConfidence::None),
            region("4", MatchConfidence::None),
        ];

        let summary = ResolutionSummary::from_regions(&regions);
        assert_eq!(
            summary,
            ResolutionSummary {
                exact: 1,
                ambiguous: 1,
                unmatched: 2
            }
        );
    }
}
