use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{MatchConfidence, RegionAggregate, ResolvedRegion};

pub const DEFAULT_BUCKETS: usize = 5;

/// Quantile color scale over matched counts, following d3's `scaleQuantile`: thresholds are
/// the R-7 quantiles of the sorted domain at `i / buckets`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileScale {
    thresholds: Vec<f64>,
    buckets: usize,
}

impl QuantileScale {
    /// `None` when there are no values or no buckets.
    pub fn new<I>(values: I, buckets: usize) -> Option<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut domain: Vec<f64> = values.into_iter().map(|value| value as f64).collect();
        if domain.is_empty() || buckets == 0 {
            return None;
        }
        domain.sort_by(f64::total_cmp);

        let thresholds = (1..buckets)
            .map(|i| quantile(&domain, i as f64 / buckets as f64))
            .collect();
        Some(Self {
            thresholds,
            buckets,
        })
    }

    /// Scale over the counts of every matched region.
    pub fn from_regions<'a, I>(regions: I, buckets: usize) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ResolvedRegion>,
    {
        Self::new(
            regions
                .into_iter()
                .filter(|region| region.matched_aggregate.is_some())
                .map(ResolvedRegion::count),
            buckets,
        )
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Zero-based bucket index in `0..buckets`.
    pub fn bucket(&self, value: u64) -> usize {
        let value = value as f64;
        self.thresholds.partition_point(|threshold| *threshold <= value)
    }
}

fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lower = h.floor() as usize;
    let base = sorted[lower];
    match sorted.get(lower + 1) {
        Some(next) => base + (next - base) * (h - lower as f64),
        None => base,
    }
}

/// How a boundary should be painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillTreatment {
    NoData,
    Exact { bucket: usize },
    /// Drawn from a tie-broken match; renderers should mark it as uncertain.
    Ambiguous { bucket: usize },
}

impl FillTreatment {
    pub fn for_region(region: &ResolvedRegion, scale: Option<&QuantileScale>) -> Self {
        let bucket = match (&region.matched_aggregate, scale) {
            (Some(aggregate), Some(scale)) => scale.bucket(aggregate.count),
            _ => return FillTreatment::NoData,
        };
        match region.match_confidence {
            MatchConfidence::Exact => FillTreatment::Exact { bucket },
            MatchConfidence::Ambiguous => FillTreatment::Ambiguous { bucket },
            MatchConfidence::None => FillTreatment::NoData,
        }
    }
}

pub fn tooltip_label(region: &ResolvedRegion) -> String {
    format!("{}: {} properties", region.display_name, region.count())
}

/// A resolved region with its paint and hover text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionView {
    pub boundary_id: String,
    pub display_name: String,
    pub match_confidence: MatchConfidence,
    pub matched_aggregate: Option<RegionAggregate>,
    pub fill: FillTreatment,
    pub label: String,
}

/// Shade every region with one quantile scale built from the matched counts.
pub fn shade_regions(
    regions: &BTreeMap<String, ResolvedRegion>,
    buckets: usize,
) -> Vec<RegionView> {
    let scale = QuantileScale::from_regions(regions.values(), buckets);
    regions
        .values()
        .map(|region| RegionView {
            boundary_id: region.boundary_id.clone(),
            display_name: region.display_name.clone(),
            match_confidence: region.match_confidence,
            matched_aggregate: region.matched_aggregate.clone(),
            fill: FillTreatment::for_region(region, scale.as_ref()),
            label: tooltip_label(region),
        })
        .collect()
}
