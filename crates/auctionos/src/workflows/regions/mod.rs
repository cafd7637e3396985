//! County region resolution for the property map: aggregate listings per county, match
//! them to boundary polygons by name, and shade the result.

mod aggregate;
pub mod boundaries;
pub mod choropleth;
mod domain;
mod normalizer;
mod resolver;

pub use aggregate::{aggregate_regions, read_aggregates_csv};
pub use boundaries::{
    parse_boundaries, source_for, BoundaryCatalog, BoundaryError, BoundarySource, CatalogError,
    FileBoundarySource, HttpBoundarySource,
};
pub use choropleth::{
    shade_regions, tooltip_label, FillTreatment, QuantileScale, RegionView, DEFAULT_BUCKETS,
};
pub use domain::{BoundaryFeature, MatchConfidence, RegionAggregate, ResolvedRegion, ScopeHint};
pub use resolver::{resolve, ResolutionSummary};
