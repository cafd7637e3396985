use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use auctionos::workflows::regions::{
    resolve, shade_regions, BoundaryCatalog, BoundaryFeature, RegionAggregate, RegionView,
    ResolutionSummary, ScopeHint,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) boundaries: Arc<BoundaryCatalog>,
}

/// Shaded regions plus match totals, as printed by `regions --json` and served by the
/// resolve endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct RegionsReport {
    pub(crate) regions: Vec<RegionView>,
    pub(crate) summary: ResolutionSummary,
}

impl RegionsReport {
    pub(crate) fn build(
        aggregates: &[RegionAggregate],
        boundaries: &[BoundaryFeature],
        scope_hint: Option<&ScopeHint>,
        buckets: usize,
    ) -> Self {
        let resolved = resolve(aggregates, boundaries, scope_hint);
        Self {
            summary: ResolutionSummary::from_regions(resolved.values()),
            regions: shade_regions(&resolved, buckets),
        }
    }
}

/// Cancel `token` on the first Ctrl-C.
pub(crate) fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("interrupt received; stopping the wait");
                    token.cancel();
                }
            }
        }
    });
}
