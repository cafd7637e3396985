use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use auctionos::config::AppConfig;
use auctionos::error::AppError;
use auctionos::telemetry;
use auctionos::workflows::regions::BoundaryCatalog;
use axum_prometheus::PrometheusMetricLayer;
use tracing::{info, warn};

use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::router;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let boundaries = Arc::new(BoundaryCatalog::from_location(
        &config.map.boundary_source,
        config.api.request_timeout,
    )?);
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        boundaries: boundaries.clone(),
    };

    let app = router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Warm the boundary cache; readiness waits for it.
    tokio::spawn(async move {
        match boundaries.features().await {
            Ok(features) => info!(features = features.len(), "boundary dataset cached"),
            Err(err) => warn!(
                error = %err,
                location = %boundaries.location(),
                "boundary dataset unavailable; resolve requests will retry"
            ),
        }
        readiness_flag.store(true, Ordering::Release);
    });

    info!(
        ?config.environment,
        %addr,
        api = %config.api.base_url,
        "auctionos admin service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
