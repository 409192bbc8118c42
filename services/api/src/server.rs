use crate::cli::ServeArgs;
use crate::infra::{load_roster, AppState, PlacementServices};
use crate::routes::with_placement_routes;
use axum::extract::DefaultBodyLimit;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use internship_hub::config::AppConfig;
use internship_hub::error::AppError;
use internship_hub::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let roster = load_roster(config.directory.roster_csv.as_deref())?;
    let services = PlacementServices::in_memory(roster);

    let app = with_placement_routes(&services)
        .layer(DefaultBodyLimit::max(config.uploads.max_bytes))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_upload_bytes = config.uploads.max_bytes,
        "internship placement service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
