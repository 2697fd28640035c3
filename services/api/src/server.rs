use crate::cli::ServeArgs;
use crate::infra::{prepare_database, AppState};
use crate::routes::with_bloodbank_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bloodbank::config::AppConfig;
use bloodbank::error::AppError;
use bloodbank::services::BloodBank;
use bloodbank::telemetry;
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
    args.database.apply(&mut config);

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let database = prepare_database(&config)?;
    let bank = BloodBank::new(Arc::new(database));

    let app = with_bloodbank_routes(&bank)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.database.path.display(),
        "blood bank service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
