use bloodbank::config::AppConfig;
use bloodbank::error::AppError;
use bloodbank::persistence::Database;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Open the configured store and bring its schema up to date.
pub(crate) fn prepare_database(config: &AppConfig) -> Result<Database, AppError> {
    let database = Database::new(config.database.clone());
    database.migrate()?;
    Ok(database)
}
