use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json, Router};
use bloodbank::api;
use bloodbank::services::BloodBank;
use serde_json::json;

pub(crate) fn with_bloodbank_routes(bank: &BloodBank) -> Router {
    api::router(bank)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::prepare_database;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use bloodbank::config::{AppConfig, DatabaseConfig};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct ScratchDb(PathBuf);

    impl ScratchDb {
        fn new(name: &str) -> Self {
            Self(std::env::temp_dir().join(format!(
                "bloodbank-api-{}-{name}.db",
                std::process::id()
            )))
        }
    }

    impl Drop for ScratchDb {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    fn app(scratch: &ScratchDb, ready: bool) -> Router {
        let mut config = AppConfig::load().expect("defaults load");
        config.database = DatabaseConfig::new(&scratch.0);
        let database = prepare_database(&config).expect("schema migrates");
        let bank = BloodBank::new(Arc::new(database));
        with_bloodbank_routes(&bank).layer(Extension(state(ready)))
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let starting = readiness_endpoint(Extension(state(false)))
            .await
            .into_response();
        assert_eq!(starting.status(), StatusCode::SERVICE_UNAVAILABLE);

        let ready = readiness_endpoint(Extension(state(true)))
            .await
            .into_response();
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_are_exposed_as_prometheus_text() {
        let response = metrics_endpoint(Extension(state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn operational_and_domain_routes_share_one_router() {
        let scratch = ScratchDb::new("routes");
        let router = app(&scratch, true);

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let roles = router
            .oneshot(Request::get("/api/roles").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(roles.status(), StatusCode::OK);
        let bytes = to_bytes(roles.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["roles"].as_array().unwrap().len(), 4);
    }
}
