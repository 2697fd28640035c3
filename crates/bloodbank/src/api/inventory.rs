use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::response::{blocking, body, failure, path_params, query_params, success};
use crate::domain::{InventoryCount, UnitId};
use crate::services::{parse_date, InventoryService, ServiceError, StatusUpdate};

type Inventory = State<Arc<InventoryService>>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UnitFilter {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExpiryQuery {
    /// Defaults to the local date.
    #[serde(default)]
    today: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ReportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    format: ReportFormat,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    blood_type: String,
    status: &'a str,
    count: i64,
}

pub(crate) fn router(service: Arc<InventoryService>) -> Router {
    Router::new()
        .route("/api/inventory", get(list_units))
        .route("/api/inventory/expire", post(expire_stale_units))
        .route("/api/inventory/:unit_id", put(update_unit_status))
        .route("/api/reports/inventory", get(inventory_report))
        .with_state(service)
}

async fn list_units(
    State(inventory): Inventory,
    filter: Result<Query<UnitFilter>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let filter = query_params(filter)?;
    let units =
        blocking(inventory, move |inventory| inventory.list_units(filter.status.as_deref())).await?;
    let message = format!("{} unit(s) in inventory", units.len());
    Ok(success(StatusCode::OK, &message, json!({ "units": units })))
}

async fn update_unit_status(
    State(inventory): Inventory,
    unit_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let unit_id = UnitId(path_params(unit_id)?);
    let update = body(payload)?;
    let unit =
        blocking(inventory, move |inventory| inventory.update_status(&unit_id, update)).await?;
    let message = format!("Unit status updated to {}", unit.status);
    Ok(success(StatusCode::OK, &message, json!({ "unit": unit })))
}

async fn expire_stale_units(
    State(inventory): Inventory,
    query: Result<Query<ExpiryQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let query = query_params(query)?;
    let today = match query.today.as_deref() {
        Some(raw) => parse_date("today", raw)?,
        None => Local::now().date_naive(),
    };
    let expired = blocking(inventory, move |inventory| inventory.expire_stale(today)).await?;
    let message = format!("{expired} unit(s) marked expired");
    Ok(success(
        StatusCode::OK,
        &message,
        json!({ "expired": expired, "as_of": today }),
    ))
}

async fn inventory_report(
    State(inventory): Inventory,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let query = query_params(query)?;
    let summary = blocking(inventory, |inventory| inventory.summary()).await?;

    if query.format == ReportFormat::Json {
        return Ok(success(
            StatusCode::OK,
            "Inventory summary generated",
            json!({ "summary": summary }),
        ));
    }

    match render_csv(&summary) {
        Ok(bytes) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            bytes,
        )
            .into_response()),
        Err(err) => {
            error!(error = %err, "inventory csv rendering failed");
            Ok(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "report",
                err.to_string(),
            ))
        }
    }
}

fn render_csv(summary: &[InventoryCount]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in summary {
        writer.serialize(CsvRow {
            blood_type: row.blood_type.to_string(),
            status: row.status.label(),
            count: row.count,
        })?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}
