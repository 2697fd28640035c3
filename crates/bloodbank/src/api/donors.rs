use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::response::{blocking, body, nothing_found, path_params, query_params, success};
use crate::domain::DonorId;
use crate::services::{ContactUpdate, DonorRegistration, DonorRegistry, SearchMode, ServiceError};

type Registry = State<Arc<DonorRegistry>>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default, alias = "lastName")]
    last_name: Option<String>,
}

pub(crate) fn router(registry: Arc<DonorRegistry>) -> Router {
    Router::new()
        .route("/api/donors", post(register_donor))
        .route("/api/donors/search", get(search_donors))
        .route("/api/donor/search", post(find_donors_by_last_name))
        .route("/api/donors/:donor_id", get(donor_details))
        .route("/api/donors/:donor_id/contact", put(update_contact))
        .route("/api/donors/:donor_id/report", get(donor_report))
        .with_state(registry)
}

async fn register_donor(
    State(registry): Registry,
    payload: Result<Json<DonorRegistration>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let registration = body(payload)?;
    let donor = blocking(registry, move |registry| registry.register(registration)).await?;
    Ok(success(
        StatusCode::CREATED,
        "Donor registered successfully",
        json!({ "donor_id": donor.donor_id, "donor": donor }),
    ))
}

/// Substring match on last name; no name lists every donor.
async fn search_donors(
    State(registry): Registry,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let query = query_params(query)?;
    let donors = blocking(registry, move |registry| {
        registry.search(query.last_name.as_deref(), SearchMode::Substring)
    })
    .await?;
    Ok(search_results(donors))
}

/// Case-sensitive exact match on last name.
async fn find_donors_by_last_name(
    State(registry): Registry,
    payload: Result<Json<SearchQuery>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let query = body(payload)?;
    let donors = blocking(registry, move |registry| {
        registry.search(query.last_name.as_deref(), SearchMode::Exact)
    })
    .await?;
    Ok(search_results(donors))
}

fn search_results(donors: Vec<crate::domain::DonorSummary>) -> Response {
    if donors.is_empty() {
        return nothing_found("No donors matched the search", json!({ "donors": donors }));
    }
    let message = format!("Found {} donor(s)", donors.len());
    success(StatusCode::OK, &message, json!({ "donors": donors }))
}

async fn donor_details(
    State(registry): Registry,
    donor_id: Result<Path<String>, PathRejection>,
) -> Result<Response, ServiceError> {
    let donor_id = DonorId(path_params(donor_id)?);
    let donor = blocking(registry, move |registry| registry.get(&donor_id)).await?;
    Ok(success(StatusCode::OK, "Donor retrieved", json!({ "donor": donor })))
}

async fn update_contact(
    State(registry): Registry,
    donor_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<ContactUpdate>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let donor_id = DonorId(path_params(donor_id)?);
    let update = body(payload)?;
    let donor =
        blocking(registry, move |registry| registry.update_contact(&donor_id, update)).await?;
    Ok(success(
        StatusCode::OK,
        "Donor contact details updated",
        json!({ "donor": donor }),
    ))
}

async fn donor_report(
    State(registry): Registry,
    donor_id: Result<Path<String>, PathRejection>,
) -> Result<Response, ServiceError> {
    let donor_id = DonorId(path_params(donor_id)?);
    let report = blocking(registry, move |registry| registry.report(&donor_id)).await?;
    Ok(success(StatusCode::OK, "Donor report generated", json!({ "report": report })))
}
