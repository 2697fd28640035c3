use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use super::response::{blocking, body, path_params, success};
use crate::services::{NewOrganization, OrganizationService, ServiceError};

pub(crate) fn router(service: Arc<OrganizationService>) -> Router {
    Router::new()
        .route(
            "/api/organizations",
            get(list_organizations).post(create_organization),
        )
        .route("/api/organizations/:org_id", get(organization_details))
        .with_state(service)
}

async fn list_organizations(
    State(service): State<Arc<OrganizationService>>,
) -> Result<Response, ServiceError> {
    let organizations = blocking(service, |organizations| organizations.list()).await?;
    Ok(success(
        StatusCode::OK,
        "Organizations retrieved",
        json!({ "organizations": organizations }),
    ))
}

async fn create_organization(
    State(service): State<Arc<OrganizationService>>,
    payload: Result<Json<NewOrganization>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let registration = body(payload)?;
    let organization =
        blocking(service, move |organizations| organizations.create(registration)).await?;
    Ok(success(
        StatusCode::CREATED,
        "Organization registered",
        json!({ "org_id": organization.org_id, "organization": organization }),
    ))
}

async fn organization_details(
    State(service): State<Arc<OrganizationService>>,
    org_id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ServiceError> {
    let org_id = path_params(org_id)?;
    let organization = blocking(service, move |organizations| organizations.get(org_id)).await?;
    Ok(success(
        StatusCode::OK,
        "Organization retrieved",
        json!({ "organization": organization }),
    ))
}
