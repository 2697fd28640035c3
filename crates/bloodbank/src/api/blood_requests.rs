use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;

use super::response::{blocking, body, path_params, success};
use crate::services::{BloodRequestService, NewBloodRequest, RequestStatusChange, ServiceError};

type Requests = State<Arc<BloodRequestService>>;

pub(crate) fn router(service: Arc<BloodRequestService>) -> Router {
    Router::new()
        .route("/api/blood_requests", get(list_requests).post(file_request))
        .route("/api/blood_requests/:request_id", put(update_request_status))
        .with_state(service)
}

async fn list_requests(State(requests): Requests) -> Result<Response, ServiceError> {
    let listed = blocking(requests, |requests| requests.list()).await?;
    Ok(success(
        StatusCode::OK,
        "Blood requests retrieved",
        json!({ "requests": listed }),
    ))
}

async fn file_request(
    State(requests): Requests,
    payload: Result<Json<NewBloodRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let filed = body(payload)?;
    let request = blocking(requests, move |requests| requests.create(filed)).await?;
    Ok(success(
        StatusCode::CREATED,
        "Blood request filed",
        json!({ "request_id": request.request_id, "request": request }),
    ))
}

async fn update_request_status(
    State(requests): Requests,
    request_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RequestStatusChange>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let request_id = path_params(request_id)?;
    let change = body(payload)?;
    let request =
        blocking(requests, move |requests| requests.update_status(request_id, change)).await?;
    let message = format!("Blood request marked {}", request.status);
    Ok(success(StatusCode::OK, &message, json!({ "request": request })))
}
