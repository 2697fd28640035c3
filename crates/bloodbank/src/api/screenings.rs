use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use super::response::{blocking, body, path_params, success};
use crate::domain::DonorId;
use crate::services::{ScreeningService, ScreeningSubmission, ServiceError};

pub(crate) fn router(service: Arc<ScreeningService>) -> Router {
    Router::new()
        .route("/api/screenings", post(submit_screening))
        .route("/api/donors/:donor_id/screenings", get(donor_screenings))
        .with_state(service)
}

async fn submit_screening(
    State(service): State<Arc<ScreeningService>>,
    payload: Result<Json<ScreeningSubmission>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let submission = body(payload)?;
    let screening = blocking(service, move |screenings| screenings.submit(submission)).await?;
    let message = if screening.is_eligible {
        "Screening recorded: donor is eligible"
    } else {
        "Screening recorded: donor is not eligible"
    };
    Ok(success(
        StatusCode::CREATED,
        message,
        json!({
            "screening_id": screening.screening_id,
            "is_eligible": screening.is_eligible,
            "notes": screening.notes,
            "screening": screening,
        }),
    ))
}

async fn donor_screenings(
    State(service): State<Arc<ScreeningService>>,
    donor_id: Result<Path<String>, PathRejection>,
) -> Result<Response, ServiceError> {
    let donor_id = DonorId(path_params(donor_id)?);
    let screenings =
        blocking(service, move |screenings| screenings.list_for_donor(&donor_id)).await?;
    Ok(success(
        StatusCode::OK,
        "Screenings retrieved",
        json!({ "screenings": screenings }),
    ))
}
