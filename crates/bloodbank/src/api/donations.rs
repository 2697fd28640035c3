use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use super::response::{blocking, body, success};
use crate::services::{CollectionService, DonationRequest, ServiceError};

pub(crate) fn router(service: Arc<CollectionService>) -> Router {
    Router::new()
        .route("/api/donations", post(finalize_donation))
        .with_state(service)
}

async fn finalize_donation(
    State(service): State<Arc<CollectionService>>,
    payload: Result<Json<DonationRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let request = body(payload)?;
    let finalized = blocking(service, move |collections| collections.finalize(request)).await?;
    Ok(success(
        StatusCode::CREATED,
        "Donation finalized and blood unit created",
        json!({
            "donation_id": finalized.donation.donation_id,
            "unit_id": finalized.unit.unit_id,
            "blood_type": finalized.unit.blood_type,
            "collection_date": finalized.unit.collection_date,
            "expiry_date": finalized.unit.expiry_date,
            "unit_status": finalized.unit.status,
            "donation": finalized.donation,
            "unit": finalized.unit,
        }),
    ))
}
