//! HTTP surface: one router per domain service, merged into a single [`Router`].
//!
//! Handlers hand the synchronous services to tokio's blocking pool and render results through
//! the JSON envelope in [`response`]. Malformed bodies, path segments and query strings all
//! come back as `validation` errors in that envelope.

mod blood_requests;
mod donations;
mod donors;
mod inventory;
mod organizations;
mod response;
mod screenings;
mod staff;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::Router;

use crate::services::BloodBank;

pub use response::{ErrorBody, STATUS_ERROR, STATUS_NOT_FOUND, STATUS_SUCCESS};

/// Every `/api` route, each domain router carrying its own service as state.
pub fn router(bank: &BloodBank) -> Router {
    Router::new()
        .merge(donors::router(Arc::new(bank.donors.clone())))
        .merge(screenings::router(Arc::new(bank.screenings.clone())))
        .merge(donations::router(Arc::new(bank.collections.clone())))
        .merge(inventory::router(Arc::new(bank.inventory.clone())))
        .merge(staff::router(Arc::new(bank.staff.clone())))
        .merge(organizations::router(Arc::new(bank.organizations.clone())))
        .merge(blood_requests::router(Arc::new(bank.requests.clone())))
}
