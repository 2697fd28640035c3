//! Domain services: thin orchestration over the persistence gateway.
//!
//! Each service validates its input before touching the database, maps domain inputs onto
//! parameterized statements, and reports failures as [`ServiceError`].

pub mod collection;
pub mod donors;
pub mod error;
pub mod inventory;
pub mod organizations;
pub mod requests;
pub mod screening;
pub mod staff;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::persistence::Database;

pub use collection::{CollectionService, DonationRequest, FinalizedDonation};
pub use donors::{ContactUpdate, DonorRegistration, DonorRegistry, SearchMode};
pub use error::ServiceError;
pub use inventory::{InventoryService, StatusUpdate};
pub use organizations::{NewOrganization, OrganizationService};
pub use requests::{BloodRequestService, NewBloodRequest, RequestStatusChange};
pub use screening::{ScreeningService, ScreeningSubmission};
pub use staff::{NewRole, NewStaff, NewTask, RoleChange, StaffService, TaskAssignment};

/// Every domain service wired to one database handle.
#[derive(Clone)]
pub struct BloodBank {
    pub donors: DonorRegistry,
    pub screenings: ScreeningService,
    pub collections: CollectionService,
    pub inventory: InventoryService,
    pub staff: StaffService,
    pub organizations: OrganizationService,
    pub requests: BloodRequestService,
}

impl BloodBank {
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            donors: DonorRegistry::new(database.clone()),
            screenings: ScreeningService::new(database.clone()),
            collections: CollectionService::new(database.clone()),
            inventory: InventoryService::new(database.clone()),
            staff: StaffService::new(database.clone()),
            organizations: OrganizationService::new(database.clone()),
            requests: BloodRequestService::new(database),
        }
    }
}

pub(crate) fn required_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<String, ServiceError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ServiceError::validation(format!("{field} is required")))
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn required_id(field: &'static str, value: Option<i64>) -> Result<i64, ServiceError> {
    match value {
        Some(id) if id > 0 => Ok(id),
        Some(id) => Err(ServiceError::validation(format!(
            "{field} must be a positive identifier (got {id})"
        ))),
        None => Err(ServiceError::validation(format!("{field} is required"))),
    }
}

pub(crate) fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| {
        ServiceError::validation(format!(
            "{field} must be formatted as YYYY-MM-DD (got '{raw}': {err})"
        ))
    })
}
