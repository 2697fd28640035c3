use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use tracing::info;

use super::staff::missing_row_as_not_found;
use super::{optional_text, organizations, required_id, required_text, ServiceError};
use crate::domain::{BloodRequest, BloodType, RequestStatus};
use crate::persistence::{blood_type_at, blood_type_params, Database, Statement};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBloodRequest {
    #[serde(default, alias = "orgId")]
    pub org_id: Option<i64>,
    #[serde(default, alias = "patientName")]
    pub patient_name: Option<String>,
    #[serde(default, alias = "blood_group", alias = "bloodGroup")]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestStatusChange {
    #[serde(default)]
    pub status: Option<String>,
}

const REQUEST_COLUMNS: &str = "SELECT r.request_id, r.org_id, o.name, r.patient_name, \
     r.blood_group, r.rh_factor, r.quantity, r.status, r.request_date \
     FROM blood_requests r JOIN organization o ON r.org_id = o.org_id";

#[derive(Clone)]
pub struct BloodRequestService {
    database: Arc<Database>,
}

impl BloodRequestService {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Every request, newest first.
    pub fn list(&self) -> Result<Vec<BloodRequest>, ServiceError> {
        let sql = format!("{REQUEST_COLUMNS} ORDER BY r.request_date DESC, r.request_id DESC");
        let requests = self.database.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], request_from_row)?;
            rows.collect()
        })?;
        Ok(requests)
    }

    pub fn get(&self, request_id: i64) -> Result<BloodRequest, ServiceError> {
        let sql = format!("{REQUEST_COLUMNS} WHERE r.request_id = ?1");
        self.database
            .read(|conn| {
                conn.query_row(&sql, params![request_id], request_from_row)
                    .optional()
            })?
            .ok_or_else(|| ServiceError::not_found("blood request", request_id))
    }

    pub fn create(&self, input: NewBloodRequest) -> Result<BloodRequest, ServiceError> {
        self.create_at(input, Local::now().naive_local())
    }

    pub fn create_at(
        &self,
        input: NewBloodRequest,
        requested_at: NaiveDateTime,
    ) -> Result<BloodRequest, ServiceError> {
        let org_id = required_id("org_id", input.org_id)?;
        let blood_type = BloodType::split(&required_text(
            "blood_type",
            input.blood_type.as_deref(),
        )?)?;
        let quantity = match input.quantity {
            Some(quantity) if quantity > 0 => quantity,
            Some(quantity) => {
                return Err(ServiceError::validation(format!(
                    "quantity must be at least 1 (got {quantity})"
                )))
            }
            None => return Err(ServiceError::validation("quantity is required")),
        };
        let patient_name = optional_text(input.patient_name.as_deref());

        organizations::ensure_exists(&self.database, org_id)?;

        let (blood_group, rh_factor) = blood_type_params(&blood_type);
        let report = self.database.execute(&[Statement::new(
            "INSERT INTO blood_requests (org_id, patient_name, blood_group, rh_factor, quantity, \
             status, request_date) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(org_id)
        .bind(patient_name)
        .bind(blood_group)
        .bind(rh_factor)
        .bind(quantity)
        .bind(RequestStatus::Pending.label().to_string())
        .bind_timestamp(requested_at)])?;

        info!(
            request_id = report.last_insert_rowid,
            org_id,
            %blood_type,
            quantity,
            "blood request filed"
        );
        self.get(report.last_insert_rowid)
    }

    pub fn update_status(
        &self,
        request_id: i64,
        change: RequestStatusChange,
    ) -> Result<BloodRequest, ServiceError> {
        let status: RequestStatus = required_text("status", change.status.as_deref())?.parse()?;

        self.database
            .execute(&[Statement::new(
                "UPDATE blood_requests SET status = ?1 WHERE request_id = ?2",
            )
            .bind(status.label().to_string())
            .bind(request_id)
            .expect_rows(1)])
            .map_err(|err| missing_row_as_not_found(err, "blood request", request_id))?;

        info!(request_id, %status, "blood request status updated");
        self.get(request_id)
    }
}

fn request_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BloodRequest> {
    Ok(BloodRequest {
        request_id: row.get(0)?,
        org_id: row.get(1)?,
        org_name: row.get(2)?,
        patient_name: row.get(3)?,
        blood_type: blood_type_at(row, 4, 5)?,
        quantity: row.get(6)?,
        status: row.get(7)?,
        requested_at: row.get(8)?,
    })
}
