use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use tracing::info;

use super::organizations;
use super::staff::missing_row_as_not_found;
use super::{optional_text, required_id, required_text, ServiceError};
use crate::domain::{BloodUnit, InventoryCount, UnitId, UnitStatus};
use crate::persistence::{blood_type_at, Database, Statement};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "orgId")]
    pub org_id: Option<i64>,
}

const UNIT_COLUMNS: &str = "SELECT unit_id, donation_id, blood_group, rh_factor, collection_date, \
     expiry_date, status, issued_to_org_id FROM blood_units";

#[derive(Clone)]
pub struct InventoryService {
    database: Arc<Database>,
}

impl InventoryService {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Units ordered by expiry, optionally narrowed to one status.
    pub fn list_units(&self, status: Option<&str>) -> Result<Vec<BloodUnit>, ServiceError> {
        let status = optional_text(status)
            .map(|raw| raw.parse::<UnitStatus>())
            .transpose()?;

        let units = self.database.read(|conn| match status {
            Some(status) => {
                let sql = format!(
                    "{UNIT_COLUMNS} WHERE status = ?1 ORDER BY expiry_date, unit_id"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![status.label()], unit_from_row)?;
                rows.collect()
            }
            None => {
                let sql = format!("{UNIT_COLUMNS} ORDER BY expiry_date, unit_id");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], unit_from_row)?;
                rows.collect()
            }
        })?;
        Ok(units)
    }

    pub fn get(&self, unit_id: &UnitId) -> Result<BloodUnit, ServiceError> {
        let sql = format!("{UNIT_COLUMNS} WHERE unit_id = ?1");
        self.database
            .read(|conn| {
                conn.query_row(&sql, params![unit_id.0], unit_from_row)
                    .optional()
            })?
            .ok_or_else(|| ServiceError::not_found("blood unit", unit_id))
    }

    /// Move a unit to a new status.
    ///
    /// `Issued` needs a receiving organization; any other status clears `issued_to_org_id`.
    pub fn update_status(
        &self,
        unit_id: &UnitId,
        update: StatusUpdate,
    ) -> Result<BloodUnit, ServiceError> {
        let status: UnitStatus = required_text("status", update.status.as_deref())?.parse()?;
        let org_id = match status {
            UnitStatus::Issued => {
                let org_id = required_id("org_id", update.org_id)?;
                organizations::ensure_exists(&self.database, org_id)?;
                Some(org_id)
            }
            _ => None,
        };

        self.database
            .execute(&[Statement::new(
                "UPDATE blood_units SET status = ?1, issued_to_org_id = ?2 WHERE unit_id = ?3",
            )
            .bind(status.label().to_string())
            .bind(org_id)
            .bind(unit_id.0.clone())
            .expect_rows(1)])
            .map_err(|err| missing_row_as_not_found(err, "blood unit", unit_id))?;

        info!(%unit_id, %status, ?org_id, "unit status updated");
        self.get(unit_id)
    }

    /// Unit counts grouped by blood type and status.
    pub fn summary(&self) -> Result<Vec<InventoryCount>, ServiceError> {
        let counts = self.database.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT blood_group, rh_factor, status, COUNT(*) FROM blood_units \
                 GROUP BY blood_group, rh_factor, status \
                 ORDER BY blood_group, rh_factor, status",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(InventoryCount {
                    blood_type: blood_type_at(row, 0, 1)?,
                    status: row.get(2)?,
                    count: row.get(3)?,
                })
            })?;
            rows.collect()
        })?;
        Ok(counts)
    }

    /// Mark shelf stock whose expiry date is before `today` as expired. Returns how many changed.
    pub fn expire_stale(&self, today: NaiveDate) -> Result<usize, ServiceError> {
        let report = self.database.execute(&[Statement::new(
            "UPDATE blood_units SET status = ?1, issued_to_org_id = NULL \
             WHERE status IN (?2, ?3) AND expiry_date < ?4",
        )
        .bind(UnitStatus::Expired.label().to_string())
        .bind(UnitStatus::Available.label().to_string())
        .bind(UnitStatus::Reserved.label().to_string())
        .bind_date(today)])?;

        let expired = report.rows_affected.first().copied().unwrap_or_default();
        if expired > 0 {
            info!(expired, %today, "stale units expired");
        }
        Ok(expired)
    }
}

fn unit_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BloodUnit> {
    Ok(BloodUnit {
        unit_id: row.get(0)?,
        donation_id: row.get(1)?,
        blood_type: blood_type_at(row, 2, 3)?,
        collection_date: row.get(4)?,
        expiry_date: row.get(5)?,
        status: row.get(6)?,
        issued_to_org_id: row.get(7)?,
    })
}
