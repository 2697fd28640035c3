use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use tracing::info;

use super::staff::resolve_performer;
use super::{donors, optional_text, required_text, ServiceError};
use crate::domain::{DonorId, Screening, ScreeningId};
use crate::eligibility::{self, RawVitals, Vitals};
use crate::persistence::{Database, Statement};

/// Screening form as submitted; everything is validated by [`ScreeningService::submit`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreeningSubmission {
    #[serde(default, alias = "donorId")]
    pub donor_id: Option<String>,
    #[serde(default, alias = "staffId")]
    pub staff_id: Option<i64>,
    #[serde(flatten)]
    pub vitals: RawVitals,
    #[serde(default, alias = "notes")]
    pub additional_notes: Option<String>,
}

const SCREENING_COLUMNS: &str = "SELECT screening_id, donor_id, staff_id, screening_date, \
     hemoglobin, blood_pressure_systolic, blood_pressure_diastolic, weight_kg, is_eligible, notes \
     FROM screenings";

/// Records screenings and answers eligibility lookups for collection.
#[derive(Clone)]
pub struct ScreeningService {
    database: Arc<Database>,
}

impl ScreeningService {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    pub fn submit(&self, submission: ScreeningSubmission) -> Result<Screening, ServiceError> {
        self.submit_at(submission, Local::now().naive_local())
    }

    /// Evaluate and persist a screening taken at `screened_at`.
    ///
    /// Input is fully parsed before the database is touched, so malformed vitals leave no trace.
    pub fn submit_at(
        &self,
        submission: ScreeningSubmission,
        screened_at: NaiveDateTime,
    ) -> Result<Screening, ServiceError> {
        let donor_id = DonorId(required_text("donor_id", submission.donor_id.as_deref())?);
        let vitals = submission.vitals.parse()?;
        let staff_notes = optional_text(submission.additional_notes.as_deref());

        donors::ensure_exists(&self.database, &donor_id)?;
        let staff_id = resolve_performer(&self.database, submission.staff_id)?;

        let verdict = eligibility::evaluate(&vitals);
        let screening = Screening {
            screening_id: ScreeningId::generate(),
            donor_id,
            staff_id,
            screened_at,
            vitals,
            is_eligible: verdict.is_eligible(),
            notes: verdict.notes(staff_notes.as_deref()),
        };

        self.database.execute(&[Statement::new(
            "INSERT INTO screenings (screening_id, donor_id, staff_id, screening_date, hemoglobin, \
             blood_pressure_systolic, blood_pressure_diastolic, weight_kg, is_eligible, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(screening.screening_id.0.clone())
        .bind(screening.donor_id.0.clone())
        .bind(screening.staff_id)
        .bind_timestamp(screening.screened_at)
        .bind(vitals.hemoglobin)
        .bind(vitals.bp_systolic)
        .bind(vitals.bp_diastolic)
        .bind(vitals.weight_kg)
        .bind(screening.is_eligible)
        .bind(screening.notes.clone())])?;

        info!(
            screening_id = %screening.screening_id,
            donor_id = %screening.donor_id,
            eligible = screening.is_eligible,
            "screening recorded"
        );
        Ok(screening)
    }

    /// All screenings for a donor, newest first.
    pub fn list_for_donor(&self, donor_id: &DonorId) -> Result<Vec<Screening>, ServiceError> {
        donors::ensure_exists(&self.database, donor_id)?;
        let sql = format!(
            "{SCREENING_COLUMNS} WHERE donor_id = ?1 ORDER BY screening_date DESC, rowid DESC"
        );
        let screenings = self.database.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![donor_id.0], screening_from_row)?;
            rows.collect()
        })?;
        Ok(screenings)
    }

    /// Most recent eligible screening for the donor, if any.
    pub fn latest_eligible(&self, donor_id: &DonorId) -> Result<Option<Screening>, ServiceError> {
        latest_eligible(&self.database, donor_id)
    }
}

pub(crate) fn latest_eligible(
    database: &Database,
    donor_id: &DonorId,
) -> Result<Option<Screening>, ServiceError> {
    let sql = format!(
        "{SCREENING_COLUMNS} WHERE donor_id = ?1 AND is_eligible = 1 \
         ORDER BY screening_date DESC, rowid DESC LIMIT 1"
    );
    let screening = database.read(|conn| {
        conn.query_row(&sql, params![donor_id.0], screening_from_row)
            .optional()
    })?;
    Ok(screening)
}

/// A specific screening, only if it belongs to `donor_id` and passed.
pub(crate) fn eligible_by_id(
    database: &Database,
    donor_id: &DonorId,
    screening_id: &ScreeningId,
) -> Result<Option<Screening>, ServiceError> {
    let sql = format!(
        "{SCREENING_COLUMNS} WHERE screening_id = ?1 AND donor_id = ?2 AND is_eligible = 1"
    );
    let screening = database.read(|conn| {
        conn.query_row(&sql, params![screening_id.0, donor_id.0], screening_from_row)
            .optional()
    })?;
    Ok(screening)
}

fn screening_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Screening> {
    Ok(Screening {
        screening_id: row.get(0)?,
        donor_id: row.get(1)?,
        staff_id: row.get(2)?,
        screened_at: row.get(3)?,
        vitals: Vitals {
            hemoglobin: row.get(4)?,
            bp_systolic: row.get(5)?,
            bp_diastolic: row.get(6)?,
            weight_kg: row.get(7)?,
        },
        is_eligible: row.get(8)?,
        notes: row.get(9)?,
    })
}
