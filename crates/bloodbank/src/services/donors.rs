use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use tracing::info;

use super::staff::missing_row_as_not_found;
use super::{optional_text, parse_date, required_text, ServiceError};
use crate::domain::{BloodType, Donor, DonorHistoryEntry, DonorId, DonorReport, DonorSummary};
use crate::persistence::{blood_type_at, blood_type_params, Database, Statement};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonorRegistration {
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "dob")]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, alias = "blood_group", alias = "bloodGroup")]
    pub blood_type: Option<String>,
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Contact fields are the only part of a donor that may change after registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// How a last-name search compares against stored names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Case-sensitive equality.
    Exact,
    /// Case-insensitive containment; an empty needle lists everyone.
    Substring,
}

const DONOR_COLUMNS: &str = "SELECT donor_id, first_name, last_name, date_of_birth, gender, \
     blood_group, rh_factor, phone_number, email FROM donors";

#[derive(Clone)]
pub struct DonorRegistry {
    database: Arc<Database>,
}

impl DonorRegistry {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    pub fn register(&self, registration: DonorRegistration) -> Result<Donor, ServiceError> {
        let donor = Donor {
            donor_id: DonorId::generate(),
            first_name: required_text("first_name", registration.first_name.as_deref())?,
            last_name: required_text("last_name", registration.last_name.as_deref())?,
            date_of_birth: parse_date(
                "date_of_birth",
                &required_text("date_of_birth", registration.date_of_birth.as_deref())?,
            )?,
            gender: required_text("gender", registration.gender.as_deref())?,
            blood_type: BloodType::split(&required_text(
                "blood_type",
                registration.blood_type.as_deref(),
            )?)?,
            phone_number: optional_text(registration.phone_number.as_deref()),
            email: validated_email(registration.email.as_deref())?,
        };

        let (blood_group, rh_factor) = blood_type_params(&donor.blood_type);
        self.database.execute(&[Statement::new(
            "INSERT INTO donors (donor_id, first_name, last_name, date_of_birth, gender, \
             blood_group, rh_factor, phone_number, email) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(donor.donor_id.0.clone())
        .bind(donor.first_name.clone())
        .bind(donor.last_name.clone())
        .bind_date(donor.date_of_birth)
        .bind(donor.gender.clone())
        .bind(blood_group)
        .bind(rh_factor)
        .bind(donor.phone_number.clone())
        .bind(donor.email.clone())])?;

        info!(donor_id = %donor.donor_id, blood_type = %donor.blood_type, "donor registered");
        Ok(donor)
    }

    /// Donors matching `last_name`, ordered by surname then given name.
    ///
    /// No match is an empty list, never an error.
    pub fn search(
        &self,
        last_name: Option<&str>,
        mode: SearchMode,
    ) -> Result<Vec<DonorSummary>, ServiceError> {
        let (sql, needle) = match mode {
            SearchMode::Exact => (
                "SELECT donor_id, first_name, last_name, blood_group, rh_factor FROM donors \
                 WHERE last_name = ?1 ORDER BY last_name, first_name",
                required_text("last_name", last_name)?,
            ),
            SearchMode::Substring => (
                "SELECT donor_id, first_name, last_name, blood_group, rh_factor FROM donors \
                 WHERE last_name LIKE ?1 ESCAPE '\\' ORDER BY last_name, first_name",
                format!("%{}%", escape_like(last_name.unwrap_or_default().trim())),
            ),
        };

        let donors = self.database.read(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params![needle], |row| {
                let first_name: String = row.get(1)?;
                let last_name: String = row.get(2)?;
                Ok(DonorSummary {
                    donor_id: row.get(0)?,
                    name: format!("{first_name} {last_name}"),
                    blood_type: blood_type_at(row, 3, 4)?,
                })
            })?;
            rows.collect()
        })?;
        Ok(donors)
    }

    pub fn get(&self, donor_id: &DonorId) -> Result<Donor, ServiceError> {
        fetch(&self.database, donor_id)?.ok_or_else(|| ServiceError::not_found("donor", donor_id))
    }

    pub fn update_contact(
        &self,
        donor_id: &DonorId,
        update: ContactUpdate,
    ) -> Result<Donor, ServiceError> {
        let phone_number = optional_text(update.phone_number.as_deref());
        let email = validated_email(update.email.as_deref())?;
        if phone_number.is_none() && email.is_none() {
            return Err(ServiceError::validation(
                "phone_number or email is required",
            ));
        }

        self.database
            .execute(&[Statement::new(
                "UPDATE donors SET phone_number = COALESCE(?1, phone_number), \
                 email = COALESCE(?2, email) WHERE donor_id = ?3",
            )
            .bind(phone_number)
            .bind(email)
            .bind(donor_id.0.clone())
            .expect_rows(1)])
            .map_err(|err| missing_row_as_not_found(err, "donor", donor_id))?;

        info!(%donor_id, "donor contact updated");
        self.get(donor_id)
    }

    /// Donor profile with every screening and whatever donation, unit, and issue followed it.
    pub fn report(&self, donor_id: &DonorId) -> Result<DonorReport, ServiceError> {
        let donor = self.get(donor_id)?;

        let history = self.database.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sc.screening_id, sc.screening_date, sc.is_eligible, sc.notes, \
                        screener.first_name || ' ' || screener.last_name, \
                        d.donation_id, d.donation_date, \
                        phleb.first_name || ' ' || phleb.last_name, \
                        bu.unit_id, bu.status, bu.expiry_date, o.name \
                 FROM screenings sc \
                 LEFT JOIN donations d ON sc.screening_id = d.screening_id \
                 LEFT JOIN blood_units bu ON d.donation_id = bu.donation_id \
                 LEFT JOIN organization o ON bu.issued_to_org_id = o.org_id \
                 LEFT JOIN staff screener ON sc.staff_id = screener.staff_id \
                 LEFT JOIN staff phleb ON d.phlebotomist_staff_id = phleb.staff_id \
                 WHERE sc.donor_id = ?1 \
                 ORDER BY sc.screening_date DESC, sc.rowid DESC",
            )?;
            let rows = stmt.query_map(params![donor_id.0], |row| {
                Ok(DonorHistoryEntry {
                    screening_id: row.get(0)?,
                    screened_at: row.get(1)?,
                    is_eligible: row.get(2)?,
                    notes: row.get(3)?,
                    screener: row.get(4)?,
                    donation_id: row.get(5)?,
                    donated_at: row.get(6)?,
                    phlebotomist: row.get(7)?,
                    unit_id: row.get(8)?,
                    unit_status: row.get(9)?,
                    expiry_date: row.get(10)?,
                    issued_to_org: row.get(11)?,
                })
            })?;
            rows.collect()
        })?;

        Ok(DonorReport { donor, history })
    }
}

pub(crate) fn fetch(database: &Database, donor_id: &DonorId) -> Result<Option<Donor>, ServiceError> {
    let sql = format!("{DONOR_COLUMNS} WHERE donor_id = ?1");
    let donor = database.read(|conn| {
        conn.query_row(&sql, params![donor_id.0], |row| {
            Ok(Donor {
                donor_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                date_of_birth: row.get(3)?,
                gender: row.get(4)?,
                blood_type: blood_type_at(row, 5, 6)?,
                phone_number: row.get(7)?,
                email: row.get(8)?,
            })
        })
        .optional()
    })?;
    Ok(donor)
}

pub(crate) fn ensure_exists(database: &Database, donor_id: &DonorId) -> Result<(), ServiceError> {
    let found = database.read(|conn| {
        conn.query_row(
            "SELECT 1 FROM donors WHERE donor_id = ?1",
            params![donor_id.0],
            |_| Ok(()),
        )
        .optional()
    })?;
    found.ok_or_else(|| ServiceError::not_found("donor", donor_id))
}

fn validated_email(raw: Option<&str>) -> Result<Option<String>, ServiceError> {
    match optional_text(raw) {
        Some(email) if !email.contains('@') => Err(ServiceError::validation(format!(
            "email '{email}' is not a valid address"
        ))),
        other => Ok(other),
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("O'Neil"), "O'Neil");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
