use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use tracing::info;

use super::{optional_text, required_text, ServiceError};
use crate::domain::Organization;
use crate::persistence::{Database, Statement};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrganization {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "orgType")]
    pub org_type: Option<String>,
    #[serde(default, alias = "contactPerson")]
    pub contact_person: Option<String>,
    #[serde(default, alias = "contactPhone")]
    pub contact_phone: Option<String>,
    #[serde(default, alias = "contactEmail")]
    pub contact_email: Option<String>,
}

const ORGANIZATION_COLUMNS: &str = "SELECT org_id, name, org_type, contact_person, contact_phone, \
     contact_email FROM organization";

/// Hospitals and clinics that receive units and file blood requests.
#[derive(Clone)]
pub struct OrganizationService {
    database: Arc<Database>,
}

impl OrganizationService {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    pub fn list(&self) -> Result<Vec<Organization>, ServiceError> {
        let sql = format!("{ORGANIZATION_COLUMNS} ORDER BY name");
        let organizations = self.database.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], organization_from_row)?;
            rows.collect()
        })?;
        Ok(organizations)
    }

    pub fn get(&self, org_id: i64) -> Result<Organization, ServiceError> {
        let sql = format!("{ORGANIZATION_COLUMNS} WHERE org_id = ?1");
        self.database
            .read(|conn| {
                conn.query_row(&sql, params![org_id], organization_from_row)
                    .optional()
            })?
            .ok_or_else(|| ServiceError::not_found("organization", org_id))
    }

    pub fn create(&self, input: NewOrganization) -> Result<Organization, ServiceError> {
        let name = required_text("name", input.name.as_deref())?;
        let org_type = required_text("org_type", input.org_type.as_deref())?;
        let contact_person = optional_text(input.contact_person.as_deref());
        let contact_phone = optional_text(input.contact_phone.as_deref());
        let contact_email = optional_text(input.contact_email.as_deref());

        let report = self.database.execute(&[Statement::new(
            "INSERT INTO organization (name, org_type, contact_person, contact_phone, \
             contact_email) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(name.clone())
        .bind(org_type.clone())
        .bind(contact_person.clone())
        .bind(contact_phone.clone())
        .bind(contact_email.clone())])?;

        info!(org_id = report.last_insert_rowid, %name, %org_type, "organization registered");
        Ok(Organization {
            org_id: report.last_insert_rowid,
            name,
            org_type,
            contact_person,
            contact_phone,
            contact_email,
        })
    }
}

pub(crate) fn ensure_exists(database: &Database, org_id: i64) -> Result<(), ServiceError> {
    let found = database.read(|conn| {
        conn.query_row(
            "SELECT 1 FROM organization WHERE org_id = ?1",
            params![org_id],
            |_| Ok(()),
        )
        .optional()
    })?;
    found.ok_or_else(|| ServiceError::not_found("organization", org_id))
}

fn organization_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        org_id: row.get(0)?,
        name: row.get(1)?,
        org_type: row.get(2)?,
        contact_person: row.get(3)?,
        contact_phone: row.get(4)?,
        contact_email: row.get(5)?,
    })
}
