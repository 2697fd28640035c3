use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{Donor, DonorId, Screening};
use crate::eligibility::{RawVitals, Reading};
use crate::persistence::testing::TempDatabase;
use crate::services::{
    BloodBank, DonorRegistration, NewOrganization, NewStaff, ScreeningSubmission,
};

pub(super) struct Harness {
    pub(super) temp: TempDatabase,
    pub(super) bank: BloodBank,
}

impl Harness {
    pub(super) fn count(&self, table: &str) -> i64 {
        self.temp.count(table)
    }
}

/// Fresh schema with reference roles/tasks only; no staff on the roster.
pub(super) fn empty_harness() -> Harness {
    let temp = TempDatabase::new();
    let bank = BloodBank::new(Arc::new(temp.database.clone()));
    Harness { temp, bank }
}

/// Fresh schema with the default phlebotomist (PHL001) on staff.
pub(super) fn harness() -> (Harness, i64) {
    let harness = empty_harness();
    let staff_id = add_staff(&harness, "PHL001", "Phlebotomist");
    (harness, staff_id)
}

pub(super) fn add_staff(harness: &Harness, employee_number: &str, role_name: &str) -> i64 {
    let role_id = harness
        .bank
        .staff
        .list_roles()
        .expect("roles listed")
        .into_iter()
        .find(|role| role.role_name == role_name)
        .expect("seeded role")
        .role_id;

    harness
        .bank
        .staff
        .create_staff(NewStaff {
            first_name: Some("Lena".to_string()),
            last_name: Some(format!("Staff-{employee_number}")),
            employee_number: Some(employee_number.to_string()),
            role_id: Some(role_id),
        })
        .expect("staff created")
        .staff_id
}

pub(super) fn registration(first_name: &str, last_name: &str, blood_type: &str) -> DonorRegistration {
    DonorRegistration {
        first_name: Some(first_name.to_string()),
        last_name: Some(last_name.to_string()),
        date_of_birth: Some("1990-01-01".to_string()),
        gender: Some("F".to_string()),
        blood_type: Some(blood_type.to_string()),
        phone_number: Some("555-0100".to_string()),
        email: None,
    }
}

pub(super) fn register(harness: &Harness, last_name: &str, blood_type: &str) -> Donor {
    harness
        .bank
        .donors
        .register(registration("Ana", last_name, blood_type))
        .expect("donor registered")
}

pub(super) fn vitals(hemoglobin: f64, bp_systolic: i64, bp_diastolic: i64, weight_kg: f64) -> RawVitals {
    RawVitals {
        hemoglobin: Some(Reading::Text(hemoglobin.to_string())),
        bp_systolic: Some(Reading::Number(bp_systolic.into())),
        bp_diastolic: Some(Reading::Number(bp_diastolic.into())),
        weight_kg: Some(Reading::Text(weight_kg.to_string())),
    }
}

pub(super) fn submission(donor_id: &DonorId, vitals: RawVitals) -> ScreeningSubmission {
    ScreeningSubmission {
        donor_id: Some(donor_id.0.clone()),
        staff_id: None,
        vitals,
        additional_notes: None,
    }
}

pub(super) fn screen(
    harness: &Harness,
    donor_id: &DonorId,
    eligible: bool,
    screened_at: NaiveDateTime,
) -> Screening {
    let readings = if eligible {
        vitals(13.5, 120, 80, 65.0)
    } else {
        vitals(11.0, 120, 80, 60.0)
    };
    harness
        .bank
        .screenings
        .submit_at(submission(donor_id, readings), screened_at)
        .expect("screening recorded")
}

pub(super) fn add_organization(harness: &Harness, name: &str) -> i64 {
    harness
        .bank
        .organizations
        .create(NewOrganization {
            name: Some(name.to_string()),
            org_type: Some("Hospital".to_string()),
            contact_person: Some("Dr. Reyes".to_string()),
            contact_phone: None,
            contact_email: None,
        })
        .expect("organization created")
        .org_id
}

pub(super) fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn at(year: i32, month: u32, date: u32, hour: u32) -> NaiveDateTime {
    day(year, month, date)
        .and_hms_opt(hour, 0, 0)
        .expect("valid time")
}
