//! Entities and value types shared by the domain services.

mod blood_type;

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use blood_type::{BloodGroup, BloodType, BloodTypeError, RhFactor};

use crate::eligibility::Vitals;

/// Storage life of a collected unit, counted from the collection date.
pub const UNIT_SHELF_LIFE_DAYS: u64 = 42;

pub const DEFAULT_COLLECTION_SITE: &str = "Main Center";

/// Expiry date for a unit collected on `collection_date`.
///
/// Returns `None` only when the result would fall outside chrono's supported range.
pub fn expiry_for(collection_date: NaiveDate) -> Option<NaiveDate> {
    collection_date.checked_add_days(Days::new(UNIT_SHELF_LIFE_DAYS))
}

fn generated_id() -> String {
    Uuid::new_v4().to_string()
}

/// Identifier wrapper for registered donors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonorId(pub String);

impl DonorId {
    pub fn generate() -> Self {
        Self(generated_id())
    }
}

impl fmt::Display for DonorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for screening events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreeningId(pub String);

impl ScreeningId {
    pub fn generate() -> Self {
        Self(generated_id())
    }
}

impl fmt::Display for ScreeningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for collection events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonationId(pub String);

impl DonationId {
    pub fn generate() -> Self {
        Self(generated_id())
    }
}

impl fmt::Display for DonationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for stored blood units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn generate() -> Self {
        Self(generated_id())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Donor {
    pub donor_id: DonorId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub blood_type: BloodType,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// Search result row; carries just enough to pick a donor from a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorSummary {
    pub donor_id: DonorId,
    pub name: String,
    pub blood_type: BloodType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Screening {
    pub screening_id: ScreeningId,
    pub donor_id: DonorId,
    pub staff_id: i64,
    pub screened_at: NaiveDateTime,
    pub vitals: Vitals,
    pub is_eligible: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Donation {
    pub donation_id: DonationId,
    pub donor_id: DonorId,
    pub screening_id: ScreeningId,
    pub phlebotomist_staff_id: i64,
    pub donated_at: NaiveDateTime,
    pub collection_site: String,
}

/// Inventory lifecycle of a blood unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitStatus {
    #[serde(alias = "In Stock")]
    Available,
    Reserved,
    Issued,
    Expired,
    Discarded,
}

impl UnitStatus {
    pub fn label(self) -> &'static str {
        match self {
            UnitStatus::Available => "Available",
            UnitStatus::Reserved => "Reserved",
            UnitStatus::Issued => "Issued",
            UnitStatus::Expired => "Expired",
            UnitStatus::Discarded => "Discarded",
        }
    }
}

impl FromStr for UnitStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "available" | "in stock" => Ok(UnitStatus::Available),
            "reserved" => Ok(UnitStatus::Reserved),
            "issued" => Ok(UnitStatus::Issued),
            "expired" => Ok(UnitStatus::Expired),
            "discarded" => Ok(UnitStatus::Discarded),
            _ => Err(UnknownStatus(value.to_string())),
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloodUnit {
    pub unit_id: UnitId,
    pub donation_id: DonationId,
    pub blood_type: BloodType,
    pub collection_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: UnitStatus,
    pub issued_to_org_id: Option<i64>,
}

/// One cell of the inventory report: how many units of a type sit in a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryCount {
    pub blood_type: BloodType,
    pub status: UnitStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub role_id: i64,
    pub role_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffMember {
    pub staff_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub employee_number: String,
    pub role_id: i64,
    pub role_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub task_id: i64,
    pub task_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub org_id: i64,
    pub name: String,
    pub org_type: String,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

/// Lifecycle of an organization's request for blood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Fulfilled,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Fulfilled => "Fulfilled",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            "rejected" => Ok(RequestStatus::Rejected),
            "cancelled" | "canceled" => Ok(RequestStatus::Cancelled),
            _ => Err(UnknownStatus(value.to_string())),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BloodRequest {
    pub request_id: i64,
    pub org_id: i64,
    pub org_name: String,
    pub patient_name: Option<String>,
    pub blood_type: BloodType,
    pub quantity: i64,
    pub status: RequestStatus,
    pub requested_at: NaiveDateTime,
}

/// Donor profile plus every screening, newest first, with whatever followed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorReport {
    pub donor: Donor,
    pub history: Vec<DonorHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorHistoryEntry {
    pub screening_id: ScreeningId,
    pub screened_at: NaiveDateTime,
    pub is_eligible: bool,
    pub notes: String,
    pub screener: Option<String>,
    pub donation_id: Option<DonationId>,
    pub donated_at: Option<NaiveDateTime>,
    pub phlebotomist: Option<String>,
    pub unit_id: Option<UnitId>,
    pub unit_status: Option<UnitStatus>,
    pub expiry_date: Option<NaiveDate>,
    pub issued_to_org: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);
