use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::staff::resolve_performer;
use super::{donors, optional_text, required_text, screening, ServiceError};
use crate::domain::{
    expiry_for, BloodType, BloodUnit, Donation, DonationId, DonorId, ScreeningId, UnitId,
    UnitStatus, DEFAULT_COLLECTION_SITE,
};
use crate::persistence::{blood_type_params, Database, GatewayError, Statement};

/// Request to turn an eligible screening into a donation and its blood unit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationRequest {
    #[serde(default, alias = "donorId")]
    pub donor_id: Option<String>,
    /// Falls back to the donor's registered blood type when omitted.
    #[serde(default, alias = "blood_group", alias = "bloodGroup")]
    pub blood_type: Option<String>,
    /// Pins a specific screening instead of the donor's most recent eligible one.
    #[serde(default, alias = "screeningId")]
    pub screening_id: Option<String>,
    #[serde(default, alias = "staffId")]
    pub staff_id: Option<i64>,
    #[serde(default, alias = "collectionSite")]
    pub collection_site: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedDonation {
    pub donation: Donation,
    pub unit: BloodUnit,
}

/// Collection desk: creates a donation and its blood unit atomically.
#[derive(Clone)]
pub struct CollectionService {
    database: Arc<Database>,
}

impl CollectionService {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    pub fn finalize(&self, request: DonationRequest) -> Result<FinalizedDonation, ServiceError> {
        self.finalize_at(request, Local::now().naive_local())
    }

    /// Finalize a collection taken at `collected_at`.
    ///
    /// Lookups happen first and write nothing; a donor with no record has no screening and is
    /// refused as not eligible. The donation and unit inserts then run as one batch: either
    /// both rows exist afterwards or neither does.
    pub fn finalize_at(
        &self,
        request: DonationRequest,
        collected_at: NaiveDateTime,
    ) -> Result<FinalizedDonation, ServiceError> {
        let donor_id = DonorId(required_text("donor_id", request.donor_id.as_deref())?);
        let requested_type = optional_text(request.blood_type.as_deref())
            .map(|raw| BloodType::split(&raw))
            .transpose()?;
        let pinned_screening = optional_text(request.screening_id.as_deref()).map(ScreeningId);
        let collection_site = optional_text(request.collection_site.as_deref())
            .unwrap_or_else(|| DEFAULT_COLLECTION_SITE.to_string());

        let located = match &pinned_screening {
            Some(screening_id) => {
                screening::eligible_by_id(&self.database, &donor_id, screening_id)?
            }
            None => screening::latest_eligible(&self.database, &donor_id)?,
        };
        let Some(screening) = located else {
            warn!(%donor_id, "collection refused: no eligible screening on record");
            return Err(ServiceError::NotEligible(format!(
                "donor {donor_id} has no eligible screening on record"
            )));
        };

        let donor = donors::fetch(&self.database, &donor_id)?
            .ok_or_else(|| ServiceError::not_found("donor", &donor_id))?;
        let phlebotomist = resolve_performer(&self.database, request.staff_id)?;

        let blood_type = match requested_type {
            Some(requested) if requested != donor.blood_type => {
                warn!(
                    %donor_id,
                    registered = %donor.blood_type,
                    collected = %requested,
                    "collected blood type differs from registration"
                );
                requested
            }
            Some(requested) => requested,
            None => donor.blood_type,
        };

        let collection_date = collected_at.date();
        let expiry_date = expiry_for(collection_date).ok_or_else(|| {
            ServiceError::validation(format!("collection date {collection_date} is out of range"))
        })?;

        let donation = Donation {
            donation_id: DonationId::generate(),
            donor_id,
            screening_id: screening.screening_id,
            phlebotomist_staff_id: phlebotomist,
            donated_at: collected_at,
            collection_site,
        };
        let unit = BloodUnit {
            unit_id: UnitId::generate(),
            donation_id: donation.donation_id.clone(),
            blood_type,
            collection_date,
            expiry_date,
            status: UnitStatus::Available,
            issued_to_org_id: None,
        };

        self.database
            .execute(&creation_batch(&donation, &unit))
            .map_err(|err| reject_reused_screening(err, &donation.screening_id))?;

        info!(
            donation_id = %donation.donation_id,
            unit_id = %unit.unit_id,
            donor_id = %donation.donor_id,
            blood_type = %unit.blood_type,
            %expiry_date,
            "donation collected"
        );
        Ok(FinalizedDonation { donation, unit })
    }
}

fn creation_batch(donation: &Donation, unit: &BloodUnit) -> [Statement; 2] {
    let (blood_group, rh_factor) = blood_type_params(&unit.blood_type);
    [
        Statement::new(
            "INSERT INTO donations (donation_id, donor_id, screening_id, phlebotomist_staff_id, \
             donation_date, collection_site) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(donation.donation_id.0.clone())
        .bind(donation.donor_id.0.clone())
        .bind(donation.screening_id.0.clone())
        .bind(donation.phlebotomist_staff_id)
        .bind_timestamp(donation.donated_at)
        .bind(donation.collection_site.clone()),
        Statement::new(
            "INSERT INTO blood_units (unit_id, donation_id, blood_group, rh_factor, \
             collection_date, expiry_date, status) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(unit.unit_id.0.clone())
        .bind(unit.donation_id.0.clone())
        .bind(blood_group)
        .bind(rh_factor)
        .bind_date(unit.collection_date)
        .bind_date(unit.expiry_date)
        .bind(unit.status.label().to_string()),
    ]
}

/// The UNIQUE constraint on `donations.screening_id` is what stops two concurrent finalizations
/// of the same screening; the loser lands here.
fn reject_reused_screening(err: GatewayError, screening_id: &ScreeningId) -> ServiceError {
    if err.failed_statement() == Some(0) && err.is_duplicate_key() {
        warn!(%screening_id, "collection refused: screening already used");
        ServiceError::Conflict(format!(
            "screening {screening_id} already backs a donation"
        ))
    } else {
        err.into()
    }
}
