use chrono::Days;

use super::common::{add_staff, at, empty_harness, harness, register, screen};
use crate::domain::{UnitStatus, DEFAULT_COLLECTION_SITE};
use crate::services::{DonationRequest, ServiceError};

fn request_for(donor_id: &str, blood_type: Option<&str>) -> DonationRequest {
    DonationRequest {
        donor_id: Some(donor_id.to_string()),
        blood_type: blood_type.map(str::to_string),
        ..DonationRequest::default()
    }
}

#[test]
fn eligible_donor_yields_available_unit_expiring_in_42_days() {
    let (harness, phlebotomist) = harness();
    let donor = register(&harness, "Cruz", "AB-");
    let screening = screen(&harness, &donor.donor_id, true, at(2024, 5, 10, 9));

    let finalized = harness
        .bank
        .collections
        .finalize_at(request_for(&donor.donor_id.0, Some("AB-")), at(2024, 5, 10, 10))
        .expect("donation finalized");

    let unit = &finalized.unit;
    assert_eq!(unit.blood_type.to_string(), "AB-");
    assert_eq!(unit.status, UnitStatus::Available);
    assert_eq!(unit.collection_date, at(2024, 5, 10, 0).date());
    assert_eq!(
        unit.expiry_date,
        unit.collection_date.checked_add_days(Days::new(42)).unwrap()
    );
    assert_eq!(unit.issued_to_org_id, None);
    assert_eq!(unit.donation_id, finalized.donation.donation_id);

    assert_eq!(finalized.donation.screening_id, screening.screening_id);
    assert_eq!(finalized.donation.phlebotomist_staff_id, phlebotomist);
    assert_eq!(finalized.donation.collection_site, DEFAULT_COLLECTION_SITE);

    let stored = harness.bank.inventory.get(&unit.unit_id).expect("unit stored");
    assert_eq!(&stored, unit);
    assert_eq!(harness.count("donations"), 1);
}

#[test]
fn donor_without_screening_is_refused_and_nothing_is_written() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "O+");

    let err = harness
        .bank
        .collections
        .finalize(request_for(&donor.donor_id.0, Some("O+")))
        .expect_err("no screening on record");

    assert!(matches!(err, ServiceError::NotEligible(_)), "got {err:?}");
    assert_eq!(harness.count("donations"), 0);
    assert_eq!(harness.count("blood_units"), 0);
}

#[test]
fn ineligible_screenings_do_not_qualify() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "O+");
    screen(&harness, &donor.donor_id, false, at(2024, 5, 10, 9));

    let err = harness
        .bank
        .collections
        .finalize(request_for(&donor.donor_id.0, None))
        .expect_err("only a failed screening exists");

    assert_eq!(err.kind(), "not_eligible");
    assert_eq!(harness.count("donations"), 0);
}

#[test]
fn most_recent_eligible_screening_backs_the_donation() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "O+");
    screen(&harness, &donor.donor_id, true, at(2024, 5, 1, 9));
    let latest = screen(&harness, &donor.donor_id, true, at(2024, 5, 9, 9));
    screen(&harness, &donor.donor_id, false, at(2024, 5, 10, 9));

    let finalized = harness
        .bank
        .collections
        .finalize_at(request_for(&donor.donor_id.0, None), at(2024, 5, 10, 10))
        .expect("donation finalized");

    assert_eq!(finalized.donation.screening_id, latest.screening_id);
}

#[test]
fn omitted_blood_type_falls_back_to_registration() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "B-");
    screen(&harness, &donor.donor_id, true, at(2024, 5, 10, 9));

    let finalized = harness
        .bank
        .collections
        .finalize(request_for(&donor.donor_id.0, None))
        .expect("donation finalized");

    assert_eq!(finalized.unit.blood_type, donor.blood_type);
}

#[test]
fn failed_unit_insert_rolls_back_the_donation() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "A+");
    screen(&harness, &donor.donor_id, true, at(2024, 5, 10, 9));
    harness.temp.exec(
        "CREATE TRIGGER fail_unit BEFORE INSERT ON blood_units \
         BEGIN SELECT RAISE(ABORT, 'simulated unit failure'); END;",
    );

    let err = harness
        .bank
        .collections
        .finalize(request_for(&donor.donor_id.0, Some("A+")))
        .expect_err("unit insert aborts");

    match err {
        ServiceError::Transaction(gateway) => assert_eq!(gateway.failed_statement(), Some(1)),
        other => panic!("expected transaction failure, got {other:?}"),
    }
    assert_eq!(harness.count("donations"), 0);
    assert_eq!(harness.count("blood_units"), 0);
}

#[test]
fn a_screening_backs_at_most_one_donation() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "A+");
    let screening = screen(&harness, &donor.donor_id, true, at(2024, 5, 10, 9));

    harness
        .bank
        .collections
        .finalize(request_for(&donor.donor_id.0, None))
        .expect("first finalization");

    let pinned = DonationRequest {
        screening_id: Some(screening.screening_id.0.clone()),
        ..request_for(&donor.donor_id.0, None)
    };
    let err = harness
        .bank
        .collections
        .finalize(pinned)
        .expect_err("screening already used");

    assert!(matches!(err, ServiceError::Conflict(_)), "got {err:?}");
    assert_eq!(harness.count("donations"), 1);
    assert_eq!(harness.count("blood_units"), 1);
}

#[test]
fn pinned_screening_must_belong_to_the_donor() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "A+");
    let other = register(&harness, "Lopez", "A+");
    let foreign = screen(&harness, &other.donor_id, true, at(2024, 5, 10, 9));

    let err = harness
        .bank
        .collections
        .finalize(DonationRequest {
            screening_id: Some(foreign.screening_id.0.clone()),
            ..request_for(&donor.donor_id.0, None)
        })
        .expect_err("screening belongs to someone else");

    assert_eq!(err.kind(), "not_eligible");
}

#[test]
fn missing_default_phlebotomist_is_a_configuration_error() {
    let harness = empty_harness();
    let nurse = add_staff(&harness, "NUR001", "Nurse");
    let donor = register(&harness, "Cruz", "A+");
    let mut submission = super::common::submission(
        &donor.donor_id,
        super::common::vitals(13.5, 120, 80, 65.0),
    );
    submission.staff_id = Some(nurse);
    harness
        .bank
        .screenings
        .submit(submission)
        .expect("screening with explicit staff");

    let err = harness
        .bank
        .collections
        .finalize(request_for(&donor.donor_id.0, None))
        .expect_err("PHL001 is not on staff");

    assert!(matches!(err, ServiceError::Configuration(_)), "got {err:?}");
    assert_eq!(harness.count("donations"), 0);
}

#[test]
fn explicit_staff_must_be_active() {
    let (harness, _) = harness();
    let retired = add_staff(&harness, "PHL002", "Phlebotomist");
    harness.bank.staff.deactivate(retired).expect("deactivated");
    let donor = register(&harness, "Cruz", "A+");
    screen(&harness, &donor.donor_id, true, at(2024, 5, 10, 9));

    let err = harness
        .bank
        .collections
        .finalize(DonationRequest {
            staff_id: Some(retired),
            ..request_for(&donor.donor_id.0, None)
        })
        .expect_err("inactive staff");

    assert_eq!(err.kind(), "not_found");
}

#[test]
fn input_is_validated_before_lookups() {
    let (harness, _) = harness();

    let missing = harness
        .bank
        .collections
        .finalize(DonationRequest::default())
        .expect_err("donor id missing");
    assert_eq!(missing.kind(), "validation");

    let donor = register(&harness, "Cruz", "A+");
    let malformed = harness
        .bank
        .collections
        .finalize(request_for(&donor.donor_id.0, Some("Q+")))
        .expect_err("bad blood type");
    assert_eq!(malformed.kind(), "validation");

    let unknown = harness
        .bank
        .collections
        .finalize(request_for("no-such-donor", None))
        .expect_err("unknown donor");
    assert!(matches!(unknown, ServiceError::NotEligible(_)), "got {unknown:?}");
}
