use super::common::{at, harness, register, screen, submission, vitals};
use crate::domain::DonorId;
use crate::eligibility::{Reading, ALL_CLEAR_NOTE};
use crate::services::ServiceError;

#[test]
fn low_hemoglobin_is_recorded_as_ineligible() {
    let (harness, staff_id) = harness();
    let donor = register(&harness, "Cruz", "O+");

    let screening = harness
        .bank
        .screenings
        .submit(submission(&donor.donor_id, vitals(11.0, 120, 80, 60.0)))
        .expect("screening recorded");

    assert!(!screening.is_eligible);
    assert_eq!(screening.notes, "Low Hemoglobin");
    assert_eq!(screening.staff_id, staff_id);
    assert_eq!(harness.count("screenings"), 1);
}

#[test]
fn healthy_vitals_are_recorded_as_eligible() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "O+");

    let screening = harness
        .bank
        .screenings
        .submit(submission(&donor.donor_id, vitals(13.5, 120, 80, 65.0)))
        .expect("screening recorded");

    assert!(screening.is_eligible);
    assert_eq!(screening.notes, ALL_CLEAR_NOTE);

    let latest = harness
        .bank
        .screenings
        .latest_eligible(&donor.donor_id)
        .expect("lookup")
        .expect("eligible screening on file");
    assert_eq!(latest.screening_id, screening.screening_id);
    assert_eq!(latest.vitals, screening.vitals);
}

#[test]
fn staff_notes_follow_the_verdict() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "O+");
    let mut form = submission(&donor.donor_id, vitals(12.0, 185, 80, 45.0));
    form.additional_notes = Some("  donor felt dizzy ".to_string());

    let screening = harness.bank.screenings.submit(form).expect("recorded");

    assert_eq!(
        screening.notes,
        "Low Hemoglobin, BP (Systolic) out of range, Weight below minimum | Staff Notes: donor felt dizzy"
    );
}

#[test]
fn malformed_vitals_write_nothing() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "O+");

    let mut missing = submission(&donor.donor_id, vitals(13.5, 120, 80, 65.0));
    missing.vitals.weight_kg = None;
    let err = harness.bank.screenings.submit(missing).expect_err("weight missing");
    assert!(matches!(err, ServiceError::Validation(_)), "got {err:?}");

    let mut garbled = submission(&donor.donor_id, vitals(13.5, 120, 80, 65.0));
    garbled.vitals.hemoglobin = Some(Reading::Text("high".to_string()));
    let err = harness.bank.screenings.submit(garbled).expect_err("not a number");
    assert_eq!(err.kind(), "validation");

    assert_eq!(harness.count("screenings"), 0);
}

#[test]
fn unknown_donor_is_not_found() {
    let (harness, _) = harness();

    let err = harness
        .bank
        .screenings
        .submit(submission(
            &DonorId("ghost".to_string()),
            vitals(13.5, 120, 80, 65.0),
        ))
        .expect_err("no such donor");

    assert!(
        matches!(&err, ServiceError::NotFound { entity: "donor", .. }),
        "got {err:?}"
    );
    assert_eq!(harness.count("screenings"), 0);
}

#[test]
fn donor_screenings_are_listed_newest_first() {
    let (harness, _) = harness();
    let donor = register(&harness, "Cruz", "O+");
    let older = screen(&harness, &donor.donor_id, true, at(2024, 3, 1, 9));
    let newer = screen(&harness, &donor.donor_id, false, at(2024, 4, 1, 9));

    let listed = harness
        .bank
        .screenings
        .list_for_donor(&donor.donor_id)
        .expect("listed");

    let ids: Vec<_> = listed.iter().map(|s| s.screening_id.clone()).collect();
    assert_eq!(ids, vec![newer.screening_id, older.screening_id]);
    assert_eq!(listed[0].screened_at, at(2024, 4, 1, 9));
}
