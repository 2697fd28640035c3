//! Donor eligibility rules applied to screening vitals.
//!
//! Every rule is checked on its own so a single screening reports all of its problems at once.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

pub const MIN_HEMOGLOBIN_G_DL: f64 = 12.5;
pub const SYSTOLIC_RANGE_MMHG: RangeInclusive<i64> = 90..=180;
pub const DIASTOLIC_RANGE_MMHG: RangeInclusive<i64> = 60..=100;
pub const MIN_WEIGHT_KG: f64 = 50.0;

pub const ALL_CLEAR_NOTE: &str = "All vitals within range.";
const VIOLATION_SEPARATOR: &str = ", ";
const STAFF_NOTES_SEPARATOR: &str = " | Staff Notes: ";

/// Measurements taken during a screening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// g/dL
    pub hemoglobin: f64,
    pub bp_systolic: i64,
    pub bp_diastolic: i64,
    pub weight_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Violation {
    LowHemoglobin,
    SystolicOutOfRange,
    DiastolicOutOfRange,
    WeightBelowMinimum,
}

impl Violation {
    pub fn note(self) -> &'static str {
        match self {
            Violation::LowHemoglobin => "Low Hemoglobin",
            Violation::SystolicOutOfRange => "BP (Systolic) out of range",
            Violation::DiastolicOutOfRange => "BP (Diastolic) out of range",
            Violation::WeightBelowMinimum => "Weight below minimum",
        }
    }
}

/// Outcome of [`evaluate`]; violations keep rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityVerdict {
    pub violations: Vec<Violation>,
}

impl EligibilityVerdict {
    pub fn is_eligible(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human readable summary, with any free-text staff notes appended.
    pub fn notes(&self, staff_notes: Option<&str>) -> String {
        let mut notes = if self.violations.is_empty() {
            ALL_CLEAR_NOTE.to_string()
        } else {
            self.violations
                .iter()
                .map(|violation| violation.note())
                .collect::<Vec<_>>()
                .join(VIOLATION_SEPARATOR)
        };

        if let Some(extra) = staff_notes.map(str::trim).filter(|extra| !extra.is_empty()) {
            notes.push_str(STAFF_NOTES_SEPARATOR);
            notes.push_str(extra);
        }

        notes
    }
}

pub fn evaluate(vitals: &Vitals) -> EligibilityVerdict {
    let mut violations = Vec::new();

    if vitals.hemoglobin < MIN_HEMOGLOBIN_G_DL {
        violations.push(Violation::LowHemoglobin);
    }
    if !SYSTOLIC_RANGE_MMHG.contains(&vitals.bp_systolic) {
        violations.push(Violation::SystolicOutOfRange);
    }
    if !DIASTOLIC_RANGE_MMHG.contains(&vitals.bp_diastolic) {
        violations.push(Violation::DiastolicOutOfRange);
    }
    if vitals.weight_kg < MIN_WEIGHT_KG {
        violations.push(Violation::WeightBelowMinimum);
    }

    EligibilityVerdict { violations }
}

/// A reading as submitted by a client: either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(serde_json::Number),
    Text(String),
}

impl Reading {
    fn as_decimal(&self, field: &'static str) -> Result<f64, InvalidInput> {
        let value = match self {
            Reading::Number(number) => number.as_f64(),
            Reading::Text(text) => text.trim().parse::<f64>().ok(),
        };

        value
            .filter(|value| value.is_finite())
            .ok_or_else(|| InvalidInput::NotANumber {
                field,
                value: self.display(),
            })
    }

    fn as_whole(&self, field: &'static str) -> Result<i64, InvalidInput> {
        if let Reading::Number(number) = self {
            if let Some(value) = number.as_i64() {
                return Ok(value);
            }
        }
        if let Reading::Text(text) = self {
            if let Ok(value) = text.trim().parse::<i64>() {
                return Ok(value);
            }
        }

        let decimal = self.as_decimal(field)?;
        if decimal.fract() == 0.0 && decimal.abs() < i64::MAX as f64 {
            Ok(decimal as i64)
        } else {
            Err(InvalidInput::NotWhole {
                field,
                value: self.display(),
            })
        }
    }

    fn display(&self) -> String {
        match self {
            Reading::Number(number) => number.to_string(),
            Reading::Text(text) => text.clone(),
        }
    }
}

/// Unvalidated vitals exactly as they arrived on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVitals {
    #[serde(default, alias = "hgb")]
    pub hemoglobin: Option<Reading>,
    #[serde(default, alias = "bpSystolic")]
    pub bp_systolic: Option<Reading>,
    #[serde(default, alias = "bpDiastolic")]
    pub bp_diastolic: Option<Reading>,
    #[serde(default, alias = "weightKg")]
    pub weight_kg: Option<Reading>,
}

impl RawVitals {
    pub fn parse(&self) -> Result<Vitals, InvalidInput> {
        Ok(Vitals {
            hemoglobin: required("hemoglobin", &self.hemoglobin)?.as_decimal("hemoglobin")?,
            bp_systolic: required("bp_systolic", &self.bp_systolic)?.as_whole("bp_systolic")?,
            bp_diastolic: required("bp_diastolic", &self.bp_diastolic)?
                .as_whole("bp_diastolic")?,
            weight_kg: required("weight_kg", &self.weight_kg)?.as_decimal("weight_kg")?,
        })
    }
}

fn required<'a>(
    field: &'static str,
    reading: &'a Option<Reading>,
) -> Result<&'a Reading, InvalidInput> {
    reading.as_ref().ok_or(InvalidInput::Missing(field))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be a number (got '{value}')")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be a whole number (got '{value}')")]
    NotWhole { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vitals(hemoglobin: f64, bp_systolic: i64, bp_diastolic: i64, weight_kg: f64) -> Vitals {
        Vitals {
            hemoglobin,
            bp_systolic,
            bp_diastolic,
            weight_kg,
        }
    }

    #[test]
    fn healthy_vitals_are_eligible() {
        let verdict = evaluate(&vitals(13.5, 120, 80, 65.0));
        assert!(verdict.is_eligible());
        assert_eq!(verdict.notes(None), "All vitals within range.");
    }

    #[test]
    fn low_hemoglobin_alone_is_reported() {
        let verdict = evaluate(&vitals(11.0, 120, 80, 60.0));
        assert!(!verdict.is_eligible());
        assert_eq!(verdict.notes(None), "Low Hemoglobin");
    }

    #[test]
    fn every_violation_is_accumulated_in_rule_order() {
        let verdict = evaluate(&vitals(10.0, 200, 40, 45.0));
        assert_eq!(
            verdict.violations,
            vec![
                Violation::LowHemoglobin,
                Violation::SystolicOutOfRange,
                Violation::DiastolicOutOfRange,
                Violation::WeightBelowMinimum,
            ]
        );
        assert_eq!(
            verdict.notes(None),
            "Low Hemoglobin, BP (Systolic) out of range, BP (Diastolic) out of range, Weight below minimum"
        );
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert!(evaluate(&vitals(12.5, 90, 60, 50.0)).is_eligible());
        assert!(evaluate(&vitals(12.5, 180, 100, 50.0)).is_eligible());
        assert!(!evaluate(&vitals(12.49, 120, 80, 60.0)).is_eligible());
        assert!(!evaluate(&vitals(13.0, 89, 80, 60.0)).is_eligible());
        assert!(!evaluate(&vitals(13.0, 181, 80, 60.0)).is_eligible());
        assert!(!evaluate(&vitals(13.0, 120, 59, 60.0)).is_eligible());
        assert!(!evaluate(&vitals(13.0, 120, 101, 60.0)).is_eligible());
        assert!(!evaluate(&vitals(13.0, 120, 80, 49.9)).is_eligible());
    }

    #[test]
    fn verdict_matches_the_rule_set_across_a_grid() {
        for hemoglobin in [11.0, 12.5, 14.0] {
            for bp_systolic in [85, 90, 150, 180, 190] {
                for bp_diastolic in [55, 60, 80, 100, 105] {
                    for weight_kg in [45.0, 50.0, 70.0] {
                        let sample = vitals(hemoglobin, bp_systolic, bp_diastolic, weight_kg);
                        let expected = hemoglobin >= 12.5
                            && (90..=180).contains(&bp_systolic)
                            && (60..=100).contains(&bp_diastolic)
                            && weight_kg >= 50.0;
                        assert_eq!(evaluate(&sample).is_eligible(), expected, "{sample:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn staff_notes_are_appended_after_the_separator() {
        let verdict = evaluate(&vitals(11.0, 120, 80, 60.0));
        assert_eq!(
            verdict.notes(Some("Donor felt dizzy")),
            "Low Hemoglobin | Staff Notes: Donor felt dizzy"
        );
        assert_eq!(verdict.notes(Some("   ")), "Low Hemoglobin");
    }

    #[test]
    fn raw_vitals_accept_numbers_and_numeric_strings() {
        let raw: RawVitals = serde_json::from_value(json!({
            "hemoglobin": "13.5",
            "bp_systolic": 120,
            "bp_diastolic": "80",
            "weight_kg": 65
        }))
        .expect("deserializes");

        assert_eq!(raw.parse(), Ok(vitals(13.5, 120, 80, 65.0)));
    }

    #[test]
    fn raw_vitals_reject_text_and_fractions() {
        let raw: RawVitals = serde_json::from_value(json!({
            "hemoglobin": "high",
            "bp_systolic": 120,
            "bp_diastolic": 80,
            "weight_kg": 65
        }))
        .expect("deserializes");
        assert!(matches!(
            raw.parse(),
            Err(InvalidInput::NotANumber {
                field: "hemoglobin",
                ..
            })
        ));

        let raw: RawVitals = serde_json::from_value(json!({
            "hemoglobin": 13.5,
            "bp_systolic": 120.5,
            "bp_diastolic": 80,
            "weight_kg": 65
        }))
        .expect("deserializes");
        assert!(matches!(
            raw.parse(),
            Err(InvalidInput::NotWhole {
                field: "bp_systolic",
                ..
            })
        ));
    }

    #[test]
    fn raw_vitals_reject_missing_and_non_finite_values() {
        let raw = RawVitals::default();
        assert_eq!(raw.parse(), Err(InvalidInput::Missing("hemoglobin")));

        let raw: RawVitals = serde_json::from_value(json!({
            "hemoglobin": "NaN",
            "bp_systolic": 120,
            "bp_diastolic": 80,
            "weight_kg": 65
        }))
        .expect("deserializes");
        assert!(matches!(raw.parse(), Err(InvalidInput::NotANumber { .. })));
    }
}
