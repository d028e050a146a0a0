use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::calibration::Confidence;

/// How lateral admissions into a grade are modelled.
///
/// Entry points take a share of the predecessor population, incidental grades
/// take a fixed headcount.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LateralEntry {
    Percentage { rate: Decimal },
    Fixed { count: u32 },
}

/// Precedence level that supplied a resolved value, highest first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Override,
    Calibrated,
    DocumentDefault,
    ScenarioDefault,
}

impl RateSource {
    /// Confidence of a value from this source. Calibrated values carry their own.
    pub fn confidence(self, calibrated: Option<Confidence>) -> Confidence {
        match self {
            RateSource::Override => Confidence::High,
            RateSource::Calibrated => calibrated.unwrap_or(Confidence::Low),
            RateSource::DocumentDefault | RateSource::ScenarioDefault => Confidence::Low,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EffectiveRate {
    pub grade_code: String,
    pub retention_rate: Decimal,
    pub lateral: LateralEntry,
    pub source: RateSource,
    pub confidence: Confidence,
}

impl EffectiveRate {
    pub fn is_percentage_based(&self) -> bool {
        matches!(self.lateral, LateralEntry::Percentage { .. })
    }

    pub fn lateral_entry_rate(&self) -> Option<Decimal> {
        match self.lateral {
            LateralEntry::Percentage { rate } => Some(rate),
            LateralEntry::Fixed { .. } => None,
        }
    }

    pub fn lateral_entry_fixed(&self) -> Option<u32> {
        match self.lateral {
            LateralEntry::Percentage { .. } => None,
            LateralEntry::Fixed { count } => Some(count),
        }
    }
}

pub type EffectiveRates = BTreeMap<String, EffectiveRate>;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DocumentDefault {
    pub retention_rate: Option<Decimal>,
    pub lateral_entry_rate: Option<Decimal>,
    pub lateral_entry_count: Option<u32>,
}

/// Reference rates published with the planning document, keyed by grade.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DocumentDefaults {
    pub grades: BTreeMap<String, DocumentDefault>,
}

impl DocumentDefaults {
    pub fn get(&self, grade_code: &str) -> Option<&DocumentDefault> {
        self.grades.get(grade_code)
    }

    /// Reference table for [`crate::domain::grade::GradeSequence::french_standard`].
    pub fn french_standard() -> Self {
        use rust_decimal_macros::dec;

        let rows: [(&str, Decimal, Option<Decimal>, Option<u32>); 14] = [
            ("MS", dec!(0.96), Some(dec!(0.05)), None),
            ("GS", dec!(0.96), Some(dec!(0.04)), None),
            ("CP", dec!(0.95), Some(dec!(0.06)), None),
            ("CE1", dec!(0.97), None, Some(2)),
            ("CE2", dec!(0.97), None, Some(2)),
            ("CM1", dec!(0.97), None, Some(2)),
            ("CM2", dec!(0.96), None, Some(1)),
            ("6EME", dec!(0.93), Some(dec!(0.08)), None),
            ("5EME", dec!(0.97), None, Some(2)),
            ("4EME", dec!(0.97), None, Some(2)),
            ("3EME", dec!(0.96), None, Some(1)),
            ("2NDE", dec!(0.90), Some(dec!(0.07)), None),
            ("1ERE", dec!(0.96), None, Some(1)),
            ("TERM", dec!(0.98), None, Some(0)),
        ];

        let grades = rows
            .into_iter()
            .map(|(code, retention, rate, count)| {
                (
                    code.to_string(),
                    DocumentDefault {
                        retention_rate: Some(retention),
                        lateral_entry_rate: rate,
                        lateral_entry_count: count,
                    },
                )
            })
            .collect();
        Self { grades }
    }
}
