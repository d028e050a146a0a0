use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GradeCalibrationResult {
    pub grade_code: String,
    pub progression_n1: Option<Decimal>,
    pub progression_n2: Option<Decimal>,
    pub weighted_progression: Decimal,
    pub retention_rate: Decimal,
    pub lateral_entry_rate: Decimal,
    pub confidence: Confidence,
    pub std_deviation: Option<Decimal>,
    pub years_used: u32,
}

/// A grade that could not be calibrated and the fiscal years lacking data for it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MissingCalibration {
    pub grade_code: String,
    pub missing_years: Vec<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CalibrationOutcome {
    pub success: bool,
    pub years_available: Vec<i32>,
    pub grades: BTreeMap<String, GradeCalibrationResult>,
    pub missing: Vec<MissingCalibration>,
}

impl CalibrationOutcome {
    pub fn get(&self, grade_code: &str) -> Option<&GradeCalibrationResult> {
        self.grades.get(grade_code)
    }

    pub fn calibrated_count(&self) -> usize {
        self.grades.len()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CalibrationSettings {
    pub weight_n1: Decimal,
    pub weight_n2: Decimal,
    /// Share of calibratable grades that must calibrate for the run to succeed.
    pub min_calibrated_share: Decimal,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            weight_n1: dec!(0.70),
            weight_n2: dec!(0.30),
            min_calibrated_share: dec!(0.5),
        }
    }
}
