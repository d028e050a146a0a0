use rust_decimal::Decimal;

use crate::domain::calibration::{CalibrationOutcome, Confidence, GradeCalibrationResult};
use crate::domain::enrollment::{GradeCounts, HistoricalEnrollmentYear};
use crate::domain::grade::{GradeDefinition, GradeSequence};
use crate::domain::optimization::GradeDemand;
use crate::domain::rates::{EffectiveRate, LateralEntry, RateSource};

pub const MINIMAL_FORECAST_YAML: &str = r#"school: Ecole Demo
base_year: 2025
projection_years: 3
school_max_capacity: 600
history:
  - fiscal_year: 2023
    grades: {PS: 40, MS: 42, GS: 41, CP: 44, CE1: 40, CE2: 41, CM1: 39, CM2: 40, 6EME: 45, 5EME: 43, 4EME: 42, 3EME: 41, 2NDE: 44, 1ERE: 40, TERM: 38}
  - fiscal_year: 2024
    grades: {PS: 41, MS: 41, GS: 43, CP: 43, CE1: 43, CE2: 40, CM1: 40, CM2: 39, 6EME: 44, 5EME: 44, 4EME: 43, 3EME: 41, 2NDE: 43, 1ERE: 42, TERM: 39}
  - fiscal_year: 2025
    grades: {PS: 42, MS: 42, GS: 42, CP: 45, CE1: 42, CE2: 43, CM1: 40, CM2: 40, 6EME: 43, 5EME: 43, 4EME: 44, 3EME: 42, 2NDE: 45, 1ERE: 42, TERM: 41}
base_enrollment:
  PS: 42
  MS: 42
  GS: 42
  CP: 45
  CE1: 42
  CE2: 43
  CM1: 40
  CM2: 40
  6EME: 43
  5EME: 43
  4EME: 44
  3EME: 42
  2NDE: 45
  1ERE: 42
  TERM: 41
scenario:
  code: base
  ps_entry: 42
"#;

pub fn counts(grades: &[(&str, u32)]) -> GradeCounts {
    grades
        .iter()
        .map(|(code, count)| (code.to_string(), *count))
        .collect()
}

pub fn history_year(fiscal_year: i32, grades: &[(&str, u32)]) -> HistoricalEnrollmentYear {
    HistoricalEnrollmentYear {
        fiscal_year,
        grades: counts(grades),
    }
}

/// `A` feeding `B`, both in cycle `ONE`, neither an entry point.
pub fn two_grade_sequence() -> GradeSequence {
    GradeSequence::new(vec![
        GradeDefinition::new("A", "ONE", false),
        GradeDefinition::new("B", "ONE", false),
    ])
    .unwrap()
}

/// `A`, `B` in cycle `FIRST` and `C`, `D` in cycle `SECOND`; `C` is an entry point.
pub fn four_grade_sequence() -> GradeSequence {
    GradeSequence::new(vec![
        GradeDefinition::new("A", "FIRST", false),
        GradeDefinition::new("B", "FIRST", false),
        GradeDefinition::new("C", "SECOND", true),
        GradeDefinition::new("D", "SECOND", false),
    ])
    .unwrap()
}

pub fn calibration_outcome(results: Vec<GradeCalibrationResult>) -> CalibrationOutcome {
    CalibrationOutcome {
        success: true,
        years_available: vec![2023, 2024, 2025],
        grades: results
            .into_iter()
            .map(|result| (result.grade_code.clone(), result))
            .collect(),
        missing: Vec::new(),
    }
}

pub fn effective_rate(
    grade_code: &str,
    retention_rate: Decimal,
    lateral: LateralEntry,
) -> EffectiveRate {
    EffectiveRate {
        grade_code: grade_code.to_string(),
        retention_rate,
        lateral,
        source: RateSource::DocumentDefault,
        confidence: Confidence::Low,
    }
}

pub fn demand(grade_code: &str, retained_students: u32, historical_demand: u32) -> GradeDemand {
    GradeDemand {
        grade_code: grade_code.to_string(),
        is_entry_point: false,
        retained_students,
        historical_demand,
    }
}
