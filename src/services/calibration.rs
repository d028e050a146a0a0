use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use tracing::{debug, info, instrument, warn};

use crate::domain::calibration::{
    CalibrationOutcome, CalibrationSettings, Confidence, GradeCalibrationResult,
    MissingCalibration,
};
use crate::domain::enrollment::HistoricalEnrollmentYear;
use crate::domain::grade::GradeSequence;
use crate::domain::rounding::{ratio, round_rate};

const HIGH_CONFIDENCE_SPREAD: Decimal = dec!(0.05);
const MEDIUM_CONFIDENCE_SPREAD: Decimal = dec!(0.10);

/// Derives per-grade transition rates from historical headcounts.
///
/// The two most recent year pairs give the N-1 and N-2 progression rates of
/// each grade against its predecessor. Their weighted blend is split into a
/// retention part capped at 1 and a lateral-entry part holding the surplus.
///
/// Grades without any usable pair are listed in `missing`; the run is only
/// flagged as failed when too few grades calibrate. Neither case is an error:
/// callers fall back to document defaults.
#[instrument(skip_all, fields(years = history.len(), grades = sequence.len()))]
pub fn calibrate(
    history: &[HistoricalEnrollmentYear],
    sequence: &GradeSequence,
    settings: &CalibrationSettings,
) -> CalibrationOutcome {
    let by_year: BTreeMap<i32, &HistoricalEnrollmentYear> = history
        .iter()
        .filter(|year| year.has_data())
        .map(|year| (year.fiscal_year, year))
        .collect();
    let years_available: Vec<i32> = by_year.keys().copied().collect();
    let latest = years_available.last().copied();

    let mut grades = BTreeMap::new();
    let mut missing = Vec::new();
    let mut calibratable = 0usize;

    for (grade, previous) in sequence.progression_grades() {
        calibratable += 1;
        let Some(latest) = latest else {
            missing.push(MissingCalibration {
                grade_code: grade.code.clone(),
                missing_years: Vec::new(),
            });
            continue;
        };

        let n1 = transition_rate(&by_year, &grade.code, &previous.code, latest);
        let n2 = transition_rate(&by_year, &grade.code, &previous.code, latest - 1);
        let n1_rate = n1.as_ref().ok().copied();
        let n2_rate = n2.as_ref().ok().copied();
        match calibrate_grade(&grade.code, n1_rate, n2_rate, settings) {
            Some(result) => {
                debug!(
                    grade = %result.grade_code,
                    weighted = %result.weighted_progression,
                    retention = %result.retention_rate,
                    lateral = %result.lateral_entry_rate,
                    confidence = ?result.confidence,
                    "calibrated grade"
                );
                grades.insert(grade.code.clone(), result);
            }
            None => {
                let mut missing_years: Vec<i32> = n1
                    .err()
                    .into_iter()
                    .chain(n2.err())
                    .flatten()
                    .collect();
                missing_years.sort_unstable();
                missing_years.dedup();
                missing.push(MissingCalibration {
                    grade_code: grade.code.clone(),
                    missing_years,
                });
            }
        }
    }

    let required = required_grades(calibratable, settings.min_calibrated_share);
    let success = years_available.len() >= 2 && grades.len() >= required;
    if success {
        info!(
            calibrated = grades.len(),
            missing = missing.len(),
            "calibration completed"
        );
    } else {
        warn!(
            years = years_available.len(),
            calibrated = grades.len(),
            required,
            "insufficient historical data, document defaults will be used"
        );
    }

    CalibrationOutcome {
        success,
        years_available,
        grades,
        missing,
    }
}

/// Builds the result for one grade from whichever progression rates exist.
pub fn calibrate_grade(
    grade_code: &str,
    progression_n1: Option<Decimal>,
    progression_n2: Option<Decimal>,
    settings: &CalibrationSettings,
) -> Option<GradeCalibrationResult> {
    let (weighted, std_deviation, years_used) = match (progression_n1, progression_n2) {
        (Some(n1), Some(n2)) => (
            round_rate(settings.weight_n1 * n1 + settings.weight_n2 * n2),
            sample_std_deviation(n1, n2),
            3,
        ),
        (Some(single), None) | (None, Some(single)) => (round_rate(single), None, 2),
        (None, None) => return None,
    };

    let retention_rate = round_rate(weighted.min(Decimal::ONE));
    let lateral_entry_rate = round_rate((weighted - retention_rate).max(Decimal::ZERO));

    Some(GradeCalibrationResult {
        grade_code: grade_code.to_string(),
        progression_n1,
        progression_n2,
        weighted_progression: weighted,
        retention_rate,
        lateral_entry_rate,
        confidence: confidence(years_used, std_deviation),
        std_deviation,
        years_used,
    })
}

/// `count[grade, year] / count[previous, year - 1]`, or the years lacking data.
fn transition_rate(
    by_year: &BTreeMap<i32, &HistoricalEnrollmentYear>,
    grade: &str,
    previous: &str,
    year: i32,
) -> Result<Decimal, Vec<i32>> {
    let current = by_year.get(&year).and_then(|data| data.count(grade));
    let prior = by_year
        .get(&(year - 1))
        .and_then(|data| data.count(previous))
        .filter(|count| *count > 0);

    match (current, prior) {
        (Some(current), Some(prior)) => ratio(current, prior).ok_or_else(|| vec![year - 1]),
        (current, prior) => {
            let mut years = Vec::new();
            if prior.is_none() {
                years.push(year - 1);
            }
            if current.is_none() {
                years.push(year);
            }
            Err(years)
        }
    }
}

fn sample_std_deviation(first: Decimal, second: Decimal) -> Option<Decimal> {
    let spread = first - second;
    let variance = spread * spread / Decimal::TWO;
    variance.sqrt().map(round_rate)
}

fn confidence(years_used: u32, std_deviation: Option<Decimal>) -> Confidence {
    let spread = std_deviation.unwrap_or(Decimal::ZERO);
    if years_used >= 3 && spread < HIGH_CONFIDENCE_SPREAD {
        Confidence::High
    } else if years_used >= 2 && spread < MEDIUM_CONFIDENCE_SPREAD {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn required_grades(calibratable: usize, share: Decimal) -> usize {
    let share = share.clamp(Decimal::ZERO, Decimal::ONE);
    (share * Decimal::from(calibratable))
        .ceil()
        .to_usize()
        .unwrap_or(calibratable)
}
