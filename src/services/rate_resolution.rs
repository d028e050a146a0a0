use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::calibration::{CalibrationOutcome, GradeCalibrationResult};
use crate::domain::enrollment::GradeCounts;
use crate::domain::grade::{GradeDefinition, GradeSequence};
use crate::domain::overrides::{GradeOverride, Overrides};
use crate::domain::rates::{
    DocumentDefault, DocumentDefaults, EffectiveRate, EffectiveRates, LateralEntry, RateSource,
};
use crate::domain::rounding::{round_rate, round_students};
use crate::domain::scenario::ScenarioParams;

#[derive(Error, Debug, PartialEq)]
pub enum RateResolutionError {
    #[error("override refers to unknown grade {0}")]
    UnknownGrade(String),
    #[error("manual retention rate {value} for grade {grade} is outside [0, 1]")]
    InvalidManualRetention { grade: String, value: Decimal },
    #[error("manual lateral entry rate {value} for entry-point grade {grade} is negative")]
    InvalidManualLateralRate { grade: String, value: Decimal },
    #[error("manual lateral entry count {value} for grade {grade} is not a whole number")]
    InvalidManualLateralCount { grade: String, value: Decimal },
    #[error("lateral multiplier must not be negative (got {0})")]
    NegativeMultiplier(Decimal),
}

pub struct RateResolutionInput<'a> {
    pub sequence: &'a GradeSequence,
    /// Ignored unless the calibration run succeeded.
    pub calibration: Option<&'a CalibrationOutcome>,
    pub document_defaults: &'a DocumentDefaults,
    pub overrides: &'a Overrides,
    pub scenario: &'a ScenarioParams,
    /// Headcounts used to turn calibrated lateral rates into fixed counts.
    pub reference_population: Option<&'a GradeCounts>,
}

/// Returns the first present candidate together with the level that supplied it.
pub fn resolve_by_precedence<T>(
    candidates: impl IntoIterator<Item = (RateSource, Option<T>)>,
) -> Option<(RateSource, T)> {
    candidates
        .into_iter()
        .find_map(|(source, value)| value.map(|value| (source, value)))
}

/// Resolves the effective rate of every grade that has a predecessor.
#[instrument(skip_all, fields(scenario = %input.scenario.code))]
pub fn resolve_effective_rates(
    input: &RateResolutionInput,
) -> Result<EffectiveRates, RateResolutionError> {
    for code in input.overrides.grades.keys() {
        if !input.sequence.contains(code) {
            return Err(RateResolutionError::UnknownGrade(code.clone()));
        }
    }

    let multiplier = input
        .overrides
        .lateral_multiplier()
        .unwrap_or(input.scenario.lateral_multiplier);
    if multiplier < Decimal::ZERO {
        return Err(RateResolutionError::NegativeMultiplier(multiplier));
    }

    let calibration = input.calibration.filter(|outcome| outcome.success);
    let mut rates = EffectiveRates::new();
    for (grade, previous) in input.sequence.progression_grades() {
        let context = GradeContext {
            grade,
            previous,
            calibrated: calibration.and_then(|outcome| outcome.get(&grade.code)),
            document: input.document_defaults.get(&grade.code),
            manual: input.overrides.grade(&grade.code),
        };
        let rate = resolve_grade(input, &context, multiplier)?;
        debug!(
            grade = %rate.grade_code,
            retention = %rate.retention_rate,
            lateral = ?rate.lateral,
            source = ?rate.source,
            "resolved effective rate"
        );
        rates.insert(grade.code.clone(), rate);
    }
    Ok(rates)
}

struct GradeContext<'a> {
    grade: &'a GradeDefinition,
    previous: &'a GradeDefinition,
    calibrated: Option<&'a GradeCalibrationResult>,
    document: Option<&'a DocumentDefault>,
    manual: Option<&'a GradeOverride>,
}

fn resolve_grade(
    input: &RateResolutionInput,
    context: &GradeContext,
    multiplier: Decimal,
) -> Result<EffectiveRate, RateResolutionError> {
    let (source, retention_rate) = resolve_retention(input, context)?;
    let lateral = if context.grade.entry_point {
        resolve_lateral_rate(context, multiplier)?
    } else {
        resolve_lateral_count(input, context, multiplier)?
    };

    Ok(EffectiveRate {
        grade_code: context.grade.code.clone(),
        retention_rate,
        lateral,
        source,
        confidence: source.confidence(context.calibrated.map(|result| result.confidence)),
    })
}

fn resolve_retention(
    input: &RateResolutionInput,
    context: &GradeContext,
) -> Result<(RateSource, Decimal), RateResolutionError> {
    let manual = context.manual.and_then(GradeOverride::manual_retention);
    if let Some(value) = manual.filter(|value| !in_unit_interval(*value)) {
        return Err(RateResolutionError::InvalidManualRetention {
            grade: context.grade.code.clone(),
            value,
        });
    }

    let scenario_default = if input.sequence.terminal().code == context.grade.code {
        input.scenario.terminal_retention
    } else {
        input.scenario.default_retention
    };
    let (source, value) = resolve_by_precedence([
        (RateSource::Override, manual),
        (
            RateSource::Calibrated,
            context.calibrated.map(|result| result.retention_rate),
        ),
        (
            RateSource::DocumentDefault,
            context.document.and_then(|defaults| defaults.retention_rate),
        ),
        (RateSource::ScenarioDefault, Some(scenario_default)),
    ])
    .unwrap_or((RateSource::ScenarioDefault, scenario_default));

    let adjusted = match source {
        RateSource::Override => value,
        _ => value + input.overrides.retention_adjustment(),
    };
    Ok((source, round_rate(adjusted.clamp(Decimal::ZERO, Decimal::ONE))))
}

fn resolve_lateral_rate(
    context: &GradeContext,
    multiplier: Decimal,
) -> Result<LateralEntry, RateResolutionError> {
    let manual = context.manual.and_then(GradeOverride::manual_lateral);
    if let Some(value) = manual.filter(|value| *value < Decimal::ZERO) {
        return Err(RateResolutionError::InvalidManualLateralRate {
            grade: context.grade.code.clone(),
            value,
        });
    }

    let rate = resolve_by_precedence([
        (RateSource::Override, manual),
        (
            RateSource::Calibrated,
            context.calibrated.map(|result| result.lateral_entry_rate),
        ),
        (
            RateSource::DocumentDefault,
            context
                .document
                .and_then(|defaults| defaults.lateral_entry_rate),
        ),
    ])
    .map(|(_, rate)| rate)
    .unwrap_or(Decimal::ZERO);

    Ok(LateralEntry::Percentage {
        rate: round_rate(rate * multiplier),
    })
}

fn resolve_lateral_count(
    input: &RateResolutionInput,
    context: &GradeContext,
    multiplier: Decimal,
) -> Result<LateralEntry, RateResolutionError> {
    let manual = match context.manual.and_then(GradeOverride::manual_lateral) {
        Some(value) => Some(whole_students(value).ok_or_else(|| {
            RateResolutionError::InvalidManualLateralCount {
                grade: context.grade.code.clone(),
                value,
            }
        })?),
        None => None,
    };

    let calibrated = context.calibrated.and_then(|result| {
        let predecessor = input
            .reference_population?
            .get(&context.previous.code)
            .copied()?;
        Some(round_students(
            result.lateral_entry_rate * Decimal::from(predecessor),
        ))
    });

    let count = resolve_by_precedence([
        (RateSource::Override, manual),
        (RateSource::Calibrated, calibrated),
        (
            RateSource::DocumentDefault,
            context
                .document
                .and_then(|defaults| defaults.lateral_entry_count),
        ),
    ])
    .map(|(_, count)| count)
    .unwrap_or(0);

    Ok(LateralEntry::Fixed {
        count: round_students(Decimal::from(count) * multiplier),
    })
}

fn in_unit_interval(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}

fn whole_students(value: Decimal) -> Option<u32> {
    if value.is_sign_negative() || !value.fract().is_zero() {
        return None;
    }
    value.to_u32()
}
