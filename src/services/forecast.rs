use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::calibration::CalibrationOutcome;
use crate::domain::class_size::ClassSizeError;
use crate::domain::optimization::OptimizationReport;
use crate::domain::projection::ProjectionYearResult;
use crate::domain::rates::EffectiveRates;
use crate::services::calibration::calibrate;
use crate::services::fingerprint::input_fingerprint;
use crate::services::forecast_yaml::ForecastInput;
use crate::services::lateral_optimizer::{build_grade_demands, optimize_lateral_entries};
use crate::services::projection::{ProjectionError, ProjectionInput, project};
use crate::services::proration::{FiscalYearEnrollment, prorate_projection};
use crate::services::rate_resolution::{
    RateResolutionError, RateResolutionInput, resolve_effective_rates,
};

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("failed to resolve rates: {0}")]
    Rates(#[from] RateResolutionError),
    #[error("failed to project enrollment: {0}")]
    Projection(#[from] ProjectionError),
    #[error("failed to optimize lateral entries: {0}")]
    Optimization(#[from] ClassSizeError),
    #[error("failed to fingerprint input: {0}")]
    Fingerprint(#[from] serde_json::Error),
    #[error("year {year} is outside the projection horizon 1..={horizon}")]
    YearOutOfRange { year: u32, horizon: u32 },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ForecastReport {
    pub school: String,
    pub scenario: String,
    pub input_fingerprint: String,
    pub calibration: CalibrationOutcome,
    pub rates: EffectiveRates,
    pub projection: Vec<ProjectionYearResult>,
    pub fiscal_years: Vec<FiscalYearEnrollment>,
    /// Lateral-entry decisions for the first projected year.
    pub optimization: OptimizationReport,
}

pub fn run_calibration(input: &ForecastInput) -> CalibrationOutcome {
    calibrate(&input.history, &input.sequence, &input.settings.calibration)
}

/// Effective rates with the most recent history year as reference population.
///
/// Falls back to the base enrollment when no history year has data.
pub fn run_rate_resolution(
    input: &ForecastInput,
    calibration: &CalibrationOutcome,
) -> Result<EffectiveRates, RateResolutionError> {
    let reference = input
        .history
        .iter()
        .filter(|year| year.has_data())
        .max_by_key(|year| year.fiscal_year)
        .map(|year| &year.grades)
        .unwrap_or(&input.base_enrollment);
    resolve_effective_rates(&RateResolutionInput {
        sequence: &input.sequence,
        calibration: Some(calibration),
        document_defaults: &input.document_defaults,
        overrides: &input.overrides,
        scenario: &input.scenario,
        reference_population: Some(reference),
    })
}

pub fn run_projection(
    input: &ForecastInput,
    rates: &EffectiveRates,
) -> Result<Vec<ProjectionYearResult>, ProjectionError> {
    let strategy = input.settings.reduction.strategy();
    project(
        &ProjectionInput {
            sequence: &input.sequence,
            base_year: input.base_year,
            base_enrollment: &input.base_enrollment,
            rates,
            scenario: &input.scenario,
            class_sizes: &input.class_sizes,
            overrides: &input.overrides,
            school_max_capacity: input.school_max_capacity,
            years: input.projection_years,
        },
        strategy.as_ref(),
    )
}

/// Lateral-entry decisions for projected year `year` (1-based).
///
/// Retained students come from the populations of the year before, so year 1
/// starts from the base enrollment.
pub fn run_optimization(
    input: &ForecastInput,
    rates: &EffectiveRates,
    projection: &[ProjectionYearResult],
    year: u32,
) -> Result<OptimizationReport, ForecastError> {
    let horizon = projection.len() as u32;
    if year == 0 || year > horizon {
        return Err(ForecastError::YearOutOfRange { year, horizon });
    }

    let populations = match year {
        1 => input.base_enrollment.clone(),
        _ => projection[year as usize - 2]
            .grades
            .iter()
            .map(|grade| (grade.grade_code.clone(), grade.projected_students))
            .collect(),
    };
    let demands = build_grade_demands(
        &input.sequence,
        &populations,
        rates,
        &input.scenario,
        year,
        &input.overrides,
    )?;
    Ok(optimize_lateral_entries(
        &demands,
        &input.class_sizes,
        &input.overrides,
        &input.sequence,
    )?)
}

/// Calibration, rate resolution, projection, fiscal proration and the
/// first-year lateral-entry optimization in one pass.
#[instrument(skip_all, fields(school = %input.school, scenario = %input.scenario.code))]
pub fn run_forecast(input: &ForecastInput) -> Result<ForecastReport, ForecastError> {
    let input_fingerprint = input_fingerprint(input)?;
    let calibration = run_calibration(input);
    let rates = run_rate_resolution(input, &calibration)?;
    let projection = run_projection(input, &rates)?;
    let fiscal_years = prorate_projection(
        input.base_year,
        &input.base_enrollment,
        &projection,
        &input.settings.calendar,
    );
    let optimization = run_optimization(input, &rates, &projection, 1)?;

    info!(
        fingerprint = %input_fingerprint,
        years = projection.len(),
        "forecast completed"
    );
    Ok(ForecastReport {
        school: input.school.clone(),
        scenario: input.scenario.code.clone(),
        input_fingerprint,
        calibration,
        rates,
        projection,
        fiscal_years,
        optimization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rates::{LateralEntry, RateSource};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use crate::services::forecast_yaml::deserialize_forecast_input_from_yaml_str;
    use crate::test_support::MINIMAL_FORECAST_YAML;

    fn input() -> ForecastInput {
        deserialize_forecast_input_from_yaml_str(MINIMAL_FORECAST_YAML).unwrap()
    }

    #[test]
    fn forecast_runs_every_stage() {
        crate::logging::init_test();
        let report = run_forecast(&input()).unwrap();

        assert_eq!(report.school, "Ecole Demo");
        assert_eq!(report.input_fingerprint.len(), 64);
        assert!(report.calibration.success);
        assert_eq!(report.rates.len(), 14);
        assert_eq!(report.projection.len(), 3);
        assert_eq!(report.projection[0].fiscal_year, 2026);
        assert_eq!(report.fiscal_years.len(), 3);
        assert_eq!(report.optimization.grades.len(), 15);
        for year in &report.projection {
            assert!(year.total_students <= 600 || year.unresolved_excess > 0);
        }
    }

    #[test]
    fn calibrated_rates_win_over_document_defaults() {
        let input = input();
        let calibration = run_calibration(&input);
        let rates = run_rate_resolution(&input, &calibration).unwrap();
        assert_eq!(rates["CE1"].source, RateSource::Calibrated);
    }

    #[test]
    fn same_input_gives_the_same_report() {
        let input = input();
        assert_eq!(run_forecast(&input).unwrap(), run_forecast(&input).unwrap());
    }

    #[test]
    fn entry_point_growing_faster_than_its_feeder_still_projects() {
        let yaml = MINIMAL_FORECAST_YAML
            .replace("{PS: 41, MS: 41,", "{PS: 41, MS: 100,")
            .replace("{PS: 42, MS: 42, GS: 42, CP: 45", "{PS: 42, MS: 105, GS: 42, CP: 45");
        let input = deserialize_forecast_input_from_yaml_str(&yaml).unwrap();
        let report = run_forecast(&input).unwrap();

        let ms = &report.rates["MS"];
        assert_eq!(ms.source, RateSource::Calibrated);
        assert_eq!(ms.retention_rate, dec!(1.0000));
        assert!(matches!(ms.lateral, LateralEntry::Percentage { rate } if rate > Decimal::ONE));
        // 42 retained from PS plus round(42 * 1.5427) new students, before the capacity cut
        let first_year = report.projection[0].grade("MS").unwrap();
        assert_eq!(first_year.retained_students, 42);
        assert_eq!(first_year.original_projection, 107);
    }

    #[test]
    fn optimization_year_must_be_projected() {
        let input = input();
        let calibration = run_calibration(&input);
        let rates = run_rate_resolution(&input, &calibration).unwrap();
        let projection = run_projection(&input, &rates).unwrap();

        assert!(run_optimization(&input, &rates, &projection, 3).is_ok());
        assert!(matches!(
            run_optimization(&input, &rates, &projection, 4),
            Err(ForecastError::YearOutOfRange { year: 4, horizon: 3 })
        ));
        assert!(matches!(
            run_optimization(&input, &rates, &projection, 0),
            Err(ForecastError::YearOutOfRange { .. })
        ));
    }
}
