use tracing::{debug, info, instrument};

use crate::domain::class_size::{ClassSizeCatalog, ClassSizeConfig, ClassSizeError};
use crate::domain::enrollment::GradeCounts;
use crate::domain::grade::GradeSequence;
use crate::domain::optimization::{
    Decision, GradeDemand, GradeOptimizationResult, OptimizationReport,
};
use crate::domain::overrides::Overrides;
use crate::domain::rates::EffectiveRates;
use crate::domain::scenario::ScenarioParams;
use crate::services::projection::{ProjectionError, inflow, intake_for_year};

/// Decides how many of the students asking to join a grade can be taken.
///
/// Seats left in the divisions needed by retained students are filled first.
/// New divisions open only when the last of them reaches `min_class_size`.
pub fn optimize_grade(demand: &GradeDemand, config: &ClassSizeConfig) -> GradeOptimizationResult {
    let target = config.target_class_size.max(1);
    let max = config.max_class_size.max(1);
    let retained = demand.retained_students;
    let requested = demand.historical_demand;

    let base_classes = if retained == 0 {
        0
    } else {
        retained.div_ceil(target).min(config.max_divisions)
    };
    let fill_to_target = (base_classes * target).saturating_sub(retained);
    let fill_to_max = (base_classes * max).saturating_sub(retained);
    let free_divisions = config.max_divisions.saturating_sub(base_classes);
    let new_class_threshold = (free_divisions > 0).then(|| fill_to_max + config.min_class_size);

    let overflow = requested.saturating_sub(fill_to_max);
    let new_divisions = new_divisions_for(overflow, config, free_divisions);
    let (decision, seats, final_classes) = if requested <= fill_to_target {
        (Decision::AcceptAll, requested, base_classes)
    } else if requested <= fill_to_max {
        (Decision::FillToMax, requested, base_classes)
    } else if new_divisions > 0 {
        (
            Decision::OpenNewClass,
            fill_to_max + new_divisions * max,
            base_classes + new_divisions,
        )
    } else if fill_to_max > 0 {
        (Decision::Restricted, fill_to_max, base_classes)
    } else {
        (Decision::AtCeiling, 0, base_classes)
    };

    let accepted = requested.min(seats);
    GradeOptimizationResult {
        grade_code: demand.grade_code.clone(),
        is_entry_point: demand.is_entry_point,
        retained_students: retained,
        historical_demand: requested,
        base_classes,
        fill_to_target,
        fill_to_max,
        new_class_threshold,
        decision,
        accepted,
        rejected: requested - accepted,
        final_classes,
        final_students: retained + accepted,
    }
}

/// Divisions to open for `overflow` students beyond the existing seats.
///
/// Full divisions are opened first; a trailing division below
/// `min_class_size` is dropped. Capped by `free_divisions`.
fn new_divisions_for(overflow: u32, config: &ClassSizeConfig, free_divisions: u32) -> u32 {
    if overflow == 0 || free_divisions == 0 {
        return 0;
    }
    let max = config.max_class_size.max(1);
    let needed = overflow.div_ceil(max);
    if needed > free_divisions {
        return free_divisions;
    }
    let last = overflow - (needed - 1) * max;
    if last >= config.min_class_size {
        needed
    } else {
        needed - 1
    }
}

/// Retained students and lateral demand per grade for the year that follows `populations`.
///
/// The intake grade has no retained students; its demand is the scenario
/// entry count for `year_offset`.
pub fn build_grade_demands(
    sequence: &GradeSequence,
    populations: &GradeCounts,
    rates: &EffectiveRates,
    scenario: &ScenarioParams,
    year_offset: u32,
    overrides: &Overrides,
) -> Result<Vec<GradeDemand>, ProjectionError> {
    sequence
        .grades()
        .iter()
        .map(|grade| {
            let (retained_students, historical_demand) = match sequence.predecessor(&grade.code) {
                None => (0, intake_for_year(scenario, overrides, year_offset)?),
                Some(predecessor) => {
                    let rate = rates
                        .get(&grade.code)
                        .ok_or_else(|| ProjectionError::MissingRate(grade.code.clone()))?;
                    let population = populations.get(&predecessor.code).copied().unwrap_or(0);
                    inflow(population, rate.retention_rate, rate.lateral)
                }
            };
            Ok(GradeDemand {
                grade_code: grade.code.clone(),
                is_entry_point: grade.entry_point,
                retained_students,
                historical_demand,
            })
        })
        .collect()
}

/// Runs [`optimize_grade`] for every demand row with override-adjusted class sizes.
#[instrument(skip_all, fields(grades = demands.len()))]
pub fn optimize_lateral_entries(
    demands: &[GradeDemand],
    catalog: &ClassSizeCatalog,
    overrides: &Overrides,
    sequence: &GradeSequence,
) -> Result<OptimizationReport, ClassSizeError> {
    let mut grades = Vec::with_capacity(demands.len());
    for demand in demands {
        let config = overrides.effective_class_size(&demand.grade_code, sequence, catalog);
        config.validate(&demand.grade_code)?;
        let result = optimize_grade(demand, &config);
        debug!(
            grade = %result.grade_code,
            decision = result.decision.label(),
            accepted = result.accepted,
            rejected = result.rejected,
            "optimized grade"
        );
        grades.push(result);
    }

    let report = OptimizationReport::new(grades);
    info!(
        demand = report.summary.total_demand,
        accepted = report.summary.total_accepted,
        rejected = report.summary.total_rejected,
        "lateral entries optimized"
    );
    Ok(report)
}
