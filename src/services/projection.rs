use rust_decimal::{Decimal, MathematicalOps};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::domain::class_size::{ClassSizeCatalog, ClassSizeConfig, ClassSizeError};
use crate::domain::enrollment::GradeCounts;
use crate::domain::grade::GradeSequence;
use crate::domain::overrides::Overrides;
use crate::domain::projection::{GradeProjection, ProjectionYearResult, school_year_label};
use crate::domain::rates::{EffectiveRates, LateralEntry};
use crate::domain::rounding::{percent_of, round_percent, round_students};
use crate::domain::scenario::ScenarioParams;

#[derive(Error, Debug, PartialEq)]
pub enum ProjectionError {
    #[error("number of projection years must be between 1 and {}", MAX_PROJECTION_YEARS)]
    InvalidYears,
    #[error("school maximum capacity must be greater than zero")]
    InvalidCapacity,
    #[error("invalid class size configuration: {0}")]
    ClassSize(#[from] ClassSizeError),
    #[error("class size override for grade {0} must be positive")]
    InvalidOverride(String),
    #[error("base-year enrollment is missing grade {0}")]
    MissingBaseGrade(String),
    #[error("base-year enrollment contains unknown grade {0}")]
    UnknownBaseGrade(String),
    #[error("no effective rate for grade {0}")]
    MissingRate(String),
    #[error("retention rate {value} for grade {grade} is outside [0, 1]")]
    RetentionOutOfRange { grade: String, value: Decimal },
    #[error("lateral entry rate {value} for grade {grade} is negative")]
    LateralRateOutOfRange { grade: String, value: Decimal },
    #[error("entry growth rate must be greater than -1 (got {0})")]
    InvalidGrowthRate(Decimal),
    #[error("lateral multiplier must not be negative (got {0})")]
    NegativeMultiplier(Decimal),
    #[error("intake for projected year {offset} does not fit in a student count")]
    IntakeOverflow { offset: u32 },
}

pub const MAX_PROJECTION_YEARS: u32 = 50;

pub struct ProjectionInput<'a> {
    pub sequence: &'a GradeSequence,
    /// Fiscal year of the base enrollment; the first projected year follows it.
    pub base_year: i32,
    pub base_enrollment: &'a GradeCounts,
    pub rates: &'a EffectiveRates,
    pub scenario: &'a ScenarioParams,
    pub class_sizes: &'a ClassSizeCatalog,
    pub overrides: &'a Overrides,
    pub school_max_capacity: u32,
    pub years: u32,
}

/// Decides how a capacity excess is taken out of incremental enrollment.
pub trait ReductionStrategy {
    fn name(&self) -> &'static str;

    /// Returns seats to remove per grade, in sequence order.
    ///
    /// Each cut must not exceed `incremental[i]` and the cuts must add up to
    /// `min(excess, sum(incremental))`.
    fn distribute(&self, grade_codes: &[&str], incremental: &[u32], excess: u32) -> Vec<u32>;
}

/// Cuts every grade in proportion to its incremental seats.
///
/// Uses largest-remainder apportionment; equal remainders go to the grade
/// that comes first in the sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPercentage;

impl ReductionStrategy for UniformPercentage {
    fn name(&self) -> &'static str {
        "uniform_percentage"
    }

    fn distribute(&self, _grade_codes: &[&str], incremental: &[u32], excess: u32) -> Vec<u32> {
        let total: u64 = incremental.iter().map(|seats| u64::from(*seats)).sum();
        if total == 0 || excess == 0 {
            return vec![0; incremental.len()];
        }
        let target = u64::from(excess).min(total);

        let mut cuts = Vec::with_capacity(incremental.len());
        let mut remainders = Vec::with_capacity(incremental.len());
        for (idx, seats) in incremental.iter().enumerate() {
            let share = target * u64::from(*seats);
            cuts.push(share / total);
            remainders.push((share % total, idx));
        }

        let mut left = target - cuts.iter().sum::<u64>();
        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        for (_, idx) in remainders {
            if left == 0 {
                break;
            }
            cuts[idx] += 1;
            left -= 1;
        }

        cuts.into_iter()
            .map(|cut| u32::try_from(cut).unwrap_or(u32::MAX))
            .collect()
    }
}

/// Empties incremental seats grade by grade.
///
/// Listed grades go first in the given order, the remaining grades follow
/// from the terminal grade backwards.
#[derive(Debug, Clone, Default)]
pub struct PriorityOrder {
    pub order: Vec<String>,
}

impl ReductionStrategy for PriorityOrder {
    fn name(&self) -> &'static str {
        "priority_order"
    }

    fn distribute(&self, grade_codes: &[&str], incremental: &[u32], excess: u32) -> Vec<u32> {
        let listed = self
            .order
            .iter()
            .filter_map(|code| grade_codes.iter().position(|candidate| candidate == code));
        let mut ranked: Vec<usize> = Vec::with_capacity(grade_codes.len());
        for idx in listed.chain((0..grade_codes.len()).rev()) {
            if !ranked.contains(&idx) {
                ranked.push(idx);
            }
        }

        let mut cuts = vec![0; incremental.len()];
        let mut left = excess;
        for idx in ranked {
            if left == 0 {
                break;
            }
            let cut = incremental.get(idx).copied().unwrap_or(0).min(left);
            cuts[idx] = cut;
            left -= cut;
        }
        cuts
    }
}

/// Rolls enrollment forward one year at a time from the base year.
///
/// Each year only reads the previous year's populations. Inputs are validated
/// up front and nothing is returned when validation fails.
#[instrument(
    skip_all,
    fields(years = input.years, capacity = input.school_max_capacity, strategy = strategy.name())
)]
pub fn project(
    input: &ProjectionInput,
    strategy: &dyn ReductionStrategy,
) -> Result<Vec<ProjectionYearResult>, ProjectionError> {
    validate(input)?;

    let mut populations: GradeCounts = input.base_enrollment.clone();
    let mut results = Vec::with_capacity(input.years as usize);
    for offset in 1..=input.years {
        let year = project_year(input, strategy, &populations, offset)?;
        populations = year
            .grades
            .iter()
            .map(|grade| (grade.grade_code.clone(), grade.projected_students))
            .collect();
        info!(
            fiscal_year = year.fiscal_year,
            total = year.total_students,
            constrained = year.was_capacity_constrained,
            "projected year"
        );
        results.push(year);
    }
    Ok(results)
}

/// Intake for a projected year: `ps_entry * (1 + growth)^offset` plus the global adjustment.
pub fn intake_for_year(
    scenario: &ScenarioParams,
    overrides: &Overrides,
    offset: u32,
) -> Result<u32, ProjectionError> {
    let growth = Decimal::ONE + scenario.entry_growth_rate;
    let entry = growth
        .checked_powi(i64::from(offset))
        .and_then(|factor| factor.checked_mul(Decimal::from(scenario.ps_entry)))
        .filter(|entry| *entry <= Decimal::from(u32::MAX))
        .ok_or(ProjectionError::IntakeOverflow { offset })?;
    let adjusted = i64::from(round_students(entry)) + i64::from(overrides.ps_entry_adjustment());
    u32::try_from(adjusted.max(0)).map_err(|_| ProjectionError::IntakeOverflow { offset })
}

/// Retained and lateral students flowing into a grade from its predecessor.
pub fn inflow(
    predecessor_population: u32,
    retention_rate: Decimal,
    lateral: LateralEntry,
) -> (u32, u32) {
    let predecessor = Decimal::from(predecessor_population);
    let retained = round_students(predecessor * retention_rate);
    let lateral = match lateral {
        LateralEntry::Percentage { rate } => round_students(predecessor * rate),
        LateralEntry::Fixed { count } => count,
    };
    (retained, lateral)
}

struct GradeDraft<'a> {
    code: &'a str,
    retained: u32,
    lateral: u32,
    config: ClassSizeConfig,
}

impl GradeDraft<'_> {
    fn projected(&self) -> u32 {
        self.retained.saturating_add(self.lateral)
    }

    /// Removes lateral seats first, then retained ones.
    fn clamp_to(&mut self, seat_limit: u32) {
        let overflow = self.projected().saturating_sub(seat_limit);
        let lateral_cut = overflow.min(self.lateral);
        self.lateral -= lateral_cut;
        self.retained -= (overflow - lateral_cut).min(self.retained);
    }
}

fn project_year(
    input: &ProjectionInput,
    strategy: &dyn ReductionStrategy,
    previous: &GradeCounts,
    offset: u32,
) -> Result<ProjectionYearResult, ProjectionError> {
    let mut drafts = Vec::with_capacity(input.sequence.len());
    for grade in input.sequence.grades() {
        let (retained, lateral) = match input.sequence.predecessor(&grade.code) {
            None => (0, intake_for_year(input.scenario, input.overrides, offset)?),
            Some(predecessor) => {
                let population = previous.get(&predecessor.code).copied().unwrap_or(0);
                match input.rates.get(&grade.code) {
                    Some(rate) => inflow(population, rate.retention_rate, rate.lateral),
                    None => (0, 0),
                }
            }
        };

        let mut draft = GradeDraft {
            code: &grade.code,
            retained,
            lateral,
            config: input.overrides.effective_class_size(
                &grade.code,
                input.sequence,
                input.class_sizes,
            ),
        };
        if let Some(limit) = input
            .overrides
            .seat_limit(&grade.code, input.sequence, input.class_sizes)
        {
            draft.clamp_to(limit);
        }
        debug!(
            grade = draft.code,
            retained = draft.retained,
            lateral = draft.lateral,
            "grade inflow"
        );
        drafts.push(draft);
    }

    let total = drafts
        .iter()
        .map(GradeDraft::projected)
        .fold(0u32, u32::saturating_add);
    let excess = total.saturating_sub(input.school_max_capacity);
    let cuts = if excess > 0 {
        let codes: Vec<&str> = drafts.iter().map(|draft| draft.code).collect();
        let incremental: Vec<u32> = drafts.iter().map(|draft| draft.lateral).collect();
        strategy
            .distribute(&codes, &incremental, excess)
            .into_iter()
            .zip(&incremental)
            .map(|(cut, seats)| cut.min(*seats))
            .collect()
    } else {
        vec![0; drafts.len()]
    };
    let removed: u32 = cuts.iter().sum();
    let unresolved_excess = excess.saturating_sub(removed);
    if unresolved_excess > 0 {
        warn!(
            excess,
            removed, "incremental enrollment cannot absorb the capacity excess"
        );
    }

    let grades: Vec<GradeProjection> = drafts
        .iter()
        .zip(&cuts)
        .map(|(draft, cut)| finalize_grade(draft, *cut))
        .collect();
    let fiscal_year = input.base_year + offset as i32;

    Ok(ProjectionYearResult {
        fiscal_year,
        school_year: school_year_label(fiscal_year),
        total_students: grades
            .iter()
            .map(|grade| grade.projected_students)
            .fold(0, u32::saturating_add),
        grades,
        was_capacity_constrained: excess > 0,
        unresolved_excess,
    })
}

fn finalize_grade(draft: &GradeDraft, cut: u32) -> GradeProjection {
    let original_projection = draft.projected();
    let lateral_students = draft.lateral - cut;
    let projected_students = draft.retained.saturating_add(lateral_students);
    let divisions = divisions_for(projected_students, &draft.config);
    let avg_class_size = if divisions == 0 {
        Decimal::ZERO
    } else {
        round_percent(Decimal::from(projected_students) / Decimal::from(divisions))
    };

    GradeProjection {
        grade_code: draft.code.to_string(),
        retained_students: draft.retained,
        lateral_students,
        projected_students,
        divisions,
        avg_class_size,
        original_projection,
        reduction_applied: cut,
        reduction_percentage: percent_of(cut, original_projection),
    }
}

/// `ceil(students / target)` bounded by the division cap, 0 for an empty grade.
pub fn divisions_for(students: u32, config: &ClassSizeConfig) -> u32 {
    if students == 0 {
        return 0;
    }
    students
        .div_ceil(config.target_class_size.max(1))
        .min(config.max_divisions)
}

fn validate(input: &ProjectionInput) -> Result<(), ProjectionError> {
    if input.years == 0 || input.years > MAX_PROJECTION_YEARS {
        return Err(ProjectionError::InvalidYears);
    }
    if input.school_max_capacity == 0 {
        return Err(ProjectionError::InvalidCapacity);
    }
    input.class_sizes.validate()?;
    if input.scenario.entry_growth_rate <= -Decimal::ONE {
        return Err(ProjectionError::InvalidGrowthRate(
            input.scenario.entry_growth_rate,
        ));
    }
    if input.scenario.lateral_multiplier < Decimal::ZERO {
        return Err(ProjectionError::NegativeMultiplier(
            input.scenario.lateral_multiplier,
        ));
    }
    // Intake only grows or only shrinks, so the last year bounds every earlier one.
    intake_for_year(input.scenario, input.overrides, input.years)?;

    for code in input.base_enrollment.keys() {
        if !input.sequence.contains(code) {
            return Err(ProjectionError::UnknownBaseGrade(code.clone()));
        }
    }

    for grade in input.sequence.grades() {
        if !input.base_enrollment.contains_key(&grade.code) {
            return Err(ProjectionError::MissingBaseGrade(grade.code.clone()));
        }
        if input.overrides.class_size_ceiling(&grade.code, input.sequence) == Some(0)
            || input.overrides.max_divisions(&grade.code, input.sequence) == Some(0)
        {
            return Err(ProjectionError::InvalidOverride(grade.code.clone()));
        }
        if input.sequence.is_intake(&grade.code) {
            continue;
        }

        let rate = input
            .rates
            .get(&grade.code)
            .ok_or_else(|| ProjectionError::MissingRate(grade.code.clone()))?;
        if !in_unit_interval(rate.retention_rate) {
            return Err(ProjectionError::RetentionOutOfRange {
                grade: grade.code.clone(),
                value: rate.retention_rate,
            });
        }
        if let LateralEntry::Percentage { rate: lateral } = rate.lateral {
            if lateral < Decimal::ZERO {
                return Err(ProjectionError::LateralRateOutOfRange {
                    grade: grade.code.clone(),
                    value: lateral,
                });
            }
        }
    }
    Ok(())
}

fn in_unit_interval(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}
