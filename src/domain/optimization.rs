use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::rounding::percent_of;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    AcceptAll,
    FillToMax,
    OpenNewClass,
    Restricted,
    AtCeiling,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Decision::AcceptAll => "ACCEPT_ALL",
            Decision::FillToMax => "FILL_TO_MAX",
            Decision::OpenNewClass => "OPEN_NEW_CLASS",
            Decision::Restricted => "RESTRICTED",
            Decision::AtCeiling => "AT_CEILING",
        }
    }
}

/// Inputs for one grade: who stays and who asks to come in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GradeDemand {
    pub grade_code: String,
    pub is_entry_point: bool,
    pub retained_students: u32,
    pub historical_demand: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GradeOptimizationResult {
    pub grade_code: String,
    pub is_entry_point: bool,
    pub retained_students: u32,
    pub historical_demand: u32,
    pub base_classes: u32,
    pub fill_to_target: u32,
    pub fill_to_max: u32,
    pub new_class_threshold: Option<u32>,
    pub decision: Decision,
    pub accepted: u32,
    pub rejected: u32,
    pub final_classes: u32,
    pub final_students: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NewStudentsSummary {
    pub total_demand: u32,
    pub total_accepted: u32,
    pub total_rejected: u32,
    pub entry_point_demand: u32,
    pub entry_point_accepted: u32,
    pub entry_point_rejected: u32,
    pub incidental_demand: u32,
    pub incidental_accepted: u32,
    pub incidental_rejected: u32,
    pub grades_accept_all: u32,
    pub grades_fill_to_max: u32,
    pub grades_open_new_class: u32,
    pub grades_restricted: u32,
    pub grades_at_ceiling: u32,
    pub acceptance_percentage: Decimal,
}

impl NewStudentsSummary {
    pub fn from_results(results: &[GradeOptimizationResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total_demand += result.historical_demand;
            summary.total_accepted += result.accepted;
            summary.total_rejected += result.rejected;
            if result.is_entry_point {
                summary.entry_point_demand += result.historical_demand;
                summary.entry_point_accepted += result.accepted;
                summary.entry_point_rejected += result.rejected;
            } else {
                summary.incidental_demand += result.historical_demand;
                summary.incidental_accepted += result.accepted;
                summary.incidental_rejected += result.rejected;
            }
            match result.decision {
                Decision::AcceptAll => summary.grades_accept_all += 1,
                Decision::FillToMax => summary.grades_fill_to_max += 1,
                Decision::OpenNewClass => summary.grades_open_new_class += 1,
                Decision::Restricted => summary.grades_restricted += 1,
                Decision::AtCeiling => summary.grades_at_ceiling += 1,
            }
        }
        summary.acceptance_percentage = if summary.total_demand == 0 {
            Decimal::ONE_HUNDRED
        } else {
            percent_of(summary.total_accepted, summary.total_demand)
        };
        summary
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OptimizationReport {
    pub grades: Vec<GradeOptimizationResult>,
    pub summary: NewStudentsSummary,
}

impl OptimizationReport {
    pub fn new(grades: Vec<GradeOptimizationResult>) -> Self {
        let summary = NewStudentsSummary::from_results(&grades);
        Self { grades, summary }
    }
}
