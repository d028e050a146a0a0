use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GradeProjection {
    pub grade_code: String,
    pub retained_students: u32,
    pub lateral_students: u32,
    pub projected_students: u32,
    pub divisions: u32,
    pub avg_class_size: Decimal,
    pub original_projection: u32,
    pub reduction_applied: u32,
    pub reduction_percentage: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProjectionYearResult {
    pub fiscal_year: i32,
    pub school_year: String,
    pub grades: Vec<GradeProjection>,
    pub was_capacity_constrained: bool,
    pub total_students: u32,
    /// Excess left over when incremental enrollment could not absorb the cut.
    pub unresolved_excess: u32,
}

impl ProjectionYearResult {
    pub fn grade(&self, grade_code: &str) -> Option<&GradeProjection> {
        self.grades.iter().find(|grade| grade.grade_code == grade_code)
    }

    pub fn total_divisions(&self) -> u32 {
        self.grades.iter().map(|grade| grade.divisions).sum()
    }
}

/// `"2026-2027"` for the academic year that starts in `fiscal_year`.
pub fn school_year_label(fiscal_year: i32) -> String {
    format!("{}-{}", fiscal_year, fiscal_year + 1)
}
