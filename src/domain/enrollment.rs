use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Headcount per grade for one fiscal year.
pub type GradeCounts = BTreeMap<String, u32>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoricalEnrollmentYear {
    pub fiscal_year: i32,
    pub grades: GradeCounts,
}

impl HistoricalEnrollmentYear {
    pub fn total(&self) -> u32 {
        self.grades.values().sum()
    }

    pub fn has_data(&self) -> bool {
        self.total() > 0
    }

    pub fn count(&self, grade_code: &str) -> Option<u32> {
        self.grades.get(grade_code).copied()
    }
}
