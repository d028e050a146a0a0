use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::class_size::{ClassSizeCatalog, ClassSizeConfig};
use crate::domain::grade::GradeSequence;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GlobalOverrides {
    pub ps_entry_adjustment: Option<i32>,
    pub retention_adjustment: Option<Decimal>,
    pub lateral_multiplier_override: Option<Decimal>,
    /// Seat ceiling per division applied to every grade.
    pub class_size_override: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LevelOverride {
    pub class_size_ceiling: Option<u32>,
    pub max_divisions: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GradeOverride {
    /// Manual rates only take part in rate resolution when this is set.
    #[serde(default)]
    pub use_manual_rates: bool,
    pub retention_rate: Option<Decimal>,
    /// A rate for entry-point grades, a headcount for incidental grades.
    pub lateral_entry: Option<Decimal>,
    pub max_divisions: Option<u32>,
    pub class_size_ceiling: Option<u32>,
}

impl GradeOverride {
    pub fn manual_retention(&self) -> Option<Decimal> {
        self.retention_rate.filter(|_| self.use_manual_rates)
    }

    pub fn manual_lateral(&self) -> Option<Decimal> {
        self.lateral_entry.filter(|_| self.use_manual_rates)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    #[serde(default)]
    pub global: Option<GlobalOverrides>,
    #[serde(default)]
    pub levels: BTreeMap<String, LevelOverride>,
    #[serde(default)]
    pub grades: BTreeMap<String, GradeOverride>,
}

impl Overrides {
    pub fn grade(&self, grade_code: &str) -> Option<&GradeOverride> {
        self.grades.get(grade_code)
    }

    pub fn ps_entry_adjustment(&self) -> i32 {
        self.global
            .as_ref()
            .and_then(|global| global.ps_entry_adjustment)
            .unwrap_or(0)
    }

    pub fn retention_adjustment(&self) -> Decimal {
        self.global
            .as_ref()
            .and_then(|global| global.retention_adjustment)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn lateral_multiplier(&self) -> Option<Decimal> {
        self.global
            .as_ref()
            .and_then(|global| global.lateral_multiplier_override)
    }

    /// Seat ceiling per division: grade, then level, then global.
    pub fn class_size_ceiling(&self, grade_code: &str, sequence: &GradeSequence) -> Option<u32> {
        self.grade(grade_code)
            .and_then(|grade| grade.class_size_ceiling)
            .or_else(|| self.level_of(grade_code, sequence)?.class_size_ceiling)
            .or_else(|| self.global.as_ref()?.class_size_override)
    }

    /// Division cap: grade, then level.
    pub fn max_divisions(&self, grade_code: &str, sequence: &GradeSequence) -> Option<u32> {
        self.grade(grade_code)
            .and_then(|grade| grade.max_divisions)
            .or_else(|| self.level_of(grade_code, sequence)?.max_divisions)
    }

    /// Class-size config for a grade with every applicable override folded in.
    pub fn effective_class_size(
        &self,
        grade_code: &str,
        sequence: &GradeSequence,
        catalog: &ClassSizeCatalog,
    ) -> ClassSizeConfig {
        catalog.resolve(grade_code, sequence).constrained(
            self.class_size_ceiling(grade_code, sequence),
            self.max_divisions(grade_code, sequence),
        )
    }

    /// Maximum seats for a grade, only when an override constrains it.
    pub fn seat_limit(
        &self,
        grade_code: &str,
        sequence: &GradeSequence,
        catalog: &ClassSizeCatalog,
    ) -> Option<u32> {
        let constrained = self.class_size_ceiling(grade_code, sequence).is_some()
            || self.max_divisions(grade_code, sequence).is_some();
        constrained.then(|| {
            self.effective_class_size(grade_code, sequence, catalog)
                .max_seats()
        })
    }

    fn level_of(&self, grade_code: &str, sequence: &GradeSequence) -> Option<&LevelOverride> {
        sequence
            .cycle_of(grade_code)
            .and_then(|cycle| self.levels.get(cycle))
    }
}
