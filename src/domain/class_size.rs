use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::grade::GradeSequence;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClassSizeError {
    #[error("class size bounds for {scope} must be positive")]
    NonPositive { scope: String },
    #[error("class size bounds for {scope} need min <= target <= max ({min}/{target}/{max})")]
    Unordered {
        scope: String,
        min: u32,
        target: u32,
        max: u32,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassSizeConfig {
    pub min_class_size: u32,
    pub target_class_size: u32,
    pub max_class_size: u32,
    pub max_divisions: u32,
}

impl ClassSizeConfig {
    pub fn new(min: u32, target: u32, max: u32, max_divisions: u32) -> Self {
        Self {
            min_class_size: min,
            target_class_size: target,
            max_class_size: max,
            max_divisions,
        }
    }

    pub fn validate(&self, scope: &str) -> Result<(), ClassSizeError> {
        if self.min_class_size == 0
            || self.target_class_size == 0
            || self.max_class_size == 0
            || self.max_divisions == 0
        {
            return Err(ClassSizeError::NonPositive {
                scope: scope.to_string(),
            });
        }
        if self.min_class_size > self.target_class_size
            || self.target_class_size > self.max_class_size
        {
            return Err(ClassSizeError::Unordered {
                scope: scope.to_string(),
                min: self.min_class_size,
                target: self.target_class_size,
                max: self.max_class_size,
            });
        }
        Ok(())
    }

    /// Applies a seat ceiling per division and a division cap.
    ///
    /// The ceiling replaces `max_class_size`; `min` and `target` are pulled
    /// down to it when they exceed it.
    pub fn constrained(&self, class_size_ceiling: Option<u32>, max_divisions: Option<u32>) -> Self {
        let mut config = *self;
        if let Some(ceiling) = class_size_ceiling {
            config.max_class_size = ceiling;
            config.target_class_size = config.target_class_size.min(ceiling);
            config.min_class_size = config.min_class_size.min(ceiling);
        }
        if let Some(divisions) = max_divisions {
            config.max_divisions = divisions;
        }
        config
    }

    pub fn max_seats(&self) -> u32 {
        self.max_class_size.saturating_mul(self.max_divisions)
    }
}

impl Default for ClassSizeConfig {
    fn default() -> Self {
        Self::new(15, 25, 28, 4)
    }
}

/// Class-size settings resolved grade first, then cycle, then the school default.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ClassSizeCatalog {
    #[serde(default)]
    pub default: ClassSizeConfig,
    #[serde(default)]
    pub cycles: BTreeMap<String, ClassSizeConfig>,
    #[serde(default)]
    pub grades: BTreeMap<String, ClassSizeConfig>,
}

impl ClassSizeCatalog {
    pub fn uniform(config: ClassSizeConfig) -> Self {
        Self {
            default: config,
            ..Self::default()
        }
    }

    pub fn resolve(&self, grade_code: &str, sequence: &GradeSequence) -> ClassSizeConfig {
        if let Some(config) = self.grades.get(grade_code) {
            return *config;
        }
        sequence
            .cycle_of(grade_code)
            .and_then(|cycle| self.cycles.get(cycle))
            .copied()
            .unwrap_or(self.default)
    }

    pub fn validate(&self) -> Result<(), ClassSizeError> {
        self.default.validate("default")?;
        for (cycle, config) in &self.cycles {
            config.validate(cycle)?;
        }
        for (grade, config) in &self.grades {
            config.validate(grade)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_grade_then_cycle_then_default() {
        let sequence = GradeSequence::french_standard();
        let mut catalog = ClassSizeCatalog::uniform(ClassSizeConfig::new(15, 25, 28, 4));
        catalog
            .cycles
            .insert("LYCEE".to_string(), ClassSizeConfig::new(18, 30, 35, 6));
        catalog
            .grades
            .insert("TERM".to_string(), ClassSizeConfig::new(18, 32, 35, 5));

        assert_eq!(catalog.resolve("TERM", &sequence).target_class_size, 32);
        assert_eq!(catalog.resolve("1ERE", &sequence).target_class_size, 30);
        assert_eq!(catalog.resolve("CP", &sequence).target_class_size, 25);
    }

    #[test]
    fn validate_rejects_zero_and_unordered_bounds() {
        assert_eq!(
            ClassSizeConfig::new(0, 25, 28, 4).validate("default"),
            Err(ClassSizeError::NonPositive {
                scope: "default".to_string()
            })
        );
        assert!(matches!(
            ClassSizeConfig::new(15, 30, 28, 4).validate("CP"),
            Err(ClassSizeError::Unordered { .. })
        ));
        assert!(ClassSizeConfig::new(15, 25, 28, 4).validate("CP").is_ok());
    }

    #[test]
    fn constrained_applies_ceiling_and_division_cap() {
        let config = ClassSizeConfig::new(15, 25, 28, 4).constrained(Some(22), Some(3));
        assert_eq!(config.max_class_size, 22);
        assert_eq!(config.target_class_size, 22);
        assert_eq!(config.min_class_size, 15);
        assert_eq!(config.max_divisions, 3);
        assert_eq!(config.max_seats(), 66);
    }
}
