use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GradeSequenceError {
    #[error("grade sequence is empty")]
    Empty,
    #[error("grade code is empty")]
    EmptyCode,
    #[error("grade {0} has no cycle")]
    MissingCycle(String),
    #[error("grade {0} appears more than once")]
    DuplicateGrade(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GradeDefinition {
    pub code: String,
    pub cycle: String,
    #[serde(default)]
    pub entry_point: bool,
}

impl GradeDefinition {
    pub fn new(code: &str, cycle: &str, entry_point: bool) -> Self {
        Self {
            code: code.to_string(),
            cycle: cycle.to_string(),
            entry_point,
        }
    }
}

/// Ordered list of grades from the intake grade to the terminal grade.
///
/// The first grade has no predecessor and is fed by the scenario intake.
/// Every other grade is fed by the grade right before it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GradeSequence {
    grades: Vec<GradeDefinition>,
}

impl GradeSequence {
    pub fn new(grades: Vec<GradeDefinition>) -> Result<Self, GradeSequenceError> {
        if grades.is_empty() {
            return Err(GradeSequenceError::Empty);
        }
        for (idx, grade) in grades.iter().enumerate() {
            if grade.code.trim().is_empty() {
                return Err(GradeSequenceError::EmptyCode);
            }
            if grade.cycle.trim().is_empty() {
                return Err(GradeSequenceError::MissingCycle(grade.code.clone()));
            }
            if grades[..idx].iter().any(|other| other.code == grade.code) {
                return Err(GradeSequenceError::DuplicateGrade(grade.code.clone()));
            }
        }
        Ok(Self { grades })
    }

    /// French curriculum from petite section to terminale.
    pub fn french_standard() -> Self {
        let grades = vec![
            GradeDefinition::new("PS", "MATERNELLE", false),
            GradeDefinition::new("MS", "MATERNELLE", true),
            GradeDefinition::new("GS", "MATERNELLE", true),
            GradeDefinition::new("CP", "ELEMENTAIRE", true),
            GradeDefinition::new("CE1", "ELEMENTAIRE", false),
            GradeDefinition::new("CE2", "ELEMENTAIRE", false),
            GradeDefinition::new("CM1", "ELEMENTAIRE", false),
            GradeDefinition::new("CM2", "ELEMENTAIRE", false),
            GradeDefinition::new("6EME", "COLLEGE", true),
            GradeDefinition::new("5EME", "COLLEGE", false),
            GradeDefinition::new("4EME", "COLLEGE", false),
            GradeDefinition::new("3EME", "COLLEGE", false),
            GradeDefinition::new("2NDE", "LYCEE", true),
            GradeDefinition::new("1ERE", "LYCEE", false),
            GradeDefinition::new("TERM", "LYCEE", false),
        ];
        Self { grades }
    }

    pub fn grades(&self) -> &[GradeDefinition] {
        &self.grades
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.grades.iter().map(|grade| grade.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    pub fn position(&self, code: &str) -> Option<usize> {
        self.grades.iter().position(|grade| grade.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.position(code).is_some()
    }

    pub fn get(&self, code: &str) -> Option<&GradeDefinition> {
        self.grades.iter().find(|grade| grade.code == code)
    }

    pub fn predecessor(&self, code: &str) -> Option<&GradeDefinition> {
        match self.position(code)? {
            0 => None,
            idx => self.grades.get(idx - 1),
        }
    }

    pub fn cycle_of(&self, code: &str) -> Option<&str> {
        self.get(code).map(|grade| grade.cycle.as_str())
    }

    pub fn is_entry_point(&self, code: &str) -> bool {
        self.get(code).is_some_and(|grade| grade.entry_point)
    }

    pub fn first(&self) -> &GradeDefinition {
        &self.grades[0]
    }

    pub fn terminal(&self) -> &GradeDefinition {
        &self.grades[self.grades.len() - 1]
    }

    pub fn is_intake(&self, code: &str) -> bool {
        self.first().code == code
    }

    pub fn grades_in_cycle<'a>(
        &'a self,
        cycle: &'a str,
    ) -> impl Iterator<Item = &'a GradeDefinition> {
        self.grades.iter().filter(move |grade| grade.cycle == cycle)
    }

    /// Grades that have a predecessor and can therefore be calibrated.
    pub fn progression_grades(&self) -> impl Iterator<Item = (&GradeDefinition, &GradeDefinition)> {
        self.grades.windows(2).map(|pair| (&pair[1], &pair[0]))
    }
}

impl Default for GradeSequence {
    fn default() -> Self {
        Self::french_standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_standard_starts_with_ps_and_ends_with_term() {
        let sequence = GradeSequence::french_standard();
        assert_eq!(sequence.len(), 15);
        assert_eq!(sequence.first().code, "PS");
        assert_eq!(sequence.terminal().code, "TERM");
        assert!(sequence.is_intake("PS"));
    }

    #[test]
    fn predecessor_follows_sequence_order() {
        let sequence = GradeSequence::french_standard();
        assert_eq!(sequence.predecessor("CP").unwrap().code, "GS");
        assert_eq!(sequence.predecessor("6EME").unwrap().code, "CM2");
        assert!(sequence.predecessor("PS").is_none());
        assert!(sequence.predecessor("XYZ").is_none());
    }

    #[test]
    fn entry_points_are_cycle_transitions_and_funnel_grades() {
        let sequence = GradeSequence::french_standard();
        let entry_points: Vec<&str> = sequence
            .grades()
            .iter()
            .filter(|grade| grade.entry_point)
            .map(|grade| grade.code.as_str())
            .collect();
        assert_eq!(entry_points, vec!["MS", "GS", "CP", "6EME", "2NDE"]);
        assert!(!sequence.is_entry_point("CE1"));
    }

    #[test]
    fn progression_grades_pair_each_grade_with_its_predecessor() {
        let sequence = GradeSequence::french_standard();
        let pairs: Vec<(&str, &str)> = sequence
            .progression_grades()
            .map(|(grade, previous)| (grade.code.as_str(), previous.code.as_str()))
            .collect();
        assert_eq!(pairs.len(), 14);
        assert_eq!(pairs[0], ("MS", "PS"));
        assert_eq!(pairs[13], ("TERM", "1ERE"));
    }

    #[test]
    fn grades_in_cycle_keeps_order() {
        let sequence = GradeSequence::french_standard();
        let lycee: Vec<&str> = sequence
            .grades_in_cycle("LYCEE")
            .map(|grade| grade.code.as_str())
            .collect();
        assert_eq!(lycee, vec!["2NDE", "1ERE", "TERM"]);
        assert_eq!(sequence.cycle_of("5EME"), Some("COLLEGE"));
    }

    #[test]
    fn new_rejects_duplicates_and_empty_input() {
        assert_eq!(GradeSequence::new(vec![]), Err(GradeSequenceError::Empty));

        let duplicated = vec![
            GradeDefinition::new("A", "ONE", false),
            GradeDefinition::new("A", "ONE", false),
        ];
        assert_eq!(
            GradeSequence::new(duplicated),
            Err(GradeSequenceError::DuplicateGrade("A".to_string()))
        );

        let no_cycle = vec![GradeDefinition::new("A", " ", false)];
        assert_eq!(
            GradeSequence::new(no_cycle),
            Err(GradeSequenceError::MissingCycle("A".to_string()))
        );
    }
}
