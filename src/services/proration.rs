//! Converts academic-year headcounts into fiscal-year averages.
//!
//! A fiscal year overlaps two academic years. Each grade's fiscal figure is
//! the month-weighted blend of the academic year in progress when the fiscal
//! year opens and the one that starts during it.

use std::collections::BTreeMap;

use chrono::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::enrollment::GradeCounts;
use crate::domain::projection::ProjectionYearResult;
use crate::domain::rounding::round_percent;

const MONTHS_PER_YEAR: u32 = 12;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalCalendar {
    #[serde(serialize_with = "month_name")]
    pub fiscal_year_start: Month,
    #[serde(serialize_with = "month_name")]
    pub academic_year_start: Month,
}

fn month_name<S: Serializer>(month: &Month, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(month.name())
}

impl Default for FiscalCalendar {
    fn default() -> Self {
        Self {
            fiscal_year_start: Month::January,
            academic_year_start: Month::September,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProrationWeights {
    /// Fiscal months still covered by the academic year in progress.
    pub prior_months: u32,
    pub next_months: u32,
}

impl FiscalCalendar {
    pub fn weights(&self) -> ProrationWeights {
        let fiscal = self.fiscal_year_start.number_from_month();
        let academic = self.academic_year_start.number_from_month();
        let prior_months = (academic + MONTHS_PER_YEAR - fiscal) % MONTHS_PER_YEAR;
        ProrationWeights {
            prior_months,
            next_months: MONTHS_PER_YEAR - prior_months,
        }
    }

    /// Starting years of the academic years blended into `fiscal_year`.
    pub fn academic_years_for(&self, fiscal_year: i32) -> (i32, i32) {
        let fiscal_start = self.fiscal_year_start.number_from_month();
        if fiscal_start <= self.academic_year_start.number_from_month() {
            (fiscal_year - 1, fiscal_year)
        } else {
            (fiscal_year, fiscal_year + 1)
        }
    }
}

pub fn prorate(prior: u32, next: u32, weights: ProrationWeights) -> Decimal {
    let twelve = Decimal::from(MONTHS_PER_YEAR);
    round_percent(
        Decimal::from(prior) * Decimal::from(weights.prior_months) / twelve
            + Decimal::from(next) * Decimal::from(weights.next_months) / twelve,
    )
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FiscalYearEnrollment {
    pub fiscal_year: i32,
    pub grades: BTreeMap<String, Decimal>,
    pub total: Decimal,
}

/// Fiscal-year figures for every fiscal year covered by two known academic years.
///
/// `base` is the academic year starting in `base_year`; each projection
/// result is the academic year starting in its `fiscal_year`.
pub fn prorate_projection(
    base_year: i32,
    base: &GradeCounts,
    results: &[ProjectionYearResult],
    calendar: &FiscalCalendar,
) -> Vec<FiscalYearEnrollment> {
    let mut academic: BTreeMap<i32, GradeCounts> = BTreeMap::new();
    academic.insert(base_year, base.clone());
    for result in results {
        academic.insert(
            result.fiscal_year,
            result
                .grades
                .iter()
                .map(|grade| (grade.grade_code.clone(), grade.projected_students))
                .collect(),
        );
    }

    let weights = calendar.weights();
    let (first, last) = match (academic.keys().next(), academic.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };

    (first..=last + 1)
        .filter_map(|fiscal_year| {
            let (prior_year, next_year) = calendar.academic_years_for(fiscal_year);
            let prior = academic.get(&prior_year)?;
            let next = academic.get(&next_year)?;
            Some(blend(fiscal_year, prior, next, weights))
        })
        .collect()
}

fn blend(
    fiscal_year: i32,
    prior: &GradeCounts,
    next: &GradeCounts,
    weights: ProrationWeights,
) -> FiscalYearEnrollment {
    let grades: BTreeMap<String, Decimal> = prior
        .keys()
        .chain(next.keys())
        .map(|code| {
            let value = prorate(
                prior.get(code).copied().unwrap_or(0),
                next.get(code).copied().unwrap_or(0),
                weights,
            );
            (code.clone(), value)
        })
        .collect();
    let total = grades.values().copied().sum();
    FiscalYearEnrollment {
        fiscal_year,
        grades,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::projection::{GradeProjection, school_year_label};
    use crate::test_support::counts;
    use rust_decimal_macros::dec;

    fn year(fiscal_year: i32, grades: &[(&str, u32)]) -> ProjectionYearResult {
        let grades: Vec<GradeProjection> = grades
            .iter()
            .map(|(code, students)| GradeProjection {
                grade_code: code.to_string(),
                retained_students: *students,
                lateral_students: 0,
                projected_students: *students,
                divisions: 1,
                avg_class_size: Decimal::from(*students),
                original_projection: *students,
                reduction_applied: 0,
                reduction_percentage: Decimal::ZERO,
            })
            .collect();
        ProjectionYearResult {
            fiscal_year,
            school_year: school_year_label(fiscal_year),
            total_students: grades.iter().map(|grade| grade.projected_students).sum(),
            grades,
            was_capacity_constrained: false,
            unresolved_excess: 0,
        }
    }

    #[test]
    fn default_calendar_splits_eight_and_four_months() {
        let weights = FiscalCalendar::default().weights();
        assert_eq!(weights.prior_months, 8);
        assert_eq!(weights.next_months, 4);
    }

    #[test]
    fn aligned_calendars_use_only_the_starting_year() {
        let calendar = FiscalCalendar {
            fiscal_year_start: Month::September,
            academic_year_start: Month::September,
        };
        let weights = calendar.weights();
        assert_eq!(weights.prior_months, 0);
        assert_eq!(weights.next_months, 12);
        assert_eq!(prorate(100, 120, weights), dec!(120.00));
    }

    #[test]
    fn fiscal_year_after_academic_start_spans_the_following_year() {
        let calendar = FiscalCalendar {
            fiscal_year_start: Month::October,
            academic_year_start: Month::September,
        };
        assert_eq!(calendar.weights().prior_months, 11);
        assert_eq!(calendar.academic_years_for(2026), (2026, 2027));
        assert_eq!(FiscalCalendar::default().academic_years_for(2026), (2025, 2026));
    }

    #[test]
    fn prorate_rounds_to_two_places() {
        let weights = FiscalCalendar::default().weights();
        // 100 * 8/12 + 110 * 4/12 = 103.333...
        assert_eq!(prorate(100, 110, weights), dec!(103.33));
    }

    #[test]
    fn projection_is_blended_starting_from_the_base_year() {
        let base = counts(&[("A", 90), ("B", 60)]);
        let results = vec![
            year(2026, &[("A", 120), ("B", 90)]),
            year(2027, &[("A", 120), ("B", 120)]),
        ];
        let fiscal = prorate_projection(2025, &base, &results, &FiscalCalendar::default());

        assert_eq!(fiscal.len(), 2);
        assert_eq!(fiscal[0].fiscal_year, 2026);
        assert_eq!(fiscal[0].grades["A"], dec!(100.00));
        assert_eq!(fiscal[0].grades["B"], dec!(70.00));
        assert_eq!(fiscal[0].total, dec!(170.00));
        assert_eq!(fiscal[1].fiscal_year, 2027);
        assert_eq!(fiscal[1].grades["B"], dec!(100.00));
    }

    #[test]
    fn nothing_to_blend_without_projected_years() {
        let fiscal =
            prorate_projection(2025, &counts(&[("A", 1)]), &[], &FiscalCalendar::default());
        assert!(fiscal.is_empty());
    }
}
