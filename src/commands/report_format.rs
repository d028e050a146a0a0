use rust_decimal::Decimal;

use crate::domain::calibration::{CalibrationOutcome, Confidence};
use crate::domain::optimization::OptimizationReport;
use crate::domain::projection::ProjectionYearResult;
use crate::domain::rates::{EffectiveRates, LateralEntry, RateSource};

pub fn format_calibration_report(outcome: &CalibrationOutcome) -> String {
    let years = outcome
        .years_available
        .iter()
        .map(|year| year.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = Vec::new();
    lines.push("Calibration Report".to_string());
    lines.push(format!("Years available: {years}"));
    lines.push(format!(
        "Status: {}",
        if outcome.success {
            "calibrated"
        } else {
            "insufficient data, document defaults apply"
        }
    ));
    lines.push(String::new());
    lines.push("Grade | N-1 | N-2 | Weighted | Retention | Lateral | Confidence".to_string());
    lines.push("------|-----|-----|----------|-----------|---------|-----------".to_string());
    for result in outcome.grades.values() {
        lines.push(format!(
            "{} | {} | {} | {} | {} | {} | {}",
            result.grade_code,
            optional(result.progression_n1),
            optional(result.progression_n2),
            result.weighted_progression,
            result.retention_rate,
            result.lateral_entry_rate,
            confidence_label(result.confidence)
        ));
    }
    for missing in &outcome.missing {
        let years = missing
            .missing_years
            .iter()
            .map(|year| year.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("Missing {}: no data for {years}", missing.grade_code));
    }

    lines.join("\n")
}

pub fn format_rates_report(rates: &EffectiveRates) -> String {
    let mut lines = Vec::new();
    lines.push("Effective Rates".to_string());
    lines.push("Grade | Retention | Lateral | Source | Confidence".to_string());
    lines.push("------|-----------|---------|--------|-----------".to_string());
    for rate in rates.values() {
        let lateral = match rate.lateral {
            LateralEntry::Percentage { rate } => format!("{rate} rate"),
            LateralEntry::Fixed { count } => format!("{count} students"),
        };
        lines.push(format!(
            "{} | {} | {} | {} | {}",
            rate.grade_code,
            rate.retention_rate,
            lateral,
            source_label(rate.source),
            confidence_label(rate.confidence)
        ));
    }
    lines.join("\n")
}

pub fn format_projection_report(
    school: &str,
    projection: &[ProjectionYearResult],
    school_max_capacity: u32,
) -> String {
    let mut lines = Vec::new();
    lines.push("Projection Report".to_string());
    lines.push(format!("School: {school}"));
    lines.push(format!("Capacity: {school_max_capacity}"));
    lines.push(String::new());
    lines.push("Year | Students | Divisions | Reduced | Unresolved".to_string());
    lines.push("-----|----------|-----------|---------|-----------".to_string());
    for year in projection {
        let reduced: u32 = year.grades.iter().map(|grade| grade.reduction_applied).sum();
        lines.push(format!(
            "{} | {} | {} | {} | {}",
            year.school_year,
            year.total_students,
            year.total_divisions(),
            reduced,
            year.unresolved_excess
        ));
    }
    lines.join("\n")
}

pub fn format_optimization_report(report: &OptimizationReport) -> String {
    let summary = &report.summary;
    let mut lines = Vec::new();
    lines.push("Lateral Entry Optimization".to_string());
    lines.push("Grade | Retained | Demand | Decision | Accepted | Rejected | Classes".to_string());
    lines.push("------|----------|--------|----------|----------|----------|--------".to_string());
    for grade in &report.grades {
        lines.push(format!(
            "{} | {} | {} | {} | {} | {} | {}",
            grade.grade_code,
            grade.retained_students,
            grade.historical_demand,
            grade.decision.label(),
            grade.accepted,
            grade.rejected,
            grade.final_classes
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "Demand: {} (entry points {}, incidental {})",
        summary.total_demand, summary.entry_point_demand, summary.incidental_demand
    ));
    lines.push(format!(
        "Accepted: {} | Rejected: {} | Acceptance: {}%",
        summary.total_accepted, summary.total_rejected, summary.acceptance_percentage
    ));
    lines.join("\n")
}

fn optional(value: Option<Decimal>) -> String {
    value.map(|value| value.to_string()).unwrap_or_else(|| "n/a".to_string())
}

fn confidence_label(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::Low => "low",
        Confidence::Medium => "medium",
        Confidence::High => "high",
    }
}

fn source_label(source: RateSource) -> &'static str {
    match source {
        RateSource::Override => "override",
        RateSource::Calibrated => "calibrated",
        RateSource::DocumentDefault => "document",
        RateSource::ScenarioDefault => "scenario",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::optimization::Decision;
    use crate::services::calibration::calibrate_grade;
    use crate::services::lateral_optimizer::optimize_grade;
    use crate::domain::calibration::{CalibrationSettings, MissingCalibration};
    use crate::domain::class_size::ClassSizeConfig;
    use crate::domain::projection::{GradeProjection, school_year_label};
    use crate::test_support::{calibration_outcome, demand, effective_rate};
    use rust_decimal_macros::dec;

    #[test]
    fn calibration_report_lists_grades_and_gaps() {
        let settings = CalibrationSettings::default();
        let result = calibrate_grade("CE1", Some(dec!(0.95)), None, &settings).unwrap();
        let mut outcome = calibration_outcome(vec![result]);
        outcome.missing.push(MissingCalibration {
            grade_code: "CE2".to_string(),
            missing_years: vec![2023],
        });

        let output = format_calibration_report(&outcome);
        assert!(output.contains("Calibration Report"));
        assert!(output.contains("Years available: 2023, 2024, 2025"));
        assert!(output.contains("CE1 | 0.95 | n/a | 0.9500 | 0.9500 | 0.0000 | medium"));
        assert!(output.contains("Missing CE2: no data for 2023"));
    }

    #[test]
    fn rates_report_shows_lateral_kind() {
        let rates = EffectiveRates::from([
            (
                "CP".to_string(),
                effective_rate("CP", dec!(0.95), LateralEntry::Percentage { rate: dec!(0.06) }),
            ),
            (
                "CE1".to_string(),
                effective_rate("CE1", dec!(0.97), LateralEntry::Fixed { count: 2 }),
            ),
        ]);
        let output = format_rates_report(&rates);
        assert!(output.contains("CP | 0.95 | 0.06 rate | document | low"));
        assert!(output.contains("CE1 | 0.97 | 2 students | document | low"));
    }

    #[test]
    fn projection_report_has_one_row_per_year() {
        let year = ProjectionYearResult {
            fiscal_year: 2026,
            school_year: school_year_label(2026),
            grades: vec![GradeProjection {
                grade_code: "PS".to_string(),
                retained_students: 0,
                lateral_students: 40,
                projected_students: 40,
                divisions: 2,
                avg_class_size: dec!(20.00),
                original_projection: 45,
                reduction_applied: 5,
                reduction_percentage: dec!(11.11),
            }],
            was_capacity_constrained: true,
            total_students: 40,
            unresolved_excess: 0,
        };
        let output = format_projection_report("Ecole Demo", &[year], 40);
        assert!(output.contains("School: Ecole Demo"));
        assert!(output.contains("Capacity: 40"));
        assert!(output.contains("2026-2027 | 40 | 2 | 5 | 0"));
    }

    #[test]
    fn optimization_report_includes_decisions_and_summary() {
        let config = ClassSizeConfig::new(15, 25, 28, 5);
        let result = optimize_grade(&demand("CE1", 120, 30), &config);
        let report = OptimizationReport::new(vec![result]);
        assert_eq!(report.grades[0].decision, Decision::Restricted);

        let output = format_optimization_report(&report);
        assert!(output.contains("CE1 | 120 | 30 | RESTRICTED | 20 | 10 | 5"));
        assert!(output.contains("Accepted: 20 | Rejected: 10 | Acceptance: 66.67%"));
    }
}
