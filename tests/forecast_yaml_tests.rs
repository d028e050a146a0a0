use assert_fs::prelude::*;
use rust_decimal_macros::dec;

use enrollment_forecasts::services::forecast::run_forecast;
use enrollment_forecasts::services::forecast_yaml::{
    ReductionStrategyKind, load_forecast_input_from_yaml_file,
};

const SCHOOL_YAML: &str = include_str!("fixtures/school.yaml");

#[test]
fn loads_forecast_input_and_runs_the_pipeline() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("school.yaml").write_str(SCHOOL_YAML).unwrap();

    let input =
        load_forecast_input_from_yaml_file(temp.child("school.yaml").path().to_str().unwrap())
            .unwrap();
    assert_eq!(input.scenario.lateral_multiplier, dec!(1.50));
    assert_eq!(input.settings.reduction, ReductionStrategyKind::UniformPercentage);
    assert_eq!(input.class_sizes.cycles["LYCEE"].target_class_size, 30);

    let report = run_forecast(&input).unwrap();
    assert_eq!(report.projection.len(), 3);
    for year in &report.projection {
        assert!(year.total_students <= 600 || year.unresolved_excess > 0);
        for grade in &year.grades {
            assert_eq!(
                grade.projected_students,
                grade.retained_students + grade.lateral_students
            );
        }
    }
    let summary = &report.optimization.summary;
    assert_eq!(
        summary.total_accepted + summary.total_rejected,
        summary.total_demand
    );
}
