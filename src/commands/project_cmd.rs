use std::process::ExitCode;

use crate::commands::report_format::format_projection_report;
use crate::services::forecast::run_forecast;
use crate::services::forecast_yaml::{load_forecast_input_from_yaml_file, write_yaml_file};
use crate::services::projection_plot::write_projection_png;

pub fn project_command(input: &str, output: &str) -> ExitCode {
    let forecast_input = match load_forecast_input_from_yaml_file(input) {
        Ok(forecast_input) => forecast_input,
        Err(e) => {
            eprintln!("Failed to load forecast input: {e:?}");
            return ExitCode::FAILURE;
        }
    };

    let report = match run_forecast(&forecast_input) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Failed to run forecast: {e:?}");
            return ExitCode::FAILURE;
        }
    };

    let chart_path = format!("{output}.png");
    let chart_written = match write_projection_png(
        &chart_path,
        &report.projection,
        forecast_input.school_max_capacity,
    ) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Failed to write projection chart: {e:?}");
            false
        }
    };

    if let Err(e) = write_yaml_file(output, &report) {
        eprintln!("Failed to write projection output: {e:?}");
        return ExitCode::FAILURE;
    }

    println!(
        "{}",
        format_projection_report(
            &report.school,
            &report.projection,
            forecast_input.school_max_capacity
        )
    );
    println!("Projection written to {output}");
    if chart_written {
        println!("Projection chart written to {chart_path}");
    }
    ExitCode::SUCCESS
}
