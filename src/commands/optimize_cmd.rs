use std::process::ExitCode;

use crate::commands::report_format::format_optimization_report;
use crate::services::forecast::{
    run_calibration, run_optimization, run_projection, run_rate_resolution,
};
use crate::services::forecast_yaml::{load_forecast_input_from_yaml_file, write_yaml_file};

pub fn optimize_command(input: &str, output: &str, year: u32) -> ExitCode {
    let forecast_input = match load_forecast_input_from_yaml_file(input) {
        Ok(forecast_input) => forecast_input,
        Err(e) => {
            eprintln!("Failed to load forecast input: {e:?}");
            return ExitCode::FAILURE;
        }
    };

    let calibration = run_calibration(&forecast_input);
    let rates = match run_rate_resolution(&forecast_input, &calibration) {
        Ok(rates) => rates,
        Err(e) => {
            eprintln!("Failed to resolve rates: {e:?}");
            return ExitCode::FAILURE;
        }
    };
    let projection = match run_projection(&forecast_input, &rates) {
        Ok(projection) => projection,
        Err(e) => {
            eprintln!("Failed to project enrollment: {e:?}");
            return ExitCode::FAILURE;
        }
    };
    let report = match run_optimization(&forecast_input, &rates, &projection, year) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Failed to optimize lateral entries: {e:?}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = write_yaml_file(output, &report) {
        eprintln!("Failed to write optimization output: {e:?}");
        return ExitCode::FAILURE;
    }

    println!("{}", format_optimization_report(&report));
    println!("Optimization for year {year} written to {output}");
    ExitCode::SUCCESS
}
