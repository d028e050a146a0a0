use std::process::ExitCode;

use crate::commands::report_format::format_calibration_report;
use crate::services::forecast::run_calibration;
use crate::services::forecast_yaml::{load_forecast_input_from_yaml_file, write_yaml_file};

pub fn calibrate_command(input: &str, output: &str) -> ExitCode {
    let forecast_input = match load_forecast_input_from_yaml_file(input) {
        Ok(forecast_input) => forecast_input,
        Err(e) => {
            eprintln!("Failed to load forecast input: {e:?}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = run_calibration(&forecast_input);
    if let Err(e) = write_yaml_file(output, &outcome) {
        eprintln!("Failed to write calibration output: {e:?}");
        return ExitCode::FAILURE;
    }

    println!("{}", format_calibration_report(&outcome));
    println!("Calibration written to {output}");
    ExitCode::SUCCESS
}
