use std::process::ExitCode;

use crate::commands::report_format::format_rates_report;
use crate::services::forecast::{run_calibration, run_rate_resolution};
use crate::services::forecast_yaml::{load_forecast_input_from_yaml_file, write_yaml_file};

pub fn rates_command(input: &str, output: &str) -> ExitCode {
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

    if let Err(e) = write_yaml_file(output, &rates) {
        eprintln!("Failed to write rates output: {e:?}");
        return ExitCode::FAILURE;
    }

    println!("{}", format_rates_report(&rates));
    println!("Effective rates written to {output}");
    ExitCode::SUCCESS
}
