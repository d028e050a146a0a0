use std::process::ExitCode;

use clap::Parser;
use enrollment_forecasts::commands::base_commands::{CliArgs, Commands};
use enrollment_forecasts::commands::calibrate_cmd::calibrate_command;
use enrollment_forecasts::commands::completions_cmd::completions_command;
use enrollment_forecasts::commands::optimize_cmd::optimize_command;
use enrollment_forecasts::commands::project_cmd::project_command;
use enrollment_forecasts::commands::rates_cmd::rates_command;
use enrollment_forecasts::logging;

fn main() -> ExitCode {
    logging::init();
    let args = CliArgs::parse();
    match args.command {
        Commands::Calibrate { input, output } => calibrate_command(&input, &output),
        Commands::Rates { input, output } => rates_command(&input, &output),
        Commands::Project { input, output } => project_command(&input, &output),
        Commands::Optimize {
            input,
            output,
            year,
        } => optimize_command(&input, &output, year),
        Commands::Completions { shell } => completions_command(shell),
    }
}
