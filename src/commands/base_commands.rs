use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(author, version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Calibrate retention and lateral-entry rates from historical enrollment
    Calibrate {
        /// Forecast input YAML file
        #[arg(short, long)]
        input: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
    },
    /// Resolve the effective rate of every grade
    Rates {
        /// Forecast input YAML file
        #[arg(short, long)]
        input: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
    },
    /// Project enrollment over the planning horizon
    Project {
        /// Forecast input YAML file
        #[arg(short, long)]
        input: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
    },
    /// Decide how many lateral entries each grade can take in a projected year
    Optimize {
        /// Forecast input YAML file
        #[arg(short, long)]
        input: String,
        /// Output YAML file
        #[arg(short, long)]
        output: String,
        /// Projected year to optimize, starting at 1
        #[arg(short, long, default_value_t = 1)]
        year: u32,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimize_defaults_to_first_projected_year() {
        let args = CliArgs::parse_from([
            "enrollment-forecasts",
            "optimize",
            "-i",
            "input.yaml",
            "-o",
            "output.yaml",
        ]);

        if let Commands::Optimize { year, .. } = args.command {
            assert_eq!(year, 1);
        } else {
            panic!("expected optimize command");
        }
    }

    #[test]
    fn optimize_accepts_a_year() {
        let args = CliArgs::parse_from([
            "enrollment-forecasts",
            "optimize",
            "-i",
            "input.yaml",
            "-o",
            "output.yaml",
            "--year",
            "3",
        ]);

        if let Commands::Optimize { year, input, .. } = args.command {
            assert_eq!(year, 3);
            assert_eq!(input, "input.yaml");
        } else {
            panic!("expected optimize command");
        }
    }

    #[test]
    fn project_requires_an_output() {
        let result =
            CliArgs::try_parse_from(["enrollment-forecasts", "project", "-i", "input.yaml"]);
        assert!(result.is_err());
    }
}
