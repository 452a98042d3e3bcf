//! CLI command definitions
//!
//! Defines the clap commands for the load test CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the LOGIN → CARS scenario and render the summary
    Run {
        /// Config file (TOML, or YAML by extension); defaults to ./loadtest.toml
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Number of virtual users (default: 2)
        #[arg(long)]
        vus: Option<usize>,

        /// Iterations per virtual user (default: 2)
        #[arg(long, short)]
        iterations: Option<usize>,

        /// Scheme and host of the API under test
        #[arg(long)]
        base_url: Option<String>,

        /// Log every response record at info level
        #[arg(long)]
        http_debug: bool,

        /// Also write the aggregated run data as JSON
        #[arg(long)]
        summary_export: Option<PathBuf>,
    },

    /// Render the summary again from a JSON export
    Report {
        /// JSON file written by `run --summary-export`
        input: PathBuf,

        /// Config file used for the HTML report destination
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_http_debug_help_names_info_level() {
        let cli = TestCli::command();
        let run = cli.find_subcommand("run").unwrap();
        let help = run
            .get_arguments()
            .find(|arg| arg.get_id() == "http_debug")
            .and_then(|arg| arg.get_help())
            .unwrap()
            .to_string();

        assert!(help.contains("info level"), "{}", help);
    }

    #[test]
    fn test_run_flags_parse() {
        let cli = TestCli::parse_from(["loadtest", "run", "--vus", "3", "-i", "5", "--http-debug"]);
        match cli.command {
            Commands::Run {
                vus,
                iterations,
                http_debug,
                ..
            } => {
                assert_eq!(vus, Some(3));
                assert_eq!(iterations, Some(5));
                assert!(http_debug);
            }
            Commands::Report { .. } => panic!("expected run"),
        }
    }
}
