//! Load test CLI for the qatools cars API
//!
//! Runs virtual users against the login and cars endpoints and renders an
//! HTML report plus a console summary.

use clap::Parser;
use loadtest::common::logging;
use loadtest::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "loadtest", about = "Load test for the qatools login and cars API")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    logging::init_cli();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
