//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    crate::logging::init(cli.verbose);

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args).await,
        Commands::Decode(args) => commands::decode::execute(&args),
        Commands::Encode(args) => commands::encode::execute(&args),
        Commands::Route(args) => commands::route::execute(args).await,
    }
}
