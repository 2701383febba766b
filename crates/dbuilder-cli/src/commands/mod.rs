//! CLI definition and dispatch.

pub mod generate;

use clap::Parser;

/// Dockerfile and build/push Makefile generator.
#[derive(Parser, Debug)]
#[command(name = "dbuilder", version, about, long_about = None)]
pub struct Cli {
    /// Generation options.
    #[command(flatten)]
    pub generate: generate::GenerateArgs,
}

/// Runs the parsed command line.
///
/// # Errors
///
/// Returns an error if generation fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    generate::execute(cli.generate)
}
