//! Dockerfile and Makefile generation.

use std::path::PathBuf;

use clap::Args;
use dbuilder_common::constants::{DEFAULT_CONFIGURATION_FILE, DEFAULT_OUTPUT_DIR};

/// Options controlling a generation run.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Configuration file path; may be given several times.
    #[arg(
        short = 'c',
        long = "configuration-file",
        value_name = "PATH",
        default_value = DEFAULT_CONFIGURATION_FILE
    )]
    pub configuration_files: Vec<PathBuf>,

    /// Output directory for Dockerfiles and the Makefile.
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

/// Renders every configured package and writes the Makefile.
///
/// # Errors
///
/// Returns an error if any configuration, registry, template or write step
/// fails; files already written are left in place.
pub fn execute(args: GenerateArgs) -> anyhow::Result<()> {
    tracing::info!(
        output_dir = %args.output_dir.display(),
        configurations = args.configuration_files.len(),
        "generating dockerfiles"
    );

    let report = dbuilder_manifest::generate(&args.output_dir, &args.configuration_files)?;
    println!("{}", crate::output::format_report(&report));
    Ok(())
}
