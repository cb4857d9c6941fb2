//! hat CLI - asset quality-assurance checks and slug renaming
//!
//! Runs the check catalog against saved scenes, manages slug renames and
//! validates asset folder layouts from the command line.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging; RUST_LOG overrides the verbosity flag
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();

    // Execute command
    match cli.command {
        Commands::Check(args) => {
            cli::check_command(args, config).await?;
        }
        Commands::Report(args) => {
            cli::report_command(args, config).await?;
        }
        Commands::Rename(args) => {
            cli::rename_command(args, config).await?;
        }
        Commands::ListChecks => {
            cli::list_checks(config).await?;
        }
        Commands::Checklist(args) => {
            cli::checklist_command(args, config).await?;
        }
        Commands::FolderStructure(args) => {
            cli::folder_structure_command(args, config).await?;
        }
        Commands::FixImageNames(args) => {
            cli::fix_image_names_command(args).await?;
        }
        Commands::Scrub(args) => {
            cli::scrub_command(args).await?;
        }
        Commands::PrintDefaultConfig => {
            cli::print_default_config().await?;
        }
        Commands::InitConfig(args) => {
            cli::init_config(args).await?;
        }
        Commands::ValidateConfig(args) => {
            cli::validate_config(args).await?;
        }
    }

    Ok(())
}
