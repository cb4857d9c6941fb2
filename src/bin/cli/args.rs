//! CLI Argument Structures
//!
//! Argument definitions and command structures for the `hat` binary. One
//! subcommand per host command.

use clap::{Args, Parser, Subcommand, ValueEnum};
use hat_rs::AssetType;
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Asset quality-assurance checks and slug renaming
#[derive(Parser)]
#[command(name = "hat")]
#[command(version = VERSION)]
#[command(about = "Asset quality-assurance checks for asset library submissions")]
#[command(long_about = "
Run the asset checks against a saved scene, rename an asset's slug across
its textures, datablocks, save file and folder, and validate the asset folder
layout.

Common Usage:

  # Run every check and show the report
  hat check rock_01/rock_01.blend

  # Gate a submission: exit with status 1 when any check errors
  hat check --fail-on-error rock_01/rock_01.blend

  # Preview, then apply, a slug rename
  hat rename rock_01/rock_01.blend --to rock_02
  hat rename rock_01/rock_01.blend --to rock_02 --apply

  # Refresh the README checklist
  hat checklist --readme README.md
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to .hat.yml or .hat.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every check against a scene
    Check(CheckArgs),

    /// Show the report stored by the last check run
    Report(ReportArgs),

    /// Preview or apply a slug rename
    Rename(RenameArgs),

    /// List the discovered checks
    #[command(name = "list-checks")]
    ListChecks,

    /// Print the README checklist, or rewrite it in place
    Checklist(ChecklistArgs),

    /// Validate the layout of the asset folder
    #[command(name = "folder-structure")]
    FolderStructure(FolderStructureArgs),

    /// Rename image datablocks after their files
    #[command(name = "fix-image-names")]
    FixImageNames(SceneArgs),

    /// Remove datablocks that have no users
    Scrub(SceneArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Coloured, human-readable output
    Pretty,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
pub struct SceneArgs {
    /// Scene save file
    #[arg(value_name = "SCENE")]
    pub scene: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Scene save file
    #[arg(value_name = "SCENE")]
    pub scene: PathBuf,

    /// Run as triggered by a save: skip the unsaved-changes check and stay
    /// quiet when everything passes
    #[arg(long)]
    pub on_save: bool,

    /// Override the asset type stored in the scene
    #[arg(long, value_enum)]
    pub asset_type: Option<AssetType>,

    /// Exit with status 1 when any check reports an error
    #[arg(long)]
    pub fail_on_error: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write the report into the scene file
    #[arg(long)]
    pub persist: bool,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Scene save file
    #[arg(value_name = "SCENE")]
    pub scene: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Scene save file
    #[arg(value_name = "SCENE")]
    pub scene: PathBuf,

    /// New slug
    #[arg(long, value_name = "SLUG")]
    pub to: String,

    /// Execute the rename instead of previewing it
    #[arg(long)]
    pub apply: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct ChecklistArgs {
    /// README to update in place; prints the checklist when omitted
    #[arg(long, value_name = "FILE")]
    pub readme: Option<PathBuf>,
}

#[derive(Args)]
pub struct FolderStructureArgs {
    /// Scene save file
    #[arg(value_name = "SCENE")]
    pub scene: PathBuf,

    /// Override the asset type stored in the scene
    #[arg(long, value_enum)]
    pub asset_type: Option<AssetType>,

    /// Exit with status 1 when anything is missing or misplaced
    #[arg(long)]
    pub fail_on_error: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".hat.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Show detailed configuration breakdown
    #[arg(long)]
    pub detailed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_flags() {
        let cli = Cli::parse_from([
            "hat",
            "check",
            "--on-save",
            "--asset-type",
            "texture",
            "--fail-on-error",
            "--format",
            "json",
            "scene.blend",
        ]);
        match cli.command {
            Commands::Check(args) => {
                assert!(args.on_save);
                assert_eq!(args.asset_type, Some(AssetType::Texture));
                assert!(args.fail_on_error);
                assert_eq!(args.format, OutputFormat::Json);
                assert!(!args.persist);
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["hat", "list-checks", "--config", "custom.yml", "-v"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yml")));
        assert!(cli.verbose);
    }
}
