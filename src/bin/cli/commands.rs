//! Command Execution Logic
//!
//! One function per subcommand. Each loads the layered configuration, opens
//! the scene when it needs one and hands the work to the library.

use std::path::Path;

use owo_colors::OwoColorize;
use tracing::{info, warn};

use hat_rs::io::maintenance;
use hat_rs::{HatConfig, HatEngine, RunOptions, SceneHost, SceneSnapshot};

use crate::cli::args::{
    CheckArgs, ChecklistArgs, FolderStructureArgs, InitConfigArgs, OutputFormat, RenameArgs,
    ReportArgs, SceneArgs, ValidateConfigArgs,
};
use crate::cli::config_layer::load_configuration;
use crate::cli::output::{
    display_config_summary, print_check_list, print_folder_report, print_rename_outcome,
    print_rename_plan, print_report, print_run_outcome,
};

fn open_scene(path: &Path) -> anyhow::Result<SceneSnapshot> {
    SceneSnapshot::load(path)
        .map_err(|e| anyhow::anyhow!("Failed to open scene {}: {}", path.display(), e))
}

fn build_engine(config_path: Option<&Path>) -> anyhow::Result<HatEngine> {
    let config = load_configuration(config_path)?;
    Ok(HatEngine::new(config)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run every check against a scene.
pub async fn check_command(args: CheckArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let engine = build_engine(config_path)?;
    let mut scene = open_scene(&args.scene)?;
    if let Some(asset_type) = args.asset_type {
        scene.settings.asset_type = asset_type;
    }

    let options = RunOptions::from_config(engine.config())
        .triggered_by_save(args.on_save)
        .with_persist(args.persist);
    let outcome = engine.run_with(&mut scene, &options)?;

    if args.persist && scene.is_dirty() {
        scene.save()?;
        info!("Stored report in {}", args.scene.display());
    }

    match args.format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Pretty => {
            if outcome.should_display {
                print_run_outcome(&outcome, &options.ignorable_messages);
            } else {
                println!("{}", "✅ All checks passed".bright_green().bold());
            }
        }
    }

    if args.fail_on_error && outcome.report.has_errors() {
        eprintln!(
            "{} {} error(s)",
            "❌ Checks failed:".red().bold(),
            outcome.report.count(hat_rs::Severity::Error)
        );
        std::process::exit(1);
    }

    Ok(())
}

/// Show the report stored by the last check run.
pub async fn report_command(args: ReportArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_configuration(config_path)?;
    let scene = open_scene(&args.scene)?;

    let Some(report) = HatEngine::last_report(&scene)? else {
        println!(
            "{}",
            "No report stored yet. Run 'hat check --persist <scene>' first.".dimmed()
        );
        return Ok(());
    };

    match args.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Pretty => {
            println!(
                "{} {}",
                "📄 Last report:".bright_blue().bold(),
                args.scene.display().to_string().cyan()
            );
            println!();
            print_report(&report, &config.report.ignorable_messages);
        }
    }
    Ok(())
}

/// Preview a slug rename, or apply it with `--apply`.
pub async fn rename_command(args: RenameArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut engine = build_engine(config_path)?;
    let mut scene = open_scene(&args.scene)?;

    if !args.apply {
        let plan = engine.preview_rename(&scene, &args.to)?;
        match args.format {
            OutputFormat::Json => print_json(plan)?,
            OutputFormat::Pretty => {
                print_rename_plan(plan);
                println!();
                println!(
                    "{}",
                    format!(
                        "Run with --apply to rename: hat rename {} --to {} --apply",
                        args.scene.display(),
                        args.to
                    )
                    .dimmed()
                );
            }
        }
        engine.cancel_rename();
        return Ok(());
    }

    let outcome = engine.apply_rename(&mut scene, &args.to)?;
    if scene.is_dirty() {
        scene.save()?;
    }

    match args.format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Pretty => print_rename_outcome(&outcome),
    }

    if !outcome.is_complete() {
        std::process::exit(1);
    }
    Ok(())
}

/// List the discovered checks.
pub async fn list_checks(config_path: Option<&Path>) -> anyhow::Result<()> {
    let engine = build_engine(config_path)?;
    print_check_list(engine.registry());
    Ok(())
}

/// Print the README checklist or splice it into a README.
pub async fn checklist_command(
    args: ChecklistArgs,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let engine = build_engine(config_path)?;

    let Some(readme) = args.readme else {
        print!("{}", engine.checklist());
        return Ok(());
    };

    match engine.update_readme(&readme)? {
        Some(count) => println!(
            "{} {} ({} checks)",
            "✅ Updated checklist in".bright_green().bold(),
            readme.display().to_string().cyan(),
            count
        ),
        None => {
            warn!("No checklist section found in {}", readme.display());
            eprintln!(
                "{} {}",
                "❌ No 'Checks:' ... 'To do:' section in".red(),
                readme.display()
            );
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Validate the layout of the folder holding a scene.
pub async fn folder_structure_command(
    args: FolderStructureArgs,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let engine = build_engine(config_path)?;
    let mut scene = open_scene(&args.scene)?;
    if let Some(asset_type) = args.asset_type {
        scene.settings.asset_type = asset_type;
    }

    let report = engine.inspect_folder(&scene)?;
    match args.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Pretty => print_folder_report(&report),
    }

    if args.fail_on_error && !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

/// Rename image datablocks after their files and save the scene.
pub async fn fix_image_names_command(args: SceneArgs) -> anyhow::Result<()> {
    let mut scene = open_scene(&args.scene)?;
    let fixed = maintenance::fix_image_names(&mut scene)?;

    if fixed.is_empty() {
        println!("{}", "All image names already match their files".dimmed());
        return Ok(());
    }

    scene.save()?;
    for name in &fixed {
        println!("  {} {}", "✅".green(), name);
    }
    println!();
    println!(
        "{}",
        format!("Renamed {} image(s)", fixed.len()).bright_green().bold()
    );
    Ok(())
}

/// Remove datablocks without users and save the scene.
pub async fn scrub_command(args: SceneArgs) -> anyhow::Result<()> {
    let mut scene = open_scene(&args.scene)?;
    let removed = maintenance::scrub_orphans(&mut scene)?;

    if removed > 0 {
        scene.save()?;
    }
    println!(
        "{}",
        format!("Removed {} orphan datablock(s)", removed).bright_green().bold()
    );
    Ok(())
}

/// Print default configuration in YAML format
pub async fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default hat configuration".dimmed());
    println!("{}", "# Save this to a file and customize as needed".dimmed());
    println!("{}", "# Usage: hat check --config your-config.yml <scene>".dimmed());
    println!();

    let yaml_output = serde_yaml::to_string(&HatConfig::default())?;
    println!("{}", yaml_output);
    Ok(())
}

/// Initialize a configuration file with defaults
pub async fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        eprintln!(
            "{} {}",
            "❌ Configuration file already exists:".red(),
            args.output.display()
        );
        eprintln!("   Use --force to overwrite or choose a different name with --output");
        std::process::exit(1);
    }

    let yaml_content = serde_yaml::to_string(&HatConfig::default())?;
    tokio::fs::write(&args.output, yaml_content).await?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "📝 Next steps:".bright_blue().bold());
    println!("   1. Edit the configuration file to tune thresholds and folder rules");
    println!(
        "   2. Run checks with: {}",
        format!("hat check --config {} <scene>", args.output.display()).cyan()
    );
    Ok(())
}

/// Validate a configuration file
pub async fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.file.display().to_string().cyan()
    );
    println!();

    let config = match load_configuration(Some(args.file.as_path())) {
        Ok(config) => {
            println!("{}", "✅ Configuration file is valid!".bright_green().bold());
            println!();
            config
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration validation failed:".red(), e);
            println!();
            println!("{}", "🔧 Common issues:".bright_blue().bold());
            println!("   • Check YAML syntax (indentation, colons, quotes)");
            println!("   • Ensure numeric limits are positive and warn sizes stay below max sizes");
            println!("   • Verify folder rule patterns are valid globs");
            println!();
            println!(
                "{}",
                "💡 Tip: Use 'hat print-default-config' to see valid format".dimmed()
            );
            std::process::exit(1);
        }
    };

    display_config_summary(&config, args.detailed);
    Ok(())
}
