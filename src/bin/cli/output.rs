//! Output Formatting
//!
//! Terminal rendering for reports, rename plans, check lists and folder
//! inspections.

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use hat_rs::core::rename::{DiscoveryStats, RenameOutcome};
use hat_rs::io::folder_structure::{EntryStatus, FolderReport};
use hat_rs::{CheckRegistry, HatConfig, RenamePlan, Report, RunOutcome, Severity};

fn paint(severity: Severity, text: &str) -> String {
    match severity {
        Severity::Success => text.green().to_string(),
        Severity::Question => text.cyan().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Error => text.red().bold().to_string(),
    }
}

/// Print every visible message of a report, one line per message.
pub fn print_report(report: &Report, ignorable: &[String]) {
    for (severity, message) in report.visible_messages(ignorable) {
        println!("  {} {}", severity.icon(), paint(severity, message));
    }
}

/// Print the result of a check run with a summary line.
pub fn print_run_outcome(outcome: &RunOutcome, ignorable: &[String]) {
    println!(
        "{} {} ({})",
        "🔍 Checked".bright_blue().bold(),
        outcome.slug.cyan(),
        outcome.asset_type
    );
    println!();
    print_report(&outcome.report, ignorable);
    println!();

    let summary = format!(
        "{} errors, {} warnings, {} questions in {} checks ({} ms)",
        outcome.report.count(Severity::Error),
        outcome.report.count(Severity::Warning),
        outcome.report.count(Severity::Question),
        outcome.executed.len(),
        outcome.duration_ms
    );
    println!("{}", paint(outcome.worst(), &summary));
    if !outcome.skipped.is_empty() {
        println!(
            "{}",
            format!("Skipped: {}", outcome.skipped.join(", ")).dimmed()
        );
    }
}

#[derive(Tabled)]
struct RenameRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "From")]
    source: String,
    #[tabled(rename = "To")]
    target: String,
    #[tabled(rename = "Conflict")]
    conflict: String,
}

fn discovery_note(stats: &DiscoveryStats) -> String {
    let mut note = format!(
        "Searched {} containers, {} items in {} ms",
        stats.containers_searched, stats.items_inspected, stats.elapsed_ms
    );
    if !stats.truncated_containers.is_empty() {
        note.push_str(&format!(
            "; stopped early in {}",
            stats.truncated_containers.join(", ")
        ));
    }
    if stats.budget_exhausted {
        note.push_str("; time budget exhausted");
    }
    note
}

/// Print a rename plan as a table.
pub fn print_rename_plan(plan: &RenamePlan) {
    println!(
        "{} {} → {}",
        "✏️  Rename".bright_blue().bold(),
        plan.old_slug.cyan(),
        plan.new_slug.cyan()
    );
    println!();

    if plan.is_empty() {
        println!("{}", "Nothing to rename.".dimmed());
        return;
    }

    let rows: Vec<RenameRow> = plan
        .actions
        .iter()
        .map(|action| RenameRow {
            kind: action.kind().to_string(),
            source: action.source(),
            target: action.target(),
            conflict: if action.has_conflict() { "⚠️".to_string() } else { String::new() },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);

    let counts: Vec<String> = plan
        .counts()
        .iter()
        .map(|(kind, count)| format!("{count} {kind}"))
        .collect();
    println!("{}", counts.join(", "));

    let conflicts = plan.conflicts().count();
    if conflicts > 0 {
        println!(
            "{}",
            format!("{conflicts} target(s) already exist and will be overwritten or skipped").yellow()
        );
    }
    if plan.discovery.is_truncated() {
        println!("{}", discovery_note(&plan.discovery).yellow());
    } else {
        println!("{}", discovery_note(&plan.discovery).dimmed());
    }
}

/// Print what a rename execution did.
pub fn print_rename_outcome(outcome: &RenameOutcome) {
    for action in &outcome.applied {
        println!("  {} {}", "✅".green(), action);
    }
    for failed in &outcome.failed {
        println!("  {} {}: {}", "❌".red(), failed.action, failed.error.red());
    }
    println!();
    if outcome.is_complete() {
        println!(
            "{}",
            format!("Renamed {} item(s)", outcome.applied.len()).bright_green().bold()
        );
    } else {
        println!(
            "{}",
            format!(
                "Renamed {} item(s), {} failed",
                outcome.applied.len(),
                outcome.failed.len()
            )
            .red()
            .bold()
        );
    }
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "Check")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Print the discovered checks as a table.
pub fn print_check_list(registry: &CheckRegistry) {
    println!("{}", "📋 Available Checks".bright_blue().bold());
    println!();

    let rows: Vec<CheckRow> = registry
        .iter()
        .map(|(name, check)| CheckRow {
            name: name.to_string(),
            description: check.description().to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
    println!();
    println!("{} checks loaded", registry.len());
}

fn entry_label(status: EntryStatus, name: &str) -> String {
    match status {
        EntryStatus::Required => format!("{} {}", "✅".green(), name.green()),
        EntryStatus::Valid => format!("{} {}", "✔".green(), name),
        EntryStatus::Invalid => format!("{} {}", "❌".red(), name.red()),
        EntryStatus::Unknown => format!("{} {}", "❓".yellow(), name.yellow()),
    }
}

/// Print the inspected folder as a tree followed by what is missing.
pub fn print_folder_report(report: &FolderReport) {
    println!(
        "{} {}",
        "📁 Folder structure:".bright_blue().bold(),
        report.root.display().to_string().cyan()
    );
    println!();

    for entry in &report.entries {
        let indent = "  ".repeat(entry.depth);
        let name = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        println!("{indent}{}", entry_label(entry.status, &name));
    }

    if !report.missing_folders.is_empty() || !report.missing_items.is_empty() {
        println!();
        println!("{}", "Missing:".red().bold());
        for folder in &report.missing_folders {
            println!("  {} {}/", "❌".red(), folder);
        }
        for item in &report.missing_items {
            println!(
                "  {} {} in {}",
                "❌".red(),
                item.pattern,
                item.folder.display()
            );
        }
    }

    println!();
    if report.is_clean() {
        println!("{}", "Folder structure is valid".bright_green().bold());
    } else {
        println!(
            "{}",
            format!(
                "{} invalid, {} unknown, {} missing",
                report.count(EntryStatus::Invalid),
                report.count(EntryStatus::Unknown),
                report.missing_items.len() + report.missing_folders.len()
            )
            .yellow()
        );
    }
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    setting: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Print a summary of the key configuration values.
pub fn display_config_summary(config: &HatConfig, detailed: bool) {
    let mut rows = vec![
        SettingRow {
            setting: "checks.root".to_string(),
            value: if config.checks.root.is_empty() {
                "(all)".to_string()
            } else {
                config.checks.root.clone()
            },
        },
        SettingRow {
            setting: "checks.disabled".to_string(),
            value: config.checks.disabled.len().to_string(),
        },
        SettingRow {
            setting: "report.ignorable_messages".to_string(),
            value: config.report.ignorable_messages.len().to_string(),
        },
        SettingRow {
            setting: "rename.search_budget_ms".to_string(),
            value: config.rename.search_budget_ms.to_string(),
        },
    ];

    if detailed {
        rows.extend([
            SettingRow {
                setting: "checks.file_size.model".to_string(),
                value: format!(
                    "warn {} KB, max {} KB",
                    config.checks.file_size.model.warn_kb, config.checks.file_size.model.max_kb
                ),
            },
            SettingRow {
                setting: "checks.file_size.texture".to_string(),
                value: format!(
                    "warn {} KB, max {} KB",
                    config.checks.file_size.texture.warn_kb,
                    config.checks.file_size.texture.max_kb
                ),
            },
            SettingRow {
                setting: "checks.specular_ior_range".to_string(),
                value: format!(
                    "{} to {}",
                    config.checks.specular_ior_range.min, config.checks.specular_ior_range.max
                ),
            },
            SettingRow {
                setting: "rename.max_items_per_container".to_string(),
                value: config.rename.max_items_per_container.to_string(),
            },
            SettingRow {
                setting: "rename.textures_dir".to_string(),
                value: config.rename.textures_dir.clone(),
            },
            SettingRow {
                setting: "folder_structure.max_depth".to_string(),
                value: config.folder_structure.max_depth.to_string(),
            },
        ]);
    }

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}
