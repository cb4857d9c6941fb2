//! Check orchestration.
//!
//! [`run_all`] executes every registered check against the host scene in
//! discovery order, isolates failures so one broken check cannot take the
//! run down, decides whether the run counts as clean and persists the
//! report into the scene.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checks::{Check, CheckContext};
use crate::core::config::{ChecksConfig, HatConfig};
use crate::core::errors::{HatError, Result};
use crate::core::naming::session_slug;
use crate::core::registry::CheckRegistry;
use crate::core::report::{CheckResult, Report};
use crate::core::severity::Severity;
use crate::scene::{AssetType, SceneHost};

/// Name of the check that is suppressed while saving.
pub const UNSAVED_CHECK: &str = "unsaved";

/// Message used when a check reports a problem without describing it.
pub const UNDESCRIBED_FINDING_MESSAGE: &str = "Check reported a problem without a message";

/// How a run was triggered and what it should skip.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// The run was triggered by a save; the unsaved-changes check is skipped
    pub on_save: bool,
    /// Write the serialized report into the scene settings
    pub persist: bool,
    /// Check thresholds handed to each check
    pub checks: ChecksConfig,
    /// Messages that do not prevent a clean verdict
    pub ignorable_messages: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&HatConfig::default())
    }
}

impl RunOptions {
    /// Options for a manual run using the given configuration.
    pub fn from_config(config: &HatConfig) -> Self {
        Self {
            on_save: false,
            persist: true,
            checks: config.checks.clone(),
            ignorable_messages: config.report.ignorable_messages.clone(),
        }
    }

    /// Mark the run as triggered by a save.
    pub fn triggered_by_save(mut self, on_save: bool) -> Self {
        self.on_save = on_save;
        self
    }

    /// Enable or disable persisting the report.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Whether the named check is suppressed for this run.
    pub fn suppresses(&self, name: &str) -> bool {
        (self.on_save && name == UNSAVED_CHECK) || self.checks.is_disabled(name)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Slug the checks ran against
    pub slug: String,
    /// Asset type the checks ran against
    pub asset_type: AssetType,
    /// Ordered results
    pub report: Report,
    /// Names of the checks that ran, aligned with the first report entries
    pub executed: Vec<String>,
    /// Names of suppressed checks
    pub skipped: Vec<String>,
    /// The synthetic "all checks passed" entry was appended
    pub all_passed: bool,
    /// The UI should show the report
    pub should_display: bool,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl RunOutcome {
    /// Worst severity in the report.
    pub fn worst(&self) -> Severity {
        self.report.worst()
    }

    /// Result of a named check, if it ran.
    pub fn result_of(&self, name: &str) -> Option<&CheckResult> {
        let index = self.executed.iter().position(|n| n == name)?;
        self.report.entries().get(index)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one check, turning an error or a panic into an error entry.
fn run_isolated(name: &str, check: &dyn Check, ctx: &CheckContext<'_>) -> CheckResult {
    match catch_unwind(AssertUnwindSafe(|| check.run(ctx))) {
        Ok(Ok(result)) if result.is_well_formed() => result,
        Ok(Ok(result)) => {
            warn!("Check '{}' returned {} without a message", name, result.severity);
            CheckResult::single(result.severity, UNDESCRIBED_FINDING_MESSAGE)
        }
        Ok(Err(e)) => {
            warn!("Check '{}' failed: {}", name, e);
            let failure = HatError::check_failed(name, e.to_string());
            CheckResult::single(Severity::Error, failure.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("Check '{}' panicked: {}", name, message);
            CheckResult::single(
                Severity::Error,
                format!("Check '{name}' crashed: {message}"),
            )
        }
    }
}

/// Execute every registered check against `host`.
pub fn run_all(
    registry: &CheckRegistry,
    host: &mut dyn SceneHost,
    options: &RunOptions,
) -> Result<RunOutcome> {
    let started_at = Utc::now();
    let timer = Instant::now();

    let slug = session_slug(host);
    let asset_type = host.settings().asset_type;
    debug!(
        "Running {} checks for '{}' as {} asset",
        registry.len(),
        slug,
        asset_type
    );

    let mut report = Report::new();
    let mut executed = Vec::new();
    let mut skipped = Vec::new();
    {
        let ctx = CheckContext::new(&slug, asset_type, &*host, &options.checks);
        for (name, check) in registry.iter() {
            if options.suppresses(name) {
                debug!("Skipping suppressed check '{}'", name);
                skipped.push(name.to_string());
                continue;
            }
            report.push(run_isolated(name, check, &ctx));
            executed.push(name.to_string());
        }
    }

    let all_passed = report.finalize(&options.ignorable_messages);
    let should_display = !(options.on_save && all_passed);

    if options.persist {
        host.store_report(report.to_json()?);
    }

    let duration_ms = u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        "Checked '{}': {} errors, {} warnings, {} questions in {}ms",
        slug,
        report.count(Severity::Error),
        report.count(Severity::Warning),
        report.count(Severity::Question),
        duration_ms
    );

    Ok(RunOutcome {
        slug,
        asset_type,
        report,
        executed,
        skipped,
        all_passed,
        should_display,
        started_at,
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckModule, RoutineCheck};
    use crate::core::report::{ALL_PASSED_MESSAGE, UNSAVED_CHANGES_MESSAGE};
    use crate::scene::SceneSnapshot;

    fn pass(_: &CheckContext<'_>) -> Result<CheckResult> {
        Ok(CheckResult::success())
    }

    fn dirty(ctx: &CheckContext<'_>) -> Result<CheckResult> {
        if ctx.scene.is_dirty() {
            Ok(CheckResult::single(Severity::Warning, UNSAVED_CHANGES_MESSAGE))
        } else {
            Ok(CheckResult::success())
        }
    }

    fn fails(_: &CheckContext<'_>) -> Result<CheckResult> {
        Err(HatError::internal("node tree missing"))
    }

    fn panics(_: &CheckContext<'_>) -> Result<CheckResult> {
        panic!("index out of range")
    }

    fn silent_warning(_: &CheckContext<'_>) -> Result<CheckResult> {
        Ok(CheckResult {
            severity: Severity::Warning,
            messages: vec![],
        })
    }

    fn question(_: &CheckContext<'_>) -> Result<CheckResult> {
        Ok(CheckResult::single(Severity::Question, "Cube is not at origin"))
    }

    macro_rules! fake {
        ($path:literal, $routine:path) => {
            CheckModule::new($path, |_| Ok(Box::new(RoutineCheck::new("fake", $routine))))
        };
    }

    fn registry(modules: &[CheckModule]) -> CheckRegistry {
        CheckRegistry::discover("", modules, &ChecksConfig::default())
    }

    fn scene() -> SceneSnapshot {
        SceneSnapshot::new().with_file_path("/assets/rock_01/rock_01.blend")
    }

    #[test]
    fn test_unsaved_warning_alone_passes() {
        let registry = registry(&[fake!("a", pass), fake!("b", pass), fake!("unsaved", dirty)]);
        let mut scene = scene();
        scene.mark_dirty();

        let outcome = run_all(&registry, &mut scene, &RunOptions::default()).unwrap();
        assert!(outcome.all_passed);
        assert_eq!(outcome.report.len(), 4);
        assert_eq!(
            outcome.report.entries().last(),
            Some(&CheckResult::success_with(ALL_PASSED_MESSAGE))
        );
        assert_eq!(outcome.slug, "rock_01");
    }

    #[test]
    fn test_failures_are_isolated() {
        let registry = registry(&[
            fake!("a_fails", fails),
            fake!("b_panics", panics),
            fake!("c_pass", pass),
        ]);
        let mut scene = scene();
        let outcome = run_all(&registry, &mut scene, &RunOptions::default()).unwrap();

        assert_eq!(outcome.executed, vec!["a_fails", "b_panics", "c_pass"]);
        let failed = outcome.result_of("a_fails").unwrap();
        assert_eq!(failed.severity, Severity::Error);
        assert!(failed.messages[0].contains("node tree missing"));
        let crashed = outcome.result_of("b_panics").unwrap();
        assert!(crashed.messages[0].contains("index out of range"));
        assert!(outcome.result_of("c_pass").unwrap().severity.is_success());
        assert!(!outcome.all_passed);
    }

    #[test]
    fn test_message_invariant_is_restored() {
        let registry = registry(&[fake!("quiet", silent_warning)]);
        let mut scene = scene();
        let outcome = run_all(&registry, &mut scene, &RunOptions::default()).unwrap();
        assert_eq!(
            outcome.report.entries()[0],
            CheckResult::single(Severity::Warning, UNDESCRIBED_FINDING_MESSAGE)
        );
    }

    #[test]
    fn test_on_save_skips_unsaved_and_hides_clean_report() {
        let registry = registry(&[fake!("a", pass), fake!("unsaved", dirty)]);
        let mut scene = scene();
        scene.mark_dirty();

        let options = RunOptions::default().triggered_by_save(true);
        let outcome = run_all(&registry, &mut scene, &options).unwrap();
        assert_eq!(outcome.skipped, vec!["unsaved"]);
        assert!(outcome.all_passed);
        assert!(!outcome.should_display);
    }

    #[test]
    fn test_on_save_still_displays_findings() {
        let registry = registry(&[fake!("q", question)]);
        let mut scene = scene();
        let options = RunOptions::default().triggered_by_save(true);
        let outcome = run_all(&registry, &mut scene, &options).unwrap();
        assert!(outcome.should_display);
    }

    #[test]
    fn test_disabled_checks_are_skipped() {
        let registry = registry(&[fake!("a", pass), fake!("q", question)]);
        let mut options = RunOptions::default();
        options.checks.disabled.push("q".into());

        let mut scene = scene();
        let outcome = run_all(&registry, &mut scene, &options).unwrap();
        assert_eq!(outcome.executed, vec!["a"]);
        assert!(outcome.all_passed);
    }

    #[test]
    fn test_report_is_persisted_and_round_trips() {
        let registry = registry(&[fake!("q", question), fake!("a", pass)]);
        let mut scene = scene();
        let outcome = run_all(&registry, &mut scene, &RunOptions::default()).unwrap();

        let stored = Report::from_json(&scene.settings().latest_report).unwrap();
        assert_eq!(stored, outcome.report);
        assert!(scene.is_dirty());
    }

    #[test]
    fn test_persist_can_be_disabled() {
        let registry = registry(&[fake!("a", pass)]);
        let mut scene = scene();
        let options = RunOptions::default().with_persist(false);
        run_all(&registry, &mut scene, &options).unwrap();
        assert!(scene.settings().latest_report.is_empty());
        assert!(!scene.is_dirty());
    }

    #[test]
    fn test_unsaved_session_has_empty_slug() {
        let registry = registry(&[fake!("a", pass)]);
        let mut scene = SceneSnapshot::new();
        let outcome = run_all(&registry, &mut scene, &RunOptions::default()).unwrap();
        assert_eq!(outcome.slug, "");
    }
}
