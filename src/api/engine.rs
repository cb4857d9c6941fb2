//! Main engine implementation.

use std::path::Path;

use tracing::info;

use crate::checks::catalog;
use crate::core::config::HatConfig;
use crate::core::errors::{HatError, Result};
use crate::core::naming::session_slug;
use crate::core::pipeline::{run_all, RunOptions, RunOutcome};
use crate::core::registry::CheckRegistry;
use crate::core::rename::{RenameEngine, RenameOutcome, RenamePlan, RenameState};
use crate::core::report::Report;
use crate::io::checklist;
use crate::io::folder_structure::{self, FolderReport};
use crate::scene::SceneHost;

/// Session-level entry point: owns the configuration, the check registry and
/// the rename state machine.
pub struct HatEngine {
    config: HatConfig,
    registry: CheckRegistry,
    rename: RenameEngine,
}

impl HatEngine {
    /// Create an engine and discover the built-in checks.
    pub fn new(config: HatConfig) -> Result<Self> {
        config.validate()?;

        let registry = CheckRegistry::discover(&config.checks.root, &catalog(), &config.checks);
        info!("Loaded {} checks", registry.len());

        Ok(Self {
            rename: RenameEngine::new(config.rename.clone()),
            config,
            registry,
        })
    }

    /// Engine with the default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(HatConfig::default())
    }

    /// Get the current configuration
    pub fn config(&self) -> &HatConfig {
        &self.config
    }

    /// Loaded checks.
    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Reload the catalog, keeping previous versions of checks that fail to
    /// load. Returns the number of freshly loaded checks.
    pub fn reload_checks(&mut self) -> usize {
        self.registry.reload(&catalog(), &self.config.checks)
    }

    /// Run every check against the scene.
    pub fn run_checks(&self, host: &mut dyn SceneHost, on_save: bool) -> Result<RunOutcome> {
        let options = RunOptions::from_config(&self.config).triggered_by_save(on_save);
        self.run_with(host, &options)
    }

    /// Run every check with explicit options.
    pub fn run_with(&self, host: &mut dyn SceneHost, options: &RunOptions) -> Result<RunOutcome> {
        run_all(&self.registry, host, options)
    }

    /// The report persisted by the last run, if any.
    pub fn last_report(host: &dyn SceneHost) -> Result<Option<Report>> {
        let raw = &host.settings().latest_report;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Report::from_json(raw).map(Some)
    }

    /// Current rename state.
    pub fn rename_state(&self) -> RenameState {
        self.rename.state()
    }

    /// Plan a slug rename and hold it for confirmation.
    pub fn preview_rename(
        &mut self,
        host: &dyn SceneHost,
        new_slug: &str,
    ) -> Result<&RenamePlan> {
        self.rename.preview(host, new_slug)
    }

    /// Drop a pending rename preview.
    pub fn cancel_rename(&mut self) {
        self.rename.cancel();
    }

    /// Execute a slug rename.
    pub fn apply_rename(&mut self, host: &mut dyn SceneHost, new_slug: &str) -> Result<RenameOutcome> {
        self.rename.apply(host, new_slug)
    }

    /// README checklist for the loaded checks.
    pub fn checklist(&self) -> String {
        checklist::render_checklist(&self.registry)
    }

    /// Rewrite the checklist section of a README.
    pub fn update_readme(&self, path: &Path) -> Result<Option<usize>> {
        checklist::update_readme(path, &self.registry)
    }

    /// Validate the layout of the folder holding the save file.
    pub fn inspect_folder(&self, host: &dyn SceneHost) -> Result<FolderReport> {
        let file_path = host
            .file_path()
            .ok_or_else(|| HatError::precondition("Save the file to inspect its folder"))?;
        folder_structure::inspect(
            file_path,
            &session_slug(host),
            host.settings().asset_type,
            &self.config.folder_structure,
        )
    }

    /// Get engine status information
    pub fn get_status(&self) -> EngineStatus {
        let mut issues = Vec::new();
        if self.registry.is_empty() {
            issues.push(format!(
                "No checks found below '{}'",
                self.registry.root()
            ));
        }
        let configuration_valid = match self.config.validate() {
            Ok(()) => true,
            Err(e) => {
                issues.push(e.to_string());
                false
            }
        };

        EngineStatus {
            is_ready: issues.is_empty(),
            checks_loaded: self.registry.len(),
            configuration_valid,
            rename_state: self.rename.state(),
            issues,
        }
    }
}

impl std::fmt::Debug for HatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HatEngine")
            .field("registry", &self.registry)
            .field("rename", &self.rename)
            .finish_non_exhaustive()
    }
}

/// Status information about the engine
#[derive(Debug)]
pub struct EngineStatus {
    /// Whether the engine can run checks
    pub is_ready: bool,

    /// Number of registered checks
    pub checks_loaded: usize,

    /// Whether the configuration is valid
    pub configuration_valid: bool,

    /// Where the rename state machine is
    pub rename_state: RenameState,

    /// List of issues preventing readiness
    pub issues: Vec<String>,
}
