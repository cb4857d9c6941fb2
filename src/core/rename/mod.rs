//! Slug rename transaction engine.
//!
//! A rename is planned first ([`plan_rename`]) without touching anything, shown
//! as a preview and then executed as a best-effort sequence of actions. The
//! [`RenameEngine`] tracks where an invocation is in that flow and enforces
//! the preconditions for execution.

pub mod executor;
pub mod plan;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::RenameConfig;
use crate::core::errors::{HatError, Result};
use crate::core::naming::session_slug;
use crate::scene::SceneHost;

pub use executor::execute_plan;
pub use plan::plan_rename;

/// One step of a rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenameAction {
    /// Rename a texture file in the textures directory
    TextureFile {
        /// Current location
        old_path: PathBuf,
        /// Target location
        new_path: PathBuf,
        /// The target already exists
        has_conflict: bool,
    },
    /// Rename a datablock inside a host container
    Datablock {
        /// Container name (`objects`, `materials`, ...)
        container: String,
        /// Current name
        old_name: String,
        /// Target name
        new_name: String,
        /// The container already holds the target name
        has_conflict: bool,
    },
    /// Move the save file aside and save under the new name
    SaveFile {
        /// Current save file
        old_path: PathBuf,
        /// Save file after the rename
        new_path: PathBuf,
        /// Where the current file is moved
        backup_path: PathBuf,
        /// The target or the backup already exists
        has_conflict: bool,
    },
    /// Rename the folder containing the save file
    ParentFolder {
        /// Current folder
        old_path: PathBuf,
        /// Folder after the rename
        new_path: PathBuf,
        /// The target folder already exists
        has_conflict: bool,
    },
}

impl RenameAction {
    /// Whether executing the action would collide with something existing.
    pub fn has_conflict(&self) -> bool {
        match self {
            Self::TextureFile { has_conflict, .. }
            | Self::Datablock { has_conflict, .. }
            | Self::SaveFile { has_conflict, .. }
            | Self::ParentFolder { has_conflict, .. } => *has_conflict,
        }
    }

    /// Short label for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextureFile { .. } => "texture",
            Self::Datablock { .. } => "datablock",
            Self::SaveFile { .. } => "save file",
            Self::ParentFolder { .. } => "folder",
        }
    }

    /// Name before the rename.
    pub fn source(&self) -> String {
        match self {
            Self::Datablock {
                container,
                old_name,
                ..
            } => format!("{container}/{old_name}"),
            Self::TextureFile { old_path, .. }
            | Self::SaveFile { old_path, .. }
            | Self::ParentFolder { old_path, .. } => file_label(old_path),
        }
    }

    /// Name after the rename.
    pub fn target(&self) -> String {
        match self {
            Self::Datablock {
                container,
                new_name,
                ..
            } => format!("{container}/{new_name}"),
            Self::TextureFile { new_path, .. }
            | Self::SaveFile { new_path, .. }
            | Self::ParentFolder { new_path, .. } => file_label(new_path),
        }
    }

    /// The action would leave its subject under the same name.
    pub fn is_noop(&self) -> bool {
        match self {
            Self::Datablock {
                old_name, new_name, ..
            } => old_name == new_name,
            Self::TextureFile {
                old_path, new_path, ..
            }
            | Self::SaveFile {
                old_path, new_path, ..
            }
            | Self::ParentFolder {
                old_path, new_path, ..
            } => old_path == new_path,
        }
    }
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl fmt::Display for RenameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rename {}: {} → {}", self.kind(), self.source(), self.target())?;
        if let Self::SaveFile { backup_path, .. } = self {
            write!(f, " (backup: {})", file_label(backup_path))?;
        }
        if self.has_conflict() {
            write!(f, " [conflict]")?;
        }
        Ok(())
    }
}

/// How far the datablock search got.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    /// Containers the search entered
    pub containers_searched: usize,
    /// Datablocks inspected across all containers
    pub items_inspected: usize,
    /// Containers abandoned at the item cap
    pub truncated_containers: Vec<String>,
    /// The wall-clock budget ran out before every container was searched
    pub budget_exhausted: bool,
    /// Time spent searching
    pub elapsed_ms: u64,
}

impl DiscoveryStats {
    /// Whether any part of the scene went unsearched.
    pub fn is_truncated(&self) -> bool {
        self.budget_exhausted || !self.truncated_containers.is_empty()
    }
}

/// Ordered actions for renaming one slug to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePlan {
    /// Slug being replaced
    pub old_slug: String,
    /// Replacement slug
    pub new_slug: String,
    /// Actions grouped textures, datablocks, save file, folder
    pub actions: Vec<RenameAction>,
    /// Datablock search statistics
    pub discovery: DiscoveryStats,
}

impl RenamePlan {
    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions that would collide with existing files or datablocks.
    pub fn conflicts(&self) -> impl Iterator<Item = &RenameAction> {
        self.actions.iter().filter(|action| action.has_conflict())
    }

    /// Number of actions of each kind, in plan order.
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for action in &self.actions {
            match counts.iter_mut().find(|(kind, _)| *kind == action.kind()) {
                Some((_, count)) => *count += 1,
                None => counts.push((action.kind(), 1)),
            }
        }
        counts
    }
}

/// An action that could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAction {
    /// The action
    pub action: RenameAction,
    /// Why it failed
    pub error: String,
}

/// What execution achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    /// Actions carried out
    pub applied: Vec<RenameAction>,
    /// Actions that failed, with their error
    pub failed: Vec<FailedAction>,
}

impl RenameOutcome {
    /// Whether every action succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Where a rename invocation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameState {
    /// Nothing in progress
    #[default]
    Idle,
    /// Building a plan
    Planning,
    /// A plan is waiting for confirmation
    Preview,
    /// Actions are being applied
    Executing,
}

impl fmt::Display for RenameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::Preview => "preview",
            Self::Executing => "executing",
        };
        f.write_str(name)
    }
}

/// Drives `Idle → Planning → (Preview | Executing) → Idle`.
#[derive(Debug, Default)]
pub struct RenameEngine {
    config: RenameConfig,
    state: RenameState,
    pending: Option<RenamePlan>,
}

impl RenameEngine {
    /// Create an idle engine.
    pub fn new(config: RenameConfig) -> Self {
        Self {
            config,
            state: RenameState::Idle,
            pending: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> RenameState {
        self.state
    }

    /// Plan held for confirmation, if any.
    pub fn pending(&self) -> Option<&RenamePlan> {
        self.pending.as_ref()
    }

    /// Plan a rename of the session's slug to `new_slug` and hold it for
    /// confirmation. Fails without planning when the slug pair is unusable.
    pub fn preview(&mut self, host: &dyn SceneHost, new_slug: &str) -> Result<&RenamePlan> {
        let old_slug = match Self::check_slugs(host, new_slug) {
            Ok(slug) => slug,
            Err(e) => {
                self.cancel();
                return Err(e);
            }
        };

        self.state = RenameState::Planning;
        let plan = plan_rename(host, &old_slug, new_slug, &self.config);
        debug!(
            "Planned {} rename actions for '{}' -> '{}'",
            plan.actions.len(),
            old_slug,
            new_slug
        );
        self.state = RenameState::Preview;
        Ok(self.pending.insert(plan))
    }

    /// Drop a pending preview.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.state = RenameState::Idle;
    }

    /// Check that a rename to `new_slug` may be executed.
    pub fn validate(host: &dyn SceneHost, new_slug: &str) -> Result<String> {
        if host.file_path().is_none() {
            return Err(HatError::precondition(
                "Save the file before changing the slug",
            ));
        }
        if host.is_dirty() {
            return Err(HatError::precondition(
                "Save your changes before changing the slug",
            ));
        }
        Self::check_slugs(host, new_slug)
    }

    /// Check that the session has a slug and `new_slug` differs from it.
    fn check_slugs(host: &dyn SceneHost, new_slug: &str) -> Result<String> {
        let old_slug = session_slug(host);
        if old_slug.is_empty() {
            return Err(HatError::precondition(
                "The current file has no slug to rename",
            ));
        }
        if new_slug.trim().is_empty() {
            return Err(HatError::precondition("New slug cannot be empty"));
        }
        if new_slug == old_slug {
            return Err(HatError::precondition(
                "New slug is the same as the current slug",
            ));
        }
        Ok(old_slug)
    }

    /// Execute a rename of the session's slug to `new_slug`.
    ///
    /// The plan is rebuilt from the current state rather than reusing a
    /// preview, so files that changed in between are picked up. Conflicts do
    /// not block execution.
    pub fn apply(&mut self, host: &mut dyn SceneHost, new_slug: &str) -> Result<RenameOutcome> {
        let old_slug = match Self::validate(&*host, new_slug) {
            Ok(slug) => slug,
            Err(e) => {
                self.cancel();
                return Err(e);
            }
        };

        self.state = RenameState::Planning;
        let plan = plan_rename(&*host, &old_slug, new_slug, &self.config);
        self.pending = None;

        self.state = RenameState::Executing;
        let outcome = execute_plan(host, &plan);
        self.state = RenameState::Idle;

        info!(
            "Renamed '{}' to '{}': {} applied, {} failed",
            old_slug,
            new_slug,
            outcome.applied.len(),
            outcome.failed.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneSnapshot;
    use std::path::Path;
    use tempfile::TempDir;

    fn saved_scene(dir: &Path) -> SceneSnapshot {
        let path = dir.join("rock_01.blend");
        let mut scene = SceneSnapshot::new();
        scene.objects.push(crate::scene::SceneObject::mesh("rock_01"));
        scene.save_as(&path).unwrap();
        scene
    }

    #[test]
    fn test_preconditions() {
        let temp = TempDir::new().unwrap();
        let engine_config = RenameConfig::default();

        let unsaved = SceneSnapshot::new();
        assert!(matches!(
            RenameEngine::validate(&unsaved, "rock_02"),
            Err(HatError::Precondition { .. })
        ));

        let mut scene = saved_scene(temp.path());
        assert!(RenameEngine::validate(&scene, "").is_err());
        assert!(RenameEngine::validate(&scene, "rock_01").is_err());
        assert_eq!(RenameEngine::validate(&scene, "rock_02").unwrap(), "rock_01");

        scene.mark_dirty();
        let mut engine = RenameEngine::new(engine_config);
        let err = engine.apply(&mut scene, "rock_02").unwrap_err();
        assert_eq!(err.to_string(), "Save your changes before changing the slug");
        assert_eq!(engine.state(), RenameState::Idle);
        assert!(temp.path().join("rock_01.blend").exists());
    }

    #[test]
    fn test_preview_then_cancel() {
        let temp = TempDir::new().unwrap();
        let scene = saved_scene(temp.path());
        let mut engine = RenameEngine::default();

        let plan = engine.preview(&scene, "rock_02").unwrap();
        assert_eq!(plan.old_slug, "rock_01");
        assert!(!plan.is_empty());
        assert_eq!(engine.state(), RenameState::Preview);

        engine.cancel();
        assert_eq!(engine.state(), RenameState::Idle);
        assert!(engine.pending().is_none());
        assert!(temp.path().join("rock_01.blend").exists());
    }

    #[test]
    fn test_preview_rejects_empty_slug() {
        let temp = TempDir::new().unwrap();
        let scene = saved_scene(temp.path());
        let mut engine = RenameEngine::default();

        let err = engine.preview(&scene, "").unwrap_err();
        assert_eq!(err.to_string(), "New slug cannot be empty");
        assert_eq!(engine.state(), RenameState::Idle);
        assert!(engine.pending().is_none());
    }

    #[test]
    fn test_preview_rejects_unchanged_slug() {
        let temp = TempDir::new().unwrap();
        let scene = saved_scene(temp.path());
        let mut engine = RenameEngine::default();
        engine.preview(&scene, "rock_02").unwrap();

        let err = engine.preview(&scene, "rock_01").unwrap_err();
        assert_eq!(err.to_string(), "New slug is the same as the current slug");
        assert!(engine.pending().is_none());
    }

    #[test]
    fn test_noop_actions() {
        let same = RenameAction::Datablock {
            container: "objects".into(),
            old_name: "rock_01".into(),
            new_name: "rock_01".into(),
            has_conflict: true,
        };
        assert!(same.is_noop());

        let moved = RenameAction::TextureFile {
            old_path: "/a/textures/rock_01_diff.png".into(),
            new_path: "/a/textures/rock_02_diff.png".into(),
            has_conflict: false,
        };
        assert!(!moved.is_noop());
    }

    #[test]
    fn test_apply_returns_to_idle() {
        let temp = TempDir::new().unwrap();
        let mut scene = saved_scene(temp.path());
        let mut engine = RenameEngine::default();
        engine.preview(&scene, "rock_02").unwrap();

        let outcome = engine.apply(&mut scene, "rock_02").unwrap();
        assert!(outcome.is_complete());
        assert_eq!(engine.state(), RenameState::Idle);
        assert!(engine.pending().is_none());
        assert!(scene.object("rock_02").is_some());
        assert_eq!(scene.file_path(), Some(temp.path().join("rock_02.blend").as_path()));
    }

    #[test]
    fn test_action_display() {
        let action = RenameAction::TextureFile {
            old_path: "/a/textures/rock_01_diff.png".into(),
            new_path: "/a/textures/rock_02_diff.png".into(),
            has_conflict: true,
        };
        assert_eq!(
            action.to_string(),
            "Rename texture: rock_01_diff.png → rock_02_diff.png [conflict]"
        );

        let action = RenameAction::Datablock {
            container: "objects".into(),
            old_name: "rock_01".into(),
            new_name: "rock_02".into(),
            has_conflict: false,
        };
        assert_eq!(action.to_string(), "Rename datablock: objects/rock_01 → objects/rock_02");
    }

    #[test]
    fn test_action_serialization_is_tagged() {
        let action = RenameAction::ParentFolder {
            old_path: "/a/rock_01".into(),
            new_path: "/a/rock_02".into(),
            has_conflict: false,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "parent_folder");
    }

    #[test]
    fn test_plan_counts() {
        let plan = RenamePlan {
            old_slug: "a".into(),
            new_slug: "b".into(),
            actions: vec![
                RenameAction::Datablock {
                    container: "objects".into(),
                    old_name: "a".into(),
                    new_name: "b".into(),
                    has_conflict: false,
                },
                RenameAction::Datablock {
                    container: "meshes".into(),
                    old_name: "a".into(),
                    new_name: "b".into(),
                    has_conflict: true,
                },
            ],
            discovery: DiscoveryStats::default(),
        };
        assert_eq!(plan.counts(), vec![("datablock", 2)]);
        assert_eq!(plan.conflicts().count(), 1);
    }
}
