//! Built-in check catalog.
//!
//! Each check is an independent unit behind the [`Check`] trait. The catalog
//! is a tree of [`CheckModule`] entries whose paths mirror the subdirectory a
//! check belongs to (`materials/no_math_nodes`); the registry walks it once at
//! session start and keys each loaded check by that path.

pub mod asset_structure;
pub mod files;
pub mod general;
pub mod geometry;
pub mod materials;
pub mod technical;
pub mod textures;

use crate::core::config::ChecksConfig;
use crate::core::errors::Result;
use crate::core::report::CheckResult;
use crate::core::severity::Severity;
use crate::scene::{AssetType, SceneHost};

/// Everything a check may look at.
///
/// The scene is borrowed read-only: checks never mutate it.
#[derive(Clone, Copy)]
pub struct CheckContext<'a> {
    /// Slug of the asset under test
    pub slug: &'a str,
    /// Asset type the scene is prepared as
    pub asset_type: AssetType,
    /// The host scene
    pub scene: &'a dyn SceneHost,
    /// Check thresholds
    pub config: &'a ChecksConfig,
}

impl<'a> CheckContext<'a> {
    /// Build a context for one run.
    pub fn new(
        slug: &'a str,
        asset_type: AssetType,
        scene: &'a dyn SceneHost,
        config: &'a ChecksConfig,
    ) -> Self {
        Self {
            slug,
            asset_type,
            scene,
            config,
        }
    }

    /// Whether the scene is a texture asset.
    pub fn is_texture(&self) -> bool {
        self.asset_type == AssetType::Texture
    }

    /// Pick a severity depending on the asset type.
    ///
    /// Texture assets are held to a stricter standard than models for most
    /// shading rules.
    pub fn by_asset_type(&self, texture: Severity, model: Severity) -> Severity {
        if self.is_texture() {
            texture
        } else {
            model
        }
    }
}

impl std::fmt::Debug for CheckContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckContext")
            .field("slug", &self.slug)
            .field("asset_type", &self.asset_type)
            .finish_non_exhaustive()
    }
}

/// A single validation rule.
pub trait Check: Send + Sync {
    /// One-line description used for listings and the README checklist
    fn description(&self) -> &str;

    /// Inspect the scene and classify what was found
    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckResult>;
}

/// Signature of a stateless check routine.
pub type Routine = fn(&CheckContext<'_>) -> Result<CheckResult>;

/// A check made of a plain function and its description.
pub struct RoutineCheck {
    description: &'static str,
    routine: Routine,
}

impl RoutineCheck {
    /// Wrap a routine.
    pub fn new(description: &'static str, routine: Routine) -> Self {
        Self {
            description,
            routine,
        }
    }
}

impl Check for RoutineCheck {
    fn description(&self) -> &str {
        self.description
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        (self.routine)(ctx)
    }
}

/// Builds a check from the check configuration. Fails on unusable settings.
pub type Loader = fn(&ChecksConfig) -> Result<Box<dyn Check>>;

/// One entry of the check tree.
#[derive(Clone, Copy)]
pub struct CheckModule {
    /// Subdirectory-qualified name (`files/file_size`)
    pub path: &'static str,
    /// Constructor
    pub load: Loader,
}

impl CheckModule {
    /// Declare a module.
    pub const fn new(path: &'static str, load: Loader) -> Self {
        Self { path, load }
    }

    /// Whether the module lives at or below the catalog directory `root`.
    ///
    /// An empty root covers the whole tree.
    pub fn is_below(&self, root: &str) -> bool {
        let root = root.trim_matches('/');
        root.is_empty()
            || self
                .path
                .strip_prefix(root)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl std::fmt::Debug for CheckModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckModule")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Declare a catalog entry for a stateless routine.
macro_rules! routine {
    ($path:literal, $description:literal, $routine:path) => {
        $crate::checks::CheckModule::new($path, |_config| {
            Ok(Box::new($crate::checks::RoutineCheck::new(
                $description,
                $routine,
            )))
        })
    };
}
pub(crate) use routine;

/// The complete built-in catalog, in no particular order.
pub fn catalog() -> Vec<CheckModule> {
    let mut modules = Vec::new();
    modules.extend_from_slice(general::MODULES);
    modules.extend_from_slice(asset_structure::MODULES);
    modules.extend_from_slice(files::MODULES);
    modules.extend_from_slice(geometry::MODULES);
    modules.extend_from_slice(materials::MODULES);
    modules.extend_from_slice(technical::MODULES);
    modules.extend_from_slice(textures::MODULES);
    modules
}
