//! Configuration types and management for hat-rs.
//!
//! Every threshold the checks, the rename engine and the folder inspector use
//! lives here so a studio can tune them in a YAML file without touching code.

pub mod validation;

use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::errors::{HatError, Result, ResultExt};
use crate::core::report::UNSAVED_CHANGES_MESSAGE;
use crate::scene::AssetType;

pub use validation::{
    validate_glob_patterns, validate_non_empty, validate_ordered_range, validate_path_segment,
    validate_positive_u64, validate_positive_usize, validate_version,
};

/// Main configuration for the hat engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HatConfig {
    /// Check discovery and per-check thresholds
    #[serde(default)]
    pub checks: ChecksConfig,

    /// Report aggregation settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Slug rename workflow settings
    #[serde(default)]
    pub rename: RenameConfig,

    /// Asset folder layout rules
    #[serde(default)]
    pub folder_structure: FolderStructureConfig,
}

impl HatConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            HatError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            HatError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.checks.validate()?;
        self.report.validate()?;
        self.rename.validate()?;
        self.folder_structure.validate()?;
        Ok(())
    }
}

/// Check discovery and per-check thresholds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Only discover checks below this catalog subdirectory (empty: all)
    #[serde(default)]
    pub root: String,

    /// Qualified names of checks that never run
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Save file size limits per asset type
    #[serde(default)]
    pub file_size: FileSizeLimits,

    /// Accepted range for an unlinked Principled BSDF `Specular IOR Level`
    #[serde(default)]
    pub specular_ior_range: IorRange,

    /// Latest official host release; the version check is skipped when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_host_version: Option<String>,
}

impl ChecksConfig {
    /// Whether the named check is switched off.
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|disabled| disabled == name)
    }

    /// Validate check settings
    pub fn validate(&self) -> Result<()> {
        if self.root.contains('\\') || self.root.starts_with('/') {
            return Err(HatError::config_field(
                "Check root must be a relative catalog path like 'materials'",
                "checks.root",
            ));
        }
        self.file_size.model.validate("checks.file_size.model")?;
        self.file_size.texture.validate("checks.file_size.texture")?;
        self.specular_ior_range.validate()?;
        if let Some(version) = &self.latest_host_version {
            validate_version(version, "checks.latest_host_version")?;
        }
        Ok(())
    }
}

/// Warn and fail thresholds in kilobytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimit {
    /// Above this the check warns
    pub warn_kb: u64,
    /// Above this the check errors
    pub max_kb: u64,
}

impl SizeLimit {
    fn validate(&self, field: &str) -> Result<()> {
        validate_positive_u64(self.warn_kb, &format!("{field}.warn_kb"))?;
        validate_positive_u64(self.max_kb, &format!("{field}.max_kb"))?;
        if self.warn_kb > self.max_kb {
            return Err(HatError::config_field(
                "warn_kb must not exceed max_kb",
                field.to_string(),
            ));
        }
        Ok(())
    }
}

/// Save file size limits per asset type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSizeLimits {
    /// Limits for model assets
    pub model: SizeLimit,
    /// Limits for texture assets
    pub texture: SizeLimit,
}

impl Default for FileSizeLimits {
    fn default() -> Self {
        Self {
            model: SizeLimit {
                warn_kb: 10 * 1024,
                max_kb: 100 * 1024,
            },
            texture: SizeLimit {
                warn_kb: 300,
                max_kb: 500,
            },
        }
    }
}

impl FileSizeLimits {
    /// Limits for the given asset type.
    pub fn for_asset(&self, asset_type: AssetType) -> SizeLimit {
        match asset_type {
            AssetType::Model => self.model,
            AssetType::Texture => self.texture,
        }
    }
}

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IorRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl Default for IorRange {
    fn default() -> Self {
        Self { min: 0.4, max: 0.6 }
    }
}

impl IorRange {
    /// Whether `value` lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn validate(&self) -> Result<()> {
        validate_ordered_range(self.min, self.max, "checks.specular_ior_range")
    }
}

/// Report aggregation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Messages that do not prevent the "all checks passed" entry
    #[serde(default = "ReportConfig::default_ignorable_messages")]
    pub ignorable_messages: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            ignorable_messages: Self::default_ignorable_messages(),
        }
    }
}

impl ReportConfig {
    fn default_ignorable_messages() -> Vec<String> {
        vec![UNSAVED_CHANGES_MESSAGE.to_string()]
    }

    /// Validate report settings
    pub fn validate(&self) -> Result<()> {
        for message in &self.ignorable_messages {
            validate_non_empty(message, "report.ignorable_messages")?;
        }
        Ok(())
    }
}

/// Slug rename workflow settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameConfig {
    /// Texture directory next to the save file
    #[serde(default = "RenameConfig::default_textures_dir")]
    pub textures_dir: String,

    /// Wall-clock budget for the datablock search in milliseconds
    #[serde(default = "RenameConfig::default_search_budget_ms")]
    pub search_budget_ms: u64,

    /// Items inspected per datablock container before giving up on it
    #[serde(default = "RenameConfig::default_max_items_per_container")]
    pub max_items_per_container: usize,

    /// How many items pass between budget checks inside a container
    #[serde(default = "RenameConfig::default_budget_check_interval")]
    pub budget_check_interval: usize,

    /// Appended to the save file extension to form the backup name
    #[serde(default = "RenameConfig::default_backup_suffix")]
    pub backup_suffix: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            textures_dir: Self::default_textures_dir(),
            search_budget_ms: Self::default_search_budget_ms(),
            max_items_per_container: Self::default_max_items_per_container(),
            budget_check_interval: Self::default_budget_check_interval(),
            backup_suffix: Self::default_backup_suffix(),
        }
    }
}

impl RenameConfig {
    fn default_textures_dir() -> String {
        "textures".to_string()
    }

    const fn default_search_budget_ms() -> u64 {
        10_000
    }

    const fn default_max_items_per_container() -> usize {
        10_000
    }

    const fn default_budget_check_interval() -> usize {
        1_000
    }

    fn default_backup_suffix() -> String {
        "1".to_string()
    }

    /// Datablock search budget as a duration.
    pub fn search_budget(&self) -> Duration {
        Duration::from_millis(self.search_budget_ms)
    }

    /// Validate rename settings
    pub fn validate(&self) -> Result<()> {
        validate_path_segment(&self.textures_dir, "rename.textures_dir")?;
        validate_positive_u64(self.search_budget_ms, "rename.search_budget_ms")?;
        validate_positive_usize(self.max_items_per_container, "rename.max_items_per_container")?;
        validate_positive_usize(self.budget_check_interval, "rename.budget_check_interval")?;
        validate_non_empty(&self.backup_suffix, "rename.backup_suffix")?;
        Ok(())
    }
}

/// Required and valid patterns per folder for one asset type.
///
/// Keys are folder names relative to the asset root, `/` being the root
/// itself. Patterns are case-insensitive globs where `slug` stands for the
/// asset slug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRules {
    /// Entries that must be present
    #[serde(default)]
    pub required: IndexMap<String, Vec<String>>,
    /// Entries that may be present
    #[serde(default)]
    pub valid: IndexMap<String, Vec<String>>,
}

impl FolderRules {
    fn validate(&self, field: &str) -> Result<()> {
        for (folder, patterns) in self.required.iter().chain(self.valid.iter()) {
            validate_non_empty(folder, &format!("{field}.{folder}"))?;
            validate_glob_patterns(patterns, &format!("{field}.{folder}"))?;
        }
        Ok(())
    }
}

/// Asset folder layout rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStructureConfig {
    /// Deepest folder level inspected
    #[serde(default = "FolderStructureConfig::default_max_depth")]
    pub max_depth: usize,

    /// Entries hidden from the listing
    #[serde(default = "FolderStructureConfig::default_ignored")]
    pub ignored: Vec<String>,

    /// Rules for model assets
    #[serde(default = "FolderStructureConfig::default_model")]
    pub model: FolderRules,

    /// Rules for texture assets
    #[serde(default = "FolderStructureConfig::default_texture")]
    pub texture: FolderRules,
}

impl Default for FolderStructureConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
            ignored: Self::default_ignored(),
            model: Self::default_model(),
            texture: Self::default_texture(),
        }
    }
}

fn patterns(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

const VALID_ROOT_COMMON: &[&str] = &[
    "*.blend",
    "*.gltf",
    "*.bin",
    "*.txt",
    "*.files.json",
    "*.obj",
    "*.mtl",
    "*.fbx",
    "*.ply",
];

impl FolderStructureConfig {
    const fn default_max_depth() -> usize {
        6
    }

    fn default_ignored() -> Vec<String> {
        patterns(&[
            "_upload",
            "*.blend1",
            "*.blend2",
            "nosubsurf.blend",
            "desktop.ini",
            ".DS_Store",
            "Thumbs.db",
        ])
    }

    fn default_model() -> FolderRules {
        FolderRules {
            required: IndexMap::from([
                ("/".to_string(), patterns(&["slug.blend"])),
                ("textures".to_string(), patterns(&["slug_*.png"])),
                (
                    "renders".to_string(),
                    patterns(&[
                        "primary.png",
                        "thumbnail.png",
                        "clay.png",
                        "orth_front.png",
                        "orth_side.png",
                        "orth_top.png",
                    ]),
                ),
            ]),
            valid: IndexMap::from([
                ("/".to_string(), patterns(VALID_ROOT_COMMON)),
                ("renders".to_string(), patterns(&["*.png"])),
                ("references".to_string(), patterns(&["*.*"])),
            ]),
        }
    }

    fn default_texture() -> FolderRules {
        FolderRules {
            required: IndexMap::from([
                ("/".to_string(), patterns(&["slug.blend"])),
                (
                    "textures".to_string(),
                    patterns(&["slug_diff.png", "slug_rough.png", "slug_nor_gl.png"]),
                ),
                (
                    "renders".to_string(),
                    patterns(&["primary.png", "thumbnail.png", "clay.png"]),
                ),
                (
                    "references".to_string(),
                    patterns(&[
                        "chart.*",
                        "ref_*.*",
                        "spec_*.*",
                        "comparison_*.*",
                        "comparison.blend",
                    ]),
                ),
            ]),
            valid: IndexMap::from([
                ("/".to_string(), patterns(VALID_ROOT_COMMON)),
                ("textures".to_string(), patterns(&["slug_*.png"])),
                ("renders".to_string(), patterns(&["*.png"])),
                ("references".to_string(), patterns(&["*.*"])),
            ]),
        }
    }

    /// Rules for the given asset type.
    pub fn rules(&self, asset_type: AssetType) -> &FolderRules {
        match asset_type {
            AssetType::Model => &self.model,
            AssetType::Texture => &self.texture,
        }
    }

    /// Validate folder structure settings
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.max_depth, "folder_structure.max_depth")?;
        validate_glob_patterns(&self.ignored, "folder_structure.ignored")?;
        self.model.validate("folder_structure.model")?;
        self.texture.validate("folder_structure.texture")?;
        Ok(())
    }
}
