//! Asset folder layout validation.
//!
//! Walks the folder holding the save file and classifies every entry against
//! the required and valid patterns of the asset type. Patterns are shell-style
//! globs matched case-insensitively against entry names, with the literal
//! `slug` standing in for the asset's slug.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use serde::Serialize;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::core::config::{FolderRules, FolderStructureConfig};
use crate::core::errors::{HatError, Result};
use crate::core::naming::{derive_map_name, is_standard_map_name, strip_extension, strip_resolution_suffix};
use crate::scene::AssetType;

/// Key of the asset root in the rule tables.
pub const ROOT_FOLDER: &str = "/";

/// Folder whose files are compared without their resolution suffix.
pub const TEXTURES_FOLDER: &str = "textures";

/// How an entry relates to the layout rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Matches a required pattern
    Required,
    /// Allowed but not required
    Valid,
    /// Not allowed here
    Invalid,
    /// A texture whose map name is not recognised
    Unknown,
}

impl EntryStatus {
    /// Whether the entry needs attention.
    pub fn is_problem(self) -> bool {
        matches!(self, Self::Invalid | Self::Unknown)
    }
}

/// One file or folder below the asset root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    /// Path relative to the asset root
    pub path: PathBuf,
    /// Entry name
    pub name: String,
    /// Nesting level, 0 for direct children of the root
    pub depth: usize,
    /// Folder or file
    pub is_dir: bool,
    /// Classification
    pub status: EntryStatus,
}

/// A required pattern nothing matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingItem {
    /// Folder the pattern applies to, relative to the root
    pub folder: PathBuf,
    /// Pattern with the slug filled in
    pub pattern: String,
}

/// Result of inspecting an asset folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderReport {
    /// Asset root
    pub root: PathBuf,
    /// Visible entries, folders before files, depth first
    pub entries: Vec<FolderEntry>,
    /// Required items missing from folders that exist
    pub missing_items: Vec<MissingItem>,
    /// Required folders missing from the root
    pub missing_folders: Vec<String>,
}

impl FolderReport {
    /// Whether nothing is missing or misplaced.
    pub fn is_clean(&self) -> bool {
        self.missing_items.is_empty()
            && self.missing_folders.is_empty()
            && !self.entries.iter().any(|entry| entry.status.is_problem())
    }

    /// Number of entries with the given status.
    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    Ok(GlobBuilder::new(pattern)
        .case_insensitive(true)
        .build()?
        .compile_matcher())
}

/// Required and valid patterns of one folder, slug filled in.
struct FolderPatterns {
    required: Vec<(String, GlobMatcher)>,
    valid: Vec<GlobMatcher>,
}

/// Compiled rules for one asset type.
struct Rules<'a> {
    source: &'a FolderRules,
    folders: HashMap<&'a str, FolderPatterns>,
    ignored: GlobSet,
    slug: &'a str,
    strict_maps: bool,
}

impl<'a> Rules<'a> {
    fn compile(
        source: &'a FolderRules,
        ignored: &[String],
        slug: &'a str,
        asset_type: AssetType,
    ) -> Result<Self> {
        let mut folders: HashMap<&str, FolderPatterns> = HashMap::new();
        for (folder, patterns) in &source.required {
            let entry = folders.entry(folder.as_str()).or_insert_with(|| FolderPatterns {
                required: Vec::new(),
                valid: Vec::new(),
            });
            for pattern in patterns {
                let actual = pattern.replace("slug", slug);
                let matcher = compile(&actual)?;
                entry.required.push((actual, matcher));
            }
        }
        for (folder, patterns) in &source.valid {
            let entry = folders.entry(folder.as_str()).or_insert_with(|| FolderPatterns {
                required: Vec::new(),
                valid: Vec::new(),
            });
            for pattern in patterns {
                entry.valid.push(compile(&pattern.replace("slug", slug))?);
            }
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in ignored {
            builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
        }

        Ok(Self {
            source,
            folders,
            ignored: builder.build()?,
            slug,
            strict_maps: asset_type == AssetType::Texture,
        })
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignored.is_match(name)
    }

    fn folder_status(&self, name: &str, current: &str) -> EntryStatus {
        if self.source.required.contains_key(name) {
            EntryStatus::Required
        } else if self.source.valid.contains_key(name) || current != ROOT_FOLDER {
            EntryStatus::Valid
        } else {
            EntryStatus::Invalid
        }
    }

    fn file_status(&self, name: &str, current: &str) -> EntryStatus {
        let compared = comparable_name(name, current);
        let patterns = self.folders.get(current);

        if patterns.is_some_and(|p| p.required.iter().any(|(_, m)| m.is_match(&compared))) {
            return EntryStatus::Required;
        }
        if current == TEXTURES_FOLDER
            && !is_standard_map_name(&derive_map_name(name, self.slug, self.strict_maps))
        {
            return EntryStatus::Unknown;
        }
        if patterns.is_some_and(|p| p.valid.iter().any(|m| m.is_match(&compared))) {
            return EntryStatus::Valid;
        }
        EntryStatus::Invalid
    }

    fn missing_in(&self, current: &str, names: &[String]) -> Vec<String> {
        let Some(patterns) = self.folders.get(current) else {
            return Vec::new();
        };
        patterns
            .required
            .iter()
            .filter(|(_, matcher)| {
                !names
                    .iter()
                    .any(|name| matcher.is_match(comparable_name(name, current)))
            })
            .map(|(pattern, _)| pattern.clone())
            .collect()
    }
}

/// Name used for pattern matching: texture files lose their resolution
/// suffix (`rock_01_diff_4k.png` compares as `rock_01_diff.png`).
fn comparable_name(name: &str, current: &str) -> String {
    if current != TEXTURES_FOLDER {
        return name.to_string();
    }
    let stem = strip_extension(name);
    let extension = &name[stem.len()..];
    format!("{}{}", strip_resolution_suffix(stem), extension)
}

fn sort_entries(a: &DirEntry, b: &DirEntry) -> std::cmp::Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| {
            a.file_name()
                .to_string_lossy()
                .to_lowercase()
                .cmp(&b.file_name().to_string_lossy().to_lowercase())
        })
}

/// Inspect the asset folder at `root` (or the folder containing `root` when it
/// is a file).
pub fn inspect(
    root: &Path,
    slug: &str,
    asset_type: AssetType,
    config: &FolderStructureConfig,
) -> Result<FolderReport> {
    let metadata = fs::metadata(root).map_err(|e| HatError::io_at("inspect", root, e))?;
    let root = if metadata.is_file() {
        root.parent().unwrap_or(root)
    } else {
        root
    };

    let rules = Rules::compile(config.rules(asset_type), &config.ignored, slug, asset_type)?;

    let mut entries = Vec::new();
    let mut children: HashMap<PathBuf, Vec<String>> = HashMap::new();
    let mut inspected = vec![PathBuf::new()];

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(config.max_depth)
        .sort_by(sort_entries)
        .into_iter()
        .filter_entry(|entry| !rules.is_ignored(&entry.file_name().to_string_lossy()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry below {}: {}", root.display(), e);
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative.to_path_buf();
        let parent = relative.parent().map(Path::to_path_buf).unwrap_or_default();
        let current = folder_key(&parent);
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().is_dir();

        let status = if is_dir {
            rules.folder_status(&name, &current)
        } else {
            rules.file_status(&name, &current)
        };
        if is_dir && entry.depth() < config.max_depth {
            inspected.push(relative.clone());
        }
        children.entry(parent).or_default().push(name.clone());
        entries.push(FolderEntry {
            path: relative,
            name,
            depth: entry.depth() - 1,
            is_dir,
            status,
        });
    }

    let mut missing_items = Vec::new();
    for folder in inspected {
        let names = children.get(&folder).map(Vec::as_slice).unwrap_or_default();
        for pattern in rules.missing_in(&folder_key(&folder), names) {
            missing_items.push(MissingItem {
                folder: folder.clone(),
                pattern,
            });
        }
    }

    let missing_folders = rules
        .source
        .required
        .keys()
        .filter(|folder| folder.as_str() != ROOT_FOLDER)
        .filter(|folder| {
            !entries
                .iter()
                .any(|entry| entry.depth == 0 && entry.is_dir && &entry.name == *folder)
        })
        .cloned()
        .collect();

    Ok(FolderReport {
        root: root.to_path_buf(),
        entries,
        missing_items,
        missing_folders,
    })
}

/// Rule-table key of a folder relative to the root.
fn folder_key(relative: &Path) -> String {
    relative
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| ROOT_FOLDER.to_string())
}
