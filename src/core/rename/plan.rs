//! Rename planning. Reads the host and the file system, never writes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{DiscoveryStats, RenameAction, RenamePlan};
use crate::core::config::RenameConfig;
use crate::core::naming::replace_slug_prefix;
use crate::scene::SceneHost;

/// Build the ordered action list for renaming `old_slug` to `new_slug`.
///
/// Actions come grouped: texture files, datablocks, save file, parent folder.
/// An empty or unchanged slug plans nothing, and actions that would keep
/// their current name are left out.
pub fn plan_rename(
    host: &dyn SceneHost,
    old_slug: &str,
    new_slug: &str,
    config: &RenameConfig,
) -> RenamePlan {
    let mut actions = Vec::new();

    if old_slug.is_empty() || new_slug.is_empty() || old_slug == new_slug {
        debug!("Nothing to rename from '{}' to '{}'", old_slug, new_slug);
        return RenamePlan {
            old_slug: old_slug.to_string(),
            new_slug: new_slug.to_string(),
            actions,
            discovery: DiscoveryStats::default(),
        };
    }

    if let Some(save_dir) = host.save_dir() {
        actions.extend(plan_textures(
            &save_dir.join(&config.textures_dir),
            old_slug,
            new_slug,
        ));
    }

    let (datablocks, discovery) = plan_datablocks(host, old_slug, new_slug, config);
    actions.extend(datablocks);

    if let Some(file_path) = host.file_path() {
        actions.extend(plan_save_file(file_path, old_slug, new_slug, config));
    }
    actions.retain(|action| !action.is_noop());

    RenamePlan {
        old_slug: old_slug.to_string(),
        new_slug: new_slug.to_string(),
        actions,
        discovery,
    }
}

fn plan_textures(textures_dir: &Path, old_slug: &str, new_slug: &str) -> Vec<RenameAction> {
    let entries = match fs::read_dir(textures_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No textures to rename in {}: {}", textures_dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    files
        .into_iter()
        .filter_map(|old_path| {
            let name = old_path.file_name()?.to_str()?;
            let new_name = replace_slug_prefix(name, old_slug, new_slug)?;
            let new_path = textures_dir.join(new_name);
            let has_conflict = new_path.exists();
            if has_conflict {
                warn!("Texture target already exists: {}", new_path.display());
            }
            Some(RenameAction::TextureFile {
                old_path,
                new_path,
                has_conflict,
            })
        })
        .collect()
}

fn plan_datablocks(
    host: &dyn SceneHost,
    old_slug: &str,
    new_slug: &str,
    config: &RenameConfig,
) -> (Vec<RenameAction>, DiscoveryStats) {
    let started = Instant::now();
    plan_datablocks_timed(host, old_slug, new_slug, config, &mut || started.elapsed())
}

/// Datablock search measured against `elapsed`, the time spent so far.
fn plan_datablocks_timed(
    host: &dyn SceneHost,
    old_slug: &str,
    new_slug: &str,
    config: &RenameConfig,
    elapsed: &mut dyn FnMut() -> Duration,
) -> (Vec<RenameAction>, DiscoveryStats) {
    let budget = config.search_budget();
    let interval = config.budget_check_interval.max(1);

    let mut actions = Vec::new();
    let mut stats = DiscoveryStats::default();

    'containers: for container in host.list_containers() {
        if elapsed() >= budget {
            warn!(
                "Datablock search budget of {}ms exhausted before '{}'",
                config.search_budget_ms, container.name
            );
            stats.budget_exhausted = true;
            break;
        }
        stats.containers_searched += 1;
        let container_name = container.name.into_owned();

        for (index, item) in container.items.enumerate() {
            if index >= config.max_items_per_container {
                warn!(
                    "Stopped searching '{}' after {} items",
                    container_name, config.max_items_per_container
                );
                stats.truncated_containers.push(container_name.clone());
                break;
            }
            if index > 0 && index % interval == 0 && elapsed() >= budget {
                warn!(
                    "Datablock search budget of {}ms exhausted inside '{}'",
                    config.search_budget_ms, container_name
                );
                stats.budget_exhausted = true;
                break 'containers;
            }
            stats.items_inspected += 1;

            let Some(new_name) = replace_slug_prefix(&item.name, old_slug, new_slug) else {
                continue;
            };
            let has_conflict = host.contains_datablock(&container_name, &new_name);
            debug!("Found datablock {}.{}", container_name, item.name);
            actions.push(RenameAction::Datablock {
                container: container_name.clone(),
                old_name: item.name.into_owned(),
                new_name,
                has_conflict,
            });
        }
    }

    stats.elapsed_ms = u64::try_from(elapsed().as_millis()).unwrap_or(u64::MAX);
    debug!(
        "Searched {} containers ({} items) in {}ms, found {} datablocks",
        stats.containers_searched,
        stats.items_inspected,
        stats.elapsed_ms,
        actions.len()
    );
    (actions, stats)
}

fn plan_save_file(
    file_path: &Path,
    old_slug: &str,
    new_slug: &str,
    config: &RenameConfig,
) -> Vec<RenameAction> {
    let mut actions = Vec::new();
    let Some(folder) = file_path.parent() else {
        return actions;
    };

    let new_file_name = file_path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| replace_slug_prefix(name, old_slug, new_slug));
    if let Some(new_file_name) = new_file_name {
        let new_path = folder.join(&new_file_name);
        let backup_path = folder.join(format!("{new_file_name}{}", config.backup_suffix));
        let has_conflict = new_path.exists() || backup_path.exists();
        actions.push(RenameAction::SaveFile {
            old_path: file_path.to_path_buf(),
            new_path,
            backup_path,
            has_conflict,
        });
    }

    let parent = folder
        .parent()
        .filter(|_| folder.file_name().and_then(|name| name.to_str()) == Some(old_slug));
    if let Some(parent) = parent {
        let new_path = parent.join(new_slug);
        actions.push(RenameAction::ParentFolder {
            old_path: folder.to_path_buf(),
            has_conflict: new_path.exists(),
            new_path,
        });
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Datablock, SceneObject, SceneSnapshot};
    use tempfile::TempDir;

    fn asset_folder(temp: &TempDir, textures: &[&str]) -> PathBuf {
        let folder = temp.path().join("rock_01");
        fs::create_dir_all(folder.join("textures")).unwrap();
        for name in textures {
            fs::write(folder.join("textures").join(name), b"png").unwrap();
        }
        folder
    }

    fn scene_in(folder: &Path) -> SceneSnapshot {
        let mut scene = SceneSnapshot::new().with_file_path(folder.join("rock_01.blend"));
        scene.objects.push(SceneObject::mesh("rock_01"));
        scene.objects.push(SceneObject::mesh("rock_01_LOD1"));
        scene.objects.push(SceneObject::mesh("other_rock_01"));
        scene
    }

    fn snapshot(dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok().map(|entry| entry.into_path()))
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_texture_conflict_detected_without_mutation() {
        let temp = TempDir::new().unwrap();
        let folder = asset_folder(&temp, &["rock_01_diff.png", "rock_02_diff.png", "notes.txt"]);
        let scene = scene_in(&folder);

        let before = snapshot(temp.path());
        let plan = plan_rename(&scene, "rock_01", "rock_02", &RenameConfig::default());
        assert_eq!(before, snapshot(temp.path()));

        let textures: Vec<_> = plan
            .actions
            .iter()
            .filter(|action| matches!(action, RenameAction::TextureFile { .. }))
            .collect();
        assert_eq!(textures.len(), 1);
        assert!(textures[0].has_conflict());
        assert_eq!(textures[0].target(), "rock_02_diff.png");
    }

    #[test]
    fn test_datablock_prefix_replacement() {
        let temp = TempDir::new().unwrap();
        let folder = asset_folder(&temp, &[]);
        let scene = scene_in(&folder);

        let plan = plan_rename(&scene, "rock_01", "rock_02", &RenameConfig::default());
        let renamed: Vec<(String, String)> = plan
            .actions
            .iter()
            .filter_map(|action| match action {
                RenameAction::Datablock {
                    old_name, new_name, ..
                } => Some((old_name.clone(), new_name.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            renamed,
            vec![
                ("rock_01".to_string(), "rock_02".to_string()),
                ("rock_01_LOD1".to_string(), "rock_02_LOD1".to_string()),
            ]
        );
        assert!(!plan.discovery.is_truncated());
    }

    #[test]
    fn test_datablock_conflict_is_per_container() {
        let mut scene = SceneSnapshot::new().with_file_path("/nowhere/rock_01.blend");
        scene.objects.push(SceneObject::mesh("rock_01"));
        scene.objects.push(SceneObject::mesh("rock_02"));
        scene.meshes.push(Datablock::new("rock_01"));

        let plan = plan_rename(&scene, "rock_01", "rock_02", &RenameConfig::default());
        let conflicts: Vec<String> = plan.conflicts().map(RenameAction::source).collect();
        assert_eq!(conflicts, vec!["objects/rock_01"]);
    }

    #[test]
    fn test_item_cap_truncates_container() {
        let mut scene = SceneSnapshot::new();
        for i in 0..5 {
            scene.objects.push(SceneObject::mesh(format!("rock_01_{i}")));
        }
        let config = RenameConfig {
            max_items_per_container: 3,
            ..RenameConfig::default()
        };

        let plan = plan_rename(&scene, "rock_01", "rock_02", &config);
        assert_eq!(plan.actions.len(), 3);
        assert_eq!(plan.discovery.truncated_containers, vec!["objects"]);
        assert!(!plan.discovery.budget_exhausted);
    }

    #[test]
    fn test_zero_budget_searches_nothing() {
        let mut scene = SceneSnapshot::new();
        scene.objects.push(SceneObject::mesh("rock_01"));
        let config = RenameConfig {
            search_budget_ms: 0,
            ..RenameConfig::default()
        };

        let plan = plan_rename(&scene, "rock_01", "rock_02", &config);
        assert!(plan.discovery.budget_exhausted);
        assert_eq!(plan.discovery.containers_searched, 0);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_budget_exhausted_inside_container() {
        let mut scene = SceneSnapshot::new();
        for i in 0..6 {
            scene.objects.push(SceneObject::mesh(format!("rock_01_{i}")));
        }
        scene.meshes.push(Datablock::new("rock_01"));
        let config = RenameConfig {
            search_budget_ms: 10,
            budget_check_interval: 2,
            ..RenameConfig::default()
        };

        // Readings taken before `scenes` and `objects` are within budget,
        // every later one is past it.
        let mut readings = 0u32;
        let mut clock = || {
            readings += 1;
            if readings <= 2 {
                Duration::ZERO
            } else {
                Duration::from_secs(1)
            }
        };
        let (actions, stats) =
            plan_datablocks_timed(&scene, "rock_01", "rock_02", &config, &mut clock);

        assert!(stats.budget_exhausted);
        assert_eq!(stats.containers_searched, 2);
        assert_eq!(stats.items_inspected, 3);
        assert_eq!(actions.len(), 2);
        assert!(stats.truncated_containers.is_empty());
    }

    #[test]
    fn test_empty_slugs_plan_nothing() {
        let temp = TempDir::new().unwrap();
        let folder = asset_folder(&temp, &["rock_01_diff.png"]);
        let scene = scene_in(&folder);
        let config = RenameConfig::default();

        assert!(plan_rename(&scene, "rock_01", "", &config).is_empty());
        assert!(plan_rename(&scene, "", "rock_02", &config).is_empty());
    }

    #[test]
    fn test_unchanged_slug_plans_nothing() {
        let temp = TempDir::new().unwrap();
        let folder = asset_folder(&temp, &["rock_01_diff.png"]);
        let scene = scene_in(&folder);

        let plan = plan_rename(&scene, "rock_01", "rock_01", &RenameConfig::default());
        assert!(plan.actions.is_empty());
        assert_eq!(plan.conflicts().count(), 0);
    }

    #[test]
    fn test_save_file_and_folder_actions() {
        let temp = TempDir::new().unwrap();
        let folder = asset_folder(&temp, &[]);
        fs::write(folder.join("rock_02.blend1"), b"old backup").unwrap();
        let scene = scene_in(&folder);

        let plan = plan_rename(&scene, "rock_01", "rock_02", &RenameConfig::default());
        let tail: Vec<&RenameAction> = plan.actions.iter().rev().take(2).collect();
        match tail[1] {
            RenameAction::SaveFile {
                new_path,
                backup_path,
                has_conflict,
                ..
            } => {
                assert_eq!(new_path, &folder.join("rock_02.blend"));
                assert_eq!(backup_path, &folder.join("rock_02.blend1"));
                assert!(has_conflict);
            }
            other => panic!("expected save file action, got {other:?}"),
        }
        match tail[0] {
            RenameAction::ParentFolder {
                new_path,
                has_conflict,
                ..
            } => {
                assert_eq!(new_path, &temp.path().join("rock_02"));
                assert!(!has_conflict);
            }
            other => panic!("expected folder action, got {other:?}"),
        }
    }

    #[test]
    fn test_unrelated_save_file_is_left_alone() {
        let scene = SceneSnapshot::new().with_file_path("/assets/shared/library.blend");
        let plan = plan_rename(&scene, "rock_01", "rock_02", &RenameConfig::default());
        assert!(plan.is_empty());
    }
}
