//! In-memory scene backed by a JSON save file.
//!
//! `SceneSnapshot` is the reference [`SceneHost`]: the CLI loads one from the
//! asset's save file, and tests build them by hand. Saving writes the whole
//! snapshot back as JSON, so the save-file rename workflow has a real file to
//! back up and rewrite.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::errors::{HatError, Result, ResultExt};
use crate::scene::{
    Collection, Datablock, DatablockContainer, DatablockRef, Image, Material, SceneHost,
    SceneObject, SceneSettings, UnitSettings,
};

/// Access to the name and reference count shared by every datablock type.
trait Named {
    fn name(&self) -> &str;
    fn name_mut(&mut self) -> &mut String;
    fn users(&self) -> u32;
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn name_mut(&mut self) -> &mut String {
                &mut self.name
            }
            fn users(&self) -> u32 {
                self.users
            }
        })*
    };
}

impl_named!(SceneObject, Material, Image, Collection, Datablock);

fn refs<T: Named>(items: &[T]) -> impl Iterator<Item = DatablockRef<'_>> + '_ {
    items.iter().map(|item| DatablockRef {
        name: Cow::Borrowed(item.name()),
        users: item.users(),
    })
}

fn rename_in<T: Named>(items: &mut [T], old_name: &str, new_name: &str) -> bool {
    match items.iter_mut().find(|item| item.name() == old_name) {
        Some(item) => {
            *item.name_mut() = new_name.to_string();
            true
        }
        None => false,
    }
}

fn remove_from<T: Named>(items: &mut Vec<T>, name: &str) -> bool {
    let before = items.len();
    items.retain(|item| item.name() != name);
    items.len() != before
}

fn has<T: Named>(items: &[T], name: &str) -> bool {
    items.iter().any(|item| item.name() == name)
}

fn rename_reference(names: &mut [String], old_name: &str, new_name: &str) {
    for name in names.iter_mut().filter(|name| name.as_str() == old_name) {
        *name = new_name.to_string();
    }
}

/// A complete scene held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSnapshot {
    /// Host application version
    pub host_version: String,
    /// Per-scene settings
    pub settings: SceneSettings,
    /// Unit settings of the active scene
    pub unit_settings: UnitSettings,
    /// View layers in the active scene
    pub view_layers: usize,
    /// Scene datablocks
    pub scenes: Vec<Datablock>,
    /// Objects
    pub objects: Vec<SceneObject>,
    /// Mesh data
    pub meshes: Vec<Datablock>,
    /// Materials
    pub materials: Vec<Material>,
    /// Images
    pub images: Vec<Image>,
    /// Collections
    pub collections: Vec<Collection>,
    /// Worlds
    pub worlds: Vec<Datablock>,
    /// Node groups
    pub node_groups: Vec<Datablock>,
    /// Any further container, keyed by name
    pub other: BTreeMap<String, Vec<Datablock>>,

    #[serde(skip)]
    file_path: Option<PathBuf>,
    #[serde(skip)]
    dirty: bool,
}

impl Default for SceneSnapshot {
    fn default() -> Self {
        Self {
            host_version: String::new(),
            settings: SceneSettings::default(),
            unit_settings: UnitSettings::default(),
            view_layers: 1,
            scenes: vec![Datablock::new("Scene")],
            objects: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            images: Vec::new(),
            collections: Vec::new(),
            worlds: Vec::new(),
            node_groups: Vec::new(),
            other: BTreeMap::new(),
            file_path: None,
            dirty: false,
        }
    }
}

impl SceneSnapshot {
    /// An empty, unsaved scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a scene from its save file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| HatError::io_at("read scene", path, e))?;
        let mut snapshot: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scene {}", path.display()))?;
        snapshot.file_path = Some(path.to_path_buf());
        snapshot.dirty = false;
        debug!(
            "Loaded scene {} ({} objects, {} materials, {} images)",
            path.display(),
            snapshot.objects.len(),
            snapshot.materials.len(),
            snapshot.images.len()
        );
        Ok(snapshot)
    }

    /// Associate the scene with a save file without writing it.
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Flag unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Mutable access to the per-scene settings. Marks the scene dirty.
    pub fn settings_mut(&mut self) -> &mut SceneSettings {
        self.dirty = true;
        &mut self.settings
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| HatError::io_at("write scene", path, e))
    }

    fn container_names(&self) -> Vec<String> {
        let mut names: Vec<String> = [
            "scenes",
            "objects",
            "meshes",
            "materials",
            "images",
            "collections",
            "worlds",
            "node_groups",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect();
        names.extend(self.other.keys().cloned());
        names
    }
}

impl SceneHost for SceneSnapshot {
    fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn host_version(&self) -> &str {
        &self.host_version
    }

    fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    fn materials(&self) -> &[Material] {
        &self.materials
    }

    fn images(&self) -> &[Image] {
        &self.images
    }

    fn collections(&self) -> &[Collection] {
        &self.collections
    }

    fn worlds(&self) -> &[Datablock] {
        &self.worlds
    }

    fn node_groups(&self) -> &[Datablock] {
        &self.node_groups
    }

    fn scene_count(&self) -> usize {
        self.scenes.len().max(1)
    }

    fn view_layer_count(&self) -> usize {
        self.view_layers
    }

    fn unit_settings(&self) -> &UnitSettings {
        &self.unit_settings
    }

    fn list_containers(&self) -> Vec<DatablockContainer<'_>> {
        let mut containers = vec![
            DatablockContainer::new("scenes", refs(&self.scenes)),
            DatablockContainer::new("objects", refs(&self.objects)),
            DatablockContainer::new("meshes", refs(&self.meshes)),
            DatablockContainer::new("materials", refs(&self.materials)),
            DatablockContainer::new("images", refs(&self.images)),
            DatablockContainer::new("collections", refs(&self.collections)),
            DatablockContainer::new("worlds", refs(&self.worlds)),
            DatablockContainer::new("node_groups", refs(&self.node_groups)),
        ];
        for (name, items) in &self.other {
            containers.push(DatablockContainer::new(name.as_str(), refs(items)));
        }
        containers
    }

    fn contains_datablock(&self, container: &str, name: &str) -> bool {
        match container {
            "scenes" => has(&self.scenes, name),
            "objects" => has(&self.objects, name),
            "meshes" => has(&self.meshes, name),
            "materials" => has(&self.materials, name),
            "images" => has(&self.images, name),
            "collections" => has(&self.collections, name),
            "worlds" => has(&self.worlds, name),
            "node_groups" => has(&self.node_groups, name),
            other => self
                .other
                .get(other)
                .is_some_and(|items| has(items, name)),
        }
    }

    fn rename_datablock(&mut self, container: &str, old_name: &str, new_name: &str) -> Result<()> {
        let renamed = match container {
            "scenes" => rename_in(&mut self.scenes, old_name, new_name),
            "objects" => {
                let renamed = rename_in(&mut self.objects, old_name, new_name);
                for collection in &mut self.collections {
                    rename_reference(&mut collection.objects, old_name, new_name);
                }
                renamed
            }
            "meshes" => rename_in(&mut self.meshes, old_name, new_name),
            "materials" => rename_in(&mut self.materials, old_name, new_name),
            "images" => {
                let renamed = rename_in(&mut self.images, old_name, new_name);
                for node in self.materials.iter_mut().flat_map(|m| m.nodes.iter_mut()) {
                    if node.image.as_deref() == Some(old_name) {
                        node.image = Some(new_name.to_string());
                    }
                }
                renamed
            }
            "collections" => {
                let renamed = rename_in(&mut self.collections, old_name, new_name);
                for collection in &mut self.collections {
                    rename_reference(&mut collection.children, old_name, new_name);
                }
                renamed
            }
            "worlds" => rename_in(&mut self.worlds, old_name, new_name),
            "node_groups" => rename_in(&mut self.node_groups, old_name, new_name),
            other => self
                .other
                .get_mut(other)
                .is_some_and(|items| rename_in(items, old_name, new_name)),
        };

        if !renamed {
            return Err(HatError::host_target(
                format!("No datablock '{old_name}' in {container}"),
                old_name,
            ));
        }
        self.dirty = true;
        Ok(())
    }

    fn set_image_filepath(&mut self, image: &str, filepath: &str) -> Result<()> {
        let target = self
            .images
            .iter_mut()
            .find(|candidate| candidate.name == image)
            .ok_or_else(|| HatError::host_target(format!("No image '{image}'"), image))?;
        target.filepath = filepath.to_string();
        self.dirty = true;
        Ok(())
    }

    fn remove_datablock(&mut self, container: &str, name: &str) -> Result<()> {
        let removed = match container {
            "scenes" => remove_from(&mut self.scenes, name),
            "objects" => remove_from(&mut self.objects, name),
            "meshes" => remove_from(&mut self.meshes, name),
            "materials" => remove_from(&mut self.materials, name),
            "images" => remove_from(&mut self.images, name),
            "collections" => remove_from(&mut self.collections, name),
            "worlds" => remove_from(&mut self.worlds, name),
            "node_groups" => remove_from(&mut self.node_groups, name),
            other => self
                .other
                .get_mut(other)
                .is_some_and(|items| remove_from(items, name)),
        };

        if !removed {
            return Err(HatError::host_target(
                format!("No datablock '{name}' in {container}"),
                name,
            ));
        }
        self.dirty = true;
        Ok(())
    }

    fn store_report(&mut self, report_json: String) {
        self.settings.latest_report = report_json;
        self.dirty = true;
    }

    fn save(&mut self) -> Result<()> {
        let path = self
            .file_path
            .clone()
            .ok_or_else(|| HatError::precondition("Scene has never been saved"))?;
        self.write_to(&path)?;
        self.dirty = false;
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> Result<()> {
        self.write_to(path)?;
        self.file_path = Some(path.to_path_buf());
        self.dirty = false;
        debug!("Saved scene as {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ShaderNode;
    use tempfile::TempDir;

    fn textured_scene() -> SceneSnapshot {
        let mut scene = SceneSnapshot::new();
        scene.objects.push(SceneObject::mesh("rock_01"));
        scene.collections.push(Collection {
            name: "rock_01".into(),
            users: 1,
            children: vec![],
            objects: vec!["rock_01".into()],
        });
        scene.images.push(Image {
            name: "rock_01_diff.png".into(),
            filepath: "//textures/rock_01_diff.png".into(),
            colorspace: "sRGB".into(),
            packed: false,
            size: [2048, 2048],
            users: 1,
        });
        scene.materials.push(Material {
            name: "rock_01".into(),
            users: 1,
            use_nodes: true,
            is_grease_pencil: false,
            nodes: vec![ShaderNode {
                name: "Image Texture".into(),
                label: String::new(),
                node_type: "TEX_IMAGE".into(),
                image: Some("rock_01_diff.png".into()),
                inputs: vec![],
                outputs: vec![],
            }],
        });
        scene
    }

    #[test]
    fn test_rename_updates_references() {
        let mut scene = textured_scene();
        scene
            .rename_datablock("objects", "rock_01", "rock_02")
            .unwrap();
        scene
            .rename_datablock("images", "rock_01_diff.png", "rock_02_diff.png")
            .unwrap();

        assert_eq!(scene.collections[0].objects, vec!["rock_02"]);
        assert_eq!(
            scene.materials[0].nodes[0].image.as_deref(),
            Some("rock_02_diff.png")
        );
        assert!(scene.is_dirty());
    }

    #[test]
    fn test_rename_missing_datablock_fails() {
        let mut scene = textured_scene();
        let err = scene
            .rename_datablock("materials", "nope", "still_nope")
            .unwrap_err();
        assert!(matches!(err, HatError::Host { .. }));
        assert!(!scene.is_dirty());
    }

    #[test]
    fn test_load_names_unparsable_scene() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rock_01.blend");
        std::fs::write(&path, "not a scene").unwrap();

        let err = SceneSnapshot::load(&path).unwrap_err();
        assert!(matches!(err, HatError::Serialization { .. }));
        assert!(err.to_string().contains("rock_01.blend"));
    }

    #[test]
    fn test_texture_images_dedupe_by_path() {
        let mut scene = textured_scene();
        let duplicate = scene.materials[0].nodes[0].clone();
        scene.materials[0].nodes.push(duplicate);
        assert_eq!(scene.texture_images().len(), 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rock_01.blend");

        let mut scene = textured_scene();
        scene.mark_dirty();
        scene.save_as(&path).unwrap();
        assert!(!scene.is_dirty());
        assert_eq!(scene.file_path(), Some(path.as_path()));

        let loaded = SceneSnapshot::load(&path).unwrap();
        assert_eq!(loaded.objects, scene.objects);
        assert_eq!(loaded.file_path(), Some(path.as_path()));
    }

    #[test]
    fn test_containers_are_enumerated_in_order() {
        let mut scene = textured_scene();
        scene
            .other
            .insert("actions".into(), vec![Datablock::new("rock_01_idle")]);

        let names: Vec<String> = scene
            .list_containers()
            .into_iter()
            .map(|c| c.name.into_owned())
            .collect();
        assert_eq!(names.first().map(String::as_str), Some("scenes"));
        assert_eq!(names.last().map(String::as_str), Some("actions"));
        assert_eq!(names, scene.container_names());
        assert!(scene.contains_datablock("actions", "rock_01_idle"));
    }
}
