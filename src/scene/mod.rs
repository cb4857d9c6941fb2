//! Host scene collaborator.
//!
//! Checks and the rename engine never reach into a host application directly.
//! They go through [`SceneHost`], an explicit capability interface: typed
//! read accessors for the entities checks inspect, an enumerated list of named
//! datablock containers for generic traversal, and the handful of mutations
//! the rename workflow and maintenance operations need.

pub mod paths;
pub mod snapshot;

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

pub use snapshot::SceneSnapshot;

/// Kind of asset the scene is being prepared as.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// A 3D model with its own textures
    #[default]
    Model,
    /// A texture set shown on preview geometry
    Texture,
}

impl AssetType {
    /// Lowercase name used in config files and output.
    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::Model => "model",
            AssetType::Texture => "texture",
        }
    }

    /// Whether this is a model asset.
    pub fn is_model(self) -> bool {
        self == AssetType::Model
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-scene settings record kept by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Model or texture
    pub asset_type: AssetType,
    /// Run the checks every time the file is saved
    pub test_on_save: bool,
    /// Serialized report of the latest run, empty before the first run
    pub latest_report: String,
}

/// Object type as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    /// Polygon mesh
    #[default]
    Mesh,
    /// Camera
    Camera,
    /// Light source
    Light,
    /// Empty / locator
    Empty,
    /// Curve
    Curve,
    /// Armature
    Armature,
    /// Anything else
    #[serde(other)]
    Other,
}

fn one() -> u32 {
    1
}

fn unit_vector() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

fn default_true() -> bool {
    true
}

/// A scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Datablock name
    pub name: String,
    /// Object type
    #[serde(default)]
    pub kind: ObjectKind,
    /// Reference count
    #[serde(default = "one")]
    pub users: u32,
    /// World-space location
    #[serde(default)]
    pub location: [f64; 3],
    /// Object scale
    #[serde(default = "unit_vector")]
    pub scale: [f64; 3],
    /// Bounding dimensions in meters
    #[serde(default)]
    pub dimensions: [f64; 3],
    /// Whether the object's data carries shape keys
    #[serde(default)]
    pub has_shape_keys: bool,
    /// Number of vertex color layers on the mesh
    #[serde(default)]
    pub vertex_color_layers: usize,
}

impl SceneObject {
    /// A mesh object at the origin with unit scale.
    pub fn mesh(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Mesh,
            users: 1,
            location: [0.0; 3],
            scale: unit_vector(),
            dimensions: [0.0; 3],
            has_shape_keys: false,
            vertex_color_layers: 0,
        }
    }
}

/// A node socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    /// Socket name (`Specular IOR Level`, `UV`, ...)
    pub name: String,
    /// Socket data type (`SHADER`, `VECTOR`, `VALUE`, `RGBA`)
    #[serde(default)]
    pub socket_type: String,
    /// Whether a link is attached
    #[serde(default)]
    pub is_linked: bool,
    /// Unlinked value, for scalar sockets
    #[serde(default)]
    pub default_value: Option<f64>,
}

/// A shader node inside a material's node tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderNode {
    /// Node name
    pub name: String,
    /// User label, empty when unset
    #[serde(default)]
    pub label: String,
    /// Host node type (`BSDF_PRINCIPLED`, `TEX_IMAGE`, `MATH`, ...)
    pub node_type: String,
    /// Image datablock referenced by image texture nodes
    #[serde(default)]
    pub image: Option<String>,
    /// Input sockets
    #[serde(default)]
    pub inputs: Vec<Socket>,
    /// Output sockets
    #[serde(default)]
    pub outputs: Vec<Socket>,
}

impl ShaderNode {
    /// Input socket by name.
    pub fn input(&self, name: &str) -> Option<&Socket> {
        self.inputs.iter().find(|socket| socket.name == name)
    }
}

/// A material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Datablock name
    pub name: String,
    /// Reference count
    #[serde(default = "one")]
    pub users: u32,
    /// Whether the material uses a node tree
    #[serde(default = "default_true")]
    pub use_nodes: bool,
    /// Grease pencil materials are ignored by most checks
    #[serde(default)]
    pub is_grease_pencil: bool,
    /// Node tree contents
    #[serde(default)]
    pub nodes: Vec<ShaderNode>,
}

impl Material {
    /// Nodes of the material's tree, empty when nodes are disabled.
    pub fn tree(&self) -> &[ShaderNode] {
        if self.use_nodes {
            &self.nodes
        } else {
            &[]
        }
    }
}

/// An image datablock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Datablock name
    pub name: String,
    /// File path as stored by the host, possibly `//`-relative
    #[serde(default)]
    pub filepath: String,
    /// Color space name (`sRGB`, `Non-Color`, ...)
    #[serde(default = "Image::default_colorspace")]
    pub colorspace: String,
    /// Whether pixel data is packed into the save file
    #[serde(default)]
    pub packed: bool,
    /// Pixel dimensions
    #[serde(default)]
    pub size: [u32; 2],
    /// Reference count
    #[serde(default = "one")]
    pub users: u32,
}

impl Image {
    fn default_colorspace() -> String {
        "sRGB".to_string()
    }
}

/// A collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Datablock name
    pub name: String,
    /// Reference count
    #[serde(default = "one")]
    pub users: u32,
    /// Names of child collections
    #[serde(default)]
    pub children: Vec<String>,
    /// Names of member objects
    #[serde(default)]
    pub objects: Vec<String>,
}

/// Any other datablock: only its name and reference count matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datablock {
    /// Datablock name
    pub name: String,
    /// Reference count
    #[serde(default = "one")]
    pub users: u32,
}

impl Datablock {
    /// A datablock with a single user.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: 1,
        }
    }
}

/// Scene unit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSettings {
    /// Unit scale
    pub scale_length: f64,
    /// Unit system (`METRIC`, `IMPERIAL`, `NONE`)
    pub system: String,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            scale_length: 1.0,
            system: "METRIC".to_string(),
        }
    }
}

/// Name and reference count of one datablock during generic traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatablockRef<'a> {
    /// Datablock name
    pub name: Cow<'a, str>,
    /// Reference count
    pub users: u32,
}

/// A named container of datablocks, iterated lazily.
pub struct DatablockContainer<'a> {
    /// Container name (`objects`, `materials`, ...)
    pub name: Cow<'a, str>,
    /// Items in host order
    pub items: Box<dyn Iterator<Item = DatablockRef<'a>> + 'a>,
}

impl<'a> DatablockContainer<'a> {
    /// Wrap an iterator of items.
    pub fn new(
        name: impl Into<Cow<'a, str>>,
        items: impl Iterator<Item = DatablockRef<'a>> + 'a,
    ) -> Self {
        Self {
            name: name.into(),
            items: Box::new(items),
        }
    }
}

impl std::fmt::Debug for DatablockContainer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatablockContainer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Capability interface the host application implements.
pub trait SceneHost {
    /// Absolute path of the save file, `None` if never saved.
    fn file_path(&self) -> Option<&Path>;

    /// Whether the session has unsaved changes.
    fn is_dirty(&self) -> bool;

    /// Host application version string (`4.2.1`).
    fn host_version(&self) -> &str;

    /// Per-scene settings.
    fn settings(&self) -> &SceneSettings;

    /// All objects.
    fn objects(&self) -> &[SceneObject];

    /// All materials.
    fn materials(&self) -> &[Material];

    /// All images.
    fn images(&self) -> &[Image];

    /// All collections.
    fn collections(&self) -> &[Collection];

    /// World datablocks.
    fn worlds(&self) -> &[Datablock];

    /// Node groups (geometry node setups and the like).
    fn node_groups(&self) -> &[Datablock];

    /// Number of scenes in the file.
    fn scene_count(&self) -> usize;

    /// Number of view layers in the active scene.
    fn view_layer_count(&self) -> usize;

    /// Unit settings of the active scene.
    fn unit_settings(&self) -> &UnitSettings;

    /// Every datablock container, in a stable order.
    fn list_containers(&self) -> Vec<DatablockContainer<'_>>;

    /// Whether `container` holds a datablock called `name`.
    fn contains_datablock(&self, container: &str, name: &str) -> bool;

    /// Rename a datablock in place.
    fn rename_datablock(&mut self, container: &str, old_name: &str, new_name: &str) -> Result<()>;

    /// Rewrite the stored file path of an image.
    fn set_image_filepath(&mut self, image: &str, filepath: &str) -> Result<()>;

    /// Delete a datablock.
    fn remove_datablock(&mut self, container: &str, name: &str) -> Result<()>;

    /// Store the serialized latest report in the scene settings.
    fn store_report(&mut self, report_json: String);

    /// Save to the current path.
    fn save(&mut self) -> Result<()>;

    /// Save to `path`, which becomes the current path.
    fn save_as(&mut self, path: &Path) -> Result<()>;

    /// Directory containing the save file.
    fn save_dir(&self) -> Option<&Path> {
        self.file_path().and_then(Path::parent)
    }

    /// Object by name.
    fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects().iter().find(|object| object.name == name)
    }

    /// Collection by name.
    fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections()
            .iter()
            .find(|collection| collection.name == name)
    }

    /// Image by name.
    fn image(&self, name: &str) -> Option<&Image> {
        self.images().iter().find(|image| image.name == name)
    }

    /// Images used by image-texture nodes in node-based materials, one per
    /// distinct file path.
    fn texture_images(&self) -> Vec<&Image> {
        let mut seen = HashSet::new();
        let mut textures = Vec::new();
        for material in self.materials() {
            for node in material.tree() {
                if node.node_type != "TEX_IMAGE" {
                    continue;
                }
                let Some(image) = node.image.as_deref().and_then(|name| self.image(name)) else {
                    continue;
                };
                if seen.insert(image.filepath.as_str()) {
                    textures.push(image);
                }
            }
        }
        textures
    }
}
