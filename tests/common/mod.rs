//! Shared fixtures: a complete `rock_01` model asset on disk.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use hat_rs::scene::{Collection, Datablock, Image, Material, SceneObject, ShaderNode, Socket};
use hat_rs::{SceneHost, SceneSnapshot};

pub const SLUG: &str = "rock_01";

/// Texture maps of the fixture with their correct color spaces.
pub const MAPS: [(&str, &str); 3] = [
    ("rock_01_diff.png", "sRGB"),
    ("rock_01_rough.png", "Non-Color"),
    ("rock_01_nor_gl.png", "Non-Color"),
];

fn socket(name: &str, socket_type: &str, is_linked: bool, default_value: Option<f64>) -> Socket {
    Socket {
        name: name.into(),
        socket_type: socket_type.into(),
        is_linked,
        default_value,
    }
}

fn node(name: &str, node_type: &str, inputs: Vec<Socket>, outputs: Vec<Socket>) -> ShaderNode {
    ShaderNode {
        name: name.into(),
        label: String::new(),
        node_type: node_type.into(),
        image: None,
        inputs,
        outputs,
    }
}

fn image_node(image: &str) -> ShaderNode {
    ShaderNode {
        image: Some(image.into()),
        ..node(
            image,
            "TEX_IMAGE",
            vec![socket("Vector", "VECTOR", true, None)],
            vec![socket("Color", "RGBA", true, None)],
        )
    }
}

/// A model scene that passes every check once written by [`write_asset`].
pub fn rock_scene() -> SceneSnapshot {
    let mut scene = SceneSnapshot::new();
    scene.host_version = "4.2.1 LTS".into();
    scene.objects.push(SceneObject::mesh(SLUG));
    scene.meshes.push(Datablock::new(SLUG));
    scene.collections.push(Collection {
        name: SLUG.into(),
        users: 1,
        children: vec![],
        objects: vec![SLUG.into()],
    });

    let mut nodes = vec![
        node(
            "Principled BSDF",
            "BSDF_PRINCIPLED",
            vec![
                socket("Base Color", "RGBA", true, None),
                socket("Roughness", "VALUE", true, None),
                socket("Normal", "VECTOR", true, None),
                socket("Specular IOR Level", "VALUE", false, Some(0.5)),
            ],
            vec![socket("BSDF", "SHADER", true, None)],
        ),
        node(
            "Material Output",
            "OUTPUT_MATERIAL",
            vec![socket("Surface", "SHADER", true, None)],
            vec![],
        ),
        node(
            "Texture Coordinate",
            "TEX_COORD",
            vec![],
            vec![
                socket("UV", "VECTOR", true, None),
                socket("Object", "VECTOR", false, None),
            ],
        ),
        node(
            "Normal Map",
            "NORMAL_MAP",
            vec![socket("Color", "RGBA", true, None)],
            vec![socket("Normal", "VECTOR", true, None)],
        ),
    ];
    for (file_name, colorspace) in MAPS {
        nodes.push(image_node(file_name));
        scene.images.push(Image {
            name: file_name.into(),
            filepath: format!("//textures/{file_name}"),
            colorspace: colorspace.into(),
            packed: false,
            size: [2048, 2048],
            users: 1,
        });
    }
    scene.materials.push(Material {
        name: SLUG.into(),
        users: 1,
        use_nodes: true,
        is_grease_pencil: false,
        nodes,
    });
    scene
}

/// Write `scene` as `<root>/rock_01/rock_01.blend` next to its texture
/// files. Returns the save file path.
pub fn write_asset(root: &Path, mut scene: SceneSnapshot) -> PathBuf {
    let asset_dir = root.join(SLUG);
    let textures = asset_dir.join("textures");
    fs::create_dir_all(&textures).unwrap();
    for (file_name, _) in MAPS {
        fs::write(textures.join(file_name), b"png").unwrap();
    }

    let save_path = asset_dir.join(format!("{SLUG}.blend"));
    scene.save_as(&save_path).unwrap();
    save_path
}
