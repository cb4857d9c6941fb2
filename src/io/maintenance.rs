//! Scene maintenance operations.

use tracing::{debug, warn};

use crate::core::errors::Result;
use crate::scene::paths::host_basename;
use crate::scene::SceneHost;

const IMAGES: &str = "images";

/// Rename every image datablock to the base name of its file.
///
/// Returns the new names of the images that changed. An image whose target
/// name is already taken is left alone.
pub fn fix_image_names(host: &mut dyn SceneHost) -> Result<Vec<String>> {
    let renames: Vec<(String, String)> = host
        .images()
        .iter()
        .filter(|image| !image.filepath.is_empty())
        .filter_map(|image| {
            let file_name = host_basename(&image.filepath);
            (!file_name.is_empty() && image.name != file_name)
                .then(|| (image.name.clone(), file_name.to_string()))
        })
        .collect();

    let mut fixed = Vec::new();
    for (old_name, new_name) in renames {
        if host.contains_datablock(IMAGES, &new_name) {
            warn!(
                "Cannot rename image '{}' to '{}': name already taken",
                old_name, new_name
            );
            continue;
        }
        host.rename_datablock(IMAGES, &old_name, &new_name)?;
        debug!("Renamed image '{}' -> '{}'", old_name, new_name);
        fixed.push(new_name);
    }
    Ok(fixed)
}

/// Remove every datablock without users, repeating until nothing is left to
/// remove. Returns the number of datablocks removed.
pub fn scrub_orphans(host: &mut dyn SceneHost) -> Result<usize> {
    let mut removed = 0;
    loop {
        let orphans: Vec<(String, String)> = host
            .list_containers()
            .into_iter()
            .flat_map(|container| {
                let name = container.name.into_owned();
                container
                    .items
                    .filter(|item| item.users == 0)
                    .map(move |item| (name.clone(), item.name.into_owned()))
            })
            .collect();
        if orphans.is_empty() {
            break;
        }

        for (container, name) in orphans {
            host.remove_datablock(&container, &name)?;
            debug!("Removed orphan {}.{}", container, name);
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Datablock, Image, SceneSnapshot};

    fn image(name: &str, filepath: &str) -> Image {
        Image {
            name: name.into(),
            filepath: filepath.into(),
            colorspace: "sRGB".into(),
            packed: false,
            size: [512, 512],
            users: 1,
        }
    }

    #[test]
    fn test_fix_image_names() {
        let mut scene = SceneSnapshot::new();
        scene.images.push(image("Image.001", "//textures/rock_01_diff.png"));
        scene.images.push(image("rock_01_rough.png", "//textures/rock_01_rough.png"));
        scene.images.push(image("Render Result", ""));
        scene.images.push(image("dupe", "C:\\tex\\rock_01_rough.png"));

        let fixed = fix_image_names(&mut scene).unwrap();
        assert_eq!(fixed, vec!["rock_01_diff.png"]);
        let names: Vec<&str> = scene.images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["rock_01_diff.png", "rock_01_rough.png", "Render Result", "dupe"]
        );
    }

    #[test]
    fn test_fix_image_names_nothing_to_do() {
        let mut scene = SceneSnapshot::new();
        scene.images.push(image("a.png", "//a.png"));
        assert!(fix_image_names(&mut scene).unwrap().is_empty());
        assert!(!scene.is_dirty());
    }

    #[test]
    fn test_scrub_orphans() {
        let mut scene = SceneSnapshot::new();
        scene.worlds.push(Datablock {
            name: "World".into(),
            users: 0,
        });
        scene.node_groups.push(Datablock::new("kept"));
        let mut orphan = image("unused.png", "//unused.png");
        orphan.users = 0;
        scene.images.push(orphan);

        assert_eq!(scrub_orphans(&mut scene).unwrap(), 2);
        assert!(scene.worlds.is_empty());
        assert!(scene.images.is_empty());
        assert_eq!(scene.node_groups.len(), 1);
        assert_eq!(scrub_orphans(&mut scene).unwrap(), 0);
    }
}
