//! Image data checks.

use indexmap::IndexMap;

use super::{routine, CheckContext, CheckModule};
use crate::core::errors::Result;
use crate::core::report::{CheckResult, Findings};
use crate::core::severity::Severity;

pub(super) const MODULES: &[CheckModule] = &[
    routine!(
        "textures/packed_textures",
        "No texture files should be packed into the save file",
        packed_textures
    ),
    routine!(
        "textures/resolutions_match",
        "All texture resolutions should match within the asset",
        resolutions_match
    ),
];

fn packed_textures(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for image in ctx.scene.images().iter().filter(|image| image.packed) {
        findings.flag(Severity::Error, format!("{} is packed", image.name));
    }
    Ok(findings.finish())
}

fn resolutions_match(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut resolutions: IndexMap<String, usize> = IndexMap::new();
    for image in ctx.scene.texture_images() {
        *resolutions
            .entry(format!("{}x{}", image.size[0], image.size[1]))
            .or_default() += 1;
    }

    let mut findings = Findings::new();
    if resolutions.len() > 1 {
        for (resolution, count) in &resolutions {
            findings.flag(
                Severity::Error,
                format!("Resolution {resolution} has {count} images"),
            );
        }
    }
    Ok(findings.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{run, textured};
    use crate::scene::AssetType;

    #[test]
    fn test_packed_textures() {
        let mut scene = textured("rock_01", &[("rock_01_diff.png", "sRGB")]);
        assert!(run(packed_textures, &scene, "rock_01", AssetType::Model)
            .severity
            .is_success());
        scene.images[0].packed = true;
        assert_eq!(
            run(packed_textures, &scene, "rock_01", AssetType::Model).messages,
            vec!["rock_01_diff.png is packed"]
        );
    }

    #[test]
    fn test_resolutions_match() {
        let mut scene = textured(
            "rock_01",
            &[
                ("rock_01_diff.png", "sRGB"),
                ("rock_01_rough.png", "Non-Color"),
                ("rock_01_nor_gl.png", "Non-Color"),
            ],
        );
        assert!(run(resolutions_match, &scene, "rock_01", AssetType::Model)
            .severity
            .is_success());

        scene.images[2].size = [1024, 1024];
        assert_eq!(
            run(resolutions_match, &scene, "rock_01", AssetType::Model).messages,
            vec![
                "Resolution 2048x2048 has 2 images",
                "Resolution 1024x1024 has 1 images",
            ]
        );
    }
}
