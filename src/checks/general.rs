//! Top-level checks: naming, file state and scene-wide bookkeeping.

use super::{routine, CheckContext, CheckModule};
use crate::core::errors::Result;
use crate::core::naming::{
    derive_map_name, is_standard_map_name, is_valid_slug, normalize_map_name, LINEAR_MAP_NAMES,
    SRGB_MAP_NAMES,
};
use crate::core::report::{CheckResult, Findings, UNSAVED_CHANGES_MESSAGE};
use crate::core::severity::Severity;
use crate::scene::paths::host_basename;
use crate::scene::ObjectKind;

pub(super) const MODULES: &[CheckModule] = &[
    routine!(
        "slug_ok",
        "Slug only uses lowercase letters, digits, dashes and underscores",
        slug_ok
    ),
    routine!("unsaved", "File has no unsaved changes", unsaved),
    routine!(
        "collection_name",
        "Model collection name should match the asset slug",
        collection_name
    ),
    routine!(
        "material_names",
        "Material names follow the asset slug",
        material_names
    ),
    routine!(
        "map_names",
        "Texture map names follow standardized naming conventions",
        map_names
    ),
    routine!(
        "non_color_data",
        "Data maps are Non-Color and color maps are sRGB",
        non_color_data
    ),
    routine!(
        "datablock_matches_file",
        "Texture datablock names should match their file names",
        datablock_matches_file
    ),
    routine!("orphans", "No unused datablocks remain in the file", orphans),
    routine!(
        "one_scene",
        "File should contain only one scene and one view layer",
        one_scene
    ),
    routine!(
        "applied_scale",
        "All objects have applied scale (1.0) to ensure no unexpected behaviour",
        applied_scale
    ),
    routine!(
        "tex_plane_size",
        "Texture preview plane has non-default dimensions",
        tex_plane_size
    ),
    routine!(
        "texture_names",
        "Texture file names start with the asset slug",
        texture_names
    ),
];

fn slug_ok(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    if ctx.slug.to_lowercase() != ctx.slug {
        return Ok(CheckResult::single(
            Severity::Error,
            "Slug contains uppercase characters",
        ));
    }
    // An unsaved file has no slug yet.
    if !ctx.slug.is_empty() && !is_valid_slug(ctx.slug) {
        return Ok(CheckResult::single(
            Severity::Error,
            "Slug contains illegal characters",
        ));
    }
    Ok(CheckResult::success())
}

fn unsaved(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    if ctx.scene.is_dirty() {
        return Ok(CheckResult::single(
            Severity::Warning,
            UNSAVED_CHANGES_MESSAGE,
        ));
    }
    Ok(CheckResult::success())
}

fn collection_name(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    if ctx.asset_type.is_model() && ctx.scene.collection(ctx.slug).is_none() {
        return Ok(CheckResult::single(
            Severity::Error,
            "No collection with slug name",
        ));
    }
    Ok(CheckResult::success())
}

fn material_names(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let materials: Vec<_> = ctx
        .scene
        .materials()
        .iter()
        .filter(|m| m.users > 0 && !m.is_grease_pencil)
        .collect();

    if ctx.is_texture() {
        let message = match materials.as_slice() {
            [] => Some("No material found"),
            [only] if only.name != ctx.slug => Some("Material name not the same as slug"),
            [_] => None,
            _ => Some("More than one material present"),
        };
        return Ok(match message {
            Some(message) => CheckResult::single(Severity::Error, message),
            None => CheckResult::success(),
        });
    }

    let mut findings = Findings::new();
    for material in materials {
        if !material.name.starts_with(ctx.slug) {
            findings.flag(
                Severity::Warning,
                format!("Material '{}' doesn't start with slug", material.name),
            );
        }
    }
    Ok(findings.finish())
}

fn map_names(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let strict = ctx.is_texture();
    let severity = ctx.by_asset_type(Severity::Warning, Severity::Question);

    let mut findings = Findings::new();
    for image in ctx.scene.texture_images() {
        let map_name = derive_map_name(&image.filepath, ctx.slug, strict);
        if !is_standard_map_name(normalize_map_name(&map_name)) {
            findings.flag(
                severity,
                format!(
                    "{}: unrecognized map '{}'",
                    host_basename(&image.filepath),
                    map_name
                ),
            );
        }
    }
    Ok(findings.finish())
}

fn non_color_data(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for image in ctx.scene.images() {
        if image.filepath.is_empty() {
            continue;
        }
        let derived = derive_map_name(&image.filepath, ctx.slug, true);
        let map_name = normalize_map_name(&derived);
        let file_name = host_basename(&image.filepath);

        if LINEAR_MAP_NAMES.contains(&map_name) && image.colorspace != "Non-Color" {
            findings.flag(Severity::Error, format!("{file_name} isn't Non-Color"));
        }
        if SRGB_MAP_NAMES.contains(&map_name) && image.colorspace != "sRGB" {
            findings.flag(Severity::Error, format!("{file_name} isn't sRGB"));
        }
    }
    Ok(findings.finish_or("All data texture maps are in the correct color space"))
}

fn datablock_matches_file(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for image in ctx.scene.images() {
        if image.filepath.is_empty() {
            continue;
        }
        if host_basename(&image.filepath) != image.name {
            findings.flag(
                Severity::Warning,
                format!("Image '{}' has different filename", image.name),
            );
        }
    }
    Ok(findings.finish())
}

/// Singular, human-readable form of a container name (`node_groups` to
/// `node group`).
pub(crate) fn singular(container: &str) -> String {
    let stem = ["shes", "ches", "sses", "xes"]
        .iter()
        .find(|suffix| container.ends_with(*suffix))
        .map(|_| &container[..container.len() - 2])
        .or_else(|| container.strip_suffix('s'))
        .unwrap_or(container);
    stem.replace('_', " ")
}

fn orphans(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for container in ctx.scene.list_containers() {
        let kind = singular(&container.name);
        for item in container.items.filter(|item| item.users == 0) {
            findings.flag(Severity::Error, format!("Unused {kind}: {}", item.name));
        }
    }
    Ok(findings.finish())
}

fn one_scene(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    if ctx.scene.scene_count() > 1 {
        findings.flag(
            Severity::Error,
            "Multiple scenes found in the file. Please ensure only one scene is present.",
        );
    }
    if ctx.scene.view_layer_count() > 1 {
        findings.flag(Severity::Error, "Multiple view layers found");
    }
    Ok(findings.finish())
}

fn applied_scale(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let severity = ctx.by_asset_type(Severity::Error, Severity::Warning);
    let mut findings = Findings::new();
    for object in ctx.scene.objects() {
        if matches!(object.kind, ObjectKind::Camera | ObjectKind::Light) {
            continue;
        }
        if object.scale != [1.0, 1.0, 1.0] {
            findings.flag(severity, format!("{} scale not applied", object.name));
        }
    }
    Ok(findings.finish())
}

fn tex_plane_size(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    if !ctx.is_texture() {
        return Ok(CheckResult::success());
    }

    let mut findings = Findings::new();
    for expected in ["Sphere", "Plane"] {
        if ctx.scene.object(expected).is_none() {
            findings.flag(
                Severity::Error,
                format!("Expecting object named '{expected}'"),
            );
        }
    }
    if !findings.is_clean() {
        return Ok(findings.finish());
    }

    match ctx.scene.object("Plane") {
        Some(plane) if plane.dimensions == [2.0, 2.0, 0.0] => Ok(CheckResult::single(
            Severity::Question,
            "Plane has default dimensions (2 meters), confirm this is accurate.",
        )),
        _ => Ok(CheckResult::success()),
    }
}

fn texture_names(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for image in ctx.scene.texture_images() {
        let file_name = host_basename(&image.filepath);
        if !file_name.starts_with(ctx.slug) {
            findings.flag(
                Severity::Warning,
                format!("{file_name} does not start with slug"),
            );
        }
    }
    Ok(findings.finish())
}
