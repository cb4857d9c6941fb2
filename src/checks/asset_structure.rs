//! Collection layout and scene composition checks.

use super::{routine, CheckContext, CheckModule};
use crate::core::errors::Result;
use crate::core::report::{CheckResult, Findings};
use crate::core::severity::Severity;
use crate::scene::ObjectKind;

pub(super) const MODULES: &[CheckModule] = &[
    routine!(
        "asset_structure/geonodes",
        "Geometry nodes setups come with a LOD0 or static collection",
        geonodes
    ),
    routine!(
        "asset_structure/lods",
        "LOD (Level of Detail) collections and objects are properly structured",
        lods
    ),
    routine!(
        "asset_structure/no_world",
        "No world or HDRI data blocks should be present in the asset",
        no_world
    ),
    routine!(
        "asset_structure/only_plane_sphere",
        "Texture assets should only have \"Plane\" and \"Sphere\" objects",
        only_plane_sphere
    ),
];

fn geonodes(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let scene = ctx.scene;
    if scene
        .collection(&format!("{}_geometry_nodes", ctx.slug))
        .is_none()
    {
        return Ok(CheckResult::success());
    }

    let has_lod0 = scene.collection(&format!("{}_LOD0", ctx.slug)).is_some();
    let has_static = scene.collection(&format!("{}_static", ctx.slug)).is_some();
    if !has_lod0 && !has_static {
        return Ok(CheckResult::single(
            Severity::Error,
            "LOD0 or static collection not found",
        ));
    }
    Ok(CheckResult::success_with("Geometry nodes collection found"))
}

fn lods(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let lod_name = format!("{}_LOD0", ctx.slug);
    let lod_exists = ctx.scene.collection(&lod_name).is_some();

    if !lod_exists {
        if ctx.scene.objects().iter().any(|o| o.name.ends_with("_LOD0")) {
            return Ok(CheckResult::single(
                Severity::Error,
                format!("LOD0 collection not found for slug: {}", ctx.slug),
            ));
        }
        return Ok(CheckResult::success());
    }

    let is_child = ctx
        .scene
        .collection(ctx.slug)
        .is_some_and(|main| main.children.iter().any(|child| *child == lod_name));
    if !is_child {
        return Ok(CheckResult::single(
            Severity::Error,
            "LOD0 collection is not a child of the main collection",
        ));
    }
    Ok(CheckResult::success_with("LOD0 collection exists"))
}

fn no_world(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    if ctx.scene.worlds().is_empty() {
        return Ok(CheckResult::success());
    }
    Ok(CheckResult::single(
        Severity::Warning,
        "HDRI or world present.",
    ))
}

fn only_plane_sphere(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    if ctx.is_texture() {
        for object in ctx.scene.objects() {
            if object.kind == ObjectKind::Mesh && !matches!(object.name.as_str(), "Plane" | "Sphere")
            {
                findings.flag(
                    Severity::Error,
                    format!("Unexpected object found: {}", object.name),
                );
            }
        }
    }
    Ok(findings.finish())
}
