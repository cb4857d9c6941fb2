//! Object placement and mesh attribute checks.

use super::{routine, CheckContext, CheckModule};
use crate::core::errors::Result;
use crate::core::report::{CheckResult, Findings};
use crate::core::severity::Severity;
use crate::scene::ObjectKind;

pub(super) const MODULES: &[CheckModule] = &[
    routine!(
        "geometry/object_origin",
        "Objects should be at the origin",
        object_origin
    ),
    routine!(
        "geometry/shape_keys",
        "Objects should not have shape keys which may cause issues for GLTF export",
        shape_keys
    ),
    routine!(
        "geometry/unit_scale",
        "Scene unit scale is set to 1.0 and is Metric",
        unit_scale
    ),
    routine!(
        "geometry/vert_cols",
        "Objects should not have vertex colors which may break GLTF export",
        vert_cols
    ),
];

fn object_origin(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let severity = ctx.by_asset_type(Severity::Warning, Severity::Question);
    let mut findings = Findings::new();
    for object in ctx.scene.objects() {
        if object.kind == ObjectKind::Mesh && object.location != [0.0; 3] {
            findings.flag(severity, format!("{} is not at origin", object.name));
        }
    }
    Ok(findings.finish())
}

fn shape_keys(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for object in ctx.scene.objects().iter().filter(|o| o.has_shape_keys) {
        findings.flag(
            Severity::Warning,
            format!("Object '{}' has shape keys", object.name),
        );
    }
    Ok(findings.finish())
}

fn unit_scale(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let units = ctx.scene.unit_settings();
    let mut findings = Findings::new();
    if (units.scale_length - 1.0).abs() > f64::EPSILON {
        findings.flag(Severity::Error, "Scene Unit Scale is not 1.0");
    }
    if units.system != "METRIC" {
        findings.flag(Severity::Error, "Scene Unit System is not Metric");
    }
    Ok(findings.finish())
}

fn vert_cols(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for object in ctx.scene.objects() {
        if object.kind == ObjectKind::Mesh && object.vertex_color_layers > 0 {
            findings.flag(
                Severity::Warning,
                format!(
                    "{} has vertex colors, this may break GLTF export.",
                    object.name
                ),
            );
        }
    }
    Ok(findings.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::run;
    use crate::scene::{AssetType, SceneObject, SceneSnapshot};

    #[test]
    fn test_object_origin_severity() {
        let mut scene = SceneSnapshot::new();
        let mut rock = SceneObject::mesh("rock_01");
        rock.location = [0.0, 0.0, 1.0];
        let mut light = SceneObject::mesh("Sun");
        light.kind = ObjectKind::Light;
        light.location = [5.0, 5.0, 5.0];
        scene.objects = vec![rock, light];

        let model = run(object_origin, &scene, "rock_01", AssetType::Model);
        assert_eq!(model.severity, Severity::Question);
        assert_eq!(model.messages, vec!["rock_01 is not at origin"]);
        assert_eq!(
            run(object_origin, &scene, "rock_01", AssetType::Texture).severity,
            Severity::Warning
        );
    }

    #[test]
    fn test_shape_keys_and_vertex_colors() {
        let mut scene = SceneSnapshot::new();
        let mut rock = SceneObject::mesh("rock_01");
        rock.has_shape_keys = true;
        rock.vertex_color_layers = 1;
        scene.objects.push(rock);

        assert_eq!(
            run(shape_keys, &scene, "rock_01", AssetType::Model).messages,
            vec!["Object 'rock_01' has shape keys"]
        );
        assert_eq!(
            run(vert_cols, &scene, "rock_01", AssetType::Model).severity,
            Severity::Warning
        );
    }

    #[test]
    fn test_unit_scale() {
        let mut scene = SceneSnapshot::new();
        assert!(run(unit_scale, &scene, "a", AssetType::Model).severity.is_success());

        scene.unit_settings.scale_length = 0.01;
        scene.unit_settings.system = "IMPERIAL".into();
        assert_eq!(
            run(unit_scale, &scene, "a", AssetType::Model).messages,
            vec!["Scene Unit Scale is not 1.0", "Scene Unit System is not Metric"]
        );
    }
}
