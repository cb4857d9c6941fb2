//! Shader node tree checks.
//!
//! Exporters only understand a narrow subset of node setups, so most of these
//! rules flag nodes that would be dropped or baked incorrectly. Texture assets
//! are held to the stricter severity where the two asset types differ.

use super::{routine, Check, CheckContext, CheckModule};
use crate::core::config::{ChecksConfig, IorRange};
use crate::core::errors::{HatError, Result};
use crate::core::naming::{derive_map_name, normalize_map_name};
use crate::core::report::{CheckResult, Findings};
use crate::core::severity::Severity;
use crate::scene::{Material, ShaderNode};

const PRINCIPLED_BSDF: &str = "BSDF_PRINCIPLED";
const MIX_NODE_TYPES: &[&str] = &["MIX", "MIX_RGB", "MIX_SHADER"];

pub(super) const MODULES: &[CheckModule] = &[
    CheckModule::new("materials/material_ior_value", MaterialIorValue::load),
    routine!(
        "materials/no_math_nodes",
        "Materials should not contain math nodes, which mess with exporters",
        no_math_nodes
    ),
    routine!(
        "materials/no_mix_nodes",
        "Materials should not contain mix nodes",
        no_mix_nodes
    ),
    routine!(
        "materials/no_unused_nodes",
        "No unused nodes in materials",
        no_unused_nodes
    ),
    routine!(
        "materials/node_labels_match_map",
        "Image node labels (if set) should match map names",
        node_labels_match_map
    ),
    routine!(
        "materials/one_material_output",
        "Materials should have exactly one output node",
        one_material_output
    ),
    routine!(
        "materials/only_principled_bsdf",
        "Only Principled BSDF shaders should be used",
        only_principled_bsdf
    ),
    routine!(
        "materials/sss_on",
        "SSS may have been accidentally enabled",
        sss_on
    ),
    routine!(
        "materials/textures_use_uvs",
        "All textures should use UVs for mapping",
        textures_use_uvs
    ),
];

/// Every node of every node-based material, paired with its material.
fn material_nodes<'a>(
    ctx: &CheckContext<'a>,
) -> impl Iterator<Item = (&'a Material, &'a ShaderNode)> + 'a {
    ctx.scene
        .materials()
        .iter()
        .flat_map(|material| material.tree().iter().map(move |node| (material, node)))
}

/// Flags unlinked `Specular IOR Level` values outside the configured range.
pub struct MaterialIorValue {
    range: IorRange,
}

impl MaterialIorValue {
    fn load(config: &ChecksConfig) -> Result<Box<dyn Check>> {
        let range = config.specular_ior_range;
        if !(range.min.is_finite() && range.max.is_finite()) || range.min > range.max {
            return Err(HatError::config_field(
                format!("Invalid IOR range {}..{}", range.min, range.max),
                "checks.specular_ior_range",
            ));
        }
        Ok(Box::new(Self { range }))
    }
}

impl Check for MaterialIorValue {
    fn description(&self) -> &str {
        "Material IOR (Index of Refraction) values are within expected range"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let mut findings = Findings::new();
        for (material, node) in material_nodes(ctx) {
            if material.users == 0 || node.node_type != PRINCIPLED_BSDF {
                continue;
            }
            let Some(socket) = node.input("Specular IOR Level") else {
                continue;
            };
            let value = socket.default_value.unwrap_or_default();
            if !socket.is_linked && !self.range.contains(value) {
                findings.flag(
                    Severity::Warning,
                    format!(
                        "Material '{}' Specular IOR value on node '{}' is {}",
                        material.name, node.name, value
                    ),
                );
            }
        }
        Ok(findings.finish())
    }
}

fn no_math_nodes(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let severity = ctx.by_asset_type(Severity::Error, Severity::Warning);
    let mut findings = Findings::new();
    for (material, node) in material_nodes(ctx).filter(|(_, n)| n.node_type == "MATH") {
        findings.flag(
            severity,
            format!(
                "Material '{}' contains math node '{}'",
                material.name, node.name
            ),
        );
    }
    Ok(findings.finish())
}

fn no_mix_nodes(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let severity = ctx.by_asset_type(Severity::Error, Severity::Warning);
    let mut findings = Findings::new();
    for (material, node) in material_nodes(ctx) {
        if MIX_NODE_TYPES.contains(&node.node_type.as_str()) {
            findings.flag(
                severity,
                format!(
                    "Material '{}' contains mix node '{}'",
                    material.name, node.name
                ),
            );
        }
    }
    Ok(findings.finish())
}

fn no_unused_nodes(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for (material, node) in material_nodes(ctx) {
        if !node.outputs.is_empty() && !node.outputs.iter().any(|o| o.is_linked) {
            findings.flag(
                Severity::Error,
                format!("Material '{}' has unused node '{}'", material.name, node.name),
            );
        }
    }
    Ok(findings.finish())
}

fn node_labels_match_map(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mismatch = ctx.by_asset_type(Severity::Error, Severity::Warning);
    let mut findings = Findings::new();
    for (material, node) in material_nodes(ctx) {
        if node.node_type != "TEX_IMAGE" || node.label.is_empty() {
            continue;
        }
        let Some(image) = node.image.as_deref().and_then(|name| ctx.scene.image(name)) else {
            findings.flag(
                Severity::Error,
                format!("Material '{}' has unused image node", material.name),
            );
            continue;
        };
        if image.filepath.is_empty() {
            findings.flag(
                Severity::Error,
                format!("'{}' has no filepath", image.name),
            );
            continue;
        }

        let derived = derive_map_name(&image.filepath, ctx.slug, true);
        let map_name = normalize_map_name(&derived);
        let label = node.label.to_lowercase();
        if normalize_map_name(&label) != map_name {
            findings.flag(
                mismatch,
                format!(
                    "{}'s image label '{}' != map name '{}'",
                    material.name, node.label, map_name
                ),
            );
        }
    }
    Ok(findings.finish())
}

fn one_material_output(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for material in ctx.scene.materials().iter().filter(|m| m.use_nodes) {
        let outputs = material
            .tree()
            .iter()
            .filter(|node| node.node_type == "OUTPUT_MATERIAL")
            .count();
        if outputs != 1 {
            findings.flag(
                Severity::Error,
                format!("Material '{}' has {} output nodes", material.name, outputs),
            );
        }
    }
    Ok(findings.finish())
}

fn only_principled_bsdf(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let severity = ctx.by_asset_type(Severity::Error, Severity::Warning);
    let mut findings = Findings::new();
    for (material, node) in material_nodes(ctx) {
        let is_shader = node.outputs.iter().any(|o| o.socket_type == "SHADER");
        if is_shader && node.node_type != PRINCIPLED_BSDF {
            findings.flag(
                severity,
                format!(
                    "Material '{}' contains {} shader",
                    material.name, node.node_type
                ),
            );
        }
    }
    Ok(findings.finish())
}

fn sss_on(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for (material, node) in material_nodes(ctx) {
        if node.node_type != PRINCIPLED_BSDF {
            continue;
        }
        let weight = node
            .input("Subsurface Weight")
            .and_then(|socket| socket.default_value)
            .unwrap_or_default();
        if weight > 0.0 {
            findings.flag(
                Severity::Warning,
                format!("Material '{}' has SSS weight > 0", material.name),
            );
        }
    }
    Ok(findings.finish())
}

fn textures_use_uvs(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for (material, node) in material_nodes(ctx) {
        if node.node_type == "TEX_COORD" {
            for output in node.outputs.iter().filter(|o| o.name != "UV" && o.is_linked) {
                findings.flag(
                    Severity::Error,
                    format!(
                        "'{}' in material '{}' has linked {} output",
                        node.name, material.name, output.name
                    ),
                );
            }
        } else if node.node_type.starts_with("TEX_") {
            for _ in node
                .inputs
                .iter()
                .filter(|i| i.socket_type == "VECTOR" && !i.is_linked)
            {
                findings.flag(
                    Severity::Error,
                    format!(
                        "'{}' in material '{}' has unlinked UV input",
                        node.name, material.name
                    ),
                );
            }
        }
    }
    Ok(findings.finish())
}
