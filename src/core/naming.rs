//! Asset naming conventions: slugs and texture map names.
//!
//! A slug is the canonical asset identifier taken from the save file's name.
//! Texture files are named `<slug>_<map>[_<res>k].<ext>`, and the map part is
//! normalized through a fixed alias table before it is compared against the
//! canonical map names.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::scene::paths::host_basename;
use crate::scene::SceneHost;

/// Suffix stripped from save-file stems (`rock_01.export.blend`).
pub const EXPORT_SUFFIX: &str = ".export";

/// Characters allowed in a slug.
const SLUG_CHARACTERS: &str = "abcdefghijklmnopqrstuvwxyz0123456789_-";

/// Canonical map names accepted by the asset library.
pub const STANDARD_MAP_NAMES: &[&str] = &[
    "diff", "rough", "metal", "nor_gl", "nor_dx", "disp", "ao", "arm", "spec", "bump", "alpha",
    "mask", "emission", "translucent", "sheen", "coat", "gloss", "ior", "anisotropy",
];

/// Map names that must be stored as non-color data.
pub const LINEAR_MAP_NAMES: &[&str] = &["rough", "metal", "nor_gl", "disp"];

/// Map names that must be stored as sRGB.
pub const SRGB_MAP_NAMES: &[&str] = &["diff"];

static MAP_NAME_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("roughness", "rough"),
        ("metallic", "metal"),
        ("nor", "nor_gl"),
        ("norm", "nor_gl"),
        ("normal", "nor_gl"),
        ("normals", "nor_gl"),
        ("height", "disp"),
        ("displacement", "disp"),
        ("color", "diff"),
        ("col", "diff"),
        ("diffuse", "diff"),
        ("diffuse_color", "diff"),
        ("albedo", "diff"),
    ])
});

/// The alias table, for documentation and tests.
pub fn map_name_aliases() -> &'static HashMap<&'static str, &'static str> {
    &MAP_NAME_ALIASES
}

/// Derive the slug from a file name or path.
///
/// Takes the base name without its extension and strips one trailing
/// `.export`.
pub fn derive_slug(file_name: &str) -> String {
    let base = host_basename(file_name);
    let stem = strip_extension(base);
    stem.strip_suffix(EXPORT_SUFFIX).unwrap_or(stem).to_string()
}

/// Slug of the host's current save file, empty when the session is unsaved.
pub fn session_slug(host: &dyn SceneHost) -> String {
    host.file_path()
        .and_then(|path| path.file_name())
        .map(|name| derive_slug(&name.to_string_lossy()))
        .unwrap_or_default()
}

/// Whether `slug` only uses lowercase letters, digits, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.chars().all(|c| SLUG_CHARACTERS.contains(c))
}

/// Remove the last extension from a file name, keeping dotfiles intact.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(index) => &name[..index],
    }
}

/// Drop a trailing `_<digits>k` resolution suffix (`rock_01_diff_4k`).
pub fn strip_resolution_suffix(stem: &str) -> &str {
    let Some(without_k) = stem.strip_suffix('k') else {
        return stem;
    };
    match without_k.rsplit_once('_') {
        Some((head, digits))
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) =>
        {
            head
        }
        _ => stem,
    }
}

/// Derive the semantic map name of a texture file relative to `slug`.
///
/// In strict mode a stem of the form `<slug>_<map>` yields `<map>`
/// lowercased. Otherwise the stem is matched against the two-token normal
/// map names and finally falls back to its last `_` token.
pub fn derive_map_name(file_path: &str, slug: &str, strict: bool) -> String {
    let stem = strip_resolution_suffix(strip_extension(host_basename(file_path)));

    if strict && !slug.is_empty() {
        if let Some(rest) = stem.strip_prefix(slug).and_then(|s| s.strip_prefix('_')) {
            return rest.to_lowercase();
        }
    }

    for two_token in ["nor_gl", "nor_dx"] {
        if stem == two_token
            || stem
                .strip_suffix(two_token)
                .is_some_and(|head| head.ends_with('_'))
        {
            return two_token.to_string();
        }
    }

    stem.rsplit('_').next().unwrap_or(stem).to_string()
}

/// Apply the alias table to a map name.
pub fn normalize_map_name(map_name: &str) -> &str {
    MAP_NAME_ALIASES.get(map_name).copied().unwrap_or(map_name)
}

/// Whether a (normalized) map name is one of the canonical names.
pub fn is_standard_map_name(map_name: &str) -> bool {
    STANDARD_MAP_NAMES.contains(&map_name)
}

/// Replace a leading `old` prefix of `name` with `new`.
///
/// Returns `None` when `name` does not start with `old`.
pub fn replace_slug_prefix(name: &str, old: &str, new: &str) -> Option<String> {
    if old.is_empty() {
        return None;
    }
    if name == old {
        return Some(new.to_string());
    }
    name.strip_prefix(old).map(|rest| format!("{new}{rest}"))
}
