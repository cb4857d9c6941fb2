//! README checklist generation.
//!
//! The README carries a `Checks:` section listing what the tool verifies,
//! terminated by a `To do:` section. The list is regenerated from the check
//! descriptions so it never drifts from the catalog.

use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use crate::core::errors::{HatError, Result};
use crate::core::registry::CheckRegistry;

const SECTION_PATTERN: &str = r"(?s)(Checks:\s*\n(?:<!--.*?-->\s*\n)?)(.*?)(\n\nTo do:)";
const BLANK_RUN_PATTERN: &str = r"\n{3,}";

/// Checklist lines, one `* [x] <description>` per check, sorted by name.
pub fn render_checklist(registry: &CheckRegistry) -> String {
    let mut entries: Vec<(&str, &str)> = registry
        .iter()
        .map(|(name, check)| (name, check.description()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    entries
        .into_iter()
        .filter_map(|(_, description)| {
            let first_line = description.trim().lines().next()?.trim();
            (!first_line.is_empty()).then(|| format!("* [x] {first_line}"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse runs of three or more line breaks into two.
pub fn collapse_blank_lines(content: &str) -> Result<String> {
    let blank_run = compile(BLANK_RUN_PATTERN)?;
    Ok(blank_run.replace_all(content, "\n\n").into_owned())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| HatError::internal(format!("Invalid checklist pattern: {e}")))
}

/// Replace the checklist section of `content`.
///
/// Returns `None` when the README has no `Checks:` ... `To do:` section.
pub fn splice_checklist(content: &str, checklist: &str) -> Result<Option<String>> {
    let section = compile(SECTION_PATTERN)?;
    if !section.is_match(content) {
        return Ok(None);
    }

    let updated = section.replace_all(content, |caps: &regex::Captures<'_>| {
        format!("{}\n{}{}", &caps[1], checklist, &caps[3])
    });
    collapse_blank_lines(&updated).map(Some)
}

/// Rewrite the checklist in the README at `path`.
///
/// Returns the number of checks written, or `None` when the file has no
/// checklist section and was left untouched.
pub fn update_readme(path: &Path, registry: &CheckRegistry) -> Result<Option<usize>> {
    let content =
        std::fs::read_to_string(path).map_err(|e| HatError::io_at("read", path, e))?;
    let checklist = render_checklist(registry);

    let Some(updated) = splice_checklist(&content, &checklist)? else {
        warn!("No 'Checks:' section found in {}", path.display());
        return Ok(None);
    };

    std::fs::write(path, updated).map_err(|e| HatError::io_at("write", path, e))?;
    let count = checklist.lines().count();
    debug!("Updated {} with {} checks", path.display(), count);
    Ok(Some(count))
}
