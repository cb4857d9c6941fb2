//! Save file and texture file checks.

use super::{routine, Check, CheckContext, CheckModule};
use crate::core::config::{ChecksConfig, FileSizeLimits};
use crate::core::errors::{HatError, Result};
use crate::core::report::{CheckResult, Findings};
use crate::core::severity::Severity;
use crate::scene::paths::{host_basename, resolve_host_path};

/// Prefix every texture path must have.
const TEXTURES_PREFIX: &str = "//textures/";

pub(super) const MODULES: &[CheckModule] = &[
    CheckModule::new("files/file_size", FileSize::load),
    routine!(
        "files/files_exist",
        "All referenced texture files exist on disk",
        files_exist
    ),
    routine!(
        "files/relative_paths",
        "All texture paths should be relative and point to the textures folder",
        relative_paths
    ),
];

/// Flags save files that are suspiciously large for their asset type.
pub struct FileSize {
    limits: FileSizeLimits,
}

impl FileSize {
    fn load(config: &ChecksConfig) -> Result<Box<dyn Check>> {
        for limit in [config.file_size.model, config.file_size.texture] {
            if limit.warn_kb > limit.max_kb {
                return Err(HatError::config_field(
                    "warn_kb must not exceed max_kb",
                    "checks.file_size",
                ));
            }
        }
        Ok(Box::new(Self {
            limits: config.file_size,
        }))
    }
}

impl Check for FileSize {
    fn description(&self) -> &str {
        "File size is within acceptable limits for the asset type"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let Some(path) = ctx.scene.file_path() else {
            return Ok(CheckResult::success());
        };
        if !path.exists() {
            return Ok(CheckResult::success());
        }

        let size = std::fs::metadata(path)
            .map_err(|e| HatError::io_at("inspect", path, e))?
            .len();
        let limit = self.limits.for_asset(ctx.asset_type);

        if size > limit.max_kb * 1024 {
            return Ok(CheckResult::single(
                Severity::Error,
                format!("File size >{}kB, unnecessary data present?", limit.max_kb),
            ));
        }
        if size > limit.warn_kb * 1024 {
            return Ok(CheckResult::single(
                Severity::Warning,
                format!("File size >{}kB", limit.warn_kb),
            ));
        }
        Ok(CheckResult::success())
    }
}

fn files_exist(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let save_dir = ctx.scene.save_dir();
    let mut findings = Findings::new();
    for image in ctx.scene.images() {
        if image.filepath.is_empty() {
            continue;
        }
        if !resolve_host_path(&image.filepath, save_dir).exists() {
            findings.flag(
                Severity::Error,
                format!("'{}' does not exist", host_basename(&image.filepath)),
            );
        }
    }
    Ok(findings.finish())
}

fn relative_paths(ctx: &CheckContext<'_>) -> Result<CheckResult> {
    let mut findings = Findings::new();
    for image in ctx.scene.texture_images() {
        if !image.filepath.replace('\\', "/").starts_with(TEXTURES_PREFIX) {
            findings.flag(
                Severity::Error,
                format!(
                    "{} is not in the textures folder",
                    host_basename(&image.filepath)
                ),
            );
        }
    }
    Ok(findings.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{run, textured};
    use crate::scene::{AssetType, SceneSnapshot};
    use tempfile::TempDir;

    #[test]
    fn test_file_size_thresholds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brick.blend");
        std::fs::write(&path, vec![b' '; 400 * 1024]).unwrap();

        let scene = SceneSnapshot::new().with_file_path(&path);
        let config = ChecksConfig::default();
        let check = FileSize::load(&config).unwrap();

        let texture = CheckContext::new("brick", AssetType::Texture, &scene, &config);
        assert_eq!(
            check.run(&texture).unwrap(),
            CheckResult::single(Severity::Warning, "File size >300kB")
        );

        let model = CheckContext::new("brick", AssetType::Model, &scene, &config);
        assert!(check.run(&model).unwrap().severity.is_success());

        std::fs::write(&path, vec![b' '; 600 * 1024]).unwrap();
        assert_eq!(check.run(&texture).unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_file_size_rejects_inverted_limits() {
        let mut config = ChecksConfig::default();
        config.file_size.model.warn_kb = config.file_size.model.max_kb + 1;
        assert!(FileSize::load(&config).is_err());
    }

    #[test]
    fn test_files_exist() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("textures")).unwrap();
        std::fs::write(dir.path().join("textures/rock_01_diff.png"), b"png").unwrap();

        let scene = textured(
            "rock_01",
            &[("rock_01_diff.png", "sRGB"), ("rock_01_rough.png", "Non-Color")],
        )
        .with_file_path(dir.path().join("rock_01.blend"));

        let result = run(files_exist, &scene, "rock_01", AssetType::Model);
        assert_eq!(result.messages, vec!["'rock_01_rough.png' does not exist"]);
    }

    #[test]
    fn test_relative_paths() {
        let mut scene = textured("rock_01", &[("rock_01_diff.png", "sRGB")]);
        assert!(run(relative_paths, &scene, "rock_01", AssetType::Model)
            .severity
            .is_success());

        scene.images[0].filepath = "//textures\\rock_01_diff.png".into();
        assert!(run(relative_paths, &scene, "rock_01", AssetType::Model)
            .severity
            .is_success());

        scene.images[0].filepath = "C:\\downloads\\rock_01_diff.png".into();
        assert_eq!(
            run(relative_paths, &scene, "rock_01", AssetType::Model).messages,
            vec!["rock_01_diff.png is not in the textures folder"]
        );
    }
}
