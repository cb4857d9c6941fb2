//! Host application checks.

use tracing::debug;

use super::{Check, CheckContext, CheckModule};
use crate::core::config::ChecksConfig;
use crate::core::errors::{HatError, Result};
use crate::core::report::CheckResult;
use crate::core::severity::Severity;

pub(super) const MODULES: &[CheckModule] =
    &[CheckModule::new("technical/host_version", HostVersion::load)];

/// Parse the `major.minor` part of a version string like `4.2.1 LTS`.
pub fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
    let numeric = version.split_whitespace().next()?;
    let mut parts = numeric.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// Compares the running host against the latest official release.
pub struct HostVersion {
    latest: Option<(String, (u32, u32))>,
}

impl HostVersion {
    fn load(config: &ChecksConfig) -> Result<Box<dyn Check>> {
        let latest = match &config.latest_host_version {
            Some(raw) => {
                let parsed = parse_major_minor(raw).ok_or_else(|| {
                    HatError::config_field(
                        format!("Cannot parse host version '{raw}'"),
                        "checks.latest_host_version",
                    )
                })?;
                Some((raw.clone(), parsed))
            }
            None => None,
        };
        Ok(Box::new(Self { latest }))
    }
}

impl Check for HostVersion {
    fn description(&self) -> &str {
        "Host application version is the latest official release"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Result<CheckResult> {
        let Some((latest_raw, latest)) = &self.latest else {
            debug!("No latest host version configured, skipping version comparison");
            return Ok(CheckResult::success());
        };

        let current = ctx.scene.host_version();
        let Some(running) = parse_major_minor(current) else {
            return Ok(CheckResult::single(
                Severity::Warning,
                format!("Unknown host version '{current}'"),
            ));
        };

        if running < *latest {
            return Ok(CheckResult::single(
                Severity::Error,
                format!("Host version is outdated, please update to {latest_raw}"),
            ));
        }
        Ok(CheckResult::success())
    }
}
