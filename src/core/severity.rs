//! Severity tiers for check results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::HatError;

/// Four ordered tiers, least to most severe.
///
/// `Question` flags something for human judgement, `Warning` is likely a
/// problem, and `Error` is a definite defect that blocks publishing. Ordering
/// only drives visual weight; reports keep check order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Severity {
    /// Nothing wrong
    #[default]
    #[serde(rename = "SUCCESS", alias = "success")]
    Success,
    /// Possibly fine, needs a human to confirm
    #[serde(rename = "QUESTION", alias = "question")]
    Question,
    /// Likely a problem
    #[serde(rename = "WARNING", alias = "warning")]
    Warning,
    /// Must be fixed before publishing
    #[serde(rename = "ERROR", alias = "error")]
    Error,
}

impl Severity {
    /// All tiers in ascending order.
    pub const ALL: [Severity; 4] = [
        Severity::Success,
        Severity::Question,
        Severity::Warning,
        Severity::Error,
    ];

    /// Wire name used in persisted reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "SUCCESS",
            Severity::Question => "QUESTION",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }

    /// Whether this is the success tier.
    pub fn is_success(self) -> bool {
        self == Severity::Success
    }

    /// Terminal glyph for this tier.
    pub fn icon(self) -> &'static str {
        match self {
            Severity::Success => "✅",
            Severity::Question => "❓",
            Severity::Warning => "⚠️",
            Severity::Error => "❌",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = HatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HatError::validation(format!("Unknown severity '{s}'")))
    }
}
