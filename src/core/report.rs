//! Check results and the aggregated run report.
//!
//! The persisted wire format is a JSON list of `[severity, [messages...]]`
//! pairs. It has to survive a serialize/deserialize cycle unchanged because
//! the host keeps it in a scene property and redraws it without rerunning.

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::core::errors::{HatError, Result, ResultExt};
use crate::core::severity::Severity;

/// Message emitted by the unsaved-changes check. Ignorable when aggregating.
pub const UNSAVED_CHANGES_MESSAGE: &str = "File contains unsaved changes";

/// Message of the synthetic entry appended to a clean report.
pub const ALL_PASSED_MESSAGE: &str = "All checks passed!";

/// Outcome of one check: a severity and its ordered messages.
///
/// A non-success severity always carries at least one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "(Severity, Vec<String>)",
    into = "(Severity, Vec<String>)"
)]
pub struct CheckResult {
    /// Severity tier
    pub severity: Severity,
    /// Messages in the order the check produced them
    pub messages: Vec<String>,
}

impl CheckResult {
    /// A clean result with no messages.
    pub fn success() -> Self {
        Self {
            severity: Severity::Success,
            messages: Vec::new(),
        }
    }

    /// A clean result with a single confirmatory message.
    pub fn success_with(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            messages: vec![message.into()],
        }
    }

    /// A result with a single message at the given severity.
    pub fn single(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            messages: vec![message.into()],
        }
    }

    /// Build a result, rejecting a non-success severity without messages.
    pub fn new(severity: Severity, messages: Vec<String>) -> Result<Self> {
        let result = Self { severity, messages };
        if result.is_well_formed() {
            Ok(result)
        } else {
            Err(HatError::validation(format!(
                "{} result must carry at least one message",
                severity
            )))
        }
    }

    /// Whether the result satisfies the message invariant.
    pub fn is_well_formed(&self) -> bool {
        self.severity.is_success() || !self.messages.is_empty()
    }
}

impl TryFrom<(Severity, Vec<String>)> for CheckResult {
    type Error = HatError;

    fn try_from((severity, messages): (Severity, Vec<String>)) -> Result<Self> {
        CheckResult::new(severity, messages)
    }
}

impl From<CheckResult> for (Severity, Vec<String>) {
    fn from(result: CheckResult) -> Self {
        (result.severity, result.messages)
    }
}

/// Accumulates findings inside a check.
///
/// The severity only ever rises, so a check can flag mixed problems and end up
/// at the worst of them.
#[derive(Debug, Default)]
pub struct Findings {
    severity: Severity,
    messages: Vec<String>,
}

impl Findings {
    /// Start with a clean slate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem.
    pub fn flag(&mut self, severity: Severity, message: impl Into<String>) {
        self.severity = self.severity.max(severity);
        self.messages.push(message.into());
    }

    /// Record an informational message without changing the severity.
    pub fn note(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Current severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Whether nothing has been flagged yet.
    pub fn is_clean(&self) -> bool {
        self.severity.is_success()
    }

    /// Finish the check.
    pub fn finish(self) -> CheckResult {
        CheckResult {
            severity: self.severity,
            messages: self.messages,
        }
    }

    /// Finish the check, replacing the messages with `message` when clean.
    pub fn finish_or(self, message: impl Into<String>) -> CheckResult {
        if self.is_clean() {
            CheckResult::success_with(message)
        } else {
            self.finish()
        }
    }
}

/// Ordered results of one run, one entry per executed check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    entries: Vec<CheckResult>,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result, keeping call order.
    pub fn push(&mut self, result: CheckResult) {
        self.entries.push(result);
    }

    /// All entries in check order.
    pub fn entries(&self) -> &[CheckResult] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Worst severity in the report.
    pub fn worst(&self) -> Severity {
        self.entries
            .iter()
            .map(|entry| entry.severity)
            .max()
            .unwrap_or_default()
    }

    /// Number of entries at exactly `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.severity == severity)
            .count()
    }

    /// Whether any entry is an error.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// True when every non-success message is in `ignorable`.
    pub fn is_clean(&self, ignorable: &[String]) -> bool {
        self.entries
            .iter()
            .filter(|entry| !entry.severity.is_success())
            .all(|entry| {
                !entry.messages.is_empty()
                    && entry
                        .messages
                        .iter()
                        .all(|message| ignorable.iter().any(|i| i == message))
            })
    }

    /// Append the synthetic "all passed" entry when the report is clean.
    ///
    /// Returns whether the entry was appended.
    pub fn finalize(&mut self, ignorable: &[String]) -> bool {
        if self.is_clean(ignorable) {
            self.push(CheckResult::success_with(ALL_PASSED_MESSAGE));
            true
        } else {
            false
        }
    }

    /// Messages to show the user, skipping ignorable ones.
    pub fn visible_messages<'a>(
        &'a self,
        ignorable: &'a [String],
    ) -> impl Iterator<Item = (Severity, &'a str)> + 'a {
        self.entries.iter().flat_map(move |entry| {
            entry
                .messages
                .iter()
                .filter(move |message| !ignorable.iter().any(|i| i == *message))
                .map(move |message| (entry.severity, message.as_str()))
        })
    }

    /// Serialize to the persisted wire format.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Parse the persisted wire format.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Stored report is malformed")
    }
}

impl FromIterator<CheckResult> for Report {
    fn from_iter<I: IntoIterator<Item = CheckResult>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignorable() -> Vec<String> {
        vec![UNSAVED_CHANGES_MESSAGE.to_string()]
    }

    #[test]
    fn test_wire_format_shape() {
        let report: Report = vec![
            CheckResult::success(),
            CheckResult::single(Severity::Error, "rock_01_rough.png isn't Non-Color"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            report.to_json().unwrap(),
            r#"[["SUCCESS",[]],["ERROR",["rock_01_rough.png isn't Non-Color"]]]"#
        );
    }

    #[test]
    fn test_round_trip_preserves_order_and_tiers() {
        let report: Report = vec![
            CheckResult::single(Severity::Question, "Plane has default dimensions"),
            CheckResult::success_with("LOD0 collection exists"),
            CheckResult::new(
                Severity::Warning,
                vec!["a is not at origin".into(), "b is not at origin".into()],
            )
            .unwrap(),
        ]
        .into_iter()
        .collect();

        let decoded = Report::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(decoded, report);
    }

    #[test]
    fn test_deserialize_rejects_empty_non_success() {
        assert!(Report::from_json(r#"[["WARNING",[]]]"#).is_err());
        assert!(Report::from_json(r#"[["PANIC",["x"]]]"#).is_err());
    }

    #[test]
    fn test_unsaved_warning_alone_is_clean() {
        let mut report: Report = vec![
            CheckResult::success(),
            CheckResult::single(Severity::Warning, UNSAVED_CHANGES_MESSAGE),
            CheckResult::success(),
        ]
        .into_iter()
        .collect();

        assert!(report.finalize(&ignorable()));
        assert_eq!(
            report.entries().last(),
            Some(&CheckResult::success_with(ALL_PASSED_MESSAGE))
        );
    }

    #[test]
    fn test_real_warning_blocks_all_passed() {
        let mut report: Report = vec![
            CheckResult::single(Severity::Warning, UNSAVED_CHANGES_MESSAGE),
            CheckResult::single(Severity::Question, "Cube is not at origin"),
        ]
        .into_iter()
        .collect();

        assert!(!report.finalize(&ignorable()));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_findings_severity_only_rises() {
        let mut findings = Findings::new();
        findings.flag(Severity::Error, "first");
        findings.flag(Severity::Question, "second");
        let result = findings.finish();
        assert_eq!(result.severity, Severity::Error);
        assert_eq!(result.messages, vec!["first", "second"]);
    }

    #[test]
    fn test_finish_or_uses_confirmation_when_clean() {
        let result = Findings::new().finish_or("All good");
        assert_eq!(result, CheckResult::success_with("All good"));
    }

    #[test]
    fn test_visible_messages_skip_ignorable() {
        let report: Report = vec![
            CheckResult::single(Severity::Warning, UNSAVED_CHANGES_MESSAGE),
            CheckResult::single(Severity::Error, "No collection with slug name"),
        ]
        .into_iter()
        .collect();
        let ignorable = ignorable();
        let visible: Vec<_> = report.visible_messages(&ignorable).collect();
        assert_eq!(
            visible,
            vec![(Severity::Error, "No collection with slug name")]
        );
    }
}
