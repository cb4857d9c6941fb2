//! Property tests for the persisted report format.

use hat_rs::core::report::{CheckResult, Report};
use hat_rs::Severity;
use proptest::prelude::*;

fn check_result() -> impl Strategy<Value = CheckResult> {
    (
        proptest::sample::select(Severity::ALL.to_vec()),
        proptest::collection::vec("\\PC{0,24}", 0..4),
    )
        .prop_filter_map("non-success results carry a message", |(severity, messages)| {
            CheckResult::new(severity, messages).ok()
        })
}

fn report() -> impl Strategy<Value = Report> {
    proptest::collection::vec(check_result(), 0..12)
        .prop_map(|results| results.into_iter().collect())
}

proptest! {
    #[test]
    fn report_survives_persistence(report in report()) {
        let raw = report.to_json().unwrap();
        prop_assert_eq!(Report::from_json(&raw).unwrap(), report);
    }

    #[test]
    fn wire_format_is_severity_message_pairs(report in report()) {
        let raw = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entries = value.as_array().unwrap();
        prop_assert_eq!(entries.len(), report.entries().len());

        for (entry, result) in entries.iter().zip(report.entries()) {
            let pair = entry.as_array().unwrap();
            prop_assert_eq!(pair.len(), 2);
            prop_assert_eq!(pair[0].as_str(), Some(result.severity.as_str()));
            let messages: Vec<&str> = pair[1]
                .as_array()
                .unwrap()
                .iter()
                .filter_map(|message| message.as_str())
                .collect();
            let expected: Vec<&str> = result.messages.iter().map(String::as_str).collect();
            prop_assert_eq!(messages, expected);
        }
    }

    #[test]
    fn silent_non_success_is_rejected(index in 1usize..Severity::ALL.len()) {
        let raw = format!(r#"[["{}",[]]]"#, Severity::ALL[index].as_str());
        prop_assert!(Report::from_json(&raw).is_err());
    }
}
