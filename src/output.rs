//! §6 report line format: `{path}:{line}:{column}: {rule_id}: {description}
//! ({rule_name})`, with an optional `\n  Extra: {detail}` line when the
//! violation carries rule-specific detail text.
//!
//! Grounded on the teacher's `formatter.rs`/`output/` modules for the
//! general shape of a stable, greppable CLI text format, simplified to the
//! one format spec §6 fixes (the teacher supports several output formats
//! selectable by flag; this crate's external surface names exactly one).

use crate::rule::Violation;
use std::fmt::Write as _;

/// Renders one violation as a single multi-line report entry, without a
/// trailing newline.
pub fn format_violation(path: &str, violation: &Violation) -> String {
    let mut out = format!(
        "{path}:{line}:{column}: {rule_id}: {description} ({rule_name})",
        line = violation.line,
        column = violation.column,
        rule_id = violation.rule_id,
        description = violation.description,
        rule_name = violation.rule_name,
    );
    if let Some(detail) = &violation.detail {
        let _ = write!(out, "\n  Extra: {detail}");
    }
    out
}

/// Renders every violation for one file, one report entry per line,
/// already sorted by the dispatcher into `(line, column)` order.
pub fn format_report(path: &str, violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format_violation(path, v))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(detail: Option<&str>) -> Violation {
        Violation {
            rule_id: "MD013",
            rule_name: "line-length",
            description: "line is too long",
            line: 12,
            column: 1,
            detail: detail.map(str::to_string),
        }
    }

    #[test]
    fn formats_a_violation_without_detail() {
        let line = format_violation("README.md", &violation(None));
        assert_eq!(line, "README.md:12:1: MD013: line is too long (line-length)");
    }

    #[test]
    fn formats_a_violation_with_detail_on_a_second_line() {
        let line = format_violation("README.md", &violation(Some("expected <= 80, found 97")));
        assert_eq!(
            line,
            "README.md:12:1: MD013: line is too long (line-length)\n  Extra: expected <= 80, found 97"
        );
    }

    #[test]
    fn joins_multiple_violations_with_newlines() {
        let report = format_report("README.md", &[violation(None), violation(None)]);
        assert_eq!(report.lines().count(), 2);
    }

    #[test]
    fn empty_violation_list_yields_empty_report() {
        assert_eq!(format_report("README.md", &[]), "");
    }
}
