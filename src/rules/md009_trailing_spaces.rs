//! MD009: lines must not end with trailing spaces (a lone trailing
//! backslash is the one exception — it's CommonMark's hard-break escape,
//! not stray whitespace).
//!
//! Grounded on the teacher's `md009_no_trailing_spaces.rs`, which runs a
//! `Regex::new(r" +$")` over `content.lines()`. Reshaped as a `next_line`
//! scan (spec §4.H's line-level hook) rather than a rule-owned regex,
//! since trailing-space columns are cheaper to find with `trim_end`/
//! `rfind` than to justify pulling in `regex` for one rule.

use crate::rule::{Rule, RuleContext, RuleDetails};

#[derive(Default)]
pub struct Md009TrailingSpaces;

impl Rule for Md009TrailingSpaces {
    fn details(&self) -> RuleDetails {
        RuleDetails {
            id: "MD009",
            name: "no-trailing-spaces",
            description: "Trailing spaces are not allowed",
            enabled_by_default: true,
            interface_version: crate::rule::INTERFACE_VERSION,
        }
    }

    fn next_line(&mut self, ctx: &mut RuleContext<'_>, text: &str) {
        if text.ends_with('\\') {
            return;
        }
        let trimmed = text.trim_end_matches([' ', '\t']);
        let trailing_len = text.len() - trimmed.len();
        if trailing_len > 0 {
            ctx.report(
                ctx.line,
                trimmed.chars().count() as u32 + 1,
                Some(format!("found {trailing_len} trailing space(s)")),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lrd::LinkRefRegistry;

    fn check(text: &str) -> Vec<crate::rule::Violation> {
        let mut rule = Md009TrailingSpaces;
        let mut violations = Vec::new();
        let registry = LinkRefRegistry::new();
        let mut ctx = RuleContext::new("doc.md", rule.details(), &mut violations).with_registry(&registry);
        ctx.line = 1;
        rule.next_line(&mut ctx, text);
        violations
    }

    #[test]
    fn clean_line_reports_nothing() {
        assert!(check("hello world").is_empty());
    }

    #[test]
    fn trailing_spaces_are_reported_at_the_first_trailing_column() {
        let violations = check("hello   ");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].column, 6);
        assert_eq!(violations[0].detail.as_deref(), Some("found 3 trailing space(s)"));
    }

    #[test]
    fn trailing_tab_is_also_flagged() {
        assert_eq!(check("hello\t").len(), 1);
    }

    #[test]
    fn trailing_backslash_hard_break_is_not_a_violation() {
        assert!(check("hello\\").is_empty());
    }
}
