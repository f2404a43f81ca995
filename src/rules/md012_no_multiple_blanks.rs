//! MD012: no more than `maximum` consecutive blank lines.
//!
//! Grounded on the teacher's `md012_multiple_blanks.rs`, which walks
//! `content.lines()` counting a `blank_count` run and flags it once it
//! exceeds `self.maximum`. Reshaped into a `next_token` scan over
//! consecutive `Blank` tokens (one per blank source line, per the block
//! tokenizer) rather than re-splitting the document into lines.

use crate::rule::{Rule, RuleConfig, RuleContext, RuleDetails};
use crate::token::{Token, TokenKind};

#[derive(Default)]
pub struct Md012NoMultipleBlanks {
    maximum: i64,
    run_start: Option<(u32, u32)>,
    run_len: u32,
    reported_this_run: bool,
}

impl Md012NoMultipleBlanks {
    const DEFAULT_MAXIMUM: i64 = 1;
}

impl Rule for Md012NoMultipleBlanks {
    fn details(&self) -> RuleDetails {
        RuleDetails {
            id: "MD012",
            name: "no-multiple-blanks",
            description: "Multiple consecutive blank lines should be reduced",
            enabled_by_default: true,
            interface_version: crate::rule::INTERFACE_VERSION,
        }
    }

    fn initialize_from_config(&mut self, config: &RuleConfig) -> Result<(), crate::error::ConfigurationError> {
        self.maximum = config.get_int("MD012", "maximum", Self::DEFAULT_MAXIMUM)?;
        Ok(())
    }

    fn starting_file(&mut self, _path: &str) {
        self.run_start = None;
        self.run_len = 0;
        self.reported_this_run = false;
    }

    fn next_token(&mut self, ctx: &mut RuleContext<'_>, token: &Token) {
        match &token.kind {
            TokenKind::Blank { .. } => {
                if self.run_start.is_none() {
                    self.run_start = Some((token.pos.line, token.pos.column));
                }
                self.run_len += 1;
                if self.run_len as i64 > self.maximum && !self.reported_this_run {
                    let (line, column) = self.run_start.expect("set above");
                    ctx.report(
                        line,
                        column,
                        Some(format!(
                            "{} consecutive blank lines found, maximum allowed is {}",
                            self.run_len, self.maximum
                        )),
                    );
                    self.reported_this_run = true;
                }
            }
            _ => {
                self.run_start = None;
                self.run_len = 0;
                self.reported_this_run = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lrd::LinkRefRegistry;
    use crate::position::Position;

    fn blank(line: u32) -> Token {
        Token::new(Position::new(line, 1), TokenKind::Blank { whitespace: String::new() })
    }

    fn text(line: u32) -> Token {
        Token::new(
            Position::new(line, 1),
            TokenKind::Text {
                text: "hi".to_string(),
                leading_whitespace: String::new(),
            },
        )
    }

    fn run(rule: &mut Md012NoMultipleBlanks, tokens: &[Token]) -> Vec<crate::rule::Violation> {
        let mut violations = Vec::new();
        rule.starting_file("doc.md");
        let registry = LinkRefRegistry::new();
        for t in tokens {
            let mut ctx = RuleContext::new("doc.md", rule.details(), &mut violations).with_registry(&registry);
            rule.next_token(&mut ctx, t);
        }
        violations
    }

    #[test]
    fn default_maximum_is_one_blank_line() {
        let mut rule = Md012NoMultipleBlanks { maximum: 1, ..Default::default() };
        let violations = run(&mut rule, &[text(1), blank(2), text(3)]);
        assert!(violations.is_empty());
    }

    #[test]
    fn two_consecutive_blanks_exceed_the_default_maximum() {
        let mut rule = Md012NoMultipleBlanks { maximum: 1, ..Default::default() };
        let violations = run(&mut rule, &[text(1), blank(2), blank(3), text(4)]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 2);
    }

    #[test]
    fn only_reports_once_per_run_even_if_it_keeps_growing() {
        let mut rule = Md012NoMultipleBlanks { maximum: 1, ..Default::default() };
        let violations = run(&mut rule, &[blank(1), blank(2), blank(3), blank(4)]);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn configured_maximum_of_two_allows_two_blanks() {
        let mut rule = Md012NoMultipleBlanks { maximum: 2, ..Default::default() };
        let violations = run(&mut rule, &[text(1), blank(2), blank(3), text(4)]);
        assert!(violations.is_empty());
    }
}
