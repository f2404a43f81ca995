//! MD049: emphasis should use a consistent delimiter (`*` vs `_`).
//!
//! Grounded on the teacher's `md049_emphasis_style.rs` `EmphasisStyle` enum
//! (`Consistent`/`Asterisk`/`Underscore`). Only resolved, `active`
//! `SpecialText` delimiters are checked (§4.F marks an emphasis run
//! `active` once it's matched into a pair); unmatched runs are folded into
//! literal text by the coalescer and carry no stylistic meaning.

use crate::rule::{Rule, RuleConfig, RuleContext, RuleDetails};
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Asterisk,
    Underscore,
    Consistent,
}

impl Style {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asterisk" => Some(Self::Asterisk),
            "underscore" => Some(Self::Underscore),
            "consistent" => Some(Self::Consistent),
            _ => None,
        }
    }

    fn delimiter(self) -> Option<char> {
        match self {
            Self::Asterisk => Some('*'),
            Self::Underscore => Some('_'),
            Self::Consistent => None,
        }
    }
}

pub struct Md049EmphasisStyle {
    configured: Style,
    observed: Option<char>,
}

impl Default for Md049EmphasisStyle {
    fn default() -> Self {
        Self {
            configured: Style::Consistent,
            observed: None,
        }
    }
}

impl Rule for Md049EmphasisStyle {
    fn details(&self) -> RuleDetails {
        RuleDetails {
            id: "MD049",
            name: "emphasis-style",
            description: "Emphasis style should be consistent",
            enabled_by_default: true,
            interface_version: crate::rule::INTERFACE_VERSION,
        }
    }

    fn initialize_from_config(&mut self, config: &RuleConfig) -> Result<(), crate::error::ConfigurationError> {
        let raw = config.get_validated_string("MD049", "style", "consistent", |v| Style::parse(v).is_some())?;
        self.configured = Style::parse(&raw).expect("validated above");
        Ok(())
    }

    fn starting_file(&mut self, _path: &str) {
        self.observed = None;
    }

    fn next_token(&mut self, ctx: &mut RuleContext<'_>, token: &Token) {
        let TokenKind::SpecialText { delimiter, active: true, .. } = &token.kind else {
            return;
        };
        let actual = *delimiter;

        let expected = match self.configured.delimiter() {
            Some(d) => d,
            None => *self.observed.get_or_insert(actual),
        };

        if actual != expected {
            ctx.report(
                token.pos.line,
                token.pos.column,
                Some(format!("expected '{expected}', found '{actual}'")),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lrd::LinkRefRegistry;
    use crate::position::Position;

    fn emphasis(line: u32, delimiter: char) -> Token {
        Token::new(
            Position::new(line, 1),
            TokenKind::SpecialText {
                delimiter,
                run_len: 1,
                preceding_two: [None, None],
                following_two: [None, None],
                active: true,
            },
        )
    }

    fn inactive(line: u32, delimiter: char) -> Token {
        Token::new(
            Position::new(line, 1),
            TokenKind::SpecialText {
                delimiter,
                run_len: 1,
                preceding_two: [None, None],
                following_two: [None, None],
                active: false,
            },
        )
    }

    fn run(rule: &mut Md049EmphasisStyle, tokens: &[Token]) -> Vec<crate::rule::Violation> {
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
    fn consistent_mode_accepts_all_asterisk() {
        let mut rule = Md049EmphasisStyle::default();
        assert!(run(&mut rule, &[emphasis(1, '*'), emphasis(1, '*')]).is_empty());
    }

    #[test]
    fn consistent_mode_flags_a_later_underscore_after_asterisk() {
        let mut rule = Md049EmphasisStyle::default();
        let violations = run(&mut rule, &[emphasis(1, '*'), emphasis(2, '_')]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 2);
    }

    #[test]
    fn inactive_delimiters_are_ignored() {
        let mut rule = Md049EmphasisStyle::default();
        assert!(run(&mut rule, &[emphasis(1, '*'), inactive(2, '_')]).is_empty());
    }

    #[test]
    fn explicit_underscore_style_flags_asterisk_at_line_one() {
        let mut rule = Md049EmphasisStyle {
            configured: Style::Underscore,
            observed: None,
        };
        let violations = run(&mut rule, &[emphasis(1, '*')]);
        assert_eq!(violations.len(), 1);
    }
}
