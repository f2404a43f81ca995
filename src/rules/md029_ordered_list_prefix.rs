//! MD029: ordered list item markers should follow a consistent numbering
//! style.
//!
//! Grounded on the teacher's `md029_ordered_list_prefix.rs` style enum
//! (`One`/`Ordered`/`Zero`/`Consistent` here, trimmed from the teacher's
//! `One`/`OneOne`/`Ordered`/`Ordered0` naming to the semantics this crate's
//! token model can express). The token stream only carries a literal
//! `start_number` on `OrderedListStart` and a fieldless `NewListItem` for
//! every later item in the list, so the literal marker digits for items
//! after the first have to come from the raw source line. This rule uses
//! the two-phase dispatch (spec §4.H): it buffers every line during the
//! `next_line` pass, which completes before `next_token` begins, then reads
//! the buffered text back by line number when a list-item token arrives.

use crate::rule::{Rule, RuleConfig, RuleContext, RuleDetails};
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    /// Every marker is the same number (commonly `1.` for every item).
    One,
    /// Markers increase by one starting from the list's first marker.
    Ordered,
    /// Every marker is `0.`.
    Zero,
    /// Inferred from the first two markers of each list.
    Consistent,
}

impl Style {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "one" => Some(Self::One),
            "ordered" => Some(Self::Ordered),
            "zero" => Some(Self::Zero),
            "consistent" => Some(Self::Consistent),
            _ => None,
        }
    }
}

struct ListState {
    style: Option<Style>,
    start_number: u64,
    items_seen: u64,
}

pub struct Md029OrderedListPrefix {
    configured: Style,
    lines: Vec<String>,
    stack: Vec<ListState>,
}

impl Default for Md029OrderedListPrefix {
    fn default() -> Self {
        Self {
            configured: Style::Consistent,
            lines: Vec::new(),
            stack: Vec::new(),
        }
    }
}

impl Md029OrderedListPrefix {
    fn marker_number_on_line(lines: &[String], line: u32) -> Option<u64> {
        let text = lines.get(line.checked_sub(1)? as usize)?;
        let digits: String = text.trim_start().chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }

    fn expected_for(style: Style, state: &ListState, actual: u64) -> u64 {
        match style {
            Style::One => state.start_number,
            Style::Zero => 0,
            Style::Ordered => state.start_number + state.items_seen + 1,
            Style::Consistent => actual,
        }
    }
}

impl Rule for Md029OrderedListPrefix {
    fn details(&self) -> RuleDetails {
        RuleDetails {
            id: "MD029",
            name: "ordered-list-item-prefix",
            description: "Ordered list item prefix should be consistent",
            enabled_by_default: true,
            interface_version: crate::rule::INTERFACE_VERSION,
        }
    }

    fn initialize_from_config(&mut self, config: &RuleConfig) -> Result<(), crate::error::ConfigurationError> {
        let raw = config.get_validated_string("MD029", "style", "consistent", |v| Style::parse(v).is_some())?;
        self.configured = Style::parse(&raw).expect("validated above");
        Ok(())
    }

    fn starting_file(&mut self, _path: &str) {
        self.lines.clear();
        self.stack.clear();
    }

    fn next_line(&mut self, _ctx: &mut RuleContext<'_>, text: &str) {
        self.lines.push(text.to_string());
    }

    fn next_token(&mut self, ctx: &mut RuleContext<'_>, token: &Token) {
        match &token.kind {
            TokenKind::OrderedListStart { start_number, .. } => {
                self.stack.push(ListState {
                    style: None,
                    start_number: *start_number,
                    items_seen: 0,
                });
            }
            TokenKind::NewListItem => {
                let Some(actual) = Self::marker_number_on_line(&self.lines, token.pos.line) else { return };
                let configured = self.configured;
                let Some(state) = self.stack.last_mut() else { return };

                let style = match configured {
                    Style::Consistent => *state.style.get_or_insert(if state.items_seen == 0 {
                        if actual == state.start_number {
                            Style::One
                        } else {
                            Style::Ordered
                        }
                    } else {
                        Style::Ordered
                    }),
                    explicit => explicit,
                };

                let expected = Self::expected_for(style, state, actual);
                state.items_seen += 1;
                if actual != expected {
                    ctx.report(
                        token.pos.line,
                        token.pos.column,
                        Some(format!("expected item marker {expected}, found {actual}")),
                    );
                }
            }
            TokenKind::ListEnd { .. } => {
                self.stack.pop();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lrd::LinkRefRegistry;
    use crate::position::Position;

    fn start(line: u32, start_number: u64) -> Token {
        Token::new(
            Position::new(line, 1),
            TokenKind::OrderedListStart { start_number, marker: '.', indent: 0 },
        )
    }

    fn item(line: u32) -> Token {
        Token::new(Position::new(line, 1), TokenKind::NewListItem)
    }

    fn end(line: u32) -> Token {
        Token::new(Position::new(line, 1), TokenKind::ListEnd { opener: 0, forced: false })
    }

    fn run(rule: &mut Md029OrderedListPrefix, lines: &[&str], tokens: &[Token]) -> Vec<crate::rule::Violation> {
        let mut violations = Vec::new();
        rule.starting_file("doc.md");
        let registry = LinkRefRegistry::new();
        for line in lines {
            let mut ctx = RuleContext::new("doc.md", rule.details(), &mut violations).with_registry(&registry);
            rule.next_line(&mut ctx, line);
        }
        for t in tokens {
            let mut ctx = RuleContext::new("doc.md", rule.details(), &mut violations).with_registry(&registry);
            rule.next_token(&mut ctx, t);
        }
        violations
    }

    #[test]
    fn explicit_ordered_style_accepts_increasing_markers() {
        let mut rule = Md029OrderedListPrefix {
            configured: Style::Ordered,
            ..Default::default()
        };
        let lines = ["1. a", "2. b", "3. c"];
        let tokens = [start(1, 1), item(2), item(3), end(4)];
        assert!(run(&mut rule, &lines, &tokens).is_empty());
    }

    #[test]
    fn explicit_ordered_style_flags_a_repeated_marker() {
        let mut rule = Md029OrderedListPrefix {
            configured: Style::Ordered,
            ..Default::default()
        };
        let lines = ["1. a", "1. b"];
        let tokens = [start(1, 1), item(2), end(3)];
        let violations = run(&mut rule, &lines, &tokens);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].detail.as_deref(), Some("expected item marker 2, found 1"));
    }

    #[test]
    fn explicit_one_style_requires_every_marker_to_match_the_first() {
        let mut rule = Md029OrderedListPrefix {
            configured: Style::One,
            ..Default::default()
        };
        let lines = ["1. a", "1. b", "1. c"];
        let tokens = [start(1, 1), item(2), item(3), end(4)];
        assert!(run(&mut rule, &lines, &tokens).is_empty());
    }

    #[test]
    fn consistent_style_infers_all_ones_from_a_repeated_second_item() {
        let mut rule = Md029OrderedListPrefix::default();
        let lines = ["1. a", "1. b", "1. c"];
        let tokens = [start(1, 1), item(2), item(3), end(4)];
        assert!(run(&mut rule, &lines, &tokens).is_empty());
    }
}
