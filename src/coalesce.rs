//! §4.G Token coalescer: the last step before tokens reach rule plugins.
//!
//! Three jobs, in order:
//! 1. Fold any `SpecialText` that never got marked `active` by the resolver
//!    back into literal `Text` (invariant 3 — no unresolved delimiter
//!    candidates survive to the rule-facing stream).
//! 2. Merge adjacent same-line `Text` tokens this folding can produce, and
//!    split each line's leading whitespace out into `Text::leading_whitespace`.
//! 3. Re-verify the stream is well-parenthesized (invariant 1) — cheap
//!    enough to run unconditionally, not just under `debug_assertions`,
//!    since a violation here means a real bug in the block/inline pipeline.
//!
//! Grounded on the teacher's `lint_context.rs` line-info precomputation
//! (`LineInfo::indent`/`trailing_whitespace`), reshaped from a whole-file
//! precomputed table into a token-stream pass since tokens, not lines, are
//! this crate's unit of rule-facing data.

use crate::token::{Token, TokenKind, check_balanced};
use std::collections::BTreeMap;

pub struct CoalesceResult {
    pub tokens: Vec<Token>,
    /// Trailing whitespace observed at the end of each source line that
    /// produced a `Text` token, keyed by line number. Kept alongside
    /// `leading_whitespace` (which lives on the token itself) since `Text`
    /// has no symmetric trailing-whitespace field; MD009 and friends read
    /// this directly instead of re-deriving it from `text`.
    pub end_whitespace: BTreeMap<u32, String>,
}

pub fn coalesce(tokens: Vec<Token>) -> CoalesceResult {
    let folded: Vec<Token> = tokens.into_iter().map(fold_unmatched_special_text).collect();
    let merged = merge_adjacent_text(folded);
    let (tokens, end_whitespace) = split_leading_and_trailing_whitespace(merged);

    if let Err(e) = check_balanced(&tokens) {
        panic!("coalescer produced an unbalanced token stream: {e}");
    }

    CoalesceResult { tokens, end_whitespace }
}

fn fold_unmatched_special_text(tok: Token) -> Token {
    match tok.kind {
        TokenKind::SpecialText {
            delimiter,
            run_len,
            active: false,
            ..
        } => Token::new(
            tok.pos,
            TokenKind::Text {
                text: std::iter::repeat_n(delimiter, run_len as usize).collect(),
                leading_whitespace: String::new(),
            },
        ),
        other => Token::new(tok.pos, other),
    }
}

fn merge_adjacent_text(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        let merge_target = out.last_mut().filter(|prev| {
            prev.pos.line == tok.pos.line && matches!(prev.kind, TokenKind::Text { .. }) && matches!(tok.kind, TokenKind::Text { .. })
        });
        if let Some(prev) = merge_target
            && let TokenKind::Text { text: prev_text, .. } = &mut prev.kind
            && let TokenKind::Text { text, .. } = &tok.kind
        {
            prev_text.push_str(text);
            continue;
        }
        out.push(tok);
    }
    out
}

fn split_leading_and_trailing_whitespace(tokens: Vec<Token>) -> (Vec<Token>, BTreeMap<u32, String>) {
    let mut end_whitespace = BTreeMap::new();
    let tokens = tokens
        .into_iter()
        .map(|mut tok| {
            if let TokenKind::Text { text, leading_whitespace } = &mut tok.kind {
                let core_start = text.len() - text.trim_start_matches([' ', '\t']).len();
                let leading: String = text[..core_start].to_string();
                let trailing_start = text.trim_end_matches([' ', '\t']).len();
                let trailing: String = text[trailing_start..].to_string();
                if !leading.is_empty() {
                    *leading_whitespace = leading;
                    *text = text[core_start..].to_string();
                }
                if !trailing.is_empty() {
                    end_whitespace.entry(tok.pos.line).or_insert(trailing);
                }
            }
            tok
        })
        .collect();
    (tokens, end_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn text(line: u32, s: &str) -> Token {
        Token::new(
            Position::new(line, 1),
            TokenKind::Text {
                text: s.to_string(),
                leading_whitespace: String::new(),
            },
        )
    }

    #[test]
    fn unmatched_special_text_folds_to_literal_text() {
        let tok = Token::new(
            Position::start(),
            TokenKind::SpecialText {
                delimiter: '*',
                run_len: 1,
                preceding_two: [None, None],
                following_two: [None, None],
                active: false,
            },
        );
        let result = coalesce(vec![tok]);
        assert!(matches!(&result.tokens[0].kind, TokenKind::Text { text, .. } if text == "*"));
    }

    #[test]
    fn adjacent_same_line_text_tokens_merge() {
        let result = coalesce(vec![text(1, "a"), text(1, "b")]);
        assert_eq!(result.tokens.len(), 1);
        assert!(matches!(&result.tokens[0].kind, TokenKind::Text { text, .. } if text == "ab"));
    }

    #[test]
    fn different_line_text_tokens_do_not_merge() {
        let result = coalesce(vec![text(1, "a"), text(2, "b")]);
        assert_eq!(result.tokens.len(), 2);
    }

    #[test]
    fn leading_and_trailing_whitespace_are_split_out() {
        let result = coalesce(vec![text(1, "  hi  ")]);
        assert!(matches!(&result.tokens[0].kind, TokenKind::Text { text, leading_whitespace } if text == "hi  " && leading_whitespace == "  "));
        assert_eq!(result.end_whitespace.get(&1).map(String::as_str), Some("  "));
    }

    #[test]
    fn balanced_block_stream_passes_through() {
        let tokens = vec![
            Token::new(Position::start(), TokenKind::ParagraphStart),
            text(1, "hi"),
            Token::new(
                Position::start(),
                TokenKind::ParagraphEnd { opener: 0, forced: false },
            ),
        ];
        let result = coalesce(tokens);
        assert_eq!(result.tokens.len(), 3);
    }
}
