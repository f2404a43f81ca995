//! `gfmlint_core`: a GFM/CommonMark tokenizer, inline resolver, and
//! pluggable-rule Markdown linter engine.
//!
//! [`tokenize`] is the single entry point driving the whole pipeline: the
//! block tokenizer (§4.B) produces a block-level [`token::TokenStream`]
//! with raw `Text` placeholders inside paragraphs/headings; [`splice_inline`]
//! resolves each of those placeholders through the inline scanner/resolver
//! (§4.E/§4.F) and splices the result back into the stream; [`coalesce`]
//! then folds unmatched delimiters and merges adjacent text (§4.G). The
//! result is what [`dispatch::RuleDispatcher`] walks.

pub mod block;
pub mod coalesce;
pub mod config;
pub mod container;
pub mod dispatch;
pub mod error;
pub mod exit_codes;
pub mod inline;
pub mod lrd;
pub mod output;
pub mod position;
pub mod rule;
pub mod rules;
pub mod scanner;
pub mod token;

use error::ParseAnomaly;
use lrd::LinkRefRegistry;
use position::Position;
use std::collections::{BTreeMap, HashMap};
use token::{Token, TokenIndex, TokenKind, TokenStream};

pub struct TokenizeResult {
    pub tokens: TokenStream,
    pub registry: LinkRefRegistry,
    pub anomalies: Vec<ParseAnomaly>,
    pub end_whitespace: BTreeMap<u32, String>,
}

/// Runs the full pipeline (§4.A through §4.G) over one document's source
/// text and returns the final, rule-facing token stream.
pub fn tokenize(source: &str) -> TokenizeResult {
    let block::BlockResult { tokens, registry, anomalies } = block::tokenize(source);
    let spliced = splice_inline(tokens, &registry);
    let coalesce::CoalesceResult { tokens, end_whitespace } = coalesce::coalesce(spliced.into_vec());

    TokenizeResult {
        tokens: tokens.into_iter().collect(),
        registry,
        anomalies,
        end_whitespace,
    }
}

/// Replaces the raw `Text` children of every paragraph/ATX-heading/setext-
/// heading with the output of the inline pipeline, remapping every `opener`
/// index in the stream (block- and inline-level alike) to its new position.
fn splice_inline(original: TokenStream, registry: &LinkRefRegistry) -> TokenStream {
    let tokens = original.into_vec();
    let mut out = TokenStream::new();
    let mut remap: HashMap<TokenIndex, TokenIndex> = HashMap::new();
    let mut i = 0usize;

    while i < tokens.len() {
        let tok = &tokens[i];
        if is_inline_bearing_start(&tok.kind) {
            let start_old_idx = i as TokenIndex;
            let mut lines: Vec<(Position, String)> = Vec::new();
            let mut j = i + 1;
            while let TokenKind::Text { text, .. } = &tokens[j].kind {
                lines.push((tokens[j].pos, text.clone()));
                j += 1;
            }
            let end_old_idx = j as TokenIndex;
            let end_tok = &tokens[j];
            debug_assert!(matching_end_opener(&end_tok.kind) == Some(start_old_idx));

            let new_start_idx = out.push(Token::new(tok.pos, tok.kind.clone()));
            remap.insert(start_old_idx, new_start_idx);

            let base = out.len() as TokenIndex;
            for itok in inline::tokenize_inline(&lines, registry) {
                let kind = match itok.kind {
                    TokenKind::EndLink { opener } => TokenKind::EndLink { opener: base + opener },
                    other => other,
                };
                out.push(Token::new(itok.pos, kind));
            }

            let new_end_idx = out.push(Token::new(end_tok.pos, set_end_opener(end_tok.kind.clone(), new_start_idx)));
            remap.insert(end_old_idx, new_end_idx);
            i = j + 1;
        } else {
            let new_idx = out.push(Token::new(tok.pos, remap_opener(tok.kind.clone(), &remap)));
            if tok.is_opener() {
                remap.insert(i as TokenIndex, new_idx);
            }
            i += 1;
        }
    }
    out
}

fn is_inline_bearing_start(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::ParagraphStart | TokenKind::AtxHeadingStart { .. } | TokenKind::SetextHeadingStart { .. }
    )
}

fn matching_end_opener(kind: &TokenKind) -> Option<TokenIndex> {
    match kind {
        TokenKind::ParagraphEnd { opener, .. } | TokenKind::AtxHeadingEnd { opener, .. } | TokenKind::SetextHeadingEnd { opener, .. } => {
            Some(*opener)
        }
        _ => None,
    }
}

fn set_end_opener(kind: TokenKind, new_opener: TokenIndex) -> TokenKind {
    match kind {
        TokenKind::ParagraphEnd { forced, .. } => TokenKind::ParagraphEnd { opener: new_opener, forced },
        TokenKind::AtxHeadingEnd { forced, .. } => TokenKind::AtxHeadingEnd { opener: new_opener, forced },
        TokenKind::SetextHeadingEnd { forced, .. } => TokenKind::SetextHeadingEnd { opener: new_opener, forced },
        other => other,
    }
}

fn remap_opener(kind: TokenKind, remap: &HashMap<TokenIndex, TokenIndex>) -> TokenKind {
    let fixup = |old: TokenIndex| *remap.get(&old).expect("opener token already emitted before its end token");
    match kind {
        TokenKind::ParagraphEnd { opener, forced } => TokenKind::ParagraphEnd { opener: fixup(opener), forced },
        TokenKind::AtxHeadingEnd { opener, forced } => TokenKind::AtxHeadingEnd { opener: fixup(opener), forced },
        TokenKind::SetextHeadingEnd { opener, forced } => TokenKind::SetextHeadingEnd { opener: fixup(opener), forced },
        TokenKind::FencedCodeEnd { opener, forced } => TokenKind::FencedCodeEnd { opener: fixup(opener), forced },
        TokenKind::IndentedCodeEnd { opener, forced } => TokenKind::IndentedCodeEnd { opener: fixup(opener), forced },
        TokenKind::HtmlBlockEnd { opener, forced } => TokenKind::HtmlBlockEnd { opener: fixup(opener), forced },
        TokenKind::BlockQuoteEnd { opener, forced } => TokenKind::BlockQuoteEnd { opener: fixup(opener), forced },
        TokenKind::ListEnd { opener, forced } => TokenKind::ListEnd { opener: fixup(opener), forced },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use token::check_balanced;

    #[test]
    fn splices_inline_content_into_paragraph() {
        let result = tokenize("a **bold** word\n");
        assert!(result
            .tokens
            .iter()
            .any(|t| matches!(t.kind, TokenKind::SpecialText { active: true, run_len: 2, .. })));
    }

    #[test]
    fn full_pipeline_stream_stays_balanced() {
        let result = tokenize("# Heading\n\n> quoted **bold** text\n\n- item one\n- item two\n");
        assert!(check_balanced(result.tokens.as_slice()).is_ok());
    }

    #[test]
    fn link_reference_definitions_resolve_across_document() {
        let result = tokenize("[foo]\n\n[foo]: /bar \"baz\"\n");
        assert!(result
            .tokens
            .iter()
            .any(|t| matches!(&t.kind, TokenKind::InlineLink { destination, .. } if destination == "/bar")));
    }

    #[test]
    fn code_block_lines_are_not_merged_or_inline_processed() {
        let result = tokenize("    line one\n    line two\n");
        let texts: Vec<_> = result
            .tokens
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["line one".to_string(), "line two".to_string()]);
    }

    #[test]
    fn trailing_whitespace_is_recorded() {
        let result = tokenize("hello   \n");
        assert_eq!(result.end_whitespace.get(&1).map(String::as_str), Some("   "));
    }
}
