//! §4.B Block tokenizer: the line-driven state machine that is the core of
//! this crate. Consumes one physical line at a time (§5: a pull pipeline,
//! never the whole document at once except for the eager initial read),
//! threading a [`ContainerStack`] (§4.C) and a single "open leaf" across
//! lines, and produces a flat, arena-backed [`TokenStream`].
//!
//! Grounded on the teacher's per-line classification helpers
//! (`lint_context/heading_detection.rs`, `lint_context/list_blocks.rs`,
//! `rules::heading_utils`, `utils::code_block_utils`), which precompute a
//! `LineInfo` per line of the whole document up front; here those
//! predicates are reused as pure functions (`classify`) but driven by an
//! actual forward-only state machine rather than a precomputed vector,
//! since the tokenizer needs to track open/close state across lines.

pub mod classify;
mod lrd_parse;

use crate::container::{Container, ContainerStack};
use crate::error::ParseAnomaly;
use crate::lrd::LinkRefRegistry;
use crate::position::Position;
use crate::scanner::{SourceScanner, visual_indent_width};
use crate::token::{Token, TokenIndex, TokenKind, TokenStream};

pub struct BlockResult {
    pub tokens: TokenStream,
    pub registry: LinkRefRegistry,
    pub anomalies: Vec<ParseAnomaly>,
}

enum OpenLeaf {
    None,
    Paragraph {
        start_pos: Position,
        lines: Vec<(Position, String)>,
    },
    IndentedCode {
        opener: TokenIndex,
        pending_blanks: Vec<(Position, String)>,
    },
    FencedCode {
        opener: TokenIndex,
        fence_char: char,
        fence_len: u32,
        indent: u32,
    },
    HtmlBlock {
        opener: TokenIndex,
        kind: u8,
    },
}

struct Tokenizer {
    tokens: TokenStream,
    containers: ContainerStack,
    registry: LinkRefRegistry,
    anomalies: Vec<ParseAnomaly>,
    open_leaf: OpenLeaf,
}

/// Runs the full A->B(C,D)->G pipeline's block half over `source`,
/// returning the raw (not yet coalesced) token stream, the link reference
/// definitions gathered along the way, and any diagnostic anomalies.
pub fn tokenize(source: &str) -> BlockResult {
    let mut tz = Tokenizer {
        tokens: TokenStream::new(),
        containers: ContainerStack::new(),
        registry: LinkRefRegistry::new(),
        anomalies: Vec::new(),
        open_leaf: OpenLeaf::None,
    };
    tz.run(source);
    BlockResult {
        tokens: tz.tokens,
        registry: tz.registry,
        anomalies: tz.anomalies,
    }
}

impl Tokenizer {
    fn run(&mut self, source: &str) {
        let mut scanner = SourceScanner::new(source).peekable();
        self.consume_front_matter(&mut scanner);

        for line in scanner {
            self.process_line(line.text, line.line_number);
        }
        self.finish();
    }

    fn consume_front_matter(&mut self, scanner: &mut std::iter::Peekable<SourceScanner<'_>>) {
        let fence = match scanner.peek() {
            Some(l) if l.text.trim_end() == "---" => "---",
            Some(l) if l.text.trim_end() == "+++" => "+++",
            _ => return,
        };
        scanner.next();
        let mut body = String::new();
        let mut closed = false;
        for line in scanner.by_ref() {
            if line.text.trim_end() == fence {
                closed = true;
                break;
            }
            body.push_str(line.text);
            body.push('\n');
        }
        if !closed {
            self.anomalies.push(ParseAnomaly {
                line: 1,
                detail: "unterminated front matter block".into(),
            });
        }
        let parsed = if fence == "---" {
            serde_yml::from_str::<serde_json::Value>(&body).ok()
        } else {
            toml::from_str::<serde_json::Value>(&body).ok()
        };
        let map = match parsed {
            Some(serde_json::Value::Object(map)) => map,
            _ => {
                self.anomalies.push(ParseAnomaly {
                    line: 1,
                    detail: "front matter did not parse as a mapping".into(),
                });
                serde_json::Map::new()
            }
        };
        self.tokens.push(Token::new(Position::start(), TokenKind::FrontMatter { map }));
    }

    fn process_line(&mut self, text: &str, line_number: u32) {
        let cm = self.containers.match_continuations(text);
        let unmatched = self.containers.depth() - cm.matched;

        let lazy_ok = unmatched > 0
            && matches!(self.open_leaf, OpenLeaf::Paragraph { .. })
            && !interrupts_paragraph(&text[cm.byte_offset..]);

        if unmatched > 0 && !lazy_ok {
            let pos = Position::new(line_number, cm.byte_offset as u32 + 1);
            self.close_containers_to(self.containers.depth() - unmatched, pos, false);
        }

        let rest = &text[cm.byte_offset..];
        let pos = Position::new(line_number, cm.byte_offset as u32 + 1);

        if unmatched == 0
            && cm.list_reentry
            && let Some(lm) = classify::list_marker(rest)
        {
            self.reenter_list_item(lm, rest, pos, line_number);
            return;
        }

        self.classify(rest, line_number, cm.byte_offset as u32);
    }

    /// A line found a sibling item marker of the list already open on top
    /// of the container stack (§4.C's `list_reentry`): close whatever leaf
    /// the previous item held, emit `NewListItem`, and classify the rest
    /// of the line as that new item's first content.
    fn reenter_list_item(&mut self, lm: classify::ListMarker, rest: &str, pos: Position, line_number: u32) {
        self.close_leaf(pos, false);
        self.tokens.push(Token::new(pos, TokenKind::NewListItem));

        let content_indent = list_content_indent(rest, &lm);
        if let Some(frame) = self.containers.top_mut()
            && let Container::List { indent, .. } = &mut frame.container
        {
            *indent = content_indent;
        }

        let content = &rest[(content_indent as usize).min(rest.len())..];
        if content.trim().is_empty() {
            self.tokens.push(Token::new(pos, TokenKind::Blank { whitespace: content.to_string() }));
        } else {
            self.classify_with_nothing_open(content, pos, line_number, content_indent);
        }
    }

    /// Classifies `rest` (the portion of the line left after container
    /// markers were consumed) and updates tokenizer state accordingly.
    /// `col0` is the zero-based byte offset at which `rest` begins in the
    /// original line, used for column bookkeeping.
    fn classify(&mut self, rest: &str, line_number: u32, col0: u32) {
        let pos = Position::new(line_number, col0 + 1);

        if matches!(self.open_leaf, OpenLeaf::Paragraph { .. }) {
            self.classify_with_paragraph_open(rest, pos, line_number, col0);
            return;
        }

        match std::mem::replace(&mut self.open_leaf, OpenLeaf::None) {
            OpenLeaf::IndentedCode { opener, pending_blanks } => {
                self.continue_indented_code(opener, pending_blanks, rest, pos, line_number, col0);
                return;
            }
            OpenLeaf::FencedCode {
                opener,
                fence_char,
                fence_len,
                indent,
            } => {
                self.continue_fenced_code(opener, fence_char, fence_len, indent, rest, pos);
                return;
            }
            OpenLeaf::HtmlBlock { opener, kind } => {
                self.continue_html_block(opener, kind, rest, pos);
                return;
            }
            other => self.open_leaf = other,
        }

        self.classify_with_nothing_open(rest, pos, line_number, col0);
    }

    fn classify_with_paragraph_open(&mut self, rest: &str, pos: Position, line_number: u32, col0: u32) {
        if rest.trim().is_empty() {
            self.close_leaf(pos, false);
            self.tokens.push(Token::new(pos, TokenKind::Blank { whitespace: rest.to_string() }));
            return;
        }
        if let Some(h) = classify::atx_heading(rest) {
            self.close_leaf(pos, false);
            self.emit_atx_heading(h, pos);
            return;
        }
        if let Some(underline) = classify::setext_underline(rest) {
            self.convert_paragraph_to_setext(underline, pos);
            return;
        }
        if let Some(ch) = classify::thematic_break(rest) {
            self.close_leaf(pos, false);
            self.tokens.push(Token::new(pos, TokenKind::ThematicBreak { ch }));
            return;
        }
        if rest.trim_start().starts_with('>') {
            self.close_leaf(pos, false);
            self.classify_with_nothing_open(rest, pos, line_number, col0);
            return;
        }
        if let Some(lm) = classify::list_marker(rest)
            && (!lm.ordered || lm.start_number == 1)
        {
            self.close_leaf(pos, false);
            self.open_new_list(lm, rest, pos, line_number);
            return;
        }

        if let OpenLeaf::Paragraph { lines, .. } = &mut self.open_leaf {
            lines.push((pos, rest.to_string()));
        }
    }

    fn classify_with_nothing_open(&mut self, rest: &str, pos: Position, line_number: u32, col0: u32) {
        if rest.trim().is_empty() {
            self.tokens.push(Token::new(pos, TokenKind::Blank { whitespace: rest.to_string() }));
            return;
        }
        let (visual_w, _) = visual_indent_width(rest);
        if classify::is_indented_code(visual_w) {
            self.open_indented_code(rest, pos);
            return;
        }
        if let Some(h) = classify::atx_heading(rest) {
            self.emit_atx_heading(h, pos);
            return;
        }
        if let Some(fo) = classify::fenced_code_open(rest) {
            let opener = self.tokens.push(Token::new(
                pos,
                TokenKind::FencedCodeStart {
                    fence_char: fo.fence_char,
                    fence_len: fo.fence_len,
                    info_string: fo.info_string,
                },
            ));
            self.open_leaf = OpenLeaf::FencedCode {
                opener,
                fence_char: fo.fence_char,
                fence_len: fo.fence_len,
                indent: fo.indent,
            };
            return;
        }
        if let Some(kind) = classify::html_block_kind(rest) {
            let opener = self.tokens.push(Token::new(pos, TokenKind::HtmlBlockStart { kind }));
            self.tokens.push(Token::new(
                pos,
                TokenKind::Text {
                    text: rest.to_string(),
                    leading_whitespace: String::new(),
                },
            ));
            if html_block_closes_same_line(kind, rest) {
                self.tokens.push(Token::new(
                    pos,
                    TokenKind::HtmlBlockEnd {
                        opener,
                        forced: false,
                    },
                ));
            } else {
                self.open_leaf = OpenLeaf::HtmlBlock { opener, kind };
            }
            return;
        }
        if let Some(ch) = classify::thematic_break(rest) {
            self.tokens.push(Token::new(pos, TokenKind::ThematicBreak { ch }));
            return;
        }
        if rest.trim_start().starts_with('>') {
            self.open_new_blockquotes(rest, pos, line_number);
            return;
        }
        if let Some(lm) = classify::list_marker(rest) {
            self.open_new_list(lm, rest, pos, line_number);
            return;
        }

        self.open_leaf = OpenLeaf::Paragraph {
            start_pos: pos,
            lines: vec![(pos, rest.to_string())],
        };
    }

    fn open_new_blockquotes(&mut self, rest: &str, pos: Position, line_number: u32) {
        let mut cursor = rest;
        loop {
            let trimmed_start = cursor.trim_start_matches(' ');
            if !trimmed_start.starts_with('>') {
                break;
            }
            let opener = self.tokens.push(Token::new(pos, TokenKind::BlockQuoteStart));
            self.containers.push(Container::BlockQuote, opener);
            let after_marker = &trimmed_start[1..];
            cursor = after_marker.strip_prefix(' ').unwrap_or(after_marker);
        }
        self.classify_with_nothing_open(cursor, pos, line_number, 0);
    }

    /// Opens a brand new list container (one level deeper than whatever is
    /// currently on top of the container stack). Reopening an *existing*
    /// list for its next item is handled separately by
    /// [`Tokenizer::reenter_list_item`], which container.rs's
    /// `list_reentry` flag routes to before general classification is ever
    /// reached — so by the time this runs, a same-marker list found here
    /// is always a new, nested list, never a sibling item.
    fn open_new_list(&mut self, lm: classify::ListMarker, rest: &str, pos: Position, line_number: u32) {
        let content_indent = list_content_indent(rest, &lm);

        let opener = if lm.ordered {
            self.tokens.push(Token::new(
                pos,
                TokenKind::OrderedListStart {
                    start_number: lm.start_number,
                    marker: lm.marker,
                    indent: content_indent,
                },
            ))
        } else {
            self.tokens.push(Token::new(
                pos,
                TokenKind::UnorderedListStart {
                    marker: lm.marker,
                    indent: content_indent,
                },
            ))
        };
        self.containers.push(
            Container::List {
                ordered: lm.ordered,
                marker: lm.marker,
                indent: content_indent,
                had_blank_line: false,
            },
            opener,
        );

        let content = &rest[(content_indent as usize).min(rest.len())..];
        if content.trim().is_empty() {
            self.tokens.push(Token::new(pos, TokenKind::Blank { whitespace: content.to_string() }));
        } else {
            self.classify_with_nothing_open(content, pos, line_number, content_indent);
        }
    }

    fn emit_atx_heading(&mut self, h: classify::AtxHeading<'_>, pos: Position) {
        let opener = self.tokens.push(Token::new(
            pos,
            TokenKind::AtxHeadingStart {
                level: h.level,
                hashes: h.hashes,
            },
        ));
        if !h.text.is_empty() {
            self.tokens.push(Token::new(
                pos,
                TokenKind::Text {
                    text: h.text.to_string(),
                    leading_whitespace: String::new(),
                },
            ));
        }
        self.tokens.push(Token::new(
            pos,
            TokenKind::AtxHeadingEnd {
                opener,
                forced: false,
            },
        ));
    }

    fn convert_paragraph_to_setext(&mut self, underline_char: char, pos: Position) {
        let (start_pos, lines) = match std::mem::replace(&mut self.open_leaf, OpenLeaf::None) {
            OpenLeaf::Paragraph { start_pos, lines } => (start_pos, lines),
            _ => unreachable!("caller only invokes this with a paragraph open"),
        };
        let opener = self.tokens.push(Token::new(start_pos, TokenKind::SetextHeadingStart { underline_char }));
        for (line_pos, text) in lines {
            self.tokens.push(Token::new(
                line_pos,
                TokenKind::Text {
                    text,
                    leading_whitespace: String::new(),
                },
            ));
        }
        self.tokens.push(Token::new(
            pos,
            TokenKind::SetextHeadingEnd {
                opener,
                forced: false,
            },
        ));
    }

    fn open_indented_code(&mut self, rest: &str, pos: Position) {
        let opener = self.tokens.push(Token::new(pos, TokenKind::IndentedCodeStart));
        let stripped = strip_indent_columns(rest, classify::INDENTED_CODE_WIDTH);
        self.tokens.push(Token::new(
            pos,
            TokenKind::Text {
                text: stripped.to_string(),
                leading_whitespace: String::new(),
            },
        ));
        self.open_leaf = OpenLeaf::IndentedCode {
            opener,
            pending_blanks: Vec::new(),
        };
    }

    fn continue_indented_code(
        &mut self,
        opener: TokenIndex,
        mut pending_blanks: Vec<(Position, String)>,
        rest: &str,
        pos: Position,
        line_number: u32,
        col0: u32,
    ) {
        if rest.trim().is_empty() {
            pending_blanks.push((pos, rest.to_string()));
            self.open_leaf = OpenLeaf::IndentedCode { opener, pending_blanks };
            return;
        }
        let (visual_w, _) = visual_indent_width(rest);
        if classify::is_indented_code(visual_w) {
            for (blank_pos, _) in pending_blanks {
                self.tokens.push(Token::new(
                    blank_pos,
                    TokenKind::Text {
                        text: String::new(),
                        leading_whitespace: String::new(),
                    },
                ));
            }
            let stripped = strip_indent_columns(rest, classify::INDENTED_CODE_WIDTH);
            self.tokens.push(Token::new(
                pos,
                TokenKind::Text {
                    text: stripped.to_string(),
                    leading_whitespace: String::new(),
                },
            ));
            self.open_leaf = OpenLeaf::IndentedCode {
                opener,
                pending_blanks: Vec::new(),
            };
            return;
        }
        self.tokens.push(Token::new(
            pos,
            TokenKind::IndentedCodeEnd {
                opener,
                forced: false,
            },
        ));
        self.open_leaf = OpenLeaf::None;
        self.classify_with_nothing_open(rest, pos, line_number, col0);
    }

    fn continue_fenced_code(
        &mut self,
        opener: TokenIndex,
        fence_char: char,
        fence_len: u32,
        indent: u32,
        rest: &str,
        pos: Position,
    ) {
        if classify::fenced_code_close(rest, fence_char, fence_len) {
            self.tokens.push(Token::new(
                pos,
                TokenKind::FencedCodeEnd {
                    opener,
                    forced: false,
                },
            ));
            self.open_leaf = OpenLeaf::None;
            return;
        }
        let stripped = strip_indent_columns(rest, indent as usize);
        self.tokens.push(Token::new(
            pos,
            TokenKind::Text {
                text: stripped.to_string(),
                leading_whitespace: String::new(),
            },
        ));
        self.open_leaf = OpenLeaf::FencedCode {
            opener,
            fence_char,
            fence_len,
            indent,
        };
    }

    fn continue_html_block(&mut self, opener: TokenIndex, kind: u8, rest: &str, pos: Position) {
        let closes = match kind {
            6 | 7 => rest.trim().is_empty(),
            _ => html_block_closes_same_line(kind, rest),
        };
        if kind == 6 || kind == 7 {
            if closes {
                self.tokens.push(Token::new(
                    pos,
                    TokenKind::HtmlBlockEnd {
                        opener,
                        forced: false,
                    },
                ));
                self.open_leaf = OpenLeaf::None;
                self.tokens.push(Token::new(pos, TokenKind::Blank { whitespace: rest.to_string() }));
                return;
            }
        } else {
            self.tokens.push(Token::new(
                pos,
                TokenKind::Text {
                    text: rest.to_string(),
                    leading_whitespace: String::new(),
                },
            ));
            if closes {
                self.tokens.push(Token::new(
                    pos,
                    TokenKind::HtmlBlockEnd {
                        opener,
                        forced: false,
                    },
                ));
                self.open_leaf = OpenLeaf::None;
                return;
            }
            self.open_leaf = OpenLeaf::HtmlBlock { opener, kind };
            return;
        }
        self.tokens.push(Token::new(
            pos,
            TokenKind::Text {
                text: rest.to_string(),
                leading_whitespace: String::new(),
            },
        ));
        self.open_leaf = OpenLeaf::HtmlBlock { opener, kind };
    }

    /// Closes whatever leaf is currently open (if any). For a paragraph,
    /// this is where the leading-LRD scan (§4.B) happens.
    fn close_leaf(&mut self, pos: Position, forced: bool) {
        match std::mem::replace(&mut self.open_leaf, OpenLeaf::None) {
            OpenLeaf::None => {}
            OpenLeaf::Paragraph { start_pos, lines } => self.close_paragraph(start_pos, lines, forced),
            OpenLeaf::IndentedCode { opener, .. } => {
                self.tokens.push(Token::new(pos, TokenKind::IndentedCodeEnd { opener, forced }));
            }
            OpenLeaf::FencedCode { opener, .. } => {
                self.tokens.push(Token::new(pos, TokenKind::FencedCodeEnd { opener, forced }));
            }
            OpenLeaf::HtmlBlock { opener, .. } => {
                self.tokens.push(Token::new(pos, TokenKind::HtmlBlockEnd { opener, forced }));
            }
        }
    }

    fn close_paragraph(&mut self, start_pos: Position, mut lines: Vec<(Position, String)>, forced: bool) {
        let mut consumed_from_front = 0usize;
        loop {
            let remaining: Vec<&str> = lines[consumed_from_front..].iter().map(|(_, s)| s.as_str()).collect();
            if remaining.is_empty() {
                break;
            }
            match lrd_parse::try_parse_lrd(&remaining) {
                Some(parsed) => {
                    let def_pos = lines[consumed_from_front].0;
                    self.registry.register(&parsed.label, parsed.destination.clone(), parsed.title.clone());
                    self.tokens.push(Token::new(
                        def_pos,
                        TokenKind::LinkRefDef {
                            label: parsed.label,
                            destination: parsed.destination,
                            title: parsed.title,
                        },
                    ));
                    consumed_from_front += parsed.lines_consumed;
                }
                None => break,
            }
        }
        lines.drain(..consumed_from_front);

        if lines.is_empty() {
            return;
        }

        let opener = self.tokens.push(Token::new(start_pos, TokenKind::ParagraphStart));
        for (pos, text) in lines {
            self.tokens.push(Token::new(
                pos,
                TokenKind::Text {
                    text,
                    leading_whitespace: String::new(),
                },
            ));
        }
        self.tokens.push(Token::new(start_pos, TokenKind::ParagraphEnd { opener, forced }));
    }

    fn close_containers_to(&mut self, new_len: usize, pos: Position, forced: bool) {
        self.close_leaf(pos, forced);
        let popped = self.containers.close_to(new_len);
        for frame in popped {
            let kind = match frame.container {
                Container::BlockQuote => TokenKind::BlockQuoteEnd {
                    opener: frame.opener,
                    forced,
                },
                Container::List { .. } => TokenKind::ListEnd {
                    opener: frame.opener,
                    forced,
                },
            };
            self.tokens.push(Token::new(pos, kind));
        }
    }

    fn finish(&mut self) {
        let eof_pos = Position::new(u32::MAX, 1);
        self.close_containers_to(0, eof_pos, true);
    }
}

/// Visual-column width from the start of `rest` that subsequent lines must
/// reach to continue this list item: the 0-3 space indent, plus the
/// marker's own width, plus up to 4 spaces of space after it (an empty
/// item, or more than 4 spaces, counts as a single space per CommonMark).
fn list_content_indent(rest: &str, lm: &classify::ListMarker) -> u32 {
    let (indent_w, indent_b) = visual_indent_width(rest);
    let after_marker = &rest[indent_b + lm.marker_end..];
    let space_run = after_marker.chars().take_while(|&c| c == ' ').count();
    if after_marker.trim().is_empty() || space_run == 0 || space_run > 4 {
        indent_w as u32 + lm.marker_end as u32 + 1
    } else {
        indent_w as u32 + lm.marker_end as u32 + space_run as u32
    }
}

fn strip_indent_columns(line: &str, columns: usize) -> &str {
    let (byte_len, _) = crate::scanner::consume_indent(line, columns);
    &line[byte_len..]
}

fn html_block_closes_same_line(kind: u8, rest: &str) -> bool {
    match kind {
        1 => {
            let lower = rest.to_ascii_lowercase();
            lower.contains("</script>") || lower.contains("</pre>") || lower.contains("</style>")
        }
        2 => rest.contains("-->"),
        3 => rest.contains("?>"),
        4 => rest.contains('>'),
        5 => rest.contains("]]>"),
        _ => false,
    }
}

/// Whether `rest` (with containers already consumed) would interrupt an
/// open paragraph, per the tie-break rule in §4.B: only headings, blanks,
/// thematic breaks, block-quote starts, and qualifying list starts can.
fn interrupts_paragraph(rest: &str) -> bool {
    if rest.trim().is_empty() {
        return true;
    }
    if classify::atx_heading(rest).is_some() {
        return true;
    }
    if classify::thematic_break(rest).is_some() {
        return true;
    }
    if rest.trim_start().starts_with('>') {
        return true;
    }
    if let Some(lm) = classify::list_marker(rest)
        && (!lm.ordered || lm.start_number == 1)
    {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind::*;

    fn kinds(source: &str) -> Vec<String> {
        tokenize(source)
            .tokens
            .iter()
            .map(|t| format!("{:?}", std::mem::discriminant(&t.kind)))
            .collect()
    }

    #[test]
    fn simple_heading_and_paragraph() {
        let result = tokenize("# Title\n\nHello world\n");
        let texts: Vec<_> = result
            .tokens
            .iter()
            .filter_map(|t| match &t.kind {
                Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Title", "Hello world"]);
    }

    #[test]
    fn atx_heading_levels() {
        let result = tokenize("## Two\n");
        let lvl = result.tokens.iter().find_map(|t| match &t.kind {
            AtxHeadingStart { level, .. } => Some(*level),
            _ => None,
        });
        assert_eq!(lvl, Some(2));
    }

    #[test]
    fn fenced_code_three_backticks_does_not_close_four_backtick_fence() {
        let result = tokenize("````\ncode\n```\nstill code\n````\n");
        let texts: Vec<_> = result
            .tokens
            .iter()
            .filter_map(|t| match &t.kind {
                Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["code", "```", "still code"]);
    }

    #[test]
    fn nested_block_quotes_close_in_reverse() {
        let result = tokenize(">> a\n> b\n");
        let kinds = kinds(">> a\n> b\n");
        assert_eq!(kinds[0], format!("{:?}", std::mem::discriminant(&BlockQuoteStart)));
        assert_eq!(kinds[1], format!("{:?}", std::mem::discriminant(&BlockQuoteStart)));
        assert!(crate::token::check_balanced(result.tokens.as_slice()).is_ok());
    }

    #[test]
    fn link_reference_definition_is_registered_and_removed_from_paragraph() {
        let result = tokenize("[foo]: /url \"title\"\n");
        assert_eq!(result.registry.lookup("foo").unwrap().destination, "/url");
        let has_paragraph = result.tokens.iter().any(|t| matches!(t.kind, ParagraphStart));
        assert!(!has_paragraph);
    }

    #[test]
    fn lone_label_colon_at_eof_becomes_paragraph_text() {
        let result = tokenize("[label]:\n");
        let has_paragraph = result.tokens.iter().any(|t| matches!(t.kind, ParagraphStart));
        assert!(has_paragraph);
    }

    #[test]
    fn setext_heading_from_equals_underline() {
        let result = tokenize("Title\n=====\n");
        assert!(result.tokens.iter().any(|t| matches!(t.kind, SetextHeadingStart { underline_char: '=' })));
    }

    #[test]
    fn every_opener_has_matching_ender() {
        let docs = [
            "# Title\n\nPara **bold**.\n",
            ">> a\n> b\n",
            "- a\n- b\n  - nested\n",
            "```\ncode\n```\n",
        ];
        for d in docs {
            let result = tokenize(d);
            assert!(crate::token::check_balanced(result.tokens.as_slice()).is_ok(), "doc: {d:?}");
        }
    }

    #[test]
    fn unordered_list_items_share_one_open_close_pair() {
        let result = tokenize("- a\n- b\n- c\n");
        let opens = result.tokens.iter().filter(|t| matches!(t.kind, UnorderedListStart { .. })).count();
        let new_items = result.tokens.iter().filter(|t| matches!(t.kind, NewListItem)).count();
        assert_eq!(opens, 1);
        assert_eq!(new_items, 2);
    }

    #[test]
    fn three_vs_four_space_indent_list_boundary() {
        let three = tokenize("- a\n   continued\n");
        let has_para_text_continued = three.tokens.iter().any(|t| matches!(&t.kind, Text{text, ..} if text.contains("continued")));
        assert!(has_para_text_continued);
    }

    #[test]
    fn thematic_break_detected() {
        let result = tokenize("---\n");
        assert!(result.tokens.iter().any(|t| matches!(t.kind, ThematicBreak { .. })));
    }
}
