//! §4.F Emphasis & link resolver: the second pass of the inline pipeline.
//! Walks the [`Seed`](super::scanner::Seed) list emitted by
//! [`super::scanner`], converting each into its final [`Token`] while
//! running a delimiter stack (CommonMark §6.2 flanking + the mod-3 rule)
//! and a bracket stack (link/image resolution in inline/collapsed/full/
//! shortcut precedence order) over it.
//!
//! Grounded on the teacher's `rules/emphasis_style.rs` and
//! `rules/md049_emphasis_style.rs` (the teacher's asterisk/underscore
//! emphasis handling) and `lint_context.rs` (link-reference lookups),
//! rebuilt around the two explicit stacks CommonMark's reference algorithm
//! uses rather than the teacher's single-regex emphasis pass, since
//! matching nested/overlapping emphasis correctly needs the backward
//! opener search.
//!
//! A delimiter run longer than the match it takes part in keeps its
//! unconsumed remainder live on the delimiter stack: [`process_emphasis`]
//! only marks an entry done once its remaining length reaches zero, so a
//! run can be matched more than once, and whatever is left over at the end
//! still folds back to literal `Text` character-for-character (invariant
//! 3) rather than being dropped.

use super::scanner::{self, PositionedSeed, Seed};
use crate::lrd::LinkRefRegistry;
use crate::position::Position;
use crate::token::{LabelType, Token, TokenKind};

struct DelimEntry {
    token_idx: usize,
    ch: char,
    /// The run's full length as the scanner emitted it; fixed for the
    /// lifetime of the entry and used for the mod-3 rule, which always
    /// compares original run lengths, not however much is left.
    orig_len: u32,
    /// How much of the run is still unconsumed. Decremented by `used` on
    /// each match; the entry is only `done` once this reaches zero.
    remaining: u32,
    can_open: bool,
    can_close: bool,
    done: bool,
}

struct BracketEntry {
    token_idx: usize,
    is_image: bool,
    /// Buffer index of the first raw character inside the brackets (just
    /// after `[`/`![`).
    content_start: usize,
    active: bool,
}

pub fn resolve(lines: &[(Position, String)], registry: &LinkRefRegistry) -> Vec<Token> {
    let buf = scanner::flatten(lines);
    let seeds = scanner::scan(lines);

    let mut tokens: Vec<Token> = Vec::with_capacity(seeds.len());
    let mut delims: Vec<DelimEntry> = Vec::new();
    let mut brackets: Vec<BracketEntry> = Vec::new();

    let mut si = 0usize;
    let mut skip_until: usize = 0; // buf index; seeds entirely before this are dropped

    while si < seeds.len() {
        let PositionedSeed { pos, buf_start, seed } = seeds[si].clone();
        si += 1;
        if buf_start < skip_until {
            continue;
        }

        match seed {
            Seed::Text(text) => tokens.push(Token::new(
                pos,
                TokenKind::Text {
                    text,
                    leading_whitespace: String::new(),
                },
            )),
            Seed::CodeSpan { code, backtick_count } => {
                tokens.push(Token::new(pos, TokenKind::InlineCode { code, backtick_count }))
            }
            Seed::Autolink { uri, kind } => tokens.push(Token::new(pos, TokenKind::AngleAutolink { uri, kind })),
            Seed::RawHtml { html } => tokens.push(Token::new(pos, TokenKind::RawHtml { html })),
            Seed::HardBreak => tokens.push(Token::new(pos, TokenKind::HardBreak)),
            Seed::SoftBreak => tokens.push(Token::new(pos, TokenKind::SoftBreak)),
            Seed::CharEntity { decoded } => tokens.push(Token::new(pos, TokenKind::CharEntity { decoded })),
            Seed::Delim {
                ch,
                run_len,
                preceding_two,
                following_two,
            } => {
                let token_idx = tokens.len();
                tokens.push(Token::new(
                    pos,
                    TokenKind::SpecialText {
                        delimiter: ch,
                        run_len,
                        preceding_two,
                        following_two,
                        active: false,
                    },
                ));
                let (can_open, can_close) = flanking(ch, preceding_two, following_two);
                delims.push(DelimEntry {
                    token_idx,
                    ch,
                    orig_len: run_len,
                    remaining: run_len,
                    can_open,
                    can_close,
                    done: false,
                });
            }
            Seed::BracketOpen { is_image } => {
                let token_idx = tokens.len();
                let literal = if is_image { "![" } else { "[" };
                tokens.push(Token::new(
                    pos,
                    TokenKind::Text {
                        text: literal.to_string(),
                        leading_whitespace: String::new(),
                    },
                ));
                brackets.push(BracketEntry {
                    token_idx,
                    is_image,
                    content_start: buf_start + if is_image { 2 } else { 1 },
                    active: true,
                });
            }
            Seed::BracketClose => {
                let token_idx = tokens.len();
                tokens.push(Token::new(
                    pos,
                    TokenKind::Text {
                        text: "]".to_string(),
                        leading_whitespace: String::new(),
                    },
                ));
                if let Some(consumed_tail) =
                    try_close_bracket(&mut tokens, &mut delims, &mut brackets, token_idx, buf_start, &buf, registry)
                {
                    skip_until = buf_start + 1 + consumed_tail;
                }
            }
        }
    }

    process_emphasis(&mut tokens, &mut delims, &mut brackets, 0);
    tokens
}

fn flanking(ch: char, preceding_two: [Option<char>; 2], following_two: [Option<char>; 2]) -> (bool, bool) {
    let preceding = preceding_two[0];
    let following = following_two[0];
    let lf = left_flanking(preceding, following);
    let rf = right_flanking(preceding, following);
    if ch == '*' {
        (lf, rf)
    } else {
        let can_open = lf && (!rf || is_punctuation(preceding));
        let can_close = rf && (!lf || is_punctuation(following));
        (can_open, can_close)
    }
}

fn is_unicode_whitespace(c: Option<char>) -> bool {
    match c {
        None => true,
        Some(c) => c.is_whitespace(),
    }
}

fn is_punctuation(c: Option<char>) -> bool {
    match c {
        None => false,
        Some(c) => c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace() && !c.is_control()),
    }
}

fn left_flanking(preceding: Option<char>, following: Option<char>) -> bool {
    if is_unicode_whitespace(following) {
        return false;
    }
    if !is_punctuation(following) {
        return true;
    }
    is_unicode_whitespace(preceding) || is_punctuation(preceding)
}

fn right_flanking(preceding: Option<char>, following: Option<char>) -> bool {
    if is_unicode_whitespace(preceding) {
        return false;
    }
    if !is_punctuation(preceding) {
        return true;
    }
    is_unicode_whitespace(following) || is_punctuation(following)
}

/// CommonMark's reference `process_emphasis` algorithm, confined to
/// `delims[stack_bottom..]`. Scans forward for closers; for each, searches
/// backward for a matching opener subject to the mod-3 rule. A single run
/// can satisfy more than one match (e.g. a length-7 run matching as strong
/// emphasis twice and leaving 3 unconsumed): an entry only leaves the
/// search once its `remaining` length reaches zero, so a closer that's
/// still partially unconsumed is retried against the next available
/// opener instead of being abandoned. Returns the net number of tokens
/// inserted, so callers holding a token index past `stack_bottom` can
/// shift it by the same amount.
fn process_emphasis(tokens: &mut Vec<Token>, delims: &mut Vec<DelimEntry>, brackets: &mut Vec<BracketEntry>, stack_bottom: usize) -> usize {
    let mut inserted = 0usize;
    let mut closer = stack_bottom;
    while closer < delims.len() {
        if delims[closer].done || !delims[closer].can_close {
            closer += 1;
            continue;
        }
        let mut found = None;
        let mut oi = closer;
        while oi > stack_bottom {
            oi -= 1;
            if delims[oi].done || delims[oi].ch != delims[closer].ch || !delims[oi].can_open {
                continue;
            }
            let both_flank = (delims[oi].can_open && delims[oi].can_close) || (delims[closer].can_open && delims[closer].can_close);
            let sum = delims[oi].orig_len + delims[closer].orig_len;
            if both_flank && sum % 3 == 0 && !(delims[oi].orig_len % 3 == 0 && delims[closer].orig_len % 3 == 0) {
                continue;
            }
            found = Some(oi);
            break;
        }
        match found {
            Some(oi) => {
                let used = if delims[oi].remaining >= 2 && delims[closer].remaining >= 2 { 2 } else { 1 };
                inserted += consume_delim(tokens, delims, brackets, oi, used, false);
                inserted += consume_delim(tokens, delims, brackets, closer, used, true);
                if delims[closer].done {
                    closer += 1;
                }
            }
            None => {
                closer += 1;
            }
        }
    }
    inserted
}

/// Inserts `tok` at token index `at`, shifting every `token_idx` on the
/// stacks that now points past it so they stay aligned with the token they
/// were tracking.
fn insert_token(tokens: &mut Vec<Token>, delims: &mut [DelimEntry], brackets: &mut [BracketEntry], at: usize, tok: Token) {
    tokens.insert(at, tok);
    for d in delims.iter_mut() {
        if d.token_idx >= at {
            d.token_idx += 1;
        }
    }
    for b in brackets.iter_mut() {
        if b.token_idx >= at {
            b.token_idx += 1;
        }
    }
}

fn finalize_full(tokens: &mut [Token], token_idx: usize, used: u32) {
    if let TokenKind::SpecialText { run_len, active, .. } = &mut tokens[token_idx].kind {
        *run_len = used;
        *active = true;
    }
}

/// Consumes `used` delimiters from entry `idx`'s run. If that exhausts the
/// run, the entry's existing token is finalized in place as the active
/// match. Otherwise the existing token is shrunk to the unconsumed
/// remainder and a new active token carrying `used` is spliced in next to
/// it: before the remainder for a closer (whose matched characters sit
/// nearest the content, on the remainder's left), after it for an opener
/// (whose matched characters sit nearest the content, on the remainder's
/// right). Returns 1 if a token was inserted, else 0.
fn consume_delim(
    tokens: &mut Vec<Token>,
    delims: &mut [DelimEntry],
    brackets: &mut [BracketEntry],
    idx: usize,
    used: u32,
    matched_before_remainder: bool,
) -> usize {
    let remaining = delims[idx].remaining - used;
    let ti = delims[idx].token_idx;
    delims[idx].remaining = remaining;
    if remaining == 0 {
        finalize_full(tokens, ti, used);
        delims[idx].done = true;
        return 0;
    }

    if let TokenKind::SpecialText { run_len, .. } = &mut tokens[ti].kind {
        *run_len = remaining;
    }
    let pos = tokens[ti].pos;
    let ch = delims[idx].ch;
    let matched = Token::new(
        pos,
        TokenKind::SpecialText {
            delimiter: ch,
            run_len: used,
            preceding_two: [None, None],
            following_two: [None, None],
            active: true,
        },
    );
    let at = if matched_before_remainder { ti } else { ti + 1 };
    insert_token(tokens, delims, brackets, at, matched);
    1
}

fn try_close_bracket(
    tokens: &mut Vec<Token>,
    delims: &mut Vec<DelimEntry>,
    brackets: &mut Vec<BracketEntry>,
    mut close_token_idx: usize,
    close_buf_idx: usize,
    buf: &[(Position, char)],
    registry: &LinkRefRegistry,
) -> Option<usize> {
    let idx = brackets.iter().rposition(|b| b.active)?;
    let removed = brackets.split_off(idx);
    let opener = removed.into_iter().next().unwrap();

    let content_text: String = buf[opener.content_start..close_buf_idx].iter().map(|&(_, c)| c).collect();
    let after = close_buf_idx + 1;

    let mut resolved: Option<(String, Option<String>, usize, LabelType)> = None;

    if buf.get(after).map(|&(_, c)| c) == Some('(')
        && let Some((consumed, dest, title)) = parse_inline_tail(buf, after)
    {
        resolved = Some((dest, title, consumed, LabelType::Inline));
    }
    if resolved.is_none()
        && buf.get(after).map(|&(_, c)| c) == Some('[')
        && buf.get(after + 1).map(|&(_, c)| c) == Some(']')
        && let Some(def) = registry.lookup(&content_text)
    {
        resolved = Some((def.destination.clone(), def.title.clone(), 2, LabelType::Collapsed));
    }
    if resolved.is_none()
        && buf.get(after).map(|&(_, c)| c) == Some('[')
        && let Some((consumed, label)) = parse_bracket_label(buf, after)
        && !label.is_empty()
        && let Some(def) = registry.lookup(&label)
    {
        resolved = Some((def.destination.clone(), def.title.clone(), consumed, LabelType::Full));
    }
    if resolved.is_none()
        && let Some(def) = registry.lookup(&content_text)
    {
        resolved = Some((def.destination.clone(), def.title.clone(), 0, LabelType::Shortcut));
    }

    let (destination, title, tail_len, label_type) = resolved?;

    if opener.is_image {
        tokens[opener.token_idx] = Token::new(
            tokens[opener.token_idx].pos,
            TokenKind::InlineImage {
                label_type,
                destination,
                title,
                alt_text: flatten_alt_text(&tokens[opener.token_idx + 1..close_token_idx]),
            },
        );
        // Drop the inner content tokens (flattened into alt_text) and the
        // literal `]` placeholder; truncate back to just after the opener.
        tokens.truncate(opener.token_idx + 1);
        delims.retain(|d| d.token_idx <= opener.token_idx);
    } else {
        tokens[opener.token_idx] = Token::new(
            tokens[opener.token_idx].pos,
            TokenKind::InlineLink {
                label_type,
                destination,
                title,
            },
        );
        let content_stack_bottom = delims.partition_point(|d| d.token_idx <= opener.token_idx);
        close_token_idx += process_emphasis(tokens, delims, brackets, content_stack_bottom);
        for d in &mut delims[content_stack_bottom..] {
            d.done = true;
        }
        tokens[close_token_idx] = Token::new(
            tokens[close_token_idx].pos,
            TokenKind::EndLink { opener: opener.token_idx as u32 },
        );
        for b in brackets.iter_mut() {
            if !b.is_image {
                b.active = false;
            }
        }
    }

    Some(tail_len)
}

fn flatten_alt_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        match &tok.kind {
            TokenKind::Text { text, .. } => out.push_str(text),
            TokenKind::CharEntity { decoded } => out.push_str(decoded),
            TokenKind::InlineCode { code, .. } => out.push_str(code),
            TokenKind::SpecialText { delimiter, run_len, .. } => {
                out.extend(std::iter::repeat_n(*delimiter, *run_len as usize))
            }
            TokenKind::SoftBreak => out.push(' '),
            TokenKind::HardBreak => out.push(' '),
            TokenKind::InlineImage { alt_text, .. } => out.push_str(alt_text),
            _ => {}
        }
    }
    out
}

fn skip_ws(buf: &[(Position, char)], c: &mut usize) -> usize {
    let start = *c;
    while buf.get(*c).map(|&(_, ch)| ch).is_some_and(char::is_whitespace) {
        *c += 1;
    }
    *c - start
}

fn parse_inline_tail(buf: &[(Position, char)], open: usize) -> Option<(usize, String, Option<String>)> {
    let mut c = open + 1;
    skip_ws(buf, &mut c);
    let (dest, after_dest) = parse_destination(buf, c)?;
    c = after_dest;
    let before_title = c;
    let had_ws = skip_ws(buf, &mut c) > 0;
    let title = if had_ws {
        match parse_title(buf, c) {
            Some((t, after_title)) => {
                let mut c2 = after_title;
                skip_ws(buf, &mut c2);
                if buf.get(c2).map(|&(_, ch)| ch) == Some(')') {
                    c = c2;
                    Some(t)
                } else {
                    c = before_title;
                    None
                }
            }
            None => {
                c = before_title;
                None
            }
        }
    } else {
        None
    };
    if title.is_none() {
        c = before_title;
        skip_ws(buf, &mut c);
    }
    if buf.get(c).map(|&(_, ch)| ch) != Some(')') {
        return None;
    }
    c += 1;
    Some((c - open, dest, title))
}

fn parse_destination(buf: &[(Position, char)], start: usize) -> Option<(String, usize)> {
    if buf.get(start).map(|&(_, c)| c) == Some('<') {
        let mut i = start + 1;
        let mut s = String::new();
        loop {
            match buf.get(i).map(|&(_, c)| c) {
                Some('>') => return Some((s, i + 1)),
                Some('\n') | Some('<') | None => return None,
                Some('\\') => {
                    let nc = buf.get(i + 1)?.1;
                    s.push(nc);
                    i += 2;
                }
                Some(c) => {
                    s.push(c);
                    i += 1;
                }
            }
        }
    }

    let mut i = start;
    let mut depth = 0i32;
    let mut s = String::new();
    loop {
        match buf.get(i).map(|&(_, c)| c) {
            None => break,
            Some(c) if c.is_whitespace() => break,
            Some('(') => {
                depth += 1;
                s.push('(');
                i += 1;
            }
            Some(')') => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                s.push(')');
                i += 1;
            }
            Some('\\') => {
                if let Some(&(_, nc)) = buf.get(i + 1) {
                    s.push(nc);
                    i += 2;
                } else {
                    s.push('\\');
                    i += 1;
                }
            }
            Some(c) => {
                s.push(c);
                i += 1;
            }
        }
    }
    if depth != 0 || i == start {
        return None;
    }
    Some((s, i))
}

fn parse_title(buf: &[(Position, char)], start: usize) -> Option<(String, usize)> {
    let opening = buf.get(start).map(|&(_, c)| c)?;
    let quote = match opening {
        '"' | '\'' => opening,
        '(' => ')',
        _ => return None,
    };
    let mut i = start + 1;
    let mut s = String::new();
    loop {
        match buf.get(i).map(|&(_, c)| c) {
            None => return None,
            Some(c) if c == quote => return Some((s, i + 1)),
            Some('\\') => {
                let nc = buf.get(i + 1)?.1;
                s.push(nc);
                i += 2;
            }
            Some('(') if opening == '(' => return None,
            Some(c) => {
                s.push(c);
                i += 1;
            }
        }
    }
}

fn parse_bracket_label(buf: &[(Position, char)], open: usize) -> Option<(usize, String)> {
    let mut i = open + 1;
    let mut label = String::new();
    loop {
        match buf.get(i).map(|&(_, c)| c) {
            None => return None,
            Some(']') => return Some((i - open + 1, label)),
            Some('\\') => {
                let nc = buf.get(i + 1)?.1;
                label.push(nc);
                i += 2;
            }
            Some('[') => return None,
            Some(c) => {
                label.push(c);
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> Vec<(Position, String)> {
        vec![(Position::start(), text.to_string())]
    }

    #[test]
    fn simple_emphasis_is_active() {
        let tokens = resolve(&line("*hi*"), &LinkRefRegistry::new());
        let active: Vec<_> = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::SpecialText { active: true, .. }))
            .collect();
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn strong_emphasis_consumes_two_chars() {
        let tokens = resolve(&line("**hi**"), &LinkRefRegistry::new());
        for t in &tokens {
            if let TokenKind::SpecialText { run_len, active, .. } = t.kind {
                assert!(active);
                assert_eq!(run_len, 2);
            }
        }
    }

    #[test]
    fn long_delimiter_run_consumes_every_character_across_several_matches() {
        // §8's length-7 boundary case: neither side's run may lose any of
        // its 7 delimiter characters, whether matched or folded to Text.
        let tokens = resolve(&line("*******a*******"), &LinkRefRegistry::new());
        let mut left_total = 0u32;
        let mut right_total = 0u32;
        let mut seen_a = false;
        for t in &tokens {
            match &t.kind {
                TokenKind::SpecialText { run_len, .. } if !seen_a => left_total += run_len,
                TokenKind::SpecialText { run_len, .. } => right_total += run_len,
                TokenKind::Text { text, .. } if text == "a" => seen_a = true,
                _ => {}
            }
        }
        assert_eq!(left_total, 7);
        assert_eq!(right_total, 7);
        assert!(tokens
            .iter()
            .all(|t| !matches!(t.kind, TokenKind::SpecialText { active: false, .. })));
    }

    #[test]
    fn unmatched_delimiter_stays_inactive() {
        let tokens = resolve(&line("a * b"), &LinkRefRegistry::new());
        assert!(tokens
            .iter()
            .any(|t| matches!(t.kind, TokenKind::SpecialText { active: false, .. })));
    }

    #[test]
    fn inline_link_resolves_destination_and_title() {
        let tokens = resolve(&line(r#"[text](/url "title")"#), &LinkRefRegistry::new());
        assert!(tokens.iter().any(|t| matches!(
            &t.kind,
            TokenKind::InlineLink { destination, title, label_type: LabelType::Inline } if destination == "/url" && title.as_deref() == Some("title")
        )));
        assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::EndLink { .. })));
    }

    #[test]
    fn shortcut_reference_link_resolves_via_registry() {
        let mut reg = LinkRefRegistry::new();
        reg.register("foo", "/foo-url", None);
        let tokens = resolve(&line("[foo]"), &reg);
        assert!(tokens.iter().any(|t| matches!(
            &t.kind,
            TokenKind::InlineLink { destination, label_type: LabelType::Shortcut, .. } if destination == "/foo-url"
        )));
    }

    #[test]
    fn unresolvable_bracket_stays_literal_text() {
        let tokens = resolve(&line("[nope]"), &LinkRefRegistry::new());
        assert!(!tokens.iter().any(|t| matches!(t.kind, TokenKind::InlineLink { .. })));
        assert!(tokens.iter().any(|t| matches!(&t.kind, TokenKind::Text { text, .. } if text == "[")));
    }

    #[test]
    fn image_flattens_alt_text() {
        let tokens = resolve(&line("![alt text](/img.png)"), &LinkRefRegistry::new());
        assert!(tokens.iter().any(|t| matches!(
            &t.kind,
            TokenKind::InlineImage { alt_text, destination, .. } if alt_text == "alt text" && destination == "/img.png"
        )));
    }

    #[test]
    fn link_text_containing_emphasis_still_resolves_emphasis() {
        let tokens = resolve(&line("[*em*](/u)"), &LinkRefRegistry::new());
        assert!(tokens
            .iter()
            .any(|t| matches!(t.kind, TokenKind::SpecialText { active: true, .. })));
        assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::InlineLink { .. })));
    }
}
