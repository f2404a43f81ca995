//! §4.E Inline scanner: the first pass of the two-pass inline pipeline.
//! Walks one leaf's buffered content lines trigger-char by trigger-char
//! (backslash, backtick, ampersand, angle bracket, `*`/`_`, brackets, and
//! line breaks) and produces a flat list of [`Seed`]s — plain text runs,
//! resolved atomic constructs (code spans, autolinks, raw HTML, entities,
//! breaks), and *candidate* delimiter/bracket markers that [`super::resolver`]
//! later matches up into emphasis and links.
//!
//! Grounded on the teacher's `utils::emphasis_utils`/`utils::html_entities`
//! line-based scanning helpers, restructured as a genuine two-pass model
//! (§9 "single eager regex pass over the whole buffer") since the emphasis
//! and link resolution in §4.F needs the candidate markers kept separate
//! from already-resolved atomic tokens until the delimiter stack runs.

use super::entities;
use crate::position::Position;
use crate::token::AutolinkKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Seed {
    Text(String),
    /// A maximal run of `*` or `_`; not yet known to be active.
    Delim {
        ch: char,
        run_len: u32,
        preceding_two: [Option<char>; 2],
        following_two: [Option<char>; 2],
    },
    CodeSpan {
        code: String,
        backtick_count: u32,
    },
    Autolink {
        uri: String,
        kind: AutolinkKind,
    },
    RawHtml {
        html: String,
    },
    HardBreak,
    SoftBreak,
    CharEntity {
        decoded: String,
    },
    /// `[` (or `![` for an image); matched against a later `BracketClose`
    /// by the resolver.
    BracketOpen {
        is_image: bool,
    },
    BracketClose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedSeed {
    pub pos: Position,
    /// Index into the flattened `(Position, char)` buffer (see [`flatten`])
    /// where this seed's raw characters begin. The resolver uses this to
    /// re-parse link/image tails directly from raw characters rather than
    /// from already-interpreted seeds.
    pub buf_start: usize,
    pub seed: Seed,
}

/// Flattens a leaf's buffered `(Position, line text)` pairs into one
/// character stream, synthesizing a `\n` between lines (but not after the
/// last one) so line breaks participate in scanning as an ordinary trigger
/// character. Column numbers use the same "one column per `char`"
/// approximation the block tokenizer uses for ASCII-dominant markup.
pub(super) fn flatten(lines: &[(Position, String)]) -> Vec<(Position, char)> {
    let mut out = Vec::new();
    for (i, (pos, text)) in lines.iter().enumerate() {
        for (col, ch) in text.chars().enumerate() {
            out.push((pos.advance_columns(col as u32), ch));
        }
        if i + 1 < lines.len() {
            let break_pos = pos.advance_columns(text.chars().count() as u32);
            out.push((break_pos, '\n'));
        }
    }
    out
}

pub fn scan(lines: &[(Position, String)]) -> Vec<PositionedSeed> {
    let buf = flatten(lines);
    let mut seeds = Vec::new();
    let mut i = 0usize;
    let n = buf.len();
    let mut text_buf = String::new();
    let mut text_pos: Option<Position> = None;
    let mut text_start: Option<usize> = None;

    while i < n {
        let (pos, ch) = buf[i];
        match ch {
            '\\' if i + 1 < n && buf[i + 1].1.is_ascii_punctuation() => {
                flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                text_pos.get_or_insert(pos);
                text_start.get_or_insert(i);
                text_buf.push(buf[i + 1].1);
                i += 2;
            }
            '\\' if i + 1 < n && buf[i + 1].1 == '\n' => {
                flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                seeds.push(PositionedSeed { pos, buf_start: i, seed: Seed::HardBreak });
                i += 2;
            }
            '`' => {
                flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                i = scan_code_span(&buf, i, pos, &mut seeds);
            }
            '&' => {
                if let Some((consumed, decoded)) = try_entity(&buf, i) {
                    flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                    seeds.push(PositionedSeed {
                        pos,
                        buf_start: i,
                        seed: Seed::CharEntity { decoded },
                    });
                    i += consumed;
                } else {
                    text_pos.get_or_insert(pos);
                    text_start.get_or_insert(i);
                    text_buf.push('&');
                    i += 1;
                }
            }
            '<' => {
                if let Some((consumed, seed)) = try_autolink_or_html(&buf, i) {
                    flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                    seeds.push(PositionedSeed { pos, buf_start: i, seed });
                    i += consumed;
                } else {
                    text_pos.get_or_insert(pos);
                    text_start.get_or_insert(i);
                    text_buf.push('<');
                    i += 1;
                }
            }
            '*' | '_' => {
                flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                let (consumed, seed) = scan_delimiter_run(&buf, i, ch);
                seeds.push(PositionedSeed { pos, buf_start: i, seed });
                i += consumed;
            }
            '!' if i + 1 < n && buf[i + 1].1 == '[' => {
                flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                seeds.push(PositionedSeed {
                    pos,
                    buf_start: i,
                    seed: Seed::BracketOpen { is_image: true },
                });
                i += 2;
            }
            '[' => {
                flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                seeds.push(PositionedSeed {
                    pos,
                    buf_start: i,
                    seed: Seed::BracketOpen { is_image: false },
                });
                i += 1;
            }
            ']' => {
                flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                seeds.push(PositionedSeed {
                    pos,
                    buf_start: i,
                    seed: Seed::BracketClose,
                });
                i += 1;
            }
            '\n' => {
                let trimmed_len = text_buf.trim_end_matches(' ').len();
                let hard = text_buf.len() - trimmed_len >= 2;
                text_buf.truncate(trimmed_len);
                flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
                seeds.push(PositionedSeed {
                    pos,
                    buf_start: i,
                    seed: if hard { Seed::HardBreak } else { Seed::SoftBreak },
                });
                i += 1;
            }
            _ => {
                text_pos.get_or_insert(pos);
                text_start.get_or_insert(i);
                text_buf.push(ch);
                i += 1;
            }
        }
    }
    flush_text(&mut seeds, &mut text_buf, &mut text_pos, &mut text_start);
    seeds
}

fn flush_text(
    seeds: &mut Vec<PositionedSeed>,
    text_buf: &mut String,
    text_pos: &mut Option<Position>,
    text_start: &mut Option<usize>,
) {
    if !text_buf.is_empty() {
        seeds.push(PositionedSeed {
            pos: text_pos.take().unwrap(),
            buf_start: text_start.take().unwrap(),
            seed: Seed::Text(std::mem::take(text_buf)),
        });
    } else {
        *text_pos = None;
        *text_start = None;
    }
}

fn count_run(buf: &[(Position, char)], start: usize, ch: char) -> usize {
    let mut len = 0;
    while start + len < buf.len() && buf[start + len].1 == ch {
        len += 1;
    }
    len
}

fn scan_code_span(buf: &[(Position, char)], start: usize, pos: Position, seeds: &mut Vec<PositionedSeed>) -> usize {
    let n = buf.len();
    let open_len = count_run(buf, start, '`');
    let content_start = start + open_len;
    let mut i = content_start;

    loop {
        if i >= n {
            let literal: String = std::iter::repeat_n('`', open_len).collect();
            seeds.push(PositionedSeed {
                pos,
                buf_start: start,
                seed: Seed::Text(literal),
            });
            return start + open_len;
        }
        if buf[i].1 == '`' {
            let run = count_run(buf, i, '`');
            if run == open_len {
                let mut code = String::new();
                for &(_, c) in &buf[content_start..i] {
                    code.push(if c == '\n' { ' ' } else { c });
                }
                if code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty() {
                    code = code[1..code.len() - 1].to_string();
                }
                seeds.push(PositionedSeed {
                    pos,
                    buf_start: start,
                    seed: Seed::CodeSpan {
                        code,
                        backtick_count: open_len as u32,
                    },
                });
                return i + run;
            }
            i += run;
        } else {
            i += 1;
        }
    }
}

fn prev_char(buf: &[(Position, char)], start: usize, back: usize) -> Option<char> {
    if start >= back { Some(buf[start - back].1) } else { None }
}

fn next_char(buf: &[(Position, char)], idx: usize, ahead: usize) -> Option<char> {
    buf.get(idx + ahead).map(|&(_, c)| c)
}

fn scan_delimiter_run(buf: &[(Position, char)], start: usize, ch: char) -> (usize, Seed) {
    let run_len = count_run(buf, start, ch);
    let preceding_two = [prev_char(buf, start, 1), prev_char(buf, start, 2)];
    let following_two = [next_char(buf, start + run_len, 0), next_char(buf, start + run_len, 1)];
    (
        run_len,
        Seed::Delim {
            ch,
            run_len: run_len as u32,
            preceding_two,
            following_two,
        },
    )
}

fn try_entity(buf: &[(Position, char)], start: usize) -> Option<(usize, String)> {
    let mut j = start + 1;
    let mut name = String::new();
    while j < buf.len() && name.len() < 32 {
        let c = buf[j].1;
        if c == ';' {
            let decoded = if let Some(num) = name.strip_prefix('#') {
                entities::decode_numeric(&format!("#{num}"))?
            } else {
                entities::decode_named(&name)?.to_string()
            };
            return Some((j - start + 1, decoded));
        }
        if !(c.is_ascii_alphanumeric() || c == '#') {
            return None;
        }
        name.push(c);
        j += 1;
    }
    None
}

fn try_autolink_or_html(buf: &[(Position, char)], start: usize) -> Option<(usize, Seed)> {
    let mut j = start + 1;
    let mut inner = String::new();
    while j < buf.len() {
        let c = buf[j].1;
        if c == '>' {
            let whole_len = j - start + 1;
            return classify_angle(&inner).map(|seed| (whole_len, seed));
        }
        if c == '<' || c == '\n' {
            return None;
        }
        inner.push(c);
        j += 1;
    }
    None
}

fn classify_angle(inner: &str) -> Option<Seed> {
    if let Some(seed) = try_uri_autolink(inner) {
        return Some(seed);
    }
    if let Some(seed) = try_email_autolink(inner) {
        return Some(seed);
    }
    let looks_like_tag = inner.starts_with('/')
        || inner.starts_with('!')
        || inner.starts_with('?')
        || inner.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if looks_like_tag {
        return Some(Seed::RawHtml { html: format!("<{inner}>") });
    }
    None
}

fn try_uri_autolink(inner: &str) -> Option<Seed> {
    let colon = inner.find(':')?;
    let scheme = &inner[..colon];
    if scheme.is_empty() || scheme.len() > 32 {
        return None;
    }
    let mut chars = scheme.chars();
    if !chars.next()?.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')) {
        return None;
    }
    let rest = &inner[colon + 1..];
    if rest.chars().any(|c| c.is_whitespace() || c.is_ascii_control()) {
        return None;
    }
    Some(Seed::Autolink {
        uri: inner.to_string(),
        kind: AutolinkKind::Uri,
    })
}

fn try_email_autolink(inner: &str) -> Option<Seed> {
    let at = inner.find('@')?;
    let (local, domain) = (&inner[..at], &inner[at + 1..]);
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    if inner.chars().any(char::is_whitespace) {
        return None;
    }
    if !domain.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-')) {
        return None;
    }
    Some(Seed::Autolink {
        uri: inner.to_string(),
        kind: AutolinkKind::Email,
    })
}
