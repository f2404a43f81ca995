//! Syntactic parsing of a single link reference definition
//! (`[label]: destination "title"`) out of a run of already-buffered
//! paragraph lines. Registry normalization/storage lives in [`crate::lrd`];
//! this module only answers "does the start of these lines parse as an
//! LRD, and how many lines did it consume".
//!
//! The open question in spec §9 about a title spanning a *blank* line does
//! not apply here: a blank line always closes the paragraph first, so an
//! LRD candidate buffer is blank-free by construction. This module handles
//! the title appearing on the line after the destination, which is the
//! case CommonMark §4.7 actually specifies.

pub struct ParsedLrd {
    pub label: String,
    pub destination: String,
    pub title: Option<String>,
    /// How many of the input lines were consumed by this definition.
    pub lines_consumed: usize,
}

/// Attempts to parse one LRD from the start of `lines`. On success, returns
/// the parsed definition and the trailing lines are whatever remains of
/// the paragraph (possibly a remainder of the last consumed line, which the
/// caller re-threads back into the paragraph buffer as leftover text).
pub fn try_parse_lrd(lines: &[&str]) -> Option<ParsedLrd> {
    let joined = lines.join("\n");
    let mut chars = Cursor::new(&joined);

    chars.skip_up_to_n_spaces(3);
    chars.expect_char('[')?;
    let label_start = chars.pos;
    let mut depth = 1usize;
    loop {
        let c = chars.peek()?;
        if c == '\\' {
            chars.advance();
            chars.advance();
            continue;
        }
        if c == '[' {
            depth += 1;
        } else if c == ']' {
            depth -= 1;
            if depth == 0 {
                break;
            }
        }
        chars.advance();
    }
    let label = joined[label_start..chars.pos].to_string();
    if label.trim().is_empty() {
        return None;
    }
    chars.advance(); // consume ']'
    chars.expect_char(':')?;
    chars.skip_inline_whitespace_and_at_most_one_newline();

    let destination = parse_destination(&mut chars)?;
    let before_title = chars.pos;
    let had_space = chars.skip_inline_whitespace_and_at_most_one_newline();

    let title = if had_space {
        match parse_title(&mut chars) {
            Some(t) => {
                chars.skip_inline_whitespace();
                if chars.at_eol_or_eof() {
                    Some(t)
                } else {
                    chars.pos = before_title;
                    None
                }
            }
            None => {
                chars.pos = before_title;
                None
            }
        }
    } else {
        None
    };

    if title.is_none() {
        chars.pos = before_title;
        chars.skip_inline_whitespace();
        if !chars.at_eol_or_eof() {
            return None;
        }
    }

    let consumed_through = chars.pos;
    let lines_consumed = joined[..consumed_through].matches('\n').count() + 1;

    Some(ParsedLrd {
        label,
        destination,
        title,
        lines_consumed,
    })
}

fn parse_destination(c: &mut Cursor<'_>) -> Option<String> {
    if c.peek() == Some('<') {
        c.advance();
        let start = c.pos;
        loop {
            match c.peek()? {
                '>' => {
                    let dest = c.src[start..c.pos].to_string();
                    c.advance();
                    return Some(dest);
                }
                '\n' | '<' => return None,
                '\\' => {
                    c.advance();
                    c.advance();
                }
                _ => c.advance(),
            }
        }
    }

    let start = c.pos;
    let mut depth = 0i32;
    loop {
        match c.peek() {
            None => break,
            Some(ch) if ch.is_whitespace() => break,
            Some('(') => {
                depth += 1;
                c.advance();
            }
            Some(')') => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                c.advance();
            }
            Some('\\') => {
                c.advance();
                c.advance();
            }
            Some(_) => c.advance(),
        }
    }
    if depth != 0 || start == c.pos {
        return None;
    }
    Some(c.src[start..c.pos].to_string())
}

fn parse_title(c: &mut Cursor<'_>) -> Option<String> {
    let quote = match c.peek()? {
        q @ ('"' | '\'') => q,
        '(' => ')',
        _ => return None,
    };
    let opening = c.peek().unwrap();
    c.advance();
    let start = c.pos;
    loop {
        let ch = c.peek()?;
        if ch == '\\' {
            c.advance();
            c.advance();
            continue;
        }
        if ch == quote {
            let title = c.src[start..c.pos].to_string();
            c.advance();
            return Some(title);
        }
        if opening == '(' && ch == '(' {
            return None;
        }
        c.advance();
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn expect_char(&mut self, expected: char) -> Option<()> {
        if self.peek() == Some(expected) {
            self.advance();
            Some(())
        } else {
            None
        }
    }

    fn skip_up_to_n_spaces(&mut self, n: usize) {
        let mut count = 0;
        while count < n && self.peek() == Some(' ') {
            self.advance();
            count += 1;
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.advance();
        }
    }

    /// Skips spaces/tabs and, if present, a single newline plus the
    /// whitespace after it. Returns true if anything was skipped.
    fn skip_inline_whitespace_and_at_most_one_newline(&mut self) -> bool {
        let before = self.pos;
        self.skip_inline_whitespace();
        if self.peek() == Some('\n') {
            self.advance();
            self.skip_inline_whitespace();
        }
        self.pos != before
    }

    fn at_eol_or_eof(&self) -> bool {
        matches!(self.peek(), None | Some('\n'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_line_with_title() {
        let lrd = try_parse_lrd(&[r#"[foo]: /url "title""#]).unwrap();
        assert_eq!(lrd.label, "foo");
        assert_eq!(lrd.destination, "/url");
        assert_eq!(lrd.title.as_deref(), Some("title"));
        assert_eq!(lrd.lines_consumed, 1);
    }

    #[test]
    fn parses_bare_destination_without_title() {
        let lrd = try_parse_lrd(&["[foo]: /url"]).unwrap();
        assert_eq!(lrd.destination, "/url");
        assert!(lrd.title.is_none());
    }

    #[test]
    fn parses_angle_bracket_destination() {
        let lrd = try_parse_lrd(&["[foo]: <my url>"]).unwrap();
        assert_eq!(lrd.destination, "my url");
    }

    #[test]
    fn parses_destination_on_second_line() {
        let lrd = try_parse_lrd(&["[foo]:", "/url \"title\""]).unwrap();
        assert_eq!(lrd.destination, "/url");
        assert_eq!(lrd.title.as_deref(), Some("title"));
        assert_eq!(lrd.lines_consumed, 2);
    }

    #[test]
    fn rejects_non_lrd_paragraph_text() {
        assert!(try_parse_lrd(&["This is not a reference"]).is_none());
    }

    #[test]
    fn rejects_trailing_garbage_after_title() {
        assert!(try_parse_lrd(&[r#"[foo]: /url "title" garbage"#]).is_none());
    }

    #[test]
    fn lone_label_colon_at_eof_with_no_destination_fails() {
        assert!(try_parse_lrd(&["[foo]:"]).is_none());
    }
}
