//! The token model (§3 of the spec): a single tagged union replacing the
//! broad class hierarchy a naive port would produce (§9 "Inheritance of
//! token variants"). Tokens live in an arena (`TokenStream`) and are never
//! mutated after the coalescer finalizes them; end tokens reference their
//! opener by a stable `TokenIndex` rather than a back-pointer, which would
//! otherwise form a reference cycle (§9 "Cyclic end token -> start token
//! links").

use crate::position::Position;
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;

/// A stable index into a [`TokenStream`]'s arena.
pub type TokenIndex = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub pos: Position,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(pos: Position, kind: TokenKind) -> Self {
        Self { pos, kind }
    }

    pub fn is_opener(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::ParagraphStart
                | TokenKind::AtxHeadingStart { .. }
                | TokenKind::SetextHeadingStart { .. }
                | TokenKind::FencedCodeStart { .. }
                | TokenKind::IndentedCodeStart
                | TokenKind::HtmlBlockStart { .. }
                | TokenKind::BlockQuoteStart
                | TokenKind::UnorderedListStart { .. }
                | TokenKind::OrderedListStart { .. }
        )
    }

    pub fn is_ender(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::ParagraphEnd { .. }
                | TokenKind::AtxHeadingEnd { .. }
                | TokenKind::SetextHeadingEnd { .. }
                | TokenKind::FencedCodeEnd { .. }
                | TokenKind::IndentedCodeEnd { .. }
                | TokenKind::HtmlBlockEnd { .. }
                | TokenKind::BlockQuoteEnd { .. }
                | TokenKind::ListEnd { .. }
        )
    }
}

/// Which of the four syntactic link/image forms produced an
/// [`TokenKind::InlineLink`]/[`TokenKind::InlineImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelType {
    /// `[text](dest "title")`
    Inline,
    /// `[text][]`
    Collapsed,
    /// `[text][label]`
    Full,
    /// `[text]` resolved against a link reference definition of the same name
    Shortcut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutolinkKind {
    Uri,
    Email,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ---- Block openers --------------------------------------------------
    ParagraphStart,
    AtxHeadingStart {
        level: u8,
        hashes: u8,
    },
    SetextHeadingStart {
        underline_char: char,
    },
    FencedCodeStart {
        fence_char: char,
        fence_len: u32,
        info_string: String,
    },
    IndentedCodeStart,
    HtmlBlockStart {
        kind: u8,
    },
    BlockQuoteStart,
    UnorderedListStart {
        marker: char,
        indent: u32,
    },
    OrderedListStart {
        start_number: u64,
        marker: char,
        indent: u32,
    },
    /// A new item within the list opened by the nearest enclosing
    /// `UnorderedListStart`/`OrderedListStart` on the container stack.
    NewListItem,

    // ---- Block enders ----------------------------------------------------
    ParagraphEnd {
        opener: TokenIndex,
        forced: bool,
    },
    AtxHeadingEnd {
        opener: TokenIndex,
        forced: bool,
    },
    SetextHeadingEnd {
        opener: TokenIndex,
        forced: bool,
    },
    FencedCodeEnd {
        opener: TokenIndex,
        forced: bool,
    },
    IndentedCodeEnd {
        opener: TokenIndex,
        forced: bool,
    },
    HtmlBlockEnd {
        opener: TokenIndex,
        forced: bool,
    },
    BlockQuoteEnd {
        opener: TokenIndex,
        forced: bool,
    },
    ListEnd {
        opener: TokenIndex,
        forced: bool,
    },

    // ---- Leaf content ------------------------------------------------------
    Text {
        text: String,
        leading_whitespace: String,
    },
    Blank {
        whitespace: String,
    },
    ThematicBreak {
        ch: char,
    },
    LinkRefDef {
        label: String,
        destination: String,
        title: Option<String>,
    },
    FrontMatter {
        map: JsonMap<String, JsonValue>,
    },

    // ---- Inline --------------------------------------------------------
    /// A maximal run of `*` or `_`. Before resolution this is a *candidate*
    /// delimiter; after resolution, `active` marks whether it still forms
    /// one side of a matched emphasis pair (`run_len` holds however many
    /// characters of the run were actually consumed: 1 for regular
    /// emphasis, 2 for strong). A `SpecialText` that is not `active` after
    /// resolution is unmatched and is folded into literal `Text` by the
    /// coalescer (invariant 3).
    SpecialText {
        delimiter: char,
        run_len: u32,
        preceding_two: [Option<char>; 2],
        following_two: [Option<char>; 2],
        active: bool,
    },
    InlineCode {
        code: String,
        backtick_count: u32,
    },
    AngleAutolink {
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
    /// Opens a resolved link. Inner inline tokens (text, nested emphasis,
    /// nested images) follow in the stream up to the matching `EndLink`;
    /// unlike images, a link's content is not flattened because emphasis
    /// resolution is re-run confined to its range (§4.F).
    InlineLink {
        label_type: LabelType,
        destination: String,
        title: Option<String>,
    },
    EndLink {
        opener: TokenIndex,
    },
    /// Images have no separate end token: per spec, image "text" is
    /// flattened into `alt_text` rather than kept as live child tokens.
    InlineImage {
        label_type: LabelType,
        destination: String,
        title: Option<String>,
        alt_text: String,
    },
}

/// The arena of tokens produced for one document.
#[derive(Debug, Default, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn push(&mut self, token: Token) -> TokenIndex {
        let idx = self.tokens.len() as TokenIndex;
        self.tokens.push(token);
        idx
    }

    pub fn get(&self, idx: TokenIndex) -> &Token {
        &self.tokens[idx as usize]
    }

    pub fn get_mut(&mut self, idx: TokenIndex) -> &mut Token {
        &mut self.tokens[idx as usize]
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn into_vec(self) -> Vec<Token> {
        self.tokens
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }
}

impl FromIterator<Token> for TokenStream {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

/// Checks invariant 1 (every opener has exactly one matching ender, openers
/// and enders well-nested) and invariant 4 (position monotonicity of
/// opener tokens). Used by tests and, at `debug_assertions` time, by the
/// coalescer.
pub fn check_balanced(tokens: &[Token]) -> Result<(), String> {
    let mut stack: Vec<TokenIndex> = Vec::new();
    let mut last_opener_pos: Option<Position> = None;

    for (idx, tok) in tokens.iter().enumerate() {
        if tok.is_opener() {
            if let Some(prev) = last_opener_pos
                && tok.pos < prev
            {
                return Err(format!("opener at index {idx} is out of document order"));
            }
            last_opener_pos = Some(tok.pos);
            stack.push(idx as TokenIndex);
        } else if tok.is_ender() {
            match stack.pop() {
                Some(_) => {}
                None => return Err(format!("ender at index {idx} has no matching opener")),
            }
        }
    }

    if !stack.is_empty() {
        return Err(format!("{} opener(s) left unclosed", stack.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(kind: TokenKind) -> Token {
        Token::new(Position::start(), kind)
    }

    #[test]
    fn balanced_stream_passes() {
        let tokens = vec![
            t(TokenKind::ParagraphStart),
            t(TokenKind::Text {
                text: "hi".into(),
                leading_whitespace: String::new(),
            }),
            t(TokenKind::ParagraphEnd {
                opener: 0,
                forced: false,
            }),
        ];
        assert!(check_balanced(&tokens).is_ok());
    }

    #[test]
    fn unclosed_opener_fails() {
        let tokens = vec![t(TokenKind::ParagraphStart)];
        assert!(check_balanced(&tokens).is_err());
    }

    #[test]
    fn dangling_ender_fails() {
        let tokens = vec![t(TokenKind::ParagraphEnd {
            opener: 0,
            forced: false,
        })];
        assert!(check_balanced(&tokens).is_err());
    }
}
