//! Streaming XML-mode tokenizer with a nesting-context stack.
//!
//! This plays the role of an editor's syntax-highlighting lexer: it produces
//! a flat stream of tokens, each annotated with the number of tags open after
//! it was consumed. It does not build a tree and never rewinds.
//!
//! Multi-line tokens (text, comments, quoted values) are split into one token
//! per line so that every token has a single-line span.

use std::collections::VecDeque;

use smol_str::SmolStr;

use crate::dialect::MarkupDialect;
use crate::token::{Token, TokenKind};
use crate::types::TokenSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    /// Between tags.
    Content,
    /// Right after `<`, expecting the tag name.
    OpenTagName,
    /// Right after `</`.
    CloseTagName,
    /// Attributes of an opening tag, up to `>` or `/>`.
    InOpenTag,
    /// Rest of a closing tag, up to `>`.
    InCloseTag,
}

/// Forward-only tokenizer over a char buffer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    /// Line and column of `pos`, advanced as tokens are emitted.
    line: usize,
    column: usize,
    state: LexState,
    /// Names of the currently open tags, outermost first.
    stack: Vec<SmolStr>,
    current_tag: Option<SmolStr>,
    closing_tag: Option<SmolStr>,
    dialect: MarkupDialect,
    pending: VecDeque<Token>,
}

impl Tokenizer {
    pub fn new(text: &str) -> Self {
        Self::from_chars(text.chars())
    }

    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        Self {
            chars: chars.into_iter().collect(),
            pos: 0,
            line: 0,
            column: 0,
            state: LexState::Content,
            stack: Vec::new(),
            current_tag: None,
            closing_tag: None,
            dialect: MarkupDialect::default(),
            pending: VecDeque::new(),
        }
    }

    pub fn with_dialect(mut self, dialect: MarkupDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> MarkupDialect {
        self.dialect
    }

    /// Tags open at the current scan position, outermost first.
    pub fn open_tags(&self) -> &[SmolStr] {
        &self.stack
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn at(&self, pat: &str) -> bool {
        pat.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn bump_n(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.chars.len());
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Consume up to and including `pat`, or to the end of input.
    fn bump_through(&mut self, pat: &str) {
        while self.pos < self.chars.len() {
            if self.at(pat) {
                self.bump_n(pat.chars().count());
                return;
            }
            self.pos += 1;
        }
    }

    /// Consume a `<!...>` declaration, skipping a bracketed internal subset.
    fn bump_declaration(&mut self) {
        let mut brackets = 0usize;
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '[' => brackets += 1,
                ']' => brackets = brackets.saturating_sub(1),
                '>' if brackets == 0 => break,
                _ => {}
            }
        }
    }

    fn take_name(&mut self) -> SmolStr {
        let start = self.pos;
        self.bump_while(is_name_char);
        self.chars[start..self.pos].iter().collect::<String>().into()
    }

    /// Innermost open tag matching `name`.
    fn find_open(&self, name: &str) -> Option<usize> {
        let dialect = self.dialect;
        self.stack
            .iter()
            .rposition(|open| dialect.names_match(open, name))
    }

    /// Scan one raw token and apply its effect on the context stack.
    fn lex(&mut self) -> Option<(TokenKind, Option<SmolStr>)> {
        let c = self.peek()?;
        let lexed = match self.state {
            LexState::Content => (self.lex_content(c), None),
            LexState::OpenTagName => {
                let name = self.take_name();
                self.current_tag = Some(name.clone());
                self.state = LexState::InOpenTag;
                (TokenKind::TagName, Some(name))
            }
            LexState::CloseTagName => {
                self.state = LexState::InCloseTag;
                if is_name_start(c) {
                    let name = self.take_name();
                    let kind = if self.find_open(&name).is_some() {
                        TokenKind::TagName
                    } else {
                        TokenKind::Error
                    };
                    self.closing_tag = Some(name);
                    (kind, None)
                } else {
                    self.closing_tag = None;
                    (self.lex_close_tag(c), None)
                }
            }
            LexState::InOpenTag => (self.lex_open_tag(c), None),
            LexState::InCloseTag => (self.lex_close_tag(c), None),
        };
        Some(lexed)
    }

    fn lex_content(&mut self, c: char) -> TokenKind {
        if c != '<' {
            let start = self.pos;
            self.bump_while(|ch| ch != '<');
            let blank = self.chars[start..self.pos].iter().all(|ch| ch.is_whitespace());
            return if blank {
                TokenKind::Whitespace
            } else {
                TokenKind::Text
            };
        }

        if self.at("<!--") {
            self.bump_n(4);
            self.bump_through("-->");
            TokenKind::Comment
        } else if self.at("<![CDATA[") {
            self.bump_n(9);
            self.bump_through("]]>");
            TokenKind::CData
        } else if self.at("<?") {
            self.bump_n(2);
            self.bump_through("?>");
            TokenKind::Meta
        } else if self.at("<!") {
            self.bump_n(2);
            self.bump_declaration();
            TokenKind::Meta
        } else if self.at("</") {
            self.bump_n(2);
            self.state = LexState::CloseTagName;
            TokenKind::TagBracket
        } else if self.peek_at(1).is_some_and(is_name_start) {
            self.bump_n(1);
            self.state = LexState::OpenTagName;
            TokenKind::TagBracket
        } else {
            // A lone `<` that starts nothing.
            self.bump_n(1);
            TokenKind::Text
        }
    }

    fn lex_open_tag(&mut self, c: char) -> TokenKind {
        match c {
            c if c.is_whitespace() => {
                self.bump_while(char::is_whitespace);
                TokenKind::Whitespace
            }
            '/' if self.at("/>") => {
                self.bump_n(2);
                self.state = LexState::Content;
                self.current_tag = None;
                TokenKind::TagBracket
            }
            '>' => {
                self.bump_n(1);
                self.state = LexState::Content;
                if let Some(name) = self.current_tag.take() {
                    if !self.dialect.is_void_element(&name) {
                        self.stack.push(name);
                    }
                }
                TokenKind::TagBracket
            }
            '=' => {
                self.bump_n(1);
                TokenKind::Equals
            }
            '"' | '\'' => {
                self.bump_n(1);
                self.bump_while(|ch| ch != c);
                self.bump_n(1);
                TokenKind::AttributeValue
            }
            c if is_name_start(c) => {
                self.bump_while(is_name_char);
                TokenKind::AttributeName
            }
            _ => {
                self.bump_n(1);
                TokenKind::Error
            }
        }
    }

    fn lex_close_tag(&mut self, c: char) -> TokenKind {
        match c {
            c if c.is_whitespace() => {
                self.bump_while(char::is_whitespace);
                TokenKind::Whitespace
            }
            '>' => {
                self.bump_n(1);
                self.state = LexState::Content;
                if let Some(name) = self.closing_tag.take() {
                    if let Some(idx) = self.find_open(&name) {
                        self.stack.truncate(idx);
                    }
                }
                TokenKind::TagBracket
            }
            _ => {
                self.bump_n(1);
                TokenKind::Error
            }
        }
    }

    /// Queue the chars in `start..self.pos` as one token per source line.
    fn emit(&mut self, kind: TokenKind, start: usize, open_tag_name: Option<SmolStr>) {
        let depth = self.stack.len();
        let mut fragment = String::new();
        let mut fragment_start = self.column;

        for i in start..self.pos {
            let c = self.chars[i];
            if c == '\n' {
                self.push_fragment(kind, &mut fragment, fragment_start, depth, &open_tag_name);
                self.line += 1;
                self.column = 0;
                fragment_start = 0;
            } else {
                fragment.push(c);
                self.column += 1;
            }
        }
        self.push_fragment(kind, &mut fragment, fragment_start, depth, &open_tag_name);
    }

    fn push_fragment(
        &mut self,
        kind: TokenKind,
        fragment: &mut String,
        start_column: usize,
        depth: usize,
        open_tag_name: &Option<SmolStr>,
    ) {
        let text = std::mem::take(fragment);
        let text = text.strip_suffix('\r').unwrap_or(&text);
        let len = text.chars().count();
        if len == 0 {
            return;
        }
        self.pending.push_back(Token {
            kind,
            text: SmolStr::new(text),
            open_tag_name: open_tag_name.clone(),
            depth,
            span: TokenSpan::new(self.line, start_column, start_column + len),
        });
    }
}

impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            let start = self.pos;
            let (kind, open_tag_name) = self.lex()?;
            self.emit(kind, start, open_tag_name);
        }
    }
}

/// Tokenize a whole string.
pub fn tokenize(text: &str, dialect: MarkupDialect) -> Vec<Token> {
    Tokenizer::new(text).with_dialect(dialect).collect()
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_numeric() || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(text: &str) -> String {
        tokenize(text, MarkupDialect::Svg)
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn open_tags(text: &str, dialect: MarkupDialect) -> Vec<(String, usize)> {
        tokenize(text, dialect)
            .into_iter()
            .filter(|t| t.is_open_tag())
            .map(|t| (t.text.to_string(), t.depth))
            .collect()
    }

    #[test]
    fn test_depth_tracking() {
        insta::assert_snapshot!(dump("<svg><g/></svg>"), @r#"
        0:0-1 TagBracket "<" depth=0
        0:1-4 TagName "svg" depth=0 open
        0:4-5 TagBracket ">" depth=1
        0:5-6 TagBracket "<" depth=1
        0:6-7 TagName "g" depth=1 open
        0:7-9 TagBracket "/>" depth=1
        0:9-11 TagBracket "</" depth=1
        0:11-14 TagName "svg" depth=1
        0:14-15 TagBracket ">" depth=0
        "#);
    }

    #[test]
    fn test_multiline_tokens_split_per_line() {
        insta::assert_snapshot!(dump("<svg>\n  <!-- a\n  b -->\n</svg>"), @r#"
        0:0-1 TagBracket "<" depth=0
        0:1-4 TagName "svg" depth=0 open
        0:4-5 TagBracket ">" depth=1
        1:0-2 Whitespace "  " depth=1
        1:2-8 Comment "<!-- a" depth=1
        2:0-7 Comment "  b -->" depth=1
        3:0-2 TagBracket "</" depth=1
        3:2-5 TagName "svg" depth=1
        3:5-6 TagBracket ">" depth=0
        "#);
    }

    #[test]
    fn test_nested_open_tag_depths() {
        let tags = open_tags(
            "<svg><g><rect/></g><g><circle></circle><circle/></g></svg>",
            MarkupDialect::Svg,
        );
        assert_eq!(
            tags,
            vec![
                ("svg".to_string(), 0),
                ("g".to_string(), 1),
                ("rect".to_string(), 2),
                ("g".to_string(), 1),
                ("circle".to_string(), 2),
                ("circle".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_attribute_value_with_brackets() {
        let tokens = tokenize(r#"<svg><text data-x="a > b" y='/>'>hi</text></svg>"#, MarkupDialect::Svg);
        let values: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::AttributeValue)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(values, vec![r#""a > b""#, "'/>'"]);

        let text = tokens.iter().find(|t| t.kind == TokenKind::Text).unwrap();
        assert_eq!(text.text, "hi");
        assert_eq!(text.depth, 2);
        assert_eq!(tokens.last().unwrap().depth, 0);
    }

    #[test]
    fn test_prologue_is_meta() {
        let tokens = tokenize(
            "<?xml version=\"1.0\"?>\n<!DOCTYPE svg [\n<!ENTITY a \"x>y\">\n]>\n<svg/>",
            MarkupDialect::Svg,
        );
        let first_tag = tokens.iter().position(|t| t.is_open_tag()).unwrap();
        let prologue = &tokens[..first_tag - 1];
        assert!(prologue.iter().all(|t| matches!(
            t.kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Meta
        )));
        assert_eq!(tokens[first_tag].span, TokenSpan::new(4, 1, 4));
    }

    #[test]
    fn test_cdata_and_text_do_not_change_depth() {
        let tokens = tokenize("<a><![CDATA[<b>]]>x &amp; y</a>", MarkupDialect::Xml);
        let cdata = tokens.iter().find(|t| t.kind == TokenKind::CData).unwrap();
        assert_eq!(cdata.text, "<![CDATA[<b>]]>");
        assert_eq!(cdata.depth, 1);
        assert_eq!(open_tags("<a><![CDATA[<b>]]></a>", MarkupDialect::Xml).len(), 1);
    }

    #[test]
    fn test_unmatched_close_is_error() {
        let tokens = tokenize("<a><b></x></b></a>", MarkupDialect::Xml);
        let stray = tokens.iter().find(|t| t.text == "x").unwrap();
        assert_eq!(stray.kind, TokenKind::Error);
        assert_eq!(stray.depth, 2);
        assert_eq!(tokens.last().unwrap().depth, 0);
    }

    #[test]
    fn test_close_recovers_to_matching_ancestor() {
        // `</a>` closes the unclosed `<b>` as well.
        let tokens = tokenize("<a><b></a><c/>", MarkupDialect::Xml);
        let c = tokens.iter().find(|t| t.text == "c").unwrap();
        assert_eq!(c.depth, 0);
    }

    #[test]
    fn test_html_void_elements() {
        let tags = open_tags("<div><br><img src=x><p>t</p></div>", MarkupDialect::Html);
        assert_eq!(
            tags,
            vec![
                ("div".to_string(), 0),
                ("br".to_string(), 1),
                ("img".to_string(), 1),
                ("p".to_string(), 1),
            ]
        );
        // Same input as SVG nests everything under `br`.
        let tags = open_tags("<div><br><img src=x><p>t</p></div>", MarkupDialect::Svg);
        assert_eq!(tags[3], ("p".to_string(), 3));
    }

    #[test]
    fn test_crlf_spans() {
        let tokens = tokenize("<svg>\r\n<g/>\r\n</svg>", MarkupDialect::Svg);
        let g = tokens.iter().find(|t| t.text == "g").unwrap();
        assert_eq!(g.span, TokenSpan::new(1, 1, 2));
        assert!(tokens.iter().all(|t| !t.text.ends_with('\r')));
    }

    #[test]
    fn test_open_tags_reported() {
        let mut tokenizer = Tokenizer::new("<svg><g><rect/>");
        for token in tokenizer.by_ref() {
            if token.text == "rect" {
                break;
            }
        }
        let open: Vec<&str> = tokenizer.open_tags().iter().map(|s| s.as_str()).collect();
        assert_eq!(open, ["svg", "g"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("", MarkupDialect::Svg).is_empty());
    }
}
