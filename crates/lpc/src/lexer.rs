use std::fmt;

use serde::Serialize;

use crate::syntax;

mod stream;

pub use stream::{decode_source, CharStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    Int,
    Float,
    String,
    Character,
    Symbol,
    Comment,
    DocComment,
    Eof,

    Include,
    Inherit,
    Class,
    Private,
    Protected,
    Public,
    Static,
    Override,
    Deprecated,
    Nosave,
    New,
    This,
    Nil,
    True,
    False,
    Sizeof,
    Is,
    Let,
    If,
    Else,
    While,
    Do,
    For,
    Foreach,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Try,
    Catch,
    Operator,

    Void,
    IntType,
    FloatType,
    CharType,
    BoolType,
    StringType,
    SymbolType,
    ObjectType,
    MappingType,
    FunctionType,
    ExceptionType,
    AnyType,
    AutoType,

    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    ArrayOpen,
    MappingOpen,
    Semicolon,
    Comma,
    Dot,
    Colon,
    Question,
    Arrow,
    Scope,
    Range,
    Ellipsis,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShiftLeftAssign,
    ShiftRightAssign,
    Increment,
    Decrement,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    Bang,
    Tilde,
    Ampersand,
    Pipe,
    Caret,
    ShiftLeft,
    ShiftRight,
}

impl TokenKind {
    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::IntType
                | TokenKind::FloatType
                | TokenKind::CharType
                | TokenKind::BoolType
                | TokenKind::StringType
                | TokenKind::SymbolType
                | TokenKind::ObjectType
                | TokenKind::MappingType
                | TokenKind::FunctionType
                | TokenKind::ExceptionType
                | TokenKind::AnyType
                | TokenKind::AutoType
        )
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Public
                | TokenKind::Static
                | TokenKind::Override
                | TokenKind::Deprecated
                | TokenKind::Nosave
        )
    }

    /// Reserved words other than type keywords, including `#include`.
    pub fn is_keyword(self) -> bool {
        self == TokenKind::Include
            || (syntax::keyword_text(self).is_some() && !self.is_type_keyword())
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::DocComment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == TokenKind::Include {
            return f.write_str(syntax::DIRECTIVE_INCLUDE);
        }
        if let Some(text) = syntax::keyword_text(*self) {
            return f.write_str(text);
        }
        if let Some(text) = syntax::symbol_text(*self) {
            return write!(f, "'{text}'");
        }
        let name = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::String => "string literal",
            TokenKind::Character => "character literal",
            TokenKind::Symbol => "symbol literal",
            TokenKind::Comment => "comment",
            TokenKind::DocComment => "doc comment",
            TokenKind::Eof => "end of file",
            _ => "token",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenValue {
    Int(i64),
    Float(f64),
    Char(char),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub begin: usize,
    pub end: usize,
    pub kind: TokenKind,
    pub value: Option<TokenValue>,
}

impl Token {
    pub fn eof(at: usize) -> Self {
        Self {
            begin: at,
            end: at,
            kind: TokenKind::Eof,
            value: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::Text(text)) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LexOptions {
    /// Editor mode keeps comments in the token stream for highlighting.
    pub emit_comments: bool,
}

/// Lazy tokenizer. `next_token` is total: it always consumes input until the
/// end of the text and then keeps returning EOF.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    stream: CharStream<'a>,
    options: LexOptions,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str, options: LexOptions) -> Self {
        Self {
            stream: CharStream::new(text),
            options,
            finished: false,
        }
    }

    /// Restarts tokenization at `offset`.
    pub fn restart(&mut self, offset: usize) {
        self.stream.reset(offset);
        self.finished = false;
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.stream.advance_while(char::is_whitespace);
            let begin = self.stream.position();
            if self.stream.is_at_end() {
                return Token::eof(begin);
            }
            if let Some(kind) = self.skip_comment() {
                if self.options.emit_comments {
                    return self.finish(begin, kind, None);
                }
                continue;
            }
            return self.scan_token(begin);
        }
    }

    fn skip_comment(&mut self) -> Option<TokenKind> {
        if self.stream.starts_with("//") {
            self.stream.advance_while(|ch| ch != '\n');
            return Some(TokenKind::Comment);
        }
        if self.stream.starts_with("/*!") {
            self.stream.advance_by(3);
            self.stream.skip_past("*/");
            return Some(TokenKind::DocComment);
        }
        if self.stream.starts_with("/*") {
            self.stream.advance_by(2);
            self.stream.skip_past("*/");
            return Some(TokenKind::Comment);
        }
        None
    }

    fn scan_token(&mut self, begin: usize) -> Token {
        let Some(ch) = self.stream.peek() else {
            return Token::eof(begin);
        };

        if ch == '"' {
            let text = self.scan_delimited('"');
            return self.finish(begin, TokenKind::String, Some(TokenValue::Text(text)));
        }

        if ch == '\'' {
            let text = self.scan_delimited('\'');
            let value = text.chars().next().unwrap_or('\0');
            return self.finish(begin, TokenKind::Character, Some(TokenValue::Char(value)));
        }

        if ch == '#' {
            if self.stream.starts_with(syntax::DIRECTIVE_INCLUDE)
                && !self
                    .stream
                    .peek_nth(syntax::DIRECTIVE_INCLUDE.len())
                    .is_some_and(syntax::is_ident_continue)
            {
                self.stream.advance_by(syntax::DIRECTIVE_INCLUDE.len());
                return self.finish(begin, TokenKind::Include, None);
            }
            if self.stream.peek_nth(1) == Some('\'') {
                self.stream.advance();
                let text = self.scan_delimited('\'');
                return self.finish(begin, TokenKind::Symbol, Some(TokenValue::Text(text)));
            }
        }

        if ch.is_ascii_digit() {
            return self.scan_number(begin);
        }

        if syntax::is_ident_start(ch) {
            let word = self.stream.advance_while(syntax::is_ident_continue);
            if let Some(kind) = syntax::keyword(word) {
                return self.finish(begin, kind, None);
            }
            let value = TokenValue::Text(word.to_string());
            return self.finish(begin, TokenKind::Identifier, Some(value));
        }

        if let Some((kind, len)) = self.match_symbol() {
            self.stream.advance_by(len);
            return self.finish(begin, kind, None);
        }

        // Unknown characters still make progress as one-character identifiers.
        self.stream.advance();
        let text = self.stream.slice(begin, self.stream.position()).to_string();
        tracing::trace!(offset = begin, text = %text, "unrecognized character");
        self.finish(begin, TokenKind::Identifier, Some(TokenValue::Text(text)))
    }

    fn match_symbol(&self) -> Option<(TokenKind, usize)> {
        let first = self.stream.peek()?;
        let second = self.stream.peek_nth(1);
        let third = self.stream.peek_nth(2);
        if let (Some(second), Some(third)) = (second, third) {
            for (needle, kind) in syntax::SYMBOLS_3 {
                if needle[0] == first && needle[1] == second && needle[2] == third {
                    return Some((*kind, 3));
                }
            }
        }
        if let Some(second) = second {
            for (needle, kind) in syntax::SYMBOLS_2 {
                if needle[0] == first && needle[1] == second {
                    return Some((*kind, 2));
                }
            }
        }
        syntax::SYMBOLS_1
            .iter()
            .find(|(needle, _)| *needle == first)
            .map(|(_, kind)| (*kind, 1))
    }

    /// Scans a literal opened by `delimiter` and returns its decoded content.
    /// Literals stop at the end of the line when the delimiter never shows up.
    fn scan_delimited(&mut self, delimiter: char) -> String {
        self.stream.advance();
        let mut out = String::new();
        while let Some(ch) = self.stream.peek() {
            if ch == '\n' {
                break;
            }
            self.stream.advance();
            if ch == delimiter {
                break;
            }
            if ch == '\\' {
                match self.stream.peek() {
                    Some('\n') | None => out.push('\\'),
                    Some(escaped) => {
                        self.stream.advance();
                        out.push(decode_escape(escaped));
                    }
                }
                continue;
            }
            out.push(ch);
        }
        out
    }

    fn scan_number(&mut self, begin: usize) -> Token {
        if self.stream.starts_with("0x") || self.stream.starts_with("0X") {
            self.stream.advance_by(2);
            let digits = self.stream.advance_while(|ch| ch.is_ascii_hexdigit());
            let value = i64::from_str_radix(digits, 16).unwrap_or(0);
            return self.finish(begin, TokenKind::Int, Some(TokenValue::Int(value)));
        }

        self.stream.advance_while(|ch| ch.is_ascii_digit());
        let is_float = self.stream.peek() == Some('.')
            && self.stream.peek_nth(1).is_some_and(|ch| ch.is_ascii_digit());
        if is_float {
            self.stream.advance();
            self.stream.advance_while(|ch| ch.is_ascii_digit());
        }
        let text = self.stream.slice(begin, self.stream.position());
        if let Ok(value) = text.parse::<i64>() {
            return self.finish(begin, TokenKind::Int, Some(TokenValue::Int(value)));
        }
        match text.parse::<f64>() {
            Ok(value) if is_float => {
                self.finish(begin, TokenKind::Float, Some(TokenValue::Float(value)))
            }
            _ => self.finish(begin, TokenKind::Int, Some(TokenValue::Int(0))),
        }
    }

    fn finish(&self, begin: usize, kind: TokenKind, value: Option<TokenValue>) -> Token {
        Token {
            begin,
            end: self.stream.position(),
            kind,
            value,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}

fn decode_escape(ch: char) -> char {
    match ch {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        '0' => '\0',
        'e' => '\u{1b}',
        other => other,
    }
}

/// Tokenizes the whole text, EOF token included.
pub fn lex(text: &str, options: LexOptions) -> Vec<Token> {
    Lexer::new(text, options).collect()
}
