use serde::Serialize;

use crate::ast::{collect_holes, Expected, Node, NodeKind};
use crate::lexer::{LexOptions, Lexer, Token, TokenKind};

mod declarations;
mod expressions;
mod statements;
mod types;


/// Deepest nesting of statements, expressions and types the parser descends
/// into before it turns the rest of the construct into holes.
pub const MAX_DEPTH: usize = 64;

/// Tallest node an operator, postfix or type chain may grow before the
/// parser stops extending it. Together with [`MAX_DEPTH`] this bounds the
/// height of every tree, so recursive walks over it fit a thread stack.
pub const MAX_HEIGHT: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ParseOptions {
    pub lex: LexOptions,
}

impl ParseOptions {
    /// Keeps comments so the highlighter can style them.
    pub fn editor() -> Self {
        Self {
            lex: LexOptions {
                emit_comments: true,
            },
        }
    }

    pub fn interpretation() -> Self {
        Self {
            lex: LexOptions {
                emit_comments: false,
            },
        }
    }
}

/// A parsed file: the node forest plus the trivia the highlighter needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parsed {
    pub nodes: Vec<Node>,
    pub comments: Vec<Token>,
    pub keywords: Vec<Token>,
}

impl Parsed {
    pub fn holes(&self) -> Vec<&Node> {
        collect_holes(&self.nodes)
    }

    pub fn has_holes(&self) -> bool {
        !self.holes().is_empty()
    }
}

pub fn parse_source(text: &str, options: ParseOptions) -> Parsed {
    let mut parser = Parser::new(text, options);
    let nodes = parser.parse(TokenKind::Eof);
    parser.finish(nodes)
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    previous: Token,
    current: Token,
    next: Token,
    comments: Vec<Token>,
    keywords: Vec<Token>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str, options: ParseOptions) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(text, options.lex),
            previous: Token::eof(0),
            current: Token::eof(0),
            next: Token::eof(0),
            comments: Vec::new(),
            keywords: Vec::new(),
            depth: 0,
        };
        parser.current = parser.pull();
        parser.next = parser.pull();
        parser
    }

    /// Parses top-level constructs until `until` or the end of the input.
    /// Never fails: broken input shows up as holes in the returned forest.
    pub fn parse(&mut self, until: TokenKind) -> Vec<Node> {
        let mut nodes = Vec::new();
        while !self.check(until) && !self.at_end() {
            let mark = self.mark();
            let node = self.parse_top_level();
            nodes.push(self.ensure_progress(mark, node));
        }
        nodes
    }

    pub fn finish(self, nodes: Vec<Node>) -> Parsed {
        Parsed {
            nodes,
            comments: self.comments,
            keywords: self.keywords,
        }
    }

    fn pull(&mut self) -> Token {
        loop {
            let token = self.lexer.next_token();
            if token.kind.is_comment() {
                self.comments.push(token);
                continue;
            }
            return token;
        }
    }

    fn advance(&mut self) -> Token {
        let upcoming = self.pull();
        let current = std::mem::replace(&mut self.next, upcoming);
        let consumed = std::mem::replace(&mut self.current, current);
        if consumed.kind.is_keyword() {
            self.keywords.push(consumed.clone());
        }
        self.previous = consumed.clone();
        consumed
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consumes `kind` or records a hole for it. After a Wrong hole the
    /// expected token is still taken when it follows directly.
    fn expect(
        &mut self,
        kind: TokenKind,
        expected: Expected,
        holes: &mut Vec<Node>,
    ) -> Option<Token> {
        if let Some(token) = self.eat(kind) {
            return Some(token);
        }
        let hole = self.hole(expected);
        let consumed = matches!(hole.kind, NodeKind::Wrong { .. });
        holes.push(hole);
        if consumed {
            return self.eat(kind);
        }
        None
    }

    /// Missing at the gap when the current token is a sync point, otherwise
    /// Wrong over the current token, which is consumed.
    fn hole(&mut self, expected: Expected) -> Node {
        if self.at_sync_point() {
            Node::missing(self.previous.end, expected)
        } else {
            self.wrong_current(expected)
        }
    }

    fn wrong_current(&mut self, expected: Expected) -> Node {
        let token = self.advance();
        tracing::trace!(
            offset = token.begin,
            found = %token.kind,
            expected = %expected,
            "skipping unexpected token"
        );
        Node::wrong(token.begin, token.end, expected, token.kind)
    }

    fn at_sync_point(&self) -> bool {
        is_sync(self.current.kind)
    }

    fn mark(&self) -> (usize, TokenKind) {
        (self.current.begin, self.current.kind)
    }

    /// Guards loops: when a production left the same token in place, that
    /// token is consumed as Wrong so the loop always advances.
    fn ensure_progress(&mut self, mark: (usize, TokenKind), node: Node) -> Node {
        if self.at_end() || self.mark() != mark {
            return node;
        }
        let wrong = self.wrong_current(Expected::Statement);
        Node::combine(node, vec![wrong])
    }

    /// Runs `parse` one nesting level deeper, or gives up with a hole once
    /// the depth limit is reached.
    fn nested(
        &mut self,
        expected: Expected,
        parse: impl FnOnce(&mut Self) -> Node,
    ) -> Node {
        if self.depth >= MAX_DEPTH {
            tracing::trace!(offset = self.current.begin, "nesting limit reached");
            if self.at_end() {
                return Node::missing(self.previous.end, expected);
            }
            return self.wrong_current(expected);
        }
        self.depth += 1;
        let node = parse(self);
        self.depth -= 1;
        node
    }

    /// Whether a chain may wrap `node` in one more level.
    fn can_extend(&self, node: &Node) -> bool {
        if node.height() < MAX_HEIGHT {
            return true;
        }
        tracing::trace!(offset = self.current.begin, "chain height limit reached");
        false
    }

    fn name_node(&self, token: &Token) -> Node {
        Node::new(
            token.begin,
            token.end,
            NodeKind::Name {
                name: token.text().unwrap_or_default().to_string(),
            },
        )
    }

    /// An identifier as a Name node, or a hole.
    fn expect_name(&mut self) -> Node {
        match self.eat(TokenKind::Identifier) {
            Some(token) => self.name_node(&token),
            None => self.hole(Expected::Name),
        }
    }

    /// One string literal or several adjacent ones, or a hole.
    fn parse_string_path(&mut self) -> Node {
        if self.check(TokenKind::String) {
            return self.parse_strings();
        }
        self.hole(Expected::String)
    }

    fn parse_strings(&mut self) -> Node {
        let mut parts = Vec::new();
        while let Some(token) = self.eat(TokenKind::String) {
            parts.push(Node::new(
                token.begin,
                token.end,
                NodeKind::StringLiteral(token.text().unwrap_or_default().to_string()),
            ));
        }
        if parts.len() == 1 {
            if let Some(single) = parts.pop() {
                return single;
            }
        }
        let begin = parts.first().map_or(self.previous.end, |part| part.begin);
        Node::new(begin, begin, NodeKind::StringConcatenation { parts })
    }
}

fn is_sync(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eof
            | TokenKind::Semicolon
            | TokenKind::RightBrace
            | TokenKind::RightParen
            | TokenKind::RightBracket
    ) || starts_statement(kind)
        || starts_declaration(kind)
}

fn starts_statement(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LeftBrace
            | TokenKind::If
            | TokenKind::Else
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::For
            | TokenKind::Foreach
            | TokenKind::Switch
            | TokenKind::Case
            | TokenKind::Default
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Return
            | TokenKind::Try
            | TokenKind::Catch
    )
}

fn starts_declaration(kind: TokenKind) -> bool {
    kind.is_type_keyword()
        || kind.is_modifier()
        || matches!(
            kind,
            TokenKind::Let | TokenKind::Inherit | TokenKind::Class | TokenKind::Include
        )
}
