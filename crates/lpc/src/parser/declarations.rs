use crate::ast::{Expected, Modifier, Node, NodeKind};
use crate::lexer::TokenKind;
use crate::syntax;

use super::{starts_declaration, Parser};

impl Parser<'_> {
    pub(super) fn parse_top_level(&mut self) -> Node {
        match self.current.kind {
            TokenKind::Include => self.parse_include(),
            TokenKind::Inherit => self.parse_inherit(),
            TokenKind::Class => self.parse_class(),
            TokenKind::Semicolon => {
                let token = self.advance();
                Node::new(token.begin, token.end, NodeKind::Empty)
            }
            _ => self.parse_declaration(),
        }
    }

    /// `#include "path"`; the directive takes no semicolon.
    fn parse_include(&mut self) -> Node {
        let keyword = self.advance();
        let path = self.parse_string_path();
        Node::new(
            keyword.begin,
            keyword.end,
            NodeKind::Include {
                path: Box::new(path),
            },
        )
    }

    fn parse_inherit(&mut self) -> Node {
        let keyword = self.advance();
        let path = self.parse_string_path();
        let mut holes = Vec::new();
        self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::Inherit {
                path: Box::new(path),
            },
        );
        Node::combine(node, holes)
    }

    /// `class Name { ... }` or the shorthand `class Name "path";`.
    fn parse_class(&mut self) -> Node {
        let keyword = self.advance();
        let name = self.expect_name();
        let mut holes = Vec::new();
        let mut inherits = None;
        let mut body = Vec::new();
        if self.check(TokenKind::String) {
            inherits = Some(Box::new(self.parse_strings()));
            self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
        } else if self
            .expect(TokenKind::LeftBrace, Expected::LeftBrace, &mut holes)
            .is_some()
        {
            while !self.check(TokenKind::RightBrace) && !self.at_end() {
                let mark = self.mark();
                let member = self.nested(Expected::Declaration, Self::parse_top_level);
                body.push(self.ensure_progress(mark, member));
            }
            self.expect(TokenKind::RightBrace, Expected::RightBrace, &mut holes);
            self.eat(TokenKind::Semicolon);
        }
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::Class {
                name: Box::new(name),
                inherits,
                body,
            },
        );
        Node::combine(node, holes)
    }

    pub(super) fn parse_modifiers(&mut self) -> Option<Node> {
        let begin = self.current.begin;
        let mut modifiers = Vec::new();
        while let Some(modifier) = Modifier::from_token(self.current.kind) {
            self.advance();
            modifiers.push(modifier);
        }
        if modifiers.is_empty() {
            return None;
        }
        Some(Node::new(
            begin,
            self.previous.end,
            NodeKind::Modifiers { modifiers },
        ))
    }

    /// A variable or function declaration, with optional modifiers.
    pub(super) fn parse_declaration(&mut self) -> Node {
        let begin = self.current.begin;
        if !starts_declaration(self.current.kind) && !self.starts_parenthesized_type() {
            if self.at_end() {
                return Node::missing(self.previous.end, Expected::Declaration);
            }
            return self.wrong_current(Expected::Declaration);
        }
        let modifiers = self.parse_modifiers().map(Box::new);
        if self.check(TokenKind::Let) {
            return self.parse_let(begin, modifiers, true);
        }
        let ty = self.parse_type();
        let name = self.parse_declared_name();
        if self.check(TokenKind::LeftParen) {
            return self.parse_function_rest(begin, modifiers, ty, name);
        }
        let mut holes = Vec::new();
        let value = self.parse_initializer();
        self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
        let node = Node::new(
            begin,
            self.previous.end,
            NodeKind::VariableDefinition {
                modifiers,
                ty: Some(Box::new(ty)),
                name: Box::new(name),
                value,
                inferred: false,
            },
        );
        Node::combine(node, holes)
    }

    /// `let name [: type] [= value]`, with the trailing `;` when `terminated`.
    pub(super) fn parse_let(
        &mut self,
        begin: usize,
        modifiers: Option<Box<Node>>,
        terminated: bool,
    ) -> Node {
        self.advance();
        let name = self.expect_name();
        // In `foreach (let x : values)` the colon separates the iterable.
        let annotated = self.check(TokenKind::Colon)
            && (terminated || self.next.kind.is_type_keyword());
        let ty = if annotated {
            self.advance();
            Some(Box::new(self.parse_type()))
        } else {
            None
        };
        let value = if terminated {
            self.parse_initializer()
        } else {
            None
        };
        let mut holes = Vec::new();
        if terminated {
            self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
        }
        let inferred = ty.is_none();
        let node = Node::new(
            begin,
            self.previous.end,
            NodeKind::VariableDefinition {
                modifiers,
                ty,
                name: Box::new(name),
                value,
                inferred,
            },
        );
        Node::combine(node, holes)
    }

    /// `type name` without initializer or terminator, as used by `foreach`
    /// and `catch`.
    pub(super) fn parse_bare_variable(&mut self) -> Node {
        let begin = self.current.begin;
        if self.check(TokenKind::Let) {
            return self.parse_let(begin, None, false);
        }
        let ty = self.parse_type();
        let name = self.expect_name();
        Node::new(
            begin,
            self.previous.end,
            NodeKind::VariableDefinition {
                modifiers: None,
                ty: Some(Box::new(ty)),
                name: Box::new(name),
                value: None,
                inferred: false,
            },
        )
    }

    fn parse_initializer(&mut self) -> Option<Box<Node>> {
        self.eat(TokenKind::Assign)?;
        Some(Box::new(self.parse_expression()))
    }

    /// A plain name, or `operator` followed by an overloadable operator.
    fn parse_declared_name(&mut self) -> Node {
        let Some(keyword) = self.eat(TokenKind::Operator) else {
            return self.expect_name();
        };
        let kind = self.current.kind;
        if !syntax::OVERLOADABLE_OPERATORS.contains(&kind) {
            return self.hole(Expected::Operator);
        }
        self.advance();
        let mut text = syntax::symbol_text(kind).unwrap_or_default();
        let closer = match kind {
            TokenKind::LeftBracket => Some(TokenKind::RightBracket),
            TokenKind::LeftParen => Some(TokenKind::RightParen),
            _ => None,
        };
        let mut holes = Vec::new();
        if let Some(closer) = closer {
            let expected = if closer == TokenKind::RightBracket {
                Expected::RightBracket
            } else {
                Expected::RightParen
            };
            if self.expect(closer, expected, &mut holes).is_some() {
                text.push_str(&syntax::symbol_text(closer).unwrap_or_default());
            }
        }
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::Name {
                name: format!("operator{text}"),
            },
        );
        Node::combine(node, holes)
    }

    fn parse_function_rest(
        &mut self,
        begin: usize,
        modifiers: Option<Box<Node>>,
        return_type: Node,
        name: Node,
    ) -> Node {
        let mut holes = Vec::new();
        self.advance();
        let (parameters, variadic) = self.parse_parameters();
        self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
        let body = if self.check(TokenKind::LeftBrace) {
            Some(Box::new(self.parse_block()))
        } else {
            self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
            None
        };
        let node = Node::new(
            begin,
            self.previous.end,
            NodeKind::FunctionDefinition {
                modifiers,
                return_type: Box::new(return_type),
                name: Box::new(name),
                parameters,
                variadic,
                body,
            },
        );
        Node::combine(node, holes)
    }

    /// Parameters up to, not including, the closing parenthesis.
    fn parse_parameters(&mut self) -> (Vec<Node>, bool) {
        let mut parameters = Vec::new();
        let mut variadic = false;
        loop {
            if self.check(TokenKind::RightParen) || self.at_end() {
                break;
            }
            if self.eat(TokenKind::Ellipsis).is_some() {
                variadic = true;
                break;
            }
            parameters.push(self.parse_parameter());
            if self.eat(TokenKind::Ellipsis).is_some() {
                variadic = true;
                break;
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        (parameters, variadic)
    }

    fn parse_parameter(&mut self) -> Node {
        let begin = self.current.begin;
        if !self.current.kind.is_type_keyword() && !self.starts_parenthesized_type() {
            return self.hole(Expected::Type);
        }
        let ty = self.parse_type();
        let name = self
            .eat(TokenKind::Identifier)
            .map(|token| Box::new(self.name_node(&token)));
        Node::new(
            begin,
            self.previous.end,
            NodeKind::Parameter {
                ty: Box::new(ty),
                name,
            },
        )
    }
}
