use crate::ast::{BasicKind, Expected, Node, NodeKind};
use crate::lexer::TokenKind;

use super::Parser;

impl Parser<'_> {
    pub(super) fn starts_parenthesized_type(&self) -> bool {
        self.check(TokenKind::LeftParen) && self.next.kind.is_type_keyword()
    }

    /// A type: basic keywords composed into arrays, function references and
    /// or-types.
    pub(super) fn parse_type(&mut self) -> Node {
        self.nested(Expected::Type, Self::parse_or_type)
    }

    fn parse_or_type(&mut self) -> Node {
        let mut ty = self.parse_type_postfix();
        while self.can_extend(&ty) && self.eat(TokenKind::Pipe).is_some() {
            let rhs = self.parse_type_postfix();
            ty = Node::new(
                ty.begin,
                rhs.end,
                NodeKind::OrType {
                    lhs: Box::new(ty),
                    rhs: Box::new(rhs),
                },
            );
        }
        ty
    }

    /// `T[]`, `T*` and `T(params)` suffixes, applied left to right.
    fn parse_type_postfix(&mut self) -> Node {
        let mut ty = self.parse_type_atom();
        while self.can_extend(&ty) {
            let bracketed =
                self.check(TokenKind::LeftBracket) && self.next.kind == TokenKind::RightBracket;
            if bracketed || self.check(TokenKind::Star) {
                self.advance();
                if bracketed {
                    self.advance();
                }
                ty = Node::new(
                    ty.begin,
                    self.previous.end,
                    NodeKind::ArrayType {
                        element: Box::new(ty),
                    },
                );
            } else if self.check(TokenKind::LeftParen) {
                ty = self.parse_function_reference(ty);
            } else {
                break;
            }
        }
        ty
    }

    fn parse_function_reference(&mut self, return_type: Node) -> Node {
        self.advance();
        let mut parameters = Vec::new();
        let mut variadic = false;
        while !self.check(TokenKind::RightParen) && !self.at_end() {
            if self.eat(TokenKind::Ellipsis).is_some() {
                variadic = true;
                break;
            }
            parameters.push(self.parse_type());
            if self.eat(TokenKind::Ellipsis).is_some() {
                variadic = true;
                break;
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let mut holes = Vec::new();
        self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
        let node = Node::new(
            return_type.begin,
            self.previous.end,
            NodeKind::FunctionReferenceType {
                return_type: Box::new(return_type),
                parameters,
                variadic,
            },
        );
        Node::combine(node, holes)
    }

    fn parse_type_atom(&mut self) -> Node {
        if self.check(TokenKind::LeftParen) {
            self.advance();
            let inner = self.parse_type();
            let mut holes = Vec::new();
            self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
            return Node::combine(inner, holes);
        }
        let Some(kind) = BasicKind::from_token(self.current.kind) else {
            return self.hole(Expected::Type);
        };
        let keyword = self.advance();
        let mut holes = Vec::new();
        let mut type_file = None;
        if kind.takes_type_file() && self.eat(TokenKind::Less).is_some() {
            let path = self.parse_string_path();
            match &path.kind {
                NodeKind::StringLiteral(text) => type_file = Some(text.clone()),
                NodeKind::StringConcatenation { parts } => {
                    type_file = Some(
                        parts
                            .iter()
                            .filter_map(|part| match &part.kind {
                                NodeKind::StringLiteral(text) => Some(text.as_str()),
                                _ => None,
                            })
                            .collect(),
                    );
                }
                _ => holes.push(path),
            }
            self.expect(TokenKind::Greater, Expected::Greater, &mut holes);
        }
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::BasicType { kind, type_file },
        );
        Node::combine(node, holes)
    }
}
