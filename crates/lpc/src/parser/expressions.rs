use crate::ast::{Access, BinaryOp, Expected, Node, NodeKind, UnaryOp};
use crate::lexer::{TokenKind, TokenValue};

use super::Parser;

const LOGICAL_OR: u8 = 11;

/// Binding strength of a binary operator token; smaller binds tighter.
fn binary_priority(kind: TokenKind) -> Option<u8> {
    let priority = match kind {
        TokenKind::LogicalOr => LOGICAL_OR,
        TokenKind::LogicalAnd => 10,
        TokenKind::Pipe => 9,
        TokenKind::Caret => 8,
        TokenKind::Ampersand => 7,
        TokenKind::Equal | TokenKind::NotEqual => 6,
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => 5,
        TokenKind::ShiftLeft | TokenKind::ShiftRight => 4,
        TokenKind::Plus | TokenKind::Minus => 3,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 2,
        _ => return None,
    };
    Some(priority)
}

impl Parser<'_> {
    pub(super) fn parse_expression(&mut self) -> Node {
        self.nested(Expected::Expression, Self::parse_assignment)
    }

    /// Assignments are right associative and bind loosest.
    fn parse_assignment(&mut self) -> Node {
        let target = self.parse_ternary();
        let Some(op) = BinaryOp::from_token(self.current.kind).filter(|op| op.is_assignment())
        else {
            return target;
        };
        self.advance();
        let value = self.parse_expression();
        binary(op, target, value)
    }

    fn parse_ternary(&mut self) -> Node {
        let condition = self.parse_binary(LOGICAL_OR);
        if self.eat(TokenKind::Question).is_none() {
            return condition;
        }
        let then_value = self.parse_expression();
        let mut holes = Vec::new();
        self.expect(TokenKind::Colon, Expected::Colon, &mut holes);
        let else_value = self.nested(Expected::Expression, Self::parse_ternary);
        let node = Node::new(
            condition.begin,
            else_value.end,
            NodeKind::Ternary {
                condition: Box::new(condition),
                then_value: Box::new(then_value),
                else_value: Box::new(else_value),
            },
        );
        Node::combine(node, holes)
    }

    /// Precedence climbing over the binary operators up to `max_priority`.
    fn parse_binary(&mut self, max_priority: u8) -> Node {
        let mut lhs = self.parse_type_test();
        while let Some(priority) = binary_priority(self.current.kind) {
            if priority > max_priority || !self.can_extend(&lhs) {
                break;
            }
            let Some(op) = BinaryOp::from_token(self.current.kind) else {
                break;
            };
            self.advance();
            let rhs = self.nested(Expected::Expression, |parser| {
                parser.parse_binary(priority - 1)
            });
            lhs = binary(op, lhs, rhs);
        }
        lhs
    }

    /// `value is type`, binding tighter than every binary operator.
    fn parse_type_test(&mut self) -> Node {
        let mut value = self.parse_unary();
        while self.can_extend(&value) && self.eat(TokenKind::Is).is_some() {
            let ty = self.parse_type();
            value = Node::new(
                value.begin,
                ty.end,
                NodeKind::TypeTest {
                    value: Box::new(value),
                    ty: Box::new(ty),
                },
            );
        }
        value
    }

    fn parse_unary(&mut self) -> Node {
        self.nested(Expected::Expression, Self::parse_unary_inner)
    }

    fn parse_unary_inner(&mut self) -> Node {
        if let Some(op) = UnaryOp::prefix(self.current.kind) {
            let token = self.advance();
            let operand = self.parse_unary();
            return Node::new(
                token.begin,
                operand.end,
                NodeKind::UnaryOperation {
                    op,
                    operand: Box::new(operand),
                },
            );
        }
        if self.starts_parenthesized_type() {
            return self.parse_cast();
        }
        let primary = self.parse_primary();
        self.parse_postfix(primary)
    }

    fn parse_cast(&mut self) -> Node {
        let open = self.advance();
        let ty = self.parse_type();
        let mut holes = Vec::new();
        self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
        let value = self.parse_unary();
        let node = Node::new(
            open.begin,
            value.end,
            NodeKind::Cast {
                ty: Box::new(ty),
                value: Box::new(value),
            },
        );
        Node::combine(node, holes)
    }

    fn parse_postfix(&mut self, mut target: Node) -> Node {
        while self.can_extend(&target) {
            target = match self.current.kind {
                TokenKind::LeftParen => {
                    self.advance();
                    let mut holes = Vec::new();
                    let arguments = self.parse_arguments(TokenKind::RightParen);
                    self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
                    let node = Node::new(
                        target.begin,
                        self.previous.end,
                        NodeKind::FunctionCall {
                            callee: Box::new(target),
                            arguments,
                        },
                    );
                    Node::combine(node, holes)
                }
                TokenKind::LeftBracket => self.parse_subscript(target),
                TokenKind::Arrow | TokenKind::Dot => {
                    let token = self.advance();
                    let access = if token.kind == TokenKind::Arrow {
                        Access::Arrow
                    } else {
                        Access::Dot
                    };
                    let name = self.expect_name();
                    Node::new(
                        target.begin,
                        self.previous.end,
                        NodeKind::MemberAccess {
                            receiver: Box::new(target),
                            access,
                            name: Box::new(name),
                        },
                    )
                }
                TokenKind::Increment | TokenKind::Decrement => {
                    let token = self.advance();
                    let op = if token.kind == TokenKind::Increment {
                        UnaryOp::PostIncrement
                    } else {
                        UnaryOp::PostDecrement
                    };
                    Node::new(
                        target.begin,
                        token.end,
                        NodeKind::UnaryOperation {
                            op,
                            operand: Box::new(target),
                        },
                    )
                }
                _ => break,
            };
        }
        target
    }

    /// `target[index]`, `target[a..b]`, `target[..b]` or `target[a..]`.
    fn parse_subscript(&mut self, target: Node) -> Node {
        self.advance();
        let mut holes = Vec::new();
        let begin = self.current.begin;
        let lower = if self.check(TokenKind::Range) {
            None
        } else {
            Some(self.parse_expression())
        };
        let index = match lower {
            Some(lower) if !self.check(TokenKind::Range) => lower,
            lower => {
                self.advance();
                let upper = if self.check(TokenKind::RightBracket) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()))
                };
                Node::new(
                    begin,
                    self.previous.end,
                    NodeKind::Range {
                        lower: lower.map(Box::new),
                        upper,
                    },
                )
            }
        };
        self.expect(TokenKind::RightBracket, Expected::RightBracket, &mut holes);
        let node = Node::new(
            target.begin,
            self.previous.end,
            NodeKind::Subscript {
                target: Box::new(target),
                index: Box::new(index),
            },
        );
        Node::combine(node, holes)
    }

    /// Comma separated expressions up to, not including, `closer`.
    fn parse_arguments(&mut self, closer: TokenKind) -> Vec<Node> {
        let mut arguments = Vec::new();
        while !self.check(closer) && !self.at_end() {
            arguments.push(self.parse_expression());
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        arguments
    }

    fn parse_primary(&mut self) -> Node {
        let begin = self.current.begin;
        let kind = match self.current.kind {
            TokenKind::Identifier => return self.parse_scope_chain(),
            TokenKind::Scope => return self.parse_scope_chain(),
            TokenKind::String => return self.parse_strings(),
            TokenKind::LeftParen => return self.parse_parenthesized(),
            TokenKind::ArrayOpen => return self.parse_array(),
            TokenKind::MappingOpen => return self.parse_mapping(),
            TokenKind::New => return self.parse_new(),
            TokenKind::Int => match self.current.value {
                Some(TokenValue::Int(value)) => NodeKind::IntLiteral(value),
                _ => NodeKind::IntLiteral(0),
            },
            TokenKind::Float => match self.current.value {
                Some(TokenValue::Float(value)) => NodeKind::FloatLiteral(value),
                _ => NodeKind::FloatLiteral(0.0),
            },
            TokenKind::Character => match self.current.value {
                Some(TokenValue::Char(value)) => NodeKind::CharLiteral(value),
                _ => NodeKind::CharLiteral('\0'),
            },
            TokenKind::Symbol => {
                NodeKind::SymbolLiteral(self.current.text().unwrap_or_default().to_string())
            }
            TokenKind::True => NodeKind::BoolLiteral(true),
            TokenKind::False => NodeKind::BoolLiteral(false),
            TokenKind::Nil => NodeKind::Nil,
            TokenKind::This => NodeKind::This,
            _ => return self.hole(Expected::Expression),
        };
        let token = self.advance();
        Node::new(begin, token.end, kind)
    }

    /// `name`, `a::b::c` or `::name`.
    fn parse_scope_chain(&mut self) -> Node {
        let mut scope = self
            .eat(TokenKind::Identifier)
            .map(|token| self.name_node(&token));
        while scope.as_ref().map_or(true, |scope| self.can_extend(scope))
            && self.check(TokenKind::Scope)
        {
            let separator = self.advance();
            let name = self.expect_name();
            let begin = scope.as_ref().map_or(separator.begin, |scope| scope.begin);
            scope = Some(Node::new(
                begin,
                self.previous.end,
                NodeKind::ScopeChain {
                    scope: scope.map(Box::new),
                    name: Box::new(name),
                },
            ));
        }
        scope.unwrap_or_else(|| self.hole(Expected::Name))
    }

    fn parse_parenthesized(&mut self) -> Node {
        self.advance();
        let inner = self.parse_expression();
        let mut holes = Vec::new();
        self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
        Node::combine(inner, holes)
    }

    /// `({ a, b, c })`
    fn parse_array(&mut self) -> Node {
        let open = self.advance();
        let items = self.parse_arguments(TokenKind::RightBrace);
        let mut holes = Vec::new();
        self.expect(TokenKind::RightBrace, Expected::RightBrace, &mut holes);
        self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
        let node = Node::new(
            open.begin,
            self.previous.end,
            NodeKind::ArrayLiteral { items },
        );
        Node::combine(node, holes)
    }

    /// `([ key: value, ... ])`
    fn parse_mapping(&mut self) -> Node {
        let open = self.advance();
        let mut entries = Vec::new();
        while !self.check(TokenKind::RightBracket) && !self.at_end() {
            let key = self.parse_expression();
            let mut entry_holes = Vec::new();
            self.expect(TokenKind::Colon, Expected::Colon, &mut entry_holes);
            let value = self.parse_expression();
            let entry = Node::new(
                key.begin,
                value.end,
                NodeKind::MappingEntry {
                    key: Box::new(key),
                    value: Box::new(value),
                },
            );
            entries.push(Node::combine(entry, entry_holes));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let mut holes = Vec::new();
        self.expect(TokenKind::RightBracket, Expected::RightBracket, &mut holes);
        self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
        let node = Node::new(
            open.begin,
            self.previous.end,
            NodeKind::MappingLiteral { entries },
        );
        Node::combine(node, holes)
    }

    /// `new(target, args...)`; the target may be a type or an expression.
    fn parse_new(&mut self) -> Node {
        let keyword = self.advance();
        let mut holes = Vec::new();
        self.expect(TokenKind::LeftParen, Expected::LeftParen, &mut holes);
        let target = if self.current.kind.is_type_keyword() {
            self.parse_type()
        } else {
            self.parse_expression()
        };
        let arguments = if self.eat(TokenKind::Comma).is_some() {
            self.parse_arguments(TokenKind::RightParen)
        } else {
            Vec::new()
        };
        self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::New {
                target: Box::new(target),
                arguments,
            },
        );
        Node::combine(node, holes)
    }
}

fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Node {
    Node::new(
        lhs.begin,
        rhs.end,
        NodeKind::BinaryOperation {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    )
}
