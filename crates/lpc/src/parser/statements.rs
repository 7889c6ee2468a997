use crate::ast::{Expected, Node, NodeKind};
use crate::lexer::TokenKind;

use super::{starts_declaration, Parser};

impl Parser<'_> {
    pub(super) fn parse_statement(&mut self) -> Node {
        self.nested(Expected::Statement, Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Node {
        match self.current.kind {
            TokenKind::LeftBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break | TokenKind::Continue => self.parse_jump(),
            TokenKind::Semicolon => {
                let token = self.advance();
                Node::new(token.begin, token.end, NodeKind::Empty)
            }
            TokenKind::Class => self.parse_top_level(),
            kind if starts_declaration(kind) => self.parse_declaration(),
            _ => self.parse_expression_statement(),
        }
    }

    pub(super) fn parse_block(&mut self) -> Node {
        let open = self.advance();
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.at_end() {
            let mark = self.mark();
            let statement = self.parse_statement();
            statements.push(self.ensure_progress(mark, statement));
        }
        let mut holes = Vec::new();
        self.expect(TokenKind::RightBrace, Expected::RightBrace, &mut holes);
        let node = Node::new(
            open.begin,
            self.previous.end,
            NodeKind::Block { statements },
        );
        Node::combine(node, holes)
    }

    fn parse_expression_statement(&mut self) -> Node {
        let value = self.parse_expression();
        let mut holes = Vec::new();
        self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
        Node::combine(value, holes)
    }

    /// `( expression )` as used by `if`, `while` and `switch`.
    fn parse_condition(&mut self, holes: &mut Vec<Node>) -> Node {
        self.expect(TokenKind::LeftParen, Expected::LeftParen, holes);
        let condition = self.parse_expression();
        self.expect(TokenKind::RightParen, Expected::RightParen, holes);
        condition
    }

    fn parse_if(&mut self) -> Node {
        let keyword = self.advance();
        let mut holes = Vec::new();
        let condition = self.parse_condition(&mut holes);
        let then_branch = self.parse_statement();
        let else_branch = self
            .eat(TokenKind::Else)
            .map(|_| Box::new(self.parse_statement()));
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch,
            },
        );
        Node::combine(node, holes)
    }

    fn parse_while(&mut self) -> Node {
        let keyword = self.advance();
        let mut holes = Vec::new();
        let condition = self.parse_condition(&mut holes);
        let body = self.parse_statement();
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
        );
        Node::combine(node, holes)
    }

    fn parse_do_while(&mut self) -> Node {
        let keyword = self.advance();
        let body = self.parse_statement();
        let mut holes = Vec::new();
        self.expect(TokenKind::While, Expected::While, &mut holes);
        let condition = self.parse_condition(&mut holes);
        self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::DoWhile {
                body: Box::new(body),
                condition: Box::new(condition),
            },
        );
        Node::combine(node, holes)
    }

    fn parse_for(&mut self) -> Node {
        let keyword = self.advance();
        let mut holes = Vec::new();
        self.expect(TokenKind::LeftParen, Expected::LeftParen, &mut holes);
        let initializer = if self.eat(TokenKind::Semicolon).is_some() {
            None
        } else if starts_declaration(self.current.kind) {
            // Declarations consume their own semicolon.
            Some(Box::new(self.parse_declaration()))
        } else {
            let initializer = self.parse_expression();
            self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
            Some(Box::new(initializer))
        };
        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()))
        };
        self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
        let step = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()))
        };
        self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
        let body = self.parse_statement();
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::For {
                initializer,
                condition,
                step,
                body: Box::new(body),
            },
        );
        Node::combine(node, holes)
    }

    /// `foreach (decl : values) body`, where `values` may be a range.
    fn parse_foreach(&mut self) -> Node {
        let keyword = self.advance();
        let mut holes = Vec::new();
        self.expect(TokenKind::LeftParen, Expected::LeftParen, &mut holes);
        let variable = if starts_declaration(self.current.kind) {
            self.parse_bare_variable()
        } else {
            self.parse_expression()
        };
        self.expect(TokenKind::Colon, Expected::Colon, &mut holes);
        let lower = self.parse_expression();
        let iterable = if self.check(TokenKind::Range) {
            self.advance();
            let upper = self.parse_expression();
            Node::new(
                lower.begin,
                upper.end,
                NodeKind::Range {
                    lower: Some(Box::new(lower)),
                    upper: Some(Box::new(upper)),
                },
            )
        } else {
            lower
        };
        self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
        let body = self.parse_statement();
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::Foreach {
                variable: Box::new(variable),
                iterable: Box::new(iterable),
                body: Box::new(body),
            },
        );
        Node::combine(node, holes)
    }

    fn parse_switch(&mut self) -> Node {
        let keyword = self.advance();
        let mut holes = Vec::new();
        let value = self.parse_condition(&mut holes);
        let mut cases = Vec::new();
        if self
            .expect(TokenKind::LeftBrace, Expected::LeftBrace, &mut holes)
            .is_some()
        {
            while !self.check(TokenKind::RightBrace) && !self.at_end() {
                if self.check(TokenKind::Case) || self.check(TokenKind::Default) {
                    cases.push(self.parse_case());
                } else {
                    cases.push(self.wrong_current(Expected::Case));
                }
            }
            self.expect(TokenKind::RightBrace, Expected::RightBrace, &mut holes);
        }
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::Switch {
                value: Box::new(value),
                cases,
            },
        );
        Node::combine(node, holes)
    }

    /// One `case`/`default` label and the statements that run under it.
    fn parse_case(&mut self) -> Node {
        let keyword = self.advance();
        let label = if keyword.kind == TokenKind::Case {
            let lower = self.parse_expression();
            let label = if self.eat(TokenKind::Range).is_some() {
                let upper = self.parse_expression();
                Node::new(
                    lower.begin,
                    upper.end,
                    NodeKind::Range {
                        lower: Some(Box::new(lower)),
                        upper: Some(Box::new(upper)),
                    },
                )
            } else {
                lower
            };
            Some(Box::new(label))
        } else {
            None
        };
        let mut holes = Vec::new();
        self.expect(TokenKind::Colon, Expected::Colon, &mut holes);
        let mut statements = Vec::new();
        while !matches!(
            self.current.kind,
            TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
        ) {
            let mark = self.mark();
            let statement = self.parse_statement();
            statements.push(self.ensure_progress(mark, statement));
        }
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::Case { label, statements },
        );
        Node::combine(node, holes)
    }

    fn parse_try(&mut self) -> Node {
        let keyword = self.advance();
        let body = self.parse_statement();
        let mut holes = Vec::new();
        let mut exception = None;
        let handler = if self.eat(TokenKind::Catch).is_some() {
            if self.eat(TokenKind::LeftParen).is_some() {
                exception = Some(Box::new(self.parse_bare_variable()));
                self.expect(TokenKind::RightParen, Expected::RightParen, &mut holes);
            }
            self.parse_statement()
        } else {
            self.hole(Expected::Catch)
        };
        let node = Node::new(
            keyword.begin,
            self.previous.end,
            NodeKind::TryCatch {
                body: Box::new(body),
                exception,
                handler: Box::new(handler),
            },
        );
        Node::combine(node, holes)
    }

    fn parse_return(&mut self) -> Node {
        let keyword = self.advance();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()))
        };
        let mut holes = Vec::new();
        self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
        let node = Node::new(keyword.begin, self.previous.end, NodeKind::Return { value });
        Node::combine(node, holes)
    }

    fn parse_jump(&mut self) -> Node {
        let keyword = self.advance();
        let kind = if keyword.kind == TokenKind::Break {
            NodeKind::Break
        } else {
            NodeKind::Continue
        };
        let mut holes = Vec::new();
        self.expect(TokenKind::Semicolon, Expected::Semicolon, &mut holes);
        let node = Node::new(keyword.begin, self.previous.end, kind);
        Node::combine(node, holes)
    }
}
