use std::collections::HashSet;

use serde::Serialize;

use crate::ast::{Node, NodeKind, Visitor};
use crate::lexer::TokenKind;
use crate::parser::Parsed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Keyword,
    Type,
    Modifier,
    Function,
    Variable,
    Parameter,
    Name,
    Integer,
    Float,
    String,
    Character,
    Symbol,
    Constant,
    Comment,
    DocComment,
    Missing,
    Wrong,
}

impl HighlightKind {
    pub fn is_hole(self) -> bool {
        matches!(self, HighlightKind::Missing | HighlightKind::Wrong)
    }
}

/// A styled source range. Holes carry their diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub begin: usize,
    pub end: usize,
    pub kind: HighlightKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Highlight {
    fn new(begin: usize, end: usize, kind: HighlightKind) -> Self {
        Self {
            begin,
            end,
            kind,
            message: None,
        }
    }
}

/// Style ranges for a parsed file, sorted by `begin`.
pub fn highlights(parsed: &Parsed) -> Vec<Highlight> {
    let mut collector = Collector::default();
    for token in &parsed.keywords {
        let kind = match token.kind {
            TokenKind::True | TokenKind::False | TokenKind::Nil | TokenKind::This => {
                HighlightKind::Constant
            }
            kind if kind.is_modifier() => HighlightKind::Modifier,
            _ => HighlightKind::Keyword,
        };
        collector
            .out
            .push(Highlight::new(token.begin, token.end, kind));
    }
    for token in &parsed.comments {
        let kind = match token.kind {
            TokenKind::DocComment => HighlightKind::DocComment,
            _ => HighlightKind::Comment,
        };
        collector
            .out
            .push(Highlight::new(token.begin, token.end, kind));
    }
    for node in &parsed.nodes {
        node.accept(&mut collector);
    }
    let mut out = collector.out;
    out.sort_by_key(|highlight| (highlight.begin, highlight.end));
    out
}

#[derive(Default)]
struct Collector {
    out: Vec<Highlight>,
    /// Begin offsets of names already styled by their parent.
    claimed: HashSet<usize>,
}

impl Collector {
    fn claim(&mut self, node: &Node, kind: HighlightKind) {
        let name = node.primary();
        if !matches!(name.kind, NodeKind::Name { .. }) || !self.claimed.insert(name.begin) {
            return;
        }
        self.out.push(Highlight::new(name.begin, name.end, kind));
    }

    fn push(&mut self, node: &Node, kind: HighlightKind) {
        self.out.push(Highlight::new(node.begin, node.end, kind));
    }
}

impl Visitor for Collector {
    fn visit(&mut self, node: &Node) -> bool {
        match &node.kind {
            NodeKind::Missing { message, .. } | NodeKind::Wrong { message, .. } => {
                let kind = if matches!(node.kind, NodeKind::Missing { .. }) {
                    HighlightKind::Missing
                } else {
                    HighlightKind::Wrong
                };
                self.out.push(Highlight {
                    begin: node.begin,
                    end: node.end,
                    kind,
                    message: Some(message.clone()),
                });
            }
            NodeKind::VariableDefinition { name, .. } => self.claim(name, HighlightKind::Variable),
            NodeKind::FunctionDefinition { name, .. } => self.claim(name, HighlightKind::Function),
            NodeKind::Parameter { name: Some(name), .. } => {
                self.claim(name, HighlightKind::Parameter)
            }
            NodeKind::Class { name, .. } => self.claim(name, HighlightKind::Type),
            NodeKind::FunctionCall { callee, .. } => match &callee.primary().kind {
                NodeKind::MemberAccess { name, .. } => self.claim(name, HighlightKind::Function),
                NodeKind::ScopeChain { name, .. } => self.claim(name, HighlightKind::Function),
                _ => self.claim(callee, HighlightKind::Function),
            },
            NodeKind::Name { .. } => {
                if self.claimed.insert(node.begin) {
                    self.push(node, HighlightKind::Name);
                }
            }
            NodeKind::IntLiteral(_) => self.push(node, HighlightKind::Integer),
            NodeKind::FloatLiteral(_) => self.push(node, HighlightKind::Float),
            NodeKind::StringLiteral(_) => self.push(node, HighlightKind::String),
            NodeKind::CharLiteral(_) => self.push(node, HighlightKind::Character),
            NodeKind::SymbolLiteral(_) => self.push(node, HighlightKind::Symbol),
            NodeKind::BasicType { .. } => {
                self.push(node, HighlightKind::Type);
                return false;
            }
            _ => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_source, ParseOptions};

    fn kinds_of(src: &str) -> Vec<(String, HighlightKind)> {
        let parsed = parse_source(src, ParseOptions::editor());
        highlights(&parsed)
            .into_iter()
            .map(|highlight| (src[highlight.begin..highlight.end].to_string(), highlight.kind))
            .collect()
    }

    #[test]
    fn declarations_and_uses_are_told_apart() {
        let kinds = kinds_of("int x;\nvoid f(int a) { f(a + x); }");
        let expect = |text: &str, kind: HighlightKind| {
            assert!(
                kinds.contains(&(text.to_string(), kind)),
                "{text} as {kind:?} in {kinds:?}"
            );
        };
        expect("int", HighlightKind::Type);
        expect("x", HighlightKind::Variable);
        expect("void", HighlightKind::Type);
        expect("f", HighlightKind::Function);
        expect("a", HighlightKind::Parameter);
        expect("a", HighlightKind::Name);
        expect("x", HighlightKind::Name);
        assert_eq!(
            kinds
                .iter()
                .filter(|(text, kind)| text == "f" && *kind == HighlightKind::Function)
                .count(),
            2
        );
    }

    #[test]
    fn keywords_modifiers_and_constants() {
        let kinds = kinds_of("private int f() { if (true) return nil; }");
        assert!(kinds.contains(&("private".to_string(), HighlightKind::Modifier)));
        assert!(kinds.contains(&("if".to_string(), HighlightKind::Keyword)));
        assert!(kinds.contains(&("return".to_string(), HighlightKind::Keyword)));
        assert!(kinds.contains(&("true".to_string(), HighlightKind::Constant)));
        assert!(kinds.contains(&("nil".to_string(), HighlightKind::Constant)));
    }

    #[test]
    fn literals_and_comments() {
        let kinds = kinds_of("/*! doc */\n// line\nany f() { return ({ 1, 2.5, \"s\", 'c', #'g' }); }");
        assert!(kinds.contains(&("/*! doc */".to_string(), HighlightKind::DocComment)));
        assert!(kinds
            .iter()
            .any(|(text, kind)| text.starts_with("// line") && *kind == HighlightKind::Comment));
        assert!(kinds.contains(&("1".to_string(), HighlightKind::Integer)));
        assert!(kinds.contains(&("2.5".to_string(), HighlightKind::Float)));
        assert!(kinds.contains(&("\"s\"".to_string(), HighlightKind::String)));
        assert!(kinds.contains(&("'c'".to_string(), HighlightKind::Character)));
        assert!(kinds.contains(&("#'g'".to_string(), HighlightKind::Symbol)));
    }

    #[test]
    fn holes_carry_their_message() {
        let parsed = parse_source("int x", ParseOptions::editor());
        let found = highlights(&parsed);
        let hole = found.iter().find(|highlight| highlight.kind.is_hole());
        assert_eq!(
            hole.and_then(|highlight| highlight.message.as_deref()),
            Some("missing ';'")
        );
    }

    #[test]
    fn output_is_sorted() {
        let parsed = parse_source(
            "// c\ninherit \"/std/room\";\nstatic void create() { ::create(); }",
            ParseOptions::editor(),
        );
        let found = highlights(&parsed);
        assert!(found.windows(2).all(|pair| pair[0].begin <= pair[1].begin));
    }
}
