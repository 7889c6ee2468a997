use std::fmt;

use serde::Serialize;

use crate::lexer::TokenKind;

/// The construct a diagnostic hole stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Expected {
    Semicolon,
    Comma,
    Colon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Greater,
    Assign,
    While,
    Catch,
    Case,
    Name,
    Type,
    String,
    Operator,
    Expression,
    Statement,
    Declaration,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Expected::Semicolon => "';'",
            Expected::Comma => "','",
            Expected::Colon => "':'",
            Expected::LeftParen => "'('",
            Expected::RightParen => "')'",
            Expected::LeftBrace => "'{'",
            Expected::RightBrace => "'}'",
            Expected::LeftBracket => "'['",
            Expected::RightBracket => "']'",
            Expected::Greater => "'>'",
            Expected::Assign => "'='",
            Expected::While => "'while'",
            Expected::Catch => "'catch'",
            Expected::Case => "'case' or 'default'",
            Expected::Name => "a name",
            Expected::Type => "a type",
            Expected::String => "a string",
            Expected::Operator => "an overloadable operator",
            Expected::Expression => "an expression",
            Expected::Statement => "a statement",
            Expected::Declaration => "a declaration",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Static,
    Override,
    Deprecated,
    Nosave,
}

impl Modifier {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Public => Some(Modifier::Public),
            TokenKind::Private => Some(Modifier::Private),
            TokenKind::Protected => Some(Modifier::Protected),
            TokenKind::Static => Some(Modifier::Static),
            TokenKind::Override => Some(Modifier::Override),
            TokenKind::Deprecated => Some(Modifier::Deprecated),
            TokenKind::Nosave => Some(Modifier::Nosave),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Static => "static",
            Modifier::Override => "override",
            Modifier::Deprecated => "deprecated",
            Modifier::Nosave => "nosave",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BasicKind {
    Void,
    Int,
    Float,
    Char,
    Bool,
    String,
    Symbol,
    Object,
    Mapping,
    Function,
    Exception,
    Any,
    Auto,
}

impl BasicKind {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Void => Some(BasicKind::Void),
            TokenKind::IntType => Some(BasicKind::Int),
            TokenKind::FloatType => Some(BasicKind::Float),
            TokenKind::CharType => Some(BasicKind::Char),
            TokenKind::BoolType => Some(BasicKind::Bool),
            TokenKind::StringType => Some(BasicKind::String),
            TokenKind::SymbolType => Some(BasicKind::Symbol),
            TokenKind::ObjectType => Some(BasicKind::Object),
            TokenKind::MappingType => Some(BasicKind::Mapping),
            TokenKind::FunctionType => Some(BasicKind::Function),
            TokenKind::ExceptionType => Some(BasicKind::Exception),
            TokenKind::AnyType => Some(BasicKind::Any),
            TokenKind::AutoType => Some(BasicKind::Auto),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BasicKind::Void => "void",
            BasicKind::Int => "int",
            BasicKind::Float => "float",
            BasicKind::Char => "char",
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Symbol => "symbol",
            BasicKind::Object => "object",
            BasicKind::Mapping => "mapping",
            BasicKind::Function => "function",
            BasicKind::Exception => "exception",
            BasicKind::Any => "any",
            BasicKind::Auto => "auto",
        }
    }

    /// Only `object` and `exception` accept a `<...>` file annotation.
    pub fn takes_type_file(self) -> bool {
        matches!(self, BasicKind::Object | BasicKind::Exception)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
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
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    ShiftLeft,
    ShiftRight,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Assign => BinaryOp::Assign,
            TokenKind::AddAssign => BinaryOp::AddAssign,
            TokenKind::SubAssign => BinaryOp::SubAssign,
            TokenKind::MulAssign => BinaryOp::MulAssign,
            TokenKind::DivAssign => BinaryOp::DivAssign,
            TokenKind::ModAssign => BinaryOp::ModAssign,
            TokenKind::AndAssign => BinaryOp::AndAssign,
            TokenKind::OrAssign => BinaryOp::OrAssign,
            TokenKind::XorAssign => BinaryOp::XorAssign,
            TokenKind::ShiftLeftAssign => BinaryOp::ShiftLeftAssign,
            TokenKind::ShiftRightAssign => BinaryOp::ShiftRightAssign,
            TokenKind::LogicalOr => BinaryOp::LogicalOr,
            TokenKind::LogicalAnd => BinaryOp::LogicalAnd,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Ampersand => BinaryOp::BitAnd,
            TokenKind::Equal => BinaryOp::Equal,
            TokenKind::NotEqual => BinaryOp::NotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            TokenKind::ShiftLeft => BinaryOp::ShiftLeft,
            TokenKind::ShiftRight => BinaryOp::ShiftRight,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
                | BinaryOp::AndAssign
                | BinaryOp::OrAssign
                | BinaryOp::XorAssign
                | BinaryOp::ShiftLeftAssign
                | BinaryOp::ShiftRightAssign
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::LogicalOr
                | BinaryOp::LogicalAnd
                | BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::Greater
                | BinaryOp::LessEqual
                | BinaryOp::GreaterEqual
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::ModAssign => "%=",
            BinaryOp::AndAssign => "&=",
            BinaryOp::OrAssign => "|=",
            BinaryOp::XorAssign => "^=",
            BinaryOp::ShiftLeftAssign => "<<=",
            BinaryOp::ShiftRightAssign => ">>=",
            BinaryOp::LogicalOr => "||",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Reference,
    Dereference,
    Not,
    Negate,
    Plus,
    Complement,
    Sizeof,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    pub fn prefix(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Ampersand => Some(UnaryOp::Reference),
            TokenKind::Star => Some(UnaryOp::Dereference),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Tilde => Some(UnaryOp::Complement),
            TokenKind::Sizeof => Some(UnaryOp::Sizeof),
            TokenKind::Increment => Some(UnaryOp::PreIncrement),
            TokenKind::Decrement => Some(UnaryOp::PreDecrement),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Reference => "&",
            UnaryOp::Dereference => "*",
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Complement => "~",
            UnaryOp::Sizeof => "sizeof",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Access {
    Arrow,
    Dot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    Missing {
        message: String,
        expected: Expected,
    },
    Wrong {
        message: String,
        expected: Expected,
        found: TokenKind,
    },
    /// A best-effort node followed by the holes found while parsing it.
    Combination {
        primary: Box<Node>,
        diagnostics: Vec<Node>,
    },

    Include {
        path: Box<Node>,
    },
    Inherit {
        path: Box<Node>,
    },
    Class {
        name: Box<Node>,
        inherits: Option<Box<Node>>,
        body: Vec<Node>,
    },
    Modifiers {
        modifiers: Vec<Modifier>,
    },
    VariableDefinition {
        modifiers: Option<Box<Node>>,
        ty: Option<Box<Node>>,
        name: Box<Node>,
        value: Option<Box<Node>>,
        inferred: bool,
    },
    FunctionDefinition {
        modifiers: Option<Box<Node>>,
        return_type: Box<Node>,
        name: Box<Node>,
        parameters: Vec<Node>,
        variadic: bool,
        body: Option<Box<Node>>,
    },
    Parameter {
        ty: Box<Node>,
        name: Option<Box<Node>>,
    },

    Block {
        statements: Vec<Node>,
    },
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    DoWhile {
        body: Box<Node>,
        condition: Box<Node>,
    },
    For {
        initializer: Option<Box<Node>>,
        condition: Option<Box<Node>>,
        step: Option<Box<Node>>,
        body: Box<Node>,
    },
    Foreach {
        variable: Box<Node>,
        iterable: Box<Node>,
        body: Box<Node>,
    },
    Switch {
        value: Box<Node>,
        cases: Vec<Node>,
    },
    /// `label` is `None` for `default`.
    Case {
        label: Option<Box<Node>>,
        statements: Vec<Node>,
    },
    Break,
    Continue,
    Return {
        value: Option<Box<Node>>,
    },
    TryCatch {
        body: Box<Node>,
        exception: Option<Box<Node>>,
        handler: Box<Node>,
    },
    Empty,

    Name {
        name: String,
    },
    /// `scope::name`; `scope` is `None` for a bare `::name` super send.
    ScopeChain {
        scope: Option<Box<Node>>,
        name: Box<Node>,
    },
    FunctionCall {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    MemberAccess {
        receiver: Box<Node>,
        access: Access,
        name: Box<Node>,
    },
    New {
        target: Box<Node>,
        arguments: Vec<Node>,
    },
    Cast {
        ty: Box<Node>,
        value: Box<Node>,
    },
    Subscript {
        target: Box<Node>,
        index: Box<Node>,
    },
    Range {
        lower: Option<Box<Node>>,
        upper: Option<Box<Node>>,
    },
    BinaryOperation {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    UnaryOperation {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Ternary {
        condition: Box<Node>,
        then_value: Box<Node>,
        else_value: Box<Node>,
    },
    TypeTest {
        value: Box<Node>,
        ty: Box<Node>,
    },
    ArrayLiteral {
        items: Vec<Node>,
    },
    MappingLiteral {
        entries: Vec<Node>,
    },
    MappingEntry {
        key: Box<Node>,
        value: Box<Node>,
    },
    StringConcatenation {
        parts: Vec<Node>,
    },
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    CharLiteral(char),
    SymbolLiteral(String),
    BoolLiteral(bool),
    Nil,
    This,

    BasicType {
        kind: BasicKind,
        type_file: Option<String>,
    },
    ArrayType {
        element: Box<Node>,
    },
    OrType {
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    FunctionReferenceType {
        return_type: Box<Node>,
        parameters: Vec<Node>,
        variadic: bool,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Missing { .. } => "Missing",
            NodeKind::Wrong { .. } => "Wrong",
            NodeKind::Combination { .. } => "Combination",
            NodeKind::Include { .. } => "Include",
            NodeKind::Inherit { .. } => "Inherit",
            NodeKind::Class { .. } => "Class",
            NodeKind::Modifiers { .. } => "Modifiers",
            NodeKind::VariableDefinition { .. } => "VariableDefinition",
            NodeKind::FunctionDefinition { .. } => "FunctionDefinition",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::Block { .. } => "Block",
            NodeKind::If { .. } => "If",
            NodeKind::While { .. } => "While",
            NodeKind::DoWhile { .. } => "DoWhile",
            NodeKind::For { .. } => "For",
            NodeKind::Foreach { .. } => "Foreach",
            NodeKind::Switch { .. } => "Switch",
            NodeKind::Case { .. } => "Case",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::Return { .. } => "Return",
            NodeKind::TryCatch { .. } => "TryCatch",
            NodeKind::Empty => "Empty",
            NodeKind::Name { .. } => "Name",
            NodeKind::ScopeChain { .. } => "ScopeChain",
            NodeKind::FunctionCall { .. } => "FunctionCall",
            NodeKind::MemberAccess { .. } => "MemberAccess",
            NodeKind::New { .. } => "New",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::Subscript { .. } => "Subscript",
            NodeKind::Range { .. } => "Range",
            NodeKind::BinaryOperation { .. } => "BinaryOperation",
            NodeKind::UnaryOperation { .. } => "UnaryOperation",
            NodeKind::Ternary { .. } => "Ternary",
            NodeKind::TypeTest { .. } => "TypeTest",
            NodeKind::ArrayLiteral { .. } => "ArrayLiteral",
            NodeKind::MappingLiteral { .. } => "MappingLiteral",
            NodeKind::MappingEntry { .. } => "MappingEntry",
            NodeKind::StringConcatenation { .. } => "StringConcatenation",
            NodeKind::IntLiteral(_) => "IntLiteral",
            NodeKind::FloatLiteral(_) => "FloatLiteral",
            NodeKind::StringLiteral(_) => "StringLiteral",
            NodeKind::CharLiteral(_) => "CharLiteral",
            NodeKind::SymbolLiteral(_) => "SymbolLiteral",
            NodeKind::BoolLiteral(_) => "BoolLiteral",
            NodeKind::Nil => "Nil",
            NodeKind::This => "This",
            NodeKind::BasicType { .. } => "BasicType",
            NodeKind::ArrayType { .. } => "ArrayType",
            NodeKind::OrType { .. } => "OrType",
            NodeKind::FunctionReferenceType { .. } => "FunctionReferenceType",
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        match self {
            NodeKind::Combination {
                primary,
                diagnostics,
            } => {
                out.push(primary.as_ref());
                out.extend(diagnostics);
            }
            NodeKind::Include { path } | NodeKind::Inherit { path } => out.push(path.as_ref()),
            NodeKind::Class {
                name,
                inherits,
                body,
            } => {
                out.push(name.as_ref());
                out.extend(inherits.as_deref());
                out.extend(body);
            }
            NodeKind::VariableDefinition {
                modifiers,
                ty,
                name,
                value,
                ..
            } => {
                out.extend(modifiers.as_deref());
                out.extend(ty.as_deref());
                out.push(name.as_ref());
                out.extend(value.as_deref());
            }
            NodeKind::FunctionDefinition {
                modifiers,
                return_type,
                name,
                parameters,
                body,
                ..
            } => {
                out.extend(modifiers.as_deref());
                out.push(return_type.as_ref());
                out.push(name.as_ref());
                out.extend(parameters);
                out.extend(body.as_deref());
            }
            NodeKind::Parameter { ty, name } => {
                out.push(ty.as_ref());
                out.extend(name.as_deref());
            }
            NodeKind::Block { statements } => out.extend(statements),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(condition.as_ref());
                out.push(then_branch.as_ref());
                out.extend(else_branch.as_deref());
            }
            NodeKind::While { condition, body } => {
                out.push(condition.as_ref());
                out.push(body.as_ref());
            }
            NodeKind::DoWhile { body, condition } => {
                out.push(body.as_ref());
                out.push(condition.as_ref());
            }
            NodeKind::For {
                initializer,
                condition,
                step,
                body,
            } => {
                out.extend(initializer.as_deref());
                out.extend(condition.as_deref());
                out.extend(step.as_deref());
                out.push(body.as_ref());
            }
            NodeKind::Foreach {
                variable,
                iterable,
                body,
            } => {
                out.push(variable.as_ref());
                out.push(iterable.as_ref());
                out.push(body.as_ref());
            }
            NodeKind::Switch { value, cases } => {
                out.push(value.as_ref());
                out.extend(cases);
            }
            NodeKind::Case { label, statements } => {
                out.extend(label.as_deref());
                out.extend(statements);
            }
            NodeKind::Return { value } => out.extend(value.as_deref()),
            NodeKind::TryCatch {
                body,
                exception,
                handler,
            } => {
                out.push(body.as_ref());
                out.extend(exception.as_deref());
                out.push(handler.as_ref());
            }
            NodeKind::ScopeChain { scope, name } => {
                out.extend(scope.as_deref());
                out.push(name.as_ref());
            }
            NodeKind::FunctionCall { callee, arguments } => {
                out.push(callee.as_ref());
                out.extend(arguments);
            }
            NodeKind::MemberAccess { receiver, name, .. } => {
                out.push(receiver.as_ref());
                out.push(name.as_ref());
            }
            NodeKind::New { target, arguments } => {
                out.push(target.as_ref());
                out.extend(arguments);
            }
            NodeKind::Cast { ty, value } => {
                out.push(ty.as_ref());
                out.push(value.as_ref());
            }
            NodeKind::Subscript { target, index } => {
                out.push(target.as_ref());
                out.push(index.as_ref());
            }
            NodeKind::Range { lower, upper } => {
                out.extend(lower.as_deref());
                out.extend(upper.as_deref());
            }
            NodeKind::BinaryOperation { lhs, rhs, .. } => {
                out.push(lhs.as_ref());
                out.push(rhs.as_ref());
            }
            NodeKind::UnaryOperation { operand, .. } => out.push(operand.as_ref()),
            NodeKind::Ternary {
                condition,
                then_value,
                else_value,
            } => {
                out.push(condition.as_ref());
                out.push(then_value.as_ref());
                out.push(else_value.as_ref());
            }
            NodeKind::TypeTest { value, ty } => {
                out.push(value.as_ref());
                out.push(ty.as_ref());
            }
            NodeKind::ArrayLiteral { items } => out.extend(items),
            NodeKind::MappingLiteral { entries } => out.extend(entries),
            NodeKind::MappingEntry { key, value } => {
                out.push(key.as_ref());
                out.push(value.as_ref());
            }
            NodeKind::StringConcatenation { parts } => out.extend(parts),
            NodeKind::ArrayType { element } => out.push(element.as_ref()),
            NodeKind::OrType { lhs, rhs } => {
                out.push(lhs.as_ref());
                out.push(rhs.as_ref());
            }
            NodeKind::FunctionReferenceType {
                return_type,
                parameters,
                ..
            } => {
                out.push(return_type.as_ref());
                out.extend(parameters);
            }
            NodeKind::Missing { .. }
            | NodeKind::Wrong { .. }
            | NodeKind::Modifiers { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Empty
            | NodeKind::Name { .. }
            | NodeKind::IntLiteral(_)
            | NodeKind::FloatLiteral(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::CharLiteral(_)
            | NodeKind::SymbolLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::Nil
            | NodeKind::This
            | NodeKind::BasicType { .. } => {}
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub begin: usize,
    pub end: usize,
    pub kind: NodeKind,
    #[serde(skip)]
    height: usize,
}

/// Observes nodes during [`Node::accept`].
pub trait Visitor {
    /// Called before the children; returning `false` skips them.
    fn visit(&mut self, node: &Node) -> bool;

    fn leave(&mut self, _node: &Node) {}
}

impl Node {
    /// Builds a node whose span is widened to cover all of its children.
    pub fn new(begin: usize, end: usize, kind: NodeKind) -> Self {
        let mut begin = begin;
        let mut end = end.max(begin);
        let mut below = 0;
        for child in kind.children() {
            begin = begin.min(child.begin);
            end = end.max(child.end);
            below = below.max(child.height);
        }
        Self {
            begin,
            end,
            kind,
            height: below + 1,
        }
    }

    pub fn missing(at: usize, expected: Expected) -> Self {
        Self {
            begin: at,
            end: at,
            kind: NodeKind::Missing {
                message: format!("missing {expected}"),
                expected,
            },
            height: 1,
        }
    }

    pub fn wrong(begin: usize, end: usize, expected: Expected, found: TokenKind) -> Self {
        Self {
            begin,
            end,
            kind: NodeKind::Wrong {
                message: format!("expected {expected}, found {found}"),
                expected,
                found,
            },
            height: 1,
        }
    }

    /// Attaches holes to `primary`; without holes the node is returned as is.
    pub fn combine(primary: Node, diagnostics: Vec<Node>) -> Self {
        if diagnostics.is_empty() {
            return primary;
        }
        let (begin, end) = (primary.begin, primary.end);
        Node::new(
            begin,
            end,
            NodeKind::Combination {
                primary: Box::new(primary),
                diagnostics,
            },
        )
    }

    pub fn children(&self) -> Vec<&Node> {
        self.kind.children()
    }

    /// Nodes on the longest path from here down to a leaf.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.begin <= pos && pos <= self.end
    }

    pub fn is_hole(&self) -> bool {
        matches!(self.kind, NodeKind::Missing { .. } | NodeKind::Wrong { .. })
    }

    /// The node itself, or the primary node of a combination.
    pub fn primary(&self) -> &Node {
        match &self.kind {
            NodeKind::Combination { primary, .. } => primary.primary(),
            _ => self,
        }
    }

    pub fn name_text(&self) -> Option<&str> {
        match &self.primary().kind {
            NodeKind::Name { name } => Some(name),
            _ => None,
        }
    }

    pub fn hole_message(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Missing { message, .. } | NodeKind::Wrong { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        if visitor.visit(self) {
            for child in self.children() {
                child.accept(visitor);
            }
        }
        visitor.leave(self);
    }

    /// Every Missing/Wrong node in this subtree, in source order.
    pub fn holes(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        collect_holes_into(self, &mut out);
        out
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(self.kind.name());
        out.push_str(&format!(" [{}..{}]", self.begin, self.end));
        if let Some(detail) = self.detail() {
            out.push(' ');
            out.push_str(&detail);
        }
        out.push('\n');
        for child in self.children() {
            child.dump_into(out, depth + 1);
        }
    }

    fn detail(&self) -> Option<String> {
        let detail = match &self.kind {
            NodeKind::Missing { message, .. } | NodeKind::Wrong { message, .. } => {
                format!("{message:?}")
            }
            NodeKind::Modifiers { modifiers } => modifiers
                .iter()
                .map(|modifier| modifier.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            NodeKind::VariableDefinition { inferred: true, .. } => "let".to_string(),
            NodeKind::FunctionDefinition { variadic: true, .. }
            | NodeKind::FunctionReferenceType { variadic: true, .. } => "variadic".to_string(),
            NodeKind::MemberAccess { access, .. } => match access {
                Access::Arrow => "->".to_string(),
                Access::Dot => ".".to_string(),
            },
            NodeKind::Name { name } => name.clone(),
            NodeKind::BinaryOperation { op, .. } => op.as_str().to_string(),
            NodeKind::UnaryOperation { op, .. } => op.as_str().to_string(),
            NodeKind::IntLiteral(value) => value.to_string(),
            NodeKind::FloatLiteral(value) => value.to_string(),
            NodeKind::StringLiteral(value) | NodeKind::SymbolLiteral(value) => {
                format!("{value:?}")
            }
            NodeKind::CharLiteral(value) => format!("{value:?}"),
            NodeKind::BoolLiteral(value) => value.to_string(),
            NodeKind::BasicType { kind, type_file } => match type_file {
                Some(file) => format!("{}<{file:?}>", kind.as_str()),
                None => kind.as_str().to_string(),
            },
            _ => return None,
        };
        Some(detail)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

fn collect_holes_into<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    if node.is_hole() {
        out.push(node);
    }
    for child in node.children() {
        collect_holes_into(child, out);
    }
}

pub fn collect_holes(nodes: &[Node]) -> Vec<&Node> {
    let mut out = Vec::new();
    for node in nodes {
        collect_holes_into(node, &mut out);
    }
    out
}

/// The chain of nodes whose span contains `pos`, outermost first.
pub fn node_path_at(nodes: &[Node], pos: usize) -> Vec<&Node> {
    let mut path = Vec::new();
    let mut level: Vec<&Node> = nodes.iter().collect();
    loop {
        // Prefer the last match so a gap shared by two siblings resolves to
        // the later one, which is where the cursor is typing. A Missing hole
        // only wins when nothing else covers `pos`.
        let mut candidates = level.iter().rev().filter(|node| node.contains(pos));
        let first = candidates.next().copied();
        let found = match first {
            Some(node) if matches!(node.kind, NodeKind::Missing { .. }) => candidates
                .find(|node| !matches!(node.kind, NodeKind::Missing { .. }))
                .copied()
                .or(Some(node)),
            other => other,
        };
        let Some(found) = found else {
            break;
        };
        path.push(found);
        level = found.children();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(begin: usize, text: &str) -> Node {
        Node::new(
            begin,
            begin + text.len(),
            NodeKind::Name {
                name: text.to_string(),
            },
        )
    }

    #[test]
    fn new_widens_span_to_children() {
        let node = Node::new(
            4,
            5,
            NodeKind::BinaryOperation {
                op: BinaryOp::Add,
                lhs: Box::new(name(0, "a")),
                rhs: Box::new(name(8, "bc")),
            },
        );
        assert_eq!((node.begin, node.end), (0, 10));
        assert_eq!(node.height(), 2);
    }

    #[test]
    fn height_follows_the_tallest_child() {
        let inner = Node::combine(name(0, "a"), vec![Node::missing(1, Expected::Semicolon)]);
        assert_eq!(inner.height(), 2);
        let node = Node::new(
            0,
            4,
            NodeKind::BinaryOperation {
                op: BinaryOp::Add,
                lhs: Box::new(inner),
                rhs: Box::new(name(3, "b")),
            },
        );
        assert_eq!(node.height(), 3);
        assert_eq!(Node::wrong(0, 1, Expected::Name, TokenKind::Plus).height(), 1);
    }

    #[test]
    fn combine_without_holes_keeps_the_node() {
        let node = Node::combine(name(0, "x"), Vec::new());
        assert!(matches!(node.kind, NodeKind::Name { .. }));
        let combined = Node::combine(name(0, "x"), vec![Node::missing(1, Expected::Semicolon)]);
        assert_eq!(combined.primary().name_text(), Some("x"));
        assert_eq!(combined.holes().len(), 1);
    }

    #[test]
    fn accept_respects_the_descend_flag() {
        struct Counter {
            seen: Vec<&'static str>,
        }
        impl Visitor for Counter {
            fn visit(&mut self, node: &Node) -> bool {
                self.seen.push(node.kind.name());
                !matches!(node.kind, NodeKind::Block { .. })
            }
        }

        let tree = Node::new(
            0,
            10,
            NodeKind::Return {
                value: Some(Box::new(Node::new(
                    2,
                    8,
                    NodeKind::Block {
                        statements: vec![name(3, "y")],
                    },
                ))),
            },
        );
        let mut counter = Counter { seen: Vec::new() };
        tree.accept(&mut counter);
        assert_eq!(counter.seen, vec!["Return", "Block"]);
    }

    #[test]
    fn node_path_at_walks_into_children() {
        let call = Node::new(
            0,
            6,
            NodeKind::FunctionCall {
                callee: Box::new(name(0, "f")),
                arguments: vec![name(2, "arg")],
            },
        );
        let path = node_path_at(std::slice::from_ref(&call), 3);
        let names: Vec<&str> = path.iter().map(|node| node.kind.name()).collect();
        assert_eq!(names, vec!["FunctionCall", "Name"]);
    }

    #[test]
    fn node_path_at_looks_past_missing_holes() {
        let statement = Node::combine(name(0, "ab"), vec![Node::missing(2, Expected::Semicolon)]);
        let path = node_path_at(std::slice::from_ref(&statement), 2);
        let names: Vec<&str> = path.iter().map(|node| node.kind.name()).collect();
        assert_eq!(names, vec!["Combination", "Name"]);
    }

    #[test]
    fn dump_is_indented_by_depth() {
        let node = Node::combine(name(0, "x"), vec![Node::missing(1, Expected::Semicolon)]);
        let dump = node.dump();
        assert!(dump.starts_with("Combination [0..1]\n  Name [0..1] x\n  Missing [1..1]"));
    }
}
