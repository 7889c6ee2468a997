use crate::lexer::TokenKind;

pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("inherit", TokenKind::Inherit),
    ("class", TokenKind::Class),
    ("private", TokenKind::Private),
    ("protected", TokenKind::Protected),
    ("public", TokenKind::Public),
    ("static", TokenKind::Static),
    ("override", TokenKind::Override),
    ("deprecated", TokenKind::Deprecated),
    ("nosave", TokenKind::Nosave),
    ("new", TokenKind::New),
    ("this", TokenKind::This),
    ("nil", TokenKind::Nil),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("sizeof", TokenKind::Sizeof),
    ("is", TokenKind::Is),
    ("let", TokenKind::Let),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("do", TokenKind::Do),
    ("for", TokenKind::For),
    ("foreach", TokenKind::Foreach),
    ("switch", TokenKind::Switch),
    ("case", TokenKind::Case),
    ("default", TokenKind::Default),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("return", TokenKind::Return),
    ("try", TokenKind::Try),
    ("catch", TokenKind::Catch),
    ("operator", TokenKind::Operator),
    ("void", TokenKind::Void),
    ("int", TokenKind::IntType),
    ("float", TokenKind::FloatType),
    ("char", TokenKind::CharType),
    ("bool", TokenKind::BoolType),
    ("string", TokenKind::StringType),
    ("symbol", TokenKind::SymbolType),
    ("object", TokenKind::ObjectType),
    ("mapping", TokenKind::MappingType),
    ("function", TokenKind::FunctionType),
    ("exception", TokenKind::ExceptionType),
    ("any", TokenKind::AnyType),
    ("auto", TokenKind::AutoType),
];

pub const DIRECTIVE_INCLUDE: &str = "#include";

pub const SYMBOLS_3: &[([char; 3], TokenKind)] = &[
    (['<', '<', '='], TokenKind::ShiftLeftAssign),
    (['>', '>', '='], TokenKind::ShiftRightAssign),
    (['.', '.', '.'], TokenKind::Ellipsis),
];

pub const SYMBOLS_2: &[([char; 2], TokenKind)] = &[
    (['(', '{'], TokenKind::ArrayOpen),
    (['(', '['], TokenKind::MappingOpen),
    (['-', '>'], TokenKind::Arrow),
    ([':', ':'], TokenKind::Scope),
    (['.', '.'], TokenKind::Range),
    (['+', '+'], TokenKind::Increment),
    (['-', '-'], TokenKind::Decrement),
    (['+', '='], TokenKind::AddAssign),
    (['-', '='], TokenKind::SubAssign),
    (['*', '='], TokenKind::MulAssign),
    (['/', '='], TokenKind::DivAssign),
    (['%', '='], TokenKind::ModAssign),
    (['&', '='], TokenKind::AndAssign),
    (['|', '='], TokenKind::OrAssign),
    (['^', '='], TokenKind::XorAssign),
    (['=', '='], TokenKind::Equal),
    (['!', '='], TokenKind::NotEqual),
    (['<', '='], TokenKind::LessEqual),
    (['>', '='], TokenKind::GreaterEqual),
    (['&', '&'], TokenKind::LogicalAnd),
    (['|', '|'], TokenKind::LogicalOr),
    (['<', '<'], TokenKind::ShiftLeft),
    (['>', '>'], TokenKind::ShiftRight),
];

pub const SYMBOLS_1: &[(char, TokenKind)] = &[
    ('+', TokenKind::Plus),
    ('-', TokenKind::Minus),
    ('*', TokenKind::Star),
    ('/', TokenKind::Slash),
    ('%', TokenKind::Percent),
    ('=', TokenKind::Assign),
    ('<', TokenKind::Less),
    ('>', TokenKind::Greater),
    ('!', TokenKind::Bang),
    ('~', TokenKind::Tilde),
    ('&', TokenKind::Ampersand),
    ('|', TokenKind::Pipe),
    ('^', TokenKind::Caret),
    ('?', TokenKind::Question),
    (':', TokenKind::Colon),
    (';', TokenKind::Semicolon),
    (',', TokenKind::Comma),
    ('.', TokenKind::Dot),
    ('(', TokenKind::LeftParen),
    (')', TokenKind::RightParen),
    ('[', TokenKind::LeftBracket),
    (']', TokenKind::RightBracket),
    ('{', TokenKind::LeftBrace),
    ('}', TokenKind::RightBrace),
];

/// Operators that may follow the `operator` keyword in a function name.
pub const OVERLOADABLE_OPERATORS: &[TokenKind] = &[
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Star,
    TokenKind::Slash,
    TokenKind::Percent,
    TokenKind::Equal,
    TokenKind::NotEqual,
    TokenKind::Less,
    TokenKind::Greater,
    TokenKind::LessEqual,
    TokenKind::GreaterEqual,
    TokenKind::ShiftLeft,
    TokenKind::ShiftRight,
    TokenKind::Ampersand,
    TokenKind::Pipe,
    TokenKind::Caret,
    TokenKind::Bang,
    TokenKind::Tilde,
    TokenKind::Increment,
    TokenKind::Decrement,
    TokenKind::LeftBracket,
    TokenKind::LeftParen,
];

pub fn keyword(word: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(text, _)| *text == word)
        .map(|(_, kind)| *kind)
}

pub fn keyword_text(kind: TokenKind) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(_, candidate)| *candidate == kind)
        .map(|(text, _)| *text)
}

pub fn symbol_text(kind: TokenKind) -> Option<String> {
    if let Some((chars, _)) = SYMBOLS_3.iter().find(|(_, candidate)| *candidate == kind) {
        return Some(chars.iter().collect());
    }
    if let Some((chars, _)) = SYMBOLS_2.iter().find(|(_, candidate)| *candidate == kind) {
        return Some(chars.iter().collect());
    }
    SYMBOLS_1
        .iter()
        .find(|(_, candidate)| *candidate == kind)
        .map(|(ch, _)| ch.to_string())
}

pub fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
