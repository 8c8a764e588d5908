//! Token types for the constraint language.
//!
//! The token set is a Python-flavoured superset of what constraints may use:
//! statement keywords and assignment operators are tokenized so the validator
//! can name them in its diagnostics instead of reporting a bare syntax error.

use crate::span::Span;

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Literals ===
    Name(String),
    Int(i64),
    Float(f64),
    String(String),

    // === Keywords ===
    True,
    False,
    None,
    And,
    Or,
    Not,
    In,
    Is,
    If,
    Else,
    Elif,
    For,
    While,
    Lambda,
    Import,
    From,
    As,
    Def,
    Class,
    Return,
    Yield,
    Try,
    Except,
    Finally,
    Raise,
    With,
    Global,
    Nonlocal,
    Del,
    Pass,
    Assert,
    Break,
    Continue,
    Async,
    Await,

    // === Punctuation ===
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }
    Comma,    // ,
    Colon,    // :
    Semicolon, // ;
    Dot,      // .
    Arrow,    // ->

    // === Operators ===
    Plus,       // +
    Minus,      // -
    Star,       // *
    StarStar,   // **
    Slash,      // /
    SlashSlash, // //
    Percent,    // %
    At,         // @
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~
    LtLt,       // <<
    GtGt,       // >>
    Lt,         // <
    Gt,         // >
    LtEq,       // <=
    GtEq,       // >=
    EqEq,       // ==
    BangEq,     // !=

    // Assignment
    Eq,          // =
    ColonEq,     // :=
    AugAssign,   // +=, -=, *=, ... (any operator followed by `=`)

    /// Logical line break outside of brackets.
    Newline,
    /// Unrecognized input; the message says why.
    Invalid(String),
    Eof,
}

impl TokenKind {
    /// Get the binary operator precedence (higher binds tighter).
    ///
    /// Only the arithmetic/bitwise tier is handled by precedence climbing;
    /// comparisons and boolean operators have their own grammar levels.
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            TokenKind::Pipe => Some(1),
            TokenKind::Caret => Some(2),
            TokenKind::Amp => Some(3),
            TokenKind::LtLt | TokenKind::GtGt => Some(4),
            TokenKind::Plus | TokenKind::Minus => Some(5),
            TokenKind::Star
            | TokenKind::Slash
            | TokenKind::SlashSlash
            | TokenKind::Percent
            | TokenKind::At => Some(6),
            _ => None,
        }
    }

    /// Whether this token starts a comparison operator (`not` only as `not in`).
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::EqEq
                | TokenKind::BangEq
                | TokenKind::In
                | TokenKind::Is
                | TokenKind::Not
        )
    }
}

/// Look up a keyword from an identifier string.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    let kind = match s {
        "True" => TokenKind::True,
        "False" => TokenKind::False,
        "None" => TokenKind::None,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "in" => TokenKind::In,
        "is" => TokenKind::Is,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "elif" => TokenKind::Elif,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "lambda" => TokenKind::Lambda,
        "import" => TokenKind::Import,
        "from" => TokenKind::From,
        "as" => TokenKind::As,
        "def" => TokenKind::Def,
        "class" => TokenKind::Class,
        "return" => TokenKind::Return,
        "yield" => TokenKind::Yield,
        "try" => TokenKind::Try,
        "except" => TokenKind::Except,
        "finally" => TokenKind::Finally,
        "raise" => TokenKind::Raise,
        "with" => TokenKind::With,
        "global" => TokenKind::Global,
        "nonlocal" => TokenKind::Nonlocal,
        "del" => TokenKind::Del,
        "pass" => TokenKind::Pass,
        "assert" => TokenKind::Assert,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "async" => TokenKind::Async,
        "await" => TokenKind::Await,
        _ => return None,
    };
    Some(kind)
}
