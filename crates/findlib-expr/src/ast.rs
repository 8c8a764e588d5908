//! Tree node types for the constraint language.
//!
//! The parser builds a full tree even for constructs that constraints may
//! never use (calls, lambdas, assignments, statements). Keeping them as
//! distinct tags lets the validator reject them by name.

use crate::span::Span;

/// A parsed constraint source: one or more statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// A bare expression.
    Expr(Expr),
    /// `a = b = value`
    Assign { targets: Vec<Expr>, value: Expr },
    /// `a += value`
    AugAssign { target: Expr, value: Expr },
    /// A keyword-introduced statement (`import`, `while`, `def`, ...).
    ///
    /// Only the leading keyword is recorded; the remainder of the statement
    /// is skipped because it can never be accepted.
    Keyword(NodeKind),
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Literal constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Name(String),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    /// `value.attr`
    Attribute { value: Box<Expr>, attr: String },
    /// `value[index]`; `index` may be a `Slice`.
    Subscript { value: Box<Expr>, index: Box<Expr> },
    /// `lower:upper:step` inside a subscript.
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    /// Chained comparison: `left op0 c0 op1 c1 ...`
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    /// `a and b and c` / `a or b`
    BoolOp { op: BoolOp, values: Vec<Expr> },
    /// `[elt for target in iter if cond ...]`
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },

    // Parsed so they can be rejected by name.
    Call { func: Box<Expr>, args: Vec<Expr> },
    Lambda { params: Vec<String>, body: Box<Expr> },
    NamedExpr { target: Box<Expr>, value: Box<Expr> },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    GeneratorExp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    Dict(Vec<(Expr, Expr)>),
    Set(Vec<Expr>),
    Starred(Box<Expr>),
    Yield(Option<Box<Expr>>),
    Await(Box<Expr>),
}

/// One `for target in iter if ...` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    MatMul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::MatMul => "@",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitAnd => "&",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtE => "<=",
            Self::Gt => ">",
            Self::GtE => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Is => "is",
            Self::IsNot => "is not",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Every node tag the parser can produce.
///
/// The validator consults its allow and deny lists by these tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Structure
    Program,
    ExprStmt,
    Comprehension,

    // Pure expression tags
    Literal,
    Name,
    Tuple,
    List,
    Attribute,
    Subscript,
    Slice,
    BinOp,
    UnaryOp,
    Compare,
    BoolOp,
    ListComp,

    // Expression tags that are never allowed
    Call,
    Lambda,
    NamedExpr,
    IfExp,
    GeneratorExp,
    Dict,
    Set,
    Starred,
    Yield,
    Await,

    // Statements
    Assign,
    AugAssign,
    Import,
    ImportFrom,
    FunctionDef,
    ClassDef,
    If,
    While,
    For,
    Try,
    Raise,
    Return,
    Pass,
    Break,
    Continue,
    Delete,
    Assert,
    Global,
    Nonlocal,
    With,
    Async,
}

impl ExprKind {
    /// The tag of this expression.
    pub fn node_kind(&self) -> NodeKind {
        match self {
            Self::Literal(_) => NodeKind::Literal,
            Self::Name(_) => NodeKind::Name,
            Self::Tuple(_) => NodeKind::Tuple,
            Self::List(_) => NodeKind::List,
            Self::Attribute { .. } => NodeKind::Attribute,
            Self::Subscript { .. } => NodeKind::Subscript,
            Self::Slice { .. } => NodeKind::Slice,
            Self::BinOp { .. } => NodeKind::BinOp,
            Self::UnaryOp { .. } => NodeKind::UnaryOp,
            Self::Compare { .. } => NodeKind::Compare,
            Self::BoolOp { .. } => NodeKind::BoolOp,
            Self::ListComp { .. } => NodeKind::ListComp,
            Self::Call { .. } => NodeKind::Call,
            Self::Lambda { .. } => NodeKind::Lambda,
            Self::NamedExpr { .. } => NodeKind::NamedExpr,
            Self::IfExp { .. } => NodeKind::IfExp,
            Self::GeneratorExp { .. } => NodeKind::GeneratorExp,
            Self::Dict(_) => NodeKind::Dict,
            Self::Set(_) => NodeKind::Set,
            Self::Starred(_) => NodeKind::Starred,
            Self::Yield(_) => NodeKind::Yield,
            Self::Await(_) => NodeKind::Await,
        }
    }
}

impl StmtKind {
    /// The tag of this statement.
    pub fn node_kind(&self) -> NodeKind {
        match self {
            Self::Expr(_) => NodeKind::ExprStmt,
            Self::Assign { .. } => NodeKind::Assign,
            Self::AugAssign { .. } => NodeKind::AugAssign,
            Self::Keyword(kind) => *kind,
        }
    }
}
