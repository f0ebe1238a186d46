//! Cool expression AST nodes

use crate::common::Span;
use crate::types::Type;

/// A Cool expression
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Static type, filled in by the type checker
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span, ty: None }
    }
}

/// Expression kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer constant: 42
    IntConst(i64),
    /// String constant: "hello"
    StrConst(String),
    /// Boolean constant: true, false
    BoolConst(bool),

    /// Identifier reference: x, self
    Object(String),

    /// Assignment: x <- e
    Assign {
        name: String,
        value: Box<Expr>,
    },

    /// Dynamic dispatch: e.m(args), or m(args) with an implicit `self`
    Dispatch {
        /// `None` for an implicit dispatch on `self`
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
    },
    /// Static dispatch: e@T.m(args)
    StaticDispatch {
        receiver: Box<Expr>,
        type_name: String,
        method: String,
        args: Vec<Expr>,
    },

    /// Object creation: new T
    New(String),

    /// Conditional: if p then a else b fi
    If {
        predicate: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Loop: while p loop b pool
    While {
        predicate: Box<Expr>,
        body: Box<Expr>,
    },
    /// Block: { e1; ...; en; }
    Block(Vec<Expr>),

    /// Single binding let; multi-binding lets are nested by the parser
    Let {
        name: String,
        type_name: String,
        init: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    /// Typecase: case e of x : T => b; ... esac
    Case {
        scrutinee: Box<Expr>,
        branches: Vec<CaseBranch>,
    },

    /// Binary operation: a + b, a < b, a = b
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation: ~a, not a
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Void test: isvoid e
    IsVoid(Box<Expr>),
}

/// One branch of a case expression
#[derive(Debug, Clone)]
pub struct CaseBranch {
    pub name: String,
    pub type_name: String,
    pub body: Expr,
    pub span: Span,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Eq,
}

impl BinOp {
    /// Get operator precedence (higher = binds tighter)
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Lt | BinOp::Le | BinOp::Eq => 1,
            BinOp::Add | BinOp::Sub => 2,
            BinOp::Mul | BinOp::Div => 3,
        }
    }

    /// Comparisons do not associate: `a < b < c` is a syntax error
    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Eq)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Eq => "=",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Integer negation: ~
    Neg,
    /// Boolean negation: not
    Not,
}
