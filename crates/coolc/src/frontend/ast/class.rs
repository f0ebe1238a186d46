//! Cool class and feature AST nodes

use super::Expr;
use crate::common::Span;

/// A class declaration
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    /// Declared parent; `Object` when the source omits `inherits`
    pub parent: String,
    pub features: Vec<Feature>,
    /// Name of the source file the class was read from
    pub file: String,
    pub span: Span,
}

impl ClassDecl {
    pub fn new(
        name: String,
        parent: String,
        features: Vec<Feature>,
        file: String,
        span: Span,
    ) -> Self {
        Self { name, parent, features, file, span }
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.features.iter().filter_map(|f| match f {
            Feature::Method(m) => Some(m),
            Feature::Attribute(_) => None,
        })
    }
}

/// A class feature
#[derive(Debug, Clone)]
pub enum Feature {
    /// Attribute: x : Int <- 0
    Attribute(AttrDecl),
    /// Method: f(a : Int) : Int { a }
    Method(MethodDecl),
}

impl Feature {
    pub fn span(&self) -> Span {
        match self {
            Feature::Attribute(a) => a.span,
            Feature::Method(m) => m.span,
        }
    }
}

/// Attribute declaration
#[derive(Debug, Clone)]
pub struct AttrDecl {
    pub name: String,
    pub type_name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

/// Method declaration
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub formals: Vec<Formal>,
    pub return_type: String,
    pub body: Expr,
    pub span: Span,
}

/// Formal parameter
#[derive(Debug, Clone)]
pub struct Formal {
    pub name: String,
    pub type_name: String,
    pub span: Span,
}
