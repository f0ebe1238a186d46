//! Expression type checking and annotation

use super::class_table::{ClassOrigin, ClassTable};
use super::diagnostics::{Diagnostics, ErrorKind};
use super::features::{resolve_type_name, FeatureTable};
use super::lattice::TypeLattice;
use super::scope::Scope;
use crate::common::Span;
use crate::frontend::ast::*;
use crate::types::{names, Type};
use std::collections::HashSet;
use tracing::trace;

/// Bottom-up type checker over method bodies and attribute initializers
///
/// Every visited expression gets its static type stored in [`Expr::ty`].
/// An error is recorded once at the offending expression, which then takes
/// an explicit recovery type so that enclosing expressions stay checkable.
pub struct TypeChecker<'a> {
    classes: &'a ClassTable,
    features: &'a FeatureTable,
    lattice: TypeLattice<'a>,
    diagnostics: &'a mut Diagnostics,
    scope: Scope,
    /// Class whose features are being checked
    class_name: String,
    file: String,
}

impl<'a> TypeChecker<'a> {
    pub fn new(
        classes: &'a ClassTable,
        features: &'a FeatureTable,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            classes,
            features,
            lattice: TypeLattice::new(classes),
            diagnostics,
            scope: Scope::new(),
            class_name: String::new(),
            file: String::new(),
        }
    }

    /// Check every accepted, resolved class of `program`
    pub fn check_program(&mut self, program: &mut Program) {
        for (index, class) in program.classes.iter_mut().enumerate() {
            if self.diagnostics.halted() {
                break;
            }
            let accepted = self
                .classes
                .get(&class.name)
                .is_some_and(|info| info.origin == ClassOrigin::User(index));
            if accepted && self.classes.is_resolved(&class.name) {
                self.check_class(class);
            }
        }
    }

    pub fn check_class(&mut self, class: &mut ClassDecl) {
        trace!(class = %class.name, "type checking");
        self.class_name = class.name.clone();
        self.file = class.file.clone();
        self.scope = Scope::for_class(&class.name, self.classes, self.features);

        let mut seen_methods = HashSet::new();
        for feature in &mut class.features {
            if self.diagnostics.halted() {
                return;
            }
            match feature {
                Feature::Attribute(attr) => self.check_attribute(attr),
                Feature::Method(method) => {
                    let first = seen_methods.insert(method.name.clone());
                    self.check_method(method, first);
                }
            }
        }
    }

    fn check_attribute(&mut self, attr: &mut AttrDecl) {
        let Some(init) = &mut attr.init else { return };
        let declared = resolve_type_name(self.classes, &attr.type_name).unwrap_or_else(Type::object);

        let init_ty = self.check_expr(init);
        if !self.conforms(&init_ty, &declared, attr.span) {
            self.error(
                attr.span,
                format!(
                    "Inferred type {} of initialization of attribute {} does not conform to declared type {}.",
                    init_ty, attr.name, declared
                ),
            );
        }
    }

    /// `first` is false for a repeated declaration of the same name, which is
    /// checked against its own written signature
    fn check_method(&mut self, method: &mut MethodDecl, first: bool) {
        let features = self.features;
        let sig = features
            .own_method(&self.class_name, &method.name)
            .filter(|_| first);

        self.scope.push_scope();
        for (i, formal) in method.formals.iter().enumerate() {
            if formal.name == names::SELF || self.scope.declared_locally(&formal.name) {
                continue;
            }
            // An overriding method with a bad signature is checked against
            // the inherited one
            let ty = sig
                .and_then(|s| s.formals.get(i))
                .map(|f| f.ty.clone())
                .unwrap_or_else(|| match resolve_type_name(self.classes, &formal.type_name) {
                    Some(Type::Class(c)) => Type::Class(c),
                    _ => Type::object(),
                });
            self.scope.declare(&formal.name, ty);
        }

        let body_ty = self.check_expr(&mut method.body);
        let declared = sig
            .map(|s| s.return_type.clone())
            .or_else(|| resolve_type_name(self.classes, &method.return_type))
            .unwrap_or_else(Type::object);
        if !self.conforms(&body_ty, &declared, method.span) {
            self.error(
                method.span,
                format!(
                    "Inferred return type {} of method {} does not conform to declared return type {}.",
                    body_ty, method.name, declared
                ),
            );
        }
        self.scope.pop_scope();
    }

    /// Infer, record and return the static type of `expr`
    pub fn check_expr(&mut self, expr: &mut Expr) -> Type {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::IntConst(_) => Type::int(),
            ExprKind::StrConst(_) => Type::string(),
            ExprKind::BoolConst(_) => Type::bool(),

            ExprKind::Object(name) => match self.scope.lookup(name) {
                Some(ty) => ty,
                None => self.recover(span, format!("Undeclared identifier {}.", name), Type::object()),
            },

            ExprKind::Assign { name, value } => {
                let value_ty = self.check_expr(value);
                self.check_assign(span, name, value_ty)
            }

            ExprKind::Dispatch { receiver, method, args } => {
                let receiver_ty = match receiver {
                    Some(receiver) => self.check_expr(receiver),
                    None => Type::SelfType,
                };
                let arg_types = self.check_args(args);
                let dispatch_class = receiver_ty.resolve(&self.class_name).to_string();
                self.check_call(span, &receiver_ty, &dispatch_class, method, &arg_types)
            }

            ExprKind::StaticDispatch { receiver, type_name, method, args } => {
                let receiver_ty = self.check_expr(receiver);
                let arg_types = self.check_args(args);
                self.check_static_call(span, &receiver_ty, type_name, method, &arg_types)
            }

            ExprKind::New(type_name) => match resolve_type_name(self.classes, type_name) {
                Some(ty) => ty,
                None => self.recover(
                    span,
                    format!("'new' used with undefined class {}.", type_name),
                    Type::object(),
                ),
            },

            ExprKind::If { predicate, then_branch, else_branch } => {
                let predicate_ty = self.check_expr(predicate);
                if !predicate_ty.is(names::BOOL) {
                    self.error(predicate.span, "Predicate of 'if' does not have type Bool.");
                }
                let then_ty = self.check_expr(then_branch);
                let else_ty = self.check_expr(else_branch);
                self.lub(&then_ty, &else_ty, span)
            }

            ExprKind::While { predicate, body } => {
                let predicate_ty = self.check_expr(predicate);
                if !predicate_ty.is(names::BOOL) {
                    self.error(predicate.span, "Loop condition does not have type Bool.");
                }
                self.check_expr(body);
                Type::object()
            }

            ExprKind::Block(body) => {
                let mut last = Type::object();
                for expr in body.iter_mut() {
                    last = self.check_expr(expr);
                }
                last
            }

            ExprKind::Let { name, type_name, init, body } => {
                self.check_let(span, name, type_name, init.as_deref_mut(), body)
            }

            ExprKind::Case { scrutinee, branches } => {
                self.check_expr(scrutinee);
                self.check_case(span, branches)
            }

            ExprKind::Binary { op, left, right } => {
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                self.check_binary(span, *op, &left_ty, &right_ty)
            }

            ExprKind::Unary { op: UnaryOp::Neg, operand } => {
                let operand_ty = self.check_expr(operand);
                if !operand_ty.is(names::INT) {
                    self.error(span, format!("Argument of '~' has type {} instead of Int.", operand_ty));
                }
                Type::int()
            }

            ExprKind::Unary { op: UnaryOp::Not, operand } => {
                let operand_ty = self.check_expr(operand);
                if !operand_ty.is(names::BOOL) {
                    self.error(span, format!("Argument of 'not' has type {} instead of Bool.", operand_ty));
                }
                Type::bool()
            }

            ExprKind::IsVoid(operand) => {
                self.check_expr(operand);
                Type::bool()
            }
        };

        expr.ty = Some(ty.clone());
        ty
    }

    fn check_args(&mut self, args: &mut [Expr]) -> Vec<Type> {
        args.iter_mut().map(|arg| self.check_expr(arg)).collect()
    }

    fn check_assign(&mut self, span: Span, name: &str, value_ty: Type) -> Type {
        if name == names::SELF {
            return self.recover(span, "Cannot assign to 'self'.".to_string(), value_ty);
        }
        match self.scope.lookup(name) {
            None => self.recover(
                span,
                format!("Assignment to undeclared variable {}.", name),
                value_ty,
            ),
            Some(declared) if !self.conforms(&value_ty, &declared, span) => self.recover(
                span,
                format!(
                    "Type {} of assigned expression does not conform to declared type {} of identifier {}.",
                    value_ty, declared, name
                ),
                declared,
            ),
            Some(_) => value_ty,
        }
    }

    /// Look `method` up in `dispatch_class` and check the arguments against it
    ///
    /// A `SELF_TYPE` return resolves to the receiver's static type; for an
    /// implicit dispatch on `self` that is `SELF_TYPE` itself.
    fn check_call(
        &mut self,
        span: Span,
        receiver_ty: &Type,
        dispatch_class: &str,
        method: &str,
        arg_types: &[Type],
    ) -> Type {
        if !self.classes.is_resolved(dispatch_class) {
            return Type::object();
        }
        let features = self.features;
        let Some(sig) = features.lookup_method(self.classes, dispatch_class, method) else {
            return self.recover(span, format!("Dispatch to undefined method {}.", method), Type::object());
        };

        let result = if sig.return_type.is_self_type() {
            receiver_ty.clone()
        } else {
            sig.return_type.clone()
        };

        if arg_types.len() != sig.formals.len() {
            return self.recover(
                span,
                format!("Method {} called with wrong number of arguments.", method),
                result,
            );
        }
        for (arg_ty, formal) in arg_types.iter().zip(&sig.formals) {
            if !self.conforms(arg_ty, &formal.ty, span) {
                self.error(
                    span,
                    format!(
                        "In call of method {}, type {} of parameter {} does not conform to declared type {}.",
                        method, arg_ty, formal.name, formal.ty
                    ),
                );
            }
        }
        result
    }

    fn check_static_call(
        &mut self,
        span: Span,
        receiver_ty: &Type,
        type_name: &str,
        method: &str,
        arg_types: &[Type],
    ) -> Type {
        if type_name == names::SELF_TYPE {
            return self.recover(span, "Static dispatch to SELF_TYPE.".to_string(), Type::object());
        }
        if !self.classes.contains(type_name) {
            return self.recover(
                span,
                format!("Static dispatch to undefined class {}.", type_name),
                Type::object(),
            );
        }
        if !self.conforms(receiver_ty, &Type::class(type_name), span) {
            self.error(
                span,
                format!(
                    "Expression type {} does not conform to declared static dispatch type {}.",
                    receiver_ty, type_name
                ),
            );
        }
        self.check_call(span, receiver_ty, type_name, method, arg_types)
    }

    fn check_let(
        &mut self,
        span: Span,
        name: &str,
        type_name: &str,
        init: Option<&mut Expr>,
        body: &mut Expr,
    ) -> Type {
        if name == names::SELF {
            self.error(span, "'self' cannot be bound in a 'let' expression.");
        }
        let declared = match resolve_type_name(self.classes, type_name) {
            Some(ty) => ty,
            None => self.recover(
                span,
                format!("Class {} of let-bound identifier {} is undefined.", type_name, name),
                Type::object(),
            ),
        };

        if let Some(init) = init {
            let init_ty = self.check_expr(init);
            // A SELF_TYPE binding accepts any initializer
            if !declared.is_self_type() && !self.conforms(&init_ty, &declared, span) {
                self.error(
                    span,
                    format!(
                        "Inferred type {} of initialization of {} does not conform to identifier's declared type {}.",
                        init_ty, name, declared
                    ),
                );
            }
        }

        self.scope.push_scope();
        self.scope.declare(name, declared);
        let body_ty = self.check_expr(body);
        self.scope.pop_scope();
        body_ty
    }

    fn check_case(&mut self, span: Span, branches: &mut [CaseBranch]) -> Type {
        let mut seen: HashSet<String> = HashSet::new();
        let mut result: Option<Type> = None;

        for branch in branches.iter_mut() {
            if branch.name == names::SELF {
                self.error(branch.span, "'self' bound in 'case'.");
            }
            let branch_ty = if branch.type_name == names::SELF_TYPE {
                self.recover(
                    branch.span,
                    format!("Identifier {} declared with type SELF_TYPE in case branch.", branch.name),
                    Type::object(),
                )
            } else if self.classes.contains(&branch.type_name) {
                Type::class(branch.type_name.as_str())
            } else {
                self.recover(
                    branch.span,
                    format!("Class {} of case branch is undefined.", branch.type_name),
                    Type::object(),
                )
            };
            if !seen.insert(branch.type_name.clone()) {
                self.error(
                    branch.span,
                    format!("Duplicate branch {} in case statement.", branch.type_name),
                );
            }

            self.scope.push_scope();
            self.scope.declare(&branch.name, branch_ty);
            let body_ty = self.check_expr(&mut branch.body);
            self.scope.pop_scope();

            result = Some(match result {
                None => body_ty,
                Some(acc) => self.lub(&acc, &body_ty, span),
            });
        }

        result.unwrap_or_else(Type::object)
    }

    fn check_binary(&mut self, span: Span, op: BinOp, left: &Type, right: &Type) -> Type {
        match op {
            BinOp::Eq => {
                // A basic value never compares with an object
                if left.is_primitive() != right.is_primitive() {
                    self.error(span, "Illegal comparison with a basic type.");
                }
                Type::bool()
            }
            _ => {
                if !left.is(names::INT) || !right.is(names::INT) {
                    self.error(
                        span,
                        format!("non-Int arguments: {} {} {}", left, op.symbol(), right),
                    );
                }
                if op.is_comparison() { Type::bool() } else { Type::int() }
            }
        }
    }

    fn conforms(&mut self, sub: &Type, sup: &Type, span: Span) -> bool {
        match self.lattice.conforms(sub, sup, &self.class_name) {
            Ok(result) => result,
            Err(undefined) => {
                self.error(span, undefined.to_string());
                true
            }
        }
    }

    fn lub(&mut self, a: &Type, b: &Type, span: Span) -> Type {
        match self.lattice.lub(a, b, &self.class_name) {
            Ok(ty) => ty,
            Err(undefined) => self.recover(span, undefined.to_string(), Type::object()),
        }
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.report(ErrorKind::Type, &self.file, span, message);
    }

    /// Record an error and continue with `recovery` as the expression's type
    fn recover(&mut self, span: Span, message: String, recovery: Type) -> Type {
        self.error(span, message);
        recovery
    }
}
