//! Indented rendering of a (type-annotated) program

use super::*;
use std::fmt::Write;

/// Render every class with one line per feature and expression
///
/// Expressions show their static type after a colon once the type checker
/// has run, `_no_type` before.
pub fn dump_program(program: &Program) -> String {
    let mut printer = TreePrinter::default();
    for class in &program.classes {
        printer.class(class);
    }
    printer.out
}

#[derive(Default)]
struct TreePrinter {
    out: String,
    depth: usize,
}

impl TreePrinter {
    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        let _ = self.out.write_fmt(text);
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn class(&mut self, class: &ClassDecl) {
        self.line(format_args!(
            "#{} class {} inherits {} ({})",
            class.span.line, class.name, class.parent, class.file
        ));
        self.nested(|p| {
            for feature in &class.features {
                match feature {
                    Feature::Attribute(attr) => {
                        p.line(format_args!("#{} attr {} : {}", attr.span.line, attr.name, attr.type_name));
                        if let Some(init) = &attr.init {
                            p.nested(|p| p.expr(init));
                        }
                    }
                    Feature::Method(method) => {
                        let formals: Vec<String> = method
                            .formals
                            .iter()
                            .map(|f| format!("{} : {}", f.name, f.type_name))
                            .collect();
                        p.line(format_args!(
                            "#{} method {}({}) : {}",
                            method.span.line,
                            method.name,
                            formals.join(", "),
                            method.return_type
                        ));
                        p.nested(|p| p.expr(&method.body));
                    }
                }
            }
        });
    }

    fn expr(&mut self, expr: &Expr) {
        let ty = expr.ty.as_ref().map_or("_no_type".to_string(), |t| t.to_string());
        let line = expr.span.line;

        match &expr.kind {
            ExprKind::IntConst(v) => self.line(format_args!("#{} int {} : {}", line, v, ty)),
            ExprKind::StrConst(s) => self.line(format_args!("#{} string {:?} : {}", line, s, ty)),
            ExprKind::BoolConst(b) => self.line(format_args!("#{} bool {} : {}", line, b, ty)),
            ExprKind::Object(name) => self.line(format_args!("#{} object {} : {}", line, name, ty)),
            ExprKind::New(name) => self.line(format_args!("#{} new {} : {}", line, name, ty)),

            ExprKind::Assign { name, value } => {
                self.line(format_args!("#{} assign {} : {}", line, name, ty));
                self.nested(|p| p.expr(value));
            }
            ExprKind::Dispatch { receiver, method, args } => {
                self.line(format_args!("#{} dispatch {} : {}", line, method, ty));
                self.nested(|p| {
                    match receiver {
                        Some(receiver) => p.expr(receiver),
                        None => p.line(format_args!("(self)")),
                    }
                    args.iter().for_each(|a| p.expr(a));
                });
            }
            ExprKind::StaticDispatch { receiver, type_name, method, args } => {
                self.line(format_args!("#{} static_dispatch {}.{} : {}", line, type_name, method, ty));
                self.nested(|p| {
                    p.expr(receiver);
                    args.iter().for_each(|a| p.expr(a));
                });
            }
            ExprKind::If { predicate, then_branch, else_branch } => {
                self.line(format_args!("#{} if : {}", line, ty));
                self.nested(|p| {
                    p.expr(predicate);
                    p.expr(then_branch);
                    p.expr(else_branch);
                });
            }
            ExprKind::While { predicate, body } => {
                self.line(format_args!("#{} while : {}", line, ty));
                self.nested(|p| {
                    p.expr(predicate);
                    p.expr(body);
                });
            }
            ExprKind::Block(body) => {
                self.line(format_args!("#{} block : {}", line, ty));
                self.nested(|p| body.iter().for_each(|e| p.expr(e)));
            }
            ExprKind::Let { name, type_name, init, body } => {
                self.line(format_args!("#{} let {} : {} : {}", line, name, type_name, ty));
                self.nested(|p| {
                    if let Some(init) = init {
                        p.expr(init);
                    }
                    p.expr(body);
                });
            }
            ExprKind::Case { scrutinee, branches } => {
                self.line(format_args!("#{} case : {}", line, ty));
                self.nested(|p| {
                    p.expr(scrutinee);
                    for branch in branches {
                        p.line(format_args!("#{} branch {} : {}", branch.span.line, branch.name, branch.type_name));
                        p.nested(|p| p.expr(&branch.body));
                    }
                });
            }
            ExprKind::Binary { op, left, right } => {
                self.line(format_args!("#{} {} : {}", line, op.symbol(), ty));
                self.nested(|p| {
                    p.expr(left);
                    p.expr(right);
                });
            }
            ExprKind::Unary { op, operand } => {
                let symbol = match op {
                    UnaryOp::Neg => "~",
                    UnaryOp::Not => "not",
                };
                self.line(format_args!("#{} {} : {}", line, symbol, ty));
                self.nested(|p| p.expr(operand));
            }
            ExprKind::IsVoid(operand) => {
                self.line(format_args!("#{} isvoid : {}", line, ty));
                self.nested(|p| p.expr(operand));
            }
        }
    }
}
