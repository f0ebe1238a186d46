//! Cool recursive descent parser

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::ast::*;
use crate::frontend::lexer::{CoolLexer, CoolToken, CoolTokenKind};
use crate::types::names;

/// Cool parser
pub struct CoolParser<'a> {
    lexer: CoolLexer<'a>,
    filename: String,
    /// Span of the most recently consumed token
    prev: Span,
}

impl<'a> CoolParser<'a> {
    pub fn new(source: &'a str, filename: impl Into<String>) -> Self {
        Self {
            lexer: CoolLexer::new(source),
            filename: filename.into(),
            prev: Span::default(),
        }
    }

    /// Parse a complete file: one or more `class ... ;` declarations
    pub fn parse_program(&mut self) -> CompileResult<Program> {
        let mut classes = Vec::new();

        loop {
            classes.push(self.parse_class()?);
            self.expect(CoolTokenKind::Semi)?;
            if self.check(&CoolTokenKind::Eof)? {
                break;
            }
        }

        Ok(Program::new(classes))
    }

    // ==================== Classes ====================

    fn parse_class(&mut self) -> CompileResult<ClassDecl> {
        let start = self.expect(CoolTokenKind::Class)?.span;
        let name = self.expect_type_id()?;

        let parent = if self.match_token(&CoolTokenKind::Inherits)? {
            self.expect_type_id()?
        } else {
            names::OBJECT.to_string()
        };

        self.expect(CoolTokenKind::LBrace)?;
        let mut features = Vec::new();
        while !self.check(&CoolTokenKind::RBrace)? {
            features.push(self.parse_feature()?);
            self.expect(CoolTokenKind::Semi)?;
        }
        let end = self.expect(CoolTokenKind::RBrace)?.span;

        Ok(ClassDecl::new(name, parent, features, self.filename.clone(), start.to(end)))
    }

    fn parse_feature(&mut self) -> CompileResult<Feature> {
        let start = self.lexer.peek()?.span;
        let name = self.expect_object_id()?;

        if self.match_token(&CoolTokenKind::LParen)? {
            let formals = self.parse_formals()?;
            self.expect(CoolTokenKind::RParen)?;
            self.expect(CoolTokenKind::Colon)?;
            let return_type = self.expect_type_id()?;
            self.expect(CoolTokenKind::LBrace)?;
            let body = self.parse_expr()?;
            let end = self.expect(CoolTokenKind::RBrace)?.span;

            Ok(Feature::Method(MethodDecl {
                name,
                formals,
                return_type,
                body,
                span: start.to(end),
            }))
        } else {
            self.expect(CoolTokenKind::Colon)?;
            let type_name = self.expect_type_id()?;
            let init = if self.match_token(&CoolTokenKind::Assign)? {
                Some(self.parse_expr()?)
            } else {
                None
            };

            Ok(Feature::Attribute(AttrDecl {
                name,
                type_name,
                init,
                span: start.to(self.prev),
            }))
        }
    }

    fn parse_formals(&mut self) -> CompileResult<Vec<Formal>> {
        let mut formals = Vec::new();

        if !self.check(&CoolTokenKind::RParen)? {
            formals.push(self.parse_formal()?);
            while self.match_token(&CoolTokenKind::Comma)? {
                formals.push(self.parse_formal()?);
            }
        }

        Ok(formals)
    }

    fn parse_formal(&mut self) -> CompileResult<Formal> {
        let start = self.lexer.peek()?.span;
        let name = self.expect_object_id()?;
        self.expect(CoolTokenKind::Colon)?;
        let type_name = self.expect_type_id()?;
        Ok(Formal { name, type_name, span: start.to(self.prev) })
    }

    // ==================== Expressions ====================

    pub fn parse_expr(&mut self) -> CompileResult<Expr> {
        self.parse_expr_with_precedence(0)
    }

    fn parse_expr_with_precedence(&mut self, min_prec: u8) -> CompileResult<Expr> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op()? {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }

            self.advance()?; // consume operator
            let right = self.parse_expr_with_precedence(prec + 1)?;

            let span = left.span.to(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );

            if op.is_comparison() {
                if let Some(next) = self.peek_binary_op()? {
                    if next.is_comparison() {
                        let token = self.lexer.peek()?;
                        return Err(CompileError::parser(
                            format!("comparison operators do not associate, found {}", token.kind),
                            token.span,
                        ));
                    }
                }
            }
        }

        Ok(left)
    }

    fn peek_binary_op(&mut self) -> CompileResult<Option<BinOp>> {
        Ok(match &self.lexer.peek()?.kind {
            CoolTokenKind::Plus => Some(BinOp::Add),
            CoolTokenKind::Minus => Some(BinOp::Sub),
            CoolTokenKind::Star => Some(BinOp::Mul),
            CoolTokenKind::Slash => Some(BinOp::Div),
            CoolTokenKind::Lt => Some(BinOp::Lt),
            CoolTokenKind::Le => Some(BinOp::Le),
            CoolTokenKind::Eq => Some(BinOp::Eq),
            _ => None,
        })
    }

    fn parse_unary_expr(&mut self) -> CompileResult<Expr> {
        let start = self.lexer.peek()?.span;

        // `not` binds looser than the comparisons
        if self.match_token(&CoolTokenKind::Not)? {
            let operand = self.parse_expr_with_precedence(1)?;
            let span = start.to(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) },
                span,
            ));
        }

        if self.match_token(&CoolTokenKind::IsVoid)? {
            let operand = self.parse_unary_expr()?;
            let span = start.to(operand.span);
            return Ok(Expr::new(ExprKind::IsVoid(Box::new(operand)), span));
        }

        if self.match_token(&CoolTokenKind::Tilde)? {
            let operand = self.parse_unary_expr()?;
            let span = start.to(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary { op: UnaryOp::Neg, operand: Box::new(operand) },
                span,
            ));
        }

        self.parse_postfix_expr()
    }

    fn parse_postfix_expr(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            if self.match_token(&CoolTokenKind::At)? {
                let type_name = self.expect_type_id()?;
                self.expect(CoolTokenKind::Dot)?;
                let method = self.expect_object_id()?;
                let args = self.parse_call_args()?;
                let span = expr.span.to(self.prev);
                expr = Expr::new(
                    ExprKind::StaticDispatch {
                        receiver: Box::new(expr),
                        type_name,
                        method,
                        args,
                    },
                    span,
                );
            } else if self.match_token(&CoolTokenKind::Dot)? {
                let method = self.expect_object_id()?;
                let args = self.parse_call_args()?;
                let span = expr.span.to(self.prev);
                expr = Expr::new(
                    ExprKind::Dispatch {
                        receiver: Some(Box::new(expr)),
                        method,
                        args,
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse `( e1, ..., en )`
    fn parse_call_args(&mut self) -> CompileResult<Vec<Expr>> {
        self.expect(CoolTokenKind::LParen)?;
        let mut args = Vec::new();

        if !self.check(&CoolTokenKind::RParen)? {
            args.push(self.parse_expr()?);
            while self.match_token(&CoolTokenKind::Comma)? {
                args.push(self.parse_expr()?);
            }
        }

        self.expect(CoolTokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary_expr(&mut self) -> CompileResult<Expr> {
        let token = self.advance()?;
        let start = token.span;

        let expr = match token.kind {
            CoolTokenKind::IntConst(value) => Expr::new(ExprKind::IntConst(value), start),
            CoolTokenKind::StrConst(value) => Expr::new(ExprKind::StrConst(value), start),
            CoolTokenKind::BoolConst(value) => Expr::new(ExprKind::BoolConst(value), start),

            CoolTokenKind::ObjectId(name) => {
                if self.match_token(&CoolTokenKind::Assign)? {
                    let value = self.parse_expr()?;
                    let span = start.to(value.span);
                    Expr::new(ExprKind::Assign { name, value: Box::new(value) }, span)
                } else if self.check(&CoolTokenKind::LParen)? {
                    let args = self.parse_call_args()?;
                    Expr::new(
                        ExprKind::Dispatch { receiver: None, method: name, args },
                        start.to(self.prev),
                    )
                } else {
                    Expr::new(ExprKind::Object(name), start)
                }
            }

            CoolTokenKind::New => {
                let type_name = self.expect_type_id()?;
                Expr::new(ExprKind::New(type_name), start.to(self.prev))
            }

            CoolTokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(CoolTokenKind::RParen)?;
                inner
            }

            CoolTokenKind::LBrace => {
                let mut body = Vec::new();
                loop {
                    body.push(self.parse_expr()?);
                    self.expect(CoolTokenKind::Semi)?;
                    if self.check(&CoolTokenKind::RBrace)? {
                        break;
                    }
                }
                let end = self.expect(CoolTokenKind::RBrace)?.span;
                Expr::new(ExprKind::Block(body), start.to(end))
            }

            CoolTokenKind::If => self.parse_if_expr(start)?,
            CoolTokenKind::While => self.parse_while_expr(start)?,
            CoolTokenKind::Let => self.parse_let_bindings(start)?,
            CoolTokenKind::Case => self.parse_case_expr(start)?,

            other => {
                return Err(CompileError::parser(
                    format!("expected expression, found {}", other),
                    start,
                ));
            }
        };

        Ok(expr)
    }

    fn parse_if_expr(&mut self, start: Span) -> CompileResult<Expr> {
        let predicate = self.parse_expr()?;
        self.expect(CoolTokenKind::Then)?;
        let then_branch = self.parse_expr()?;
        self.expect(CoolTokenKind::Else)?;
        let else_branch = self.parse_expr()?;
        let end = self.expect(CoolTokenKind::Fi)?.span;

        Ok(Expr::new(
            ExprKind::If {
                predicate: Box::new(predicate),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            start.to(end),
        ))
    }

    fn parse_while_expr(&mut self, start: Span) -> CompileResult<Expr> {
        let predicate = self.parse_expr()?;
        self.expect(CoolTokenKind::Loop)?;
        let body = self.parse_expr()?;
        let end = self.expect(CoolTokenKind::Pool)?.span;

        Ok(Expr::new(
            ExprKind::While {
                predicate: Box::new(predicate),
                body: Box::new(body),
            },
            start.to(end),
        ))
    }

    /// Parse the bindings of a `let` after the keyword (or after a comma),
    /// nesting one `Let` node per binding
    fn parse_let_bindings(&mut self, start: Span) -> CompileResult<Expr> {
        let name = self.expect_object_id()?;
        self.expect(CoolTokenKind::Colon)?;
        let type_name = self.expect_type_id()?;
        let init = if self.match_token(&CoolTokenKind::Assign)? {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        let body = if self.match_token(&CoolTokenKind::Comma)? {
            let next = self.lexer.peek()?.span;
            self.parse_let_bindings(next)?
        } else {
            self.expect(CoolTokenKind::In)?;
            self.parse_expr()?
        };

        let span = start.to(body.span);
        Ok(Expr::new(
            ExprKind::Let { name, type_name, init, body: Box::new(body) },
            span,
        ))
    }

    fn parse_case_expr(&mut self, start: Span) -> CompileResult<Expr> {
        let scrutinee = self.parse_expr()?;
        self.expect(CoolTokenKind::Of)?;

        let mut branches = Vec::new();
        loop {
            let branch_start = self.lexer.peek()?.span;
            let name = self.expect_object_id()?;
            self.expect(CoolTokenKind::Colon)?;
            let type_name = self.expect_type_id()?;
            self.expect(CoolTokenKind::DArrow)?;
            let body = self.parse_expr()?;
            self.expect(CoolTokenKind::Semi)?;
            branches.push(CaseBranch {
                name,
                type_name,
                body,
                span: branch_start.to(self.prev),
            });
            if self.check(&CoolTokenKind::Esac)? {
                break;
            }
        }
        let end = self.expect(CoolTokenKind::Esac)?.span;

        Ok(Expr::new(
            ExprKind::Case { scrutinee: Box::new(scrutinee), branches },
            start.to(end),
        ))
    }

    // ==================== Helpers ====================

    fn advance(&mut self) -> CompileResult<CoolToken> {
        let token = self.lexer.next_token()?;
        self.prev = token.span;
        Ok(token)
    }

    fn check(&mut self, expected: &CoolTokenKind) -> CompileResult<bool> {
        self.lexer.check(expected)
    }

    fn match_token(&mut self, expected: &CoolTokenKind) -> CompileResult<bool> {
        if self.check(expected)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, expected: CoolTokenKind) -> CompileResult<CoolToken> {
        let token = self.lexer.expect(expected)?;
        self.prev = token.span;
        Ok(token)
    }

    fn expect_type_id(&mut self) -> CompileResult<String> {
        let token = self.advance()?;
        match token.kind {
            CoolTokenKind::TypeId(name) => Ok(name),
            other => Err(CompileError::parser(
                format!("expected type identifier, found {}", other),
                token.span,
            )),
        }
    }

    fn expect_object_id(&mut self) -> CompileResult<String> {
        let token = self.advance()?;
        match token.kind {
            CoolTokenKind::ObjectId(name) => Ok(name),
            other => Err(CompileError::parser(
                format!("expected identifier, found {}", other),
                token.span,
            )),
        }
    }
}
