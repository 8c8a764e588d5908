//! Recursive descent parser for the constraint language.
//!
//! The grammar is a subset of Python's expression grammar, plus enough of
//! its statement grammar to name rejected constructs. Binary arithmetic and
//! bitwise operators use precedence climbing.

use crate::ast::{
    BinOp, BoolOp, CmpOp, Comprehension, Expr, ExprKind, Literal, NodeKind, Program, Stmt,
    StmtKind, UnaryOp,
};
use crate::error::ExprError;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Nesting limit to keep pathological input from exhausting the stack.
const MAX_DEPTH: u32 = 64;

/// The parser.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// End offset of the most recently consumed token.
    prev_end: u32,
    depth: u32,
}

impl<'a> Parser<'a> {
    /// Create a new parser.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            prev_end: 0,
            depth: 0,
        }
    }

    /// Parse the entire source into a program.
    pub fn parse(mut self) -> Result<Program, ExprError> {
        let mut body = Vec::new();

        self.skip_separators();
        while !self.is_eof() {
            body.push(self.parse_stmt()?);
            if !self.is_eof()
                && !self.check(&TokenKind::Semicolon)
                && !self.check(&TokenKind::Newline)
            {
                return Err(self.unexpected());
            }
            self.skip_separators();
        }

        Ok(Program { body })
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &TokenKind {
        &self.current.kind
    }

    fn advance(&mut self) -> Token {
        self.prev_end = self.current.span.end;
        std::mem::replace(&mut self.current, self.lexer.next_token())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ExprError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ExprError::syntax(
                format!("expected {what}, found {}", describe(self.peek())),
                self.current.span,
            ))
        }
    }

    fn is_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), TokenKind::Semicolon | TokenKind::Newline) {
            self.advance();
        }
    }

    fn unexpected(&self) -> ExprError {
        match self.peek() {
            TokenKind::Invalid(message) => ExprError::syntax(message.clone(), self.current.span),
            other => ExprError::syntax(
                format!("unexpected {}", describe(other)),
                self.current.span,
            ),
        }
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::syntax(
                "expression nested too deeply",
                self.current.span,
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_stmt(&mut self) -> Result<Stmt, ExprError> {
        let start = self.current.span.start;

        if let Some(kind) = statement_keyword(self.peek()) {
            // Skip to the end of the statement; it is rejected regardless of
            // what follows the keyword.
            while !matches!(
                self.peek(),
                TokenKind::Semicolon | TokenKind::Newline | TokenKind::Eof
            ) {
                self.advance();
            }
            return Ok(Stmt {
                kind: StmtKind::Keyword(kind),
                span: self.span_from(start),
            });
        }

        let first = self.parse_testlist_star()?;

        if self.check(&TokenKind::AugAssign) {
            self.advance();
            let value = self.parse_testlist()?;
            return Ok(Stmt {
                kind: StmtKind::AugAssign {
                    target: first,
                    value,
                },
                span: self.span_from(start),
            });
        }

        if self.check(&TokenKind::Eq) {
            let mut targets = vec![first];
            let mut value = None;
            while self.eat(&TokenKind::Eq) {
                let next = self.parse_testlist_star()?;
                if let Some(prev) = value.replace(next) {
                    targets.push(prev);
                }
            }
            let value = value.ok_or_else(|| self.unexpected())?;
            return Ok(Stmt {
                kind: StmtKind::Assign { targets, value },
                span: self.span_from(start),
            });
        }

        Ok(Stmt {
            kind: StmtKind::Expr(first),
            span: self.span_from(start),
        })
    }

    // ------------------------------------------------------------------
    // Expression lists
    // ------------------------------------------------------------------

    /// `test (',' test)* [',']`, with `*expr` allowed as an element.
    fn parse_testlist_star(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;
        let first = self.parse_test_or_star()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat(&TokenKind::Comma) {
            if !starts_expression(self.peek()) {
                break;
            }
            elts.push(self.parse_test_or_star()?);
        }
        Ok(Expr::new(ExprKind::Tuple(elts), self.span_from(start)))
    }

    fn parse_testlist(&mut self) -> Result<Expr, ExprError> {
        self.parse_testlist_star()
    }

    fn parse_test_or_star(&mut self) -> Result<Expr, ExprError> {
        if self.check(&TokenKind::Star) {
            let start = self.current.span.start;
            self.advance();
            let value = self.parse_bitor()?;
            return Ok(Expr::new(
                ExprKind::Starred(Box::new(value)),
                self.span_from(start),
            ));
        }
        self.parse_test()
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// `lambda | or_test ['if' or_test 'else' test] [':=' test]`
    fn parse_test(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let result = self.parse_test_inner();
        self.leave();
        result
    }

    fn parse_test_inner(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;

        if self.check(&TokenKind::Lambda) {
            return self.parse_lambda();
        }

        let expr = self.parse_or_test()?;

        if self.check(&TokenKind::ColonEq) {
            self.advance();
            let value = self.parse_test()?;
            return Ok(Expr::new(
                ExprKind::NamedExpr {
                    target: Box::new(expr),
                    value: Box::new(value),
                },
                self.span_from(start),
            ));
        }

        if self.check(&TokenKind::If) {
            self.advance();
            let test = self.parse_or_test()?;
            self.expect(&TokenKind::Else, "'else'")?;
            let orelse = self.parse_test()?;
            return Ok(Expr::new(
                ExprKind::IfExp {
                    test: Box::new(test),
                    body: Box::new(expr),
                    orelse: Box::new(orelse),
                },
                self.span_from(start),
            ));
        }

        Ok(expr)
    }

    fn parse_lambda(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;
        self.advance();

        let mut params = Vec::new();
        while let TokenKind::Name(name) = self.peek() {
            params.push(name.clone());
            self.advance();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Colon, "':'")?;
        let body = self.parse_test()?;

        Ok(Expr::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn parse_or_test(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;
        let first = self.parse_and_test()?;
        if !self.check(&TokenKind::Or) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(&TokenKind::Or) {
            values.push(self.parse_and_test()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOp::Or,
                values,
            },
            self.span_from(start),
        ))
    }

    fn parse_and_test(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;
        let first = self.parse_not_test()?;
        if !self.check(&TokenKind::And) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(&TokenKind::And) {
            values.push(self.parse_not_test()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOp::And,
                values,
            },
            self.span_from(start),
        ))
    }

    fn parse_not_test(&mut self) -> Result<Expr, ExprError> {
        if self.check(&TokenKind::Not) {
            let start = self.current.span.start;
            self.advance();
            self.enter()?;
            let operand = self.parse_not_test();
            self.leave();
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand?),
                },
                self.span_from(start),
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;
        let left = self.parse_bitor()?;

        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while self.peek().is_comparison() {
            let token = self.advance();
            let op = match token.kind {
                TokenKind::Lt => CmpOp::Lt,
                TokenKind::Gt => CmpOp::Gt,
                TokenKind::LtEq => CmpOp::LtE,
                TokenKind::GtEq => CmpOp::GtE,
                TokenKind::EqEq => CmpOp::Eq,
                TokenKind::BangEq => CmpOp::NotEq,
                TokenKind::In => CmpOp::In,
                TokenKind::Is => {
                    if self.eat(&TokenKind::Not) {
                        CmpOp::IsNot
                    } else {
                        CmpOp::Is
                    }
                }
                TokenKind::Not => {
                    self.expect(&TokenKind::In, "'in' after 'not'")?;
                    CmpOp::NotIn
                }
                other => {
                    return Err(ExprError::syntax(
                        format!("unexpected {}", describe(&other)),
                        token.span,
                    ))
                }
            };
            ops.push(op);
            comparators.push(self.parse_bitor()?);
        }

        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                ops,
                comparators,
            },
            self.span_from(start),
        ))
    }

    fn parse_bitor(&mut self) -> Result<Expr, ExprError> {
        self.parse_binary_expr(1)
    }

    /// Parse binary expression using precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> Result<Expr, ExprError> {
        let start = self.current.span.start;
        let mut left = self.parse_factor()?;

        // Each iteration wraps `left` one level deeper.
        let mut chained = 0;
        loop {
            let (prec, op) = match (self.peek().binary_precedence(), binary_op(self.peek())) {
                (Some(prec), Some(op)) if prec >= min_prec => (prec, op),
                _ => break,
            };
            self.advance();
            self.enter()?;
            chained += 1;
            let right = self.parse_binary_expr(prec + 1)?;

            left = Expr::new(
                ExprKind::BinOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                self.span_from(start),
            );
        }
        self.depth -= chained;

        Ok(left)
    }

    /// `('+'|'-'|'~') factor | power`
    fn parse_factor(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Tilde => Some(UnaryOp::Invert),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_power();
        };

        let start = self.current.span.start;
        self.advance();
        self.enter()?;
        let operand = self.parse_factor();
        self.leave();
        Ok(Expr::new(
            ExprKind::UnaryOp {
                op,
                operand: Box::new(operand?),
            },
            self.span_from(start),
        ))
    }

    /// `['await'] primary ['**' factor]`; `**` is right associative and
    /// binds tighter than a unary operator on its left.
    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;

        let base = if self.check(&TokenKind::Await) {
            self.advance();
            let inner = self.parse_primary()?;
            Expr::new(ExprKind::Await(Box::new(inner)), self.span_from(start))
        } else {
            self.parse_primary()?
        };

        if !self.eat(&TokenKind::StarStar) {
            return Ok(base);
        }
        self.enter()?;
        let exponent = self.parse_factor();
        self.leave();
        Ok(Expr::new(
            ExprKind::BinOp {
                op: BinOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent?),
            },
            self.span_from(start),
        ))
    }

    /// `atom trailer*`
    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;
        let mut expr = self.parse_atom()?;

        let mut chained = 0;
        loop {
            if matches!(
                self.peek(),
                TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.enter()?;
                chained += 1;
            }
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let attr = match self.peek() {
                        TokenKind::Name(name) => name.clone(),
                        _ => {
                            return Err(ExprError::syntax(
                                "expected attribute name after '.'",
                                self.current.span,
                            ))
                        }
                    };
                    self.advance();
                    expr = Expr::new(
                        ExprKind::Attribute {
                            value: Box::new(expr),
                            attr,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_subscript_list()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expr::new(
                        ExprKind::Subscript {
                            value: Box::new(expr),
                            index: Box::new(index),
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    self.expect(&TokenKind::RParen, "')'")?;
                    expr = Expr::new(
                        ExprKind::Call {
                            func: Box::new(expr),
                            args,
                        },
                        self.span_from(start),
                    );
                }
                _ => break,
            }
        }
        self.depth -= chained;

        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let start = self.current.span.start;
            let arg = if self.eat(&TokenKind::Star) || self.eat(&TokenKind::StarStar) {
                let value = self.parse_test()?;
                Expr::new(ExprKind::Starred(Box::new(value)), self.span_from(start))
            } else {
                let value = self.parse_test()?;
                if self.eat(&TokenKind::Eq) {
                    // Keyword argument: keep only the value.
                    self.parse_test()?
                } else if self.check(&TokenKind::For) {
                    let generators = self.parse_comp_for()?;
                    Expr::new(
                        ExprKind::GeneratorExp {
                            elt: Box::new(value),
                            generators,
                        },
                        self.span_from(start),
                    )
                } else {
                    value
                }
            };
            args.push(arg);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn parse_subscript_list(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;
        let first = self.parse_subscript()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            elts.push(self.parse_subscript()?);
        }
        Ok(Expr::new(ExprKind::Tuple(elts), self.span_from(start)))
    }

    /// `test | [test] ':' [test] [':' [test]]`
    fn parse_subscript(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;

        let lower = if self.check(&TokenKind::Colon) {
            None
        } else {
            let expr = self.parse_test()?;
            if !self.check(&TokenKind::Colon) {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };

        self.expect(&TokenKind::Colon, "':'")?;
        let upper = self.parse_optional_slice_part()?;
        let step = if self.eat(&TokenKind::Colon) {
            self.parse_optional_slice_part()?
        } else {
            None
        };

        Ok(Expr::new(
            ExprKind::Slice { lower, upper, step },
            self.span_from(start),
        ))
    }

    fn parse_optional_slice_part(&mut self) -> Result<Option<Box<Expr>>, ExprError> {
        if matches!(
            self.peek(),
            TokenKind::Colon | TokenKind::RBracket | TokenKind::Comma
        ) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.parse_test()?)))
        }
    }

    /// One or more `for target in iter (if cond)*` clauses.
    fn parse_comp_for(&mut self) -> Result<Vec<Comprehension>, ExprError> {
        let mut generators = Vec::new();
        while self.check(&TokenKind::For) {
            let start = self.current.span.start;
            self.advance();

            let target_start = self.current.span.start;
            let first = self.parse_bitor()?;
            let target = if self.check(&TokenKind::Comma) {
                let mut elts = vec![first];
                while self.eat(&TokenKind::Comma) {
                    if self.check(&TokenKind::In) {
                        break;
                    }
                    elts.push(self.parse_bitor()?);
                }
                Expr::new(ExprKind::Tuple(elts), self.span_from(target_start))
            } else {
                first
            };

            self.expect(&TokenKind::In, "'in'")?;
            let iter = self.parse_or_test()?;

            let mut ifs = Vec::new();
            while self.eat(&TokenKind::If) {
                ifs.push(self.parse_or_test()?);
            }

            generators.push(Comprehension {
                target,
                iter,
                ifs,
                span: self.span_from(start),
            });
        }
        Ok(generators)
    }

    fn parse_atom(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span.start;

        let kind = match self.peek().clone() {
            TokenKind::Name(name) => {
                self.advance();
                ExprKind::Name(name)
            }
            TokenKind::Int(n) => {
                self.advance();
                ExprKind::Literal(Literal::Int(n))
            }
            TokenKind::Float(f) => {
                self.advance();
                ExprKind::Literal(Literal::Float(f))
            }
            TokenKind::String(s) => {
                self.advance();
                let mut s = s;
                // Adjacent string literals concatenate.
                while let TokenKind::String(next) = self.peek() {
                    s.push_str(next);
                    self.advance();
                }
                ExprKind::Literal(Literal::Str(s))
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Literal(Literal::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Literal(Literal::Bool(false))
            }
            TokenKind::None => {
                self.advance();
                ExprKind::Literal(Literal::None)
            }
            TokenKind::LParen => {
                self.advance();
                self.enter()?;
                let inner = self.parse_paren_body(start);
                self.leave();
                let inner = inner?;
                self.expect(&TokenKind::RParen, "')'")?;
                return Ok(Expr::new(inner.kind, self.span_from(start)));
            }
            TokenKind::LBracket => {
                self.advance();
                self.enter()?;
                let inner = self.parse_list_body();
                self.leave();
                let kind = inner?;
                self.expect(&TokenKind::RBracket, "']'")?;
                kind
            }
            TokenKind::LBrace => {
                self.advance();
                self.enter()?;
                let inner = self.parse_brace_body();
                self.leave();
                let kind = inner?;
                self.expect(&TokenKind::RBrace, "'}'")?;
                kind
            }
            _ => return Err(self.unexpected()),
        };

        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// Contents of `( ... )`: empty tuple, yield, generator, tuple or a
    /// parenthesized expression.
    fn parse_paren_body(&mut self, start: u32) -> Result<Expr, ExprError> {
        if self.check(&TokenKind::RParen) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), self.span_from(start)));
        }

        if self.check(&TokenKind::Yield) {
            self.advance();
            let value = if self.check(&TokenKind::RParen) {
                None
            } else {
                Some(Box::new(self.parse_testlist()?))
            };
            return Ok(Expr::new(ExprKind::Yield(value), self.span_from(start)));
        }

        let first = self.parse_test_or_star()?;

        if self.check(&TokenKind::For) {
            let generators = self.parse_comp_for()?;
            return Ok(Expr::new(
                ExprKind::GeneratorExp {
                    elt: Box::new(first),
                    generators,
                },
                self.span_from(start),
            ));
        }

        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut elts = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            elts.push(self.parse_test_or_star()?);
        }
        Ok(Expr::new(ExprKind::Tuple(elts), self.span_from(start)))
    }

    fn parse_list_body(&mut self) -> Result<ExprKind, ExprError> {
        if self.check(&TokenKind::RBracket) {
            return Ok(ExprKind::List(Vec::new()));
        }

        let first = self.parse_test_or_star()?;

        if self.check(&TokenKind::For) {
            let generators = self.parse_comp_for()?;
            return Ok(ExprKind::ListComp {
                elt: Box::new(first),
                generators,
            });
        }

        let mut elts = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            elts.push(self.parse_test_or_star()?);
        }
        Ok(ExprKind::List(elts))
    }

    fn parse_brace_body(&mut self) -> Result<ExprKind, ExprError> {
        if self.check(&TokenKind::RBrace) {
            return Ok(ExprKind::Dict(Vec::new()));
        }

        let first = self.parse_test_or_star()?;

        if self.eat(&TokenKind::Colon) {
            let value = self.parse_test()?;
            if self.check(&TokenKind::For) {
                self.parse_comp_for()?;
                return Ok(ExprKind::Dict(vec![(first, value)]));
            }
            let mut pairs = vec![(first, value)];
            while self.eat(&TokenKind::Comma) {
                if self.check(&TokenKind::RBrace) {
                    break;
                }
                let key = self.parse_test()?;
                self.expect(&TokenKind::Colon, "':'")?;
                let value = self.parse_test()?;
                pairs.push((key, value));
            }
            return Ok(ExprKind::Dict(pairs));
        }

        if self.check(&TokenKind::For) {
            self.parse_comp_for()?;
            return Ok(ExprKind::Set(vec![first]));
        }

        let mut elts = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RBrace) {
                break;
            }
            elts.push(self.parse_test_or_star()?);
        }
        Ok(ExprKind::Set(elts))
    }
}

/// Parse `source` into a program.
///
/// # Errors
/// Returns `ExprError::Syntax` if the source is not well formed.
pub fn parse(source: &str) -> Result<Program, ExprError> {
    Parser::new(source).parse()
}

fn statement_keyword(kind: &TokenKind) -> Option<NodeKind> {
    let node = match kind {
        TokenKind::Import => NodeKind::Import,
        TokenKind::From => NodeKind::ImportFrom,
        TokenKind::Def => NodeKind::FunctionDef,
        TokenKind::Class => NodeKind::ClassDef,
        TokenKind::If => NodeKind::If,
        TokenKind::While => NodeKind::While,
        TokenKind::For => NodeKind::For,
        TokenKind::Try => NodeKind::Try,
        TokenKind::Raise => NodeKind::Raise,
        TokenKind::Return => NodeKind::Return,
        TokenKind::Pass => NodeKind::Pass,
        TokenKind::Break => NodeKind::Break,
        TokenKind::Continue => NodeKind::Continue,
        TokenKind::Del => NodeKind::Delete,
        TokenKind::Assert => NodeKind::Assert,
        TokenKind::Global => NodeKind::Global,
        TokenKind::Nonlocal => NodeKind::Nonlocal,
        TokenKind::With => NodeKind::With,
        TokenKind::Async => NodeKind::Async,
        TokenKind::Yield => NodeKind::Yield,
        _ => return None,
    };
    Some(node)
}

fn starts_expression(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Name(_)
            | TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::String(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::None
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Tilde
            | TokenKind::Not
            | TokenKind::Lambda
            | TokenKind::Star
            | TokenKind::Await
    )
}

fn binary_op(kind: &TokenKind) -> Option<BinOp> {
    let op = match kind {
        TokenKind::Pipe => BinOp::BitOr,
        TokenKind::Caret => BinOp::BitXor,
        TokenKind::Amp => BinOp::BitAnd,
        TokenKind::LtLt => BinOp::LShift,
        TokenKind::GtGt => BinOp::RShift,
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::SlashSlash => BinOp::FloorDiv,
        TokenKind::Percent => BinOp::Mod,
        TokenKind::At => BinOp::MatMul,
        _ => return None,
    };
    Some(op)
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Name(name) => format!("name '{name}'"),
        TokenKind::Int(n) => format!("number {n}"),
        TokenKind::Float(f) => format!("number {f}"),
        TokenKind::String(_) => "string literal".to_string(),
        TokenKind::Newline => "line break".to_string(),
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Invalid(message) => message.clone(),
        other => format!("{other:?}"),
    }
}
