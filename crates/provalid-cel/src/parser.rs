//! Hand-written recursive descent parser for constraint expressions.
//!
//! The grammar is the CEL operator core: ternary, `||`, `&&`, relations,
//! additive, multiplicative, unary, postfix (member access, indexing,
//! calls), atoms. The `has(path.field)` macro is expanded inline into an
//! [`Expr::Has`] node. Comprehension macros, struct literals, and
//! leading-dot root references are not part of this dialect and are
//! rejected with a parse error.

use crate::ast::{Expr, Spanned, SpannedExpr};
use crate::lexer::{lex, Span, SpannedToken, Token};

/// Parse error with span information.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

/// Parse a source string into an expression tree.
///
/// The whole input must be consumed; trailing tokens are an error.
pub fn parse(source: &str) -> Result<SpannedExpr, ParseError> {
    let tokens = lex(source).map_err(|e| ParseError {
        message: e.message,
        span: e.span,
    })?;

    let mut parser = Parser::new(&tokens);
    let expr = parser.parse_expr()?;

    if !parser.at_end() {
        return Err(ParseError {
            message: format!("unexpected trailing token {:?}", parser.peek()),
            span: parser.peek_span(),
        });
    }

    Ok(expr)
}

/// Recursive descent parser over a lexed token stream.
struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    /// Counter for generating unique node IDs (starts at 1).
    next_id: i64,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [SpannedToken]) -> Self {
        Self {
            tokens,
            pos: 0,
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // === Utility Methods ===

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| s.clone())
            .unwrap_or_else(|| self.eof_span())
    }

    fn eof_span(&self) -> Span {
        let end = self.tokens.last().map(|(_, s)| s.end).unwrap_or(0);
        end..end
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<Span, ParseError> {
        if self.check(token) {
            let span = self.peek_span();
            self.advance();
            Ok(span)
        } else {
            Err(ParseError {
                message: format!("expected '{}', found {:?}", token, self.peek()),
                span: self.peek_span(),
            })
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    // === Expression Parsing ===

    fn parse_expr(&mut self) -> Result<SpannedExpr, ParseError> {
        self.parse_ternary()
    }

    /// Ternary conditional: expr ? expr : expr
    fn parse_ternary(&mut self) -> Result<SpannedExpr, ParseError> {
        let cond = self.parse_or()?;

        if self.match_token(&Token::Question) {
            let then_expr = self.parse_expr()?;
            self.expect(&Token::Colon)?;
            let else_expr = self.parse_expr()?;
            let span = cond.span.start..else_expr.span.end;

            Ok(Spanned::new(
                self.next_id(),
                Expr::Ternary {
                    cond: Box::new(cond),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
                span,
            ))
        } else {
            Ok(cond)
        }
    }

    fn parse_or(&mut self) -> Result<SpannedExpr, ParseError> {
        use crate::ast::BinaryOp;

        let mut left = self.parse_and()?;

        while self.match_token(&Token::Or) {
            let right = self.parse_and()?;
            let span = left.span.start..right.span.end;
            left = Spanned::new(
                self.next_id(),
                Expr::Binary {
                    op: BinaryOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<SpannedExpr, ParseError> {
        use crate::ast::BinaryOp;

        let mut left = self.parse_relation()?;

        while self.match_token(&Token::And) {
            let right = self.parse_relation()?;
            let span = left.span.start..right.span.end;
            left = Spanned::new(
                self.next_id(),
                Expr::Binary {
                    op: BinaryOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    /// Relational operators: == != < <= > >= in
    fn parse_relation(&mut self) -> Result<SpannedExpr, ParseError> {
        let mut left = self.parse_addition()?;

        while let Some(op) = self.peek_relop() {
            self.advance();
            let right = self.parse_addition()?;
            let span = left.span.start..right.span.end;
            left = Spanned::new(
                self.next_id(),
                Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn peek_relop(&self) -> Option<crate::ast::BinaryOp> {
        use crate::ast::BinaryOp;

        match self.peek()? {
            Token::EqEq => Some(BinaryOp::Eq),
            Token::Ne => Some(BinaryOp::Ne),
            Token::Lt => Some(BinaryOp::Lt),
            Token::Le => Some(BinaryOp::Le),
            Token::Gt => Some(BinaryOp::Gt),
            Token::Ge => Some(BinaryOp::Ge),
            Token::In => Some(BinaryOp::In),
            _ => None,
        }
    }

    fn parse_addition(&mut self) -> Result<SpannedExpr, ParseError> {
        use crate::ast::BinaryOp;

        let mut left = self.parse_mult()?;

        loop {
            let op = if self.match_token(&Token::Plus) {
                BinaryOp::Add
            } else if self.match_token(&Token::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };

            let right = self.parse_mult()?;
            let span = left.span.start..right.span.end;
            left = Spanned::new(
                self.next_id(),
                Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_mult(&mut self) -> Result<SpannedExpr, ParseError> {
        use crate::ast::BinaryOp;

        let mut left = self.parse_unary()?;

        loop {
            let op = if self.match_token(&Token::Star) {
                BinaryOp::Mul
            } else if self.match_token(&Token::Slash) {
                BinaryOp::Div
            } else if self.match_token(&Token::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };

            let right = self.parse_unary()?;
            let span = left.span.start..right.span.end;
            left = Spanned::new(
                self.next_id(),
                Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<SpannedExpr, ParseError> {
        use crate::ast::UnaryOp;

        let start = self.peek_span().start;

        let op = if self.match_token(&Token::Minus) {
            Some(UnaryOp::Neg)
        } else if self.match_token(&Token::Not) {
            Some(UnaryOp::Not)
        } else {
            None
        };

        match op {
            Some(op) => {
                let expr = self.parse_unary()?;
                let span = start..expr.span.end;
                Ok(Spanned::new(
                    self.next_id(),
                    Expr::Unary {
                        op,
                        expr: Box::new(expr),
                    },
                    span,
                ))
            }
            None => self.parse_postfix(),
        }
    }

    /// Postfix operators: member access, indexing, calls.
    fn parse_postfix(&mut self) -> Result<SpannedExpr, ParseError> {
        let mut expr = self.parse_atom()?;

        loop {
            if self.check(&Token::Dot) {
                self.advance();
                let (field, field_span) = self.expect_ident()?;

                if self.check(&Token::LParen) {
                    // Method call: receiver.method(args...)
                    let args = self.parse_call_args()?;
                    let span = expr.span.start..self.prev_span_end();
                    expr = Spanned::new(
                        self.next_id(),
                        Expr::Call {
                            target: Some(Box::new(expr)),
                            function: field,
                            args,
                        },
                        span,
                    );
                } else {
                    let span = expr.span.start..field_span.end;
                    expr = Spanned::new(
                        self.next_id(),
                        Expr::Member {
                            expr: Box::new(expr),
                            field,
                        },
                        span,
                    );
                }
            } else if self.check(&Token::LBracket) {
                self.advance();
                let index = self.parse_expr()?;
                let end = self.expect(&Token::RBracket)?.end;
                let span = expr.span.start..end;
                expr = Spanned::new(
                    self.next_id(),
                    Expr::Index {
                        expr: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                let span = self.peek_span();
                self.advance();
                Ok((name, span))
            }
            other => Err(ParseError {
                message: format!("expected identifier after '.', found {:?}", other),
                span: self.peek_span(),
            }),
        }
    }

    /// End of the most recently consumed token's span.
    fn prev_span_end(&self) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, s)| s.end)
            .unwrap_or(0)
    }

    fn parse_call_args(&mut self) -> Result<Vec<SpannedExpr>, ParseError> {
        self.expect(&Token::LParen)?;

        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            args.push(self.parse_expr()?);
            while self.match_token(&Token::Comma) {
                if self.check(&Token::RParen) {
                    break; // trailing comma
                }
                args.push(self.parse_expr()?);
            }
        }

        self.expect(&Token::RParen)?;
        Ok(args)
    }

    fn parse_atom(&mut self) -> Result<SpannedExpr, ParseError> {
        let span = self.peek_span();

        let token = match self.peek() {
            Some(t) => t.clone(),
            None => {
                return Err(ParseError {
                    message: "unexpected end of expression".to_string(),
                    span: self.eof_span(),
                })
            }
        };

        match token {
            Token::Int(n) => {
                self.advance();
                Ok(Spanned::new(self.next_id(), Expr::Int(n), span))
            }
            Token::UInt(n) => {
                self.advance();
                Ok(Spanned::new(self.next_id(), Expr::UInt(n), span))
            }
            Token::Double(n) => {
                self.advance();
                Ok(Spanned::new(self.next_id(), Expr::Double(n), span))
            }
            Token::String(s) => {
                self.advance();
                Ok(Spanned::new(self.next_id(), Expr::String(s), span))
            }
            Token::Bytes(b) => {
                self.advance();
                Ok(Spanned::new(self.next_id(), Expr::Bytes(b), span))
            }
            Token::True => {
                self.advance();
                Ok(Spanned::new(self.next_id(), Expr::Bool(true), span))
            }
            Token::False => {
                self.advance();
                Ok(Spanned::new(self.next_id(), Expr::Bool(false), span))
            }
            Token::Null => {
                self.advance();
                Ok(Spanned::new(self.next_id(), Expr::Null, span))
            }
            Token::Ident(name) => {
                self.advance();
                if self.check(&Token::LParen) {
                    self.parse_global_call(name, span)
                } else {
                    Ok(Spanned::new(self.next_id(), Expr::Ident(name), span))
                }
            }
            Token::Reserved(word) => Err(ParseError {
                message: format!("'{}' is a reserved word", word),
                span,
            }),
            Token::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => self.parse_list(),
            Token::LBrace => self.parse_map(),
            other => Err(ParseError {
                message: format!("unexpected token {:?}", other),
                span,
            }),
        }
    }

    /// Standalone call, with inline expansion of the `has()` macro.
    fn parse_global_call(&mut self, name: String, name_span: Span) -> Result<SpannedExpr, ParseError> {
        let args = self.parse_call_args()?;
        let span = name_span.start..self.prev_span_end();

        if name == "has" {
            return self.expand_has(args, span);
        }

        Ok(Spanned::new(
            self.next_id(),
            Expr::Call {
                target: None,
                function: name,
                args,
            },
            span,
        ))
    }

    /// Expand `has(expr.field)` into a presence-test node.
    ///
    /// The argument must be a field access on a member path; anything else
    /// (a bare identifier, an index, a call) is a parse error, matching the
    /// macro's definition.
    fn expand_has(
        &mut self,
        mut args: Vec<SpannedExpr>,
        span: Span,
    ) -> Result<SpannedExpr, ParseError> {
        if args.len() != 1 {
            return Err(ParseError {
                message: format!("has() requires exactly one argument, got {}", args.len()),
                span,
            });
        }

        let arg = args.remove(0);
        match arg.node {
            Expr::Member { expr, field } if expr.node.is_member_path() => Ok(Spanned::new(
                self.next_id(),
                Expr::Has { expr, field },
                span,
            )),
            _ => Err(ParseError {
                message: "has() argument must be a field access".to_string(),
                span: arg.span,
            }),
        }
    }

    fn parse_list(&mut self) -> Result<SpannedExpr, ParseError> {
        let start = self.expect(&Token::LBracket)?.start;

        let mut elements = Vec::new();
        if !self.check(&Token::RBracket) {
            elements.push(self.parse_expr()?);
            while self.match_token(&Token::Comma) {
                if self.check(&Token::RBracket) {
                    break; // trailing comma
                }
                elements.push(self.parse_expr()?);
            }
        }

        let end = self.expect(&Token::RBracket)?.end;
        Ok(Spanned::new(self.next_id(), Expr::List(elements), start..end))
    }

    fn parse_map(&mut self) -> Result<SpannedExpr, ParseError> {
        let start = self.expect(&Token::LBrace)?.start;

        let mut entries = Vec::new();
        if !self.check(&Token::RBrace) {
            loop {
                let key = self.parse_expr()?;
                self.expect(&Token::Colon)?;
                let value = self.parse_expr()?;
                entries.push((key, value));

                if !self.match_token(&Token::Comma) || self.check(&Token::RBrace) {
                    break;
                }
            }
        }

        let end = self.expect(&Token::RBrace)?.end;
        Ok(Spanned::new(self.next_id(), Expr::Map(entries), start..end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, UnaryOp};

    fn parse_ok(source: &str) -> SpannedExpr {
        parse(source).unwrap_or_else(|e| panic!("parse failed for {:?}: {}", source, e))
    }

    #[test]
    fn parse_literals() {
        assert_eq!(parse_ok("42").node, Expr::Int(42));
        assert_eq!(parse_ok("42u").node, Expr::UInt(42));
        assert_eq!(parse_ok("1.5").node, Expr::Double(1.5));
        assert_eq!(parse_ok("true").node, Expr::Bool(true));
        assert_eq!(parse_ok("null").node, Expr::Null);
        assert_eq!(parse_ok(r#""hi""#).node, Expr::String("hi".to_string()));
    }

    #[test]
    fn parse_precedence() {
        // a + b * 2 parses as a + (b * 2)
        let expr = parse_ok("a + b * 2");
        match expr.node {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => {
                assert!(matches!(
                    right.node,
                    Expr::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn parse_relation_binds_looser_than_addition() {
        let expr = parse_ok("a + 1 < b");
        assert!(matches!(
            expr.node,
            Expr::Binary {
                op: BinaryOp::Lt,
                ..
            }
        ));
    }

    #[test]
    fn parse_logical_operators() {
        let expr = parse_ok("a || b && c");
        // && binds tighter than ||
        match expr.node {
            Expr::Binary {
                op: BinaryOp::Or,
                right,
                ..
            } => assert!(matches!(
                right.node,
                Expr::Binary {
                    op: BinaryOp::And,
                    ..
                }
            )),
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn parse_ternary() {
        let expr = parse_ok("a ? 1 : 2");
        assert!(matches!(expr.node, Expr::Ternary { .. }));
    }

    #[test]
    fn parse_unary() {
        let expr = parse_ok("!a");
        assert!(matches!(
            expr.node,
            Expr::Unary {
                op: UnaryOp::Not,
                ..
            }
        ));

        let expr = parse_ok("--1");
        assert!(matches!(
            expr.node,
            Expr::Unary {
                op: UnaryOp::Neg,
                ..
            }
        ));
    }

    #[test]
    fn parse_member_chain() {
        let expr = parse_ok("this.order.total");
        match expr.node {
            Expr::Member { expr, field } => {
                assert_eq!(field, "total");
                assert!(matches!(expr.node, Expr::Member { .. }));
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn parse_method_call() {
        let expr = parse_ok("this.isEmail()");
        match expr.node {
            Expr::Call {
                target,
                function,
                args,
            } => {
                assert!(target.is_some());
                assert_eq!(function, "isEmail");
                assert!(args.is_empty());
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn parse_global_call() {
        let expr = parse_ok("size(this)");
        match expr.node {
            Expr::Call {
                target,
                function,
                args,
            } => {
                assert!(target.is_none());
                assert_eq!(function, "size");
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn parse_has_macro() {
        let expr = parse_ok("has(this.name)");
        match expr.node {
            Expr::Has { expr, field } => {
                assert_eq!(field, "name");
                assert_eq!(expr.node, Expr::Ident("this".to_string()));
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn parse_has_rejects_non_member() {
        assert!(parse("has(this)").is_err());
        assert!(parse("has(this.items[0])").is_err());
        assert!(parse("has(this.a, this.b)").is_err());
    }

    #[test]
    fn parse_in_operator() {
        let expr = parse_ok("this in ['a', 'b']");
        assert!(matches!(
            expr.node,
            Expr::Binary {
                op: BinaryOp::In,
                ..
            }
        ));
    }

    #[test]
    fn parse_index() {
        let expr = parse_ok("this.items[0]");
        assert!(matches!(expr.node, Expr::Index { .. }));
    }

    #[test]
    fn parse_list_and_map_literals() {
        assert!(matches!(parse_ok("[1, 2, 3]").node, Expr::List(v) if v.len() == 3));
        assert!(matches!(parse_ok("[1, 2, 3,]").node, Expr::List(v) if v.len() == 3));
        assert!(matches!(parse_ok("{'a': 1, 'b': 2}").node, Expr::Map(v) if v.len() == 2));
        assert!(matches!(parse_ok("{}").node, Expr::Map(v) if v.is_empty()));
    }

    #[test]
    fn parse_parenthesized() {
        let expr = parse_ok("(a + b) * c");
        assert!(matches!(
            expr.node,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn parse_reserved_word_rejected() {
        let err = parse("for").unwrap_err();
        assert!(err.message.contains("reserved"));
    }

    #[test]
    fn parse_trailing_tokens_rejected() {
        assert!(parse("1 + 2 3").is_err());
    }

    #[test]
    fn parse_incomplete_rejected() {
        assert!(parse("1 +").is_err());
        assert!(parse("(1").is_err());
        assert!(parse("a ? 1").is_err());
    }

    #[test]
    fn parse_cross_field_rule() {
        // The shape used by message-level rules
        let expr = parse_ok("has(this.end) ? this.end > this.start : true");
        assert!(matches!(expr.node, Expr::Ternary { .. }));
    }
}
