//! Recursive-descent parser producing the eval AST

use super::{
    lexer::{Token, TokenKind},
    value::Value,
    EvalError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Chained comparison: `a < b <= c` holds when every adjacent pair holds
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call(String, Vec<Expr>),
}

/// Recursion limit for nested subexpressions
const MAX_DEPTH: usize = 100;

pub(super) fn parse(tokens: &[Token]) -> Result<Expr, EvalError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expression()?;
    match parser.peek() {
        TokenKind::End => Ok(expr),
        other => Err(parser.error(format!("unexpected {:?} after expression", other))),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &'a TokenKind {
        // The token stream always ends with End, and End is never consumed
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> &'a TokenKind {
        let kind = self.peek();
        if *kind != TokenKind::End {
            self.pos += 1;
        }
        kind
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        let offset = self
            .tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map(|t| t.offset)
            .unwrap_or(0);
        EvalError::Syntax {
            offset,
            message: message.into(),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(name) if name == keyword)
    }

    fn expect(&mut self, expected: TokenKind, what: &str) -> Result<(), EvalError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn nested(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<Expr, EvalError>,
    ) -> Result<Expr, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn expression(&mut self) -> Result<Expr, EvalError> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, EvalError> {
        let then = self.or_expr()?;
        if !self.is_keyword("if") {
            return Ok(then);
        }
        self.advance();
        let condition = self.or_expr()?;
        if !self.is_keyword("else") {
            return Err(self.error("expected 'else' in conditional expression"));
        }
        self.advance();
        let otherwise = self.expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn or_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.and_expr()?;
        while self.is_keyword("or") {
            self.advance();
            let right = self.and_expr()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.not_expr()?;
        while self.is_keyword("and") {
            self.advance();
            let right = self.not_expr()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, EvalError> {
        if self.is_keyword("not") {
            self.advance();
            let operand = self.nested(Self::not_expr)?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        let first = self.sum()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => CompareOp::Eq,
                TokenKind::NotEq => CompareOp::Ne,
                TokenKind::Lt => CompareOp::Lt,
                TokenKind::Le => CompareOp::Le,
                TokenKind::Gt => CompareOp::Gt,
                TokenKind::Ge => CompareOp::Ge,
                _ => break,
            };
            self.advance();
            rest.push((op, self.sum()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn sum(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::DoubleSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.advance();
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.call()?;
        if *self.peek() != TokenKind::DoubleStar {
            return Ok(base);
        }
        self.advance();
        // Right-associative, and binds tighter than a unary minus on its left
        let exponent = self.nested(Self::unary)?;
        Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)))
    }

    fn call(&mut self) -> Result<Expr, EvalError> {
        let function = match self.atom()? {
            Expr::Name(name) if *self.peek() == TokenKind::LParen => name,
            other => return Ok(other),
        };
        self.advance();

        let mut args = Vec::new();
        if *self.peek() != TokenKind::RParen {
            loop {
                args.push(self.expression()?);
                if *self.peek() == TokenKind::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "')' to close call")?;
        Ok(Expr::Call(function, args))
    }

    fn atom(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            TokenKind::Int(n) => Ok(Expr::Literal(Value::Int(*n))),
            TokenKind::Float(f) => Ok(Expr::Literal(Value::Float(*f))),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::Str(s.clone()))),
            TokenKind::Ident(name) => Ok(match name.as_str() {
                "True" | "true" => Expr::Literal(Value::Bool(true)),
                "False" | "false" => Expr::Literal(Value::Bool(false)),
                "and" | "or" | "not" | "if" | "else" => {
                    self.pos -= 1;
                    return Err(self.error(format!("unexpected keyword '{}'", name)));
                }
                _ => Expr::Name(name.clone()),
            }),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::End => Err(self.error("unexpected end of expression")),
            other => {
                self.pos -= 1;
                Err(self.error(format!("unexpected {:?}", other)))
            }
        }
    }
}
