//! Expression evaluator for `$(eval expr)`
//!
//! A small Python-flavoured expression language:
//!
//! ```text
//! expr     := or_expr ("if" or_expr "else" expr)?
//! or_expr  := and_expr ("or" and_expr)*
//! and_expr := not_expr ("and" not_expr)*
//! not_expr := "not" not_expr | compare
//! compare  := sum (("==" | "!=" | "<" | "<=" | ">" | ">=") sum)*
//! sum      := term (("+" | "-") term)*
//! term     := unary (("*" | "/" | "//" | "%") unary)*
//! unary    := ("-" | "+") unary | power
//! power    := call ("**" unary)?
//! call     := atom | IDENT "(" (expr ("," expr)*)? ")"
//! atom     := INT | FLOAT | STRING | "True" | "False" | IDENT | "(" expr ")"
//! ```
//!
//! Bare identifiers resolve to launch arguments (auto-typed) or the constants
//! `pi` and `e`. Launch lookups are reachable as functions (`arg`, `env`,
//! `optenv`, `find`, `anon`, `dirname`) through [`Bindings`].

mod interp;
mod lexer;
mod parser;
mod value;

pub use parser::{BinaryOp, CompareOp, Expr, UnaryOp};
pub use value::Value;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function}() takes {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: &'static str,
        got: usize,
    },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("{0}")]
    Lookup(String),

    #[error("expressions may not contain double underscores: '{0}'")]
    DoubleUnderscore(String),
}

/// Launch-side lookups available to an expression
pub trait Bindings {
    /// Value of a bound launch argument, `None` if not bound
    fn arg(&self, name: &str) -> Result<Option<String>, EvalError>;
    fn env(&self, name: &str) -> Option<String>;
    fn find(&self, package: &str) -> Option<String>;
    fn anon(&self, name: &str) -> String;
    fn dirname(&self) -> Option<String>;
}

/// Parse an expression into its AST without evaluating it
pub fn parse_expression(source: &str) -> Result<Expr, EvalError> {
    if source.contains("__") {
        return Err(EvalError::DoubleUnderscore(source.to_string()));
    }
    let tokens = lexer::tokenize(source)?;
    parser::parse(&tokens)
}

/// Evaluate an expression to a typed value
pub fn evaluate(source: &str, bindings: &dyn Bindings) -> Result<Value, EvalError> {
    let expr = parse_expression(source)?;
    interp::eval(&expr, bindings)
}

/// Evaluate an expression and render the result the way `$(eval)` substitutes it
pub fn evaluate_expression(source: &str, bindings: &dyn Bindings) -> Result<String, EvalError> {
    evaluate(source, bindings).map(|value| value.to_string())
}
