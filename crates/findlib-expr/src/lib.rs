//! Sandboxed version-constraint expressions.
//!
//! A constraint such as `ver.major == 8` or `ver >= (8, 31)` is compiled in
//! two passes: the source is parsed into a tagged tree, then every node is
//! checked against an allow list and a deny list. Only validated trees are
//! ever evaluated, and evaluation is a plain tree walk over those tags.
//!
//! ```
//! use findlib_expr::{compile, VersionTuple};
//!
//! let pred = compile("ver >= (8, 31)").unwrap();
//! assert!(pred.eval(VersionTuple::new(9, 0, 0)).unwrap());
//! assert!(!pred.eval(VersionTuple::new(8, 30, 9)).unwrap());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::too_many_lines)]

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
pub mod validate;
pub mod value;

pub use error::ExprError;
pub use span::Span;
pub use value::{Value, VersionTuple};

use ast::Expr;
use interp::Interpreter;

/// The version every constraint is test-evaluated against at compile time.
pub const SMOKE_TEST_VERSION: VersionTuple = VersionTuple::new(0, 0, 0);

/// A compiled, validated constraint.
#[derive(Debug, Clone)]
pub struct Predicate {
    source: String,
    expr: Expr,
}

impl Predicate {
    /// The constraint text this predicate was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate the constraint against `ver`; the result is its truthiness.
    pub fn eval(&self, ver: VersionTuple) -> Result<bool, ExprError> {
        Ok(self.value(ver)?.is_truthy())
    }

    /// Evaluate the constraint against `ver`, returning the raw value.
    pub fn value(&self, ver: VersionTuple) -> Result<Value, ExprError> {
        Interpreter::new(ver).eval(&self.expr)
    }
}

/// Parse, validate and smoke-test a constraint.
///
/// # Errors
/// Fails on syntax errors, on any disallowed construct, and when evaluating
/// the constraint against [`SMOKE_TEST_VERSION`] raises a runtime error.
pub fn compile(source: &str) -> Result<Predicate, ExprError> {
    let program = parser::parse(source)?;
    let expr = validate::validate(&program)?.clone();

    let predicate = Predicate {
        source: source.to_string(),
        expr,
    };
    predicate.value(SMOKE_TEST_VERSION)?;
    Ok(predicate)
}
