//! Structural validation of parsed constraints.
//!
//! Every node in the tree is checked against an explicit deny list (with a
//! human readable description used in diagnostics) and an explicit allow
//! list. Anything on neither list is rejected as well.

use crate::ast::{Comprehension, Expr, ExprKind, NodeKind, Program, StmtKind};
use crate::error::ExprError;
use crate::span::Span;

/// Attributes that may be read from `ver`.
pub const VERSION_ATTRIBUTES: [&str; 3] = ["major", "minor", "micro"];

/// The name bound to the candidate version.
pub const VERSION_NAME: &str = "ver";

/// Node tags a constraint may contain.
pub const ALLOWED: &[NodeKind] = &[
    NodeKind::Program,
    NodeKind::ExprStmt,
    NodeKind::Comprehension,
    NodeKind::Literal,
    NodeKind::Name,
    NodeKind::Tuple,
    NodeKind::List,
    NodeKind::Attribute,
    NodeKind::Subscript,
    NodeKind::Slice,
    NodeKind::BinOp,
    NodeKind::UnaryOp,
    NodeKind::Compare,
    NodeKind::BoolOp,
    NodeKind::ListComp,
];

/// Node tags that are always rejected, with the description reported to the user.
pub const DENIED: &[(NodeKind, &str)] = &[
    (NodeKind::Assign, "Assignment"),
    (NodeKind::AugAssign, "Operation with assignment"),
    (NodeKind::NamedExpr, "Assignment expression"),
    (NodeKind::Lambda, "Lambda function"),
    (NodeKind::Call, "Function call"),
    (NodeKind::Import, "Importing"),
    (NodeKind::ImportFrom, "Importing from"),
    (NodeKind::FunctionDef, "Function definition"),
    (NodeKind::ClassDef, "Class definition"),
    (NodeKind::If, "If statement"),
    (NodeKind::While, "While loop"),
    (NodeKind::For, "For loop"),
    (NodeKind::Try, "Exception handling"),
    (NodeKind::Raise, "Raising exceptions"),
    (NodeKind::Return, "Return statement"),
    (NodeKind::Pass, "Pass statement"),
    (NodeKind::Break, "Break statement"),
    (NodeKind::Continue, "Continue statement"),
    (NodeKind::Delete, "Deletion"),
    (NodeKind::Assert, "Assertion"),
    (NodeKind::Global, "Global declaration"),
    (NodeKind::Nonlocal, "Nonlocal declaration"),
    (NodeKind::With, "Context manager"),
    (NodeKind::Yield, "Yield expression"),
    (NodeKind::Await, "Await expression"),
    (NodeKind::Async, "Asynchronous code"),
];

/// Description for tags that are neither allowed nor explicitly denied.
fn unlisted_description(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::IfExp => "Conditional expression",
        NodeKind::GeneratorExp => "Generator expression",
        NodeKind::Dict => "Dictionary display",
        NodeKind::Set => "Set display",
        NodeKind::Starred => "Starred expression",
        _ => "Construct",
    }
}

fn check_kind(kind: NodeKind, span: Span) -> Result<(), ExprError> {
    if let Some(&(_, construct)) = DENIED.iter().find(|(denied, _)| *denied == kind) {
        return Err(ExprError::Disallowed { construct, span });
    }
    if !ALLOWED.contains(&kind) {
        return Err(ExprError::Disallowed {
            construct: unlisted_description(kind),
            span,
        });
    }
    Ok(())
}

/// Check a parsed program and return its single expression.
///
/// # Errors
/// Returns the first disallowed construct found, or
/// `ExprError::NotAnExpression` if the program is not exactly one
/// expression statement.
pub fn validate(program: &Program) -> Result<&Expr, ExprError> {
    for stmt in &program.body {
        check_kind(stmt.kind.node_kind(), stmt.span)?;
        if let StmtKind::Expr(expr) = &stmt.kind {
            check_expr(expr)?;
        }
    }

    match program.body.as_slice() {
        [stmt] => match &stmt.kind {
            StmtKind::Expr(expr) => Ok(expr),
            _ => Err(ExprError::NotAnExpression),
        },
        _ => Err(ExprError::NotAnExpression),
    }
}

fn check_expr(expr: &Expr) -> Result<(), ExprError> {
    check_kind(expr.kind.node_kind(), expr.span)?;

    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Name(_) => Ok(()),
        ExprKind::Tuple(elts) | ExprKind::List(elts) => elts.iter().try_for_each(check_expr),
        ExprKind::Attribute { value, attr } => {
            let on_ver = matches!(&value.kind, ExprKind::Name(name) if name == VERSION_NAME);
            if on_ver && VERSION_ATTRIBUTES.contains(&attr.as_str()) {
                Ok(())
            } else {
                Err(ExprError::DisallowedAttribute {
                    attr: attr.clone(),
                    span: expr.span,
                })
            }
        }
        ExprKind::Subscript { value, index } => {
            check_expr(value)?;
            check_expr(index)
        }
        ExprKind::Slice { lower, upper, step } => [lower, upper, step]
            .into_iter()
            .flatten()
            .try_for_each(|part| check_expr(part)),
        ExprKind::BinOp { left, right, .. } => {
            check_expr(left)?;
            check_expr(right)
        }
        ExprKind::UnaryOp { operand, .. } => check_expr(operand),
        ExprKind::Compare {
            left, comparators, ..
        } => {
            check_expr(left)?;
            comparators.iter().try_for_each(check_expr)
        }
        ExprKind::BoolOp { values, .. } => values.iter().try_for_each(check_expr),
        ExprKind::ListComp { elt, generators } => {
            check_expr(elt)?;
            generators.iter().try_for_each(check_comprehension)
        }
        // Rejected by check_kind above.
        ExprKind::Call { .. }
        | ExprKind::Lambda { .. }
        | ExprKind::NamedExpr { .. }
        | ExprKind::IfExp { .. }
        | ExprKind::GeneratorExp { .. }
        | ExprKind::Dict(_)
        | ExprKind::Set(_)
        | ExprKind::Starred(_)
        | ExprKind::Yield(_)
        | ExprKind::Await(_) => Err(ExprError::Disallowed {
            construct: unlisted_description(expr.kind.node_kind()),
            span: expr.span,
        }),
    }
}

fn check_comprehension(comp: &Comprehension) -> Result<(), ExprError> {
    check_kind(NodeKind::Comprehension, comp.span)?;
    check_target(&comp.target)?;
    check_expr(&comp.iter)?;
    comp.ifs.iter().try_for_each(check_expr)
}

/// Comprehension targets bind names; only plain names and tuples of them.
fn check_target(target: &Expr) -> Result<(), ExprError> {
    match &target.kind {
        ExprKind::Name(_) => Ok(()),
        ExprKind::Tuple(elts) => elts.iter().try_for_each(check_target),
        _ => {
            check_expr(target)?;
            Err(ExprError::syntax(
                "comprehension target must be a name or a tuple of names",
                target.span,
            ))
        }
    }
}
