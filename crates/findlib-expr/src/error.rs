use crate::span::Span;
use thiserror::Error;

/// Errors produced while compiling or evaluating a constraint expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// The source is not a well-formed expression.
    #[error("syntax error at {}..{}: {message}", span.start, span.end)]
    Syntax { message: String, span: Span },

    /// A construct on the deny list, or absent from the allow list.
    #[error("{construct} not allowed")]
    Disallowed { construct: &'static str, span: Span },

    /// Attribute access other than `ver.major`, `ver.minor`, `ver.micro`.
    #[error("attribute access `.{attr}` not allowed (only ver.major, ver.minor, ver.micro)")]
    DisallowedAttribute { attr: String, span: Span },

    /// The source held zero or several statements instead of one expression.
    #[error("expected a single expression")]
    NotAnExpression,

    /// Evaluation failed (unknown name, type mismatch, bad index, ...).
    #[error("{0}")]
    Runtime(String),
}

impl ExprError {
    pub(crate) fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            span,
        }
    }

    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// Where in the source the problem was found, when known.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Syntax { span, .. }
            | Self::Disallowed { span, .. }
            | Self::DisallowedAttribute { span, .. } => Some(*span),
            Self::NotAnExpression | Self::Runtime(_) => None,
        }
    }
}
