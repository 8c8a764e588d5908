use findlib_expr::ExprError;
use thiserror::Error;

/// Core error type for findlib operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The version constraint failed to parse, validate or smoke-test.
    #[error("invalid version constraint \"{constraint}\": {source}")]
    Constraint {
        constraint: String,
        #[source]
        source: ExprError,
    },

    #[error("invalid value for {name}: {message}")]
    Config { name: &'static str, message: String },
}

impl Error {
    #[must_use]
    pub fn constraint(constraint: impl Into<String>, source: ExprError) -> Self {
        Self::Constraint {
            constraint: constraint.into(),
            source,
        }
    }
}

/// Failure talking to the cache service.
///
/// Discovery never surfaces these; they degrade to a cache miss.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache protocol error: {0}")]
    Protocol(String),

    #[error("cache rejected request ({code}): {message}")]
    Rejected { code: String, message: String },
}
