use findlib_expr::{compile, Predicate};

use crate::error::Error;
use crate::version::VersionTuple;

/// A compiled version constraint, built once per discovery call.
#[derive(Debug, Clone)]
pub struct Constraint {
    predicate: Predicate,
}

impl Constraint {
    /// Compile `source`. Any syntax, safety or smoke-test failure is fatal.
    pub fn compile(source: &str) -> Result<Self, Error> {
        let predicate = compile(source).map_err(|e| Error::constraint(source, e))?;
        Ok(Self { predicate })
    }

    /// Compile an optional constraint; `None` means "any version".
    pub fn compile_opt(source: Option<&str>) -> Result<Option<Self>, Error> {
        source.map(Self::compile).transpose()
    }

    pub fn source(&self) -> &str {
        self.predicate.source()
    }

    /// Whether `version` satisfies the constraint.
    ///
    /// A runtime error for this particular version (which passed the
    /// compile-time smoke test) rejects the package.
    pub fn accepts(&self, version: VersionTuple) -> bool {
        match self.predicate.eval(version) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(
                    constraint = self.source(),
                    %version,
                    error = %e,
                    "constraint failed to evaluate, skipping package"
                );
                false
            }
        }
    }
}
