use miette::Diagnostic;
use thiserror::Error;

use lodestar_provider::ProviderError;

/// Fatal errors for a resolution run. Negative results (`Unsatisfiable`,
/// `Cancelled`) are not errors; they live on [`crate::Outcome`].
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// A dimension's history could not be loaded. No valid configuration can
    /// be built without it.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Provider(#[from] ProviderError),

    /// Closure discovery exceeded its budget.
    #[error(
        "dependency closure exceeded the discovery budget \
         ({dimensions} dimensions, {revisions} revisions)"
    )]
    #[diagnostic(help(
        "The dependency tree is too large or cyclic; raise the discovery \
         budget or prune the root constraints"
    ))]
    UnboundedClosure { dimensions: usize, revisions: usize },
}
