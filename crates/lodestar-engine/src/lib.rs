//! Best-first dependency resolution over revision timelines.
//!
//! Given a root constraint set and a revision-history provider, the engine
//! bounds the reachable configuration space, then runs a deterministic A*
//! search over one-revision-step moves until it finds a configuration that
//! satisfies every constraint declared anywhere in the graph, or proves that
//! none exists.

pub mod bounder;
pub mod conflict;
pub mod errors;
pub mod heuristic;
pub mod index;
pub mod result;
pub mod search;
pub mod successor;
pub mod validate;

pub use conflict::ConflictReport;
pub use errors::ResolveError;
pub use result::ResolvedGraph;
pub use search::{resolve, CancelToken, Outcome};
