//! Product ranking over a graph snapshot
//!
//! Two strategies: the direct ranking of a user's own edges, and a
//! breadth-first weighted reachability walk over users.

mod engine;
mod types;

pub use engine::Recommendation;
pub use types::*;

/// Results returned by the direct strategy when no `top_n` is given.
pub const DEFAULT_TOP_N: usize = 5;
