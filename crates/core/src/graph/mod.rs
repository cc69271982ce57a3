//! User-product interaction graph
//!
//! [`GraphEngine`] owns the interaction history and rebuilds immutable
//! [`GraphSnapshot`]s from it. Readers keep the `Arc` they were handed; a
//! rebuild publishes a new snapshot instead of mutating the old one.

mod engine;
mod snapshot;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

pub use engine::GraphEngine;
pub use snapshot::{GraphSnapshot, GraphStats, ProductGraph, UserGraph};

/// Ingestion contract: user id to ordered `(product id, interaction label)` pairs.
pub type InteractionHistory = IndexMap<String, Vec<(String, String)>>;

/// [`InteractionHistory`] with an optional timestamp per action.
pub type TimedInteractionHistory =
    IndexMap<String, Vec<(String, String, Option<DateTime<Utc>>)>>;
