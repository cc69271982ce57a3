//! Types for ranking requests and results

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A product and its score, in ranked position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
    pub product_id: String,
    pub score: f64,
}

impl RankedProduct {
    pub fn new(product_id: impl Into<String>, score: f64) -> Self {
        Self { product_id: product_id.into(), score }
    }
}

/// Which traversal produces the ranking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    /// The user's own edges, sorted by weight
    #[default]
    Direct,
    /// Scores accumulated over every user reached from the start user
    WeightedBfs,
}

impl RankingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::WeightedBfs => "weighted_bfs",
        }
    }
}

impl fmt::Display for RankingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "direct" => Ok(Self::Direct),
            "weighted_bfs" | "bfs" => Ok(Self::WeightedBfs),
            other => Err(format!(
                "unsupported ranking strategy `{other}` (expected direct|weighted_bfs)"
            )),
        }
    }
}

/// User-to-user edges followed by the weighted walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAdjacency {
    /// No user-to-user edges; only the start user is visited.
    #[default]
    #[serde(rename = "none")]
    Isolated,
    /// Users sharing at least one product edge are adjacent.
    SharedProduct,
}

impl UserAdjacency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Isolated => "none",
            Self::SharedProduct => "shared_product",
        }
    }
}

impl fmt::Display for UserAdjacency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserAdjacency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" | "isolated" => Ok(Self::Isolated),
            "shared_product" => Ok(Self::SharedProduct),
            other => Err(format!(
                "unsupported user adjacency `{other}` (expected none|shared_product)"
            )),
        }
    }
}

/// Options for [`super::Recommendation::weighted_bfs`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalOptions {
    pub adjacency: UserAdjacency,
    /// Maximum hops from the start user; `None` is unbounded.
    pub max_depth: Option<usize>,
    /// Result limit; `0` keeps every product.
    pub top_n: usize,
}

impl TraversalOptions {
    pub fn with_adjacency(mut self, adjacency: UserAdjacency) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// Request for a ranking, independent of strategy
#[derive(Debug, Clone)]
pub struct RankingRequest {
    pub user_id: String,
    pub strategy: RankingStrategy,
    pub top_n: Option<usize>,
    pub adjacency: UserAdjacency,
    pub max_depth: Option<usize>,
}

impl RankingRequest {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            strategy: RankingStrategy::default(),
            top_n: None,
            adjacency: UserAdjacency::default(),
            max_depth: None,
        }
    }

    pub fn with_strategy(mut self, strategy: RankingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_top_n(mut self, top_n: Option<usize>) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_adjacency(mut self, adjacency: UserAdjacency) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn traversal_options(&self) -> TraversalOptions {
        TraversalOptions {
            adjacency: self.adjacency,
            max_depth: self.max_depth,
            top_n: self.top_n.unwrap_or(0),
        }
    }
}
