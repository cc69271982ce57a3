//! Ranking strategies over a graph snapshot

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::types::*;
use super::DEFAULT_TOP_N;
use crate::graph::GraphSnapshot;

/// Read-only ranker bound to one graph snapshot
#[derive(Debug, Clone)]
pub struct Recommendation {
    snapshot: Arc<GraphSnapshot>,
}

impl Recommendation {
    pub fn new(snapshot: Arc<GraphSnapshot>) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    /// Rank with the strategy named in the request
    pub fn rank(&self, request: &RankingRequest) -> Vec<RankedProduct> {
        let ranked = match request.strategy {
            RankingStrategy::Direct => self.recommend(&request.user_id, request.top_n),
            RankingStrategy::WeightedBfs => {
                self.weighted_bfs(&request.user_id, &request.traversal_options())
            }
        };

        debug!(
            event_name = "recommend.ranked",
            user_id = %request.user_id,
            strategy = %request.strategy,
            results = ranked.len(),
            "ranking computed"
        );
        ranked
    }

    /// The user's own products by descending weight.
    ///
    /// `None` or `Some(0)` falls back to [`DEFAULT_TOP_N`]. Equal weights
    /// keep graph order.
    pub fn recommend(&self, user_id: &str, top_n: Option<usize>) -> Vec<RankedProduct> {
        let Some(edges) = self.snapshot.products_for(user_id) else {
            return Vec::new();
        };

        let limit = top_n.filter(|n| *n > 0).unwrap_or(DEFAULT_TOP_N);
        let mut ranked = edges
            .iter()
            .map(|(product_id, weight)| RankedProduct::new(product_id.as_str(), *weight))
            .collect::<Vec<_>>();
        sort_descending(&mut ranked);
        ranked.truncate(limit);
        ranked
    }

    /// Breadth-first walk over users from `start_user`, summing the product
    /// edges of every visited user. Each user contributes at most once.
    pub fn weighted_bfs(&self, start_user: &str, options: &TraversalOptions) -> Vec<RankedProduct> {
        if !self.snapshot.contains_user(start_user) {
            return Vec::new();
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([(start_user, 0usize)]);
        let mut scores: IndexMap<&str, f64> = IndexMap::new();

        while let Some((user_id, depth)) = queue.pop_front() {
            if !visited.insert(user_id) {
                continue;
            }
            let Some(edges) = self.snapshot.products_for(user_id) else {
                continue;
            };

            for (product_id, weight) in edges {
                *scores.entry(product_id.as_str()).or_insert(0.0) += weight;
            }

            if options.max_depth.is_some_and(|max_depth| depth >= max_depth) {
                continue;
            }
            for neighbor in self.neighbors(user_id, options.adjacency) {
                if !visited.contains(neighbor) {
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }

        debug!(
            event_name = "recommend.weighted_bfs.visited",
            start_user = %start_user,
            adjacency = %options.adjacency,
            visited_users = visited.len(),
            "weighted traversal finished"
        );

        let mut ranked = scores
            .into_iter()
            .map(|(product_id, score)| RankedProduct::new(product_id, score))
            .collect::<Vec<_>>();
        sort_descending(&mut ranked);
        if options.top_n > 0 {
            ranked.truncate(options.top_n);
        }
        ranked
    }

    fn neighbors(&self, user_id: &str, adjacency: UserAdjacency) -> Vec<&str> {
        match adjacency {
            UserAdjacency::Isolated => Vec::new(),
            UserAdjacency::SharedProduct => {
                let Some(edges) = self.snapshot.products_for(user_id) else {
                    return Vec::new();
                };
                edges
                    .keys()
                    .filter_map(|product_id| self.snapshot.users_for(product_id))
                    .flat_map(|users| users.keys())
                    .map(String::as_str)
                    .filter(|neighbor| *neighbor != user_id)
                    .collect()
            }
        }
    }
}

// Stable sort: equal scores keep their incoming order.
fn sort_descending(ranked: &mut [RankedProduct]) {
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}
