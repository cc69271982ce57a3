use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// user id -> (product id -> accumulated weight), in first-interaction order
pub type UserGraph = IndexMap<String, IndexMap<String, f64>>;

/// product id -> (user id -> weight); transpose of [`UserGraph`]
pub type ProductGraph = IndexMap<String, IndexMap<String, f64>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub users: usize,
    pub products: usize,
    pub edges: usize,
    pub records: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    user_graph: UserGraph,
    product_graph: ProductGraph,
    stats: GraphStats,
}

impl GraphSnapshot {
    /// Wraps a finished user graph and derives its product-side transpose.
    pub fn from_user_graph(user_graph: UserGraph, records: usize) -> Self {
        let product_graph = transpose(&user_graph);
        let stats = GraphStats {
            users: user_graph.len(),
            products: product_graph.len(),
            edges: user_graph.values().map(IndexMap::len).sum(),
            records,
        };

        Self { user_graph, product_graph, stats }
    }

    pub fn user_graph(&self) -> &UserGraph {
        &self.user_graph
    }

    pub fn product_graph(&self) -> &ProductGraph {
        &self.product_graph
    }

    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.user_graph.is_empty()
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.user_graph.contains_key(user_id)
    }

    pub fn products_for(&self, user_id: &str) -> Option<&IndexMap<String, f64>> {
        self.user_graph.get(user_id)
    }

    pub fn users_for(&self, product_id: &str) -> Option<&IndexMap<String, f64>> {
        self.product_graph.get(product_id)
    }

    pub fn weight(&self, user_id: &str, product_id: &str) -> Option<f64> {
        self.products_for(user_id)?.get(product_id).copied()
    }
}

fn transpose(user_graph: &UserGraph) -> ProductGraph {
    let mut product_graph = ProductGraph::new();
    for (user_id, edges) in user_graph {
        for (product_id, weight) in edges {
            product_graph
                .entry(product_id.clone())
                .or_default()
                .insert(user_id.clone(), *weight);
        }
    }
    product_graph
}
