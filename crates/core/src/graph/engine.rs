use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, warn};

use super::snapshot::{GraphSnapshot, UserGraph};
use super::{InteractionHistory, TimedInteractionHistory};
use crate::domain::interaction::InteractionRecord;
use crate::errors::DomainError;
use crate::normalizer::{WeightNormalizer, UNKNOWN_WEIGHT};

type StagedAction<'a> = (&'a str, &'a str, Option<DateTime<Utc>>);

/// Owns the interaction log and builds weighted graph snapshots from it.
#[derive(Debug, Clone)]
pub struct GraphEngine {
    normalizer: WeightNormalizer,
    history: IndexMap<String, Vec<InteractionRecord>>,
    next_sequence: u64,
    current: Arc<GraphSnapshot>,
}

impl GraphEngine {
    pub fn new(normalizer: WeightNormalizer) -> Self {
        Self {
            normalizer,
            history: IndexMap::new(),
            next_sequence: 0,
            current: Arc::new(GraphSnapshot::default()),
        }
    }

    pub fn normalizer(&self) -> &WeightNormalizer {
        &self.normalizer
    }

    /// Append one action to the user's history.
    pub fn record_action(
        &mut self,
        user_id: &str,
        product_id: &str,
        kind: &str,
    ) -> Result<&InteractionRecord, DomainError> {
        self.record_action_at(user_id, product_id, kind, None)
    }

    pub fn record_action_at(
        &mut self,
        user_id: &str,
        product_id: &str,
        kind: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<&InteractionRecord, DomainError> {
        let record =
            InteractionRecord::new(self.next_sequence, user_id, product_id, kind, timestamp)?;
        self.next_sequence += 1;

        let actions = self.history.entry(record.user_id.clone()).or_default();
        actions.push(record);
        Ok(&actions[actions.len() - 1])
    }

    /// Record a whole ingestion batch in order.
    ///
    /// The batch is validated before anything is appended, so a rejected
    /// batch leaves the history untouched. Users listed with no actions are
    /// still registered and show up in the graph with no edges.
    pub fn ingest(&mut self, batch: &InteractionHistory) -> Result<usize, DomainError> {
        self.ingest_batch(batch.iter().map(|(user_id, actions)| {
            let actions = actions
                .iter()
                .map(|(product_id, kind)| {
                    (product_id.as_str(), kind.as_str(), None::<DateTime<Utc>>)
                })
                .collect::<Vec<_>>();
            (user_id.as_str(), actions)
        }))
    }

    /// [`GraphEngine::ingest`] for entries that carry an optional timestamp.
    pub fn ingest_timed(&mut self, batch: &TimedInteractionHistory) -> Result<usize, DomainError> {
        self.ingest_batch(batch.iter().map(|(user_id, actions)| {
            let actions = actions
                .iter()
                .map(|(product_id, kind, timestamp)| {
                    (product_id.as_str(), kind.as_str(), *timestamp)
                })
                .collect::<Vec<_>>();
            (user_id.as_str(), actions)
        }))
    }

    fn ingest_batch<'a>(
        &mut self,
        batch: impl Iterator<Item = (&'a str, Vec<StagedAction<'a>>)>,
    ) -> Result<usize, DomainError> {
        let mut sequence = self.next_sequence;
        let mut staged = Vec::new();

        for (user_id, actions) in batch {
            if user_id.trim().is_empty() {
                return Err(DomainError::InvalidIdentifier { field: "user_id" });
            }
            let mut records = Vec::with_capacity(actions.len());
            for (product_id, kind, timestamp) in actions {
                let record = InteractionRecord::new(sequence, user_id, product_id, kind, timestamp)?;
                records.push(record);
                sequence += 1;
            }
            staged.push((user_id.to_owned(), records));
        }

        let users = staged.len();
        let recorded = (sequence - self.next_sequence) as usize;
        for (user_id, records) in staged {
            self.history.entry(user_id).or_default().extend(records);
        }
        self.next_sequence = sequence;

        debug!(
            event_name = "graph.ingest.completed",
            users,
            records = recorded,
            "interaction batch recorded"
        );
        Ok(recorded)
    }

    pub fn history(&self, user_id: &str) -> &[InteractionRecord] {
        self.history.get(user_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn users(&self) -> impl Iterator<Item = &str> + '_ {
        self.history.keys().map(String::as_str)
    }

    pub fn record_count(&self) -> usize {
        self.history.values().map(Vec::len).sum()
    }

    /// Drop the interaction log. The published snapshot stays until the next build.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Rebuild the user graph from the full history and publish it.
    ///
    /// Each record is weighted exactly once per build and summed into its
    /// `(user, product)` edge.
    pub fn build_graph(&mut self) -> Arc<GraphSnapshot> {
        self.normalizer.begin_pass();

        let mut user_graph = UserGraph::with_capacity(self.history.len());
        let mut records = 0usize;

        for (user_id, actions) in &self.history {
            let edges = user_graph.entry(user_id.clone()).or_default();
            for record in actions {
                let weight = match record.kind {
                    Some(kind) => self.normalizer.weight_for(kind),
                    None => {
                        warn!(
                            event_name = "graph.build.unknown_kind",
                            user_id = %record.user_id,
                            product_id = %record.product_id,
                            label = %record.label,
                            "unrecognised interaction kind contributes zero weight"
                        );
                        UNKNOWN_WEIGHT
                    }
                };
                *edges.entry(record.product_id.clone()).or_insert(0.0) += weight;
                records += 1;
            }
        }

        let snapshot = Arc::new(GraphSnapshot::from_user_graph(user_graph, records));
        let stats = snapshot.stats();
        debug!(
            event_name = "graph.build.completed",
            policy = %self.normalizer.policy(),
            users = stats.users,
            products = stats.products,
            edges = stats.edges,
            records = stats.records,
            "graph snapshot rebuilt"
        );

        self.current = Arc::clone(&snapshot);
        snapshot
    }

    /// Most recently built snapshot; empty before the first build.
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&self.current)
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new(WeightNormalizer::default())
    }
}
