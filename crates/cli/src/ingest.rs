//! JSON interaction history reader
//!
//! The file maps each user id to an ordered list of entries. An entry is a
//! `["product", "kind"]` pair or an object with `product`, `kind` and an
//! optional RFC 3339 `timestamp`. Key order in the file is the ingestion order.

use std::fs;
use std::path::Path;

use affinity_core::errors::ApplicationError;
use affinity_core::graph::{GraphEngine, TimedInteractionHistory};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    Pair(String, String),
    Record {
        product: String,
        kind: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
}

impl HistoryEntry {
    fn parts(&self) -> (&str, &str, Option<DateTime<Utc>>) {
        match self {
            Self::Pair(product, kind) => (product.as_str(), kind.as_str(), None),
            Self::Record { product, kind, timestamp } => {
                (product.as_str(), kind.as_str(), *timestamp)
            }
        }
    }
}

pub type HistoryFile = IndexMap<String, Vec<HistoryEntry>>;

pub fn read_history(path: &Path) -> Result<HistoryFile, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ApplicationError::Ingestion(format!(
            "could not read history file `{}`: {error}",
            path.display()
        ))
    })?;

    parse_history(&raw).map_err(|error| {
        ApplicationError::Ingestion(format!(
            "could not parse history file `{}`: {error}",
            path.display()
        ))
    })
}

pub fn parse_history(raw: &str) -> Result<HistoryFile, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Record every entry of `history` into `engine`, in file order.
///
/// The file is recorded as one batch: an invalid entry anywhere rejects the
/// whole file and leaves `engine` untouched.
pub fn record_history(
    engine: &mut GraphEngine,
    history: &HistoryFile,
) -> Result<usize, ApplicationError> {
    let batch: TimedInteractionHistory = history
        .iter()
        .map(|(user_id, entries)| {
            let actions = entries
                .iter()
                .map(|entry| {
                    let (product_id, kind, timestamp) = entry.parts();
                    (product_id.to_owned(), kind.to_owned(), timestamp)
                })
                .collect();
            (user_id.clone(), actions)
        })
        .collect();
    let recorded = engine.ingest_timed(&batch)?;

    info!(
        event_name = "cli.ingest.completed",
        users = history.len(),
        records = recorded,
        "interaction history loaded"
    );
    Ok(recorded)
}

/// Read the file at `path` into `engine`.
pub fn load_engine(path: &Path, engine: &mut GraphEngine) -> Result<usize, ApplicationError> {
    let history = read_history(path)?;
    record_history(engine, &history)
}
