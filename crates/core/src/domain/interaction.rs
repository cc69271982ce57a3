use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Purchase,
    Cart,
    Like,
    View,
    Skip,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 5] = [
        InteractionKind::Purchase,
        InteractionKind::Cart,
        InteractionKind::Like,
        InteractionKind::View,
        InteractionKind::Skip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Cart => "cart",
            Self::Like => "like",
            Self::View => "view",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "purchase" => Ok(Self::Purchase),
            "cart" => Ok(Self::Cart),
            "like" => Ok(Self::Like),
            "view" => Ok(Self::View),
            "skip" => Ok(Self::Skip),
            _ => Err(DomainError::UnknownInteractionKind(value.to_owned())),
        }
    }
}

/// One ingested user action. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Engine-assigned sequence number, increasing across all users.
    pub sequence: u64,
    pub user_id: String,
    pub product_id: String,
    /// Label as handed in by the ingestion side.
    pub label: String,
    /// `None` when the label is not a recognised interaction kind.
    pub kind: Option<InteractionKind>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl InteractionRecord {
    pub fn new(
        sequence: u64,
        user_id: &str,
        product_id: &str,
        label: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        let user_id = require_identifier("user_id", user_id)?;
        let product_id = require_identifier("product_id", product_id)?;

        Ok(Self {
            sequence,
            user_id,
            product_id,
            label: label.to_owned(),
            kind: label.parse().ok(),
            timestamp,
        })
    }

    pub fn is_known_kind(&self) -> bool {
        self.kind.is_some()
    }
}

fn require_identifier(field: &'static str, value: &str) -> Result<String, DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidIdentifier { field });
    }
    Ok(value.to_owned())
}
