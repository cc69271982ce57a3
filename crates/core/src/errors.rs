use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("identifier `{field}` must not be empty")]
    InvalidIdentifier { field: &'static str },
    #[error("invalid weight band for `{kind}`: [{low}, {high}] must satisfy 0 <= low <= high <= 1")]
    InvalidWeightBand { kind: String, low: f64, high: f64 },
    #[error("unknown interaction kind `{0}`")]
    UnknownInteractionKind(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("ingestion failure: {0}")]
    Ingestion(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable machine-readable class used by operator tooling.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidIdentifier { .. }) => "invalid_identifier",
            Self::Domain(DomainError::InvalidWeightBand { .. }) => "invalid_weight_band",
            Self::Domain(DomainError::UnknownInteractionKind(_)) => "unknown_interaction_kind",
            Self::Ingestion(_) => "ingestion",
            Self::Configuration(_) => "configuration",
        }
    }
}
