pub mod config;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod normalizer;
pub mod recommend;

pub use config::{AppConfig, ConfigError, LoadOptions};
pub use domain::interaction::{InteractionKind, InteractionRecord};
pub use errors::{ApplicationError, DomainError};
pub use graph::{
    GraphEngine, GraphSnapshot, GraphStats, InteractionHistory, ProductGraph,
    TimedInteractionHistory, UserGraph,
};
pub use normalizer::{BandTable, NormalizationPolicy, WeightBand, WeightNormalizer};
pub use recommend::{
    RankedProduct, RankingRequest, RankingStrategy, Recommendation, TraversalOptions,
    UserAdjacency, DEFAULT_TOP_N,
};
