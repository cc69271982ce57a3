use std::path::PathBuf;

use affinity_core::config::ConfigOverrides;
use affinity_core::graph::GraphEngine;
use affinity_core::normalizer::NormalizationPolicy;
use affinity_core::recommend::{RankingStrategy, Recommendation, UserAdjacency};
use clap::Args;
use tracing::info;

use super::{load_config, CommandResult};
use crate::display::{JsonDisplay, RecommendationDisplay, TextDisplay};
use crate::ingest;

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Path to the JSON interaction history")]
    pub input: PathBuf,
    #[arg(long, help = "User to rank products for")]
    pub user: String,
    #[arg(long, help = "Ranking strategy: direct | weighted_bfs")]
    pub strategy: Option<RankingStrategy>,
    #[arg(long = "top-n", help = "Maximum number of products to return")]
    pub top_n: Option<usize>,
    #[arg(long, help = "Weight policy: midpoint | randomized")]
    pub policy: Option<NormalizationPolicy>,
    #[arg(long, help = "Seed for the randomized policy")]
    pub seed: Option<u64>,
    #[arg(long, help = "User adjacency for weighted_bfs: none | shared_product")]
    pub adjacency: Option<UserAdjacency>,
    #[arg(long = "max-depth", help = "Maximum hop count for weighted_bfs")]
    pub max_depth: Option<usize>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

impl RecommendArgs {
    pub fn new(input: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            user: user.into(),
            strategy: None,
            top_n: None,
            policy: None,
            seed: None,
            adjacency: None,
            max_depth: None,
            json: false,
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            normalization_policy: self.policy,
            normalization_seed: self.seed,
            ranking_strategy: self.strategy,
            ranking_top_n: self.top_n,
            ranking_adjacency: self.adjacency,
            ranking_max_depth: self.max_depth,
            log_level: None,
        }
    }
}

pub fn run(config_path: Option<PathBuf>, args: &RecommendArgs) -> CommandResult {
    let config = match load_config(COMMAND, config_path, args.overrides()) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let mut engine = GraphEngine::new(config.normalization.normalizer());
    if let Err(error) = ingest::load_engine(&args.input, &mut engine) {
        return CommandResult::from_application_error(COMMAND, &error);
    }

    let recommender = Recommendation::new(engine.build_graph());
    let request = config.ranking.request_for(args.user.as_str());
    let ranked = recommender.rank(&request);

    info!(
        event_name = "cli.recommend.completed",
        user_id = %request.user_id,
        strategy = %request.strategy,
        policy = %config.normalization.policy,
        results = ranked.len(),
        "recommendations rendered"
    );

    let output = if args.json {
        JsonDisplay.render(&request.user_id, &ranked)
    } else {
        TextDisplay.render(&request.user_id, &ranked)
    };
    CommandResult { exit_code: 0, output }
}
