use std::path::PathBuf;

use affinity_core::config::ConfigOverrides;
use affinity_core::graph::{GraphEngine, GraphStats};
use clap::Args;
use indexmap::IndexMap;
use serde::Serialize;

use super::{load_config, to_pretty_json, CommandResult};
use crate::ingest;

const COMMAND: &str = "graph";

#[derive(Debug, Clone, Args)]
pub struct GraphArgs {
    #[arg(long, help = "Path to the JSON interaction history")]
    pub input: PathBuf,
    #[arg(long, help = "Print the product -> user view instead of user -> product")]
    pub transpose: bool,
}

#[derive(Debug, Serialize)]
struct GraphReport<'a> {
    command: &'static str,
    view: &'static str,
    stats: GraphStats,
    graph: &'a IndexMap<String, IndexMap<String, f64>>,
}

pub fn run(config_path: Option<PathBuf>, args: &GraphArgs) -> CommandResult {
    let config = match load_config(COMMAND, config_path, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let mut engine = GraphEngine::new(config.normalization.normalizer());
    if let Err(error) = ingest::load_engine(&args.input, &mut engine) {
        return CommandResult::from_application_error(COMMAND, &error);
    }
    let snapshot = engine.build_graph();

    let report = if args.transpose {
        GraphReport {
            command: COMMAND,
            view: "product",
            stats: snapshot.stats(),
            graph: snapshot.product_graph(),
        }
    } else {
        GraphReport {
            command: COMMAND,
            view: "user",
            stats: snapshot.stats(),
            graph: snapshot.user_graph(),
        }
    };
    to_pretty_json(COMMAND, &report)
}
