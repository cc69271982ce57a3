use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use affinity_core::config::ConfigOverrides;
use toml::Value;

use super::{load_config, CommandResult};

const COMMAND: &str = "config";

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match load_config(COMMAND, config_path.clone(), ConfigOverrides::default()) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path(config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "normalization.policy",
        config.normalization.policy.as_str(),
        source("normalization.policy", &["AFFINITY_NORMALIZATION_POLICY"]),
    ));
    let seed = config.normalization.seed.map(|seed| seed.to_string());
    lines.push(render_line(
        "normalization.seed",
        seed.as_deref().unwrap_or("<unset>"),
        source("normalization.seed", &["AFFINITY_NORMALIZATION_SEED"]),
    ));
    for (kind, band) in config.normalization.bands.iter() {
        let key_path = format!("normalization.bands.{kind}");
        lines.push(render_line(
            &key_path,
            &format!("[{:.2}, {:.2}]", band.low(), band.high()),
            source(&key_path, &[]),
        ));
    }

    lines.push(render_line(
        "ranking.strategy",
        config.ranking.strategy.as_str(),
        source("ranking.strategy", &["AFFINITY_RANKING_STRATEGY"]),
    ));
    lines.push(render_line(
        "ranking.top_n",
        &config.ranking.top_n.to_string(),
        source("ranking.top_n", &["AFFINITY_RANKING_TOP_N"]),
    ));
    lines.push(render_line(
        "ranking.adjacency",
        config.ranking.adjacency.as_str(),
        source("ranking.adjacency", &["AFFINITY_RANKING_ADJACENCY"]),
    ));
    let max_depth = config.ranking.max_depth.map(|depth| depth.to_string());
    lines.push(render_line(
        "ranking.max_depth",
        max_depth.as_deref().unwrap_or("<unbounded>"),
        source("ranking.max_depth", &["AFFINITY_RANKING_MAX_DEPTH"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["AFFINITY_LOGGING_LEVEL", "AFFINITY_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        config.logging.format.as_str(),
        source("logging.format", &["AFFINITY_LOGGING_FORMAT", "AFFINITY_LOG_FORMAT"]),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("affinity.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/affinity.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_key = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use std::env;

    use toml::Value;

    use super::{contains_path, field_source};

    #[test]
    fn field_source_prefers_file_over_default() {
        let doc: Value = "[ranking]\ntop_n = 3\n".parse().expect("valid toml");

        assert!(contains_path(&doc, "ranking.top_n"));
        assert!(!contains_path(&doc, "ranking.strategy"));
        assert_eq!(
            field_source("ranking.top_n", &[], Some(&doc), None),
            "file (config file)".to_string()
        );
        assert_eq!(field_source("ranking.strategy", &[], Some(&doc), None), "default");
    }

    #[test]
    fn blank_env_value_is_not_reported_as_source() {
        let key = "AFFINITY_CONFIG_SOURCE_TEST_BLANK";
        env::set_var(key, "   ");
        let blank = field_source("ranking.top_n", &[key], None, None);
        env::set_var(key, "3");
        let set = field_source("ranking.top_n", &[key], None, None);
        env::remove_var(key);

        assert_eq!(blank, "default");
        assert_eq!(set, format!("env ({key})"));
    }
}
