use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::interaction::InteractionKind;
use crate::normalizer::{BandTable, NormalizationPolicy, WeightBand, WeightNormalizer};
use crate::recommend::{RankingRequest, RankingStrategy, UserAdjacency, DEFAULT_TOP_N};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub normalization: NormalizationConfig,
    pub ranking: RankingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct NormalizationConfig {
    pub policy: NormalizationPolicy,
    pub seed: Option<u64>,
    pub bands: BandTable,
}

#[derive(Clone, Debug)]
pub struct RankingConfig {
    pub strategy: RankingStrategy,
    pub top_n: usize,
    pub adjacency: UserAdjacency,
    pub max_depth: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub normalization_policy: Option<NormalizationPolicy>,
    pub normalization_seed: Option<u64>,
    pub ranking_strategy: Option<RankingStrategy>,
    pub ranking_top_n: Option<usize>,
    pub ranking_adjacency: Option<UserAdjacency>,
    pub ranking_max_depth: Option<usize>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationConfig {
                policy: NormalizationPolicy::Midpoint,
                seed: None,
                bands: BandTable::default(),
            },
            ranking: RankingConfig {
                strategy: RankingStrategy::Direct,
                top_n: DEFAULT_TOP_N,
                adjacency: UserAdjacency::Isolated,
                max_depth: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl NormalizationConfig {
    /// Normalizer configured with this section's policy, seed and bands
    pub fn normalizer(&self) -> WeightNormalizer {
        WeightNormalizer::with_policy(self.bands.clone(), self.policy, self.seed)
    }
}

impl RankingConfig {
    /// Ranking request for `user_id` carrying this section's defaults
    pub fn request_for(&self, user_id: impl Into<String>) -> RankingRequest {
        RankingRequest::new(user_id)
            .with_strategy(self.strategy)
            .with_top_n(Some(self.top_n))
            .with_adjacency(self.adjacency)
            .with_max_depth(self.max_depth)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("affinity.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(normalization) = patch.normalization {
            if let Some(policy) = normalization.policy {
                self.normalization.policy = policy;
            }
            if let Some(seed) = normalization.seed {
                self.normalization.seed = Some(seed);
            }
            if let Some(bands) = normalization.bands {
                for (label, (low, high)) in bands {
                    let kind = label.parse::<InteractionKind>().map_err(|_| {
                        ConfigError::Validation(format!(
                            "normalization.bands.{label} is not a known interaction kind"
                        ))
                    })?;
                    let band = WeightBand::for_kind(kind.as_str(), low, high)
                        .map_err(|error| ConfigError::Validation(error.to_string()))?;
                    self.normalization.bands.insert(kind, band);
                }
            }
        }

        if let Some(ranking) = patch.ranking {
            if let Some(strategy) = ranking.strategy {
                self.ranking.strategy = strategy;
            }
            if let Some(top_n) = ranking.top_n {
                self.ranking.top_n = top_n;
            }
            if let Some(adjacency) = ranking.adjacency {
                self.ranking.adjacency = adjacency;
            }
            if let Some(max_depth) = ranking.max_depth {
                self.ranking.max_depth = Some(max_depth);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AFFINITY_NORMALIZATION_POLICY") {
            self.normalization.policy = parse_choice("AFFINITY_NORMALIZATION_POLICY", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_NORMALIZATION_SEED") {
            self.normalization.seed = Some(parse_u64("AFFINITY_NORMALIZATION_SEED", &value)?);
        }

        if let Some(value) = read_env("AFFINITY_RANKING_STRATEGY") {
            self.ranking.strategy = parse_choice("AFFINITY_RANKING_STRATEGY", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_RANKING_TOP_N") {
            self.ranking.top_n = parse_usize("AFFINITY_RANKING_TOP_N", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_RANKING_ADJACENCY") {
            self.ranking.adjacency = parse_choice("AFFINITY_RANKING_ADJACENCY", &value)?;
        }
        if let Some(value) = read_env("AFFINITY_RANKING_MAX_DEPTH") {
            self.ranking.max_depth = Some(parse_usize("AFFINITY_RANKING_MAX_DEPTH", &value)?);
        }

        let log_level =
            read_env("AFFINITY_LOGGING_LEVEL").or_else(|| read_env("AFFINITY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AFFINITY_LOGGING_FORMAT").or_else(|| read_env("AFFINITY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(policy) = overrides.normalization_policy {
            self.normalization.policy = policy;
        }
        if let Some(seed) = overrides.normalization_seed {
            self.normalization.seed = Some(seed);
        }
        if let Some(strategy) = overrides.ranking_strategy {
            self.ranking.strategy = strategy;
        }
        if let Some(top_n) = overrides.ranking_top_n {
            self.ranking.top_n = top_n;
        }
        if let Some(adjacency) = overrides.ranking_adjacency {
            self.ranking.adjacency = adjacency;
        }
        if let Some(max_depth) = overrides.ranking_max_depth {
            self.ranking.max_depth = Some(max_depth);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_normalization(&self.normalization)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("affinity.toml"), PathBuf::from("config/affinity.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_normalization(normalization: &NormalizationConfig) -> Result<(), ConfigError> {
    if normalization.bands.is_empty() {
        return Err(ConfigError::Validation(
            "normalization.bands must define at least one interaction kind".to_string(),
        ));
    }

    for (kind, band) in normalization.bands.iter() {
        WeightBand::for_kind(kind.as_str(), band.low(), band.high())
            .map_err(|error| ConfigError::Validation(error.to_string()))?;
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_choice<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    value.parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    parse_choice(key, value)
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    parse_choice(key, value)
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    normalization: Option<NormalizationPatch>,
    ranking: Option<RankingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct NormalizationPatch {
    policy: Option<NormalizationPolicy>,
    seed: Option<u64>,
    bands: Option<BTreeMap<String, (f64, f64)>>,
}

#[derive(Debug, Default, Deserialize)]
struct RankingPatch {
    strategy: Option<RankingStrategy>,
    top_n: Option<usize>,
    adjacency: Option<UserAdjacency>,
    max_depth: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::domain::interaction::InteractionKind;
    use crate::normalizer::NormalizationPolicy;
    use crate::recommend::{RankingStrategy, UserAdjacency};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const AFFINITY_VARS: &[&str] = &[
        "AFFINITY_NORMALIZATION_POLICY",
        "AFFINITY_NORMALIZATION_SEED",
        "AFFINITY_RANKING_STRATEGY",
        "AFFINITY_RANKING_TOP_N",
        "AFFINITY_RANKING_ADJACENCY",
        "AFFINITY_RANKING_MAX_DEPTH",
        "AFFINITY_LOGGING_LEVEL",
        "AFFINITY_LOG_LEVEL",
        "AFFINITY_LOGGING_FORMAT",
        "AFFINITY_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, contents: &str) -> Result<std::path::PathBuf, String> {
        let path = dir.path().join("affinity.toml");
        fs::write(&path, contents).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn defaults_select_midpoint_direct_ranking() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(AFFINITY_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.normalization.policy == NormalizationPolicy::Midpoint,
            "default policy should be midpoint",
        )?;
        ensure(config.ranking.strategy == RankingStrategy::Direct, "default strategy is direct")?;
        ensure(config.ranking.top_n == 5, "default top_n should be 5")?;
        ensure(
            config.ranking.adjacency == UserAdjacency::Isolated,
            "default adjacency should be none",
        )?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "default format is compact")
    }

    #[test]
    fn file_load_supports_env_interpolation_and_bands() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(AFFINITY_VARS);
        env::set_var("TEST_AFFINITY_SEED", "99");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[normalization]
policy = "randomized"
seed = ${TEST_AFFINITY_SEED}

[normalization.bands]
like = [0.55, 0.60]

[ranking]
strategy = "weighted_bfs"
adjacency = "shared_product"
max_depth = 2
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.normalization.policy == NormalizationPolicy::Randomized,
                "policy should come from file",
            )?;
            ensure(config.normalization.seed == Some(99), "seed should be interpolated")?;
            let like = config.normalization.bands.get(InteractionKind::Like);
            ensure(
                like.is_some_and(|band| band.low() == 0.55 && band.high() == 0.60),
                "like band should be overridden",
            )?;
            ensure(
                config.normalization.bands.get(InteractionKind::Purchase).is_some(),
                "untouched bands keep their defaults",
            )?;
            ensure(
                config.ranking.strategy == RankingStrategy::WeightedBfs,
                "strategy should come from file",
            )?;
            ensure(config.ranking.max_depth == Some(2), "max depth should come from file")?;
            ensure(
                config.ranking.adjacency == UserAdjacency::SharedProduct,
                "adjacency should come from file",
            )
        })();

        clear_vars(&["TEST_AFFINITY_SEED"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(AFFINITY_VARS);
        env::set_var("AFFINITY_RANKING_TOP_N", "7");
        env::set_var("AFFINITY_LOG_LEVEL", "warn");
        env::set_var("AFFINITY_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[ranking]
top_n = 3
strategy = "weighted_bfs"

[logging]
level = "error"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    ranking_strategy: Some(RankingStrategy::Direct),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.ranking.top_n == 7, "env top_n should win over file")?;
            ensure(
                config.ranking.strategy == RankingStrategy::Direct,
                "override strategy should win over file",
            )?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "log format alias should be read from env",
            )
        })();

        clear_vars(AFFINITY_VARS);
        result
    }

    #[test]
    fn invalid_band_fails_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(AFFINITY_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[normalization.bands]
cart = [0.9, 0.2]
"#,
        )?;

        let error = match AppConfig::load(LoadOptions {
            config_path: Some(path),
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure but config load succeeded".into()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("`cart`")),
            "validation failure should name the cart band",
        )
    }

    #[test]
    fn unknown_band_kind_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(AFFINITY_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[normalization.bands]
wishlist = [0.1, 0.2]
"#,
        )?;

        let result =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("wishlist")),
            "unknown band kind should be reported",
        )
    }

    #[test]
    fn invalid_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(AFFINITY_VARS);
        env::set_var("AFFINITY_NORMALIZATION_POLICY", "gaussian");

        let result = AppConfig::load(LoadOptions::default());
        clear_vars(AFFINITY_VARS);

        ensure(
            matches!(
                result,
                Err(ConfigError::InvalidEnvOverride { ref key, .. })
                    if key == "AFFINITY_NORMALIZATION_POLICY"
            ),
            "invalid policy should be reported against its env key",
        )
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(AFFINITY_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let result = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "require_file should fail when the file is absent",
        )
    }

    #[test]
    fn log_format_round_trips_through_config_spelling() -> Result<(), String> {
        for format in [LogFormat::Compact, LogFormat::Pretty, LogFormat::Json] {
            let parsed = format
                .as_str()
                .parse::<LogFormat>()
                .map_err(|err| format!("`{}` should parse: {err}", format.as_str()))?;
            ensure(parsed == format, "as_str should use the config file spelling")?;
        }
        Ok(())
    }

    #[test]
    fn ranking_section_builds_requests_and_normalizers() -> Result<(), String> {
        let mut config = AppConfig::default();
        config.ranking.top_n = 3;
        config.ranking.adjacency = UserAdjacency::SharedProduct;
        config.normalization.policy = NormalizationPolicy::Randomized;
        config.normalization.seed = Some(5);

        let request = config.ranking.request_for("u001");
        let normalizer = config.normalization.normalizer();

        ensure(request.user_id == "u001", "request should target the user")?;
        ensure(request.top_n == Some(3), "request should carry top_n")?;
        ensure(
            request.adjacency == UserAdjacency::SharedProduct,
            "request should carry adjacency",
        )?;
        ensure(
            normalizer.policy() == NormalizationPolicy::Randomized && normalizer.seed() == Some(5),
            "normalizer should carry policy and seed",
        )
    }
}
