pub mod config;
pub mod graph;
pub mod recommend;

use std::path::PathBuf;

use affinity_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use affinity_core::errors::ApplicationError;
use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_DOMAIN: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Map an application failure onto the command's exit code contract.
    pub fn from_application_error(command: &str, error: &ApplicationError) -> Self {
        let exit_code = match error {
            ApplicationError::Configuration(_) => EXIT_CONFIG,
            ApplicationError::Ingestion(_) => EXIT_INPUT,
            ApplicationError::Domain(_) => EXIT_DOMAIN,
        };
        Self::failure(command, error.error_class(), error.to_string(), exit_code)
    }
}

pub(crate) fn load_config(
    command: &str,
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
) -> Result<AppConfig, CommandResult> {
    let require_file = config_path.is_some();
    AppConfig::load(LoadOptions { config_path, require_file, overrides }).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("config validation failed: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn to_pretty_json<T: Serialize>(command: &str, payload: &T) -> CommandResult {
    match serde_json::to_string_pretty(payload) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
