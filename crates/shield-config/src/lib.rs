//! Configuration module for the shielding food-box client.
//!
//! Configuration is read from TOML. Values may reference environment
//! variables as `${VAR}` or `${VAR:-default}`, and a file may pull in other
//! files with `include = ["gateway.toml"]` as long as every top-level section
//! is defined exactly once.

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The full error repeats the whole input, keep only the message
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this client deployment.
	pub client: ClientConfig,
	/// Ordering policy applied by the lifecycle manager.
	#[serde(default)]
	pub ordering: OrderingConfig,
	/// Remote gateway implementations.
	pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
	/// Name used in logs to tell deployments apart.
	pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderingConfig {
	/// Length of the rolling window in which only one active order may exist.
	#[serde(default = "default_order_window_days")]
	pub order_window_days: u32,
}

impl Default for OrderingConfig {
	fn default() -> Self {
		Self {
			order_window_days: default_order_window_days(),
		}
	}
}

fn default_order_window_days() -> u32 {
	7
}

/// Longest accepted ordering window.
const MAX_ORDER_WINDOW_DAYS: u32 = 31;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
	/// Which implementation the clients talk to.
	pub primary: String,
	/// Implementation name to raw TOML block; each implementation validates
	/// its own block.
	pub implementations: HashMap<String, toml::Value>,
}

/// Replaces `${VAR}` and `${VAR:-default}` references with environment values.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Configuration block of the primary gateway implementation.
	pub fn primary_gateway(&self) -> Option<&toml::Value> {
		self.gateway.implementations.get(&self.gateway.primary)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.client.id.trim().is_empty() {
			return Err(ConfigError::Validation("Client ID cannot be empty".into()));
		}

		let window = self.ordering.order_window_days;
		if window == 0 || window > MAX_ORDER_WINDOW_DAYS {
			return Err(ConfigError::Validation(format!(
				"ordering.order_window_days must be between 1 and {}, got {}",
				MAX_ORDER_WINDOW_DAYS, window
			)));
		}

		if self.gateway.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one gateway implementation must be configured".into(),
			));
		}
		if self.gateway.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Gateway primary implementation cannot be empty".into(),
			));
		}
		if self.primary_gateway().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary gateway '{}' not found in implementations",
				self.gateway.primary
			)));
		}

		Ok(())
	}
}

/// Parses, resolves environment references and validates in one step.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[client]
id = "test-client"

[gateway]
primary = "memory"
[gateway.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("SHIELD_TEST_HOST", "localhost");
		std::env::set_var("SHIELD_TEST_PORT", "5000");

		let input = "endpoint = \"http://${SHIELD_TEST_HOST}:${SHIELD_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "endpoint = \"http://localhost:5000\"");

		std::env::remove_var("SHIELD_TEST_HOST");
		std::env::remove_var("SHIELD_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "endpoint = \"${SHIELD_MISSING_VAR:-http://localhost:5000}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "endpoint = \"http://localhost:5000\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("endpoint = \"${SHIELD_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("SHIELD_MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_defaults() {
		let config: Config = MINIMAL.parse().unwrap();
		assert_eq!(config.client.id, "test-client");
		assert_eq!(config.ordering.order_window_days, 7);
		assert!(config.primary_gateway().is_some());
	}

	#[test]
	fn test_primary_must_exist() {
		let config_str = r#"
[client]
id = "test-client"

[gateway]
primary = "http"
[gateway.implementations.memory]
"#;
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary gateway 'http'"));
	}

	#[test]
	fn test_order_window_bounds() {
		let config_str = format!("{}\n[ordering]\norder_window_days = 0\n", MINIMAL);
		assert!(config_str.parse::<Config>().is_err());

		let config_str = format!("{}\n[ordering]\norder_window_days = 14\n", MINIMAL);
		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.ordering.order_window_days, 14);
	}

	#[test]
	fn test_empty_client_id_rejected() {
		let config_str = MINIMAL.replace("test-client", " ");
		assert!(config_str.parse::<Config>().is_err());
	}
}
