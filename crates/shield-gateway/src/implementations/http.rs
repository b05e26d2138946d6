//! HTTP gateway backed by reqwest.
//!
//! Retrievals are sent as GET and submissions as POST with a JSON body. The
//! service root is taken from configuration and request paths are appended
//! to it verbatim.

use crate::{GatewayError, GatewayFactory, GatewayInterface, GatewayRegistry};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use shield_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::time::Duration;

/// Request timeout used when the configuration does not set one.
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Gateway talking to the remote service over HTTP.
pub struct HttpGateway {
	client: reqwest::Client,
	/// Service root without a trailing slash, e.g. `http://localhost:5000`.
	endpoint: String,
}

impl HttpGateway {
	pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GatewayError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| GatewayError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			endpoint: endpoint.trim_end_matches('/').to_string(),
		})
	}

	fn url(&self, path: &str) -> Result<reqwest::Url, GatewayError> {
		let raw = format!("{}{}", self.endpoint, path);
		reqwest::Url::parse(&raw).map_err(|e| GatewayError::InvalidPath(format!("{}: {}", raw, e)))
	}

	async fn read_body(response: reqwest::Response) -> Result<String, GatewayError> {
		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| GatewayError::Network(e.to_string()))?;

		if !status.is_success() {
			return Err(GatewayError::Status {
				status: status.as_u16(),
				body,
			});
		}
		Ok(body)
	}
}

#[async_trait]
impl GatewayInterface for HttpGateway {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpGatewaySchema)
	}

	async fn fetch(&self, path: &str) -> Result<String, GatewayError> {
		let response = self
			.client
			.get(self.url(path)?)
			.send()
			.await
			.map_err(|e| GatewayError::Network(e.to_string()))?;
		Self::read_body(response).await
	}

	async fn submit(&self, path: &str, body: &str) -> Result<String, GatewayError> {
		let response = self
			.client
			.post(self.url(path)?)
			.header(CONTENT_TYPE, "application/json")
			.body(body.to_string())
			.send()
			.await
			.map_err(|e| GatewayError::Network(e.to_string()))?;
		Self::read_body(response).await
	}
}

/// Configuration schema for [`HttpGateway`].
pub struct HttpGatewaySchema;

impl ConfigSchema for HttpGatewaySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("endpoint", FieldType::HttpUrl)],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);
		schema.validate(config)
	}
}

/// Builds an [`HttpGateway`] from its configuration block.
///
/// Configuration parameters:
/// - `endpoint`: service root URL (required)
/// - `timeout_seconds`: per-request timeout, 1..=300 (default 30)
pub fn create_gateway(config: &toml::Value) -> Result<Box<dyn GatewayInterface>, GatewayError> {
	HttpGatewaySchema
		.validate(config)
		.map_err(|e| GatewayError::Configuration(format!("Invalid http gateway config: {}", e)))?;

	let endpoint = config
		.get("endpoint")
		.and_then(|v| v.as_str())
		.ok_or_else(|| GatewayError::Configuration("endpoint is required".into()))?;
	let timeout_seconds = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	Ok(Box::new(HttpGateway::new(
		endpoint,
		Duration::from_secs(timeout_seconds),
	)?))
}

/// Registry for the HTTP gateway.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = GatewayFactory;

	fn factory() -> Self::Factory {
		create_gateway
	}
}

impl GatewayRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_url_joining() {
		let gateway = HttpGateway::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
		let url = gateway.url("/requestStatus?order_id=3").unwrap();
		assert_eq!(url.as_str(), "http://localhost:5000/requestStatus?order_id=3");
	}

	#[test]
	fn test_factory_validates_config() {
		let config: toml::Value = toml::from_str(
			r#"
endpoint = "http://localhost:5000"
timeout_seconds = 5
"#,
		)
		.unwrap();
		assert!(create_gateway(&config).is_ok());

		let config: toml::Value = toml::from_str("timeout_seconds = 5").unwrap();
		assert!(matches!(
			create_gateway(&config),
			Err(GatewayError::Configuration(_))
		));

		let config: toml::Value = toml::from_str(r#"endpoint = "ftp://localhost""#).unwrap();
		assert!(create_gateway(&config).is_err());
	}

	#[tokio::test]
	async fn test_unreachable_service_is_network_error() {
		// Port 9 (discard) on localhost is closed in test environments
		let gateway = HttpGateway::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
		let result = gateway.fetch("/getCaterers").await;
		assert!(matches!(result, Err(GatewayError::Network(_))));
	}
}
