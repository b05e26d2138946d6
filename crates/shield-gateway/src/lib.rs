//! Remote gateway module for the shielding food-box client.
//!
//! Every exchange with the remote ordering service goes through this crate.
//! The service is reached with two call shapes: an idempotent `fetch` and a
//! state-changing `submit` carrying a JSON body. Responses come back as
//! plain text that is either a bare token, a bare number or a JSON array;
//! [`Payload`] classifies them and callers state which shape each endpoint
//! must return.

use async_trait::async_trait;
use shield_types::{ConfigSchema, ImplementationRegistry, OrderContents};
use thiserror::Error;

mod endpoint;
mod payload;

pub use endpoint::Endpoint;
pub use payload::Payload;

/// Re-export implementations
pub mod implementations {
	pub mod http;
	pub mod memory;
}

/// Errors that can occur while talking to the remote service.
#[derive(Debug, Error)]
pub enum GatewayError {
	/// The request could not be delivered or the response not read.
	#[error("Network error: {0}")]
	Network(String),
	/// The service answered with a non-success HTTP status.
	#[error("Remote returned status {status}: {body}")]
	Status { status: u16, body: String },
	/// The response did not have the shape the endpoint promises.
	#[error("Unexpected payload: {0}")]
	UnexpectedPayload(String),
	/// The service understood the request and refused it.
	#[error("Request rejected: {0}")]
	Rejected(String),
	/// The request path could not be built.
	#[error("Invalid request path: {0}")]
	InvalidPath(String),
	/// The implementation configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait implemented by every way of reaching the remote service.
///
/// Paths are given relative to the service root and already carry their
/// encoded query string, e.g. `/requestStatus?order_id=3`.
#[async_trait]
pub trait GatewayInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Idempotent retrieval (GET semantics). Returns the raw response body.
	async fn fetch(&self, path: &str) -> Result<String, GatewayError>;

	/// State-changing submission (POST semantics) with a JSON body.
	async fn submit(&self, path: &str, body: &str) -> Result<String, GatewayError>;
}

/// Signature every gateway implementation exposes to build itself from its
/// TOML block.
pub type GatewayFactory = fn(&toml::Value) -> Result<Box<dyn GatewayInterface>, GatewayError>;

pub trait GatewayRegistry: ImplementationRegistry<Factory = GatewayFactory> {}

/// All built-in implementations as `(name, factory)` pairs.
pub fn get_all_implementations() -> Vec<(&'static str, GatewayFactory)> {
	use implementations::{http, memory};

	vec![
		(http::Registry::NAME, http::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Typed front of a gateway implementation.
///
/// Serializes submission bodies, classifies responses and logs traffic. It
/// never retries: a failed exchange is reported to the caller as is.
pub struct GatewayService {
	backend: Box<dyn GatewayInterface>,
}

impl GatewayService {
	pub fn new(backend: Box<dyn GatewayInterface>) -> Self {
		Self { backend }
	}

	/// Performs a retrieval and classifies the response.
	pub async fn fetch(&self, endpoint: &Endpoint) -> Result<Payload, GatewayError> {
		let path = endpoint.render()?;
		tracing::debug!(path = %path, "Gateway fetch");

		let body = self.backend.fetch(&path).await.map_err(|e| {
			tracing::warn!(path = %path, error = %e, "Gateway fetch failed");
			e
		})?;
		Ok(Payload::classify(&body))
	}

	/// Submits order contents as `{"contents": [...]}` and classifies the
	/// response.
	pub async fn submit(
		&self,
		endpoint: &Endpoint,
		contents: &OrderContents,
	) -> Result<Payload, GatewayError> {
		let path = endpoint.render()?;
		let body = serde_json::to_string(contents)
			.map_err(|e| GatewayError::InvalidPath(format!("Cannot encode body: {}", e)))?;
		tracing::debug!(path = %path, items = contents.contents.len(), "Gateway submit");

		let response = self.backend.submit(&path, &body).await.map_err(|e| {
			tracing::warn!(path = %path, error = %e, "Gateway submit failed");
			e
		})?;
		Ok(Payload::classify(&response))
	}

	/// Fetches an acknowledgement endpoint and requires the `True` token.
	pub async fn fetch_acknowledged(&self, endpoint: &Endpoint) -> Result<(), GatewayError> {
		self.fetch(endpoint).await?.into_acknowledgement()
	}

	/// Submits contents to an acknowledgement endpoint and requires `True`.
	pub async fn submit_acknowledged(
		&self,
		endpoint: &Endpoint,
		contents: &OrderContents,
	) -> Result<(), GatewayError> {
		self.submit(endpoint, contents).await?.into_acknowledgement()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryGateway;
	use shield_types::LineItem;

	#[test]
	fn test_registered_implementations() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["http", "memory"]);
	}

	#[tokio::test]
	async fn test_service_classifies_responses() {
		let memory = MemoryGateway::new();
		let service = GatewayService::new(Box::new(memory.clone()));

		let boxes = service
			.fetch(
				&Endpoint::new("/showFoodBox")
					.param("orderOption", "catering")
					.param("dietaryPreference", ""),
			)
			.await
			.unwrap();
		assert!(matches!(boxes, Payload::List(ref items) if !items.is_empty()));

		let status = service
			.fetch(&Endpoint::new("/requestStatus").param("order_id", 99))
			.await
			.unwrap();
		assert_eq!(status.into_integer().unwrap(), -1);
		assert_eq!(memory.request_count().await, 2);
	}

	#[tokio::test]
	async fn test_service_submit_encodes_contents() {
		let memory = MemoryGateway::new();
		memory
			.add_individual("0101801234", "EH1 100")
			.await;
		let service = GatewayService::new(Box::new(memory.clone()));

		let contents = OrderContents {
			contents: vec![LineItem {
				id: 1,
				name: "cucumbers".to_string(),
				quantity: 1,
			}],
		};
		let order_id = service
			.submit(
				&Endpoint::new("/placeOrder").param("individual_id", "0101801234"),
				&contents,
			)
			.await
			.unwrap()
			.into_integer()
			.unwrap();
		assert_eq!(order_id, 1);
		assert_eq!(memory.order_contents(1).await, Some(contents.contents));
	}
}
