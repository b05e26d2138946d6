//! Builder for the client set.
//!
//! Turns a loaded [`Config`] into a shared [`GatewayService`] using the
//! factory registered for each configured gateway implementation, then hands
//! out clients bound to it.

use crate::{
	CateringCompanyClient, OrderingRules, ShieldError, ShieldingIndividualClient, SupermarketClient,
};
use shield_config::Config;
use shield_gateway::{GatewayError, GatewayInterface, GatewayService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while building the client set.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Builds a [`ClientSet`] from configuration.
pub struct ShieldBuilder {
	config: Config,
}

impl ShieldBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Instantiates every configured gateway that has a factory and keeps the
	/// primary one.
	pub fn build<F>(self, factories: &HashMap<String, F>) -> Result<ClientSet, BuilderError>
	where
		F: Fn(&toml::Value) -> Result<Box<dyn GatewayInterface>, GatewayError>,
	{
		let mut gateway_impls = HashMap::new();
		for (name, config) in &self.config.gateway.implementations {
			let Some(factory) = factories.get(name) else {
				tracing::warn!(component = "gateway", implementation = %name, "No factory registered");
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					let is_primary = &self.config.gateway.primary == name;
					tracing::info!(component = "gateway", implementation = %name, enabled = %is_primary, "Loaded");
					gateway_impls.insert(name.clone(), implementation);
				},
				Err(e) => {
					tracing::error!(
						component = "gateway",
						implementation = %name,
						error = %e,
						"Failed to create gateway implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create gateway implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary = &self.config.gateway.primary;
		let backend = gateway_impls.remove(primary).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary gateway '{}' failed to load or has no implementation",
				primary
			))
		})?;

		Ok(ClientSet {
			client_id: self.config.client.id.clone(),
			gateway: Arc::new(GatewayService::new(backend)),
			rules: OrderingRules::from(&self.config.ordering),
		})
	}
}

/// Shared gateway plus ordering rules, from which role clients are created.
pub struct ClientSet {
	client_id: String,
	gateway: Arc<GatewayService>,
	rules: OrderingRules,
}

impl ClientSet {
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	pub fn rules(&self) -> OrderingRules {
		self.rules
	}

	pub fn gateway(&self) -> Arc<GatewayService> {
		self.gateway.clone()
	}

	/// Opens a shielding individual session, fetching the catalogue.
	pub async fn individual(&self) -> Result<ShieldingIndividualClient, ShieldError> {
		ShieldingIndividualClient::connect(self.gateway.clone(), self.rules).await
	}

	pub fn catering_company(&self) -> CateringCompanyClient {
		CateringCompanyClient::new(self.gateway.clone())
	}

	pub fn supermarket(&self) -> SupermarketClient {
		SupermarketClient::new(self.gateway.clone())
	}
}
