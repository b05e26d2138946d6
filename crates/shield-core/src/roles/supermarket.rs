use super::{not_registered, register_business, Business};
use crate::ShieldError;
use shield_gateway::{Endpoint, GatewayService};
use shield_types::{Chi, Postcode, RoleOrderStatus};
use std::sync::Arc;
use tracing::instrument;

/// Client used by a supermarket to record and progress its own orders.
///
/// Supermarket order numbers are chosen by the supermarket, not the service.
pub struct SupermarketClient {
	gateway: Arc<GatewayService>,
	business: Option<Business>,
}

impl SupermarketClient {
	pub fn new(gateway: Arc<GatewayService>) -> Self {
		Self {
			gateway,
			business: None,
		}
	}

	#[instrument(skip(self))]
	pub async fn register(&mut self, name: &str, postcode: &str) -> Result<(), ShieldError> {
		let business = register_business(&self.gateway, "/registerSupermarket", name, postcode).await?;
		self.business = Some(business);
		Ok(())
	}

	/// Records an order taken for a shielding individual.
	#[instrument(skip(self))]
	pub async fn record_order(&self, chi: &str, order_number: u32) -> Result<(), ShieldError> {
		let business = self.business.as_ref().ok_or_else(not_registered)?;
		let chi = Chi::parse(chi)?;

		let endpoint = Endpoint::new("/recordSupermarketOrder")
			.param("individual_id", chi.as_str())
			.param("order_number", order_number)
			.param("supermarket_business_name", &business.name)
			.param("supermarket_postcode", business.postcode.as_str());
		self.gateway.fetch_acknowledged(&endpoint).await?;
		tracing::info!(order_number, "Supermarket order recorded");
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn update_order_status(
		&self,
		order_number: u32,
		status: RoleOrderStatus,
	) -> Result<(), ShieldError> {
		if self.business.is_none() {
			return Err(not_registered());
		}
		let endpoint = Endpoint::new("/updateSupermarketOrderStatus")
			.param("order_id", order_number)
			.param("newStatus", status);
		self.gateway.fetch_acknowledged(&endpoint).await?;
		tracing::info!(order_number, status = %status, "Supermarket order status updated");
		Ok(())
	}

	pub fn is_registered(&self) -> bool {
		self.business.is_some()
	}

	pub fn name(&self) -> Option<&str> {
		self.business.as_ref().map(|b| b.name.as_str())
	}

	pub fn postcode(&self) -> Option<&Postcode> {
		self.business.as_ref().map(|b| &b.postcode)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use shield_gateway::implementations::memory::MemoryGateway;
	use shield_gateway::GatewayError;

	const CHI: &str = "0101801234";

	#[tokio::test]
	async fn test_record_and_progress_order() {
		let memory = MemoryGateway::new();
		memory.add_individual(CHI, "EH1 100").await;
		let mut client = SupermarketClient::new(Arc::new(GatewayService::new(Box::new(memory.clone()))));

		assert!(matches!(
			client.record_order(CHI, 7).await,
			Err(ShieldError::InvalidState(_))
		));

		client.register("corner shop", "EH2_200").await.unwrap();
		assert_eq!(client.name(), Some("corner shop"));

		assert!(matches!(
			client.record_order("99", 7).await,
			Err(ShieldError::Validation(_))
		));
		client.record_order(CHI, 7).await.unwrap();
		assert!(matches!(
			client.record_order(CHI, 7).await,
			Err(ShieldError::Gateway(GatewayError::Rejected(_)))
		));

		client
			.update_order_status(7, RoleOrderStatus::Packed)
			.await
			.unwrap();
		assert!(client
			.update_order_status(8, RoleOrderStatus::Packed)
			.await
			.is_err());
	}

	#[tokio::test]
	async fn test_unregistered_status_update() {
		let client = SupermarketClient::new(Arc::new(GatewayService::new(Box::new(MemoryGateway::new()))));
		assert!(!client.is_registered());
		assert!(matches!(
			client.update_order_status(1, RoleOrderStatus::Delivered).await,
			Err(ShieldError::InvalidState(_))
		));
	}
}
