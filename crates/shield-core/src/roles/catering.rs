use super::{not_registered, register_business, Business};
use crate::ShieldError;
use shield_gateway::{Endpoint, GatewayService};
use shield_types::{OrderId, Postcode, RoleOrderStatus};
use std::sync::Arc;
use tracing::instrument;

/// Client used by a catering company to report order progress.
pub struct CateringCompanyClient {
	gateway: Arc<GatewayService>,
	business: Option<Business>,
}

impl CateringCompanyClient {
	pub fn new(gateway: Arc<GatewayService>) -> Self {
		Self {
			gateway,
			business: None,
		}
	}

	/// Registers the company. Registering twice succeeds.
	#[instrument(skip(self))]
	pub async fn register(&mut self, name: &str, postcode: &str) -> Result<(), ShieldError> {
		let business = register_business(&self.gateway, "/registerCateringCompany", name, postcode).await?;
		self.business = Some(business);
		Ok(())
	}

	/// Moves an order one step along packed, dispatched, delivered.
	#[instrument(skip(self))]
	pub async fn update_order_status(
		&self,
		order_id: OrderId,
		status: RoleOrderStatus,
	) -> Result<(), ShieldError> {
		if self.business.is_none() {
			return Err(not_registered());
		}
		let endpoint = Endpoint::new("/updateOrderStatus")
			.param("order_id", order_id)
			.param("newStatus", status);
		self.gateway.fetch_acknowledged(&endpoint).await?;
		tracing::info!(order_id, status = %status, "Order status updated");
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
	use shield_types::{LineItem, OrderContents, OrderStatus};

	async fn place_order(gateway: &GatewayService, memory: &MemoryGateway) -> OrderId {
		memory.add_individual("0101801234", "EH1 100").await;
		let contents = OrderContents {
			contents: vec![LineItem {
				id: 1,
				name: "cucumbers".to_string(),
				quantity: 1,
			}],
		};
		let raw = gateway
			.submit(
				&Endpoint::new("/placeOrder").param("individual_id", "0101801234"),
				&contents,
			)
			.await
			.unwrap()
			.into_integer()
			.unwrap();
		OrderId::try_from(raw).unwrap()
	}

	#[tokio::test]
	async fn test_register_validates_and_is_idempotent() {
		let memory = MemoryGateway::new();
		let mut client = CateringCompanyClient::new(Arc::new(GatewayService::new(Box::new(memory.clone()))));

		assert!(matches!(
			client.register("leith kitchen", "G1_100").await,
			Err(ShieldError::Validation(_))
		));
		assert!(matches!(
			client.register("  ", "EH6_100").await,
			Err(ShieldError::Validation(_))
		));
		assert_eq!(memory.request_count().await, 0);

		client.register("leith kitchen", "EH6_100").await.unwrap();
		client.register("leith kitchen", "EH6_100").await.unwrap();
		assert!(client.is_registered());
		assert_eq!(client.name(), Some("leith kitchen"));
		assert_eq!(client.postcode().unwrap().as_str(), "EH6_100");
	}

	#[tokio::test]
	async fn test_status_updates_advance_one_step() {
		let memory = MemoryGateway::new();
		let gateway = Arc::new(GatewayService::new(Box::new(memory.clone())));
		let order_id = place_order(&gateway, &memory).await;
		let mut client = CateringCompanyClient::new(gateway);

		assert!(matches!(
			client.update_order_status(order_id, RoleOrderStatus::Packed).await,
			Err(ShieldError::InvalidState(_))
		));

		client.register("leith kitchen", "EH6_100").await.unwrap();
		client
			.update_order_status(order_id, RoleOrderStatus::Packed)
			.await
			.unwrap();
		assert!(matches!(
			client.update_order_status(order_id, RoleOrderStatus::Delivered).await,
			Err(ShieldError::Gateway(GatewayError::Rejected(_)))
		));
		client
			.update_order_status(order_id, RoleOrderStatus::Dispatched)
			.await
			.unwrap();
		assert_eq!(memory.order_status(order_id).await, Some(OrderStatus::Dispatched));
	}
}
