//! Catalog cache.
//!
//! Holds the food boxes fetched once when a session connects. Boxes are
//! addressed by their 1-based position in that fetch, so numbering is only
//! stable within the cached list.

use crate::ShieldError;
use shield_gateway::{Endpoint, GatewayService};
use shield_types::FoodBox;

/// Only catering delivery is offered to shielding individuals.
const ORDER_OPTION: &str = "catering";

/// Read-only list of food boxes.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	boxes: Vec<FoodBox>,
}

impl Catalog {
	pub fn new(boxes: Vec<FoodBox>) -> Self {
		Self { boxes }
	}

	/// Queries the service for boxes matching a dietary preference. An empty
	/// preference returns every box.
	pub async fn fetch(
		gateway: &GatewayService,
		dietary_preference: &str,
	) -> Result<Vec<FoodBox>, ShieldError> {
		let endpoint = Endpoint::new("/showFoodBox")
			.param("orderOption", ORDER_OPTION)
			.param("dietaryPreference", dietary_preference);
		Ok(gateway.fetch(&endpoint).await?.into_list()?)
	}

	pub fn len(&self) -> usize {
		self.boxes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.boxes.is_empty()
	}

	/// Looks up a box by its 1-based position.
	pub fn get(&self, position: usize) -> Result<&FoodBox, ShieldError> {
		position
			.checked_sub(1)
			.and_then(|index| self.boxes.get(index))
			.ok_or_else(|| ShieldError::NotFound(format!("Food box {} does not exist", position)))
	}

	pub fn boxes(&self) -> &[FoodBox] {
		&self.boxes
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use shield_gateway::implementations::memory::MemoryGateway;

	#[tokio::test]
	async fn test_positions_are_one_based() {
		let gateway = GatewayService::new(Box::new(MemoryGateway::new()));
		let catalog = Catalog::new(Catalog::fetch(&gateway, "").await.unwrap());

		assert_eq!(catalog.len(), 5);
		assert_eq!(catalog.get(1).unwrap().id, "1");
		assert_eq!(catalog.get(5).unwrap().id, "5");
		assert!(matches!(catalog.get(0), Err(ShieldError::NotFound(_))));
		assert!(matches!(catalog.get(6), Err(ShieldError::NotFound(_))));
	}

	#[tokio::test]
	async fn test_unmatched_preference_is_empty() {
		let gateway = GatewayService::new(Box::new(MemoryGateway::new()));
		let boxes = Catalog::fetch(&gateway, "keto").await.unwrap();
		assert!(boxes.is_empty());
		assert!(Catalog::new(boxes).is_empty());
	}
}
