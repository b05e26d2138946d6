//! Picked-box staging area.

use crate::ShieldError;
use shield_types::FoodBox;

/// Holds at most one food box picked for the next order.
///
/// The staged box is an owned copy, so reducing its quantities never touches
/// the catalogue entry it came from.
#[derive(Debug, Clone, Default)]
pub struct Staging {
	picked: Option<FoodBox>,
}

impl Staging {
	/// Stages a box, discarding whatever was staged before.
	pub fn pick(&mut self, food_box: FoodBox) {
		self.picked = Some(food_box);
	}

	/// Lowers the quantity of an item in the staged box.
	pub fn set_quantity(&mut self, item_id: u32, quantity: u32) -> Result<(), ShieldError> {
		let picked = self
			.picked
			.as_mut()
			.ok_or_else(|| ShieldError::InvalidState("No food box has been picked".into()))?;
		picked.reduce_quantity(item_id, quantity)?;
		Ok(())
	}

	pub fn picked(&self) -> Option<&FoodBox> {
		self.picked.as_ref()
	}

	/// Removes and returns the staged box.
	pub fn take(&mut self) -> Option<FoodBox> {
		self.picked.take()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use shield_types::LineItem;

	fn food_box(id: &str, quantity: u32) -> FoodBox {
		FoodBox {
			id: id.to_string(),
			name: format!("box {}", id),
			diet: "none".to_string(),
			delivered_by: "catering".to_string(),
			contents: vec![LineItem {
				id: 1,
				name: "apples".to_string(),
				quantity,
			}],
		}
	}

	#[test]
	fn test_pick_replaces_previous_box() {
		let mut staging = Staging::default();
		staging.pick(food_box("1", 3));
		staging.set_quantity(1, 1).unwrap();
		staging.pick(food_box("2", 3));

		let picked = staging.picked().unwrap();
		assert_eq!(picked.id, "2");
		assert_eq!(picked.item(1).unwrap().quantity, 3);
	}

	#[test]
	fn test_set_quantity_rules() {
		let mut staging = Staging::default();
		assert!(matches!(
			staging.set_quantity(1, 0),
			Err(ShieldError::InvalidState(_))
		));

		staging.pick(food_box("1", 2));
		assert!(matches!(
			staging.set_quantity(1, 2),
			Err(ShieldError::InvalidQuantity(_))
		));
		assert!(matches!(
			staging.set_quantity(7, 0),
			Err(ShieldError::NotFound(_))
		));
		staging.set_quantity(1, 0).unwrap();
		assert_eq!(staging.picked().unwrap().item(1).unwrap().quantity, 0);
	}

	#[test]
	fn test_take_clears() {
		let mut staging = Staging::default();
		staging.pick(food_box("1", 1));
		assert!(staging.take().is_some());
		assert!(staging.picked().is_none());
		assert!(staging.take().is_none());
	}
}
