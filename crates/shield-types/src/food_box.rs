//! Food box types.
//!
//! A food box is a named bundle of line items offered for ordering. The same
//! structure is used for the catalogue entries, the staged pick and the
//! snapshot held by each order, always as independent copies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when changing the quantity of a line item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
	/// The item id is not part of the box.
	#[error("Item {0} is not in the box")]
	UnknownItem(u32),
	/// Quantities may only ever go down.
	#[error("Quantity of item {item_id} can only decrease (requested {requested}, current {current})")]
	NotDecreased {
		item_id: u32,
		requested: u32,
		current: u32,
	},
}

/// A single item inside a food box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
	pub id: u32,
	pub name: String,
	pub quantity: u32,
}

/// A food box as listed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodBox {
	/// Identifier as sent by the service (a decimal string).
	pub id: String,
	/// Display name of the box.
	#[serde(default)]
	pub name: String,
	/// Dietary tag, e.g. "none", "pollotarian" or "vegan".
	pub diet: String,
	/// Party responsible for delivering the box.
	#[serde(default)]
	pub delivered_by: String,
	/// Line items in listing order.
	pub contents: Vec<LineItem>,
}

impl FoodBox {
	/// Item ids in listing order.
	pub fn item_ids(&self) -> Vec<u32> {
		self.contents.iter().map(|item| item.id).collect()
	}

	/// Number of distinct items (not the sum of quantities).
	pub fn item_count(&self) -> usize {
		self.contents.len()
	}

	pub fn item(&self, item_id: u32) -> Option<&LineItem> {
		self.contents.iter().find(|item| item.id == item_id)
	}

	pub fn item_mut(&mut self, item_id: u32) -> Option<&mut LineItem> {
		self.contents.iter_mut().find(|item| item.id == item_id)
	}

	/// Lowers the quantity of one item.
	///
	/// The new quantity must be strictly below the currently stored one, so
	/// setting the same value twice fails the second time.
	pub fn reduce_quantity(&mut self, item_id: u32, quantity: u32) -> Result<(), QuantityError> {
		let item = self
			.item_mut(item_id)
			.ok_or(QuantityError::UnknownItem(item_id))?;

		if quantity >= item.quantity {
			return Err(QuantityError::NotDecreased {
				item_id,
				requested: quantity,
				current: item.quantity,
			});
		}

		item.quantity = quantity;
		Ok(())
	}

	/// Copies the line items into a submission body.
	pub fn to_contents(&self) -> OrderContents {
		OrderContents {
			contents: self.contents.clone(),
		}
	}
}

/// Body submitted when placing or editing an order.
///
/// Serializes as `{"contents": [{"id": 1, "name": "...", "quantity": 2}, ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderContents {
	pub contents: Vec<LineItem>,
}
