//! Order ledger.
//!
//! The local record of every order the individual has placed. Entries are
//! never removed; only their status and contents change.

use crate::ShieldError;
use chrono::{DateTime, Duration, Utc};
use shield_types::{Order, OrderId, OrderStatus};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
	orders: HashMap<OrderId, Order>,
	/// Order ids in placement order.
	placement: Vec<OrderId>,
}

impl OrderLedger {
	/// Records a newly placed order. Ids are never reused, so an id already
	/// present is refused and the recorded order is left untouched.
	pub fn insert(&mut self, order: Order) -> Result<(), ShieldError> {
		if self.orders.contains_key(&order.id) {
			return Err(ShieldError::InvalidState(format!(
				"Order {} is already recorded",
				order.id
			)));
		}
		self.placement.push(order.id);
		self.orders.insert(order.id, order);
		Ok(())
	}

	pub fn contains(&self, order_id: OrderId) -> bool {
		self.orders.contains_key(&order_id)
	}

	pub fn get(&self, order_id: OrderId) -> Result<&Order, ShieldError> {
		self.orders.get(&order_id).ok_or_else(|| unknown_order(order_id))
	}

	pub fn get_mut(&mut self, order_id: OrderId) -> Result<&mut Order, ShieldError> {
		self.orders
			.get_mut(&order_id)
			.ok_or_else(|| unknown_order(order_id))
	}

	pub fn set_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<(), ShieldError> {
		self.get_mut(order_id)?.status = status;
		Ok(())
	}

	/// Order ids in the order they were placed.
	pub fn order_ids(&self) -> &[OrderId] {
		&self.placement
	}

	pub fn len(&self) -> usize {
		self.placement.len()
	}

	pub fn is_empty(&self) -> bool {
		self.placement.is_empty()
	}

	/// Finds an active order placed within `window` before `now`.
	///
	/// An order placed exactly `window` ago still counts.
	pub fn active_order_within(&self, now: DateTime<Utc>, window: Duration) -> Option<&Order> {
		let since = now - window;
		self.placement
			.iter()
			.filter_map(|id| self.orders.get(id))
			.find(|order| order.is_active() && order.placed_at >= since)
	}
}

fn unknown_order(order_id: OrderId) -> ShieldError {
	ShieldError::NotFound(format!("Order {} is not in the ledger", order_id))
}
