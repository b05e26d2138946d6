//! Order types for the shielding client.
//!
//! Orders are created locally after the remote service acknowledges a
//! placement and are refreshed on demand from the numeric status codes the
//! service reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::FoodBox;

/// Identifier assigned by the remote service when an order is placed.
pub type OrderId = u32;

/// Lifecycle status of an order.
///
/// Transitions are driven by the remote service:
/// `Placed -> Packed -> Dispatched -> Delivered`, with `Cancelled` reachable
/// from `Placed` or `Packed` and `NotFound` whenever the service no longer
/// knows the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
	Placed,
	Packed,
	Dispatched,
	Delivered,
	Cancelled,
	NotFound,
}

impl OrderStatus {
	/// Maps the numeric status code reported by `/requestStatus`.
	pub fn from_code(code: i64) -> Option<Self> {
		match code {
			0 => Some(OrderStatus::Placed),
			1 => Some(OrderStatus::Packed),
			2 => Some(OrderStatus::Dispatched),
			3 => Some(OrderStatus::Delivered),
			4 => Some(OrderStatus::Cancelled),
			-1 => Some(OrderStatus::NotFound),
			_ => None,
		}
	}

	/// Inverse of [`OrderStatus::from_code`].
	pub fn code(&self) -> i64 {
		match self {
			OrderStatus::Placed => 0,
			OrderStatus::Packed => 1,
			OrderStatus::Dispatched => 2,
			OrderStatus::Delivered => 3,
			OrderStatus::Cancelled => 4,
			OrderStatus::NotFound => -1,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Placed => "placed",
			OrderStatus::Packed => "packed",
			OrderStatus::Dispatched => "dispatched",
			OrderStatus::Delivered => "delivered",
			OrderStatus::Cancelled => "cancelled",
			OrderStatus::NotFound => "not-found",
		}
	}

	/// Delivered, cancelled and not-found orders never change again.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::NotFound
		)
	}

	/// Contents may only be amended before packing starts.
	pub fn is_editable(&self) -> bool {
		matches!(self, OrderStatus::Placed)
	}

	/// Cancellation is accepted until the order leaves the caterer.
	pub fn is_cancellable(&self) -> bool {
		matches!(self, OrderStatus::Placed | OrderStatus::Packed)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Status values a catering company or supermarket may push for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleOrderStatus {
	Packed,
	Dispatched,
	Delivered,
}

impl RoleOrderStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			RoleOrderStatus::Packed => "packed",
			RoleOrderStatus::Dispatched => "dispatched",
			RoleOrderStatus::Delivered => "delivered",
		}
	}

	/// Parses the `newStatus` query value used by the update endpoints.
	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"packed" => Some(RoleOrderStatus::Packed),
			"dispatched" => Some(RoleOrderStatus::Dispatched),
			"delivered" => Some(RoleOrderStatus::Delivered),
			_ => None,
		}
	}
}

impl From<RoleOrderStatus> for OrderStatus {
	fn from(status: RoleOrderStatus) -> Self {
		match status {
			RoleOrderStatus::Packed => OrderStatus::Packed,
			RoleOrderStatus::Dispatched => OrderStatus::Dispatched,
			RoleOrderStatus::Delivered => OrderStatus::Delivered,
		}
	}
}

impl fmt::Display for RoleOrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An order placed by a shielding individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	pub id: OrderId,
	/// Status as of the last explicit refresh.
	pub status: OrderStatus,
	/// Independent snapshot of the box committed with the order; edited in
	/// place before an amendment is pushed.
	pub food_box: FoodBox,
	pub placed_at: DateTime<Utc>,
}

impl Order {
	pub fn new(id: OrderId, food_box: FoodBox, placed_at: DateTime<Utc>) -> Self {
		Self {
			id,
			status: OrderStatus::Placed,
			food_box,
			placed_at,
		}
	}

	/// Cancelled orders no longer count towards the weekly allowance.
	pub fn is_active(&self) -> bool {
		self.status != OrderStatus::Cancelled
	}
}
