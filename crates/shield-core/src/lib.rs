//! Order lifecycle manager for the shielding food-box client.
//!
//! The shielding individual's session owns three pieces of local state: the
//! catalogue fetched when the session connects, the single picked box that
//! is being prepared, and the ledger of orders placed so far. Lifecycle
//! operations move boxes from the catalogue into the ledger through the
//! remote gateway and keep ledger statuses in step with the service.
//!
//! The catering company and supermarket role clients live here as well; they
//! are thin wrappers over single gateway calls.

use shield_config::OrderingConfig;
use shield_gateway::GatewayError;
use shield_types::{IdentityError, QuantityError};
use thiserror::Error;

pub mod builder;
pub mod catalog;
pub mod individual;
pub mod ledger;
pub mod roles;
pub mod staging;

pub use builder::{BuilderError, ClientSet, ShieldBuilder};
pub use catalog::Catalog;
pub use individual::ShieldingIndividualClient;
pub use ledger::OrderLedger;
pub use roles::{CateringCompanyClient, SupermarketClient};
pub use staging::Staging;

/// Errors returned by client operations.
///
/// Every variant is a recoverable outcome of a single operation; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum ShieldError {
	/// Malformed input such as an ill-formed CHI or postcode.
	#[error("Validation error: {0}")]
	Validation(String),
	/// The operation is not allowed in the current lifecycle state.
	#[error("Invalid state: {0}")]
	InvalidState(String),
	/// Unknown order, item or food box.
	#[error("Not found: {0}")]
	NotFound(String),
	/// A quantity change that does not strictly decrease the stored value.
	#[error("Invalid quantity: {0}")]
	InvalidQuantity(String),
	/// Transport failure, refusal or unexpected response from the service.
	#[error("Gateway error: {0}")]
	Gateway(#[from] GatewayError),
}

impl From<IdentityError> for ShieldError {
	fn from(err: IdentityError) -> Self {
		ShieldError::Validation(err.to_string())
	}
}

impl From<QuantityError> for ShieldError {
	fn from(err: QuantityError) -> Self {
		match err {
			QuantityError::UnknownItem(_) => ShieldError::NotFound(err.to_string()),
			QuantityError::NotDecreased { .. } => ShieldError::InvalidQuantity(err.to_string()),
		}
	}
}

/// Ordering policy enforced when placing orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingRules {
	/// Rolling window in which at most one active order may exist.
	pub order_window: chrono::Duration,
}

impl Default for OrderingRules {
	fn default() -> Self {
		Self {
			order_window: chrono::Duration::days(7),
		}
	}
}

impl From<&OrderingConfig> for OrderingRules {
	fn from(config: &OrderingConfig) -> Self {
		Self {
			order_window: chrono::Duration::days(i64::from(config.order_window_days)),
		}
	}
}

/// Converts a caller supplied quantity, rejecting negative values.
pub(crate) fn checked_quantity(quantity: i64) -> Result<u32, ShieldError> {
	u32::try_from(quantity)
		.map_err(|_| ShieldError::InvalidQuantity(format!("Quantity {} is out of range", quantity)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_quantity_errors_map_to_kinds() {
		assert!(matches!(
			ShieldError::from(QuantityError::UnknownItem(9)),
			ShieldError::NotFound(_)
		));
		assert!(matches!(
			ShieldError::from(QuantityError::NotDecreased {
				item_id: 1,
				requested: 2,
				current: 2
			}),
			ShieldError::InvalidQuantity(_)
		));
	}

	#[test]
	fn test_checked_quantity() {
		assert_eq!(checked_quantity(0).unwrap(), 0);
		assert!(matches!(checked_quantity(-1), Err(ShieldError::InvalidQuantity(_))));
		assert!(checked_quantity(i64::from(u32::MAX) + 1).is_err());
	}

	#[test]
	fn test_rules_from_config() {
		let rules = OrderingRules::from(&OrderingConfig {
			order_window_days: 14,
		});
		assert_eq!(rules.order_window, chrono::Duration::days(14));
		assert_eq!(OrderingRules::default().order_window, chrono::Duration::days(7));
	}
}
