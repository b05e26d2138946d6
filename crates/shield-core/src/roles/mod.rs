//! Catering company and supermarket clients.
//!
//! Both roles register a business under a name and postcode, then report
//! order progress to the service one call at a time.

use crate::ShieldError;
use shield_gateway::{Endpoint, GatewayError, GatewayService};
use shield_types::Postcode;

mod catering;
mod supermarket;

pub use catering::CateringCompanyClient;
pub use supermarket::SupermarketClient;

/// Registration tokens that mean the business is known to the service.
const REGISTERED_TOKENS: [&str; 2] = ["registered new", "already registered"];

/// A registered business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Business {
	pub name: String,
	pub postcode: Postcode,
}

/// Registers a business at `path`, validating the name and postcode first.
pub(crate) async fn register_business(
	gateway: &GatewayService,
	path: &'static str,
	name: &str,
	postcode: &str,
) -> Result<Business, ShieldError> {
	let name = name.trim();
	if name.is_empty() {
		return Err(ShieldError::Validation("Business name must not be empty".into()));
	}
	let postcode = Postcode::parse(postcode)?;

	let endpoint = Endpoint::new(path)
		.param("business_name", name)
		.param("postcode", postcode.as_str());
	let token = gateway.fetch(&endpoint).await?.into_token()?;
	if !REGISTERED_TOKENS.contains(&token.as_str()) {
		return Err(GatewayError::Rejected(token).into());
	}

	tracing::info!(business = %name, postcode = %postcode, outcome = %token, "Business registered");
	Ok(Business {
		name: name.to_string(),
		postcode,
	})
}

pub(crate) fn not_registered() -> ShieldError {
	ShieldError::InvalidState("Business is not registered".into())
}
