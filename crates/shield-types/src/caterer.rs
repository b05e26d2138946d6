//! Catering company listing entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed caterer entry '{0}', expected 'position,name,postcode'")]
pub struct CatererEntryError(pub String);

/// One entry of the `/getCaterers` listing.
///
/// The service encodes each caterer as `"position,name,postcode"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatererEntry {
	pub position: String,
	pub name: String,
	pub postcode: String,
}

impl CatererEntry {
	pub fn parse(raw: &str) -> Result<Self, CatererEntryError> {
		let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
		match parts.as_slice() {
			[position, name, postcode] if !name.is_empty() => Ok(Self {
				position: position.to_string(),
				name: name.to_string(),
				postcode: postcode.to_string(),
			}),
			_ => Err(CatererEntryError(raw.to_string())),
		}
	}

	/// Encodes the entry the way the service lists it.
	pub fn to_listing(&self) -> String {
		format!("{},{},{}", self.position, self.name, self.postcode)
	}
}
