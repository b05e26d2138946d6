//! Identity values exchanged with the remote service.
//!
//! Both types are validated on construction so that malformed values are
//! rejected locally, before anything is sent to the gateway.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Required length of a CHI number.
pub const CHI_LENGTH: usize = 10;

/// Prefix every postcode handled by the service carries.
pub const POSTCODE_PREFIX: &str = "EH";

/// Errors raised when parsing identity values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
	#[error("CHI must be {CHI_LENGTH} digits long, got {0} characters")]
	ChiLength(usize),
	#[error("CHI must contain only digits")]
	ChiNotNumeric,
	#[error("CHI must start with a ddMMyy birth date, got '{0}'")]
	ChiBirthDate(String),
	#[error("Postcode '{0}' must start with EH and separate district and remainder with '_'")]
	Postcode(String),
}

/// Community Health Index number of a shielding individual.
///
/// Ten digits, the first six being the holder's birth date as `ddMMyy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Chi(String);

impl Chi {
	pub fn parse(value: &str) -> Result<Self, IdentityError> {
		let length = value.chars().count();
		if length != CHI_LENGTH {
			return Err(IdentityError::ChiLength(length));
		}
		if !value.bytes().all(|b| b.is_ascii_digit()) {
			return Err(IdentityError::ChiNotNumeric);
		}

		let date = &value[..6];
		NaiveDate::parse_from_str(date, "%d%m%y")
			.map_err(|_| IdentityError::ChiBirthDate(date.to_string()))?;

		Ok(Self(value.to_string()))
	}

	/// Birth date encoded in the first six digits.
	pub fn birth_date(&self) -> Option<NaiveDate> {
		NaiveDate::parse_from_str(&self.0[..6], "%d%m%y").ok()
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl TryFrom<String> for Chi {
	type Error = IdentityError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Chi::parse(&value)
	}
}

impl From<Chi> for String {
	fn from(chi: Chi) -> Self {
		chi.0
	}
}

impl fmt::Display for Chi {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Postcode in the service's token form, e.g. `EH11_2DR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Postcode(String);

impl Postcode {
	/// Accepts values matching `^EH.*_.*`.
	pub fn parse(value: &str) -> Result<Self, IdentityError> {
		match value.strip_prefix(POSTCODE_PREFIX) {
			Some(rest) if rest.contains('_') => Ok(Self(value.to_string())),
			_ => Err(IdentityError::Postcode(value.to_string())),
		}
	}

	/// Parses a postcode as stored by the registry, where district and
	/// remainder are separated by a space (`EH1 100`).
	pub fn from_registry(value: &str) -> Result<Self, IdentityError> {
		Self::parse(&value.trim().replace(' ', "_"))
	}

	/// District digits between the prefix and the separator, if numeric.
	pub fn district(&self) -> Option<u32> {
		let rest = &self.0[POSTCODE_PREFIX.len()..];
		rest.split('_').next().and_then(|d| d.parse().ok())
	}

	/// Everything after the first separator.
	pub fn remainder(&self) -> &str {
		self.0.split_once('_').map(|(_, r)| r).unwrap_or_default()
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl TryFrom<String> for Postcode {
	type Error = IdentityError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Postcode::parse(&value)
	}
}

impl From<Postcode> for String {
	fn from(postcode: Postcode) -> Self {
		postcode.0
	}
}

impl fmt::Display for Postcode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_valid_chi() {
		let chi = Chi::parse("0101801234").unwrap();
		assert_eq!(chi.as_str(), "0101801234");
		assert_eq!(chi.birth_date(), NaiveDate::from_ymd_opt(1980, 1, 1));
	}

	#[test]
	fn test_invalid_chi() {
		assert_eq!(Chi::parse("010180"), Err(IdentityError::ChiLength(6)));
		assert_eq!(Chi::parse("010180abcd"), Err(IdentityError::ChiNotNumeric));
		assert_eq!(
			Chi::parse("0000001234"),
			Err(IdentityError::ChiBirthDate("000000".to_string()))
		);
		assert!(Chi::parse("3102801234").is_err());
	}

	#[test]
	fn test_postcode_format() {
		let postcode = Postcode::parse("EH11_2DR").unwrap();
		assert_eq!(postcode.district(), Some(11));
		assert_eq!(postcode.remainder(), "2DR");

		assert!(Postcode::parse("EH_").is_ok());
		assert!(Postcode::parse("1_100").is_err());
		assert!(Postcode::parse("EH1100").is_err());
		assert!(Postcode::parse("eh1_100").is_err());
		assert!(Postcode::parse("G1_100").is_err());
	}

	#[test]
	fn test_postcode_from_registry() {
		let postcode = Postcode::from_registry("EH1 100").unwrap();
		assert_eq!(postcode.as_str(), "EH1_100");
		assert!(Postcode::from_registry("G2 300").is_err());
	}

	#[test]
	fn test_serde_validates() {
		assert!(serde_json::from_str::<Chi>("\"0101801234\"").is_ok());
		assert!(serde_json::from_str::<Chi>("\"12\"").is_err());
		assert!(serde_json::from_str::<Postcode>("\"EH2_200\"").is_ok());
		assert!(serde_json::from_str::<Postcode>("\"2_200\"").is_err());
	}
}
