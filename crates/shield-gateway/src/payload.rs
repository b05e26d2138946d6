//! Classification of response bodies.
//!
//! The service does not tag its responses: acknowledgement endpoints answer
//! with plain text, lookups with a bare number and listings with a JSON
//! array. Each endpoint contract names the shape it expects through one of
//! the `into_*` conversions.

use crate::GatewayError;
use serde::de::DeserializeOwned;

/// Token returned by acknowledgement endpoints on success.
pub const ACK_TOKEN: &str = "True";

/// A classified response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	/// Plain text, with surrounding whitespace and JSON quotes removed.
	Token(String),
	/// A bare integer or decimal number, kept as sent.
	Number(String),
	/// A JSON array.
	List(Vec<serde_json::Value>),
}

impl Payload {
	pub fn classify(body: &str) -> Self {
		let trimmed = body.trim();

		if trimmed.starts_with('[') {
			if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
				return Payload::List(items);
			}
		}

		if trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
			return Payload::Number(trimmed.to_string());
		}

		let token = match serde_json::from_str::<String>(trimmed) {
			Ok(unquoted) => unquoted,
			Err(_) => trimmed.to_string(),
		};
		Payload::Token(token)
	}

	pub fn into_token(self) -> Result<String, GatewayError> {
		match self {
			Payload::Token(token) => Ok(token),
			other => Err(other.mismatch("token")),
		}
	}

	pub fn into_integer(self) -> Result<i64, GatewayError> {
		match self {
			Payload::Number(ref raw) => raw.parse().map_err(|_| self.mismatch("integer")),
			other => Err(other.mismatch("integer")),
		}
	}

	pub fn into_float(self) -> Result<f64, GatewayError> {
		match self {
			Payload::Number(ref raw) => raw.parse().map_err(|_| self.mismatch("number")),
			other => Err(other.mismatch("number")),
		}
	}

	/// Deserializes every element of a JSON array.
	pub fn into_list<T: DeserializeOwned>(self) -> Result<Vec<T>, GatewayError> {
		match self {
			Payload::List(items) => items
				.into_iter()
				.map(|item| {
					serde_json::from_value(item)
						.map_err(|e| GatewayError::UnexpectedPayload(format!("Bad list element: {}", e)))
				})
				.collect(),
			other => Err(other.mismatch("list")),
		}
	}

	/// Succeeds on the `True` token; any other token is a refusal.
	pub fn into_acknowledgement(self) -> Result<(), GatewayError> {
		match self.into_token()? {
			token if token == ACK_TOKEN => Ok(()),
			token => Err(GatewayError::Rejected(token)),
		}
	}

	fn mismatch(&self, expected: &str) -> GatewayError {
		let actual = match self {
			Payload::Token(token) => format!("token '{}'", token),
			Payload::Number(raw) => format!("number {}", raw),
			Payload::List(items) => format!("list of {} elements", items.len()),
		};
		GatewayError::UnexpectedPayload(format!("expected {}, got {}", expected, actual))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_classify_shapes() {
		assert_eq!(Payload::classify("True"), Payload::Token("True".to_string()));
		assert_eq!(
			Payload::classify("\"already registered\"\n"),
			Payload::Token("already registered".to_string())
		);
		assert_eq!(Payload::classify(" 12 "), Payload::Number("12".to_string()));
		assert_eq!(Payload::classify("-1"), Payload::Number("-1".to_string()));
		assert_eq!(Payload::classify("3.25"), Payload::Number("3.25".to_string()));
		assert!(matches!(Payload::classify("[\"a\", \"b\"]"), Payload::List(ref v) if v.len() == 2));
		assert_eq!(Payload::classify("[broken"), Payload::Token("[broken".to_string()));
		assert_eq!(Payload::classify("NaN"), Payload::Token("NaN".to_string()));
	}

	#[test]
	fn test_typed_conversions() {
		assert_eq!(Payload::classify("7").into_integer().unwrap(), 7);
		assert!(Payload::classify("7.5").into_integer().is_err());
		assert_eq!(Payload::classify("7.5").into_float().unwrap(), 7.5);
		assert!(Payload::classify("True").into_float().is_err());

		let names: Vec<String> = Payload::classify("[\"EH1 100\", \"Ada\"]").into_list().unwrap();
		assert_eq!(names, vec!["EH1 100", "Ada"]);
		assert!(Payload::classify("[1, 2]").into_list::<String>().is_err());
		assert!(Payload::classify("already registered").into_list::<String>().is_err());
	}

	#[test]
	fn test_acknowledgement() {
		assert!(Payload::classify("True").into_acknowledgement().is_ok());
		assert!(matches!(
			Payload::classify("False").into_acknowledgement(),
			Err(GatewayError::Rejected(ref t)) if t == "False"
		));
		assert!(matches!(
			Payload::classify("4").into_acknowledgement(),
			Err(GatewayError::UnexpectedPayload(_))
		));
	}
}
