//! Validation of TOML blocks configuring gateway implementations.
//!
//! Each implementation describes the fields it understands with a [`Schema`];
//! the schema is checked before the implementation is constructed so that a
//! typo in the configuration fails at startup instead of on the first request.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: &'static str,
		actual: String,
	},
}

/// Expected type of a configuration field.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
	String,
	/// Integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// String holding an absolute `http://` or `https://` URL.
	HttpUrl,
}

/// A named field of a [`Schema`].
#[derive(Debug, Clone)]
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
		}
	}
}

/// Required and optional fields accepted by one implementation.
#[derive(Debug, Clone, Default)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Checks that required fields exist and that every present field has the
	/// declared type. Unknown keys are ignored.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table",
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			check_field(&field.name, value, field.field_type)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				check_field(&field.name, value, field.field_type)?;
			}
		}

		Ok(())
	}
}

fn check_field(name: &str, value: &toml::Value, field_type: FieldType) -> Result<(), ValidationError> {
	let mismatch = |expected: &'static str| ValidationError::TypeMismatch {
		field: name.to_string(),
		expected,
		actual: value.type_str().to_string(),
	};

	match field_type {
		FieldType::String => {
			value.as_str().ok_or_else(|| mismatch("string"))?;
		},
		FieldType::Integer { min, max } => {
			let int_val = value.as_integer().ok_or_else(|| mismatch("integer"))?;
			if let Some(min) = min.filter(|min| int_val < *min) {
				return Err(ValidationError::InvalidValue {
					field: name.to_string(),
					message: format!("Value {} is less than minimum {}", int_val, min),
				});
			}
			if let Some(max) = max.filter(|max| int_val > *max) {
				return Err(ValidationError::InvalidValue {
					field: name.to_string(),
					message: format!("Value {} is greater than maximum {}", int_val, max),
				});
			}
		},
		FieldType::HttpUrl => {
			let url = value.as_str().ok_or_else(|| mismatch("string"))?;
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(ValidationError::InvalidValue {
					field: name.to_string(),
					message: format!("'{}' is not an http(s) URL", url),
				});
			}
		},
	}

	Ok(())
}

/// Implemented by anything that can validate its own configuration block.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn http_schema() -> Schema {
		Schema::new(
			vec![Field::new("endpoint", FieldType::HttpUrl)],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		)
	}

	#[test]
	fn test_valid_config() {
		let config: toml::Value = toml::from_str(
			r#"
endpoint = "http://localhost:5000"
timeout_seconds = 10
"#,
		)
		.unwrap();
		assert!(http_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let config: toml::Value = toml::from_str("timeout_seconds = 10").unwrap();
		let err = http_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(ref f) if f == "endpoint"));
	}

	#[test]
	fn test_out_of_bounds_and_bad_url() {
		let config: toml::Value = toml::from_str(
			r#"
endpoint = "http://localhost:5000"
timeout_seconds = 0
"#,
		)
		.unwrap();
		assert!(matches!(
			http_schema().validate(&config),
			Err(ValidationError::InvalidValue { .. })
		));

		let config: toml::Value = toml::from_str(r#"endpoint = "localhost:5000""#).unwrap();
		assert!(http_schema().validate(&config).is_err());

		let config: toml::Value = toml::from_str("endpoint = 5000").unwrap();
		assert!(matches!(
			http_schema().validate(&config),
			Err(ValidationError::TypeMismatch { .. })
		));
	}
}
