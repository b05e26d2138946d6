//! Request path construction.

use crate::GatewayError;
use reqwest::Url;

/// Placeholder origin used only to borrow `Url`'s query encoding.
const PLACEHOLDER_ORIGIN: &str = "gateway://service";

/// A service path plus its query parameters, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	path: &'static str,
	query: Vec<(&'static str, String)>,
}

impl Endpoint {
	pub fn new(path: &'static str) -> Self {
		Self {
			path,
			query: Vec::new(),
		}
	}

	pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
		self.query.push((key, value.to_string()));
		self
	}

	/// Adds the parameter only when a value is present.
	pub fn param_opt(self, key: &'static str, value: Option<impl ToString>) -> Self {
		match value {
			Some(value) => self.param(key, value),
			None => self,
		}
	}

	pub fn path(&self) -> &'static str {
		self.path
	}

	/// Renders `/path?k=v&...` with form-encoded values. Empty values are kept
	/// (`dietaryPreference=`) because the service distinguishes them from
	/// absent keys.
	pub fn render(&self) -> Result<String, GatewayError> {
		let mut url = Url::parse(PLACEHOLDER_ORIGIN)
			.map_err(|e| GatewayError::InvalidPath(e.to_string()))?;
		url.set_path(self.path);

		if self.query.is_empty() {
			return Ok(url.path().to_string());
		}

		url.query_pairs_mut()
			.extend_pairs(self.query.iter().map(|(k, v)| (*k, v.as_str())));

		Ok(format!("{}?{}", url.path(), url.query().unwrap_or_default()))
	}
}
