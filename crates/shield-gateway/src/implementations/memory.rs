//! In-process simulation of the remote ordering service.
//!
//! Implements every endpoint the clients use against in-memory tables so the
//! lifecycle can be exercised without a running server. Responses use the
//! same text shapes the real service sends. Nothing survives the process.

use crate::payload::ACK_TOKEN;
use crate::{GatewayError, GatewayFactory, GatewayInterface, GatewayRegistry};
use async_trait::async_trait;
use reqwest::Url;
use shield_types::{
	ConfigSchema, Field, FieldType, FoodBox, ImplementationRegistry, LineItem, OrderContents,
	OrderId, OrderStatus, Postcode, RoleOrderStatus, Schema, ValidationError,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

const REGISTERED_NEW: &str = "registered new";
const ALREADY_REGISTERED: &str = "already registered";

/// Catalogue served when no `catalog_file` is configured.
fn default_catalog() -> Vec<FoodBox> {
	vec![
		catalog_box("1", "box a", "none", &[(1, "cucumbers", 1), (2, "tomatoes", 2), (6, "pork", 1)]),
		catalog_box(
			"2",
			"box b",
			"pollotarian",
			&[(1, "cucumbers", 2), (3, "onions", 1), (4, "carrots", 2), (7, "chicken", 2)],
		),
		catalog_box("3", "box c", "none", &[(3, "onions", 1), (4, "carrots", 1), (8, "bacon", 1)]),
		catalog_box("4", "box d", "vegan", &[(9, "oranges", 1), (11, "cabbage", 1), (12, "beans", 1)]),
		catalog_box("5", "box e", "none", &[(9, "oranges", 1), (10, "apples", 1), (13, "avocado", 1)]),
	]
}

fn catalog_box(id: &str, name: &str, diet: &str, items: &[(u32, &str, u32)]) -> FoodBox {
	FoodBox {
		id: id.to_string(),
		name: name.to_string(),
		diet: diet.to_string(),
		delivered_by: "catering".to_string(),
		contents: items
			.iter()
			.map(|(id, name, quantity)| LineItem {
				id: *id,
				name: name.to_string(),
				quantity: *quantity,
			})
			.collect(),
	}
}

#[derive(Debug, Clone)]
struct StoredOrder {
	individual: String,
	caterer: Option<(String, String)>,
	contents: Vec<LineItem>,
	status: OrderStatus,
}

#[derive(Debug, Default)]
struct ServiceState {
	catalog: Vec<FoodBox>,
	/// CHI to registry postcode (space separated, as the registry stores it).
	individuals: HashMap<String, String>,
	/// Registration order matters for the caterer listing.
	caterers: Vec<(String, String)>,
	supermarkets: HashSet<(String, String)>,
	orders: BTreeMap<OrderId, StoredOrder>,
	supermarket_orders: HashMap<u32, OrderStatus>,
	next_order_id: OrderId,
	requests: usize,
}

/// Simulated ordering service.
///
/// Cloning shares the underlying tables, so several role clients can talk to
/// the same simulated service.
#[derive(Clone)]
pub struct MemoryGateway {
	state: Arc<RwLock<ServiceState>>,
}

impl MemoryGateway {
	/// Creates a service offering the default catalogue.
	pub fn new() -> Self {
		Self::with_catalog(default_catalog())
	}

	pub fn with_catalog(catalog: Vec<FoodBox>) -> Self {
		Self {
			state: Arc::new(RwLock::new(ServiceState {
				catalog,
				next_order_id: 1,
				..Default::default()
			})),
		}
	}

	/// Registers an individual with a known registry postcode (e.g. `EH1 100`).
	pub async fn add_individual(&self, chi: &str, postcode: &str) {
		let mut state = self.state.write().await;
		state.individuals.insert(chi.to_string(), postcode.to_string());
	}

	/// Registers a catering company directly.
	pub async fn add_caterer(&self, name: &str, postcode: &str) {
		let mut state = self.state.write().await;
		let entry = (name.to_string(), postcode.to_string());
		if !state.caterers.contains(&entry) {
			state.caterers.push(entry);
		}
	}

	/// Forces an order into any status, bypassing transition rules.
	pub async fn set_order_status(&self, order_id: OrderId, status: OrderStatus) {
		let mut state = self.state.write().await;
		if let Some(order) = state.orders.get_mut(&order_id) {
			order.status = status;
		}
	}

	pub async fn order_status(&self, order_id: OrderId) -> Option<OrderStatus> {
		self.state.read().await.orders.get(&order_id).map(|o| o.status)
	}

	pub async fn order_contents(&self, order_id: OrderId) -> Option<Vec<LineItem>> {
		self.state
			.read()
			.await
			.orders
			.get(&order_id)
			.map(|o| o.contents.clone())
	}

	/// Catering company recorded for an order at placement.
	pub async fn order_caterer(&self, order_id: OrderId) -> Option<(String, String)> {
		self.state
			.read()
			.await
			.orders
			.get(&order_id)
			.and_then(|o| o.caterer.clone())
	}

	/// Individual an order was placed for.
	pub async fn order_individual(&self, order_id: OrderId) -> Option<String> {
		self.state
			.read()
			.await
			.orders
			.get(&order_id)
			.map(|o| o.individual.clone())
	}

	/// Number of requests served so far.
	pub async fn request_count(&self) -> usize {
		self.state.read().await.requests
	}

	async fn handle(&self, path: &str, body: Option<&str>) -> Result<String, GatewayError> {
		let url = Url::parse(&format!("memory://service{}", path))
			.map_err(|e| GatewayError::InvalidPath(format!("{}: {}", path, e)))?;
		let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

		let mut state = self.state.write().await;
		state.requests += 1;

		match (url.path(), body) {
			("/showFoodBox", None) => {
				let preference = param(&query, "dietaryPreference")?;
				let boxes: Vec<&FoodBox> = state
					.catalog
					.iter()
					.filter(|b| preference.is_empty() || b.diet == preference)
					.collect();
				encode_json(&boxes)
			},
			("/registerShieldingIndividual", None) => {
				let chi = param(&query, "CHI")?;
				if state.individuals.contains_key(chi) {
					return Ok(ALREADY_REGISTERED.to_string());
				}
				let postcode = registry_postcode(chi);
				state.individuals.insert(chi.to_string(), postcode.clone());
				encode_json(&[postcode, "Shielded".to_string(), "Individual".to_string(), format!("07{}", chi)])
			},
			("/placeOrder", Some(body)) => {
				let individual = param(&query, "individual_id")?;
				if !state.individuals.contains_key(individual) {
					return Err(bad_request(format!("individual {} is not registered", individual)));
				}
				let contents = decode_contents(body)?;
				let caterer = match (
					query.get("catering_business_name"),
					query.get("catering_postcode"),
				) {
					(Some(name), Some(postcode)) => Some((name.clone(), postcode.clone())),
					_ => None,
				};

				let order_id = state.next_order_id;
				state.next_order_id += 1;
				state.orders.insert(
					order_id,
					StoredOrder {
						individual: individual.to_string(),
						caterer,
						contents,
						status: OrderStatus::Placed,
					},
				);
				Ok(order_id.to_string())
			},
			("/editOrder", Some(body)) => {
				let order_id = parse_order_id(param(&query, "order_id")?)?;
				let contents = decode_contents(body)?;
				let accepted = match state.orders.get_mut(&order_id) {
					Some(order) if order.status == OrderStatus::Placed && only_reduces(&order.contents, &contents) => {
						order.contents = contents;
						true
					},
					_ => false,
				};
				Ok(ack_token(accepted))
			},
			("/cancelOrder", None) => {
				let order_id = parse_order_id(param(&query, "order_id")?)?;
				let accepted = match state.orders.get_mut(&order_id) {
					Some(order) if order.status.is_cancellable() => {
						order.status = OrderStatus::Cancelled;
						true
					},
					_ => false,
				};
				Ok(ack_token(accepted))
			},
			("/requestStatus", None) => {
				let code = parse_order_id(param(&query, "order_id")?)
					.ok()
					.and_then(|id| state.orders.get(&id))
					.map_or(OrderStatus::NotFound.code(), |o| o.status.code());
				Ok(code.to_string())
			},
			("/getCaterers", None) => {
				let listing: Vec<String> = state
					.caterers
					.iter()
					.enumerate()
					.map(|(i, (name, postcode))| format!("{},{},{}", i, name, postcode))
					.collect();
				encode_json(&listing)
			},
			("/distance", None) => {
				let from = Postcode::parse(param(&query, "postcode1")?).map_err(|e| bad_request(e.to_string()))?;
				let to = Postcode::parse(param(&query, "postcode2")?).map_err(|e| bad_request(e.to_string()))?;
				Ok(distance_between(&from, &to).to_string())
			},
			("/registerCateringCompany", None) => {
				let entry = (param(&query, "business_name")?.to_string(), param(&query, "postcode")?.to_string());
				if state.caterers.contains(&entry) {
					return Ok(ALREADY_REGISTERED.to_string());
				}
				state.caterers.push(entry);
				Ok(REGISTERED_NEW.to_string())
			},
			("/updateOrderStatus", None) => {
				let order_id = parse_order_id(param(&query, "order_id")?)?;
				let accepted = match (
					state.orders.get_mut(&order_id),
					RoleOrderStatus::parse(param(&query, "newStatus")?),
				) {
					(Some(order), Some(next)) => advance(&mut order.status, next),
					_ => false,
				};
				Ok(ack_token(accepted))
			},
			("/registerSupermarket", None) => {
				let entry = (param(&query, "business_name")?.to_string(), param(&query, "postcode")?.to_string());
				if state.supermarkets.insert(entry) {
					Ok(REGISTERED_NEW.to_string())
				} else {
					Ok(ALREADY_REGISTERED.to_string())
				}
			},
			("/recordSupermarketOrder", None) => {
				let individual = param(&query, "individual_id")?;
				let order_number = parse_order_id(param(&query, "order_number")?)?;
				let supermarket = (
					param(&query, "supermarket_business_name")?.to_string(),
					param(&query, "supermarket_postcode")?.to_string(),
				);
				let accepted = state.individuals.contains_key(individual)
					&& state.supermarkets.contains(&supermarket)
					&& !state.supermarket_orders.contains_key(&order_number);
				if accepted {
					state.supermarket_orders.insert(order_number, OrderStatus::Placed);
				}
				Ok(ack_token(accepted))
			},
			("/updateSupermarketOrderStatus", None) => {
				let order_id = parse_order_id(param(&query, "order_id")?)?;
				let accepted = match (
					state.supermarket_orders.get_mut(&order_id),
					RoleOrderStatus::parse(param(&query, "newStatus")?),
				) {
					(Some(status), Some(next)) => advance(status, next),
					_ => false,
				};
				Ok(ack_token(accepted))
			},
			(path, _) => Err(GatewayError::Status {
				status: 404,
				body: format!("no route for {}", path),
			}),
		}
	}
}

impl Default for MemoryGateway {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl GatewayInterface for MemoryGateway {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryGatewaySchema)
	}

	async fn fetch(&self, path: &str) -> Result<String, GatewayError> {
		self.handle(path, None).await
	}

	async fn submit(&self, path: &str, body: &str) -> Result<String, GatewayError> {
		self.handle(path, Some(body)).await
	}
}

fn bad_request(message: String) -> GatewayError {
	GatewayError::Status {
		status: 400,
		body: message,
	}
}

fn param<'a>(query: &'a HashMap<String, String>, key: &str) -> Result<&'a str, GatewayError> {
	query
		.get(key)
		.map(String::as_str)
		.ok_or_else(|| bad_request(format!("missing parameter '{}'", key)))
}

/// Acknowledgement token for an accepted or refused request.
fn ack_token(accepted: bool) -> String {
	let token = if accepted { ACK_TOKEN } else { "False" };
	token.to_string()
}

fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, GatewayError> {
	serde_json::to_string(value).map_err(|e| GatewayError::Network(format!("encode failed: {}", e)))
}

fn decode_contents(body: &str) -> Result<Vec<LineItem>, GatewayError> {
	serde_json::from_str::<OrderContents>(body)
		.map(|c| c.contents)
		.map_err(|e| bad_request(format!("malformed contents: {}", e)))
}

fn parse_order_id(raw: &str) -> Result<OrderId, GatewayError> {
	raw.parse()
		.map_err(|_| bad_request(format!("invalid order id '{}'", raw)))
}

/// Edits must keep the same items and never raise a quantity.
fn only_reduces(current: &[LineItem], proposed: &[LineItem]) -> bool {
	current.len() == proposed.len()
		&& current.iter().zip(proposed).all(|(old, new)| {
			old.id == new.id && new.quantity <= old.quantity
		})
}

/// Moves a status one step forward along packed, dispatched, delivered.
fn advance(status: &mut OrderStatus, next: RoleOrderStatus) -> bool {
	let allowed = matches!(
		(*status, next),
		(OrderStatus::Placed, RoleOrderStatus::Packed)
			| (OrderStatus::Packed, RoleOrderStatus::Dispatched)
			| (OrderStatus::Dispatched, RoleOrderStatus::Delivered)
	);
	if allowed {
		*status = next.into();
	}
	allowed
}

/// Deterministic registry postcode derived from the CHI digits.
fn registry_postcode(chi: &str) -> String {
	let digits: Vec<u32> = chi.chars().filter_map(|c| c.to_digit(10)).collect();
	let district = digits.iter().sum::<u32>() % 17 + 1;
	let remainder: String = chi.chars().rev().take(3).collect();
	format!("EH{} {}", district, remainder)
}

/// Distance in arbitrary units: district difference plus a small term for
/// numeric remainders so that nearby postcodes are still ordered.
fn distance_between(from: &Postcode, to: &Postcode) -> f64 {
	let district = |p: &Postcode| f64::from(p.district().unwrap_or(0));
	let remainder = |p: &Postcode| p.remainder().parse::<u32>().map(f64::from).unwrap_or(0.0);
	(district(from) - district(to)).abs() + (remainder(from) - remainder(to)).abs() / 1000.0
}

/// Configuration schema for [`MemoryGateway`].
pub struct MemoryGatewaySchema;

impl ConfigSchema for MemoryGatewaySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(vec![], vec![Field::new("catalog_file", FieldType::String)]);
		schema.validate(config)
	}
}

/// Builds a [`MemoryGateway`] from its configuration block.
///
/// Configuration parameters:
/// - `catalog_file`: JSON array of food boxes replacing the default catalogue
pub fn create_gateway(config: &toml::Value) -> Result<Box<dyn GatewayInterface>, GatewayError> {
	MemoryGatewaySchema
		.validate(config)
		.map_err(|e| GatewayError::Configuration(format!("Invalid memory gateway config: {}", e)))?;

	let gateway = match config.get("catalog_file").and_then(|v| v.as_str()) {
		Some(path) => {
			let raw = std::fs::read_to_string(path).map_err(|e| {
				GatewayError::Configuration(format!("Cannot read catalog_file {}: {}", path, e))
			})?;
			let catalog: Vec<FoodBox> = serde_json::from_str(&raw).map_err(|e| {
				GatewayError::Configuration(format!("Invalid catalog_file {}: {}", path, e))
			})?;
			MemoryGateway::with_catalog(catalog)
		},
		None => MemoryGateway::new(),
	};

	Ok(Box::new(gateway))
}

/// Registry for the in-memory gateway.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = GatewayFactory;

	fn factory() -> Self::Factory {
		create_gateway
	}
}

impl GatewayRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_default_catalog() {
		let catalog = default_catalog();
		assert_eq!(catalog.len(), 5);
		assert_eq!(catalog[1].diet, "pollotarian");
		assert_eq!(catalog[1].item(7).map(|item| item.quantity), Some(2));
		assert!(catalog.iter().all(|b| !b.contents.is_empty()));
	}

	#[tokio::test]
	async fn test_catalog_filtering() {
		let gateway = MemoryGateway::new();

		let all: Vec<FoodBox> =
			serde_json::from_str(&gateway.fetch("/showFoodBox?orderOption=catering&dietaryPreference=").await.unwrap())
				.unwrap();
		assert_eq!(all.len(), 5);

		let vegan: Vec<FoodBox> = serde_json::from_str(
			&gateway
				.fetch("/showFoodBox?orderOption=catering&dietaryPreference=vegan")
				.await
				.unwrap(),
		)
		.unwrap();
		assert_eq!(vegan.len(), 1);
		assert_eq!(vegan[0].id, "4");

		let none = gateway
			.fetch("/showFoodBox?orderOption=catering&dietaryPreference=keto")
			.await
			.unwrap();
		assert_eq!(none, "[]");
	}

	#[tokio::test]
	async fn test_registration_is_idempotent() {
		let gateway = MemoryGateway::new();
		let first = gateway
			.fetch("/registerShieldingIndividual?CHI=0101801234")
			.await
			.unwrap();
		let details: Vec<String> = serde_json::from_str(&first).unwrap();
		assert_eq!(details.len(), 4);
		assert!(details[0].starts_with("EH"));

		let second = gateway
			.fetch("/registerShieldingIndividual?CHI=0101801234")
			.await
			.unwrap();
		assert_eq!(second, ALREADY_REGISTERED);
	}

	#[tokio::test]
	async fn test_order_lifecycle_rules() {
		let gateway = MemoryGateway::new();
		gateway.add_individual("0101801234", "EH1 100").await;

		let body = r#"{"contents":[{"id":1,"name":"cucumbers","quantity":2}]}"#;
		let id = gateway
			.submit("/placeOrder?individual_id=0101801234", body)
			.await
			.unwrap();
		assert_eq!(id, "1");
		assert_eq!(gateway.order_individual(1).await.as_deref(), Some("0101801234"));
		assert_eq!(gateway.fetch("/requestStatus?order_id=1").await.unwrap(), "0");

		// Raising a quantity is refused, lowering it is accepted
		let raised = r#"{"contents":[{"id":1,"name":"cucumbers","quantity":3}]}"#;
		assert_eq!(gateway.submit("/editOrder?order_id=1", raised).await.unwrap(), "False");
		let lowered = r#"{"contents":[{"id":1,"name":"cucumbers","quantity":1}]}"#;
		assert_eq!(gateway.submit("/editOrder?order_id=1", lowered).await.unwrap(), "True");

		assert_eq!(
			gateway.fetch("/updateOrderStatus?order_id=1&newStatus=dispatched").await.unwrap(),
			"False"
		);
		assert_eq!(
			gateway.fetch("/updateOrderStatus?order_id=1&newStatus=packed").await.unwrap(),
			"True"
		);
		assert_eq!(gateway.fetch("/requestStatus?order_id=1").await.unwrap(), "1");

		assert_eq!(gateway.fetch("/cancelOrder?order_id=1").await.unwrap(), "True");
		assert_eq!(gateway.fetch("/requestStatus?order_id=1").await.unwrap(), "4");
		assert_eq!(gateway.fetch("/cancelOrder?order_id=1").await.unwrap(), "False");
		assert_eq!(gateway.fetch("/requestStatus?order_id=9").await.unwrap(), "-1");
	}

	#[tokio::test]
	async fn test_place_order_requires_registration() {
		let gateway = MemoryGateway::new();
		let result = gateway
			.submit("/placeOrder?individual_id=0101801234", r#"{"contents":[]}"#)
			.await;
		assert!(matches!(result, Err(GatewayError::Status { status: 400, .. })));
	}

	#[tokio::test]
	async fn test_caterers_and_distance() {
		let gateway = MemoryGateway::new();
		assert_eq!(
			gateway
				.fetch("/registerCateringCompany?business_name=leith+kitchen&postcode=EH6_100")
				.await
				.unwrap(),
			REGISTERED_NEW
		);
		assert_eq!(
			gateway
				.fetch("/registerCateringCompany?business_name=leith+kitchen&postcode=EH6_100")
				.await
				.unwrap(),
			ALREADY_REGISTERED
		);

		let listing: Vec<String> =
			serde_json::from_str(&gateway.fetch("/getCaterers").await.unwrap()).unwrap();
		assert_eq!(listing, vec!["0,leith kitchen,EH6_100"]);

		let distance = gateway
			.fetch("/distance?postcode1=EH1_100&postcode2=EH3_200")
			.await
			.unwrap();
		assert_eq!(distance.parse::<f64>().unwrap(), 2.1);

		assert!(gateway
			.fetch("/distance?postcode1=1_100&postcode2=EH3_200")
			.await
			.is_err());
	}

	#[tokio::test]
	async fn test_supermarket_orders() {
		let gateway = MemoryGateway::new();
		gateway.add_individual("0101801234", "EH1 100").await;
		gateway
			.fetch("/registerSupermarket?business_name=corner&postcode=EH2_200")
			.await
			.unwrap();

		let record = "/recordSupermarketOrder?individual_id=0101801234&order_number=7\
			&supermarket_business_name=corner&supermarket_postcode=EH2_200";
		assert_eq!(gateway.fetch(record).await.unwrap(), "True");
		assert_eq!(gateway.fetch(record).await.unwrap(), "False");
		assert_eq!(
			gateway
				.fetch("/updateSupermarketOrderStatus?order_id=7&newStatus=packed")
				.await
				.unwrap(),
			"True"
		);
	}

	#[tokio::test]
	async fn test_unknown_route() {
		let gateway = MemoryGateway::new();
		assert!(matches!(
			gateway.fetch("/nowhere").await,
			Err(GatewayError::Status { status: 404, .. })
		));
	}

	#[test]
	fn test_factory_with_catalog_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"[{{"id": "1", "diet": "vegan", "contents": [{{"id": 5, "name": "kale", "quantity": 3}}]}}]"#
		)
		.unwrap();

		let config: toml::Value =
			toml::from_str(&format!("catalog_file = {:?}", file.path().to_str().unwrap())).unwrap();
		assert!(create_gateway(&config).is_ok());

		let config: toml::Value = toml::from_str(r#"catalog_file = "/nonexistent/catalog.json""#).unwrap();
		assert!(matches!(
			create_gateway(&config),
			Err(GatewayError::Configuration(_))
		));
	}
}
