//! Shielding individual client session.
//!
//! A [`ShieldingIndividualClient`] is one individual's session against the
//! ordering service. It validates every request locally before anything is
//! sent, and only touches the ledger once the service has answered.

use crate::{checked_quantity, Catalog, OrderLedger, OrderingRules, ShieldError, Staging};
use chrono::Utc;
use shield_gateway::{Endpoint, GatewayError, GatewayService, Payload};
use shield_types::{CatererEntry, Chi, FoodBox, LineItem, Order, OrderId, OrderStatus, Postcode};
use std::sync::Arc;
use tracing::instrument;

/// Token the registry answers with for a CHI it already knows.
const ALREADY_REGISTERED: &str = "already registered";

/// Number of fields the registry returns for a new registration.
const REGISTRY_DETAILS: usize = 4;

#[derive(Debug, Clone)]
struct Registration {
	chi: Chi,
	/// Unknown when the service only confirms an earlier registration.
	postcode: Option<Postcode>,
}

/// Session of a shielding individual.
pub struct ShieldingIndividualClient {
	gateway: Arc<GatewayService>,
	rules: OrderingRules,
	registration: Option<Registration>,
	caterer: Option<CatererEntry>,
	catalog: Catalog,
	staging: Staging,
	ledger: OrderLedger,
}

impl ShieldingIndividualClient {
	/// Opens a session and caches the full catalogue.
	pub async fn connect(
		gateway: Arc<GatewayService>,
		rules: OrderingRules,
	) -> Result<Self, ShieldError> {
		let boxes = Catalog::fetch(&gateway, "").await?;
		tracing::info!(boxes = boxes.len(), "Catalog loaded");

		Ok(Self {
			gateway,
			rules,
			registration: None,
			caterer: None,
			catalog: Catalog::new(boxes),
			staging: Staging::default(),
			ledger: OrderLedger::default(),
		})
	}

	// Registration

	/// Registers the individual. Registering an already known CHI succeeds.
	#[instrument(skip(self))]
	pub async fn register(&mut self, chi: &str) -> Result<(), ShieldError> {
		let chi = Chi::parse(chi)?;
		let endpoint = Endpoint::new("/registerShieldingIndividual").param("CHI", chi.as_str());

		let postcode = match self.gateway.fetch(&endpoint).await? {
			payload @ Payload::List(_) => {
				let details: Vec<String> = payload.into_list()?;
				if details.len() != REGISTRY_DETAILS {
					return Err(GatewayError::UnexpectedPayload(format!(
						"expected {} registration details, got {}",
						REGISTRY_DETAILS,
						details.len()
					))
					.into());
				}
				let postcode = Postcode::from_registry(&details[0]).map_err(|e| {
					GatewayError::UnexpectedPayload(format!("registry postcode: {}", e))
				})?;
				Some(postcode)
			},
			Payload::Token(token) if token == ALREADY_REGISTERED => self
				.registration
				.as_ref()
				.filter(|r| r.chi == chi)
				.and_then(|r| r.postcode.clone()),
			other => {
				return Err(GatewayError::UnexpectedPayload(format!(
					"registration answered with {:?}",
					other
				))
				.into())
			},
		};

		tracing::info!(
			postcode = postcode.as_ref().map(Postcode::as_str).unwrap_or("unknown"),
			"Individual registered"
		);
		self.registration = Some(Registration { chi, postcode });
		Ok(())
	}

	pub fn is_registered(&self) -> bool {
		self.registration.is_some()
	}

	pub fn chi(&self) -> Option<&Chi> {
		self.registration.as_ref().map(|r| &r.chi)
	}

	pub fn postcode(&self) -> Option<&Postcode> {
		self.registration.as_ref().and_then(|r| r.postcode.as_ref())
	}

	// Catalog

	pub fn food_box_count(&self) -> usize {
		self.catalog.len()
	}

	pub fn food_box(&self, food_box_id: usize) -> Result<&FoodBox, ShieldError> {
		self.catalog.get(food_box_id)
	}

	pub fn dietary_preference_for_food_box(&self, food_box_id: usize) -> Result<&str, ShieldError> {
		Ok(&self.catalog.get(food_box_id)?.diet)
	}

	pub fn items_number_for_food_box(&self, food_box_id: usize) -> Result<usize, ShieldError> {
		Ok(self.catalog.get(food_box_id)?.item_count())
	}

	pub fn item_ids_for_food_box(&self, food_box_id: usize) -> Result<Vec<u32>, ShieldError> {
		Ok(self.catalog.get(food_box_id)?.item_ids())
	}

	pub fn item_name_for_food_box(&self, item_id: u32, food_box_id: usize) -> Result<&str, ShieldError> {
		let food_box = self.catalog.get(food_box_id)?;
		Ok(&item_in(food_box, item_id)?.name)
	}

	pub fn item_quantity_for_food_box(&self, item_id: u32, food_box_id: usize) -> Result<u32, ShieldError> {
		let food_box = self.catalog.get(food_box_id)?;
		Ok(item_in(food_box, item_id)?.quantity)
	}

	/// Fresh query for boxes matching a dietary preference.
	///
	/// Returns the service's box ids. The cached catalogue is left alone, so
	/// these ids are not positions into it.
	#[instrument(skip(self))]
	pub async fn show_food_boxes(&self, dietary_preference: &str) -> Result<Vec<String>, ShieldError> {
		let boxes = Catalog::fetch(&self.gateway, dietary_preference).await?;
		Ok(boxes.into_iter().map(|b| b.id).collect())
	}

	// Staging

	/// Copies a catalogue box into staging, replacing any earlier pick.
	pub fn pick_food_box(&mut self, food_box_id: usize) -> Result<(), ShieldError> {
		let food_box = self.catalog.get(food_box_id)?.clone();
		tracing::debug!(food_box = %food_box.id, "Food box picked");
		self.staging.pick(food_box);
		Ok(())
	}

	pub fn change_item_quantity_for_picked_food_box(
		&mut self,
		item_id: u32,
		quantity: i64,
	) -> Result<(), ShieldError> {
		self.staging.set_quantity(item_id, checked_quantity(quantity)?)
	}

	pub fn picked_food_box(&self) -> Option<&FoodBox> {
		self.staging.picked()
	}

	// Lifecycle

	/// Commits the picked box as a new order.
	///
	/// Requires registration, a picked box and no other active order inside
	/// the ordering window.
	#[instrument(skip(self))]
	pub async fn place_order(&mut self) -> Result<OrderId, ShieldError> {
		let chi = self
			.registration
			.as_ref()
			.map(|r| r.chi.clone())
			.ok_or_else(|| ShieldError::InvalidState("Individual is not registered".into()))?;
		let contents = self
			.staging
			.picked()
			.map(FoodBox::to_contents)
			.ok_or_else(|| ShieldError::InvalidState("No food box has been picked".into()))?;

		let now = Utc::now();
		if let Some(existing) = self.ledger.active_order_within(now, self.rules.order_window) {
			tracing::warn!(order_id = existing.id, "Active order already placed in this window");
			return Err(ShieldError::InvalidState(format!(
				"Order {} was already placed within the last {} days",
				existing.id,
				self.rules.order_window.num_days()
			)));
		}

		let endpoint = Endpoint::new("/placeOrder")
			.param("individual_id", chi.as_str())
			.param_opt("catering_business_name", self.caterer.as_ref().map(|c| c.name.clone()))
			.param_opt("catering_postcode", self.caterer.as_ref().map(|c| c.postcode.clone()));
		let raw_id = self.gateway.submit(&endpoint, &contents).await?.into_integer()?;
		let order_id = OrderId::try_from(raw_id)
			.ok()
			.filter(|id| *id > 0)
			.ok_or_else(|| GatewayError::UnexpectedPayload(format!("invalid order id {}", raw_id)))?;

		if self.ledger.contains(order_id) {
			tracing::warn!(order_id, "Service issued an order id already in the ledger");
			return Err(GatewayError::UnexpectedPayload(format!(
				"order id {} was already issued",
				order_id
			))
			.into());
		}

		let food_box = self
			.staging
			.take()
			.ok_or_else(|| ShieldError::InvalidState("Picked food box disappeared".into()))?;
		self.ledger.insert(Order::new(order_id, food_box, now))?;
		tracing::info!(order_id, "Order placed");
		Ok(order_id)
	}

	/// Pushes the ledger's contents for an order to the service.
	#[instrument(skip(self))]
	pub async fn edit_order(&mut self, order_id: OrderId) -> Result<(), ShieldError> {
		let status = self.request_order_status(order_id).await?;
		if !status.is_editable() {
			tracing::warn!(order_id, status = %status, "Edit refused");
			return Err(ShieldError::InvalidState(format!(
				"Order {} is {} and can no longer be amended",
				order_id, status
			)));
		}

		let contents = self.ledger.get(order_id)?.food_box.to_contents();
		let endpoint = Endpoint::new("/editOrder").param("order_id", order_id);
		self.gateway.submit_acknowledged(&endpoint, &contents).await?;
		tracing::info!(order_id, "Order edited");
		Ok(())
	}

	/// Lowers an item quantity in the ledger copy of an order.
	///
	/// Only the local copy changes; `edit_order` sends it to the service.
	#[instrument(skip(self))]
	pub async fn set_item_quantity_for_order(
		&mut self,
		item_id: u32,
		order_id: OrderId,
		quantity: i64,
	) -> Result<(), ShieldError> {
		let quantity = checked_quantity(quantity)?;
		let status = self.request_order_status(order_id).await?;
		if !status.is_editable() {
			return Err(ShieldError::InvalidState(format!(
				"Order {} is {} and can no longer be amended",
				order_id, status
			)));
		}

		self.ledger
			.get_mut(order_id)?
			.food_box
			.reduce_quantity(item_id, quantity)?;
		Ok(())
	}

	/// Cancels an order that has not been dispatched yet.
	#[instrument(skip(self))]
	pub async fn cancel_order(&mut self, order_id: OrderId) -> Result<(), ShieldError> {
		let status = self.request_order_status(order_id).await?;
		if !status.is_cancellable() {
			tracing::warn!(order_id, status = %status, "Cancellation refused");
			return Err(ShieldError::InvalidState(format!(
				"Order {} is {} and can no longer be cancelled",
				order_id, status
			)));
		}

		let endpoint = Endpoint::new("/cancelOrder").param("order_id", order_id);
		self.gateway.fetch_acknowledged(&endpoint).await?;
		self.ledger.set_status(order_id, OrderStatus::Cancelled)?;
		tracing::info!(order_id, "Order cancelled");
		Ok(())
	}

	/// Refreshes an order's status from the service.
	///
	/// Orders the service no longer knows are marked `not-found` and reported
	/// as [`ShieldError::NotFound`].
	#[instrument(skip(self))]
	pub async fn request_order_status(&mut self, order_id: OrderId) -> Result<OrderStatus, ShieldError> {
		if !self.ledger.contains(order_id) {
			return Err(ShieldError::NotFound(format!(
				"Order {} is not in the ledger",
				order_id
			)));
		}

		let endpoint = Endpoint::new("/requestStatus").param("order_id", order_id);
		let code = self.gateway.fetch(&endpoint).await?.into_integer()?;
		let status = OrderStatus::from_code(code)
			.ok_or_else(|| GatewayError::UnexpectedPayload(format!("unknown status code {}", code)))?;

		self.ledger.set_status(order_id, status)?;
		if status == OrderStatus::NotFound {
			tracing::warn!(order_id, "Order unknown to the service");
			return Err(ShieldError::NotFound(format!(
				"Order {} is unknown to the service",
				order_id
			)));
		}

		tracing::debug!(order_id, status = %status, "Status refreshed");
		Ok(status)
	}

	// Ledger queries

	/// Order ids in placement order.
	pub fn order_numbers(&self) -> Vec<OrderId> {
		self.ledger.order_ids().to_vec()
	}

	/// Last known status, without contacting the service.
	pub fn status_for_order(&self, order_id: OrderId) -> Result<OrderStatus, ShieldError> {
		Ok(self.ledger.get(order_id)?.status)
	}

	pub fn item_ids_for_order(&self, order_id: OrderId) -> Result<Vec<u32>, ShieldError> {
		Ok(self.ledger.get(order_id)?.food_box.item_ids())
	}

	pub fn item_name_for_order(&self, item_id: u32, order_id: OrderId) -> Result<&str, ShieldError> {
		let order = self.ledger.get(order_id)?;
		Ok(&item_in(&order.food_box, item_id)?.name)
	}

	pub fn item_quantity_for_order(&self, item_id: u32, order_id: OrderId) -> Result<u32, ShieldError> {
		let order = self.ledger.get(order_id)?;
		Ok(item_in(&order.food_box, item_id)?.quantity)
	}

	// Caterers and distance

	/// Catering companies currently registered with the service.
	pub async fn catering_companies(&self) -> Result<Vec<CatererEntry>, ShieldError> {
		let listing: Vec<String> = self
			.gateway
			.fetch(&Endpoint::new("/getCaterers"))
			.await?
			.into_list()?;

		listing
			.iter()
			.map(|raw| {
				CatererEntry::parse(raw)
					.map_err(|e| ShieldError::Gateway(GatewayError::UnexpectedPayload(e.to_string())))
			})
			.collect()
	}

	/// Selects the caterer nearest to the individual. Later orders are sent
	/// to it.
	///
	/// Caterers listed with a malformed postcode are skipped.
	#[instrument(skip(self))]
	pub async fn closest_catering_company(&mut self) -> Result<CatererEntry, ShieldError> {
		let home = self
			.postcode()
			.cloned()
			.ok_or_else(|| ShieldError::InvalidState("Individual postcode is not known".into()))?;

		let mut closest: Option<(f64, CatererEntry)> = None;
		for caterer in self.catering_companies().await? {
			let distance = match self.distance(home.as_str(), &caterer.postcode).await {
				Ok(distance) => distance,
				Err(ShieldError::Validation(reason)) => {
					tracing::warn!(caterer = %caterer.name, %reason, "Skipping caterer");
					continue;
				},
				Err(e) => return Err(e),
			};
			if closest.as_ref().is_none_or(|(best, _)| distance < *best) {
				closest = Some((distance, caterer));
			}
		}

		let (distance, caterer) = closest
			.ok_or_else(|| ShieldError::NotFound("No catering company is available".into()))?;
		tracing::info!(caterer = %caterer.name, distance, "Closest catering company selected");
		self.caterer = Some(caterer.clone());
		Ok(caterer)
	}

	pub fn selected_caterer(&self) -> Option<&CatererEntry> {
		self.caterer.as_ref()
	}

	/// Distance between two postcodes. Malformed postcodes are rejected
	/// before anything is sent.
	pub async fn distance(&self, from: &str, to: &str) -> Result<f64, ShieldError> {
		let from = Postcode::parse(from)?;
		let to = Postcode::parse(to)?;
		let endpoint = Endpoint::new("/distance")
			.param("postcode1", from.as_str())
			.param("postcode2", to.as_str());
		Ok(self.gateway.fetch(&endpoint).await?.into_float()?)
	}

	/// Like [`Self::distance`] but reports any failure as `0`.
	pub async fn get_distance(&self, from: &str, to: &str) -> f32 {
		match self.distance(from, to).await {
			Ok(distance) => distance as f32,
			Err(e) => {
				tracing::warn!(from, to, error = %e, "Distance lookup failed");
				0.0
			},
		}
	}
}

fn item_in(food_box: &FoodBox, item_id: u32) -> Result<&LineItem, ShieldError> {
	food_box.item(item_id).ok_or_else(|| {
		ShieldError::NotFound(format!("Item {} is not in food box {}", item_id, food_box.id))
	})
}
