//! Command handlers.

use crate::Command;
use shield_core::{ClientSet, ShieldError, ShieldingIndividualClient};
use shield_gateway::Endpoint;
use shield_types::{OrderId, OrderStatus};

/// Parses an `ITEM=QUANTITY` reduction.
pub(crate) fn parse_reduction(raw: &str) -> Result<(u32, i64), String> {
	let (item, quantity) = raw
		.split_once('=')
		.ok_or_else(|| format!("expected ITEM=QUANTITY, got '{}'", raw))?;
	let item = item
		.trim()
		.parse()
		.map_err(|_| format!("invalid item id '{}'", item))?;
	let quantity = quantity
		.trim()
		.parse()
		.map_err(|_| format!("invalid quantity '{}'", quantity))?;
	Ok((item, quantity))
}

pub(crate) async fn run(clients: &ClientSet, command: Command) -> Result<(), ShieldError> {
	match command {
		Command::Boxes { diet } => list_boxes(clients, diet.as_deref()).await,
		Command::Register { chi } => {
			let mut session = clients.individual().await?;
			session.register(&chi).await?;
			match session.postcode() {
				Some(postcode) => println!("registered {} at {}", chi, postcode),
				None => println!("registered {}", chi),
			}
			Ok(())
		},
		Command::Order {
			chi,
			box_id,
			reductions,
		} => place_order(clients, &chi, box_id, &reductions).await,
		Command::Status { order } => {
			let status = remote_status(clients, order).await?;
			println!("order {}: {}", order, status);
			Ok(())
		},
		Command::Distance { from, to } => {
			let session = clients.individual().await?;
			println!("{}", session.distance(&from, &to).await?);
			Ok(())
		},
	}
}

async fn list_boxes(clients: &ClientSet, diet: Option<&str>) -> Result<(), ShieldError> {
	let session = clients.individual().await?;
	if let Some(diet) = diet {
		for id in session.show_food_boxes(diet).await? {
			println!("{}", id);
		}
		return Ok(());
	}

	for position in 1..=session.food_box_count() {
		let food_box = session.food_box(position)?;
		let items: Vec<String> = food_box
			.contents
			.iter()
			.map(|item| format!("{}x{} (#{})", item.quantity, item.name, item.id))
			.collect();
		println!("{}. {} [{}] {}", position, food_box.name, food_box.diet, items.join(", "));
	}
	Ok(())
}

async fn place_order(
	clients: &ClientSet,
	chi: &str,
	box_id: usize,
	reductions: &[(u32, i64)],
) -> Result<(), ShieldError> {
	let mut session = clients.individual().await?;
	session.register(chi).await?;
	select_caterer(&mut session).await?;

	session.pick_food_box(box_id)?;
	for (item, quantity) in reductions {
		session.change_item_quantity_for_picked_food_box(*item, *quantity)?;
	}
	let order_id = session.place_order().await?;

	println!("order {} placed", order_id);
	for item in session.item_ids_for_order(order_id)? {
		println!(
			"  {} x{}",
			session.item_name_for_order(item, order_id)?,
			session.item_quantity_for_order(item, order_id)?
		);
	}
	Ok(())
}

/// Picks the nearest caterer when one can be determined. Orders are still
/// accepted by the service without one.
async fn select_caterer(session: &mut ShieldingIndividualClient) -> Result<(), ShieldError> {
	match session.closest_catering_company().await {
		Ok(caterer) => {
			println!("caterer: {} ({})", caterer.name, caterer.postcode);
			Ok(())
		},
		Err(e @ (ShieldError::NotFound(_) | ShieldError::InvalidState(_))) => {
			tracing::warn!(error = %e, "Ordering without a catering company");
			Ok(())
		},
		Err(e) => Err(e),
	}
}

/// Asks the service directly; a fresh session has no ledger to consult.
async fn remote_status(clients: &ClientSet, order_id: OrderId) -> Result<OrderStatus, ShieldError> {
	let endpoint = Endpoint::new("/requestStatus").param("order_id", order_id);
	let code = clients.gateway().fetch(&endpoint).await?.into_integer()?;
	OrderStatus::from_code(code).ok_or_else(|| {
		ShieldError::Gateway(shield_gateway::GatewayError::UnexpectedPayload(format!(
			"unknown status code {}",
			code
		)))
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_reduction() {
		assert_eq!(parse_reduction("4=1").unwrap(), (4, 1));
		assert_eq!(parse_reduction(" 2 = 0 ").unwrap(), (2, 0));
		assert_eq!(parse_reduction("2=-1").unwrap(), (2, -1));
		assert!(parse_reduction("2").is_err());
		assert!(parse_reduction("a=1").is_err());
		assert!(parse_reduction("2=b").is_err());
	}
}
