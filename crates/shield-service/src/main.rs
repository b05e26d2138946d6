//! Command-line entry point for the shielding food-box client.
//!
//! Each invocation loads the configuration, builds the configured gateway
//! and runs one command as a fresh session. Nothing is kept between runs.

use clap::{Parser, Subcommand};
use shield_config::Config;
use shield_core::{ClientSet, ShieldBuilder};
use shield_gateway::{get_all_implementations, GatewayFactory};
use std::collections::HashMap;
use std::path::PathBuf;

mod commands;

/// Command-line arguments for the shield client.
#[derive(Parser, Debug)]
#[command(name = "shield", author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
	/// List food boxes, optionally filtered by dietary preference
	Boxes {
		#[arg(long)]
		diet: Option<String>,
	},
	/// Register a shielding individual
	Register {
		#[arg(long)]
		chi: String,
	},
	/// Register, pick a box, reduce quantities and place an order
	Order {
		#[arg(long)]
		chi: String,
		/// Catalogue position of the box (1-based)
		#[arg(long = "box")]
		box_id: usize,
		/// Item quantity reduction as ITEM=QUANTITY, may be repeated
		#[arg(long = "reduce", value_parser = commands::parse_reduction)]
		reductions: Vec<(u32, i64)>,
	},
	/// Show the service's status for an order
	Status {
		#[arg(long)]
		order: u32,
	},
	/// Distance between two postcodes
	Distance { from: String, to: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.client.id);

	let clients = build_clients(config)?;
	commands::run(&clients, args.command).await?;
	Ok(())
}

/// Factories for every built-in gateway implementation, keyed by name.
fn gateway_factories() -> HashMap<String, GatewayFactory> {
	get_all_implementations()
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect()
}

fn build_clients(config: Config) -> Result<ClientSet, Box<dyn std::error::Error>> {
	Ok(ShieldBuilder::new(config).build(&gateway_factories())?)
}
