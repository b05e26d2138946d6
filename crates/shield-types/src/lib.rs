//! Common types module for the shielding food-box client.
//!
//! This module defines the data model shared by the gateway, the order
//! lifecycle manager and the role clients. Keeping these types in one crate
//! means every component agrees on the wire shapes exchanged with the remote
//! ordering service.

/// Catering company listings returned by the remote service.
pub mod caterer;
/// Food boxes and their line items.
pub mod food_box;
/// Identity values: CHI numbers and postcodes.
pub mod identity;
/// Orders, order identifiers and order status codes.
pub mod order;
/// Registry trait for named, configurable implementations.
pub mod registry;
/// Configuration validation types for gateway implementations.
pub mod validation;

pub use caterer::*;
pub use food_box::*;
pub use identity::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use validation::*;
