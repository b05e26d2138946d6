//! Registry trait for self-registering implementations.

/// Ties an implementation to the name used for it in configuration files
/// (`[gateway.implementations.<NAME>]`) and to the factory building it.
pub trait ImplementationRegistry {
	const NAME: &'static str;

	/// Factory function type of the component family.
	type Factory;

	fn factory() -> Self::Factory;
}
