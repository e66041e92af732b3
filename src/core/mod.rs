//! Raw catalog contract, in-memory store, and reference resolution.

/// Raw catalog trait and store errors.
pub mod facade;
/// Name index helpers.
pub mod indices;
/// Placeholder-to-reference resolution.
pub mod resolver;
/// In-memory catalog implementation.
pub mod store;
