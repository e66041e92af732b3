//! Async listener applying remote catalog events in delivery order.

/// Remote event payloads and listener notifications.
pub mod events;
/// Listener handle and command loop.
pub mod handle;
/// Event-to-operation translation.
pub mod processor;
