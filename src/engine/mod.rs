//! Deferred execution of catalog mutations.

/// Enforcer driving operations to completion as references arrive.
pub mod enforcer;
/// Index of operations blocked on missing objects.
pub mod pending;
