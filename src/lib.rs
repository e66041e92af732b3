//! Eventually consistent application of catalog mutations.
//!
//! Nodes of a cluster publish catalog changes as events. Events may arrive
//! out of order, so a change can reference an object this node has not seen
//! yet. The [`engine::enforcer::Enforcer`] applies every mutation it can and
//! parks the rest until the objects they reference show up, then drives them
//! to completion in a cascade. [`facade::RetryingFacade`] lets lookups issued
//! by external clients wait briefly for that convergence.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use eventual_catalog::{
//!     core::{facade::CatalogFacade, store::MemoryCatalog},
//!     engine::enforcer::Enforcer,
//!     info::{CatalogInfo, Value},
//!     types::InfoType,
//! };
//!
//! let catalog = Arc::new(MemoryCatalog::new());
//! let enforcer = Enforcer::new(catalog.clone());
//!
//! // the store arrives before its workspace
//! let store = CatalogInfo::new("ds1", InfoType::DataStore)
//!     .with("name", Value::text("roads"))
//!     .with("workspace", Value::placeholder("ws1", InfoType::Workspace));
//! enforcer.add(store).expect("add store");
//! assert!(!enforcer.is_converged());
//!
//! let workspace = CatalogInfo::new("ws1", InfoType::Workspace).with("name", Value::text("topp"));
//! enforcer.add(workspace).expect("add workspace");
//! assert!(enforcer.is_converged());
//! assert!(catalog.get("ds1").is_some());
//! ```

/// Eventual-consistency settings.
pub mod config;
/// Caller context deciding whether lookups may wait.
pub mod context;
/// Raw catalog contract, in-memory store and reference resolution.
pub mod core;
/// Enforcer and pending-operation index.
pub mod engine;
/// Retrying catalog facade.
pub mod facade;
/// Catalog objects, placeholders and patches.
pub mod info;
pub mod observability;
/// Deferrable catalog operations.
pub mod op;
/// Remote event listener.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
