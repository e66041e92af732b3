//! Catalog facade that defers mutations and retries point lookups while the
//! local catalog converges.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::{
    config::ConsistencyConfig,
    context::RequestContextProbe,
    core::facade::{CatalogFacade, StoreResult},
    engine::enforcer::Enforcer,
    info::{CatalogInfo, Info, Patch},
    types::InfoType,
};

/// Routes mutations through an [`Enforcer`] and retries lookups that miss
/// while external requests race remote events.
pub struct RetryingFacade {
    catalog: Arc<dyn CatalogFacade>,
    enforcer: Arc<Enforcer>,
    retry_delays: Vec<Duration>,
    context: Arc<dyn RequestContextProbe>,
}

impl RetryingFacade {
    pub fn new(
        enforcer: Arc<Enforcer>,
        config: &ConsistencyConfig,
        context: Arc<dyn RequestContextProbe>,
    ) -> Self {
        let retry_delays = config.retry_delays();
        debug!(retries = ?retry_delays, "eventual consistency lookup retries");
        Self {
            catalog: Arc::clone(enforcer.catalog()),
            enforcer,
            retry_delays,
            context,
        }
    }

    pub fn enforcer(&self) -> &Arc<Enforcer> {
        &self.enforcer
    }

    pub fn retry_delays(&self) -> &[Duration] {
        &self.retry_delays
    }

    pub fn is_converged(&self) -> bool {
        self.enforcer.is_converged()
    }

    pub fn add(&self, info: CatalogInfo) -> StoreResult<CatalogInfo> {
        self.enforcer.add(info)
    }

    pub fn update(&self, target: impl Into<Info>, patch: Patch) -> StoreResult<Info> {
        self.enforcer.update(target, patch)
    }

    pub fn remove(&self, target: impl Into<Info>) -> StoreResult<()> {
        self.enforcer.remove(target)
    }

    pub fn set_default_workspace(&self, workspace: Option<Info>) -> StoreResult<()> {
        self.enforcer.set_default_workspace(workspace)
    }

    pub fn set_default_namespace(&self, namespace: Option<Info>) -> StoreResult<()> {
        self.enforcer.set_default_namespace(namespace)
    }

    pub fn set_default_data_store(&self, workspace: Info, store: Option<Info>) -> StoreResult<()> {
        self.enforcer.set_default_data_store(workspace, store)
    }

    pub fn get(&self, id: &str) -> Option<CatalogInfo> {
        self.retry_on_none(|| self.catalog.get(id), || format!("get({id})"))
    }

    pub fn get_typed(&self, id: &str, info_type: InfoType) -> Option<CatalogInfo> {
        self.retry_on_none(
            || self.catalog.get_typed(id, info_type),
            || format!("get({id}, {info_type:?})"),
        )
    }

    pub fn get_by_name(&self, info_type: InfoType, scope: Option<&str>, name: &str) -> Option<CatalogInfo> {
        self.retry_on_none(
            || self.catalog.get_by_name(info_type, scope, name),
            || format!("get_by_name({info_type:?}, {scope:?}, {name})"),
        )
    }

    pub fn get_workspace_by_name(&self, name: &str) -> Option<CatalogInfo> {
        self.get_by_name(InfoType::Workspace, None, name)
    }

    pub fn get_layer_by_name(&self, name: &str) -> Option<CatalogInfo> {
        self.get_by_name(InfoType::Layer, None, name)
    }

    pub fn get_style_by_name(&self, workspace_id: Option<&str>, name: &str) -> Option<CatalogInfo> {
        self.get_by_name(InfoType::Style, workspace_id, name)
    }

    /// Prefix lookup. Anything containing `:` is taken for a URI and looked up
    /// once, without retries.
    pub fn get_namespace_by_prefix(&self, prefix: &str) -> Option<CatalogInfo> {
        if prefix.contains(':') {
            return self.catalog.get_namespace_by_uri(prefix);
        }
        self.retry_on_none(
            || self.catalog.get_namespace_by_prefix(prefix),
            || format!("get_namespace_by_prefix({prefix})"),
        )
    }

    pub fn get_namespace_by_uri(&self, uri: &str) -> Option<CatalogInfo> {
        self.retry_on_none(
            || self.catalog.get_namespace_by_uri(uri),
            || format!("get_namespace_by_uri({uri})"),
        )
    }

    pub fn get_resource_by_store(&self, store_id: &str, name: &str) -> Option<CatalogInfo> {
        self.retry_on_none(
            || self.catalog.get_resource_by_store(store_id, name),
            || format!("get_resource_by_store({store_id}, {name})"),
        )
    }

    pub fn default_workspace(&self) -> Option<CatalogInfo> {
        self.catalog.default_workspace()
    }

    pub fn default_namespace(&self) -> Option<CatalogInfo> {
        self.catalog.default_namespace()
    }

    pub fn default_data_store(&self, workspace_id: &str) -> Option<CatalogInfo> {
        self.catalog.default_data_store(workspace_id)
    }

    fn retry_on_none<T>(&self, lookup: impl Fn() -> Option<T>, describe: impl Fn() -> String) -> Option<T> {
        let found = lookup();
        if found.is_some() {
            return found;
        }
        if !self.context.is_external_request() || self.enforcer.is_converged() {
            return None;
        }
        self.retry(lookup, describe)
    }

    fn retry<T>(&self, lookup: impl Fn() -> Option<T>, describe: impl Fn() -> String) -> Option<T> {
        let call = describe();
        let attempts = self.retry_delays.len();
        debug!(call = %call, attempts, "not found, retrying");

        for (i, delay) in self.retry_delays.iter().enumerate() {
            std::thread::sleep(*delay);
            if let Err(err) = self.enforcer.force_resolve() {
                warn!(call = %call, error = %err, "resolving pending operations failed");
            }
            let attempt = i + 1;
            if let Some(found) = lookup() {
                debug!(call = %call, attempt, delay = ?delay, "found on retry");
                return Some(found);
            }
            debug!(call = %call, attempt, delay = ?delay, "not found on retry");
        }

        debug!(call = %call, attempts, "giving up after retries");
        None
    }
}
