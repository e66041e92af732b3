#![allow(dead_code)]

use std::sync::Arc;

use eventual_catalog::{
    core::{
        facade::{CatalogFacade, StoreError, StoreResult},
        store::MemoryCatalog,
    },
    engine::enforcer::Enforcer,
    info::{CatalogInfo, Patch, Value},
    types::InfoType,
};
use parking_lot::Mutex;

pub fn setup() -> (Arc<MemoryCatalog>, Enforcer) {
    let catalog = Arc::new(MemoryCatalog::new());
    let enforcer = Enforcer::new(catalog.clone());
    (catalog, enforcer)
}

pub fn placeholder(id: &str, info_type: InfoType) -> Value {
    Value::placeholder(id, info_type)
}

pub fn reference(id: &str, info_type: InfoType) -> Value {
    Value::reference(id, info_type)
}

pub fn workspace(id: &str, name: &str) -> CatalogInfo {
    CatalogInfo::new(id, InfoType::Workspace).with("name", Value::text(name))
}

pub fn namespace(id: &str, prefix: &str) -> CatalogInfo {
    CatalogInfo::new(id, InfoType::Namespace)
        .with("prefix", Value::text(prefix))
        .with("uri", Value::text(format!("http://{prefix}.example.org")))
}

pub fn data_store(id: &str, name: &str, workspace: Value) -> CatalogInfo {
    CatalogInfo::new(id, InfoType::DataStore)
        .with("name", Value::text(name))
        .with("workspace", workspace)
}

pub fn feature_type(id: &str, name: &str, namespace: Value, store: Value) -> CatalogInfo {
    CatalogInfo::new(id, InfoType::FeatureType)
        .with("name", Value::text(name))
        .with("namespace", namespace)
        .with("store", store)
}

pub fn style(id: &str, name: &str) -> CatalogInfo {
    CatalogInfo::new(id, InfoType::Style).with("name", Value::text(name))
}

pub fn layer(id: &str, name: &str, resource: Value, default_style: Value) -> CatalogInfo {
    CatalogInfo::new(id, InfoType::Layer)
        .with("name", Value::text(name))
        .with("resource", resource)
        .with("defaultStyle", default_style)
}

pub fn layer_group(id: &str, name: &str, layers: Vec<Value>) -> CatalogInfo {
    CatalogInfo::new(id, InfoType::LayerGroup)
        .with("name", Value::text(name))
        .with("layers", Value::List(layers))
}

/// Workspace, namespace, store, feature type and style, all resolved.
pub fn resource_chain() -> Vec<CatalogInfo> {
    vec![
        workspace("ws-a", "wsA"),
        namespace("ns-a", "nsA"),
        data_store("ds-a", "dsA", reference("ws-a", InfoType::Workspace)),
        feature_type(
            "ft-a",
            "ftA",
            reference("ns-a", InfoType::Namespace),
            reference("ds-a", InfoType::DataStore),
        ),
        style("style-1", "style1"),
    ]
}

/// [`MemoryCatalog`] whose `add` fails a set number of times for one id.
pub struct FlakyCatalog {
    inner: MemoryCatalog,
    fail_id: String,
    failures_left: Mutex<usize>,
}

impl FlakyCatalog {
    pub fn new(fail_id: &str, failures: usize) -> Self {
        Self {
            inner: MemoryCatalog::new(),
            fail_id: fail_id.to_owned(),
            failures_left: Mutex::new(failures),
        }
    }
}

impl CatalogFacade for FlakyCatalog {
    fn get(&self, id: &str) -> Option<CatalogInfo> {
        self.inner.get(id)
    }

    fn get_by_name(&self, info_type: InfoType, scope: Option<&str>, name: &str) -> Option<CatalogInfo> {
        self.inner.get_by_name(info_type, scope, name)
    }

    fn get_namespace_by_uri(&self, uri: &str) -> Option<CatalogInfo> {
        self.inner.get_namespace_by_uri(uri)
    }

    fn get_resource_by_store(&self, store_id: &str, name: &str) -> Option<CatalogInfo> {
        self.inner.get_resource_by_store(store_id, name)
    }

    fn add(&self, info: CatalogInfo) -> StoreResult<CatalogInfo> {
        if info.id == self.fail_id {
            let mut left = self.failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(StoreError::Backend("simulated write failure".to_owned()));
            }
        }
        self.inner.add(info)
    }

    fn update(&self, info: &CatalogInfo, patch: &Patch) -> StoreResult<CatalogInfo> {
        self.inner.update(info, patch)
    }

    fn remove(&self, info: &CatalogInfo) -> StoreResult<()> {
        self.inner.remove(info)
    }

    fn set_default_workspace(&self, workspace: Option<&CatalogInfo>) -> StoreResult<()> {
        self.inner.set_default_workspace(workspace)
    }

    fn set_default_namespace(&self, namespace: Option<&CatalogInfo>) -> StoreResult<()> {
        self.inner.set_default_namespace(namespace)
    }

    fn set_default_data_store(&self, workspace: &CatalogInfo, store: Option<&CatalogInfo>) -> StoreResult<()> {
        self.inner.set_default_data_store(workspace, store)
    }

    fn default_workspace(&self) -> Option<CatalogInfo> {
        self.inner.default_workspace()
    }

    fn default_namespace(&self) -> Option<CatalogInfo> {
        self.inner.default_namespace()
    }

    fn default_data_store(&self, workspace_id: &str) -> Option<CatalogInfo> {
        self.inner.default_data_store(workspace_id)
    }
}
