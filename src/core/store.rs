use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::{
    info::{CatalogInfo, Patch, Value},
    types::{InfoType, ObjectId},
};

use super::{
    facade::{CatalogFacade, StoreError, StoreResult},
    indices::{NameIndex, NameKey},
};

#[derive(Debug, Default)]
struct CatalogState {
    objects: HashMap<ObjectId, CatalogInfo>,
    by_name: NameIndex,
    by_uri: HashMap<String, ObjectId>,
    default_workspace: Option<ObjectId>,
    default_namespace: Option<ObjectId>,
    default_stores: HashMap<ObjectId, ObjectId>,
}

/// In-memory [`CatalogFacade`] that rejects objects with unresolved references.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All objects, sorted by id.
    pub fn objects(&self) -> Vec<CatalogInfo> {
        let mut out: Vec<CatalogInfo> = self.state.read().objects.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

impl CatalogState {
    fn validate_refs(&self, info: &CatalogInfo) -> StoreResult<()> {
        for value in info.properties.values() {
            self.validate_value(&info.id, value)?;
        }
        Ok(())
    }

    fn validate_value(&self, id: &str, value: &Value) -> StoreResult<()> {
        match value {
            Value::Placeholder(r) => Err(StoreError::UnresolvedReference {
                id: id.to_owned(),
                reference: r.id.clone(),
            }),
            Value::Ref(r) if !self.objects.contains_key(&r.id) => Err(StoreError::UnresolvedReference {
                id: id.to_owned(),
                reference: r.id.clone(),
            }),
            Value::List(items) => items.iter().try_for_each(|v| self.validate_value(id, v)),
            _ => Ok(()),
        }
    }

    fn check_name_free(&self, info: &CatalogInfo) -> StoreResult<()> {
        if let Some(key) = NameKey::of(info) {
            if self.by_name.get(&key).is_some_and(|owner| *owner != info.id) {
                return Err(StoreError::DuplicateName {
                    info_type: info.info_type,
                    name: key.name,
                });
            }
        }
        Ok(())
    }

    fn insert_indices(&mut self, info: &CatalogInfo) {
        if let Some(key) = NameKey::of(info) {
            self.by_name.insert(key, info.id.clone());
        }
        if let Some(uri) = namespace_uri(info) {
            self.by_uri.insert(uri.to_owned(), info.id.clone());
        }
    }

    fn remove_indices(&mut self, info: &CatalogInfo) {
        if let Some(key) = NameKey::of(info) {
            self.by_name.remove(&key);
        }
        if let Some(uri) = namespace_uri(info) {
            self.by_uri.remove(uri);
        }
    }

    fn require(&self, info: &CatalogInfo, expected: InfoType) -> StoreResult<()> {
        let found = self
            .objects
            .get(&info.id)
            .ok_or_else(|| StoreError::MissingObject(info.id.clone()))?;
        if found.info_type != expected {
            return Err(StoreError::WrongType {
                id: info.id.clone(),
                expected,
                actual: found.info_type,
            });
        }
        Ok(())
    }
}

fn namespace_uri(info: &CatalogInfo) -> Option<&str> {
    if info.info_type != InfoType::Namespace {
        return None;
    }
    info.property("uri").and_then(Value::as_text)
}

impl CatalogFacade for MemoryCatalog {
    fn get(&self, id: &str) -> Option<CatalogInfo> {
        self.state.read().objects.get(id).cloned()
    }

    fn get_by_name(&self, info_type: InfoType, scope: Option<&str>, name: &str) -> Option<CatalogInfo> {
        let state = self.state.read();
        let id = state.by_name.get(&NameKey::new(info_type, scope, name))?;
        state.objects.get(id).cloned()
    }

    fn get_namespace_by_uri(&self, uri: &str) -> Option<CatalogInfo> {
        let state = self.state.read();
        let id = state.by_uri.get(uri)?;
        state.objects.get(id).cloned()
    }

    fn get_resource_by_store(&self, store_id: &str, name: &str) -> Option<CatalogInfo> {
        let state = self.state.read();
        state
            .objects
            .values()
            .filter(|info| matches!(info.info_type, InfoType::FeatureType | InfoType::Coverage))
            .find(|info| {
                info.name() == Some(name)
                    && info
                        .property("store")
                        .and_then(Value::as_ref_target)
                        .is_some_and(|store| store.id == store_id)
            })
            .cloned()
    }

    fn add(&self, info: CatalogInfo) -> StoreResult<CatalogInfo> {
        let mut state = self.state.write();
        if state.objects.contains_key(&info.id) {
            return Err(StoreError::AlreadyExists(info.id));
        }
        state.validate_refs(&info)?;
        state.check_name_free(&info)?;
        state.insert_indices(&info);
        state.objects.insert(info.id.clone(), info.clone());
        Ok(info)
    }

    fn update(&self, info: &CatalogInfo, patch: &Patch) -> StoreResult<CatalogInfo> {
        let mut state = self.state.write();
        let old = state
            .objects
            .get(&info.id)
            .cloned()
            .ok_or_else(|| StoreError::MissingObject(info.id.clone()))?;

        let mut updated = old.clone();
        patch.apply_to(&mut updated);
        state.validate_refs(&updated)?;
        state.check_name_free(&updated)?;

        state.remove_indices(&old);
        state.insert_indices(&updated);
        state.objects.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    fn remove(&self, info: &CatalogInfo) -> StoreResult<()> {
        let mut state = self.state.write();
        let old = state
            .objects
            .remove(&info.id)
            .ok_or_else(|| StoreError::MissingObject(info.id.clone()))?;
        state.remove_indices(&old);

        if state.default_workspace.as_deref() == Some(old.id.as_str()) {
            state.default_workspace = None;
        }
        if state.default_namespace.as_deref() == Some(old.id.as_str()) {
            state.default_namespace = None;
        }
        state
            .default_stores
            .retain(|ws, store| *ws != old.id && *store != old.id);
        Ok(())
    }

    fn set_default_workspace(&self, workspace: Option<&CatalogInfo>) -> StoreResult<()> {
        let mut state = self.state.write();
        if let Some(ws) = workspace {
            state.require(ws, InfoType::Workspace)?;
        }
        state.default_workspace = workspace.map(|ws| ws.id.clone());
        Ok(())
    }

    fn set_default_namespace(&self, namespace: Option<&CatalogInfo>) -> StoreResult<()> {
        let mut state = self.state.write();
        if let Some(ns) = namespace {
            state.require(ns, InfoType::Namespace)?;
        }
        state.default_namespace = namespace.map(|ns| ns.id.clone());
        Ok(())
    }

    fn set_default_data_store(&self, workspace: &CatalogInfo, store: Option<&CatalogInfo>) -> StoreResult<()> {
        let mut state = self.state.write();
        state.require(workspace, InfoType::Workspace)?;
        match store {
            Some(store) => {
                state.require(store, InfoType::DataStore)?;
                state
                    .default_stores
                    .insert(workspace.id.clone(), store.id.clone());
            }
            None => {
                state.default_stores.remove(&workspace.id);
            }
        }
        Ok(())
    }

    fn default_workspace(&self) -> Option<CatalogInfo> {
        let state = self.state.read();
        let id = state.default_workspace.as_ref()?;
        state.objects.get(id).cloned()
    }

    fn default_namespace(&self) -> Option<CatalogInfo> {
        let state = self.state.read();
        let id = state.default_namespace.as_ref()?;
        state.objects.get(id).cloned()
    }

    fn default_data_store(&self, workspace_id: &str) -> Option<CatalogInfo> {
        let state = self.state.read();
        let id = state.default_stores.get(workspace_id)?;
        state.objects.get(id).cloned()
    }
}
