use thiserror::Error;

use crate::{
    info::{CatalogInfo, Patch},
    types::{InfoType, ObjectId},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("object {0} not found")]
    MissingObject(ObjectId),
    #[error("object {0} already exists")]
    AlreadyExists(ObjectId),
    #[error("{info_type:?} named {name:?} already exists")]
    DuplicateName { info_type: InfoType, name: String },
    #[error("{id} references unresolved object {reference}")]
    UnresolvedReference { id: ObjectId, reference: ObjectId },
    #[error("object {id} is a {actual:?}, expected {expected:?}")]
    WrongType {
        id: ObjectId,
        expected: InfoType,
        actual: InfoType,
    },
    #[error("catalog backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Raw catalog storage, with no knowledge of forward references.
///
/// Implementations provide their own internal synchronization; every method
/// takes `&self`.
pub trait CatalogFacade: Send + Sync {
    fn get(&self, id: &str) -> Option<CatalogInfo>;

    fn get_typed(&self, id: &str, info_type: InfoType) -> Option<CatalogInfo> {
        self.get(id).filter(|info| info.info_type == info_type)
    }

    /// Looks up by name. `scope` is the id of the owning workspace or
    /// namespace for kinds whose names are scoped.
    fn get_by_name(&self, info_type: InfoType, scope: Option<&str>, name: &str) -> Option<CatalogInfo>;

    fn get_namespace_by_prefix(&self, prefix: &str) -> Option<CatalogInfo> {
        self.get_by_name(InfoType::Namespace, None, prefix)
    }

    fn get_namespace_by_uri(&self, uri: &str) -> Option<CatalogInfo>;

    /// Feature type or coverage called `name` published from store `store_id`.
    fn get_resource_by_store(&self, store_id: &str, name: &str) -> Option<CatalogInfo>;

    fn add(&self, info: CatalogInfo) -> StoreResult<CatalogInfo>;
    fn update(&self, info: &CatalogInfo, patch: &Patch) -> StoreResult<CatalogInfo>;
    fn remove(&self, info: &CatalogInfo) -> StoreResult<()>;

    fn set_default_workspace(&self, workspace: Option<&CatalogInfo>) -> StoreResult<()>;
    fn set_default_namespace(&self, namespace: Option<&CatalogInfo>) -> StoreResult<()>;
    fn set_default_data_store(&self, workspace: &CatalogInfo, store: Option<&CatalogInfo>) -> StoreResult<()>;

    fn default_workspace(&self) -> Option<CatalogInfo>;
    fn default_namespace(&self) -> Option<CatalogInfo>;
    fn default_data_store(&self, workspace_id: &str) -> Option<CatalogInfo>;
}
