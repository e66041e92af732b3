//! Catalog mutation operations that may be deferred until their references resolve.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::{
    core::{
        facade::{CatalogFacade, StoreResult},
        resolver::ReferenceResolver,
    },
    info::{CatalogInfo, Info, Patch},
    types::{InfoType, ObjectId, RefSet},
};

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique operation identity.
///
/// Two operations over the same payload are distinct: duplicate deliveries of
/// one event produce two operations with different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    /// Allocates the next id.
    pub fn next() -> Self {
        Self(NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Mutation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpKind {
    /// Add an object, possibly holding placeholders.
    Add {
        /// Object to add.
        info: CatalogInfo,
    },
    /// Apply `patch` to an object, or to a placeholder for it.
    Update {
        /// Object to update.
        target: Info,
        /// Changes; values may be placeholders.
        patch: Patch,
    },
    /// Remove an object, or the object a placeholder stands for.
    Remove {
        /// Object to remove.
        target: Info,
    },
    /// Set or clear the default workspace.
    SetDefaultWorkspace {
        /// New default, `None` clears it.
        workspace: Option<Info>,
    },
    /// Set or clear the default namespace.
    SetDefaultNamespace {
        /// New default, `None` clears it.
        namespace: Option<Info>,
    },
    /// Set or clear the default data store of a workspace.
    SetDefaultDataStore {
        /// Workspace whose default changes.
        workspace: Info,
        /// New default, `None` clears it.
        store: Option<Info>,
    },
}

/// Value handed back to the caller of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutput {
    /// The added or updated object; the input object if the operation was deferred.
    Object(Info),
    /// Operations with no result.
    Unit,
}

pub(crate) enum Resolution {
    Output(OpOutput),
    /// The object to remove was found; dependents and the store call are driven
    /// by the enforcer.
    Remove(CatalogInfo),
}

/// A mutation plus its convergence bookkeeping.
#[derive(Debug)]
pub struct ConsistencyOp {
    id: OperationId,
    kind: OpKind,
    success: bool,
    original_missing: Option<RefSet>,
}

impl PartialEq for ConsistencyOp {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConsistencyOp {}

impl ConsistencyOp {
    /// Wraps `kind` under a fresh [`OperationId`].
    pub fn new(kind: OpKind) -> Self {
        Self {
            id: OperationId::next(),
            kind,
            success: false,
            original_missing: None,
        }
    }

    pub fn add(info: CatalogInfo) -> Self {
        Self::new(OpKind::Add { info })
    }

    pub fn update(target: Info, patch: Patch) -> Self {
        Self::new(OpKind::Update { target, patch })
    }

    pub fn remove(target: Info) -> Self {
        Self::new(OpKind::Remove { target })
    }

    pub fn set_default_workspace(workspace: Option<Info>) -> Self {
        Self::new(OpKind::SetDefaultWorkspace { workspace })
    }

    pub fn set_default_namespace(namespace: Option<Info>) -> Self {
        Self::new(OpKind::SetDefaultNamespace { namespace })
    }

    pub fn set_default_data_store(workspace: Info, store: Option<Info>) -> Self {
        Self::new(OpKind::SetDefaultDataStore { workspace, store })
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    pub fn succeeded(&self) -> bool {
        self.success
    }

    /// True if this operation was, at any point, waiting for `id`.
    pub fn depended_on(&self, id: &str) -> bool {
        self.original_missing
            .as_ref()
            .is_some_and(|refs| refs.contains(id))
    }

    pub(crate) fn capture_original_missing(&mut self, pre: &RefSet) {
        if self.original_missing.is_none() {
            self.original_missing = Some(pre.clone());
        }
    }

    pub(crate) fn mark_succeeded(&mut self) {
        self.success = true;
    }

    /// Id of the object whose arrival may unblock operations waiting for it,
    /// for operations that make a new object available.
    pub(crate) fn added_id(&self) -> Option<&str> {
        match &self.kind {
            OpKind::Add { info } if self.success => Some(&info.id),
            _ => None,
        }
    }

    /// Computes the ids this operation is still waiting for.
    ///
    /// Placeholders whose target is already present are rewritten to resolved
    /// references in the payload; the catalog itself is never mutated.
    pub fn missing_refs(&mut self, catalog: &dyn CatalogFacade) -> RefSet {
        if self.success {
            return RefSet::new();
        }
        let resolver = ReferenceResolver::new(catalog);
        match &mut self.kind {
            OpKind::Add { info } => resolver.resolve_info(info),
            OpKind::Update { target, patch } => {
                let mut missing = resolver.resolve_patch(patch);
                missing.extend(missing_target(&resolver, target));
                missing
            }
            OpKind::Remove { target } => missing_target(&resolver, target).into_iter().collect(),
            OpKind::SetDefaultWorkspace { workspace } => workspace
                .as_ref()
                .and_then(|ws| missing_target(&resolver, ws))
                .into_iter()
                .collect(),
            OpKind::SetDefaultNamespace { namespace } => namespace
                .as_ref()
                .and_then(|ns| missing_target(&resolver, ns))
                .into_iter()
                .collect(),
            OpKind::SetDefaultDataStore { workspace, store } => missing_target(&resolver, workspace)
                .into_iter()
                .chain(store.as_ref().and_then(|s| missing_target(&resolver, s)))
                .collect(),
        }
    }

    pub(crate) fn resolve(&mut self, catalog: &dyn CatalogFacade) -> StoreResult<Resolution> {
        let resolver = ReferenceResolver::new(catalog);
        match &mut self.kind {
            OpKind::Add { info } => {
                if resolver.resolve_info(info).is_empty() {
                    if catalog.get_typed(&info.id, info.info_type).is_some() {
                        info!(id = %info.id, "ignoring add, object exists");
                    } else {
                        *info = catalog.add(info.clone())?;
                    }
                    self.success = true;
                }
                // deferred adds still hand back the input object
                Ok(Resolution::Output(OpOutput::Object(Info::Resolved(info.clone()))))
            }
            OpKind::Update { target, patch } => {
                if let Some(found) = catalog.get_typed(target.id(), target.info_type()) {
                    *target = Info::Resolved(found.clone());
                    if resolver.resolve_patch(patch).is_empty() {
                        let updated = catalog.update(&found, patch)?;
                        self.success = true;
                        return Ok(Resolution::Output(OpOutput::Object(Info::Resolved(updated))));
                    }
                }
                Ok(Resolution::Output(OpOutput::Object(target.clone())))
            }
            OpKind::Remove { target } => {
                let found = match target {
                    Info::Resolved(info) => Some(info.clone()),
                    Info::Placeholder(r) => catalog.get_typed(&r.id, r.info_type),
                };
                match found {
                    Some(found) => {
                        *target = Info::Resolved(found.clone());
                        Ok(Resolution::Remove(found))
                    }
                    None => Ok(Resolution::Output(OpOutput::Unit)),
                }
            }
            OpKind::SetDefaultWorkspace { workspace } => {
                match workspace {
                    None => {
                        catalog.set_default_workspace(None)?;
                        self.success = true;
                    }
                    Some(ws) => {
                        if let Some(found) = catalog.get_typed(ws.id(), InfoType::Workspace) {
                            catalog.set_default_workspace(Some(&found))?;
                            *ws = Info::Resolved(found);
                            self.success = true;
                        }
                    }
                }
                Ok(Resolution::Output(OpOutput::Unit))
            }
            OpKind::SetDefaultNamespace { namespace } => {
                match namespace {
                    None => {
                        catalog.set_default_namespace(None)?;
                        self.success = true;
                    }
                    Some(ns) => {
                        if let Some(found) = catalog.get_typed(ns.id(), InfoType::Namespace) {
                            catalog.set_default_namespace(Some(&found))?;
                            *ns = Info::Resolved(found);
                            self.success = true;
                        }
                    }
                }
                Ok(Resolution::Output(OpOutput::Unit))
            }
            OpKind::SetDefaultDataStore { workspace, store } => {
                let Some(ws) = catalog.get_typed(workspace.id(), InfoType::Workspace) else {
                    return Ok(Resolution::Output(OpOutput::Unit));
                };
                *workspace = Info::Resolved(ws.clone());
                match store {
                    None => {
                        catalog.set_default_data_store(&ws, None)?;
                        self.success = true;
                    }
                    Some(s) => {
                        if let Some(found) = catalog.get_typed(s.id(), InfoType::DataStore) {
                            catalog.set_default_data_store(&ws, Some(&found))?;
                            *s = Info::Resolved(found);
                            self.success = true;
                        }
                    }
                }
                Ok(Resolution::Output(OpOutput::Unit))
            }
        }
    }
}

fn missing_target(resolver: &ReferenceResolver<'_>, info: &Info) -> Option<ObjectId> {
    match info {
        Info::Placeholder(r) if !resolver.exists(r) => Some(r.id.clone()),
        _ => None,
    }
}

fn describe(info: Option<&Info>) -> &str {
    info.map_or("none", Info::id)
}

impl fmt::Display for ConsistencyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            OpKind::Add { info } => write!(f, "Add({})", info.id),
            OpKind::Update { target, patch } => {
                write!(f, "Update({}, patch: {:?})", target.id(), patch.property_names())
            }
            OpKind::Remove { target } => write!(f, "Remove({})", target.id()),
            OpKind::SetDefaultWorkspace { workspace } => {
                write!(f, "SetDefaultWorkspace(workspace: {})", describe(workspace.as_ref()))
            }
            OpKind::SetDefaultNamespace { namespace } => {
                write!(f, "SetDefaultNamespace(namespace: {})", describe(namespace.as_ref()))
            }
            OpKind::SetDefaultDataStore { workspace, store } => write!(
                f,
                "SetDefaultDataStore(workspace: {}, store: {})",
                workspace.id(),
                describe(store.as_ref())
            ),
        }
    }
}
