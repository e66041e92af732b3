use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::{
    core::facade::{CatalogFacade, StoreResult},
    facade::RetryingFacade,
    info::Info,
    observability::remote_event_span,
    types::InfoType,
};

use super::events::{CatalogEvent, RemoteEvent};

/// Applies catalog events published by other nodes to the local catalog.
///
/// Ids carried by events are turned into placeholders when the object is not
/// present locally but its add is pending, so the enforcer defers the change
/// until it arrives. Changes to objects that are neither present nor pending
/// are stale redeliveries and are dropped.
pub struct RemoteEventProcessor {
    local_node: String,
    facade: Arc<RetryingFacade>,
}

impl RemoteEventProcessor {
    pub fn new(local_node: impl Into<String>, facade: Arc<RetryingFacade>) -> Self {
        Self {
            local_node: local_node.into(),
            facade,
        }
    }

    pub fn local_node(&self) -> &str {
        &self.local_node
    }

    pub fn facade(&self) -> &Arc<RetryingFacade> {
        &self.facade
    }

    /// Handles one event. Returns `Ok(false)` for events published by this node.
    pub fn process(&self, remote: RemoteEvent) -> StoreResult<bool> {
        if remote.origin == self.local_node {
            return Ok(false);
        }
        let _span = remote_event_span(remote.event.name(), &remote.origin).entered();
        debug!(id = ?remote.event.object_id(), "handling remote event");

        match remote.event {
            CatalogEvent::Added { object } => {
                self.facade.add(object)?;
            }
            CatalogEvent::Modified {
                object_id,
                object_type,
                patch,
            } => {
                if patch.is_empty() {
                    error!(id = %object_id, "remote modify event carries no changes");
                    return Ok(true);
                }
                let Some(target) = self.change_target(&object_id, object_type) else {
                    warn!(id = %object_id, ?object_type, "modified object not found locally, ignoring event");
                    return Ok(true);
                };
                self.facade.update(target, patch)?;
            }
            CatalogEvent::Removed {
                object_id,
                object_type,
            } => {
                let Some(target) = self.change_target(&object_id, object_type) else {
                    warn!(id = %object_id, ?object_type, "removed object not found locally, ignoring event");
                    return Ok(true);
                };
                self.facade.remove(target)?;
            }
            CatalogEvent::DefaultWorkspaceSet { workspace_id } => {
                let workspace = workspace_id.map(|id| Info::placeholder(id, InfoType::Workspace));
                self.facade.set_default_workspace(workspace)?;
            }
            CatalogEvent::DefaultNamespaceSet { namespace_id } => {
                let namespace = namespace_id.map(|id| Info::placeholder(id, InfoType::Namespace));
                self.facade.set_default_namespace(namespace)?;
            }
            CatalogEvent::DefaultDataStoreSet {
                workspace_id,
                data_store_id,
            } => {
                let workspace = Info::placeholder(workspace_id, InfoType::Workspace);
                let store = data_store_id.map(|id| Info::placeholder(id, InfoType::DataStore));
                self.facade.set_default_data_store(workspace, store)?;
            }
        }
        Ok(true)
    }

    // goes to the raw catalog so event handling never waits on retries
    fn change_target(&self, id: &str, info_type: InfoType) -> Option<Info> {
        let enforcer = self.facade.enforcer();
        if let Some(found) = enforcer.catalog().get_typed(id, info_type) {
            return Some(Info::Resolved(found));
        }
        if enforcer.has_pending_add(id) {
            debug!(id, ?info_type, "object add is pending, deferring");
            return Some(Info::placeholder(id, info_type));
        }
        None
    }
}
