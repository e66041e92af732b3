//! Remote catalog events and the notifications the listener broadcasts.

use serde::{Deserialize, Serialize};

use crate::{
    info::{CatalogInfo, Patch},
    types::{InfoType, ObjectId},
};

/// Catalog change published by some node of the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CatalogEvent {
    /// A new object, carried whole.
    Added { object: CatalogInfo },
    /// Changes applied to an existing object.
    Modified {
        object_id: ObjectId,
        object_type: InfoType,
        patch: Patch,
    },
    Removed {
        object_id: ObjectId,
        object_type: InfoType,
    },
    DefaultWorkspaceSet {
        #[serde(default)]
        workspace_id: Option<ObjectId>,
    },
    DefaultNamespaceSet {
        #[serde(default)]
        namespace_id: Option<ObjectId>,
    },
    DefaultDataStoreSet {
        workspace_id: ObjectId,
        #[serde(default)]
        data_store_id: Option<ObjectId>,
    },
}

impl CatalogEvent {
    /// Id of the object the event is about, if any.
    pub fn object_id(&self) -> Option<&str> {
        match self {
            Self::Added { object } => Some(&object.id),
            Self::Modified { object_id, .. } | Self::Removed { object_id, .. } => Some(object_id),
            Self::DefaultWorkspaceSet { workspace_id } => workspace_id.as_deref(),
            Self::DefaultNamespaceSet { namespace_id } => namespace_id.as_deref(),
            Self::DefaultDataStoreSet { workspace_id, .. } => Some(workspace_id),
        }
    }

    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Added { .. } => "Added",
            Self::Modified { .. } => "Modified",
            Self::Removed { .. } => "Removed",
            Self::DefaultWorkspaceSet { .. } => "DefaultWorkspaceSet",
            Self::DefaultNamespaceSet { .. } => "DefaultNamespaceSet",
            Self::DefaultDataStoreSet { .. } => "DefaultDataStoreSet",
        }
    }
}

/// A [`CatalogEvent`] plus the node it originated on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub origin: String,
    pub event: CatalogEvent,
}

impl RemoteEvent {
    pub fn new(origin: impl Into<String>, event: CatalogEvent) -> Self {
        Self {
            origin: origin.into(),
            event,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Notifications emitted by the event listener loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorEvent {
    /// A remote event was handed to the catalog, applied or deferred.
    Applied {
        event: &'static str,
        object_id: Option<ObjectId>,
        /// True when operations are still waiting for missing objects afterwards.
        pending: bool,
    },
    /// Handling a remote event failed.
    Failed {
        event: &'static str,
        object_id: Option<ObjectId>,
        error: String,
    },
    /// Every pending operation has completed or been discarded.
    Converged,
}
