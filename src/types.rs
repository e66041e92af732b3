//! Shared primitive IDs and catalog object kinds.

use serde::{Deserialize, Serialize};

/// Opaque catalog object identifier.
pub type ObjectId = String;

/// Set of object ids an operation is waiting for.
pub type RefSet = hashbrown::HashSet<ObjectId>;

/// Catalog object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InfoType {
    /// Workspace grouping stores, styles and layer groups.
    Workspace,
    /// Namespace bound to a workspace, identified by prefix and URI.
    Namespace,
    /// Vector data store.
    DataStore,
    /// Raster coverage store.
    CoverageStore,
    /// Vector resource published from a data store.
    FeatureType,
    /// Raster resource published from a coverage store.
    Coverage,
    /// Published layer over a resource.
    Layer,
    /// Group of layers.
    LayerGroup,
    /// Rendering style.
    Style,
    /// Map definition.
    Map,
}

impl InfoType {
    /// Property holding the lookup name for this kind.
    pub fn name_property(self) -> &'static str {
        match self {
            Self::Namespace => "prefix",
            _ => "name",
        }
    }

    /// Property holding the reference to the owning workspace or namespace, if
    /// names of this kind are scoped.
    pub fn scope_property(self) -> Option<&'static str> {
        match self {
            Self::DataStore | Self::CoverageStore | Self::LayerGroup | Self::Style => {
                Some("workspace")
            }
            Self::FeatureType | Self::Coverage => Some("namespace"),
            Self::Workspace | Self::Namespace | Self::Layer | Self::Map => None,
        }
    }
}
