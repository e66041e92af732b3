//! Catalog object model, forward-reference placeholders, and patches.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{InfoType, ObjectId};

/// Identity of a catalog object: its id plus kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfoRef {
    /// Referenced object id.
    pub id: ObjectId,
    /// Referenced object kind.
    pub info_type: InfoType,
}

impl InfoRef {
    /// Builds a reference to `id` of kind `info_type`.
    pub fn new(id: impl Into<ObjectId>, info_type: InfoType) -> Self {
        Self {
            id: id.into(),
            info_type,
        }
    }
}

impl fmt::Display for InfoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.info_type, self.id)
    }
}

/// Property value of a catalog object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
    /// Reference to an object present in the local catalog.
    Ref(InfoRef),
    /// Forward reference to an object that may not have arrived locally yet.
    Placeholder(InfoRef),
    /// Ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// Text value shorthand.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Placeholder value shorthand.
    pub fn placeholder(id: impl Into<ObjectId>, info_type: InfoType) -> Self {
        Self::Placeholder(InfoRef::new(id, info_type))
    }

    /// Resolved reference shorthand.
    pub fn reference(id: impl Into<ObjectId>, info_type: InfoType) -> Self {
        Self::Ref(InfoRef::new(id, info_type))
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the target of a reference or placeholder.
    pub fn as_ref_target(&self) -> Option<&InfoRef> {
        match self {
            Self::Ref(r) | Self::Placeholder(r) => Some(r),
            _ => None,
        }
    }

    /// True when this value, or any nested list element, is a placeholder.
    pub fn has_placeholder(&self) -> bool {
        match self {
            Self::Placeholder(_) => true,
            Self::List(items) => items.iter().any(Value::has_placeholder),
            _ => false,
        }
    }
}

/// Fully materialized catalog object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogInfo {
    /// Stable object id.
    pub id: ObjectId,
    /// Object kind.
    pub info_type: InfoType,
    /// Named properties; references to other objects are [`Value::Ref`] or
    /// [`Value::Placeholder`].
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl CatalogInfo {
    /// Creates an object with no properties.
    pub fn new(id: impl Into<ObjectId>, info_type: InfoType) -> Self {
        Self {
            id: id.into(),
            info_type,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Returns a property value.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Sets a property value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.properties.insert(name.into(), value)
    }

    /// Lookup name of this object (`prefix` for namespaces, `name` otherwise).
    pub fn name(&self) -> Option<&str> {
        self.property(self.info_type.name_property())
            .and_then(Value::as_text)
    }

    /// True when any property holds a placeholder.
    pub fn has_placeholders(&self) -> bool {
        self.properties.values().any(Value::has_placeholder)
    }
}

/// A catalog object or a placeholder standing in for one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Info {
    /// Real object.
    Resolved(CatalogInfo),
    /// Forward reference carrying only id and kind.
    Placeholder(InfoRef),
}

impl Info {
    /// Placeholder shorthand.
    pub fn placeholder(id: impl Into<ObjectId>, info_type: InfoType) -> Self {
        Self::Placeholder(InfoRef::new(id, info_type))
    }

    /// Object id.
    pub fn id(&self) -> &str {
        match self {
            Self::Resolved(info) => &info.id,
            Self::Placeholder(r) => &r.id,
        }
    }

    /// Object kind.
    pub fn info_type(&self) -> InfoType {
        match self {
            Self::Resolved(info) => info.info_type,
            Self::Placeholder(r) => r.info_type,
        }
    }

    /// True for placeholders.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Consumes `self`, returning the real object if resolved.
    pub fn into_resolved(self) -> Option<CatalogInfo> {
        match self {
            Self::Resolved(info) => Some(info),
            Self::Placeholder(_) => None,
        }
    }
}

impl From<CatalogInfo> for Info {
    fn from(value: CatalogInfo) -> Self {
        Self::Resolved(value)
    }
}

impl From<InfoRef> for Info {
    fn from(value: InfoRef) -> Self {
        Self::Placeholder(value)
    }
}

/// Ordered property changes describing an update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Patch {
    changes: Vec<(String, Value)>,
}

impl Patch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style change.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.add(name, value);
        self
    }

    /// Appends a change, replacing an earlier change to the same property.
    pub fn add(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.changes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.changes.push((name, value)),
        }
    }

    /// Returns true when no changes are set.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changed property names in order.
    pub fn property_names(&self) -> Vec<&str> {
        self.changes.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Iterates changes in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.changes.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterates change values mutably, used to rewrite placeholders in place.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.changes.iter_mut().map(|(_, v)| v)
    }

    /// Applies this patch in place to `info`. `Null` removes the property.
    pub fn apply_to(&self, info: &mut CatalogInfo) {
        for (name, value) in &self.changes {
            if *value == Value::Null {
                info.properties.remove(name);
            } else {
                info.properties.insert(name.clone(), value.clone());
            }
        }
    }
}
