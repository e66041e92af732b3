use hashbrown::HashMap;

use crate::{
    info::{CatalogInfo, Value},
    types::{InfoType, ObjectId},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameKey {
    pub info_type: InfoType,
    pub scope: Option<ObjectId>,
    pub name: String,
}

impl NameKey {
    pub fn new(info_type: InfoType, scope: Option<&str>, name: &str) -> Self {
        Self {
            info_type,
            scope: scope.map(str::to_owned),
            name: name.to_owned(),
        }
    }

    /// Index key for `info`, or `None` if it has no name.
    pub fn of(info: &CatalogInfo) -> Option<Self> {
        let name = info.name()?;
        let scope = info
            .info_type
            .scope_property()
            .and_then(|prop| info.property(prop))
            .and_then(Value::as_ref_target)
            .map(|r| r.id.as_str());
        Some(Self::new(info.info_type, scope, name))
    }
}

pub type NameIndex = HashMap<NameKey, ObjectId>;
