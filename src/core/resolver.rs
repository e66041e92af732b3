//! Forward-reference resolution against a raw catalog.

use crate::{
    info::{CatalogInfo, InfoRef, Patch, Value},
    types::RefSet,
};

use super::facade::CatalogFacade;

/// Walks object graphs and rewrites placeholders whose target is present in
/// the catalog into resolved references.
pub struct ReferenceResolver<'a> {
    catalog: &'a dyn CatalogFacade,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(catalog: &'a dyn CatalogFacade) -> Self {
        Self { catalog }
    }

    /// Resolves placeholders in `info` in place and returns the ids still missing.
    pub fn resolve_info(&self, info: &mut CatalogInfo) -> RefSet {
        let mut missing = RefSet::new();
        for value in info.properties.values_mut() {
            self.resolve_value(value, &mut missing);
        }
        missing
    }

    /// Resolves placeholder values of `patch` in place and returns the ids still missing.
    pub fn resolve_patch(&self, patch: &mut Patch) -> RefSet {
        let mut missing = RefSet::new();
        for value in patch.values_mut() {
            self.resolve_value(value, &mut missing);
        }
        missing
    }

    pub fn resolve_value(&self, value: &mut Value, missing: &mut RefSet) {
        match value {
            Value::Placeholder(r) => {
                if self.exists(r) {
                    let target = r.clone();
                    *value = Value::Ref(target);
                } else {
                    missing.insert(r.id.clone());
                }
            }
            Value::List(items) => {
                for item in items {
                    self.resolve_value(item, missing);
                }
            }
            _ => {}
        }
    }

    pub fn exists(&self, r: &InfoRef) -> bool {
        self.catalog.get_typed(&r.id, r.info_type).is_some()
    }
}
