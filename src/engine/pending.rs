use hashbrown::HashMap;

use crate::{
    op::{ConsistencyOp, OpKind, OperationId},
    types::ObjectId,
};

/// Operations blocked on missing object ids.
///
/// A key is present iff its list is non-empty. Parked operation bodies live
/// in an arena keyed by [`OperationId`] so one operation can wait on several
/// ids at once.
#[derive(Debug, Default)]
pub struct PendingIndex {
    by_ref: HashMap<ObjectId, Vec<OperationId>>,
    parked: HashMap<OperationId, ConsistencyOp>,
}

impl PendingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ref.is_empty()
    }

    pub fn parked_len(&self) -> usize {
        self.parked.len()
    }

    /// Snapshot of the missing ids.
    pub fn keys(&self) -> Vec<ObjectId> {
        self.by_ref.keys().cloned().collect()
    }

    /// Snapshot of the operations waiting for `id`.
    pub fn waiting_on(&self, id: &str) -> Vec<OperationId> {
        self.by_ref.get(id).cloned().unwrap_or_default()
    }

    pub fn is_registered(&self, op: OperationId) -> bool {
        self.by_ref.values().any(|ops| ops.contains(&op))
    }

    pub fn register(&mut self, missing: &str, op: OperationId) {
        let ops = self.by_ref.entry(missing.to_owned()).or_default();
        if !ops.contains(&op) {
            ops.push(op);
        }
    }

    /// Removes `op` from the list for `resolved`, dropping the key once empty.
    pub fn unregister(&mut self, resolved: &str, op: OperationId) -> bool {
        let Some(ops) = self.by_ref.get_mut(resolved) else {
            return false;
        };
        let removed = match ops.iter().position(|o| *o == op) {
            Some(pos) => {
                ops.remove(pos);
                true
            }
            None => false,
        };
        if ops.is_empty() {
            self.by_ref.remove(resolved);
        }
        removed
    }

    /// Removes `op` from every key and drops its parked body. Returns the keys
    /// it was registered under.
    pub fn purge(&mut self, op: OperationId) -> Vec<ObjectId> {
        let mut removed_from = Vec::new();
        self.by_ref.retain(|id, ops| {
            if let Some(pos) = ops.iter().position(|o| *o == op) {
                ops.remove(pos);
                removed_from.push(id.clone());
            }
            !ops.is_empty()
        });
        self.parked.remove(&op);
        removed_from
    }

    pub fn park(&mut self, op: ConsistencyOp) {
        self.parked.insert(op.id(), op);
    }

    /// Takes a parked operation out for execution; its keys stay registered.
    pub fn take(&mut self, op: OperationId) -> Option<ConsistencyOp> {
        self.parked.remove(&op)
    }

    /// True if an add of object `id` is parked.
    pub fn has_parked_add(&self, id: &str) -> bool {
        self.parked
            .values()
            .any(|op| matches!(op.kind(), OpKind::Add { info } if info.id == id))
    }

    /// Parked operations that ever waited for `id`, whether or not they have
    /// since moved on to waiting for something else.
    pub fn dependents_of(&self, id: &str) -> Vec<OperationId> {
        let mut out: Vec<OperationId> = self
            .parked
            .values()
            .filter(|op| op.depended_on(id))
            .map(ConsistencyOp::id)
            .collect();
        for op in self.waiting_on(id) {
            if !out.contains(&op) {
                out.push(op);
            }
        }
        out.sort();
        out
    }

    pub fn clear(&mut self) {
        self.by_ref.clear();
        self.parked.clear();
    }
}
