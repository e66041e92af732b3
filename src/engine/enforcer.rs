use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    core::facade::{CatalogFacade, StoreError, StoreResult},
    info::{CatalogInfo, Info, Patch},
    op::{ConsistencyOp, OpOutput, Resolution},
    types::ObjectId,
};

use super::pending::PendingIndex;

/// Hooks invoked around catalog reloads and shutdown.
pub trait CatalogLifecycle {
    fn on_dispose(&self);
    fn before_reload(&self);
    fn on_reload(&self);
    fn on_reset(&self);
}

struct Outcome {
    output: OpOutput,
    completed: bool,
}

/// Ids made available by completed operations, drained before the lock is released.
type Cascade = VecDeque<ObjectId>;

/// Applies catalog mutations that may reference objects not yet present,
/// deferring them until the references resolve.
///
/// Every public call takes the coordination lock once and runs the whole
/// cascade it triggers before releasing it.
pub struct Enforcer {
    catalog: Arc<dyn CatalogFacade>,
    pending: Mutex<PendingIndex>,
}

impl Enforcer {
    pub fn new(catalog: Arc<dyn CatalogFacade>) -> Self {
        Self {
            catalog,
            pending: Mutex::new(PendingIndex::new()),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogFacade> {
        &self.catalog
    }

    /// Adds `info`, or defers it while it references missing objects.
    ///
    /// Returns the added object, or the input object if deferred.
    pub fn add(&self, info: CatalogInfo) -> StoreResult<CatalogInfo> {
        let echo = info.clone();
        match self.execute(ConsistencyOp::add(info))? {
            OpOutput::Object(info) => Ok(info.into_resolved().unwrap_or(echo)),
            OpOutput::Unit => Ok(echo),
        }
    }

    /// Updates `target`, which may be a placeholder, with `patch`.
    pub fn update(&self, target: impl Into<Info>, patch: Patch) -> StoreResult<Info> {
        let target = target.into();
        let echo = target.clone();
        let out = self.execute(ConsistencyOp::update(target, patch))?;
        Ok(object_or(out, echo))
    }

    pub fn remove(&self, target: impl Into<Info>) -> StoreResult<()> {
        self.execute(ConsistencyOp::remove(target.into())).map(|_| ())
    }

    pub fn set_default_workspace(&self, workspace: Option<Info>) -> StoreResult<()> {
        self.execute(ConsistencyOp::set_default_workspace(workspace)).map(|_| ())
    }

    pub fn set_default_namespace(&self, namespace: Option<Info>) -> StoreResult<()> {
        self.execute(ConsistencyOp::set_default_namespace(namespace)).map(|_| ())
    }

    pub fn set_default_data_store(&self, workspace: Info, store: Option<Info>) -> StoreResult<()> {
        self.execute(ConsistencyOp::set_default_data_store(workspace, store)).map(|_| ())
    }

    /// True when no operation is waiting for anything.
    pub fn is_converged(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Retries every pending operation whose missing reference is now present.
    ///
    /// Operations that fail stay pending; the first failure is returned once
    /// everything runnable has run.
    pub fn force_resolve(&self) -> StoreResult<()> {
        let mut pending = self.pending.lock();
        let mut cascade = Cascade::new();
        match self.resolve_pending(&mut pending, &mut cascade) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// True if an add of `id` is waiting for its references.
    pub fn has_pending_add(&self, id: &str) -> bool {
        self.pending.lock().has_parked_add(id)
    }

    /// Sorted ids pending operations are waiting for.
    pub fn pending_refs(&self) -> Vec<ObjectId> {
        let mut refs = self.pending.lock().keys();
        refs.sort();
        refs
    }

    /// Number of parked operations.
    pub fn pending_operations(&self) -> usize {
        self.pending.lock().parked_len()
    }

    fn execute(&self, op: ConsistencyOp) -> StoreResult<OpOutput> {
        let mut pending = self.pending.lock();
        let mut cascade = Cascade::new();
        let outcome = self.run(&mut pending, op, &mut cascade)?;
        if let Some(err) = self.drain(&mut pending, &mut cascade) {
            debug!(error = %err, "dependent operation failed and stays pending");
        }
        Ok(outcome.output)
    }

    fn run(&self, pending: &mut PendingIndex, mut op: ConsistencyOp, cascade: &mut Cascade) -> StoreResult<Outcome> {
        let pre = op.missing_refs(self.catalog.as_ref());
        op.capture_original_missing(&pre);
        if !pre.is_empty() {
            debug!(op = %op, missing = ?pre, "operation is missing refs");
        }

        let output = match self.resolve(pending, &mut op, cascade) {
            Ok(output) => output,
            Err(err) => {
                error!(op = %op, error = %err, "error executing operation");
                if pending.is_registered(op.id()) {
                    pending.park(op);
                }
                return Err(err);
            }
        };

        if op.succeeded() {
            for missing in &pre {
                pending.unregister(missing, op.id());
            }
            // may have been registered under refs other than `pre`
            let stale = pending.purge(op.id());
            if !stale.is_empty() {
                debug!(op = %op, refs = ?stale, "purged completed operation from pending refs");
            }
            if let Some(id) = op.added_id() {
                cascade.push_back(id.to_owned());
            }
            return Ok(Outcome {
                output,
                completed: true,
            });
        }

        let post = op.missing_refs(self.catalog.as_ref());
        // placeholders resolved on an earlier run are no longer in `pre`
        for resolved in pending.purge(op.id()).into_iter().filter(|id| !post.contains(id)) {
            debug!(op = %op, resolved = %resolved, "missing ref resolved, operation still pending");
        }

        if post.is_empty() {
            pending.purge(op.id());
            warn!(op = %op, "operation did not complete and waits for nothing, dropping it");
        } else {
            for missing in &post {
                pending.register(missing, op.id());
            }
            debug!(op = %op, missing = ?post, "deferring operation");
            pending.park(op);
        }

        Ok(Outcome {
            output,
            completed: false,
        })
    }

    fn resolve(&self, pending: &mut PendingIndex, op: &mut ConsistencyOp, cascade: &mut Cascade) -> StoreResult<OpOutput> {
        match op.resolve(self.catalog.as_ref())? {
            Resolution::Output(output) => Ok(output),
            Resolution::Remove(info) => {
                self.remove_and_settle(pending, op, &info, cascade)?;
                Ok(OpOutput::Unit)
            }
        }
    }

    /// Removes `info`, then gives each operation that ever depended on it one
    /// last attempt, discarding those that still cannot complete.
    ///
    /// Dependents run only after the object is gone so none of them can
    /// complete against it.
    fn remove_and_settle(
        &self,
        pending: &mut PendingIndex,
        op: &mut ConsistencyOp,
        info: &CatalogInfo,
        cascade: &mut Cascade,
    ) -> StoreResult<()> {
        let dependents: Vec<_> = pending
            .dependents_of(&info.id)
            .into_iter()
            .filter(|dep| *dep != op.id())
            .collect();

        self.catalog.remove(info)?;
        op.mark_succeeded();

        for dep_id in dependents {
            let Some(dependent) = pending.take(dep_id) else {
                continue;
            };
            let name = dependent.to_string();
            let completed = match self.run(pending, dependent, cascade) {
                Ok(outcome) => outcome.completed,
                Err(err) => {
                    warn!(op = %name, id = %info.id, error = %err, "dependent operation failed after removal");
                    false
                }
            };
            if completed {
                debug!(op = %name, id = %info.id, "executed dependent operation after removal");
            } else {
                pending.purge(dep_id);
                warn!(
                    op = %name,
                    id = %info.id,
                    "operation depending on removed object can no longer complete, discarding it"
                );
            }
        }
        Ok(())
    }

    fn resolve_pending(&self, pending: &mut PendingIndex, cascade: &mut Cascade) -> Option<StoreError> {
        for missing in pending.keys() {
            if self.catalog.get(&missing).is_some() {
                debug!(id = %missing, "previously missing ref found, resolving operations waiting for it");
                cascade.push_back(missing);
            } else {
                debug!(id = %missing, waiting = pending.waiting_on(&missing).len(), "missing ref still not found");
            }
        }
        self.drain(pending, cascade)
    }

    /// Runs every operation waiting on a resolved id until the cascade is
    /// empty. A failing operation stays parked and does not stop its siblings;
    /// the first failure is returned.
    fn drain(&self, pending: &mut PendingIndex, cascade: &mut Cascade) -> Option<StoreError> {
        let mut first_error = None;
        while let Some(resolved) = cascade.pop_front() {
            for op_id in pending.waiting_on(&resolved) {
                let Some(op) = pending.take(op_id) else {
                    continue;
                };
                debug!(id = %resolved, op = %op, "converging operation for resolved ref");
                if let Err(err) = self.run(pending, op, cascade) {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error
    }

    fn discard_all(&self, reason: &str) {
        let mut pending = self.pending.lock();
        let discarded = pending.parked_len();
        pending.clear();
        if discarded > 0 {
            info!(discarded, reason, "discarded pending catalog operations");
        }
    }
}

fn object_or(out: OpOutput, echo: Info) -> Info {
    match out {
        OpOutput::Object(info) => info,
        OpOutput::Unit => echo,
    }
}

impl CatalogLifecycle for Enforcer {
    fn on_dispose(&self) {
        self.discard_all("dispose");
    }

    fn before_reload(&self) {
        self.discard_all("reload");
    }

    fn on_reload(&self) {}

    fn on_reset(&self) {}
}
