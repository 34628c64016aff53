//! Outstanding-dispatch bookkeeping keyed by correlation id.

use std::collections::HashMap;

use crate::types::{DispatchId, RequestHandle};

use super::PipelineError;

/// Record held for one in-flight evaluation, created on successful dispatch
/// and destroyed exactly once when the matching result arrives or the run
/// winds down.
#[derive(Clone, Copy, Debug)]
pub struct PendingRequest {
    pub handle: RequestHandle,
}

/// Map from dispatch id to pending request. Owns the uniqueness and
/// capacity invariants: an insert that would duplicate an id or push the
/// table past the pipeline depth is a coordinator bug and fails loudly.
pub struct CorrelationTable {
    pending: HashMap<DispatchId, PendingRequest>,
    capacity: usize,
}

impl CorrelationTable {
    pub fn new(capacity: usize) -> Self {
        CorrelationTable {
            pending: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn insert(&mut self, id: DispatchId, request: PendingRequest) -> Result<(), PipelineError> {
        if self.pending.contains_key(&id) {
            return Err(PipelineError::DuplicateDispatch { id });
        }
        if self.pending.len() >= self.capacity {
            return Err(PipelineError::CapacityInvariant {
                in_flight: self.pending.len() + 1,
                depth: self.capacity,
            });
        }
        self.pending.insert(id, request);
        Ok(())
    }

    pub fn remove(&mut self, id: DispatchId) -> Option<PendingRequest> {
        self.pending.remove(&id)
    }

    pub fn contains(&self, id: DispatchId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Empty the table, yielding the remaining entries ordered by dispatch
    /// id so wind-down reports are deterministic.
    pub fn take_all(&mut self) -> Vec<(DispatchId, PendingRequest)> {
        let mut entries: Vec<_> = self.pending.drain().collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}
