use core_types::LiveHandle;
use live_dom::{LiveTreeError, MaterializeError};
use markup::EditKind;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// Why an edit was skipped while draining. Skipped edits never stop the drain.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApplyWarning {
    #[error("{kind} addresses {handle}, which no longer resolves")]
    UnresolvableAddress { kind: EditKind, handle: LiveHandle },
    #[error("{kind} payload could not be materialized: {error}")]
    Materialization {
        kind: EditKind,
        #[source]
        error: MaterializeError,
    },
    #[error("{kind} index {index} is out of range for {parent} with {len} children")]
    OutOfRange {
        kind: EditKind,
        parent: LiveHandle,
        index: usize,
        len: usize,
    },
    #[error("{kind} rejected by the live tree: {error}")]
    Rejected {
        kind: EditKind,
        #[source]
        error: LiveTreeError,
    },
}

impl ApplyWarning {
    pub fn kind(&self) -> EditKind {
        match self {
            Self::UnresolvableAddress { kind, .. }
            | Self::Materialization { kind, .. }
            | Self::OutOfRange { kind, .. }
            | Self::Rejected { kind, .. } => *kind,
        }
    }
}

pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 256;

#[derive(Debug)]
struct Ring {
    warnings: VecDeque<ApplyWarning>,
    capacity: usize,
    total: u64,
}

/// Bounded record of skipped edits, newest kept. Clones share the record.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    ring: Arc<Mutex<Ring>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_DIAGNOSTICS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Arc::new(Mutex::new(Ring {
                warnings: VecDeque::with_capacity(capacity),
                capacity,
                total: 0,
            })),
        }
    }

    pub fn record(&self, warning: ApplyWarning) {
        log::warn!(target: "runtime_patch", "skipped edit: {warning}");
        let mut ring = self.ring.lock();
        if ring.warnings.len() == ring.capacity {
            ring.warnings.pop_front();
        }
        ring.warnings.push_back(warning);
        ring.total += 1;
    }

    /// Retained warnings, oldest first.
    pub fn snapshot(&self) -> Vec<ApplyWarning> {
        self.ring.lock().warnings.iter().cloned().collect()
    }

    pub fn take(&self) -> Vec<ApplyWarning> {
        self.ring.lock().warnings.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().warnings.is_empty()
    }

    /// Warnings recorded since creation, including evicted ones.
    pub fn total(&self) -> u64 {
        self.ring.lock().total
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
