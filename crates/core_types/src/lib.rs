use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Opaque identity of a node in a live tree.
///
/// Handles are issued by a [`HandleAllocator`] and never reissued, so a handle
/// whose node was removed simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LiveHandle(pub u32);

impl LiveHandle {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: LiveHandle = LiveHandle(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for LiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic handle source shared between a live tree and whoever computes
/// edits against it. Clones share the same counter.
#[derive(Clone, Debug)]
pub struct HandleAllocator {
    next: Arc<AtomicU32>,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Allocator whose first handle is `first` (clamped to be non-zero).
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: Arc::new(AtomicU32::new(first.max(1))),
        }
    }

    /// Allocator issuing handles strictly above `last`.
    pub fn after(last: Option<LiveHandle>) -> Self {
        Self::starting_at(last.map_or(1, |h| h.0.saturating_add(1)))
    }

    pub fn next(&self) -> LiveHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        debug_assert!(id != u32::MAX, "live handle space exhausted");
        LiveHandle(id)
    }

    /// The handle the next call to [`HandleAllocator::next`] would return.
    pub fn peek(&self) -> LiveHandle {
        LiveHandle(self.next.load(Ordering::Relaxed))
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-owned identity of a rendered fragment (a scene, a panel, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(Arc<str>);

impl FragmentId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FragmentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FragmentId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
