//! Reconciles streamed markup fragments into a live tree.
//!
//! ```text
//! markup ──parse──▶ Node ──diff vs registry──▶ Edit script ──queue──▶ live tree
//! ```

mod config;
mod reconciler;
mod registry;

pub use crate::config::{ConfigError, ReconcilerConfig};
pub use crate::reconciler::Reconciler;
pub use crate::registry::{NodeRegistry, RegistryEntry};

pub use core_types::{FragmentId, HandleAllocator, LiveHandle};
pub use live_dom::{LiveTree, SharedTree, shared};
pub use markup::{Edit, EditKind, MalformedFragmentError, Node};
pub use runtime_patch::{ApplyWarning, Diagnostics, Drained, PatchApplier};
