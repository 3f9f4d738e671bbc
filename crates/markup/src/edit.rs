//! Edit script protocol between the differ and the patch applier.
//!
//! Invariants:
//! - Edits are applied in order; a script is only meaningful against the live
//!   tree state produced by the edits before it.
//! - `target` and `parent` are live handles captured at diff time. They are
//!   dereferenced at apply time and may have stopped resolving.
//! - `Insert` and `Replace` payloads are handle-bound: every payload node
//!   carries the handle it will have once materialized.
//! - `Reorder` indices refer to the parent's child list as it is when the edit
//!   is applied.
//! - Element and attribute names are canonical ASCII-lowercase.

use crate::types::Node;
use core_types::LiveHandle;
use std::fmt;
use std::sync::Arc;

/// Slot within a parent's child list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Index(usize),
    /// After the last child.
    Append,
}

/// One attribute transition. `None` means absent on that side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: Arc<str>,
    pub old: Option<String>,
    pub new: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    Insert {
        parent: LiveHandle,
        at: Position,
        node: Node,
    },
    /// All attribute changes of one element.
    Update {
        target: LiveHandle,
        changes: Vec<AttributeChange>,
    },
    /// Detach and drop a subtree.
    Remove { target: LiveHandle },
    /// Move the child at `from` so that it ends up at `to`.
    Reorder {
        parent: LiveHandle,
        from: usize,
        to: usize,
    },
    Replace { target: LiveHandle, node: Node },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditKind {
    Insert,
    Update,
    Remove,
    Reorder,
    Replace,
}

impl Edit {
    pub fn kind(&self) -> EditKind {
        match self {
            Edit::Insert { .. } => EditKind::Insert,
            Edit::Update { .. } => EditKind::Update,
            Edit::Remove { .. } => EditKind::Remove,
            Edit::Reorder { .. } => EditKind::Reorder,
            Edit::Replace { .. } => EditKind::Replace,
        }
    }

    /// The live node this edit dereferences first.
    pub fn address(&self) -> LiveHandle {
        match self {
            Edit::Insert { parent, .. } | Edit::Reorder { parent, .. } => *parent,
            Edit::Update { target, .. }
            | Edit::Remove { target }
            | Edit::Replace { target, .. } => *target,
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditKind::Insert => "insert",
            EditKind::Update => "update",
            EditKind::Remove => "remove",
            EditKind::Reorder => "reorder",
            EditKind::Replace => "replace",
        };
        f.write_str(name)
    }
}
