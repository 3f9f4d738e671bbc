//! Deterministic tree diffing to edit scripts.
//!
//! Contract:
//! - `old` is handle-bound; nodes are addressed through those handles.
//! - Inputs are never mutated. The next tree is built as a new value and
//!   carries the handle every node will have once the script is applied.
//! - Output ordering is deterministic: root first, an element's `Update`
//!   before its children, children in new-tree order.
//! - Keyed child lists emit removals first (old order), then moves and inserts
//!   walking the new order. Children on the longest run that already keeps its
//!   relative order are never moved.
//! - Different tags, kinds, identity keys or text at a matched pair produce a
//!   single `Replace` and no recursion.
//!
//! Complexity: O(n) in the number of nodes for positional lists; a keyed list
//! of k siblings adds O(k log k) for the stable run plus O(k) per move.

use crate::edit::{AttributeChange, Edit, Position};
use crate::traverse::{max_handle, rebind};
use crate::types::{Attributes, Node};
use core_types::{HandleAllocator, LiveHandle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildMatching {
    /// Keyed when any child on either side carries a key, positional otherwise.
    #[default]
    Auto,
    Positional,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub child_matching: ChildMatching,
    /// Element depth past which a differing subtree is replaced whole.
    pub max_depth: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            child_matching: ChildMatching::Auto,
            max_depth: 256,
        }
    }
}

/// An edit script plus the tree the live tree will mirror once it is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub edits: Vec<Edit>,
    pub next: Node,
}

/// Diff with default options and fresh handles issued just above `old`'s
/// largest handle.
pub fn diff(old: &Node, new: &Node) -> Vec<Edit> {
    let handles = HandleAllocator::after(max_handle(old));
    diff_with(old, new, &handles, &DiffOptions::default()).edits
}

pub fn diff_with(
    old: &Node,
    new: &Node,
    handles: &HandleAllocator,
    options: &DiffOptions,
) -> Reconciliation {
    let mut differ = Differ {
        handles,
        options,
        edits: Vec::new(),
    };
    let next = differ.node(old, new, 0);
    log::debug!(
        target: "markup::diff",
        "diff of {:?} produced {} edits",
        old.handle(),
        differ.edits.len()
    );
    Reconciliation {
        edits: differ.edits,
        next,
    }
}

struct Differ<'a> {
    handles: &'a HandleAllocator,
    options: &'a DiffOptions,
    edits: Vec<Edit>,
}

impl Differ<'_> {
    fn node(&mut self, old: &Node, new: &Node, depth: usize) -> Node {
        match (old, new) {
            (Node::Text { handle, text }, Node::Text { text: new_text, .. }) if text == new_text => {
                Node::Text {
                    handle: *handle,
                    text: text.clone(),
                }
            }
            (
                Node::Element {
                    handle,
                    name,
                    key,
                    attributes,
                    children,
                },
                Node::Element {
                    name: new_name,
                    key: new_key,
                    attributes: new_attributes,
                    children: new_children,
                    ..
                },
            ) if name == new_name && key == new_key => {
                if depth >= self.options.max_depth {
                    if old.same_content(new) {
                        return old.clone();
                    }
                    return self.replace(old, new);
                }
                let target = address(*handle);
                let changes = attribute_changes(attributes, new_attributes);
                if !changes.is_empty() {
                    self.edits.push(Edit::Update { target, changes });
                }
                let children = self.children(target, children, new_children, depth + 1);
                Node::Element {
                    handle: *handle,
                    name: Arc::clone(name),
                    key: key.clone(),
                    attributes: new_attributes.clone(),
                    children,
                }
            }
            _ => self.replace(old, new),
        }
    }

    fn replace(&mut self, old: &Node, new: &Node) -> Node {
        let payload = rebind(new, self.handles);
        self.edits.push(Edit::Replace {
            target: address(old.handle()),
            node: payload.clone(),
        });
        payload
    }

    fn children(
        &mut self,
        parent: LiveHandle,
        old: &[Node],
        new: &[Node],
        depth: usize,
    ) -> Vec<Node> {
        let keyed = match self.options.child_matching {
            ChildMatching::Positional => false,
            ChildMatching::Auto => old.iter().chain(new).any(|child| child.key().is_some()),
        };
        if keyed {
            if let (Some(old_keys), Some(new_keys)) = (sibling_keys(old), sibling_keys(new)) {
                return self.keyed_children(parent, old, new, &old_keys, &new_keys, depth);
            }
            log::warn!(
                target: "markup::diff",
                "duplicate sibling keys under {parent}, matching children by position"
            );
        }
        self.positional_children(parent, old, new, depth)
    }

    fn keyed_children<'k>(
        &mut self,
        parent: LiveHandle,
        old: &[Node],
        new: &[Node],
        old_keys: &[SiblingKey<'k>],
        new_keys: &[SiblingKey<'k>],
        depth: usize,
    ) -> Vec<Node> {
        let wanted: HashSet<SiblingKey<'k>> = new_keys.iter().copied().collect();
        let mut survivors: HashMap<SiblingKey<'k>, (usize, &Node)> =
            HashMap::with_capacity(old.len());
        // Live child order as the edits emitted so far leave it.
        let mut working: Vec<SiblingKey<'k>> = Vec::with_capacity(old.len().max(new.len()));

        for (child, key) in old.iter().zip(old_keys) {
            if wanted.contains(key) {
                survivors.insert(*key, (working.len(), child));
                working.push(*key);
            } else {
                self.edits.push(Edit::Remove {
                    target: address(child.handle()),
                });
            }
        }

        // Survivors on the longest run that keeps its relative order stay put;
        // everything else is moved next to its new predecessor.
        let matched: Vec<(usize, usize)> = new_keys
            .iter()
            .enumerate()
            .filter_map(|(index, key)| survivors.get(key).map(|&(from, _)| (index, from)))
            .collect();
        let mut stable = vec![false; new.len()];
        let order: Vec<usize> = matched.iter().map(|&(_, from)| from).collect();
        for run_index in longest_increasing_run(&order) {
            stable[matched[run_index].0] = true;
        }

        let mut next = Vec::with_capacity(new.len());
        for (index, (child, key)) in new.iter().zip(new_keys).enumerate() {
            match survivors.get(key) {
                Some(&(_, previous)) => {
                    let moving = (!stable[index])
                        .then(|| working.iter().position(|candidate| candidate == key))
                        .flatten();
                    if let Some(from) = moving {
                        working.remove(from);
                        let to = slot_after_predecessor(&working, new_keys, index);
                        working.insert(to, *key);
                        if from != to {
                            self.edits.push(Edit::Reorder { parent, from, to });
                        }
                    }
                    next.push(self.node(previous, child, depth));
                }
                None => {
                    let to = slot_after_predecessor(&working, new_keys, index);
                    let at = if to == working.len() {
                        Position::Append
                    } else {
                        Position::Index(to)
                    };
                    working.insert(to, *key);
                    let payload = rebind(child, self.handles);
                    self.edits.push(Edit::Insert {
                        parent,
                        at,
                        node: payload.clone(),
                    });
                    next.push(payload);
                }
            }
        }
        next
    }

    fn positional_children(
        &mut self,
        parent: LiveHandle,
        old: &[Node],
        new: &[Node],
        depth: usize,
    ) -> Vec<Node> {
        let mut next = Vec::with_capacity(new.len());
        for (index, child) in new.iter().enumerate() {
            match old.get(index) {
                Some(previous) => next.push(self.node(previous, child, depth)),
                None => {
                    let payload = rebind(child, self.handles);
                    self.edits.push(Edit::Insert {
                        parent,
                        at: Position::Append,
                        node: payload.clone(),
                    });
                    next.push(payload);
                }
            }
        }
        for stale in old.iter().skip(new.len()) {
            self.edits.push(Edit::Remove {
                target: address(stale.handle()),
            });
        }
        next
    }
}

/// Index right after the new-order predecessor of `new_keys[index]`.
fn slot_after_predecessor(
    working: &[SiblingKey<'_>],
    new_keys: &[SiblingKey<'_>],
    index: usize,
) -> usize {
    index
        .checked_sub(1)
        .and_then(|previous| {
            working
                .iter()
                .position(|candidate| *candidate == new_keys[previous])
        })
        .map_or(0, |position| position + 1)
}

/// Positions in `sequence` of one longest strictly increasing subsequence.
fn longest_increasing_run(sequence: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; sequence.len()];
    for (i, &value) in sequence.iter().enumerate() {
        let slot = tails.partition_point(|&tail| sequence[tail] < value);
        if slot > 0 {
            previous[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }
    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.push(i);
        cursor = previous[i];
    }
    run.reverse();
    run
}

/// Identity of a child among its siblings. Unkeyed children are identified by
/// their ordinal among the unkeyed ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum SiblingKey<'a> {
    Explicit(&'a str),
    Ordinal(usize),
}

/// `None` when two siblings share a key.
fn sibling_keys(children: &[Node]) -> Option<Vec<SiblingKey<'_>>> {
    let mut seen = HashSet::with_capacity(children.len());
    let mut keys = Vec::with_capacity(children.len());
    let mut ordinal = 0;
    for child in children {
        let key = match child.key() {
            Some(key) => SiblingKey::Explicit(key),
            None => {
                ordinal += 1;
                SiblingKey::Ordinal(ordinal - 1)
            }
        };
        if !seen.insert(key) {
            return None;
        }
        keys.push(key);
    }
    Some(keys)
}

fn attribute_changes(old: &Attributes, new: &Attributes) -> Vec<AttributeChange> {
    let names: BTreeSet<&Arc<str>> = old.keys().chain(new.keys()).collect();
    names
        .into_iter()
        .filter_map(|name| {
            let before = old.get(name);
            let after = new.get(name);
            (before != after).then(|| AttributeChange {
                name: Arc::clone(name),
                old: before.cloned(),
                new: after.cloned(),
            })
        })
        .collect()
}

// Unbound old nodes address nothing; the applier records such edits as
// unresolvable.
fn address(handle: Option<LiveHandle>) -> LiveHandle {
    handle.unwrap_or(LiveHandle::INVALID)
}
