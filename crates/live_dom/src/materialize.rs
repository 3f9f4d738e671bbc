use crate::error::MaterializeError;
use crate::tree::{LiveElement, LiveKind, LiveTree};
use core_types::LiveHandle;
use markup::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a live tree accepts from payload subtrees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializePolicy {
    /// Tags that are never materialized, compared ASCII case-insensitively.
    pub blocked_tags: Vec<String>,
}

impl Default for MaterializePolicy {
    fn default() -> Self {
        Self {
            blocked_tags: vec!["script".to_string()],
        }
    }
}

impl MaterializePolicy {
    pub fn blocks(&self, tag: &str) -> bool {
        self.blocked_tags
            .iter()
            .any(|blocked| blocked.eq_ignore_ascii_case(tag))
    }
}

/// Materializes `node` as a new detached subtree of `tree` and returns its
/// root handle.
///
/// The whole payload is validated first, so an error leaves the tree
/// untouched. Payload handles are kept; unbound nodes get a fresh handle from
/// the tree's allocator.
pub fn to_live(tree: &mut LiveTree, node: &Node) -> Result<LiveHandle, MaterializeError> {
    validate(tree, node)?;
    let root = build(tree, node);
    log::trace!(target: "live_dom", "materialized subtree {root}");
    Ok(root)
}

fn validate(tree: &LiveTree, root: &Node) -> Result<(), MaterializeError> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(handle) = node.handle() {
            if !handle.is_valid() {
                return Err(MaterializeError::InvalidHandle);
            }
            if tree.contains(handle) || !seen.insert(handle) {
                return Err(MaterializeError::DuplicateHandle(handle));
            }
        }
        if let Node::Element {
            name,
            attributes,
            children,
            ..
        } = node
        {
            if !is_valid_name(name) {
                return Err(MaterializeError::InvalidTagName(name.to_string()));
            }
            if tree.policy().blocks(name) {
                return Err(MaterializeError::BlockedTag(name.to_string()));
            }
            if let Some(attribute) = attributes.keys().find(|attribute| !is_valid_name(attribute)) {
                return Err(MaterializeError::InvalidAttributeName {
                    tag: name.to_string(),
                    name: attribute.to_string(),
                });
            }
            stack.extend(children);
        }
    }
    Ok(())
}

fn build(tree: &mut LiveTree, node: &Node) -> LiveHandle {
    let handle = node.handle().unwrap_or_else(|| tree.handles().next());
    match node {
        Node::Element {
            name,
            key,
            attributes,
            children,
            ..
        } => {
            let mut element = LiveElement::new(name.clone());
            element.key = key.clone();
            for (attribute, value) in attributes {
                element.set_attribute(attribute, value);
            }
            tree.insert_detached(handle, LiveKind::Element(element));
            for child in children {
                let child = build(tree, child);
                tree.push_child_unchecked(handle, child);
            }
        }
        Node::Text { text, .. } => tree.insert_detached(handle, LiveKind::Text(text.clone())),
    }
    handle
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
}
