use crate::types::Node;
use core_types::{HandleAllocator, LiveHandle};

/// Copy of `node` where every node without a handle gets a fresh one.
///
/// Handles already present are kept, so binding an already-bound tree is a
/// plain clone. Pre-order, so a parent's handle is smaller than its children's
/// when the whole tree is fresh.
pub fn bind_fresh(node: &Node, handles: &HandleAllocator) -> Node {
    match node {
        Node::Element {
            handle,
            name,
            key,
            attributes,
            children,
        } => {
            let handle = Some(handle.unwrap_or_else(|| handles.next()));
            Node::Element {
                handle,
                name: name.clone(),
                key: key.clone(),
                attributes: attributes.clone(),
                children: children
                    .iter()
                    .map(|child| bind_fresh(child, handles))
                    .collect(),
            }
        }
        Node::Text { handle, text } => Node::Text {
            handle: Some(handle.unwrap_or_else(|| handles.next())),
            text: text.clone(),
        },
    }
}

/// Copy of `node` where every node gets a fresh handle, bound or not.
pub fn rebind(node: &Node, handles: &HandleAllocator) -> Node {
    match node {
        Node::Element {
            name,
            key,
            attributes,
            children,
            ..
        } => Node::Element {
            handle: Some(handles.next()),
            name: name.clone(),
            key: key.clone(),
            attributes: attributes.clone(),
            children: children.iter().map(|child| rebind(child, handles)).collect(),
        },
        Node::Text { text, .. } => Node::Text {
            handle: Some(handles.next()),
            text: text.clone(),
        },
    }
}

/// Copy of `node` with every handle cleared.
pub fn unbind(node: &Node) -> Node {
    match node {
        Node::Element {
            name,
            key,
            attributes,
            children,
            ..
        } => Node::Element {
            handle: None,
            name: name.clone(),
            key: key.clone(),
            attributes: attributes.clone(),
            children: children.iter().map(unbind).collect(),
        },
        Node::Text { text, .. } => Node::text(text.clone()),
    }
}

pub fn max_handle(node: &Node) -> Option<LiveHandle> {
    let own = node.handle();
    node.children()
        .iter()
        .filter_map(max_handle)
        .chain(own)
        .max()
}

pub fn find_by_handle(node: &Node, handle: LiveHandle) -> Option<&Node> {
    if node.handle() == Some(handle) {
        return Some(node);
    }
    node.children()
        .iter()
        .find_map(|child| find_by_handle(child, handle))
}

/// Visits every handle of the tree in pre-order.
pub fn for_each_handle(node: &Node, f: &mut impl FnMut(LiveHandle)) {
    if let Some(handle) = node.handle() {
        f(handle);
    }
    for child in node.children() {
        for_each_handle(child, f);
    }
}
