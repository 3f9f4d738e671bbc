use crate::error::LiveTreeError;
use crate::tree::{LiveKind, LiveTree};
use core_types::LiveHandle;
use markup::{Attributes, EVENT_ATTRIBUTE_PREFIX, Node, STYLE_ATTRIBUTE};
use std::sync::Arc;

/// Reads the live subtree at `handle` back into a handle-bound [`Node`].
///
/// The style property set becomes a `style` attribute and bound listeners
/// become `on<event>` attributes. Whitespace-only text nodes are dropped.
pub fn from_live(tree: &LiveTree, handle: LiveHandle) -> Result<Node, LiveTreeError> {
    let record = tree.get(handle).ok_or(LiveTreeError::Unresolved(handle))?;
    match record.kind() {
        LiveKind::Text(text) => Ok(Node::Text {
            handle: Some(handle),
            text: text.clone(),
        }),
        LiveKind::Element(element) => {
            let mut attributes: Attributes = element.attributes.clone();
            if !element.style.is_empty() {
                attributes.insert(Arc::from(STYLE_ATTRIBUTE), element.style.to_string());
            }
            for (event, handler) in &element.listeners {
                attributes.insert(
                    Arc::from(format!("{EVENT_ATTRIBUTE_PREFIX}{event}")),
                    handler.clone(),
                );
            }
            let mut children = Vec::with_capacity(record.children().len());
            for &child in record.children() {
                if tree.text(child).is_some_and(|text| text.trim().is_empty()) {
                    continue;
                }
                children.push(from_live(tree, child)?);
            }
            Ok(Node::Element {
                handle: Some(handle),
                name: element.name.clone(),
                key: element.key.clone(),
                attributes,
                children,
            })
        }
    }
}
