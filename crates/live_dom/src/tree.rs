use crate::error::LiveTreeError;
use crate::materialize::MaterializePolicy;
use crate::style::StyleMap;
use core_types::{HandleAllocator, LiveHandle};
use markup::{AttributeChange, Attributes, STYLE_ATTRIBUTE, event_name};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Tag of the rendering root every live tree starts with.
pub const ROOT_TAG: &str = "body";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveElement {
    pub name: Arc<str>,
    pub key: Option<Arc<str>>,
    /// Literal attributes; `style` and `on*` never appear here.
    pub attributes: Attributes,
    pub style: StyleMap,
    /// Bound listeners, event name to handler.
    pub listeners: BTreeMap<Arc<str>, String>,
}

impl LiveElement {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            key: None,
            attributes: Attributes::new(),
            style: StyleMap::new(),
            listeners: BTreeMap::new(),
        }
    }

    /// Applies one attribute transition. `style` is merged into the property
    /// set and event attributes rebind or unbind a listener.
    pub fn apply_change(&mut self, change: &AttributeChange) {
        if &*change.name == STYLE_ATTRIBUTE {
            self.style
                .merge(change.old.as_deref(), change.new.as_deref());
        } else if let Some(event) = event_name(&change.name) {
            match &change.new {
                Some(handler) => {
                    self.listeners.insert(Arc::from(event), handler.clone());
                }
                None => {
                    self.listeners.remove(event);
                }
            }
        } else {
            match &change.new {
                Some(value) => {
                    self.attributes
                        .insert(Arc::clone(&change.name), value.clone());
                }
                None => {
                    self.attributes.remove(&change.name);
                }
            }
        }
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.apply_change(&AttributeChange {
            name: Arc::from(name),
            old: None,
            new: Some(value.to_string()),
        });
    }

    pub fn listener(&self, event: &str) -> Option<&str> {
        self.listeners.get(event).map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LiveKind {
    Element(LiveElement),
    Text(String),
}

#[derive(Clone, Debug)]
pub struct LiveRecord {
    kind: LiveKind,
    parent: Option<LiveHandle>,
    children: Vec<LiveHandle>,
}

impl LiveRecord {
    pub fn kind(&self) -> &LiveKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<LiveHandle> {
        self.parent
    }

    pub fn children(&self) -> &[LiveHandle] {
        &self.children
    }
}

/// The live target tree: an arena of nodes addressed by [`LiveHandle`].
///
/// Invariants:
/// - The root always exists and never has a parent.
/// - A node has at most one parent and appears once in that parent's children.
/// - Detached subtrees are transient: they exist between materialization and
///   attachment, or after `detach` until the caller drops or re-attaches them.
#[derive(Debug)]
pub struct LiveTree {
    nodes: HashMap<LiveHandle, LiveRecord>,
    root: LiveHandle,
    handles: HandleAllocator,
    policy: MaterializePolicy,
}

impl LiveTree {
    pub fn new() -> Self {
        Self::with_allocator(HandleAllocator::new())
    }

    pub fn with_allocator(handles: HandleAllocator) -> Self {
        let root = handles.next();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            LiveRecord {
                kind: LiveKind::Element(LiveElement::new(ROOT_TAG)),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            handles,
            policy: MaterializePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MaterializePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn root(&self) -> LiveHandle {
        self.root
    }

    /// Allocator every handle of this tree comes from. Share it with whoever
    /// computes edits against the tree.
    pub fn handles(&self) -> &HandleAllocator {
        &self.handles
    }

    pub fn policy(&self) -> &MaterializePolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, handle: LiveHandle) -> bool {
        self.nodes.contains_key(&handle)
    }

    pub fn get(&self, handle: LiveHandle) -> Option<&LiveRecord> {
        self.nodes.get(&handle)
    }

    pub fn element(&self, handle: LiveHandle) -> Option<&LiveElement> {
        match &self.nodes.get(&handle)?.kind {
            LiveKind::Element(element) => Some(element),
            LiveKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, handle: LiveHandle) -> Option<&mut LiveElement> {
        match &mut self.nodes.get_mut(&handle)?.kind {
            LiveKind::Element(element) => Some(element),
            LiveKind::Text(_) => None,
        }
    }

    pub fn text(&self, handle: LiveHandle) -> Option<&str> {
        match &self.nodes.get(&handle)?.kind {
            LiveKind::Text(text) => Some(text),
            LiveKind::Element(_) => None,
        }
    }

    pub fn parent(&self, handle: LiveHandle) -> Option<LiveHandle> {
        self.nodes.get(&handle)?.parent
    }

    pub fn children(&self, handle: LiveHandle) -> Option<&[LiveHandle]> {
        self.nodes.get(&handle).map(|record| record.children.as_slice())
    }

    pub fn index_in_parent(&self, handle: LiveHandle) -> Option<usize> {
        let parent = self.parent(handle)?;
        self.nodes
            .get(&parent)?
            .children
            .iter()
            .position(|child| *child == handle)
    }

    /// Whether `handle` resolves and its ancestor chain reaches the root.
    pub fn is_attached(&self, handle: LiveHandle) -> bool {
        let mut current = handle;
        for _ in 0..=self.nodes.len() {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Adds a detached node. The handle must be fresh.
    pub(crate) fn insert_detached(&mut self, handle: LiveHandle, kind: LiveKind) {
        debug_assert!(!self.nodes.contains_key(&handle), "duplicate live handle");
        self.nodes.insert(
            handle,
            LiveRecord {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
    }

    pub(crate) fn push_child_unchecked(&mut self, parent: LiveHandle, child: LiveHandle) {
        if let Some(record) = self.nodes.get_mut(&parent) {
            record.children.push(child);
        }
        if let Some(record) = self.nodes.get_mut(&child) {
            record.parent = Some(parent);
        }
    }

    /// Attaches the detached subtree `child` under `parent` at `index`, or at
    /// the end when `index` is `None`.
    pub fn insert_child(
        &mut self,
        parent: LiveHandle,
        index: Option<usize>,
        child: LiveHandle,
    ) -> Result<(), LiveTreeError> {
        self.ensure_element(parent)?;
        let child_record = self
            .nodes
            .get(&child)
            .ok_or(LiveTreeError::Unresolved(child))?;
        if child == self.root {
            return Err(LiveTreeError::RootNode(child));
        }
        if child_record.parent.is_some() {
            return Err(LiveTreeError::AlreadyAttached(child));
        }
        if child == parent || self.is_descendant(child, parent) {
            return Err(LiveTreeError::Cycle { parent, child });
        }
        let children = &mut self.record_mut(parent)?.children;
        match index {
            Some(index) if index > children.len() => {
                return Err(LiveTreeError::IndexOutOfRange {
                    parent,
                    index,
                    len: children.len(),
                });
            }
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        self.record_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn append_child(&mut self, parent: LiveHandle, child: LiveHandle) -> Result<(), LiveTreeError> {
        self.insert_child(parent, None, child)
    }

    /// Unlinks `handle` from its parent. The subtree stays resolvable.
    pub fn detach(&mut self, handle: LiveHandle) -> Result<(), LiveTreeError> {
        if handle == self.root {
            return Err(LiveTreeError::RootNode(handle));
        }
        let parent = self.record_mut(handle)?.parent.take();
        if let Some(parent) = parent {
            self.record_mut(parent)?
                .children
                .retain(|child| *child != handle);
        }
        Ok(())
    }

    /// Detaches `handle` and drops its whole subtree. Handles of dropped nodes
    /// stop resolving.
    pub fn remove_subtree(&mut self, handle: LiveHandle) -> Result<(), LiveTreeError> {
        self.detach(handle)?;
        self.drop_subtree(handle);
        Ok(())
    }

    /// Puts the detached subtree `replacement` into the slot of `target`, then
    /// drops `target`'s subtree. A detached `target` has no slot; both subtrees
    /// are left alone.
    pub fn replace(
        &mut self,
        target: LiveHandle,
        replacement: LiveHandle,
    ) -> Result<(), LiveTreeError> {
        if target == self.root {
            return Err(LiveTreeError::RootNode(target));
        }
        if !self.nodes.contains_key(&target) {
            return Err(LiveTreeError::Unresolved(target));
        }
        let slot = self
            .parent(target)
            .zip(self.index_in_parent(target));
        let Some((parent, index)) = slot else {
            return Err(LiveTreeError::Detached(target));
        };
        if replacement == parent || self.is_descendant(replacement, parent) {
            return Err(LiveTreeError::Cycle {
                parent,
                child: replacement,
            });
        }
        match self.nodes.get(&replacement) {
            None => return Err(LiveTreeError::Unresolved(replacement)),
            Some(record) if record.parent.is_some() => {
                return Err(LiveTreeError::AlreadyAttached(replacement));
            }
            Some(_) => {}
        }
        self.detach(target)?;
        self.insert_child(parent, Some(index), replacement)?;
        self.drop_subtree(target);
        Ok(())
    }

    /// Moves the child at `from` so that it ends up at `to`.
    pub fn move_child(
        &mut self,
        parent: LiveHandle,
        from: usize,
        to: usize,
    ) -> Result<(), LiveTreeError> {
        let children = &mut self.record_mut(parent)?.children;
        let len = children.len();
        if let Some(index) = [from, to].into_iter().find(|index| *index >= len) {
            return Err(LiveTreeError::IndexOutOfRange { parent, index, len });
        }
        let moved = children.remove(from);
        children.insert(to, moved);
        Ok(())
    }

    pub fn update_attributes(
        &mut self,
        handle: LiveHandle,
        changes: &[AttributeChange],
    ) -> Result<(), LiveTreeError> {
        self.ensure_element(handle)?;
        let element = self
            .element_mut(handle)
            .ok_or(LiveTreeError::NotAnElement(handle))?;
        for change in changes {
            element.apply_change(change);
        }
        Ok(())
    }

    fn ensure_element(&self, handle: LiveHandle) -> Result<(), LiveTreeError> {
        match self.nodes.get(&handle).map(|record| &record.kind) {
            None => Err(LiveTreeError::Unresolved(handle)),
            Some(LiveKind::Text(_)) => Err(LiveTreeError::NotAnElement(handle)),
            Some(LiveKind::Element(_)) => Ok(()),
        }
    }

    fn record_mut(&mut self, handle: LiveHandle) -> Result<&mut LiveRecord, LiveTreeError> {
        self.nodes
            .get_mut(&handle)
            .ok_or(LiveTreeError::Unresolved(handle))
    }

    fn drop_subtree(&mut self, handle: LiveHandle) {
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(record) = self.nodes.remove(&current) {
                stack.extend(record.children);
            }
        }
    }

    fn is_descendant(&self, ancestor: LiveHandle, maybe_descendant: LiveHandle) -> bool {
        let Some(record) = self.nodes.get(&ancestor) else {
            return false;
        };
        let mut stack = record.children.clone();
        while let Some(current) = stack.pop() {
            if current == maybe_descendant {
                return true;
            }
            if let Some(record) = self.nodes.get(&current) {
                stack.extend(record.children.iter().copied());
            }
        }
        false
    }
}

impl Default for LiveTree {
    fn default() -> Self {
        Self::new()
    }
}
