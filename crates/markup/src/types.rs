use core_types::LiveHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Literal attributes of an element. Order is irrelevant; iteration is sorted
/// so that anything derived from it (edit scripts, snapshots) is deterministic.
pub type Attributes = BTreeMap<Arc<str>, String>;

/// Attribute that carries an element's identity key among its siblings.
pub const KEY_ATTRIBUTE: &str = "key";
/// Composite attribute applied as a property set rather than a string.
pub const STYLE_ATTRIBUTE: &str = "style";
/// Prefix of attributes that bind event listeners (`onclick`, `oninput`, ...).
pub const EVENT_ATTRIBUTE_PREFIX: &str = "on";

/// Event name bound by an attribute, if the attribute is in the event namespace.
pub fn event_name(attribute: &str) -> Option<&str> {
    attribute
        .strip_prefix(EVENT_ATTRIBUTE_PREFIX)
        .filter(|event| !event.is_empty())
}

/// Interned, ASCII-lowercased tag/attribute name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

/// Per-fragment name table. Names are stored once as `Arc<str>` so tree nodes
/// built from the same fragment share their tag and attribute names.
#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Vec<Arc<str>>,
    map: HashMap<Arc<str>, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_ascii_lowercase(&mut self, name: &str) -> AtomId {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            let folded = name.to_ascii_lowercase();
            return self.intern_folded(&folded);
        }
        self.intern_folded(name)
    }

    fn intern_folded(&mut self, name: &str) -> AtomId {
        if let Some(id) = self.map.get(name) {
            return *id;
        }
        let id = AtomId(self.atoms.len() as u32);
        let atom: Arc<str> = Arc::from(name);
        self.atoms.push(Arc::clone(&atom));
        self.map.insert(atom, id);
        id
    }

    /// Panics on ids that were not issued by this table.
    pub fn resolve(&self, id: AtomId) -> &str {
        &self.atoms[id.0 as usize]
    }

    pub fn resolve_arc(&self, id: AtomId) -> Arc<str> {
        Arc::clone(&self.atoms[id.0 as usize])
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[derive(Debug)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: AtomId,
        attributes: Vec<(AtomId, Option<String>)>,
        self_closing: bool,
    },
    EndTag(AtomId),
    Comment(String),
    Text(String),
}

#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    atoms: AtomTable,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, atoms: AtomTable) -> Self {
        Self { tokens, atoms }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

/// One element or text leaf of a fragment tree.
///
/// Trees are values: the differ never mutates a tree it was given, it builds
/// the next one. `handle` is a weak back-reference into the live tree; it is
/// `None` until the node has been bound (see [`crate::traverse::bind_fresh`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element {
        handle: Option<LiveHandle>,
        name: Arc<str>,
        key: Option<Arc<str>>,
        attributes: Attributes,
        children: Vec<Node>,
    },
    Text {
        handle: Option<LiveHandle>,
        text: String,
    },
}

impl Node {
    pub fn element(name: impl Into<Arc<str>>) -> Self {
        Node::Element {
            handle: None,
            name: name.into(),
            key: None,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text {
            handle: None,
            text: text.into(),
        }
    }

    pub fn handle(&self) -> Option<LiveHandle> {
        match self {
            Node::Element { handle, .. } | Node::Text { handle, .. } => *handle,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Node::Element { key, .. } => key.as_deref(),
            Node::Text { .. } => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            Node::Text { .. } => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            Node::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            Node::Text { .. } => &[],
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text { .. })
    }

    /// Structural equality that ignores live handles.
    pub fn same_content(&self, other: &Node) -> bool {
        match (self, other) {
            (
                Node::Element {
                    name,
                    key,
                    attributes,
                    children,
                    ..
                },
                Node::Element {
                    name: other_name,
                    key: other_key,
                    attributes: other_attributes,
                    children: other_children,
                    ..
                },
            ) => {
                name == other_name
                    && key == other_key
                    && attributes == other_attributes
                    && children.len() == other_children.len()
                    && children
                        .iter()
                        .zip(other_children)
                        .all(|(a, b)| a.same_content(b))
            }
            (Node::Text { text, .. }, Node::Text { text: other, .. }) => text == other,
            _ => false,
        }
    }

    /// Copy of this node carrying `new_handle`; children keep their handles.
    pub fn with_handle(&self, new_handle: Option<LiveHandle>) -> Node {
        let mut node = self.clone();
        match &mut node {
            Node::Element { handle, .. } | Node::Text { handle, .. } => *handle = new_handle,
        }
        node
    }

    /// Builder-style helpers, mostly for tests and programmatic trees.
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        if let Node::Element { attributes, key, .. } = &mut self {
            if name == KEY_ATTRIBUTE {
                *key = Some(Arc::from(value.into()));
            } else {
                attributes.insert(Arc::from(name), value.into());
            }
        }
        self
    }

    pub fn with_key(self, key: &str) -> Self {
        self.with_attribute(KEY_ATTRIBUTE, key)
    }

    pub fn with_child(mut self, child: Node) -> Self {
        if let Node::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }
}
