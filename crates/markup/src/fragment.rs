use crate::tokenizer::tokenize;
use crate::types::{Attributes, KEY_ATTRIBUTE, Node, Token, TokenStream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Why a fragment cannot be reconciled. The engine always reconciles a
/// single-rooted subtree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MalformedFragmentError {
    #[error("fragment contains no element")]
    Empty,
    #[error("fragment has {count} top-level elements, expected exactly one root")]
    MultipleRoots { count: usize },
    #[error("fragment has text beside its root element")]
    StrayText,
    #[error("fragment nesting exceeds the depth limit of {limit}")]
    TooDeep { limit: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Maximum element nesting accepted from a fragment.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

pub fn parse_fragment(markup: &str) -> Result<Node, MalformedFragmentError> {
    parse_fragment_with(markup, &ParseOptions::default())
}

pub fn parse_fragment_with(
    markup: &str,
    options: &ParseOptions,
) -> Result<Node, MalformedFragmentError> {
    build_fragment(&tokenize(markup), options)
}

/// Builds the single-rooted tree of a token stream.
///
/// Comments and doctypes are skipped, whitespace-only text is dropped, and end
/// tags that match no open element are ignored.
pub fn build_fragment(
    stream: &TokenStream,
    options: &ParseOptions,
) -> Result<Node, MalformedFragmentError> {
    let atoms = stream.atoms();
    let mut arena = FragmentArena::default();
    let mut open_elements: Vec<usize> = Vec::new();

    for token in stream.tokens() {
        match token {
            Token::Doctype(_) | Token::Comment(_) => {}
            Token::Text(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                arena.add(
                    open_elements.last().copied(),
                    ArenaNode::Text { text: text.clone() },
                );
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if open_elements.len() >= options.max_depth {
                    return Err(MalformedFragmentError::TooDeep {
                        limit: options.max_depth,
                    });
                }
                let mut key = None;
                let mut resolved = Attributes::new();
                for (attribute, value) in attributes {
                    let attribute = atoms.resolve_arc(*attribute);
                    let value = value.clone().unwrap_or_default();
                    if &*attribute == KEY_ATTRIBUTE {
                        key.get_or_insert_with(|| Arc::<str>::from(value));
                        continue;
                    }
                    // First occurrence wins, as in HTML.
                    resolved.entry(attribute).or_insert(value);
                }
                let index = arena.add(
                    open_elements.last().copied(),
                    ArenaNode::Element {
                        name: atoms.resolve_arc(*name),
                        key,
                        attributes: resolved,
                        children: Vec::new(),
                    },
                );
                if !*self_closing {
                    open_elements.push(index);
                }
            }
            Token::EndTag(name) => {
                let target = atoms.resolve(*name);
                if let Some(depth) = open_elements
                    .iter()
                    .rposition(|&open| arena.is_element_named(open, target))
                {
                    open_elements.truncate(depth);
                }
            }
        }
    }

    let mut root = None;
    let mut element_count = 0usize;
    let mut stray_text = false;
    for &index in &arena.top_level {
        match arena.nodes[index] {
            ArenaNode::Element { .. } => {
                element_count += 1;
                root.get_or_insert(index);
            }
            ArenaNode::Text { .. } => stray_text = true,
        }
    }
    match (root, element_count) {
        (None, _) => Err(MalformedFragmentError::Empty),
        (Some(_), count) if count > 1 => Err(MalformedFragmentError::MultipleRoots { count }),
        (Some(_), _) if stray_text => Err(MalformedFragmentError::StrayText),
        (Some(index), _) => Ok(arena.into_node(index)),
    }
}

#[derive(Debug)]
enum ArenaNode {
    Element {
        name: Arc<str>,
        key: Option<Arc<str>>,
        attributes: Attributes,
        children: Vec<usize>,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Default)]
struct FragmentArena {
    nodes: Vec<ArenaNode>,
    top_level: Vec<usize>,
}

impl FragmentArena {
    fn add(&mut self, parent: Option<usize>, node: ArenaNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        match parent {
            Some(parent) => match &mut self.nodes[parent] {
                ArenaNode::Element { children, .. } => children.push(index),
                ArenaNode::Text { .. } => unreachable!("open elements are never text"),
            },
            None => self.top_level.push(index),
        }
        index
    }

    fn is_element_named(&self, index: usize, target: &str) -> bool {
        matches!(&self.nodes[index], ArenaNode::Element { name, .. } if &**name == target)
    }

    /// Iterative post-order build: when a node is seen the second time, its
    /// children are the last `children.len()` entries of `built`, in order.
    fn into_node(self, root: usize) -> Node {
        let mut nodes: Vec<Option<ArenaNode>> = self.nodes.into_iter().map(Some).collect();
        let mut built: Vec<Node> = Vec::new();
        let mut stack = vec![(root, false)];

        while let Some((index, visited)) = stack.pop() {
            if !visited {
                stack.push((index, true));
                if let Some(ArenaNode::Element { children, .. }) = &nodes[index] {
                    stack.extend(children.iter().rev().map(|&child| (child, false)));
                }
                continue;
            }
            let node = match nodes[index].take() {
                Some(ArenaNode::Element {
                    name,
                    key,
                    attributes,
                    children,
                }) => {
                    let children = built.split_off(built.len() - children.len());
                    Node::Element {
                        handle: None,
                        name,
                        key,
                        attributes,
                        children,
                    }
                }
                Some(ArenaNode::Text { text }) => Node::Text { handle: None, text },
                None => unreachable!("fragment arena node built twice"),
            };
            built.push(node);
        }

        debug_assert_eq!(built.len(), 1, "fragment builder yields exactly one root");
        built.swap_remove(0)
    }
}
