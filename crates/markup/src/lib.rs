pub mod diff;
pub mod edit;
pub mod golden_corpus;
pub mod perf_fixtures;
pub mod traverse;
pub mod tree_snapshot;

mod entities;
mod fragment;
mod tokenizer;
mod types;

pub use crate::diff::{ChildMatching, DiffOptions, Reconciliation, diff, diff_with};
pub use crate::edit::{AttributeChange, Edit, EditKind, Position};
pub use crate::fragment::{
    MalformedFragmentError, ParseOptions, build_fragment, parse_fragment, parse_fragment_with,
};
pub use crate::tokenizer::tokenize;
pub use crate::types::{
    AtomId, AtomTable, Attributes, EVENT_ATTRIBUTE_PREFIX, KEY_ATTRIBUTE, Node, STYLE_ATTRIBUTE,
    Token, TokenStream, event_name,
};
