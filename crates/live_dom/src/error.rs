use core_types::LiveHandle;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LiveTreeError {
    #[error("live node {0} does not resolve")]
    Unresolved(LiveHandle),
    #[error("live node {0} is not an element")]
    NotAnElement(LiveHandle),
    #[error("live node {0} is the tree root")]
    RootNode(LiveHandle),
    #[error("live node {0} already has a parent")]
    AlreadyAttached(LiveHandle),
    #[error("live node {0} has no parent slot")]
    Detached(LiveHandle),
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle {
        parent: LiveHandle,
        child: LiveHandle,
    },
    #[error("index {index} is out of range for {parent} with {len} children")]
    IndexOutOfRange {
        parent: LiveHandle,
        index: usize,
        len: usize,
    },
}

/// Why a payload subtree could not be turned into live nodes. Nothing is
/// created when this is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MaterializeError {
    #[error("invalid tag name {0:?}")]
    InvalidTagName(String),
    #[error("invalid attribute name {name:?} on <{tag}>")]
    InvalidAttributeName { tag: String, name: String },
    #[error("tag <{0}> is blocked by the materialize policy")]
    BlockedTag(String),
    #[error("payload carries the reserved invalid handle")]
    InvalidHandle,
    #[error("payload handle {0} is already live")]
    DuplicateHandle(LiveHandle),
}
