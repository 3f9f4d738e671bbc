//! The live target tree edit scripts are applied to.

mod error;
mod load;
mod materialize;
mod style;
mod tree;

pub use crate::error::{LiveTreeError, MaterializeError};
pub use crate::load::from_live;
pub use crate::materialize::{MaterializePolicy, to_live};
pub use crate::style::StyleMap;
pub use crate::tree::{LiveElement, LiveKind, LiveRecord, LiveTree, ROOT_TAG};

use parking_lot::Mutex;
use std::sync::Arc;

/// A live tree shared between the patch applier and other observers.
pub type SharedTree = Arc<Mutex<LiveTree>>;

pub fn shared(tree: LiveTree) -> SharedTree {
    Arc::new(Mutex::new(tree))
}
