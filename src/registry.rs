use core_types::{FragmentId, LiveHandle};
use live_dom::LiveTree;
use markup::Node;
use std::collections::HashMap;

/// Last tree rendered for a fragment id, and where it was mounted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub mount: LiveHandle,
    pub tree: Node,
}

/// Maps fragment ids to the tree their live nodes were last reconciled to.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    entries: HashMap<FragmentId, RegistryEntry>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &FragmentId) -> Option<&Node> {
        self.entries.get(id).map(|entry| &entry.tree)
    }

    pub fn entry(&self, id: &FragmentId) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    pub fn set(&mut self, id: FragmentId, mount: LiveHandle, tree: Node) {
        self.entries.insert(id, RegistryEntry { mount, tree });
    }

    pub fn remove(&mut self, id: &FragmentId) -> Option<RegistryEntry> {
        self.entries.remove(id)
    }

    pub fn contains(&self, id: &FragmentId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn ids(&self) -> impl Iterator<Item = &FragmentId> {
        self.entries.keys()
    }

    /// Drops entries whose root no longer resolves or is no longer reachable
    /// from the tree root. Returns how many were dropped.
    pub fn reclaim(&mut self, tree: &LiveTree) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, entry| {
            let live = entry
                .tree
                .handle()
                .is_some_and(|handle| tree.is_attached(handle));
            if !live {
                log::debug!(target: "reweave", "reclaiming registry entry {id}");
            }
            live
        });
        before - self.entries.len()
    }
}
