use crate::config::ReconcilerConfig;
use crate::registry::{NodeRegistry, RegistryEntry};
use core_types::{FragmentId, HandleAllocator, LiveHandle};
use live_dom::SharedTree;
use markup::traverse::bind_fresh;
use markup::{Edit, MalformedFragmentError, Position, diff_with, parse_fragment_with};
use runtime_patch::{ApplierError, Diagnostics, Drained, PatchApplier};

/// Keeps the live nodes of each fragment id in step with the latest markup
/// handed over for it.
///
/// `reconcile` parses, diffs against the registered tree and enqueues the
/// script; it never waits for the script to be applied. Await
/// [`drained`](Self::drained) to observe the result.
pub struct Reconciler {
    handles: HandleAllocator,
    applier: PatchApplier,
    registry: NodeRegistry,
    config: ReconcilerConfig,
    since_reclaim: u32,
}

impl Reconciler {
    /// Creates a reconciler for `tree`. The applier starts stopped.
    pub fn new(tree: SharedTree, config: ReconcilerConfig) -> Self {
        let handles = tree.lock().handles().clone();
        let diagnostics = Diagnostics::with_capacity(config.diagnostics_capacity);
        Self {
            handles,
            applier: PatchApplier::with_diagnostics(tree, diagnostics),
            registry: NodeRegistry::new(),
            config,
            since_reclaim: 0,
        }
    }

    pub fn start(&mut self) -> Result<(), ApplierError> {
        self.applier.start()
    }

    pub fn stop(&mut self) {
        self.applier.stop();
    }

    /// Renders `markup` as fragment `id` under `target_root`.
    ///
    /// The first call for an id appends the fragment to `target_root`. Later
    /// calls diff against the registered tree; a different `target_root`
    /// removes the old live subtree and appends the fragment to the new root.
    /// A registered tree whose root never went live (or was detached by other
    /// code) is not diffed against; the fragment is mounted afresh.
    /// Malformed markup produces no edits and leaves the registry untouched.
    pub fn reconcile(
        &mut self,
        id: &FragmentId,
        markup: &str,
        target_root: LiveHandle,
    ) -> Result<(), MalformedFragmentError> {
        let new = parse_fragment_with(markup, &self.config.parse)?;
        self.reclaim_if_due();

        let mounted = self.registry.entry(id).filter(|entry| {
            let live = self.still_mounted(entry);
            if !live {
                log::debug!(target: "reweave", "previous render of {id} is not live, mounting afresh");
            }
            live
        });
        let (edits, next) = match mounted {
            Some(entry) if entry.mount == target_root => {
                let reconciliation =
                    diff_with(&entry.tree, &new, &self.handles, &self.config.diff);
                (reconciliation.edits, reconciliation.next)
            }
            previous => {
                let next = bind_fresh(&new, &self.handles);
                let mut edits = Vec::with_capacity(2);
                if let Some(old_root) = previous.and_then(|entry| entry.tree.handle()) {
                    log::debug!(target: "reweave", "re-mounting {id} under {target_root}");
                    edits.push(Edit::Remove { target: old_root });
                }
                edits.push(Edit::Insert {
                    parent: target_root,
                    at: Position::Append,
                    node: next.clone(),
                });
                (edits, next)
            }
        };

        log::debug!(target: "reweave", "reconciled {id}: {} edits", edits.len());
        self.applier.apply_patches(edits);
        self.registry.set(id.clone(), target_root, next);
        Ok(())
    }

    pub fn drained(&self) -> Drained {
        self.applier.drained()
    }

    /// Forgets the registered tree for `id`. Its live nodes stay where they
    /// are; the next reconcile for `id` mounts afresh.
    pub fn forget(&mut self, id: &FragmentId) -> bool {
        self.registry.remove(id).is_some()
    }

    /// Drops registry entries whose live root is gone or detached.
    ///
    /// Entries whose insert is still queued look detached, so call this once
    /// [`drained`](Self::drained) has resolved.
    pub fn reclaim(&mut self) -> usize {
        self.since_reclaim = 0;
        let tree = self.applier.tree().lock();
        let reclaimed = self.registry.reclaim(&tree);
        if reclaimed > 0 {
            log::info!(target: "reweave", "reclaimed {reclaimed} registry entries");
        }
        reclaimed
    }

    /// Whether the registered root of `entry` is in the document. Pending
    /// edits may still attach it, so a busy applier counts as mounted.
    fn still_mounted(&self, entry: &RegistryEntry) -> bool {
        if !self.applier.is_idle() {
            return true;
        }
        entry
            .tree
            .handle()
            .is_some_and(|root| self.applier.tree().lock().is_attached(root))
    }

    fn reclaim_if_due(&mut self) {
        if self.config.reclaim_interval == 0 {
            return;
        }
        self.since_reclaim = self.since_reclaim.saturating_add(1);
        if self.since_reclaim >= self.config.reclaim_interval && self.applier.is_idle() {
            self.reclaim();
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.applier.diagnostics()
    }

    pub fn tree(&self) -> &SharedTree {
        self.applier.tree()
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}
