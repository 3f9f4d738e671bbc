#![no_main]

use libfuzzer_sys::fuzz_target;
use live_dom::{LiveTree, MaterializePolicy, from_live, to_live};
use markup::traverse::{bind_fresh, unbind};
use markup::tree_snapshot::{TreeSnapshotOptions, compare_tree};
use markup::{DiffOptions, Node, ParseOptions, STYLE_ATTRIBUTE, diff_with, parse_fragment_with};
use runtime_patch::apply_edit;

// Input is two fragments separated by a NUL byte.
fuzz_target!(|data: &[u8]| {
    let Some(split) = data.iter().position(|b| *b == 0) else {
        return;
    };
    let options = ParseOptions { max_depth: 64 };
    let before = String::from_utf8_lossy(&data[..split]);
    let after = String::from_utf8_lossy(&data[split + 1..]);
    let (Ok(before), Ok(after)) = (
        parse_fragment_with(&before, &options),
        parse_fragment_with(&after, &options),
    ) else {
        return;
    };

    let mut tree = LiveTree::new().with_policy(MaterializePolicy {
        blocked_tags: Vec::new(),
    });
    let handles = tree.handles().clone();
    let old = bind_fresh(&before, &handles);
    let Ok(mounted) = to_live(&mut tree, &old) else {
        return;
    };
    let root = tree.root();
    if tree.append_child(root, mounted).is_err() {
        return;
    }

    let reconciliation = diff_with(&old, &after, &handles, &DiffOptions::default());
    for edit in reconciliation.edits {
        if let Err(warning) = apply_edit(&mut tree, edit) {
            panic!("edit computed against the live tree was skipped: {warning}");
        }
    }
    let Some(next_root) = reconciliation.next.handle() else {
        panic!("next tree root must be bound");
    };
    let live = match from_live(&tree, next_root) {
        Ok(live) => unbind(&live),
        Err(error) => panic!("next root is not live: {error}"),
    };
    // Style values are normalized by the live tree, so only their effect is comparable.
    if declares_style(&after) {
        return;
    }
    if let Err(mismatch) = compare_tree(&after, &live, TreeSnapshotOptions::default()) {
        panic!("live tree diverged from the target fragment: {mismatch}");
    }
});

fn declares_style(node: &Node) -> bool {
    node.attribute(STYLE_ATTRIBUTE).is_some() || node.children().iter().any(declares_style)
}
