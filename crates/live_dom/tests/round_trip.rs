use core_types::LiveHandle;
use live_dom::{LiveTree, MaterializeError, MaterializePolicy, from_live, to_live};
use markup::golden_corpus::fixtures;
use markup::traverse::unbind;
use markup::tree_snapshot::{TreeSnapshotOptions, assert_tree_eq};
use markup::{Node, parse_fragment};

fn mount(tree: &mut LiveTree, markup: &str) -> LiveHandle {
    let node = parse_fragment(markup).expect("fixture parses");
    let handle = to_live(tree, &node).expect("fixture materializes");
    let root = tree.root();
    tree.append_child(root, handle).expect("attach");
    handle
}

#[test]
fn loading_then_materializing_reproduces_the_live_tree() {
    for fixture in fixtures() {
        let mut original = LiveTree::new();
        let handle = mount(&mut original, fixture.before);
        let loaded = from_live(&original, handle).expect("load");

        let mut copy = LiveTree::new();
        let copied = to_live(&mut copy, &loaded).expect("rematerialize");
        assert_eq!(copied, handle, "{}: payload handles are kept", fixture.name);
        assert_tree_eq(
            &loaded,
            &from_live(&copy, copied).expect("reload"),
            TreeSnapshotOptions {
                ignore_handles: false,
            },
        );
    }
}

#[test]
fn loaded_tree_matches_parsed_fragment() {
    let markup = r#"<section key="s"><h1 class="title">Hi</h1><button onclick="go" style="color: red">Go</button></section>"#;
    let mut tree = LiveTree::new();
    let handle = mount(&mut tree, markup);
    let loaded = from_live(&tree, handle).expect("load");
    assert_tree_eq(
        &parse_fragment(markup).expect("parse"),
        &unbind(&loaded),
        TreeSnapshotOptions::default(),
    );
}

#[test]
fn blocked_tags_leave_the_tree_untouched() {
    let mut tree = LiveTree::new();
    let before = tree.len();
    let node = parse_fragment("<div><p>ok</p><script>run()</script></div>").expect("parse");
    assert_eq!(
        to_live(&mut tree, &node),
        Err(MaterializeError::BlockedTag("script".to_string()))
    );
    assert_eq!(tree.len(), before);

    let mut permissive = LiveTree::new().with_policy(MaterializePolicy {
        blocked_tags: Vec::new(),
    });
    assert!(to_live(&mut permissive, &node).is_ok());
}

#[test]
fn detached_subtrees_do_not_count_as_attached() {
    let mut tree = LiveTree::new();
    let attached = mount(&mut tree, "<div><p>a</p></div>");
    let detached = to_live(&mut tree, &Node::element("aside")).expect("aside");
    assert!(tree.is_attached(attached));
    assert!(!tree.is_attached(detached));
    tree.remove_subtree(attached).expect("remove");
    assert!(!tree.contains(attached));
}
