use futures::executor::block_on;
use live_dom::{LiveTree, from_live, to_live};
use markup::traverse::unbind;
use markup::tree_snapshot::{TreeSnapshotOptions, assert_tree_eq};
use markup::{MalformedFragmentError, parse_fragment};
use reweave::{
    ApplyWarning, EditKind, FragmentId, LiveHandle, Node, Reconciler, ReconcilerConfig, shared,
};

fn started() -> (Reconciler, LiveHandle) {
    let tree = shared(LiveTree::new());
    let root = tree.lock().root();
    let mut reconciler = Reconciler::new(tree, ReconcilerConfig::default());
    reconciler.start().expect("spawn applier");
    (reconciler, root)
}

fn rendered(reconciler: &Reconciler, id: &FragmentId) -> Node {
    let handle = reconciler
        .registry()
        .get(id)
        .and_then(Node::handle)
        .expect("registered and bound");
    unbind(&from_live(&reconciler.tree().lock(), handle).expect("registered root is live"))
}

fn assert_renders(reconciler: &Reconciler, id: &FragmentId, markup: &str) {
    assert_tree_eq(
        &parse_fragment(markup).expect("parse"),
        &rendered(reconciler, id),
        TreeSnapshotOptions::default(),
    );
}

#[test]
fn streamed_fragments_converge_on_the_latest_markup() {
    let (mut reconciler, root) = started();
    let id = FragmentId::from("forecast");
    let steps = [
        "<div><h1>Forecast</h1></div>",
        r#"<div><h1>Forecast</h1><ul><li key="mon">Mon: sun</li></ul></div>"#,
        r#"<div class="done"><h1>Forecast</h1><ul><li key="tue">Tue: rain</li><li key="mon">Mon: sun</li></ul></div>"#,
    ];
    for step in steps {
        reconciler.reconcile(&id, step, root).expect("valid markup");
    }
    block_on(reconciler.drained());
    assert_renders(&reconciler, &id, steps[2]);
    assert!(reconciler.diagnostics().is_empty());
    assert_eq!(reconciler.tree().lock().children(root).map(<[_]>::len), Some(1));
}

#[test]
fn unchanged_nodes_keep_their_live_identity() {
    let (mut reconciler, root) = started();
    let id = FragmentId::from("panel");
    reconciler
        .reconcile(&id, r#"<section><p class="a">x</p><input name="q"></section>"#, root)
        .expect("valid markup");
    block_on(reconciler.drained());
    let input = reconciler.registry().get(&id).expect("registered").children()[1]
        .handle()
        .expect("bound");

    reconciler
        .reconcile(&id, r#"<section><p class="b">x</p><input name="q"></section>"#, root)
        .expect("valid markup");
    block_on(reconciler.drained());
    let tree = reconciler.tree().lock();
    let section = reconciler.registry().get(&id).and_then(Node::handle).expect("bound");
    assert_eq!(tree.children(section).expect("section")[1], input);
    assert_eq!(
        tree.element(tree.children(section).expect("section")[0])
            .and_then(|p| p.attributes.get("class"))
            .map(String::as_str),
        Some("b")
    );
}

#[test]
fn malformed_markup_leaves_everything_untouched() {
    let (mut reconciler, root) = started();
    let id = FragmentId::from("card");
    reconciler.reconcile(&id, "<p>ok</p>", root).expect("valid markup");
    let registered = reconciler.registry().get(&id).cloned();

    assert!(matches!(
        reconciler.reconcile(&id, "<p>a</p><p>b</p>", root),
        Err(MalformedFragmentError::MultipleRoots { .. })
    ));
    assert_eq!(reconciler.registry().get(&id).cloned(), registered);
    block_on(reconciler.drained());
    assert_renders(&reconciler, &id, "<p>ok</p>");
}

#[test]
fn remounting_under_another_root_moves_the_fragment() {
    let (mut reconciler, root) = started();
    let other = {
        let mut tree = reconciler.tree().lock();
        let aside = to_live(&mut tree, &Node::element("aside")).expect("aside");
        tree.append_child(root, aside).expect("attach");
        aside
    };
    let id = FragmentId::from("toast");
    reconciler.reconcile(&id, "<p>hi</p>", root).expect("valid markup");
    reconciler.reconcile(&id, "<p>hi</p>", other).expect("valid markup");
    block_on(reconciler.drained());

    let tree = reconciler.tree().lock();
    let p = reconciler.registry().get(&id).and_then(Node::handle).expect("bound");
    assert_eq!(tree.parent(p), Some(other));
    assert_eq!(tree.children(root).map(<[_]>::len), Some(1));
    assert_eq!(reconciler.registry().entry(&id).map(|entry| entry.mount), Some(other));
}

#[test]
fn reclaim_drops_fragments_removed_by_other_code() {
    let (mut reconciler, root) = started();
    let kept = FragmentId::from("kept");
    let gone = FragmentId::from("gone");
    reconciler.reconcile(&kept, "<p>a</p>", root).expect("valid markup");
    reconciler.reconcile(&gone, "<p>b</p>", root).expect("valid markup");
    block_on(reconciler.drained());

    let gone_root = reconciler.registry().get(&gone).and_then(Node::handle).expect("bound");
    reconciler
        .tree()
        .lock()
        .remove_subtree(gone_root)
        .expect("foreign removal");
    assert_eq!(reconciler.reclaim(), 1);
    assert!(reconciler.registry().contains(&kept));
    assert!(!reconciler.registry().contains(&gone));

    reconciler.reconcile(&gone, "<p>b</p>", root).expect("valid markup");
    block_on(reconciler.drained());
    assert_renders(&reconciler, &gone, "<p>b</p>");
}

#[test]
fn periodic_reclaim_runs_when_idle() {
    let tree = shared(LiveTree::new());
    let root = tree.lock().root();
    let config = ReconcilerConfig {
        reclaim_interval: 1,
        ..ReconcilerConfig::default()
    };
    let mut reconciler = Reconciler::new(tree, config);
    reconciler.start().expect("spawn applier");
    let gone = FragmentId::from("gone");
    reconciler.reconcile(&gone, "<p>b</p>", root).expect("valid markup");
    block_on(reconciler.drained());
    let gone_root = reconciler.registry().get(&gone).and_then(Node::handle).expect("bound");
    reconciler.tree().lock().remove_subtree(gone_root).expect("foreign removal");

    reconciler
        .reconcile(&FragmentId::from("other"), "<p>c</p>", root)
        .expect("valid markup");
    assert!(!reconciler.registry().contains(&gone));
}

#[test]
fn forget_then_reconcile_mounts_a_second_copy() {
    let (mut reconciler, root) = started();
    let id = FragmentId::from("log");
    reconciler.reconcile(&id, "<p>1</p>", root).expect("valid markup");
    assert!(reconciler.forget(&id));
    assert!(!reconciler.forget(&id));
    reconciler.reconcile(&id, "<p>2</p>", root).expect("valid markup");
    block_on(reconciler.drained());
    assert_eq!(reconciler.tree().lock().children(root).map(<[_]>::len), Some(2));
}

#[test]
fn blocked_tags_are_recorded_not_rendered() {
    let (mut reconciler, root) = started();
    let id = FragmentId::from("unsafe");
    reconciler
        .reconcile(&id, "<script>steal()</script>", root)
        .expect("well-formed markup");
    block_on(reconciler.drained());
    let warnings = reconciler.diagnostics().snapshot();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        warnings[0],
        ApplyWarning::Materialization {
            kind: EditKind::Insert,
            ..
        }
    ));
    assert_eq!(reconciler.tree().lock().children(root).map(<[_]>::len), Some(0));
}

#[test]
fn rejected_first_mount_does_not_hide_later_renders() {
    let (mut reconciler, root) = started();
    let id = FragmentId::from("widget");
    reconciler
        .reconcile(&id, "<div><p>a</p><script>x()</script></div>", root)
        .expect("well-formed markup");
    block_on(reconciler.drained());
    assert_eq!(reconciler.diagnostics().total(), 1);

    for i in 0..3 {
        let markup = format!("<div><p>a</p><p>{i}</p></div>");
        reconciler.reconcile(&id, &markup, root).expect("valid markup");
        block_on(reconciler.drained());
    }
    assert_eq!(reconciler.diagnostics().total(), 1);
    assert_eq!(reconciler.tree().lock().children(root).map(<[_]>::len), Some(1));
    assert_renders(&reconciler, &id, "<div><p>a</p><p>2</p></div>");
}

#[test]
fn fragment_detached_by_other_code_is_mounted_again() {
    let (mut reconciler, root) = started();
    let id = FragmentId::from("banner");
    reconciler.reconcile(&id, "<p>one</p>", root).expect("valid markup");
    block_on(reconciler.drained());
    let parked = reconciler.registry().get(&id).and_then(Node::handle).expect("bound");
    reconciler.tree().lock().detach(parked).expect("foreign detach");

    reconciler.reconcile(&id, "<p>two</p>", root).expect("valid markup");
    block_on(reconciler.drained());
    assert!(reconciler.diagnostics().is_empty());
    assert!(reconciler.tree().lock().contains(parked));
    assert_renders(&reconciler, &id, "<p>two</p>");
}
