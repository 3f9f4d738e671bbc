use core_types::{HandleAllocator, LiveHandle};
use markup::traverse::{bind_fresh, find_by_handle, max_handle};
use markup::tree_snapshot::{TreeSnapshotOptions, assert_tree_eq};
use markup::{
    DiffOptions, Edit, EditKind, MalformedFragmentError, Node, Position, diff, diff_with,
    parse_fragment,
};

fn parse(markup: &str) -> Node {
    parse_fragment(markup).expect("scenario markup parses")
}

fn kinds(edits: &[Edit]) -> Vec<EditKind> {
    edits.iter().map(Edit::kind).collect()
}

/// Streams `steps` through the differ the way the reconciler does: one shared
/// allocator, each step diffed against the previous step's next tree.
fn stream(steps: &[&str]) -> (Vec<Vec<Edit>>, Node) {
    let handles = HandleAllocator::new();
    let mut current = bind_fresh(&parse(steps[0]), &handles);
    let mut scripts = Vec::new();
    for step in &steps[1..] {
        let reconciliation = diff_with(&current, &parse(step), &handles, &DiffOptions::default());
        scripts.push(reconciliation.edits);
        current = reconciliation.next;
    }
    (scripts, current)
}

#[test]
fn streaming_growth_only_appends() {
    let (scripts, last) = stream(&[
        "<article><h1>Weather</h1></article>",
        "<article><h1>Weather</h1><p>Sunny</p></article>",
        "<article><h1>Weather</h1><p>Sunny</p><ul><li>Mon</li></ul></article>",
        "<article><h1>Weather</h1><p>Sunny</p><ul><li>Mon</li><li>Tue</li></ul></article>",
    ]);
    for script in &scripts {
        assert_eq!(kinds(script), vec![EditKind::Insert]);
        let Edit::Insert { at, .. } = &script[0] else {
            unreachable!();
        };
        assert_eq!(*at, Position::Append);
    }
    assert_tree_eq(
        &parse("<article><h1>Weather</h1><p>Sunny</p><ul><li>Mon</li><li>Tue</li></ul></article>"),
        &last,
        TreeSnapshotOptions::default(),
    );
}

#[test]
fn shared_allocator_never_reuses_handles_across_steps() {
    let handles = HandleAllocator::new();
    let first = bind_fresh(&parse("<div><p>a</p></div>"), &handles);
    let second = diff_with(
        &first,
        &parse("<div><p>b</p></div>"),
        &handles,
        &DiffOptions::default(),
    );
    let third = diff_with(
        &second.next,
        &parse("<div><p>c</p></div>"),
        &handles,
        &DiffOptions::default(),
    );
    let (Edit::Replace { node: b, .. }, Edit::Replace { node: c, .. }) =
        (&second.edits[0], &third.edits[0])
    else {
        panic!("text changes replace the leaf");
    };
    assert_eq!(b.handle(), Some(LiveHandle(4)));
    assert_eq!(c.handle(), Some(LiveHandle(5)));
    assert_eq!(
        find_by_handle(&third.next, LiveHandle(5)),
        Some(&Node::text("c").with_handle(Some(LiveHandle(5))))
    );
}

#[test]
fn next_tree_keeps_handles_of_untouched_nodes() {
    let old = bind_fresh(
        &parse(r#"<div class="a"><h2>Title</h2><p>Body</p></div>"#),
        &HandleAllocator::new(),
    );
    let reconciliation = diff_with(
        &old,
        &parse(r#"<div class="b"><h2>Title</h2><p>Body</p></div>"#),
        &HandleAllocator::after(max_handle(&old)),
        &DiffOptions::default(),
    );
    assert_eq!(kinds(&reconciliation.edits), vec![EditKind::Update]);
    assert_tree_eq(
        &old.children()[0],
        &reconciliation.next.children()[0],
        TreeSnapshotOptions {
            ignore_handles: false,
        },
    );
}

#[test]
fn keyed_list_edits_address_parent_and_surviving_children() {
    let old = bind_fresh(
        &parse(r#"<ul><li key="a">A</li><li key="b">B</li><li key="c">C</li></ul>"#),
        &HandleAllocator::new(),
    );
    let edits = diff(
        &old,
        &parse(r#"<ul><li key="c">C</li><li key="a">A!</li></ul>"#),
    );
    let b = old.children()[1].handle().expect("bound");
    let a_text = old.children()[0].children()[0].handle().expect("bound");
    let parent = old.handle().expect("bound");
    assert_eq!(edits[0], Edit::Remove { target: b });
    assert_eq!(
        edits[1],
        Edit::Reorder {
            parent,
            from: 1,
            to: 0
        }
    );
    let Edit::Replace { target, node } = &edits[2] else {
        panic!("expected text replace, got {:?}", edits[2]);
    };
    assert_eq!(*target, a_text);
    assert_eq!(node, &Node::text("A!").with_handle(node.handle()));
    assert_eq!(edits.len(), 3);
}

#[test]
fn malformed_fragments_are_rejected_before_diffing() {
    assert!(matches!(
        parse_fragment("<p>a</p><p>b</p>"),
        Err(MalformedFragmentError::MultipleRoots { count: 2 })
    ));
    assert!(matches!(
        parse_fragment("   "),
        Err(MalformedFragmentError::Empty)
    ));
}

#[cfg(feature = "perf-tests")]
#[test]
fn large_keyed_rotation_is_single_move() {
    use markup::perf_fixtures::make_keyed_list;

    let old = bind_fresh(&parse(&make_keyed_list(20_000, 0)), &HandleAllocator::new());
    let started = std::time::Instant::now();
    let edits = diff(&old, &parse(&make_keyed_list(20_000, 1)));
    assert_eq!(kinds(&edits), vec![EditKind::Reorder]);
    assert!(
        started.elapsed() < std::time::Duration::from_secs(2),
        "keyed rotation diff took {:?}",
        started.elapsed()
    );
}
