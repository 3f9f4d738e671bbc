use crate::edit::EditKind;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FixtureKind {
    Identity,
    Attribute,
    Text,
    Positional,
    Keyed,
    Replace,
    Nested,
}

/// A before/after pair of fragments plus the edit kinds the default diff
/// options must produce for it, in order.
#[derive(Clone, Copy, Debug)]
pub struct ReconcileFixture {
    pub name: &'static str,
    pub before: &'static str,
    pub after: &'static str,
    pub covers: &'static str,
    pub script: &'static [EditKind],
    pub kind: FixtureKind,
}

use EditKind::{Insert, Remove, Reorder, Replace, Update};

const RECONCILE_CORPUS_V1: &[ReconcileFixture] = &[
    ReconcileFixture {
        name: "identity_unchanged",
        before: r#"<div class="a"><p>x</p></div>"#,
        after: r#"<div class="a"><p>x</p></div>"#,
        covers: "Identical fragments produce an empty script.",
        script: &[],
        kind: FixtureKind::Identity,
    },
    ReconcileFixture {
        name: "identity_entity_spelling",
        before: "<p>a &amp; b</p>",
        after: "<p>a &#38; b</p>",
        covers: "Comparison happens after entity decoding.",
        script: &[],
        kind: FixtureKind::Identity,
    },
    ReconcileFixture {
        name: "identity_formatting_whitespace",
        before: "<ul>\n  <li>a</li>\n</ul>",
        after: "<ul><li>a</li></ul>",
        covers: "Whitespace-only text between tags is not content.",
        script: &[],
        kind: FixtureKind::Identity,
    },
    ReconcileFixture {
        name: "attribute_value_changed",
        before: r#"<div class="a">x</div>"#,
        after: r#"<div class="b">x</div>"#,
        covers: "Single attribute value change.",
        script: &[Update],
        kind: FixtureKind::Attribute,
    },
    ReconcileFixture {
        name: "attribute_added_and_removed",
        before: r#"<a href="/x" title="t">go</a>"#,
        after: r#"<a href="/y" rel="next">go</a>"#,
        covers: "Added, removed and changed attributes share one update.",
        script: &[Update],
        kind: FixtureKind::Attribute,
    },
    ReconcileFixture {
        name: "attribute_style_rewritten",
        before: r#"<p style="color: red; margin: 0">x</p>"#,
        after: r#"<p style="color: blue">x</p>"#,
        covers: "Composite style value is re-emitted whole.",
        script: &[Update],
        kind: FixtureKind::Attribute,
    },
    ReconcileFixture {
        name: "attribute_listener_rebound",
        before: r#"<button onclick="save">Save</button>"#,
        after: r#"<button onclick="submit">Save</button>"#,
        covers: "Event attributes diff like any other attribute.",
        script: &[Update],
        kind: FixtureKind::Attribute,
    },
    ReconcileFixture {
        name: "attribute_on_void_element",
        before: r#"<img src="a.png" alt="">"#,
        after: r#"<img src="b.png" alt="">"#,
        covers: "Void element attribute update.",
        script: &[Update],
        kind: FixtureKind::Attribute,
    },
    ReconcileFixture {
        name: "text_changed",
        before: "<p>old</p>",
        after: "<p>new</p>",
        covers: "Changed text leaf is replaced.",
        script: &[Replace],
        kind: FixtureKind::Text,
    },
    ReconcileFixture {
        name: "replace_root_tag",
        before: "<div><p>x</p></div>",
        after: "<section><p>x</p></section>",
        covers: "Different root tags replace the whole fragment.",
        script: &[Replace],
        kind: FixtureKind::Replace,
    },
    ReconcileFixture {
        name: "replace_root_key",
        before: r#"<li key="a">x</li>"#,
        after: r#"<li key="b">x</li>"#,
        covers: "A different identity key is a different node.",
        script: &[Replace],
        kind: FixtureKind::Replace,
    },
    ReconcileFixture {
        name: "replace_element_with_text",
        before: "<div><p>x</p></div>",
        after: "<div>x</div>",
        covers: "Kind change of a positional child.",
        script: &[Replace],
        kind: FixtureKind::Replace,
    },
    ReconcileFixture {
        name: "positional_append",
        before: "<ul><li>a</li></ul>",
        after: "<ul><li>a</li><li>b</li></ul>",
        covers: "New trailing unkeyed child is appended.",
        script: &[Insert],
        kind: FixtureKind::Positional,
    },
    ReconcileFixture {
        name: "positional_truncate",
        before: "<ul><li>a</li><li>b</li><li>c</li></ul>",
        after: "<ul><li>a</li></ul>",
        covers: "Surplus unkeyed children are removed.",
        script: &[Remove, Remove],
        kind: FixtureKind::Positional,
    },
    ReconcileFixture {
        name: "positional_children_cleared",
        before: "<div><p>a</p><p>b</p></div>",
        after: "<div></div>",
        covers: "All children removed.",
        script: &[Remove, Remove],
        kind: FixtureKind::Positional,
    },
    ReconcileFixture {
        name: "positional_children_from_empty",
        before: "<div></div>",
        after: "<div><p>a</p>b</div>",
        covers: "Children created under an empty element.",
        script: &[Insert, Insert],
        kind: FixtureKind::Positional,
    },
    ReconcileFixture {
        name: "positional_duplicate_keys_fallback",
        before: r#"<ul><li key="a">1</li><li key="a">2</li></ul>"#,
        after: r#"<ul><li key="a">1</li><li key="a">3</li></ul>"#,
        covers: "Duplicate keys fall back to positional matching.",
        script: &[Replace],
        kind: FixtureKind::Positional,
    },
    ReconcileFixture {
        name: "keyed_insert_middle",
        before: r#"<ul><li key="1">1</li><li key="2">2</li></ul>"#,
        after: r#"<ul><li key="1">1</li><li key="3">3</li><li key="2">2</li></ul>"#,
        covers: "Keyed insert in the middle leaves siblings alone.",
        script: &[Insert],
        kind: FixtureKind::Keyed,
    },
    ReconcileFixture {
        name: "keyed_append",
        before: r#"<ul><li key="1">1</li></ul>"#,
        after: r#"<ul><li key="1">1</li><li key="2">2</li></ul>"#,
        covers: "Keyed insert at the end.",
        script: &[Insert],
        kind: FixtureKind::Keyed,
    },
    ReconcileFixture {
        name: "keyed_remove_middle",
        before: r#"<ul><li key="1">1</li><li key="2">2</li><li key="3">3</li></ul>"#,
        after: r#"<ul><li key="1">1</li><li key="3">3</li></ul>"#,
        covers: "Keyed removal leaves siblings alone.",
        script: &[Remove],
        kind: FixtureKind::Keyed,
    },
    ReconcileFixture {
        name: "keyed_rotate",
        before: r#"<ol><li key="a">a</li><li key="b">b</li><li key="c">c</li><li key="d">d</li></ol>"#,
        after: r#"<ol><li key="d">d</li><li key="a">a</li><li key="b">b</li><li key="c">c</li></ol>"#,
        covers: "Moving the last keyed child to the front is one reorder.",
        script: &[Reorder],
        kind: FixtureKind::Keyed,
    },
    ReconcileFixture {
        name: "keyed_reverse",
        before: r#"<ol><li key="1">1</li><li key="2">2</li><li key="3">3</li></ol>"#,
        after: r#"<ol><li key="3">3</li><li key="2">2</li><li key="1">1</li></ol>"#,
        covers: "Pure permutation only reorders.",
        script: &[Reorder, Reorder],
        kind: FixtureKind::Keyed,
    },
    ReconcileFixture {
        name: "keyed_move_with_update",
        before: r#"<ul><li key="a" class="x">a</li><li key="b">b</li></ul>"#,
        after: r#"<ul><li key="b">b</li><li key="a" class="y">a</li></ul>"#,
        covers: "Moved keyed child is still diffed in place.",
        script: &[Reorder, Update],
        kind: FixtureKind::Keyed,
    },
    ReconcileFixture {
        name: "keyed_mixed_operations",
        before: r#"<ul><li key="1">1</li><li key="2">2</li><li key="3">3</li><li key="4">4</li></ul>"#,
        after: r#"<ul><li key="4">4</li><li key="5">5</li><li key="1">1</li><li key="3">3</li></ul>"#,
        covers: "Removals first, then moves and inserts in new order.",
        script: &[Remove, Reorder, Insert],
        kind: FixtureKind::Keyed,
    },
    ReconcileFixture {
        name: "keyed_replace_all",
        before: r#"<ul><li key="a">a</li><li key="b">b</li></ul>"#,
        after: r#"<ul><li key="c">c</li><li key="d">d</li></ul>"#,
        covers: "Disjoint key sets remove everything, then insert.",
        script: &[Remove, Remove, Insert, Insert],
        kind: FixtureKind::Keyed,
    },
    ReconcileFixture {
        name: "keyed_with_unkeyed_siblings",
        before: r#"<div><h2>Title</h2><p key="a">a</p><p key="b">b</p></div>"#,
        after: r#"<div><h2>Title</h2><p key="b">b</p><p key="a">a</p></div>"#,
        covers: "Unkeyed siblings match by ordinal next to keyed ones.",
        script: &[Reorder],
        kind: FixtureKind::Keyed,
    },
    ReconcileFixture {
        name: "nested_text_and_attribute",
        before: r#"<section><header><h1>Hi</h1></header><main><p class="a">x</p></main></section>"#,
        after: r#"<section><header><h1>Hello</h1></header><main><p class="b">x</p></main></section>"#,
        covers: "Edits come out in new-tree pre-order.",
        script: &[Replace, Update],
        kind: FixtureKind::Nested,
    },
    ReconcileFixture {
        name: "nested_keyed_inside_positional",
        before: r#"<div><nav><a key="home">Home</a><a key="docs">Docs</a></nav><p>body</p></div>"#,
        after: r#"<div><nav><a key="docs">Docs</a><a key="home">Home</a></nav><p>body</p><footer>end</footer></div>"#,
        covers: "Keyed list nested under positional siblings.",
        script: &[Reorder, Insert],
        kind: FixtureKind::Nested,
    },
];

pub fn fixtures() -> &'static [ReconcileFixture] {
    RECONCILE_CORPUS_V1
}
