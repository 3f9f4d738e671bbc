use crate::diagnostics::ApplyWarning;
use core_types::LiveHandle;
use live_dom::{LiveTree, LiveTreeError, to_live};
use markup::{Edit, EditKind, Position};

/// Applies one edit to `tree`.
///
/// Every handle is resolved against the tree as it is now, not as it was when
/// the edit was computed. A returned warning means the tree was left as it
/// was before the call.
pub fn apply_edit(tree: &mut LiveTree, edit: Edit) -> Result<(), ApplyWarning> {
    let kind = edit.kind();
    log::trace!(target: "runtime_patch", "applying {kind} at {}", edit.address());
    match edit {
        Edit::Insert { parent, at, node } => {
            let len = tree
                .children(parent)
                .ok_or(ApplyWarning::UnresolvableAddress {
                    kind,
                    handle: parent,
                })?
                .len();
            let index = match at {
                Position::Index(index) if index > len => {
                    return Err(ApplyWarning::OutOfRange {
                        kind,
                        parent,
                        index,
                        len,
                    });
                }
                Position::Index(index) => Some(index),
                Position::Append => None,
            };
            if tree.element(parent).is_none() {
                return Err(rejected(kind, LiveTreeError::NotAnElement(parent)));
            }
            let child = to_live(tree, &node)
                .map_err(|error| ApplyWarning::Materialization { kind, error })?;
            tree.insert_child(parent, index, child)
                .map_err(|error| discard(tree, child, kind, error))
        }
        Edit::Replace { target, node } => {
            if !tree.contains(target) {
                return Err(ApplyWarning::UnresolvableAddress {
                    kind,
                    handle: target,
                });
            }
            if target == tree.root() {
                return Err(rejected(kind, LiveTreeError::RootNode(target)));
            }
            if tree.parent(target).is_none() {
                return Err(rejected(kind, LiveTreeError::Detached(target)));
            }
            let replacement = to_live(tree, &node)
                .map_err(|error| ApplyWarning::Materialization { kind, error })?;
            tree.replace(target, replacement)
                .map_err(|error| discard(tree, replacement, kind, error))
        }
        Edit::Update { target, changes } => tree
            .update_attributes(target, &changes)
            .map_err(|error| classify(kind, error)),
        Edit::Remove { target } => tree
            .remove_subtree(target)
            .map_err(|error| classify(kind, error)),
        Edit::Reorder { parent, from, to } => tree
            .move_child(parent, from, to)
            .map_err(|error| classify(kind, error)),
    }
}

fn classify(kind: EditKind, error: LiveTreeError) -> ApplyWarning {
    match error {
        LiveTreeError::Unresolved(handle) => ApplyWarning::UnresolvableAddress { kind, handle },
        LiveTreeError::IndexOutOfRange { parent, index, len } => ApplyWarning::OutOfRange {
            kind,
            parent,
            index,
            len,
        },
        error => rejected(kind, error),
    }
}

fn rejected(kind: EditKind, error: LiveTreeError) -> ApplyWarning {
    ApplyWarning::Rejected { kind, error }
}

/// Drops a materialized payload that could not be attached.
fn discard(
    tree: &mut LiveTree,
    payload: LiveHandle,
    kind: EditKind,
    error: LiveTreeError,
) -> ApplyWarning {
    if let Err(cleanup) = tree.remove_subtree(payload) {
        log::trace!(target: "runtime_patch", "payload {payload} already gone: {cleanup}");
    }
    classify(kind, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use live_dom::{MaterializeError, from_live};
    use markup::traverse::unbind;
    use markup::tree_snapshot::{TreeSnapshotOptions, assert_tree_eq};
    use markup::{AttributeChange, Node, parse_fragment};
    use std::sync::Arc;

    fn mounted(markup: &str) -> (LiveTree, LiveHandle) {
        let mut tree = LiveTree::new();
        let handle = to_live(&mut tree, &parse_fragment(markup).expect("parse")).expect("live");
        let root = tree.root();
        tree.append_child(root, handle).expect("attach");
        (tree, handle)
    }

    fn child(tree: &LiveTree, parent: LiveHandle, index: usize) -> LiveHandle {
        tree.children(parent).expect("children")[index]
    }

    fn assert_live(tree: &LiveTree, handle: LiveHandle, markup: &str) {
        assert_tree_eq(
            &parse_fragment(markup).expect("parse"),
            &unbind(&from_live(tree, handle).expect("load")),
            TreeSnapshotOptions::default(),
        );
    }

    #[test]
    fn insert_at_index_and_append() {
        let (mut tree, ul) = mounted("<ul><li>a</li></ul>");
        apply_edit(
            &mut tree,
            Edit::Insert {
                parent: ul,
                at: Position::Index(0),
                node: parse_fragment("<li>first</li>").expect("parse"),
            },
        )
        .expect("insert");
        apply_edit(
            &mut tree,
            Edit::Insert {
                parent: ul,
                at: Position::Append,
                node: Node::element("li"),
            },
        )
        .expect("append");
        assert_live(&tree, ul, "<ul><li>first</li><li>a</li><li></li></ul>");
    }

    #[test]
    fn insert_past_the_end_is_out_of_range_and_creates_nothing() {
        let (mut tree, ul) = mounted("<ul><li>a</li></ul>");
        let before = tree.len();
        let warning = apply_edit(
            &mut tree,
            Edit::Insert {
                parent: ul,
                at: Position::Index(3),
                node: Node::element("li"),
            },
        );
        assert_eq!(
            warning,
            Err(ApplyWarning::OutOfRange {
                kind: EditKind::Insert,
                parent: ul,
                index: 3,
                len: 1
            })
        );
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn insert_of_blocked_tag_is_a_materialization_warning() {
        let (mut tree, div) = mounted("<div></div>");
        let warning = apply_edit(
            &mut tree,
            Edit::Insert {
                parent: div,
                at: Position::Append,
                node: Node::element("script"),
            },
        );
        assert_eq!(
            warning,
            Err(ApplyWarning::Materialization {
                kind: EditKind::Insert,
                error: MaterializeError::BlockedTag("script".to_string()),
            })
        );
    }

    #[test]
    fn replace_substitutes_in_place() {
        let (mut tree, div) = mounted("<div><p>a</p><p>b</p></div>");
        let first = child(&tree, div, 0);
        apply_edit(
            &mut tree,
            Edit::Replace {
                target: first,
                node: parse_fragment("<h2>title</h2>").expect("parse"),
            },
        )
        .expect("replace");
        assert!(!tree.contains(first));
        assert_live(&tree, div, "<div><h2>title</h2><p>b</p></div>");
    }

    #[test]
    fn replace_of_missing_target_is_unresolvable() {
        let (mut tree, _) = mounted("<div></div>");
        let before = tree.len();
        assert_eq!(
            apply_edit(
                &mut tree,
                Edit::Replace {
                    target: LiveHandle(77),
                    node: Node::text("x"),
                },
            ),
            Err(ApplyWarning::UnresolvableAddress {
                kind: EditKind::Replace,
                handle: LiveHandle(77),
            })
        );
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn replace_of_detached_target_is_rejected_and_keeps_both_subtrees() {
        let (mut tree, div) = mounted("<div><p>keep me</p></div>");
        tree.detach(div).expect("foreign detach");
        let before = tree.len();
        assert_eq!(
            apply_edit(
                &mut tree,
                Edit::Replace {
                    target: div,
                    node: parse_fragment("<span>x</span>").expect("parse"),
                },
            ),
            Err(ApplyWarning::Rejected {
                kind: EditKind::Replace,
                error: LiveTreeError::Detached(div),
            })
        );
        assert_eq!(tree.len(), before);
        assert!(tree.contains(div));
        assert_eq!(tree.children(div).map(<[_]>::len), Some(1));
    }

    #[test]
    fn update_merges_style_and_rebinds_listeners() {
        let (mut tree, button) =
            mounted(r#"<button style="color: red; margin: 0" onclick="save">Go</button>"#);
        tree.element_mut(button)
            .expect("element")
            .style
            .set("opacity", "0.5");
        apply_edit(
            &mut tree,
            Edit::Update {
                target: button,
                changes: vec![
                    AttributeChange {
                        name: Arc::from("onclick"),
                        old: Some("save".to_string()),
                        new: None,
                    },
                    AttributeChange {
                        name: Arc::from("style"),
                        old: Some("color: red; margin: 0".to_string()),
                        new: Some("color: blue".to_string()),
                    },
                ],
            },
        )
        .expect("update");
        let element = tree.element(button).expect("element");
        assert_eq!(element.style.get("color"), Some("blue"));
        assert_eq!(element.style.get("margin"), None);
        assert_eq!(element.style.get("opacity"), Some("0.5"));
        assert_eq!(element.listener("click"), None);
    }

    #[test]
    fn update_on_text_is_rejected() {
        let (mut tree, p) = mounted("<p>x</p>");
        let text = child(&tree, p, 0);
        let warning = apply_edit(
            &mut tree,
            Edit::Update {
                target: text,
                changes: Vec::new(),
            },
        );
        assert_eq!(
            warning,
            Err(ApplyWarning::Rejected {
                kind: EditKind::Update,
                error: LiveTreeError::NotAnElement(text),
            })
        );
    }

    #[test]
    fn remove_twice_records_the_second() {
        let (mut tree, ul) = mounted("<ul><li>a</li><li>b</li></ul>");
        let a = child(&tree, ul, 0);
        apply_edit(&mut tree, Edit::Remove { target: a }).expect("remove");
        assert_eq!(
            apply_edit(&mut tree, Edit::Remove { target: a }),
            Err(ApplyWarning::UnresolvableAddress {
                kind: EditKind::Remove,
                handle: a,
            })
        );
        assert_live(&tree, ul, "<ul><li>b</li></ul>");
    }

    #[test]
    fn removing_the_tree_root_is_rejected() {
        let mut tree = LiveTree::new();
        let root = tree.root();
        assert_eq!(
            apply_edit(&mut tree, Edit::Remove { target: root }),
            Err(ApplyWarning::Rejected {
                kind: EditKind::Remove,
                error: LiveTreeError::RootNode(root),
            })
        );
        assert!(tree.contains(root));
    }

    #[test]
    fn reorder_moves_and_reports_out_of_range() {
        let (mut tree, ol) = mounted("<ol><li>a</li><li>b</li><li>c</li></ol>");
        apply_edit(
            &mut tree,
            Edit::Reorder {
                parent: ol,
                from: 2,
                to: 0,
            },
        )
        .expect("reorder");
        assert_live(&tree, ol, "<ol><li>c</li><li>a</li><li>b</li></ol>");
        assert_eq!(
            apply_edit(
                &mut tree,
                Edit::Reorder {
                    parent: ol,
                    from: 5,
                    to: 0,
                },
            ),
            Err(ApplyWarning::OutOfRange {
                kind: EditKind::Reorder,
                parent: ol,
                index: 5,
                len: 3,
            })
        );
    }
}
