use crate::types::Node;
use std::fmt::{self, Write};
use std::sync::OnceLock;

/// Deterministic tree serialization and equality rules for reconciliation tests.
/// Not a stable format.
///
/// Equivalence rules:
/// - Node kinds, element names and identity keys must match.
/// - Attributes must match as maps (iteration is already sorted).
/// - Text must match exactly (post entity decode).
/// - Live handles are compared only when `ignore_handles` is false.
#[derive(Clone, Copy, Debug)]
pub struct TreeSnapshotOptions {
    pub ignore_handles: bool,
}

impl Default for TreeSnapshotOptions {
    fn default() -> Self {
        Self {
            ignore_handles: true,
        }
    }
}

#[derive(Debug)]
pub struct TreeSnapshot {
    lines: Vec<String>,
}

impl TreeSnapshot {
    pub fn new(root: &Node, options: TreeSnapshotOptions) -> Self {
        let mut lines = Vec::new();
        walk_snapshot(root, &options, 0, &mut lines);
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for TreeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug)]
pub struct TreeMismatch<'a> {
    path: String,
    detail: String,
    expected_node: &'a Node,
    actual_node: &'a Node,
    options: TreeSnapshotOptions,
    expected_subtree: OnceLock<String>,
    actual_subtree: OnceLock<String>,
}

impl TreeMismatch<'_> {
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for TreeMismatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected_subtree = self
            .expected_subtree
            .get_or_init(|| TreeSnapshot::new(self.expected_node, self.options).render());
        let actual_subtree = self
            .actual_subtree
            .get_or_init(|| TreeSnapshot::new(self.actual_node, self.options).render());
        writeln!(f, "tree mismatch at {}: {}", self.path, self.detail)?;
        writeln!(
            f,
            "expected: {}",
            truncate_line(format_node_line(self.expected_node, &self.options), 160)
        )?;
        writeln!(
            f,
            "actual:   {}",
            truncate_line(format_node_line(self.actual_node, &self.options), 160)
        )?;
        writeln!(f, "expected subtree:\n{expected_subtree}")?;
        writeln!(f, "actual subtree:\n{actual_subtree}")
    }
}

impl std::error::Error for TreeMismatch<'_> {}

pub fn assert_tree_eq(expected: &Node, actual: &Node, options: TreeSnapshotOptions) {
    if let Err(mismatch) = compare_tree(expected, actual, options) {
        panic!("{mismatch}");
    }
}

pub fn compare_tree<'a>(
    expected: &'a Node,
    actual: &'a Node,
    options: TreeSnapshotOptions,
) -> Result<(), Box<TreeMismatch<'a>>> {
    let mut path = vec![node_label(expected)];
    compare_nodes(expected, actual, &options, &mut path)
}

fn compare_nodes<'a>(
    expected: &'a Node,
    actual: &'a Node,
    options: &TreeSnapshotOptions,
    path: &mut Vec<String>,
) -> Result<(), Box<TreeMismatch<'a>>> {
    if !options.ignore_handles && expected.handle() != actual.handle() {
        return Err(mismatch(path, "handle", expected, actual, options));
    }
    match (expected, actual) {
        (
            Node::Element {
                name,
                key,
                attributes,
                children,
                ..
            },
            Node::Element {
                name: actual_name,
                key: actual_key,
                attributes: actual_attributes,
                children: actual_children,
                ..
            },
        ) => {
            if name != actual_name {
                return Err(mismatch(path, "element name", expected, actual, options));
            }
            if key != actual_key {
                return Err(mismatch(path, "identity key", expected, actual, options));
            }
            if attributes != actual_attributes {
                return Err(mismatch(path, "attributes", expected, actual, options));
            }
            if children.len() != actual_children.len() {
                let detail = format!(
                    "child count (expected {}, actual {})",
                    children.len(),
                    actual_children.len()
                );
                return Err(mismatch(path, &detail, expected, actual, options));
            }
            for (idx, (exp, act)) in children.iter().zip(actual_children).enumerate() {
                path.push(format!("{}[{}]", node_label(exp), idx));
                let result = compare_nodes(exp, act, options, path);
                path.pop();
                result?;
            }
            Ok(())
        }
        (Node::Text { text, .. }, Node::Text { text: actual_text, .. }) => {
            if text != actual_text {
                return Err(mismatch(path, "text", expected, actual, options));
            }
            Ok(())
        }
        _ => Err(mismatch(path, "node kind", expected, actual, options)),
    }
}

fn mismatch<'a>(
    path: &[String],
    detail: &str,
    expected: &'a Node,
    actual: &'a Node,
    options: &TreeSnapshotOptions,
) -> Box<TreeMismatch<'a>> {
    Box::new(TreeMismatch {
        path: format!("/{}", path.join("/")),
        detail: detail.to_string(),
        expected_node: expected,
        actual_node: actual,
        options: *options,
        expected_subtree: OnceLock::new(),
        actual_subtree: OnceLock::new(),
    })
}

fn node_label(node: &Node) -> String {
    match node {
        Node::Element {
            name,
            key,
            attributes,
            ..
        } => {
            let mut label = String::from(name.as_ref());
            if let Some(key) = key {
                label.push('@');
                write_escaped(&mut label, key);
            } else if let Some(id) = attributes.get("id").filter(|v| !v.is_empty()) {
                label.push('#');
                write_escaped(&mut label, id);
            }
            label
        }
        Node::Text { .. } => "#text".to_string(),
    }
}

fn truncate_line(mut line: String, max_len: usize) -> String {
    if line.len() > max_len {
        let mut cut = max_len.saturating_sub(3);
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
        line.push_str("...");
    }
    line
}

fn walk_snapshot(node: &Node, options: &TreeSnapshotOptions, depth: usize, out: &mut Vec<String>) {
    const INDENT_STEP: usize = 2;
    let mut line = " ".repeat(depth * INDENT_STEP);
    write_node_line(&mut line, node, options);
    out.push(line);
    for child in node.children() {
        walk_snapshot(child, options, depth + 1, out);
    }
}

fn format_node_line(node: &Node, options: &TreeSnapshotOptions) -> String {
    let mut line = String::new();
    write_node_line(&mut line, node, options);
    line
}

fn write_node_line(out: &mut String, node: &Node, options: &TreeSnapshotOptions) {
    match node {
        Node::Element {
            handle,
            name,
            key,
            attributes,
            ..
        } => {
            out.push('<');
            out.push_str(name);
            if let Some(key) = key {
                out.push_str(" @key=\"");
                write_escaped(out, key);
                out.push('"');
            }
            for (attr, value) in attributes {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                write_escaped(out, value);
                out.push('"');
            }
            if !options.ignore_handles {
                write_handle(out, *handle);
            }
            out.push('>');
        }
        Node::Text { handle, text } => {
            out.push('"');
            write_escaped(out, text);
            out.push('"');
            if !options.ignore_handles {
                write_handle(out, *handle);
            }
        }
    }
}

fn write_handle(out: &mut String, handle: Option<core_types::LiveHandle>) {
    match handle {
        Some(handle) => {
            let _ = write!(out, " {handle}");
        }
        None => out.push_str(" #unbound"),
    }
}

fn write_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ if ch.is_ascii() => out.push(ch),
            _ => {
                let _ = write!(out, "\\u{{{:X}}}", ch as u32);
            }
        }
    }
}
