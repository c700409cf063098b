//! Raw HTML node collection
//!
//! Walks the mdast in document order and hands out every `Node::Html`,
//! however deeply it is nested (list items, blockquotes, table cells, ...).

use markdown::mdast::{Html, Node};

/// Collect mutable references to every raw HTML node, in document order
pub fn collect_html_nodes(root: &mut Node) -> Vec<&mut Html> {
    let mut found = Vec::new();
    collect_into(root, &mut found);
    tracing::trace!(count = found.len(), "Collected raw HTML nodes");
    found
}

fn collect_into<'a>(node: &'a mut Node, found: &mut Vec<&'a mut Html>) {
    match node {
        Node::Html(html) => found.push(html),
        other => {
            if let Some(children) = other.children_mut() {
                for child in children {
                    collect_into(child, found);
                }
            }
        }
    }
}

/// Values of every raw HTML node, in document order
pub fn html_values(root: &Node) -> Vec<&str> {
    let mut values = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if let Node::Html(html) = node {
            values.push(html.value.as_str());
        } else if let Some(children) = node.children() {
            // Reverse so the leftmost child is visited first
            stack.extend(children.iter().rev());
        }
    }

    values
}
