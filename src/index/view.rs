//! Read-only traversal contract shared by both tree variants.
//!
//! A presentation layer only ever needs four things from a node: whether it
//! is a leaf, its keys, its children, and (B+-tree only) the next leaf in the
//! chain. [`NodeView`] exposes exactly that, so layout code and the invariant
//! checker can be written once for both variants.

use std::fmt::{self, Debug};

/// Read-only view of one node.
///
/// Implemented by `&Node<K>` for the classic tree and by
/// [`NodeRef`](crate::index::NodeRef) for the B+-tree.
pub trait NodeView<'a, K: 'a>: Copy {
    /// True for leaf nodes.
    fn is_leaf(&self) -> bool;

    /// Keys of this node, strictly ascending.
    fn keys(&self) -> &'a [K];

    /// Children in key order; empty for leaves.
    fn children(&self) -> Vec<Self>;

    /// The following leaf in the leaf chain.
    ///
    /// Always `None` for trees without a leaf chain and for internal nodes.
    fn next_leaf(&self) -> Option<Self> {
        None
    }
}

/// Number of levels from `root` down to the leaves (a lone leaf is 1).
pub fn height<'a, K: 'a, N: NodeView<'a, K>>(root: N) -> usize {
    let mut height = 1;
    let mut node = root;
    while let Some(&first) = node.children().first() {
        node = first;
        height += 1;
    }
    height
}

/// Nodes grouped by depth, each row left to right.
///
/// This is the input a layout engine needs to assign coordinates level by
/// level.
pub fn levels<'a, K: 'a, N: NodeView<'a, K>>(root: N) -> Vec<Vec<N>> {
    let mut rows = vec![vec![root]];
    loop {
        let next: Vec<N> = rows
            .last()
            .map(|row| row.iter().flat_map(|node| node.children()).collect())
            .unwrap_or_default();
        if next.is_empty() {
            return rows;
        }
        rows.push(next);
    }
}

/// Leaves in left-to-right order, found by walking the tree (not the chain).
pub fn leaves<'a, K: 'a, N: NodeView<'a, K>>(root: N) -> Vec<N> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_leaf() {
            out.push(node);
        } else {
            stack.extend(node.children().into_iter().rev());
        }
    }
    out
}

/// Write the subtree under `root` as indented text, one node per line.
///
/// Leaves are prefixed with `L`:
/// ```text
/// ["C"]
///   L["A", "B"]
///   L["D", "E"]
/// ```
pub fn render<'a, K, N>(root: N, f: &mut fmt::Formatter<'_>) -> fmt::Result
where
    K: Debug + 'a,
    N: NodeView<'a, K>,
{
    render_depth(root, f, 0)
}

fn render_depth<'a, K, N>(node: N, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result
where
    K: Debug + 'a,
    N: NodeView<'a, K>,
{
    f.write_str(&"  ".repeat(depth))?;
    if node.is_leaf() {
        f.write_str("L")?;
    }
    writeln!(f, "{:?}", node.keys())?;
    for child in node.children() {
        render_depth(child, f, depth + 1)?;
    }
    Ok(())
}
