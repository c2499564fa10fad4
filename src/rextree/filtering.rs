//! Visibility filter engine
//!
//! Marks every tree node visible or filtered from a predicate over node
//! content, then propagates visibility so the view stays coherent:
//!
//! 1. pre-visit: evaluate the predicate, record matches as visible;
//! 2. post-visit: a child of a visible parent becomes visible too, even if
//!    it fails the predicate on its own;
//! 3. every visible node forces its whole ancestor chain visible, so a
//!    matching leaf keeps its containing groups expanded;
//! 4. a final sweep emits one flat `{row, parent, filtered}` tuple per node
//!    so a view layer can hide/show rows without re-deriving tree shape.
//!
//! The engine is generic: consumers supply the predicate and the accessors
//! for their filtered-flag column.

use serde::Serialize;

use super::tree::{NodeId, Traversal, Tree};

/// One row of the flat visibility report handed to view layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilteredEntry {
    /// The node's position among its siblings.
    pub row: usize,
    /// The node itself.
    pub node: NodeId,
    /// Containing node; `None` for top-level rows.
    pub parent: Option<NodeId>,
    /// Whether the row should be hidden.
    pub filtered: bool,
}

/// Runs the four propagation phases over the whole tree and returns the
/// per-node visibility report in the tree's current display order.
///
/// `matches` decides raw predicate visibility per node; `get_filtered` /
/// `set_filtered` bind the engine to the consumer's filtered-flag column.
pub fn apply_visibility<C, P, G, S>(
    tree: &mut Tree<C>,
    mut matches: P,
    get_filtered: G,
    set_filtered: S,
) -> Vec<FilteredEntry>
where
    C: Clone + PartialEq,
    P: FnMut(&Tree<C>, NodeId) -> bool,
    G: Fn(&Tree<C>, NodeId) -> bool,
    S: Fn(&mut Tree<C>, NodeId, bool),
{
    let root = tree.root();
    let mut visible: Vec<NodeId> = Vec::new();

    // phase 1: raw predicate; phase 2: children inherit a visible parent
    {
        let mut pre = |t: &mut Tree<C>, id: NodeId| {
            let matched = matches(t, id);
            set_filtered(t, id, !matched);
            if matched {
                visible.push(id);
            }
            true
        };
        tree.visit(root, Some(&mut pre), None, Traversal::document_children());
    }
    {
        let mut post = |t: &mut Tree<C>, id: NodeId| {
            if let Some(parent) = t.parent(id) {
                if parent != t.root() && !get_filtered(t, parent) && get_filtered(t, id) {
                    set_filtered(t, id, false);
                    visible.push(id);
                }
            }
            true
        };
        tree.visit(root, None, Some(&mut post), Traversal::document_children());
    }

    // phase 3: a visible node keeps its whole ancestor chain visible
    for node in visible {
        let mut force = |t: &mut Tree<C>, id: NodeId| {
            set_filtered(t, id, false);
            true
        };
        tree.visit_parents(node, Some(&mut force), None, false, false);
    }

    // phase 4: flatten the verdicts for the view layer
    let mut entries: Vec<FilteredEntry> = Vec::new();
    {
        let mut collect = |t: &mut Tree<C>, id: NodeId| {
            let parent = t.parent(id).filter(|p| *p != t.root());
            entries.push(FilteredEntry {
                row: t.row(id),
                node: id,
                parent,
                filtered: get_filtered(t, id),
            });
            true
        };
        let sorted_pass = Traversal {
            visit_self: false,
            sorted: true,
            reverse: false,
        };
        tree.visit(root, Some(&mut collect), None, sorted_pass);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rextree::tree::TreeBehavior;

    // columns: 0 = name, 1 = filtered flag ("y"/"n")
    type T = Tree<String>;

    fn tree_with(paths: &[&[&str]]) -> T {
        let mut tree = Tree::new(TreeBehavior::default());
        for path in paths {
            let rows: Vec<Vec<String>> = path
                .iter()
                .map(|seg| vec![seg.to_string(), "n".to_string()])
                .collect();
            tree.add_data(&rows, None);
        }
        tree
    }

    fn run(tree: &mut T, needle: &str) -> Vec<FilteredEntry> {
        let needle = needle.to_string();
        apply_visibility(
            tree,
            move |t, id| {
                t.data(id, 0)
                    .map(|v| v.contains(needle.as_str()))
                    .unwrap_or(false)
            },
            |t, id| t.data(id, 1).map(|v| v == "y").unwrap_or(false),
            |t, id, filtered| {
                t.set_cell(id, 1, if filtered { "y" } else { "n" }.to_string());
            },
        )
    }

    fn filtered_of(tree: &T, entries: &[FilteredEntry], name: &str) -> bool {
        entries
            .iter()
            .find(|e| tree.data(e.node, 0).map(String::as_str) == Some(name))
            .map(|e| e.filtered)
            .unwrap()
    }

    #[test]
    fn test_matching_leaf_keeps_ancestors_visible() {
        let mut tree = tree_with(&[&["a", "b", "needle"], &["x", "y", "z"]]);
        let entries = run(&mut tree, "needle");

        assert!(!filtered_of(&tree, &entries, "needle"));
        assert!(!filtered_of(&tree, &entries, "a"));
        assert!(!filtered_of(&tree, &entries, "b"));
        // the unrelated subtree stays hidden
        assert!(filtered_of(&tree, &entries, "x"));
        assert!(filtered_of(&tree, &entries, "y"));
        assert!(filtered_of(&tree, &entries, "z"));
    }

    #[test]
    fn test_children_inherit_visible_parent() {
        let mut tree = tree_with(&[&["hit", "child1"], &["hit", "child2"]]);
        let entries = run(&mut tree, "hit");
        assert!(!filtered_of(&tree, &entries, "hit"));
        assert!(!filtered_of(&tree, &entries, "child1"));
        assert!(!filtered_of(&tree, &entries, "child2"));
    }

    #[test]
    fn test_entries_cover_every_node() {
        let mut tree = tree_with(&[&["a", "b"], &["c"]]);
        let entries = run(&mut tree, "");
        assert_eq!(entries.len(), 3);
        // top-level rows report no parent
        let top: Vec<_> = entries.iter().filter(|e| e.parent.is_none()).collect();
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_no_match_hides_everything() {
        let mut tree = tree_with(&[&["a", "b"]]);
        let entries = run(&mut tree, "zzz");
        assert!(entries.iter().all(|e| e.filtered));
    }
}
