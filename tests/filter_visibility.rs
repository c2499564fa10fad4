//! Filter propagation over the token tree, exercised through the model.

use rextree::rextree::filtering::FilteredEntry;
use rextree::rextree::models::tokens::{FilterOptions, TokenTreeModel};
use rextree::rextree::token::{TokenColumn, TokenValue};
use rextree::rextree::tree::NodeId;

fn filtered(entries: &[FilteredEntry], node: NodeId) -> bool {
    entries
        .iter()
        .find(|e| e.node == node)
        .map(|e| e.filtered)
        .expect("every node is reported")
}

fn text_node(model: &TokenTreeModel, value: &str) -> NodeId {
    fn search(
        model: &TokenTreeModel,
        id: NodeId,
        value: &str,
    ) -> Option<NodeId> {
        let tree = model.tree();
        if tree.data(id, TokenColumn::Value.index()).map(TokenValue::str) == Some(value) {
            return Some(id);
        }
        for child in tree.children(id) {
            if let Some(found) = search(model, *child, value) {
                return Some(found);
            }
        }
        None
    }
    let root = model.tree().root();
    model
        .tree()
        .children(root)
        .iter()
        .find_map(|id| search(model, *id, value))
        .expect("node with value present")
}

#[test]
fn test_matching_leaf_keeps_both_ancestors_visible() {
    let mut model = TokenTreeModel::new();
    model.set_used_regex("((needle)x)(misc)");
    let entries = model.filter_tokens("needle");

    let leaf = text_node(&model, "needle");
    let inner = model.tree().parent(leaf).unwrap();
    let outer = model.tree().parent(inner).unwrap();
    assert!(!filtered(&entries, leaf));
    assert!(!filtered(&entries, inner));
    assert!(!filtered(&entries, outer));

    // the unrelated sibling subtree stays hidden
    let misc_text = text_node(&model, "misc");
    let misc_group = model.tree().parent(misc_text).unwrap();
    assert!(filtered(&entries, misc_text));
    assert!(filtered(&entries, misc_group));
}

#[test]
fn test_entries_report_parent_links_for_view_layer() {
    let mut model = TokenTreeModel::new();
    model.set_used_regex("(a)(b)");
    let entries = model.filter_tokens("");

    for entry in &entries {
        match model.tree().parent(entry.node) {
            Some(parent) if parent != model.tree().root() => {
                assert_eq!(entry.parent, Some(parent));
            }
            _ => assert_eq!(entry.parent, None),
        }
        assert_eq!(entry.row, model.tree().row(entry.node));
    }
}

#[test]
fn test_filter_reruns_after_structure_change() {
    let mut model = TokenTreeModel::new();
    model.set_used_regex("(alpha)");
    let first = model.filter_tokens("alpha");
    assert!(first.iter().any(|e| !e.filtered));

    // rebuilding the tree keeps the active filter
    let second = model.set_used_regex("(beta)");
    assert!(second.iter().all(|e| e.filtered));
    let third = model.filter_tokens("beta");
    assert!(third.iter().any(|e| !e.filtered));
}

#[test]
fn test_invalid_filter_pattern_hides_nothing() {
    let mut model = TokenTreeModel::new();
    model.set_used_regex("(a)(b)");
    let entries = model.filter_tokens("[unclosed");
    assert!(entries.iter().all(|e| !e.filtered));
}

#[test]
fn test_variables_only_with_text_filter() {
    let mut model = TokenTreeModel::new();
    model.set_used_regex(r"(?<VAR_first>1)(?<VAR_second>2)(plain)");
    model.set_filter_options(FilterOptions {
        variables_only: true,
    });
    let entries = model.filter_tokens("first");

    let root = model.tree().root();
    let children = model.tree().children(root).to_vec();
    // only the variable group whose value matches the text stays visible
    assert!(!filtered(&entries, children[0]));
    assert!(filtered(&entries, children[1]));
    assert!(filtered(&entries, children[2]));
}
