//! Normalized tree snapshot
//!
//! A canonical, serializable representation of the token tree, so output
//! surfaces (JSON, terminal rendering) consume one structure instead of
//! re-deriving traversal logic.

use serde::Serialize;

use super::token::{Rgb, RowKind, Span, TokenColumn, TokenValue};
use super::tree::{NodeId, Tree};

/// Snapshot of one token-tree node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSnapshot {
    /// Row label, e.g. `Text`, `VarGroup`, `Group`.
    pub kind: String,
    pub row_type: RowKind,
    /// Literal text or extracted variable name.
    pub value: String,
    pub group_name: String,
    pub span: Span,
    pub color: Option<Rgb>,
    pub filtered: bool,
    pub children: Vec<TreeSnapshot>,
}

/// Builds the snapshot forest for the children of the tree root, in
/// document order.
pub fn snapshot_tokens(tree: &Tree<TokenValue>) -> Vec<TreeSnapshot> {
    tree.children(tree.root())
        .iter()
        .map(|id| snapshot_node(tree, *id))
        .collect()
}

fn snapshot_node(tree: &Tree<TokenValue>, id: NodeId) -> TreeSnapshot {
    let cell = |column: TokenColumn| tree.data(id, column.index());
    TreeSnapshot {
        kind: cell(TokenColumn::ItemType)
            .map(|c| c.str().to_string())
            .unwrap_or_default(),
        row_type: cell(TokenColumn::RowType)
            .map(TokenValue::row_kind)
            .unwrap_or(RowKind::Text),
        value: cell(TokenColumn::Value)
            .map(|c| c.str().to_string())
            .unwrap_or_default(),
        group_name: cell(TokenColumn::GroupName)
            .map(|c| c.str().to_string())
            .unwrap_or_default(),
        span: cell(TokenColumn::Range)
            .map(TokenValue::span)
            .unwrap_or_default(),
        color: cell(TokenColumn::Color).and_then(TokenValue::color),
        filtered: cell(TokenColumn::IsFiltered)
            .map(TokenValue::boolean)
            .unwrap_or(false),
        children: tree
            .children(id)
            .iter()
            .map(|child| snapshot_node(tree, *child))
            .collect(),
    }
}

/// Renders a snapshot forest as indented text, one node per line:
///
/// ```text
/// VarGroup "timestamp" [0..17)
///   Text "\d+" [12..15)
/// ```
pub fn render_text(nodes: &[TreeSnapshot]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(node, 0, &mut out);
    }
    out
}

fn render_node(node: &TreeSnapshot, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&node.kind);
    out.push_str(&format!(" {:?} {}", node.value, node.span));
    if !node.group_name.is_empty() {
        out.push_str(&format!(" name={:?}", node.group_name));
    }
    if node.filtered {
        out.push_str(" (filtered)");
    }
    out.push('\n');
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}
