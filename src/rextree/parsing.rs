//! Structural regex parser
//!
//! Decomposes a regex string into an ordered tree of literal text runs and
//! groups. This is not a regex engine: quantifiers, classes and alternation
//! stay inside literal runs; only the grouping structure is understood. The
//! scan is a single left-to-right pass over the characters, driven by an
//! explicit stack of in-progress frames so that nesting depth is never tied
//! to call-stack depth.
//!
//! The scan never fails: unterminated group names and unbalanced delimiters
//! produce a best-effort tree, and authoritative syntax validity is checked
//! separately when a regex is reassembled (see
//! [`validation`](super::validation)).

use super::scripting::parse_group_name;
use super::token::{
    GroupSyntax, RowKind, Span, TokenColumn, TokenValue,
};
use super::tree::{NodeId, SortOrder, Tree, TreeBehavior};

/// Once-only analysis state of a frame property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Analysis {
    NotChecked,
    Found,
    NotFound,
}

/// One in-progress node on the parse stack.
struct Frame {
    node: NodeId,
    index: i64,
    label: String,
    value: String,
    color: Option<super::token::Rgb>,
    from: usize,
    row: RowKind,
    group_name: String,
    syntax: Option<GroupSyntax>,
    is_root: bool,
    name_state: Analysis,
    noncapturing_state: Analysis,
}

impl Frame {
    fn root(node: NodeId) -> Self {
        Self {
            node,
            index: 0,
            label: String::new(),
            value: String::new(),
            color: None,
            from: 0,
            row: RowKind::Text,
            group_name: String::new(),
            syntax: None,
            is_root: true,
            name_state: Analysis::NotChecked,
            noncapturing_state: Analysis::NotChecked,
        }
    }
}

/// Builds an empty token tree with the column set the parser fills in and
/// the comparator the token model sorts with: numeric for the index column,
/// case-insensitive for the textual columns.
pub fn new_token_tree() -> Tree<TokenValue> {
    let behavior = TreeBehavior {
        sort: Some(Box::new(|column, left, right| {
            if column == TokenColumn::Index.index() {
                let l = left.get(column).map(TokenValue::int).unwrap_or(0);
                let r = right.get(column).map(TokenValue::int).unwrap_or(0);
                l.cmp(&r)
            } else {
                let l = left.get(column).map(TokenValue::str).unwrap_or("");
                let r = right.get(column).map(TokenValue::str).unwrap_or("");
                l.to_lowercase().cmp(&r.to_lowercase())
            }
        })),
        find: None,
        duplicate: None,
    };
    let mut tree = Tree::new(behavior);
    for column in TokenColumn::all() {
        tree.append_column(TokenValue::Str(column.title().to_string()));
    }
    tree
}

/// Parses `regex` into a fresh token tree.
///
/// The resulting tree is sorted by the index column ascending, which is
/// document order. Visibility flags start out unfiltered; run the
/// visibility engine to establish them.
pub fn parse(regex: &str) -> Tree<TokenValue> {
    let mut tree = new_token_tree();
    parse_into(&mut tree, regex);
    tree
}

/// Parses `regex` into the children of `tree`'s root.
pub fn parse_into(tree: &mut Tree<TokenValue>, regex: &str) {
    let mut scanner = Scanner {
        tree,
        chars: regex.chars().collect(),
        pos: 0,
        to_range: 0,
        index_counter: 0,
        stack: Vec::new(),
    };
    scanner.run();
}

struct Scanner<'a> {
    tree: &'a mut Tree<TokenValue>,
    chars: Vec<char>,
    pos: usize,
    /// End offset recorded by the last delimiter hit; becomes the popped
    /// frame's span end.
    to_range: usize,
    index_counter: i64,
    stack: Vec<Frame>,
}

impl<'a> Scanner<'a> {
    fn run(&mut self) {
        let root = self.tree.root();
        self.stack.push(Frame::root(root));

        while self.pos < self.chars.len() {
            let top_is_root = self.top().is_root;
            if top_is_root {
                if self.check_group(false) {
                    self.push_frame(RowKind::NonVarGroup);
                } else {
                    self.push_frame(RowKind::Text);
                    self.consume_literal();
                }
                continue;
            }

            let row = self.top().row;
            match row {
                RowKind::Text => {
                    // a group opening here becomes a sibling of this text
                    // run, so the run closes first; a group closing ends
                    // both the run and its containing group
                    if self.check_group(false) {
                        self.pop_frame();
                        self.push_frame(RowKind::NonVarGroup);
                    } else if self.check_group(true) {
                        self.pop_frame();
                        self.pop_frame();
                    } else {
                        self.consume_literal();
                    }
                }
                RowKind::VarGroup | RowKind::NonCapturingGroup => {
                    // name analysis is settled for these kinds; only
                    // sub-groups, group end and literal text remain
                    if self.check_group(false) {
                        self.push_frame(RowKind::NonVarGroup);
                    } else if self.check_group(true) {
                        self.pop_frame();
                    } else {
                        self.push_frame(RowKind::Text);
                        self.consume_literal();
                    }
                }
                RowKind::NonVarGroup => {
                    if self.top().noncapturing_state == Analysis::NotChecked {
                        if self.check_non_capturing() {
                            let top = self.top_mut();
                            top.row = RowKind::NonCapturingGroup;
                            top.noncapturing_state = Analysis::Found;
                        } else {
                            self.top_mut().noncapturing_state = Analysis::NotFound;
                        }
                    } else if self.top().name_state == Analysis::NotChecked {
                        self.check_group_name();
                    } else if self.check_group(false) {
                        self.push_frame(RowKind::NonVarGroup);
                    } else if self.check_group(true) {
                        self.pop_frame();
                    } else {
                        self.push_frame(RowKind::Text);
                        self.consume_literal();
                    }
                }
            }
        }

        // anything still open closes at end of input
        self.to_range = self.chars.len();
        while self.stack.len() > 1 {
            self.pop_frame();
        }

        self.tree.sort_subtree(
            root,
            TokenColumn::Index.index(),
            SortOrder::Ascending,
            true,
        );
    }

    fn top(&self) -> &Frame {
        self.stack.last().expect("parse stack holds at least the root frame")
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().expect("parse stack holds at least the root frame")
    }

    fn consume_literal(&mut self) {
        let symbol = self.chars[self.pos];
        self.top_mut().value.push(symbol);
        self.pos += 1;
    }

    /// Checks whether the current character is a live `(` (entering) or `)`
    /// (leaving). A delimiter is live unless immediately preceded by exactly
    /// one backslash; two preceding backslashes make it live again.
    fn check_group(&mut self, leaving: bool) -> bool {
        let expected = if leaving { ')' } else { '(' };
        let chars = &self.chars;
        let pos = self.pos;
        let hit = if pos == 0 {
            !chars.is_empty() && chars[0] == expected
        } else if pos >= 2 {
            (chars[pos - 2] == '\\' && chars[pos - 1] == '\\' && chars[pos] == expected)
                || (chars[pos - 1] != '\\' && chars[pos] == expected)
        } else {
            chars[0] != '\\' && chars[1] == expected
        };
        if hit {
            self.to_range = pos;
            self.pos += 1;
        }
        hit
    }

    /// Checks for the two-character `?>` marker right after a group opened.
    fn check_non_capturing(&mut self) -> bool {
        let hit = self.pos + 1 < self.chars.len()
            && self.chars[self.pos] == '?'
            && self.chars[self.pos + 1] == '>';
        if hit {
            self.pos += 2;
        }
        hit
    }

    /// Checks for a named-group entrance right after a group opened, in the
    /// fixed order `?<` / `?'` / `?P<`, and on a hit collects the name up to
    /// its closing delimiter. Runs at most once per frame; an unterminated
    /// name leaves the frame nameless without failing the scan.
    fn check_group_name(&mut self) {
        let len = self.chars.len();
        let entered_group =
            self.pos > 0 && len > 1 && self.chars[self.pos - 1] == '(' && self.pos + 2 < len;
        if !entered_group {
            self.top_mut().name_state = Analysis::NotFound;
            return;
        }

        let (syntax, skip) = if self.chars[self.pos] == '?' && self.chars[self.pos + 1] == '<' {
            (Some(GroupSyntax::Angle), 2)
        } else if self.chars[self.pos] == '?' && self.chars[self.pos + 1] == '\'' {
            (Some(GroupSyntax::Quote), 2)
        } else if self.chars[self.pos] == '?'
            && self.chars[self.pos + 1] == 'P'
            && self.chars[self.pos + 2] == '<'
        {
            (Some(GroupSyntax::PythonStyle), 3)
        } else {
            (None, 0)
        };

        let Some(syntax) = syntax else {
            self.top_mut().name_state = Analysis::NotFound;
            return;
        };

        self.pos += skip;
        let closing = syntax.closing();
        let mut name = String::new();
        let mut terminated = false;
        while self.pos < len {
            let symbol = self.chars[self.pos];
            self.pos += 1;
            if symbol == closing {
                terminated = true;
                break;
            }
            name.push(symbol);
        }

        if !terminated {
            // inconclusive, not invalid: validity is re-checked by the
            // engine once the tree is reassembled
            self.top_mut().name_state = Analysis::NotFound;
            return;
        }

        let metadata = parse_group_name(&name);
        let top = self.top_mut();
        top.syntax = Some(syntax);
        top.group_name = name;
        top.name_state = Analysis::Found;
        match metadata.var_name {
            Some(var) => {
                top.row = RowKind::VarGroup;
                top.value = var;
            }
            None => {
                top.label = RowKind::NonVarGroup.label().to_string();
                top.value = top.group_name.clone();
            }
        }
        top.color = metadata.color;
    }

    fn push_frame(&mut self, row: RowKind) {
        let parent = self.top().node;
        let node = self
            .tree
            .append_child(parent, TokenValue::Int(self.pos as i64), Vec::new())
            .expect("parent frame node is alive");
        self.stack.push(Frame {
            node,
            index: self.index_counter,
            label: String::new(),
            value: String::new(),
            color: None,
            from: self.pos,
            row,
            group_name: String::new(),
            syntax: None,
            is_root: false,
            name_state: Analysis::NotChecked,
            noncapturing_state: Analysis::NotChecked,
        });
        self.index_counter += 1;
    }

    /// Finishes the current frame: fixes its span, defaults its label,
    /// synthesizes an empty text child for an empty group, writes the
    /// accumulated columns into the tree node and re-sorts the finished
    /// level.
    fn pop_frame(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let mut frame = self.stack.pop().expect("checked above");

        let mut span = Span::new(frame.from, self.to_range);
        if frame.row != RowKind::Text {
            // expand to cover the "()" delimiters; an unterminated group
            // popped at end of input stays clamped to the input
            span.from = span.from.saturating_sub(1);
            span.to = (span.to + 1).min(self.chars.len());
        }

        if frame.label.is_empty() {
            frame.label = frame.row.label().to_string();
        }

        if frame.row != RowKind::Text && self.tree.child_count(frame.node) == 0 {
            let data = vec![
                TokenValue::Str(String::new()),
                TokenValue::Int(self.index_counter),
                TokenValue::Str(RowKind::Text.label().to_string()),
                TokenValue::Color(None),
                TokenValue::Span(span),
                TokenValue::Row(RowKind::Text),
                TokenValue::Bool(false),
                TokenValue::Str(String::new()),
                TokenValue::Syntax(None),
            ];
            self.index_counter += 1;
            self.tree
                .append_child(frame.node, TokenValue::Int(span.from as i64), data);
        }

        let data = vec![
            TokenValue::Str(frame.value),
            TokenValue::Int(frame.index),
            TokenValue::Str(frame.label),
            TokenValue::Color(frame.color),
            TokenValue::Span(span),
            TokenValue::Row(frame.row),
            TokenValue::Bool(false),
            TokenValue::Str(frame.group_name),
            TokenValue::Syntax(frame.syntax),
        ];
        self.tree.set_data(frame.node, data);

        if let Some(parent) = self.tree.parent(frame.node) {
            let column = TokenColumn::Index.index();
            self.tree
                .sort_subtree(parent, column, SortOrder::Ascending, false);
            self.tree
                .sort_subtree(frame.node, column, SortOrder::Ascending, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_at_root(tree: &Tree<TokenValue>) -> Vec<RowKind> {
        tree.children(tree.root())
            .iter()
            .map(|id| {
                tree.data(*id, TokenColumn::RowType.index())
                    .map(TokenValue::row_kind)
                    .unwrap_or(RowKind::Text)
            })
            .collect()
    }

    fn value_of(tree: &Tree<TokenValue>, id: NodeId) -> String {
        tree.data(id, TokenColumn::Value.index())
            .map(|c| c.str().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_plain_text_is_one_run() {
        let tree = parse("abc");
        let root = tree.root();
        assert_eq!(tree.child_count(root), 1);
        let text = tree.children(root)[0];
        assert_eq!(value_of(&tree, text), "abc");
        let span = tree
            .data(text, TokenColumn::Range.index())
            .map(TokenValue::span)
            .unwrap();
        assert_eq!(span, Span::new(0, 3));
    }

    #[test]
    fn test_group_spans_include_delimiters() {
        let tree = parse("a(bc)d");
        let root = tree.root();
        let kinds = kinds_at_root(&tree);
        assert_eq!(
            kinds,
            vec![RowKind::Text, RowKind::NonVarGroup, RowKind::Text]
        );
        let group = tree.children(root)[1];
        let span = tree
            .data(group, TokenColumn::Range.index())
            .map(TokenValue::span)
            .unwrap();
        assert_eq!(span, Span::new(1, 5));
        let inner = tree.children(group)[0];
        let inner_span = tree
            .data(inner, TokenColumn::Range.index())
            .map(TokenValue::span)
            .unwrap();
        assert_eq!(inner_span, Span::new(2, 4));
        assert!(span.contains(&inner_span));
    }

    #[test]
    fn test_escaped_paren_stays_literal() {
        let tree = parse(r"a\(b");
        assert_eq!(kinds_at_root(&tree), vec![RowKind::Text]);
    }

    #[test]
    fn test_double_backslash_paren_opens_group() {
        let tree = parse(r"\\(b)");
        let kinds = kinds_at_root(&tree);
        assert_eq!(kinds, vec![RowKind::Text, RowKind::NonVarGroup]);
    }

    #[test]
    fn test_non_capturing_group() {
        let tree = parse("(?>ab)");
        let root = tree.root();
        let kinds = kinds_at_root(&tree);
        assert_eq!(kinds, vec![RowKind::NonCapturingGroup]);
        let group = tree.children(root)[0];
        let inner = tree.children(group)[0];
        assert_eq!(value_of(&tree, inner), "ab");
    }

    #[test]
    fn test_named_group_syntaxes() {
        let tree = parse("(?<a>x)(?'b'y)(?P<c>z)");
        let root = tree.root();
        let expected = [
            ("a", GroupSyntax::Angle),
            ("b", GroupSyntax::Quote),
            ("c", GroupSyntax::PythonStyle),
        ];
        assert_eq!(tree.child_count(root), 3);
        for (id, (name, syntax)) in tree.children(root).to_vec().iter().zip(expected) {
            assert_eq!(
                tree.data(*id, TokenColumn::GroupName.index())
                    .map(|c| c.str().to_string())
                    .unwrap(),
                name
            );
            assert_eq!(
                tree.data(*id, TokenColumn::GroupSyntax.index())
                    .and_then(TokenValue::syntax),
                Some(syntax)
            );
        }
    }

    #[test]
    fn test_var_group_gets_variable_value() {
        let tree = parse("(?<VAR_level>ERROR)");
        let root = tree.root();
        let group = tree.children(root)[0];
        assert_eq!(
            tree.data(group, TokenColumn::RowType.index())
                .map(TokenValue::row_kind),
            Some(RowKind::VarGroup)
        );
        assert_eq!(value_of(&tree, group), "level");
        assert_eq!(
            tree.data(group, TokenColumn::GroupName.index())
                .map(|c| c.str().to_string())
                .unwrap(),
            "VAR_level"
        );
    }

    #[test]
    fn test_empty_group_synthesizes_text_child() {
        let tree = parse("()");
        let root = tree.root();
        assert_eq!(tree.child_count(root), 1);
        let group = tree.children(root)[0];
        assert_eq!(tree.child_count(group), 1);
        let child = tree.children(group)[0];
        assert_eq!(value_of(&tree, child), "");
        assert_eq!(
            tree.data(child, TokenColumn::RowType.index())
                .map(TokenValue::row_kind),
            Some(RowKind::Text)
        );
    }

    #[test]
    fn test_unterminated_group_name_is_inconclusive() {
        let tree = parse("(?<abc");
        let root = tree.root();
        assert_eq!(tree.child_count(root), 1);
        let group = tree.children(root)[0];
        // nameless, still a plain group, scan did not fail
        assert_eq!(
            tree.data(group, TokenColumn::GroupName.index())
                .map(|c| c.str().to_string())
                .unwrap(),
            ""
        );
        assert_eq!(
            tree.data(group, TokenColumn::RowType.index())
                .map(TokenValue::row_kind),
            Some(RowKind::NonVarGroup)
        );
    }

    #[test]
    fn test_unbalanced_open_group_clamps_span() {
        let tree = parse("(ab");
        let root = tree.root();
        let group = tree.children(root)[0];
        let span = tree
            .data(group, TokenColumn::Range.index())
            .map(TokenValue::span)
            .unwrap();
        assert_eq!(span, Span::new(0, 3));
    }

    #[test]
    fn test_nested_groups_have_nested_spans() {
        let tree = parse("((a)b)");
        let root = tree.root();
        let outer = tree.children(root)[0];
        let outer_span = tree
            .data(outer, TokenColumn::Range.index())
            .map(TokenValue::span)
            .unwrap();
        assert_eq!(outer_span, Span::new(0, 6));
        let inner = tree.children(outer)[0];
        let inner_span = tree
            .data(inner, TokenColumn::Range.index())
            .map(TokenValue::span)
            .unwrap();
        assert_eq!(inner_span, Span::new(1, 4));
        assert!(outer_span.contains(&inner_span));
    }

    #[test]
    fn test_sibling_order_matches_document_order() {
        let tree = parse("a(b)c(d)e");
        let root = tree.root();
        let spans: Vec<Span> = tree
            .children(root)
            .iter()
            .map(|id| {
                tree.data(*id, TokenColumn::Range.index())
                    .map(TokenValue::span)
                    .unwrap()
            })
            .collect();
        for pair in spans.windows(2) {
            assert!(pair[0].to <= pair[1].from, "siblings overlap: {:?}", spans);
        }
    }
}
