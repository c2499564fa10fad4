//! Pattern-alias view model
//!
//! The second consumer of the ordered tree: stored regex patterns are named
//! by aliases whose segments (`Network_HTTP_Errors`) span nested tree
//! levels. Intermediate levels are placeholder rows that exist only to
//! carry the hierarchy; leaves carry the pattern text and two tri-state
//! flags (default-on, combine-on) that roll up through the levels.

use regex::RegexBuilder;

use crate::rextree::filtering::{apply_visibility, FilteredEntry};
use crate::rextree::tree::{
    FindResult, NodeId, SortOrder, Traversal, Tree, TreeBehavior,
};

/// Separator between alias segments.
pub const TREE_LEVEL_SEPARATOR: char = '_';

/// Filter literal selecting combine-enabled patterns.
pub const COMBINE_LITERAL: &str = "%comb";

/// Filter literal selecting default-enabled patterns.
pub const DEFAULT_LITERAL: &str = "%def";

/// Tri-state checkbox value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    Partially,
    Checked,
}

impl CheckState {
    fn rank(self) -> u8 {
        match self {
            CheckState::Checked => 0,
            CheckState::Partially => 1,
            CheckState::Unchecked => 2,
        }
    }
}

/// Whether a row is a real stored pattern or a placeholder level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRowKind {
    Alias,
    FakeTreeLevel,
}

/// Columns of the pattern tree, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternColumn {
    AliasTreeLevel,
    Default,
    Combine,
    Regex,
    Alias,
    RowType,
    IsFiltered,
}

impl PatternColumn {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            PatternColumn::AliasTreeLevel => "Alias",
            PatternColumn::Default => "Default",
            PatternColumn::Combine => "Combine",
            PatternColumn::Regex => "Regex",
            PatternColumn::Alias => "Full alias",
            PatternColumn::RowType => "Row type",
            PatternColumn::IsFiltered => "Is filtered",
        }
    }

    fn all() -> [PatternColumn; 7] {
        [
            PatternColumn::AliasTreeLevel,
            PatternColumn::Default,
            PatternColumn::Combine,
            PatternColumn::Regex,
            PatternColumn::Alias,
            PatternColumn::RowType,
            PatternColumn::IsFiltered,
        ]
    }
}

/// A single typed cell of the pattern tree; accessors are sentinel-style.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternValue {
    Str(String),
    Check(CheckState),
    Row(PatternRowKind),
    Bool(bool),
}

impl PatternValue {
    pub fn str(&self) -> &str {
        match self {
            PatternValue::Str(s) => s,
            _ => "",
        }
    }

    pub fn check(&self) -> CheckState {
        match self {
            PatternValue::Check(c) => *c,
            _ => CheckState::Unchecked,
        }
    }

    pub fn row_kind(&self) -> PatternRowKind {
        match self {
            PatternValue::Row(r) => *r,
            _ => PatternRowKind::FakeTreeLevel,
        }
    }

    pub fn boolean(&self) -> bool {
        match self {
            PatternValue::Bool(b) => *b,
            _ => false,
        }
    }
}

fn pattern_behavior() -> TreeBehavior<PatternValue> {
    TreeBehavior {
        sort: Some(Box::new(|column, left, right| {
            let alias = |cells: &[PatternValue]| {
                cells
                    .get(PatternColumn::AliasTreeLevel.index())
                    .map(PatternValue::str)
                    .map(str::to_lowercase)
                    .unwrap_or_default()
            };
            if column == PatternColumn::Default.index()
                || column == PatternColumn::Combine.index()
            {
                // checked first, then alphabetical
                let l = left.get(column).map(PatternValue::check).unwrap_or(CheckState::Unchecked);
                let r = right.get(column).map(PatternValue::check).unwrap_or(CheckState::Unchecked);
                l.rank().cmp(&r.rank()).then_with(|| alias(left).cmp(&alias(right)))
            } else {
                let l = left.get(column).map(PatternValue::str).unwrap_or("").to_lowercase();
                let r = right.get(column).map(PatternValue::str).unwrap_or("").to_lowercase();
                l.cmp(&r)
            }
        })),
        find: Some(Box::new(|tree, parent, row| {
            let key_column = PatternColumn::AliasTreeLevel.index();
            let Some(target) = row.get(key_column) else {
                return FindResult {
                    found: None,
                    key: None,
                };
            };
            let found = tree
                .children(parent)
                .iter()
                .copied()
                .find(|child| tree.key(*child) == Some(target));
            FindResult {
                found,
                key: Some(target.clone()),
            }
        })),
        duplicate: Some(Box::new(|existing, incoming| {
            // an alias inserted twice keeps one leaf; flags and pattern
            // text come from the newer insertion
            for column in [
                PatternColumn::Default,
                PatternColumn::Combine,
                PatternColumn::Regex,
            ] {
                let i = column.index();
                if let (Some(cell), Some(new)) = (existing.get_mut(i), incoming.get(i)) {
                    *cell = new.clone();
                }
            }
        })),
    }
}

/// View model over the pattern-alias tree.
pub struct PatternTreeModel {
    tree: Tree<PatternValue>,
    filter: String,
    sorting: (PatternColumn, SortOrder),
}

impl Default for PatternTreeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternTreeModel {
    pub fn new() -> Self {
        let mut tree = Tree::new(pattern_behavior());
        for column in PatternColumn::all() {
            tree.append_column(PatternValue::Str(column.title().to_string()));
        }
        Self {
            tree,
            filter: String::new(),
            sorting: (PatternColumn::AliasTreeLevel, SortOrder::Ascending),
        }
    }

    pub fn tree(&self) -> &Tree<PatternValue> {
        &self.tree
    }

    /// Inserts (or updates) one stored pattern. The alias splits on `_`
    /// into one tree level per segment; an existing path is reused, and an
    /// existing leaf is merged instead of duplicated. Returns the leaf.
    pub fn add_pattern(
        &mut self,
        alias: &str,
        regex: &str,
        is_combine: CheckState,
        is_default: CheckState,
    ) -> Option<NodeId> {
        let segments: Vec<&str> = alias
            .split(TREE_LEVEL_SEPARATOR)
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            return None;
        }

        let mut rows: Vec<Vec<PatternValue>> = Vec::with_capacity(segments.len());
        let mut full_alias = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if !full_alias.is_empty() {
                full_alias.push(TREE_LEVEL_SEPARATOR);
            }
            full_alias.push_str(segment);
            let is_leaf = i + 1 == segments.len();
            rows.push(vec![
                PatternValue::Str(segment.to_string()),
                PatternValue::Check(if is_leaf { is_default } else { CheckState::Unchecked }),
                PatternValue::Check(if is_leaf { is_combine } else { CheckState::Unchecked }),
                PatternValue::Str(if is_leaf { regex.to_string() } else { String::new() }),
                PatternValue::Str(full_alias.clone()),
                PatternValue::Row(if is_leaf {
                    PatternRowKind::Alias
                } else {
                    PatternRowKind::FakeTreeLevel
                }),
                PatternValue::Bool(false),
            ]);
        }

        let added = self.tree.add_data(&rows, None);
        let leaf = added.first().copied();
        if let Some(leaf) = leaf {
            self.roll_up(leaf, PatternColumn::Default);
            self.roll_up(leaf, PatternColumn::Combine);
        }

        let (column, order) = self.sorting;
        self.tree
            .sort_subtree(self.tree.root(), column.index(), order, true);
        self.filter_internal(false);
        leaf
    }

    /// Removes a pattern row and its subtree, then cascades upward deleting
    /// placeholder levels left empty, until a non-empty ancestor or the
    /// root is reached.
    pub fn remove_pattern(&mut self, node: NodeId) -> bool {
        if !self.tree.contains(node) {
            return false;
        }
        let ancestors = {
            let mut chain = Vec::new();
            let mut current = self.tree.parent(node);
            while let Some(id) = current {
                chain.push(id);
                current = self.tree.parent(id);
            }
            chain
        };

        let target = node;
        let row_column = PatternColumn::RowType.index();
        let mut cascade = |t: &mut Tree<PatternValue>, id: NodeId| {
            let placeholder = t.child_count(id) == 0
                && t.data(id, row_column).map(PatternValue::row_kind)
                    == Some(PatternRowKind::FakeTreeLevel);
            if id != target && !placeholder {
                return false;
            }
            let parent = t.parent(id);
            let key = t.key(id).cloned();
            match (parent, key) {
                (Some(parent), Some(key)) => {
                    t.remove_child(parent, &key);
                    true
                }
                _ => false,
            }
        };
        self.tree
            .visit_parents(target, Some(&mut cascade), None, true, false);

        if let Some(survivor) = ancestors.iter().find(|id| self.tree.contains(**id)) {
            if self.tree.parent(*survivor).is_some() {
                self.refresh_state(*survivor, PatternColumn::Default);
                self.refresh_state(*survivor, PatternColumn::Combine);
                self.roll_up(*survivor, PatternColumn::Default);
                self.roll_up(*survivor, PatternColumn::Combine);
            }
        }

        self.filter_internal(false);
        true
    }

    /// Sets the default flag: descendants follow, ancestors roll up.
    pub fn set_default(&mut self, node: NodeId, state: CheckState) -> bool {
        self.set_check(node, PatternColumn::Default, state)
    }

    /// Sets the combine flag: descendants follow, ancestors roll up.
    pub fn set_combine(&mut self, node: NodeId, state: CheckState) -> bool {
        self.set_check(node, PatternColumn::Combine, state)
    }

    fn set_check(&mut self, node: NodeId, column: PatternColumn, state: CheckState) -> bool {
        if !self.tree.set_cell(node, column.index(), PatternValue::Check(state)) {
            return false;
        }
        let col = column.index();
        let mut push_down = |t: &mut Tree<PatternValue>, id: NodeId| {
            t.set_cell(id, col, PatternValue::Check(state));
            true
        };
        self.tree.visit(
            node,
            Some(&mut push_down),
            None,
            Traversal::document_children(),
        );
        self.roll_up(node, column);
        true
    }

    /// Recomputes one node's own state from its children.
    fn refresh_state(&mut self, node: NodeId, column: PatternColumn) {
        if self.tree.child_count(node) == 0 {
            return;
        }
        let state = self.aggregate_children(node, column);
        self.tree
            .set_cell(node, column.index(), PatternValue::Check(state));
    }

    fn aggregate_children(&self, node: NodeId, column: PatternColumn) -> CheckState {
        let col = column.index();
        let states: Vec<CheckState> = self
            .tree
            .children(node)
            .iter()
            .map(|child| {
                self.tree
                    .data(*child, col)
                    .map(PatternValue::check)
                    .unwrap_or(CheckState::Unchecked)
            })
            .collect();
        if states.is_empty() || states.iter().all(|s| *s == CheckState::Unchecked) {
            CheckState::Unchecked
        } else if states.iter().all(|s| *s == CheckState::Checked) {
            CheckState::Checked
        } else {
            CheckState::Partially
        }
    }

    fn roll_up(&mut self, node: NodeId, column: PatternColumn) {
        let col = column.index();
        let mut recompute = |t: &mut Tree<PatternValue>, id: NodeId| {
            let states: Vec<CheckState> = t
                .children(id)
                .iter()
                .map(|child| {
                    t.data(*child, col)
                        .map(PatternValue::check)
                        .unwrap_or(CheckState::Unchecked)
                })
                .collect();
            let aggregated = if states.is_empty() || states.iter().all(|s| *s == CheckState::Unchecked)
            {
                CheckState::Unchecked
            } else if states.iter().all(|s| *s == CheckState::Checked) {
                CheckState::Checked
            } else {
                CheckState::Partially
            };
            t.set_cell(id, col, PatternValue::Check(aggregated));
            true
        };
        self.tree
            .visit_parents(node, Some(&mut recompute), None, false, false);
    }

    /// Re-runs the visibility engine with a new filter string.
    ///
    /// The string splits on unescaped `|`; parts equal to `%comb` / `%def`
    /// become categorical toggles, the rest re-joins into one
    /// case-insensitive pattern matched against the full alias.
    pub fn filter_patterns(&mut self, filter: &str) -> Vec<FilteredEntry> {
        self.filter = filter.to_string();
        self.filter_internal(true)
    }

    /// Re-sorts the whole tree and refreshes visibility.
    pub fn sort(&mut self, column: PatternColumn, order: SortOrder) -> Vec<FilteredEntry> {
        self.sorting = (column, order);
        self.tree
            .sort_subtree(self.tree.root(), column.index(), order, true);
        self.filter_internal(true)
    }

    fn filter_internal(&mut self, ignore_empty_filter: bool) -> Vec<FilteredEntry> {
        if !ignore_empty_filter && self.filter.is_empty() {
            return Vec::new();
        }

        let mut want_combine = false;
        let mut want_default = false;
        let mut text_parts: Vec<String> = Vec::new();
        for part in split_unescaped_pipe(&self.filter) {
            let lowered = part.to_lowercase();
            if lowered == COMBINE_LITERAL {
                want_combine = true;
            } else if lowered == DEFAULT_LITERAL {
                want_default = true;
            } else if !part.is_empty() {
                text_parts.push(part);
            }
        }
        let text_filter = text_parts.join("|");
        let matcher = if text_filter.is_empty() {
            None
        } else {
            RegexBuilder::new(&text_filter)
                .case_insensitive(true)
                .build()
                .ok()
        };

        let alias_column = PatternColumn::Alias.index();
        let default_column = PatternColumn::Default.index();
        let combine_column = PatternColumn::Combine.index();
        let predicate = move |tree: &Tree<PatternValue>, id: NodeId| {
            let mut filtered = true;
            if want_combine {
                filtered = tree
                    .data(id, combine_column)
                    .map(PatternValue::check)
                    != Some(CheckState::Checked);
            }
            if filtered && want_default {
                filtered = tree
                    .data(id, default_column)
                    .map(PatternValue::check)
                    != Some(CheckState::Checked);
            }
            if filtered {
                match &matcher {
                    Some(re) => {
                        let alias = tree
                            .data(id, alias_column)
                            .map(|c| c.str().to_string())
                            .unwrap_or_default();
                        filtered = !re.is_match(&alias);
                    }
                    None => {
                        if !want_combine && !want_default {
                            filtered = false;
                        }
                    }
                }
            }
            !filtered
        };

        let filtered_column = PatternColumn::IsFiltered.index();
        apply_visibility(
            &mut self.tree,
            predicate,
            move |tree, id| {
                tree.data(id, filtered_column)
                    .map(PatternValue::boolean)
                    .unwrap_or(false)
            },
            move |tree, id, filtered| {
                tree.set_cell(id, filtered_column, PatternValue::Bool(filtered));
            },
        )
    }
}

/// Splits on `|` characters not directly preceded by a backslash.
fn split_unescaped_pipe(input: &str) -> Vec<String> {
    let mut parts = vec![String::new()];
    let mut previous = '\0';
    for symbol in input.chars() {
        if symbol == '|' && previous != '\\' {
            parts.push(String::new());
        } else if let Some(last) = parts.last_mut() {
            last.push(symbol);
        }
        previous = symbol;
    }
    parts
}
