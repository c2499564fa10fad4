//! Regex-token view model
//!
//! Owns the authoritative regex text and the token tree derived from it.
//! The tree is rebuilt from scratch on every text change; a cell edit runs
//! the inverse path (reassemble, validate, adopt or roll back) so the tree
//! and the text can never drift apart.

use regex::RegexBuilder;

use crate::rextree::diag::{Diagnostics, NullDiagnostics};
use crate::rextree::filtering::{apply_visibility, FilteredEntry};
use crate::rextree::parsing;
use crate::rextree::serializing::serialize;
use crate::rextree::token::{RowKind, TokenColumn, TokenValue};
use crate::rextree::tree::{NodeId, SortOrder, Tree};
use crate::rextree::validation::{EngineValidator, RegexValidator};

/// Predicate configuration beyond the free-text filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptions {
    /// Hide everything that is not a variable group (plus its context).
    pub variables_only: bool,
}

/// A rejected edit: the tree was left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditError {
    pub node: NodeId,
    pub message: String,
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EditError {}

/// View model over the token tree. See the module documentation.
pub struct TokenTreeModel {
    tree: Tree<TokenValue>,
    regex: String,
    filter: String,
    options: FilterOptions,
    sorting: (TokenColumn, SortOrder),
    validator: Box<dyn RegexValidator>,
    diagnostics: Box<dyn Diagnostics>,
}

impl Default for TokenTreeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenTreeModel {
    pub fn new() -> Self {
        Self::with_ports(Box::new(EngineValidator), Box::new(NullDiagnostics))
    }

    /// Builds a model with explicit validation and diagnostics ports.
    pub fn with_ports(
        validator: Box<dyn RegexValidator>,
        diagnostics: Box<dyn Diagnostics>,
    ) -> Self {
        Self {
            tree: parsing::new_token_tree(),
            regex: String::new(),
            filter: String::new(),
            options: FilterOptions::default(),
            sorting: (TokenColumn::Index, SortOrder::Ascending),
            validator,
            diagnostics,
        }
    }

    pub fn tree(&self) -> &Tree<TokenValue> {
        &self.tree
    }

    /// The current authoritative regex text.
    pub fn used_regex(&self) -> &str {
        &self.regex
    }

    /// Rebuilds the tree from `regex` and returns the initial visibility
    /// report. A string the engine rejects yields an empty tree; the
    /// structural scan only runs over text that is known to compile.
    pub fn set_used_regex(&mut self, regex: &str) -> Vec<FilteredEntry> {
        self.regex = regex.to_string();
        self.tree = parsing::new_token_tree();
        match self.validator.validate(regex) {
            Ok(()) => parsing::parse_into(&mut self.tree, regex),
            Err(message) => self.diagnostics.warning(&message),
        }
        let (column, order) = self.sorting;
        self.tree
            .sort_subtree(self.tree.root(), column.index(), order, true);
        self.run_filter()
    }

    /// Edits one cell of one node, reassembles the regex and validates it.
    /// On success the reconstructed string becomes the authoritative text
    /// (the tree is re-parsed from it) and is returned. On failure the
    /// prior value is restored and the edit error is returned.
    ///
    /// Only the value column of text rows is editable; everything else is
    /// rejected without touching the tree.
    pub fn set_data(
        &mut self,
        node: NodeId,
        column: TokenColumn,
        value: TokenValue,
    ) -> Result<String, EditError> {
        if !self.is_editable(node, column) {
            return Err(EditError {
                node,
                message: "only the value of a text row is editable".to_string(),
            });
        }
        let Some(current) = self.tree.data(node, column.index()).cloned() else {
            return Err(EditError {
                node,
                message: "no such node".to_string(),
            });
        };
        if current == value {
            return Ok(self.regex.clone());
        }
        self.tree.set_cell(node, column.index(), value);

        match self.pack_regex() {
            Ok(packed) => {
                self.set_used_regex(&packed);
                Ok(packed)
            }
            Err(message) => {
                self.tree.set_cell(node, column.index(), current);
                let message = format!(
                    "Regex update is ignored due to the following error: \"{}\"",
                    message
                );
                self.diagnostics.warning(&message);
                Err(EditError { node, message })
            }
        }
    }

    fn is_editable(&self, node: NodeId, column: TokenColumn) -> bool {
        column == TokenColumn::Value
            && self
                .tree
                .data(node, TokenColumn::RowType.index())
                .map(TokenValue::row_kind)
                == Some(RowKind::Text)
    }

    /// Reassembles the regex from the tree and validates it; the compiled
    /// program is discarded, only validity matters.
    pub fn pack_regex(&mut self) -> Result<String, String> {
        let packed = serialize(&self.tree);
        self.diagnostics.message(&packed);
        self.validator.validate(&packed)?;
        Ok(packed)
    }

    /// Re-runs the visibility engine with a new free-text filter.
    pub fn filter_tokens(&mut self, filter: &str) -> Vec<FilteredEntry> {
        self.filter = filter.to_string();
        self.run_filter()
    }

    /// Re-runs the visibility engine with new predicate options.
    pub fn set_filter_options(&mut self, options: FilterOptions) -> Vec<FilteredEntry> {
        self.options = options;
        self.run_filter()
    }

    /// Re-sorts the whole tree and refreshes visibility.
    pub fn sort(&mut self, column: TokenColumn, order: SortOrder) -> Vec<FilteredEntry> {
        self.sorting = (column, order);
        self.tree
            .sort_subtree(self.tree.root(), column.index(), order, true);
        self.run_filter()
    }

    fn run_filter(&mut self) -> Vec<FilteredEntry> {
        let variables_only = self.options.variables_only;
        // an empty or invalid filter pattern filters nothing out
        let matcher = if self.filter.is_empty() {
            None
        } else {
            RegexBuilder::new(&self.filter)
                .case_insensitive(true)
                .build()
                .ok()
        };

        let (column, order) = self.sorting;
        if !self.tree.is_whole_sorted(self.tree.root()) {
            self.tree
                .sort_subtree(self.tree.root(), column.index(), order, true);
        }

        apply_visibility(
            &mut self.tree,
            move |tree, id| {
                if variables_only {
                    let row = tree
                        .data(id, TokenColumn::RowType.index())
                        .map(TokenValue::row_kind)
                        .unwrap_or(RowKind::Text);
                    if row != RowKind::VarGroup {
                        return false;
                    }
                }
                match matcher.as_ref() {
                    Some(re) => tree
                        .data(id, TokenColumn::Value.index())
                        .map(|cell| re.is_match(cell.str()))
                        .unwrap_or(false),
                    None => true,
                }
            },
            |tree, id| {
                tree.data(id, TokenColumn::IsFiltered.index())
                    .map(TokenValue::boolean)
                    .unwrap_or(false)
            },
            |tree, id, filtered| {
                tree.set_cell(id, TokenColumn::IsFiltered.index(), TokenValue::Bool(filtered));
            },
        )
    }
}
