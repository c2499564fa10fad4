//! Ordered tree container
//!
//! A generic N-ary tree holding a fixed set of named columns per node. The
//! container knows nothing about what its columns mean: each use-case hands
//! in its own sorting comparator, key-lookup and duplicate-merge strategies
//! at construction time ([`TreeBehavior`]) and assigns column meaning on its
//! own side.
//!
//! ## Key design
//!
//! - **Arena storage**: nodes live in a slot vector addressed by [`NodeId`].
//!   Removal vacates slots and never reuses them, so a stale id resolves to
//!   nothing and every structural misuse degrades to a no-op or a not-found
//!   result instead of a dangling reference.
//! - **Non-owning parent links**: upward traversal only; children are owned
//!   by their parent's child list, and removing a node removes its subtree.
//! - **Cached sort state**: each node caches whether its first level and its
//!   whole subtree are consistent with the last sort key, so repeated
//!   read-only queries from a view layer skip redundant re-sorts.
//!
//! Lookups fail by returning `None`/`false`; mutation methods are no-ops on
//! invalid input. Nothing in this module panics on a bad id.

use std::cmp::Ordering;
use std::rc::Rc;

use serde::Serialize;

/// Handle to a node in a [`Tree`] arena.
///
/// Ids stay valid until the node is removed; after removal they resolve to
/// nothing (slots are never reused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

/// Sibling ordering direction handed to [`Tree::sort_subtree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Result of a key lookup performed by an injected [`FindFn`].
///
/// When the element was not found, `key` carries the key under which a newly
/// created child should be stored.
pub struct FindResult<C> {
    pub found: Option<NodeId>,
    pub key: Option<C>,
}

/// Comparator over two nodes' column vectors for a given sorting column.
pub type SortFn<C> = Box<dyn Fn(usize, &[C], &[C]) -> Ordering>;

/// Locates the child of a node matching a data row's key.
pub type FindFn<C> = Box<dyn Fn(&Tree<C>, NodeId, &[C]) -> FindResult<C>>;

/// Merges an incoming data row into an existing node's columns.
pub type DuplicateFn<C> = Box<dyn Fn(&mut Vec<C>, &[C])>;

/// The per-use-case strategies a tree is constructed with.
///
/// All three are optional; a tree without a comparator keeps insertion
/// order, and a tree without a find strategy falls back to exact key
/// equality on the first cell of a row.
pub struct TreeBehavior<C> {
    pub sort: Option<SortFn<C>>,
    pub find: Option<FindFn<C>>,
    pub duplicate: Option<DuplicateFn<C>>,
}

impl<C> Default for TreeBehavior<C> {
    fn default() -> Self {
        Self {
            sort: None,
            find: None,
            duplicate: None,
        }
    }
}

/// Options controlling a depth-first traversal.
#[derive(Debug, Clone, Copy)]
pub struct Traversal {
    /// Whether the start node itself is visited.
    pub visit_self: bool,
    /// Visit children in sorted order (lazily re-sorting stale levels) or in
    /// document (insertion) order.
    pub sorted: bool,
    /// Visit siblings right-to-left.
    pub reverse: bool,
}

impl Default for Traversal {
    fn default() -> Self {
        Self {
            visit_self: true,
            sorted: true,
            reverse: false,
        }
    }
}

impl Traversal {
    /// Document-order traversal of the whole subtree, start node excluded.
    pub fn document_children() -> Self {
        Self {
            visit_self: false,
            sorted: false,
            reverse: false,
        }
    }
}

struct Node<C> {
    key: Option<C>,
    columns: Vec<C>,
    /// Children in insertion (document) order.
    children: Vec<NodeId>,
    /// Children in last-sorted order; kept in sync on append so positional
    /// access works before the first sort.
    sorted: Vec<NodeId>,
    parent: Option<NodeId>,
    /// Offset within the parent's current child order.
    idx: usize,
    first_level_sorted: bool,
    whole_sorted: bool,
    sort_key: (usize, SortOrder),
}

/// Generic ordered tree. See the module documentation.
pub struct Tree<C> {
    slots: Vec<Option<Node<C>>>,
    behavior: Rc<TreeBehavior<C>>,
}

pub type VisitFn<'a, C> = &'a mut dyn FnMut(&mut Tree<C>, NodeId) -> bool;
pub type WalkFn<'a, C> = &'a mut dyn FnMut(&Tree<C>, NodeId) -> bool;

impl<C: Clone + PartialEq> Tree<C> {
    pub fn new(behavior: TreeBehavior<C>) -> Self {
        let root = Node {
            key: None,
            columns: Vec::new(),
            children: Vec::new(),
            sorted: Vec::new(),
            parent: None,
            idx: 0,
            first_level_sorted: true,
            whole_sorted: true,
            sort_key: (0, SortOrder::Ascending),
        };
        Self {
            slots: vec![Some(root)],
            behavior: Rc::new(behavior),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> Option<&Node<C>> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<C>> {
        self.slots.get_mut(id.0).and_then(|s| s.as_mut())
    }

    /// Whether the id still resolves to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    // ---- header / column metadata ----------------------------------------

    /// Declares a new named column slot. Header cells live on the root node,
    /// so the column count is the root's column count.
    pub fn append_column(&mut self, header: C) {
        if let Some(root) = self.node_mut(NodeId(0)) {
            root.columns.push(header);
        }
    }

    pub fn header(&self, column: usize) -> Option<&C> {
        self.node(NodeId(0)).and_then(|n| n.columns.get(column))
    }

    pub fn column_count(&self) -> usize {
        self.node(NodeId(0)).map(|n| n.columns.len()).unwrap_or(0)
    }

    // ---- structure -------------------------------------------------------

    /// Appends a child under `parent`, identified by `key` among its
    /// siblings. Returns `None` when the parent id is stale.
    pub fn append_child(&mut self, parent: NodeId, key: C, columns: Vec<C>) -> Option<NodeId> {
        let sort_key = self.node(parent)?.sort_key;
        let idx = self.node(parent)?.children.len();
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Node {
            key: Some(key),
            columns,
            children: Vec::new(),
            sorted: Vec::new(),
            parent: Some(parent),
            idx,
            first_level_sorted: true,
            whole_sorted: true,
            sort_key,
        }));
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
            p.sorted.push(id);
        }
        self.invalidate_sort(parent);
        Some(id)
    }

    /// Removes and destroys the child of `parent` stored under `key`,
    /// including its whole subtree. No-op when nothing matches.
    pub fn remove_child(&mut self, parent: NodeId, key: &C) -> bool {
        let target = match self.node(parent) {
            Some(p) => p
                .children
                .iter()
                .copied()
                .find(|c| self.key(*c) == Some(key)),
            None => None,
        };
        let Some(target) = target else {
            return false;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != target);
            p.sorted.retain(|c| *c != target);
        }
        let order = self.node(parent).map(|p| p.sorted.clone()).unwrap_or_default();
        for (i, id) in order.iter().enumerate() {
            if let Some(n) = self.node_mut(*id) {
                n.idx = i;
            }
        }
        self.vacate(target);
        true
    }

    fn vacate(&mut self, id: NodeId) {
        if let Some(node) = self.slots.get_mut(id.0).and_then(|s| s.take()) {
            for child in node.children {
                self.vacate(child);
            }
        }
    }

    /// Bulk insertion of one data row per tree level.
    ///
    /// At each level an existing sibling matching the row's key (via the
    /// injected find strategy) is reused instead of duplicated; when the
    /// deepest row lands on an existing node, the duplicate-merge strategy is
    /// invoked exactly once with that node's columns and the incoming row.
    ///
    /// Returns every node freshly created or merged into, deepest-first and
    /// parent-most last, so callers can finalize flags bottom-up. The
    /// optional `after_append` hook runs once with the leaf node.
    pub fn add_data(
        &mut self,
        rows: &[Vec<C>],
        after_append: Option<&mut dyn FnMut(&mut Tree<C>, NodeId)>,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.add_data_inner(self.root(), rows, 0, &mut out);
        if let (Some(hook), Some(&leaf)) = (after_append, out.first()) {
            hook(self, leaf);
        }
        out
    }

    fn add_data_inner(
        &mut self,
        parent: NodeId,
        rows: &[Vec<C>],
        level: usize,
        out: &mut Vec<NodeId>,
    ) {
        let Some(row) = rows.get(level) else {
            return;
        };
        if row.is_empty() || !self.contains(parent) {
            return;
        }
        let behavior = Rc::clone(&self.behavior);
        let result = match behavior.find.as_ref() {
            Some(find) => find(self, parent, row),
            None => self.find_by_key(parent, &row[0]),
        };
        match result.found {
            Some(existing) => {
                if level + 1 == rows.len() {
                    if let Some(merge) = behavior.duplicate.as_ref() {
                        if let Some(node) = self.node_mut(existing) {
                            merge(&mut node.columns, row);
                        }
                    }
                    out.push(existing);
                } else {
                    self.add_data_inner(existing, rows, level + 1, out);
                }
            }
            None => {
                let key = result.key.unwrap_or_else(|| row[0].clone());
                if let Some(child) = self.append_child(parent, key, row.clone()) {
                    self.add_data_inner(child, rows, level + 1, out);
                    out.push(child);
                }
            }
        }
    }

    fn find_by_key(&self, parent: NodeId, key: &C) -> FindResult<C> {
        let found = self
            .node(parent)
            .and_then(|p| p.children.iter().copied().find(|c| self.key(*c) == Some(key)));
        FindResult {
            found,
            key: Some(key.clone()),
        }
    }

    /// Walks one key segment per tree level, returning the first exact match
    /// or `None`. An empty key path finds nothing.
    pub fn search(&self, start: NodeId, keys: &[C]) -> Option<NodeId> {
        if keys.is_empty() {
            return None;
        }
        let mut current = start;
        for key in keys {
            let next = match self.behavior.find.as_ref() {
                Some(find) => find(self, current, std::slice::from_ref(key)).found,
                None => self.find_by_key(current, key).found,
            };
            current = next?;
        }
        Some(current)
    }

    // ---- sorting ---------------------------------------------------------

    /// Applies the injected comparator to `node`'s children (and, if
    /// `recursive`, to every descendant level). Cached sort state makes
    /// repeated calls with an unchanged key a no-op.
    pub fn sort_subtree(&mut self, node: NodeId, column: usize, order: SortOrder, recursive: bool) {
        let Some(n) = self.node_mut(node) else {
            return;
        };
        if n.sort_key != (column, order) {
            n.first_level_sorted = false;
            n.whole_sorted = false;
            n.sort_key = (column, order);
        }
        if !n.first_level_sorted {
            self.sort_first_level(node);
        }
        if recursive && !self.node(node).map(|n| n.whole_sorted).unwrap_or(true) {
            let children = self.node(node).map(|n| n.sorted.clone()).unwrap_or_default();
            for child in children {
                self.sort_subtree(child, column, order, true);
            }
            if let Some(n) = self.node_mut(node) {
                n.whole_sorted = true;
            }
        }
    }

    fn sort_first_level(&mut self, node: NodeId) {
        let Some(n) = self.node(node) else {
            return;
        };
        let (column, order) = n.sort_key;
        let mut ids = n.children.clone();
        let behavior = Rc::clone(&self.behavior);
        if let Some(cmp) = behavior.sort.as_ref() {
            ids.sort_by(|a, b| {
                let left = self.node(*a).map(|n| n.columns.as_slice()).unwrap_or(&[]);
                let right = self.node(*b).map(|n| n.columns.as_slice()).unwrap_or(&[]);
                let ordering = cmp(column, left, right);
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        for (i, id) in ids.iter().enumerate() {
            if let Some(child) = self.node_mut(*id) {
                child.idx = i;
            }
        }
        if let Some(n) = self.node_mut(node) {
            n.sorted = ids;
            n.first_level_sorted = true;
        }
    }

    /// Whether the whole subtree under `node` is consistent with the last
    /// sort key.
    pub fn is_whole_sorted(&self, node: NodeId) -> bool {
        self.node(node).map(|n| n.whole_sorted).unwrap_or(false)
    }

    pub fn is_first_level_sorted(&self, node: NodeId) -> bool {
        self.node(node).map(|n| n.first_level_sorted).unwrap_or(false)
    }

    /// Marks a level dirty after a structural mutation: the node itself
    /// needs a first-level re-sort, and every ancestor's whole-subtree flag
    /// is stale.
    fn invalidate_sort(&mut self, node: NodeId) {
        if let Some(n) = self.node_mut(node) {
            n.first_level_sorted = false;
            n.whole_sorted = false;
        }
        let mut current = self.parent(node);
        while let Some(id) = current {
            if let Some(n) = self.node_mut(id) {
                n.whole_sorted = false;
            }
            current = self.parent(id);
        }
    }

    fn ensure_first_level_sorted(&mut self, node: NodeId) {
        if !self.is_first_level_sorted(node) {
            self.sort_first_level(node);
        }
    }

    // ---- traversal -------------------------------------------------------

    /// Depth-first traversal with mutable access: `pre` runs before a node's
    /// children, `post` after. Either callback returning `false` aborts the
    /// remainder of the traversal, including ancestor post-visits. Returns
    /// whether the traversal ran to completion.
    pub fn visit(
        &mut self,
        start: NodeId,
        mut pre: Option<VisitFn<'_, C>>,
        mut post: Option<VisitFn<'_, C>>,
        options: Traversal,
    ) -> bool {
        if pre.is_none() && post.is_none() {
            return true;
        }
        self.visit_inner(start, &mut pre, &mut post, options, true)
    }

    fn visit_inner(
        &mut self,
        id: NodeId,
        pre: &mut Option<VisitFn<'_, C>>,
        post: &mut Option<VisitFn<'_, C>>,
        options: Traversal,
        is_start: bool,
    ) -> bool {
        if !self.contains(id) {
            return true;
        }
        let visit_me = !is_start || options.visit_self;
        if visit_me {
            if options.sorted {
                self.ensure_first_level_sorted(id);
            }
            if let Some(f) = pre.as_mut() {
                if !f(self, id) {
                    return false;
                }
            }
            // the callback may have removed the node we stand on
            if !self.contains(id) {
                return false;
            }
        } else if options.sorted {
            self.ensure_first_level_sorted(id);
        }
        let mut children = match self.node(id) {
            Some(n) => {
                if options.sorted {
                    n.sorted.clone()
                } else {
                    n.children.clone()
                }
            }
            None => Vec::new(),
        };
        if options.reverse {
            children.reverse();
        }
        for child in children {
            if !self.contains(child) {
                continue;
            }
            if !self.visit_inner(child, pre, post, options, false) {
                return false;
            }
        }
        if visit_me {
            if let Some(f) = post.as_mut() {
                if !self.contains(id) {
                    return false;
                }
                if !f(self, id) {
                    return false;
                }
            }
        }
        true
    }

    /// Read-only depth-first traversal. Children come from the cached order
    /// (no lazy re-sort); sort first when `options.sorted` matters.
    pub fn walk(
        &self,
        start: NodeId,
        mut pre: Option<WalkFn<'_, C>>,
        mut post: Option<WalkFn<'_, C>>,
        options: Traversal,
    ) -> bool {
        if pre.is_none() && post.is_none() {
            return true;
        }
        self.walk_inner(start, &mut pre, &mut post, options, true)
    }

    fn walk_inner(
        &self,
        id: NodeId,
        pre: &mut Option<WalkFn<'_, C>>,
        post: &mut Option<WalkFn<'_, C>>,
        options: Traversal,
        is_start: bool,
    ) -> bool {
        let Some(node) = self.node(id) else {
            return true;
        };
        let visit_me = !is_start || options.visit_self;
        if visit_me {
            if let Some(f) = pre.as_mut() {
                if !f(self, id) {
                    return false;
                }
            }
        }
        let mut children = if options.sorted {
            node.sorted.clone()
        } else {
            node.children.clone()
        };
        if options.reverse {
            children.reverse();
        }
        for child in children {
            if !self.walk_inner(child, pre, post, options, false) {
                return false;
            }
        }
        if visit_me {
            if let Some(f) = post.as_mut() {
                if !f(self, id) {
                    return false;
                }
            }
        }
        true
    }

    /// Walks from `start` up to the root; `pre` runs on the way up, `post`
    /// on the way back down. Either callback returning `false` stops the
    /// sequence. Callbacks may remove the node they are handed; the chain is
    /// re-checked for liveness before every call.
    pub fn visit_parents(
        &mut self,
        start: NodeId,
        mut pre: Option<VisitFn<'_, C>>,
        mut post: Option<VisitFn<'_, C>>,
        visit_self: bool,
        visit_root: bool,
    ) -> bool {
        let mut chain: Vec<NodeId> = Vec::new();
        let mut current = if visit_self {
            if self.contains(start) {
                Some(start)
            } else {
                None
            }
        } else {
            self.parent(start)
        };
        let mut keep_going = true;
        while let Some(id) = current {
            let is_root = self.parent(id).is_none();
            if is_root && !visit_root {
                break;
            }
            let next = self.parent(id);
            if let Some(f) = pre.as_mut() {
                keep_going = f(self, id);
            }
            if !keep_going {
                break;
            }
            if self.contains(id) {
                chain.push(id);
            }
            current = next;
        }
        if keep_going {
            if let Some(f) = post.as_mut() {
                for id in chain.into_iter().rev() {
                    if !self.contains(id) {
                        continue;
                    }
                    if !f(self, id) {
                        return false;
                    }
                }
            }
        }
        keep_going
    }

    // ---- accessors -------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn key(&self, id: NodeId) -> Option<&C> {
        self.node(id).and_then(|n| n.key.as_ref())
    }

    /// The node's position among its siblings in the current order; 0 for a
    /// stale id.
    pub fn row(&self, id: NodeId) -> usize {
        self.node(id).map(|n| n.idx).unwrap_or(0)
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.node(id).map(|n| n.children.len()).unwrap_or(0)
    }

    /// Children in document (insertion) order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Children in the current sorted order.
    pub fn sorted_children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.sorted.as_slice()).unwrap_or(&[])
    }

    /// Child at `row` in the current sorted order.
    pub fn child(&self, id: NodeId, row: usize) -> Option<NodeId> {
        self.node(id).and_then(|n| n.sorted.get(row)).copied()
    }

    pub fn data(&self, id: NodeId, column: usize) -> Option<&C> {
        self.node(id).and_then(|n| n.columns.get(column))
    }

    /// Mutable cell access for in-place accumulation without re-insertion.
    pub fn data_mut(&mut self, id: NodeId, column: usize) -> Option<&mut C> {
        self.node_mut(id).and_then(|n| n.columns.get_mut(column))
    }

    /// Replaces the node's whole column vector.
    pub fn set_data(&mut self, id: NodeId, columns: Vec<C>) -> bool {
        match self.node_mut(id) {
            Some(n) => {
                n.columns = columns;
                true
            }
            None => false,
        }
    }

    /// Updates one cell; `false` on a stale id or out-of-range column.
    pub fn set_cell(&mut self, id: NodeId, column: usize, value: C) -> bool {
        match self.node_mut(id).and_then(|n| n.columns.get_mut(column)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }
}
