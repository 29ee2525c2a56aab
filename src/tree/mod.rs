/// Reconstruction of the call tree from a flat list of records.
pub mod build;

/// The cost-rating pass.
pub mod rating;

use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::path::Path;

use crate::costs::{CostRatings, Costs};
use crate::filter::Filter;

pub use build::build;

/// Separates the identity of a node from the identity of its parent in [`Node::path`].
pub const PATH_SEPARATOR: &str = "//";

/// The function name of the synthetic root node.
pub const ROOT_FUNCTION: &str = "{root}";

/// Identifies a node within its [`CallTree`].
///
/// Ids stay valid until the tree is [compacted](CallTree::compact) or merged into another tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One call site in the tree: a function, the costs it incurred on its own, and the calls it
/// made.
#[derive(Clone, Debug)]
pub struct Node {
    filename: String,
    function: String,
    path: String,
    costs: Costs,
    inclusive: Cell<Option<Costs>>,
    count: u64,
    ratings: Option<CostRatings>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(filename: String, function: String, costs: Costs) -> Self {
        let basename = Path::new(&filename)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Node {
            path: format!("{}{}", basename, function),
            filename,
            function,
            costs,
            inclusive: Cell::new(None),
            count: 1,
            ratings: None,
            children: Vec::new(),
            parent: None,
        }
    }

    /// The file the function is defined in.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The function name.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The identity path of this call site: the path of its parent, [`PATH_SEPARATOR`], and the
    /// base name of the file followed by the function name.
    ///
    /// Call sites in different trees with equal paths are the same call site.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The costs of this call site alone, excluding its children.
    pub fn costs(&self) -> Costs {
        self.costs
    }

    /// How many invocations this node stands for.
    pub fn call_count(&self) -> u64 {
        self.count
    }

    /// The calls made from this call site.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The caller, or `None` for the root and for detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The ratings set by [`rating::rate_costs`], if it has run.
    pub fn cost_ratings(&self) -> Option<&CostRatings> {
        self.ratings.as_ref()
    }
}

/// A call tree together with the totals declared by its profile.
///
/// Nodes live in an arena owned by the tree. Every node other than the root has exactly one
/// parent and appears exactly once among that parent's children. Nodes that get merged away are
/// detached from the tree but keep their slot until [`CallTree::compact`].
///
/// Inclusive costs are computed lazily and cached per node. Every operation that changes a node's
/// costs or children clears the cache of that node and of all its ancestors.
#[derive(Clone, Debug)]
pub struct CallTree {
    nodes: Vec<Node>,
    root: NodeId,
    summary: Costs,
    filters: Vec<Filter>,
}

impl CallTree {
    /// An empty tree: just a root with no costs.
    pub fn new(summary: Costs) -> Self {
        CallTree {
            nodes: vec![Node::new(String::new(), ROOT_FUNCTION.to_owned(), Costs::ZERO)],
            root: NodeId(0),
            summary,
            filters: Vec::new(),
        }
    }

    /// The synthetic root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The totals declared by the profile(s) this tree was built from.
    pub fn summary(&self) -> Costs {
        self.summary
    }

    /// Look at a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Shorthand for `tree.node(id).children()`.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Number of nodes reachable from the root, root included.
    pub fn len(&self) -> usize {
        self.preorder().count()
    }

    /// Whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Walk the tree depth-first, parents before their children, starting at the root.
    pub fn preorder(&self) -> Preorder<'_> {
        self.preorder_from(self.root)
    }

    /// Walk the subtree rooted at `id` depth-first, parents before their children.
    pub fn preorder_from(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Create a node that is not yet part of the tree. Attach it with [`CallTree::add_child`] or
    /// [`CallTree::merge_child`].
    pub fn add_node<F, N>(&mut self, filename: F, function: N, costs: Costs) -> NodeId
    where
        F: Into<String>,
        N: Into<String>,
    {
        self.nodes
            .push(Node::new(filename.into(), function.into(), costs));
        NodeId(self.nodes.len() - 1)
    }

    /// Append `child` to the children of `parent`.
    ///
    /// The child's identity path is prefixed with the parent's, unless it already is (nodes
    /// moved by a merge keep the path they had).
    ///
    /// # Panics
    ///
    /// If `child` already has a parent, is the root, or is an ancestor of `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            self.nodes[child.0].parent.is_none() && child != self.root,
            "node {} is already attached to the tree",
            child
        );
        assert!(
            !self.is_ancestor_or_self(child, parent),
            "attaching node {} below {} would create a cycle",
            child,
            parent
        );

        let prefix = format!("{}{}", self.nodes[parent.0].path, PATH_SEPARATOR);
        let node = &mut self.nodes[child.0];
        if !node.path.starts_with(&prefix) {
            node.path.insert_str(0, &prefix);
        }
        node.parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.invalidate(parent);
    }

    /// Merge `incoming` into the children of `parent`.
    ///
    /// If `parent` already has a child with the same identity path, `incoming`'s children are
    /// merged into that child recursively, its costs are combined into the child's own costs, and
    /// its call count is added to the child's; `incoming` itself ends up detached and empty.
    /// Otherwise `incoming` is detached from wherever it was and attached to `parent` as is.
    pub fn merge_child(&mut self, parent: NodeId, incoming: NodeId) {
        // (parent, incoming) pairs still to merge, depth first
        let mut pending = vec![(parent, incoming)];
        while let Some((parent, incoming)) = pending.pop() {
            let candidate = self.child_by_path(parent, &self.nodes[incoming.0].path);
            match candidate {
                Some(candidate) if candidate == incoming => {}
                Some(candidate) => {
                    pending.extend(
                        self.nodes[incoming.0]
                            .children
                            .iter()
                            .rev()
                            .map(|&grandchild| (candidate, grandchild)),
                    );

                    self.detach(incoming);
                    let (costs, count) = {
                        let node = &self.nodes[incoming.0];
                        (node.costs, node.count)
                    };
                    let node = &mut self.nodes[candidate.0];
                    node.costs = node.costs.combine(costs);
                    node.count += count;
                    self.invalidate(candidate);
                }
                None => {
                    self.detach(incoming);
                    self.add_child(parent, incoming);
                }
            }
        }
    }

    /// Fold `id` and everything below it into its parent.
    ///
    /// The inclusive costs of `id` are combined into the parent's own costs and `id` is removed
    /// from the parent's children. The parent's inclusive costs do not change.
    ///
    /// # Panics
    ///
    /// If `id` has no parent (it is the root, or already detached).
    pub fn merge_into_parent(&mut self, id: NodeId) {
        let parent = match self.nodes[id.0].parent {
            Some(parent) => parent,
            None => panic!("node {} has no parent to be merged into", id),
        };

        let inclusive = self.inclusive_costs(id);
        let node = &mut self.nodes[parent.0];
        node.costs = node.costs.combine(inclusive);
        self.detach(id);
    }

    /// Combine children of `id` that call the same function in the same file.
    ///
    /// Of each group of such siblings the first one survives: it takes over the children of the
    /// others, their costs are combined into its own costs, and their call counts are added to
    /// its count.
    pub fn combine_similar_children(&mut self, id: NodeId) {
        // Scan backwards so that removing a later sibling never shifts the ones still to visit.
        let mut i = self.nodes[id.0].children.len();
        while i > 0 {
            i -= 1;
            let children = &self.nodes[id.0].children;
            let child = children[i];
            let candidate = children[..i].iter().copied().find(|&c| {
                let (c, n) = (&self.nodes[c.0], &self.nodes[child.0]);
                c.function == n.function && c.filename == n.filename
            });
            let candidate = match candidate {
                Some(candidate) => candidate,
                None => continue,
            };

            self.nodes[id.0].children.remove(i);
            let absorbed = mem::take(&mut self.nodes[child.0].children);
            for &grandchild in &absorbed {
                self.nodes[grandchild.0].parent = Some(candidate);
            }
            let (costs, count) = {
                let node = &mut self.nodes[child.0];
                node.parent = None;
                node.inclusive.set(None);
                (node.costs, node.count)
            };

            let node = &mut self.nodes[candidate.0];
            node.children.extend(absorbed);
            node.costs = node.costs.combine(costs);
            node.count += count;
            self.invalidate(candidate);
        }
    }

    /// Run [`CallTree::combine_similar_children`] on every node, breadth first.
    ///
    /// Nodes combined at one level can bring together duplicates one level further down; those
    /// are caught when that level is visited.
    pub fn combine_similar_subtrees(&mut self) {
        let mut queue = VecDeque::from(vec![self.root]);
        while let Some(id) = queue.pop_front() {
            self.combine_similar_children(id);
            queue.extend(self.nodes[id.0].children.iter().copied());
        }
    }

    /// The costs of `id` combined with the inclusive costs of all its children.
    pub fn inclusive_costs(&self, id: NodeId) -> Costs {
        if let Some(costs) = self.nodes[id.0].inclusive.get() {
            return costs;
        }

        // Post-order walk: a node is summed up once every child below it holds a cache.
        let mut stack = vec![(id, false)];
        while let Some((next, children_done)) = stack.pop() {
            let node = &self.nodes[next.0];
            if node.inclusive.get().is_some() {
                continue;
            }

            if children_done {
                let costs: Costs = node
                    .children
                    .iter()
                    .filter_map(|&child| self.nodes[child.0].inclusive.get())
                    .chain(Some(node.costs))
                    .sum();
                node.inclusive.set(Some(costs));
            } else {
                stack.push((next, true));
                stack.extend(
                    node.children
                        .iter()
                        .copied()
                        .filter(|&child| self.nodes[child.0].inclusive.get().is_none())
                        .map(|child| (child, false)),
                );
            }
        }

        self.nodes[id.0].inclusive.get().unwrap_or(Costs::ZERO)
    }

    /// Fold `other` into this tree.
    ///
    /// Every top-level call of `other` is merged into this tree's root with
    /// [`CallTree::merge_child`], so call sites present in both trees are combined and call sites
    /// only present in `other` are added. The own costs of the two roots (non-zero only if
    /// something was folded into a root) and the summaries are combined as well.
    pub fn combine_trees(&mut self, other: CallTree) {
        let offset = self.nodes.len();
        let shift = |id: NodeId| NodeId(id.0 + offset);
        let other_root = shift(other.root);

        self.nodes.extend(other.nodes.into_iter().map(|mut node| {
            node.parent = node.parent.map(shift);
            for child in &mut node.children {
                *child = shift(*child);
            }
            node
        }));

        for child in self.nodes[other_root.0].children.clone() {
            self.merge_child(self.root, child);
        }
        let costs = self.nodes[other_root.0].costs;
        let root = &mut self.nodes[self.root.0];
        root.costs = root.costs.combine(costs);
        self.invalidate(self.root);
        self.summary = self.summary.combine(other.summary);
    }

    /// Drop every node that is no longer reachable from the root.
    ///
    /// This invalidates all previously obtained [`NodeId`]s.
    pub fn compact(&mut self) {
        let reachable: Vec<NodeId> = self.preorder().collect();
        if reachable.len() == self.nodes.len() {
            return;
        }

        let mut new_ids = vec![None; self.nodes.len()];
        for (new, old) in reachable.iter().enumerate() {
            new_ids[old.0] = Some(NodeId(new));
        }
        let remap = |id: NodeId| new_ids[id.0].expect("children of reachable nodes are reachable");

        let mut old_nodes: Vec<Option<Node>> =
            mem::take(&mut self.nodes).into_iter().map(Some).collect();
        self.nodes = reachable
            .iter()
            .map(|old| {
                let mut node = old_nodes[old.0].take().expect("each node is visited once");
                node.parent = node.parent.map(remap);
                for child in &mut node.children {
                    *child = remap(*child);
                }
                node
            })
            .collect();
        self.root = remap(self.root);

        trace!(
            "compacted tree to {} node(s) from {}",
            self.nodes.len(),
            old_nodes.len()
        );
    }

    /// Queue a filter to be run by [`CallTree::filter_tree`].
    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// The queued filters, in the order they will run.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Run the queued filters, in the order they were added.
    pub fn filter_tree(&mut self) {
        let filters = mem::take(&mut self.filters);
        for filter in &filters {
            let before = self.len();
            filter.apply(self);
            debug!(
                "filter {} removed {} node(s)",
                filter,
                before.saturating_sub(self.len())
            );
        }
        self.filters = filters;
    }

    fn child_by_path(&self, parent: NodeId, path: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].path == path)
    }

    /// Remove `id` from its parent's children, if it has a parent.
    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            let siblings = &mut self.nodes[parent.0].children;
            if let Some(i) = siblings.iter().position(|&c| c == id) {
                siblings.remove(i);
            }
            self.invalidate(parent);
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes[id.0].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Clear the inclusive cost cache of `id` and its ancestors.
    fn invalidate(&self, id: NodeId) {
        let mut next = Some(id);
        while let Some(id) = next {
            let node = &self.nodes[id.0];
            // An ancestor can only hold a cache if all of its descendants do, so the first node
            // without one ends the walk.
            if node.inclusive.take().is_none() {
                break;
            }
            next = node.parent;
        }
    }

    pub(crate) fn set_cost_ratings(&mut self, id: NodeId, ratings: CostRatings) {
        self.nodes[id.0].ratings = Some(ratings);
    }
}

/// Depth-first iterator over the nodes of a [`CallTree`], see [`CallTree::preorder`].
#[derive(Debug)]
pub struct Preorder<'a> {
    tree: &'a CallTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
