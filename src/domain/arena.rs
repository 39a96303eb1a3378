use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::builder::TreeNode;
use crate::domain::entities::PartRecord;

/// Arena slot holding a borrowed record while the hierarchy is linked.
#[derive(Debug)]
pub struct ArenaNode<'a> {
    /// Record this slot wraps
    pub record: &'a PartRecord,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in attachment order
    pub children: Vec<Index>,
}

/// Arena-based forest used while linking flat records into a hierarchy.
///
/// Records are borrowed, so linking never touches the caller's data. Once
/// linked, [`BomArena::into_forest`] materializes owned [`TreeNode`]s.
#[derive(Debug)]
pub struct BomArena<'a> {
    /// Arena storage for all nodes
    arena: Arena<ArenaNode<'a>>,
    /// Root indices in attachment order
    roots: Vec<Index>,
}

impl Default for BomArena<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> BomArena<'a> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            arena: Arena::with_capacity(n),
            roots: Vec::new(),
        }
    }

    /// Allocate a detached node for `record`.
    pub fn insert_node(&mut self, record: &'a PartRecord) -> Index {
        self.arena.insert(ArenaNode {
            record,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Free a node that was never attached.
    pub fn remove_node(&mut self, idx: Index) -> Option<&'a PartRecord> {
        self.arena.remove(idx).map(|node| node.record)
    }

    pub fn push_root(&mut self, idx: Index) {
        self.roots.push(idx);
    }

    /// Append `child` to `parent`'s children. Returns false if either index is stale.
    pub fn attach(&mut self, child: Index, parent: Index) -> bool {
        if !self.arena.contains(child) {
            return false;
        }
        match self.arena.get_mut(parent) {
            Some(parent_node) => parent_node.children.push(child),
            None => return false,
        }
        if let Some(child_node) = self.arena.get_mut(child) {
            child_node.parent = Some(parent);
        }
        true
    }

    pub fn get_node(&self, idx: Index) -> Option<&ArenaNode<'a>> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Post-order walk over everything reachable from the roots, carrying
    /// each node's depth. Root depth is the record's own level.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_, 'a> {
        PostOrderIterator::new(self)
    }

    /// Build owned trees bottom-up from the linked arena.
    ///
    /// Nodes not reachable from a root (orphans and their descendants) are
    /// left behind.
    #[instrument(level = "trace", skip(self))]
    pub fn into_forest(self) -> Vec<TreeNode> {
        let mut built: HashMap<Index, TreeNode> = HashMap::with_capacity(self.arena.len());

        for (idx, node, depth) in self.iter_postorder() {
            let children = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(
                idx,
                TreeNode {
                    record: node.record.clone(),
                    depth,
                    children,
                },
            );
        }

        self.roots
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }
}

pub struct PostOrderIterator<'s, 'a> {
    arena: &'s BomArena<'a>,
    stack: Vec<(Index, i32, bool)>,
}

impl<'s, 'a> PostOrderIterator<'s, 'a> {
    fn new(arena: &'s BomArena<'a>) -> Self {
        let mut stack = Vec::with_capacity(arena.roots.len());
        // Reverse so the first root is emitted first
        for &root in arena.roots.iter().rev() {
            if let Some(node) = arena.get_node(root) {
                stack.push((root, node.record.level, false));
            }
        }
        Self { arena, stack }
    }
}

impl<'s, 'a> Iterator for PostOrderIterator<'s, 'a> {
    type Item = (Index, &'s ArenaNode<'a>, i32);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, depth, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, depth, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, depth + 1, false));
                    }
                } else {
                    return Some((current_idx, node, depth));
                }
            }
        }
        None
    }
}
