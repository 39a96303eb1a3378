//! Tree builder: reconstructs the part hierarchy from flat records.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, warn};

use crate::domain::arena::BomArena;
use crate::domain::entities::PartRecord;

/// A part with its direct children, owned exclusively.
///
/// The derived `Clone`, `PartialEq` and `Drop` recurse once per level, so a
/// single chain tens of thousands of levels deep can exhaust the stack. The
/// traversal helpers below are iterative.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub record: PartRecord,
    /// Root: the record's `level`. Otherwise parent depth + 1.
    pub depth: i32,
    /// Children in input order
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Pre-order traversal over this node and its descendants.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator { stack: vec![self] }
    }

    /// Number of nodes in this subtree, self included.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels in this subtree; a leaf has height 1.
    pub fn height(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, level)) = stack.pop() {
            max = max.max(level);
            stack.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        max
    }

    /// Ids of all leaves, left to right.
    pub fn leaf_ids(&self) -> Vec<&str> {
        self.iter()
            .filter(|node| node.children.is_empty())
            .map(TreeNode::id)
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        self.iter().find(|node| node.id() == id)
    }
}

pub struct TreeIterator<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for child in current.children.iter().rev() {
            self.stack.push(child);
        }
        Some(current)
    }
}

/// Links flat part records into a forest.
///
/// Keeps counters of what the last build discarded; the build itself never
/// fails.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    dropped_orphans: usize,
    dropped_duplicates: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of the last build whose parent id did not resolve.
    pub fn dropped_orphans(&self) -> usize {
        self.dropped_orphans
    }

    /// Records of the last build shadowed by a later record with the same id.
    pub fn dropped_duplicates(&self) -> usize {
        self.dropped_duplicates
    }

    /// Build the forest in two passes over `records`.
    ///
    /// Children keep their relative input order; nothing is re-sorted. A
    /// record whose parent id is unknown is dropped together with its
    /// subtree. With duplicate ids the last record wins and earlier ones are
    /// discarded.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build(&mut self, records: &[PartRecord]) -> Vec<TreeNode> {
        self.dropped_orphans = 0;
        self.dropped_duplicates = 0;

        let mut arena = BomArena::with_capacity(records.len());
        let mut slots = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        // Pass 1: one detached node per record
        for record in records {
            let idx = arena.insert_node(record);
            slots.push(idx);
            by_id.insert(record.id.as_str(), idx);
        }

        // Pass 2: link in input order
        for (record, &idx) in records.iter().zip(&slots) {
            if by_id.get(record.id.as_str()) != Some(&idx) {
                warn!(id = %record.id, "duplicate part id, keeping the last record");
                arena.remove_node(idx);
                self.dropped_duplicates += 1;
                continue;
            }

            match record.parent_id.as_deref() {
                None => arena.push_root(idx),
                Some(parent_id) => match by_id.get(parent_id) {
                    Some(&parent_idx) => {
                        arena.attach(idx, parent_idx);
                    }
                    None => {
                        debug!(id = %record.id, parent_id, "dropping orphan");
                        self.dropped_orphans += 1;
                    }
                },
            }
        }

        let forest = arena.into_forest();
        debug!(
            roots = forest.len(),
            orphans = self.dropped_orphans,
            duplicates = self.dropped_duplicates,
            "tree built"
        );
        forest
    }
}

/// Build the part forest from flat records. See [`TreeBuilder::build`].
pub fn build_tree(records: &[PartRecord]) -> Vec<TreeNode> {
    TreeBuilder::new().build(records)
}

/// Stable sort by (level, sort_order), the order the tree expects.
pub fn sort_for_display(records: &mut [PartRecord]) {
    records.sort_by_key(|r| (r.level, r.sort_order));
}

/// Total nodes reachable from `forest`.
pub fn count_nodes(forest: &[TreeNode]) -> usize {
    forest.iter().map(TreeNode::node_count).sum()
}

/// Records whose parent id does not resolve within `records`.
///
/// Only direct orphans are returned; their descendants are also absent from a
/// built forest but do have a resolvable parent.
pub fn find_orphans(records: &[PartRecord]) -> Vec<&PartRecord> {
    let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    records
        .iter()
        .filter(|r| matches!(r.parent_id.as_deref(), Some(p) if !ids.contains(p)))
        .collect()
}
