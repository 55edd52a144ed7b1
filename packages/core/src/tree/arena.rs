//! Arena-backed tree builder
//!
//! Rows arrive flat (each one naming its parent). `NodeArena` indexes them
//! by id into slots, links every slot into its parent's child list and sorts
//! each list by `(sort_order, id)`. The nested `children` view is only
//! produced at the read boundary by the `materialize_*` methods.
//!
//! # Irregular rows
//!
//! - A row whose `parent_id` names a missing id (or itself) is an **orphan**.
//!   Orphans are placed among the roots and listed by [`NodeArena::orphans`].
//! - Rows caught in a parent cycle (A → B → A) are unreachable from any root.
//!   They are listed by [`NodeArena::detached`] and never materialized.

use crate::models::Node;
use std::collections::HashMap;

/// Flat, index-addressed view of one tree (categories or locations)
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    slots: Vec<Node>,
    index: HashMap<i64, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    orphans: Vec<i64>,
    detached: Vec<i64>,
}

impl NodeArena {
    /// Build the arena from a flat list of rows
    ///
    /// Any `children` already present on the input rows are discarded.
    /// Duplicate ids keep the first occurrence.
    pub fn build(rows: impl IntoIterator<Item = Node>) -> Self {
        let mut arena = NodeArena::default();

        for row in rows {
            if arena.index.contains_key(&row.id) {
                tracing::warn!("Duplicate node id {} ignored while building tree", row.id);
                continue;
            }
            arena.index.insert(row.id, arena.slots.len());
            arena.slots.push(row.detached());
            arena.children.push(Vec::new());
        }

        for slot in 0..arena.slots.len() {
            let node = &arena.slots[slot];
            match node.parent_id {
                None => arena.roots.push(slot),
                Some(parent_id) => match arena.index.get(&parent_id) {
                    Some(&parent_slot) if parent_slot != slot => {
                        arena.children[parent_slot].push(slot);
                    }
                    _ => {
                        tracing::warn!(
                            "Node {} references missing parent {}; treating it as a root",
                            node.id,
                            parent_id
                        );
                        arena.orphans.push(node.id);
                        arena.roots.push(slot);
                    }
                },
            }
        }

        let slots = &arena.slots;
        let by_order = |a: &usize, b: &usize| {
            (slots[*a].sort_order, slots[*a].id).cmp(&(slots[*b].sort_order, slots[*b].id))
        };
        arena.roots.sort_by(by_order);
        for list in arena.children.iter_mut() {
            list.sort_by(by_order);
        }

        let reachable = arena.walk(&arena.roots);
        if reachable.len() < arena.slots.len() {
            let mut seen = vec![false; arena.slots.len()];
            for slot in reachable {
                seen[slot] = true;
            }
            arena.detached = seen
                .iter()
                .enumerate()
                .filter(|(_, seen)| !**seen)
                .map(|(slot, _)| arena.slots[slot].id)
                .collect();
            tracing::warn!(
                "Nodes {:?} form a parent cycle and are unreachable from any root",
                arena.detached
            );
        }

        arena
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    /// Look up a node (without children) by id
    pub fn get(&self, id: i64) -> Option<&Node> {
        self.index.get(&id).map(|&slot| &self.slots[slot])
    }

    /// Ids of nodes whose parent reference could not be resolved
    pub fn orphans(&self) -> &[i64] {
        &self.orphans
    }

    /// Ids of nodes caught in a parent cycle
    pub fn detached(&self) -> &[i64] {
        &self.detached
    }

    /// Ids of the direct children of `parent`, in sibling order
    ///
    /// `None` yields the roots (orphans included).
    pub fn children_of(&self, parent: Option<i64>) -> Option<Vec<i64>> {
        let list = match parent {
            None => &self.roots,
            Some(id) => &self.children[*self.index.get(&id)?],
        };
        Some(list.iter().map(|&slot| self.slots[slot].id).collect())
    }

    /// Level of `id` in its tree: roots (and orphans) are at depth 1
    ///
    /// A parent cycle stops the walk once every slot has been counted, so
    /// detached nodes report a depth larger than the arena.
    pub fn depth_of(&self, id: i64) -> Option<usize> {
        let mut slot = *self.index.get(&id)?;
        let mut depth = 1;

        while let Some(parent) = self.parent_slot(slot) {
            if depth > self.slots.len() {
                break;
            }
            depth += 1;
            slot = parent;
        }

        Some(depth)
    }

    /// Number of levels in the subtree rooted at `id`, counting `id`
    pub fn subtree_height(&self, id: i64) -> Option<usize> {
        let start = *self.index.get(&id)?;
        let mut seen = vec![false; self.slots.len()];
        let mut stack = vec![(start, 1)];
        let mut height = 0;

        while let Some((slot, depth)) = stack.pop() {
            if std::mem::replace(&mut seen[slot], true) {
                continue;
            }
            height = height.max(depth);
            stack.extend(self.children[slot].iter().map(|&child| (child, depth + 1)));
        }

        Some(height)
    }

    fn parent_slot(&self, slot: usize) -> Option<usize> {
        let parent_id = self.slots[slot].parent_id?;
        self.index
            .get(&parent_id)
            .copied()
            .filter(|&parent| parent != slot)
    }

    /// Ids of every node below `id`, in pre-order, excluding `id` itself
    pub fn descendant_ids(&self, id: i64) -> Option<Vec<i64>> {
        let start = *self.index.get(&id)?;
        Some(
            self.walk(&[start])
                .into_iter()
                .skip(1)
                .map(|slot| self.slots[slot].id)
                .collect(),
        )
    }

    /// Returns true if `candidate` sits somewhere below `ancestor`
    pub fn is_descendant(&self, ancestor: i64, candidate: i64) -> bool {
        let (Some(&start), Some(&target)) = (self.index.get(&ancestor), self.index.get(&candidate))
        else {
            return false;
        };

        let mut visited = vec![false; self.slots.len()];
        let mut stack: Vec<usize> = self.children[start].clone();
        visited[start] = true;

        while let Some(slot) = stack.pop() {
            if slot == target {
                return true;
            }
            if std::mem::replace(&mut visited[slot], true) {
                continue;
            }
            stack.extend(self.children[slot].iter().copied());
        }

        false
    }

    /// Materialize the whole forest as nested nodes
    pub fn materialize_forest(&self) -> Vec<Node> {
        self.materialize(&self.roots)
    }

    /// Materialize `id` with its full subtree
    pub fn materialize_subtree(&self, id: i64) -> Option<Node> {
        let slot = *self.index.get(&id)?;
        self.materialize(&[slot]).pop()
    }

    /// Materialize the direct children of `id`, each with its subtree
    pub fn materialize_children(&self, id: i64) -> Option<Vec<Node>> {
        let slot = *self.index.get(&id)?;
        Some(self.materialize(&self.children[slot]))
    }

    /// Iterative pre-order walk from `starts`, visiting each slot once
    fn walk(&self, starts: &[usize]) -> Vec<usize> {
        let mut visited = vec![false; self.slots.len()];
        let mut order = Vec::with_capacity(self.slots.len());
        let mut stack: Vec<usize> = starts.iter().rev().copied().collect();

        while let Some(slot) = stack.pop() {
            if std::mem::replace(&mut visited[slot], true) {
                continue;
            }
            order.push(slot);
            stack.extend(self.children[slot].iter().rev().copied());
        }

        order
    }

    /// Build nested nodes bottom-up: children are finished before their parent
    fn materialize(&self, starts: &[usize]) -> Vec<Node> {
        let order = self.walk(starts);
        let mut built: Vec<Option<Node>> = vec![None; self.slots.len()];

        for &slot in order.iter().rev() {
            let mut node = self.slots[slot].clone();
            node.children = self.children[slot]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[slot] = Some(node);
        }

        starts
            .iter()
            .filter_map(|&slot| built[slot].take())
            .collect()
    }
}

/// Flatten nested nodes back into rows (pre-order, children stripped)
pub fn flatten(forest: &[Node]) -> Vec<Node> {
    let mut rows = Vec::new();
    let mut stack: Vec<&Node> = forest.iter().rev().collect();

    while let Some(node) = stack.pop() {
        rows.push(node.detached());
        stack.extend(node.children.iter().rev());
    }

    rows
}
