//! Canonical construction of leaf and bucketed trees.
//!
//! Trees built here follow the same bucket function the diff walk relies
//! on. The leaf limit can be lowered so that small fixtures still produce
//! deeply bucketed trees.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::StoreResult;
use crate::lookup::load_tree;
use crate::object::{Bounded, Bucket, Node, RevTree};
use crate::order::CanonicalNodeOrder;
use crate::traits::ObjectStore;

/// Accumulates direct children and writes them out as a canonical tree,
/// storing every intermediate bucket tree along the way.
pub struct CanonicalTreeBuilder<'a> {
    store: &'a dyn ObjectStore,
    leaf_limit: Option<usize>,
    nodes: BTreeMap<String, Node>,
}

impl<'a> CanonicalTreeBuilder<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            leaf_limit: None,
            nodes: BTreeMap::new(),
        }
    }

    /// Override the per-depth leaf size limit.
    pub fn with_leaf_limit(mut self, limit: usize) -> Self {
        self.leaf_limit = Some(limit.max(1));
        self
    }

    /// Start from the direct children of an existing tree (flattening its
    /// buckets).
    pub fn from_tree(store: &'a dyn ObjectStore, tree: &RevTree) -> StoreResult<Self> {
        let mut builder = Self::new(store);
        let mut pending = vec![tree.clone()];
        while let Some(level) = pending.pop() {
            for node in level.children() {
                builder.put(node);
            }
            for bucket in level.buckets().values() {
                pending.push(load_tree(store, &bucket.object_id)?);
            }
        }
        Ok(builder)
    }

    /// Insert or replace a child by name.
    pub fn put(&mut self, node: Node) -> &mut Self {
        self.nodes.insert(node.name.clone(), node);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.nodes.remove(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Build and store the tree.
    pub fn build(&self) -> StoreResult<RevTree> {
        let nodes: Vec<Node> = self.nodes.values().cloned().collect();
        self.build_at(nodes, 0)
    }

    fn limit(&self, depth: usize) -> usize {
        self.leaf_limit
            .unwrap_or_else(|| CanonicalNodeOrder::normalized_size_limit(depth))
    }

    fn build_at(&self, nodes: Vec<Node>, depth: usize) -> StoreResult<RevTree> {
        let tree = if nodes.len() <= self.limit(depth) || depth + 1 >= CanonicalNodeOrder::MAX_DEPTH {
            let mut size = 0;
            let mut num_trees = 0;
            let (trees, features): (Vec<Node>, Vec<Node>) = nodes.into_iter().partition(Node::is_tree);
            for subtree in &trees {
                let child = load_tree(self.store, &subtree.object_id)?;
                size += child.size();
                num_trees += 1 + child.num_trees();
            }
            size += features.len() as u64;
            RevTree::new(size, num_trees, trees, features, BTreeMap::new())
        } else {
            let mut groups: BTreeMap<u32, Vec<Node>> = BTreeMap::new();
            for node in nodes {
                groups
                    .entry(CanonicalNodeOrder::bucket(&node.name, depth))
                    .or_default()
                    .push(node);
            }
            let mut size = 0;
            let mut num_trees = 0;
            let mut buckets = BTreeMap::new();
            for (index, group) in groups {
                let child = self.build_at(group, depth + 1)?;
                size += child.size();
                num_trees += child.num_trees();
                buckets.insert(index, Bucket::new(index, child.id(), child.bounds()));
            }
            trace!(depth, buckets = buckets.len(), "built bucketed tree");
            RevTree::new(size, num_trees, Vec::new(), Vec::new(), buckets)
        };
        if !tree.is_empty() {
            self.store.put(tree.clone().into())?;
        }
        Ok(tree)
    }
}
