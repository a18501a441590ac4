//! Depth-first iteration over the contents of one tree.

use std::collections::VecDeque;
use std::sync::Arc;

use geovcs_store::{load_tree, Bounded, Node, NodeRef, ObjectStore, RevTree, StoreResult};
use geovcs_types::{Envelope, ObjectId};

/// Which nodes a [`DepthTreeIterator`] yields and whether it descends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Direct children, trees and features.
    Children,
    /// Direct feature children.
    FeaturesOnly,
    /// Direct tree children.
    TreesOnly,
    /// Every tree and feature below the root.
    Recursive,
    /// Every feature below the root.
    RecursiveFeaturesOnly,
    /// Every tree below the root.
    RecursiveTreesOnly,
}

impl Strategy {
    fn recursive(self) -> bool {
        matches!(
            self,
            Strategy::Recursive | Strategy::RecursiveFeaturesOnly | Strategy::RecursiveTreesOnly
        )
    }

    fn yields_trees(self) -> bool {
        !matches!(self, Strategy::FeaturesOnly | Strategy::RecursiveFeaturesOnly)
    }

    fn yields_features(self) -> bool {
        !matches!(self, Strategy::TreesOnly | Strategy::RecursiveTreesOnly)
    }
}

enum Item {
    Node(Node),
    Bucket(ObjectId),
}

/// Pending contents of one tree. Buckets are expanded in place when
/// reached, so bucketed trees are read one bucket at a time.
struct Frame {
    parent: NodeRef,
    items: VecDeque<Item>,
}

/// Lazy depth-first iterator yielding a [`NodeRef`] per visited node; trees
/// come before their contents. Nodes and buckets whose bounds miss the
/// optional bounds filter are skipped; unbounded ones are kept.
pub struct DepthTreeIterator {
    store: Arc<dyn ObjectStore>,
    strategy: Strategy,
    bounds: Option<Envelope>,
    stack: Vec<Frame>,
    root: Option<(NodeRef, RevTree)>,
}

impl DepthTreeIterator {
    /// Iterate `tree`, whose own ref is `parent` (its path prefixes every
    /// yielded path and its metadata id is inherited).
    pub fn new(store: Arc<dyn ObjectStore>, parent: NodeRef, tree: RevTree, strategy: Strategy) -> Self {
        Self {
            store,
            strategy,
            bounds: None,
            stack: Vec::new(),
            root: Some((parent, tree)),
        }
    }

    /// Iterate a root tree with no inherited metadata.
    pub fn of_root(store: Arc<dyn ObjectStore>, tree: RevTree, strategy: Strategy) -> Self {
        let root = NodeRef::root(&tree, ObjectId::NULL);
        Self::new(store, root, tree, strategy)
    }

    pub fn with_bounds_filter(mut self, bounds: Envelope) -> Self {
        self.bounds = Some(bounds);
        self
    }

    fn passes(&self, object: &dyn Bounded) -> bool {
        match (&self.bounds, object.bounds()) {
            (Some(filter), Some(bounds)) => filter.intersects(&bounds),
            _ => true,
        }
    }

    fn frame(&self, parent: NodeRef, tree: &RevTree) -> Frame {
        Frame {
            parent,
            items: self.items_of(tree).collect(),
        }
    }

    fn items_of<'t>(&'t self, tree: &'t RevTree) -> impl Iterator<Item = Item> + 't {
        let nodes = tree
            .children()
            .into_iter()
            .filter(|n| self.passes(n))
            .map(Item::Node);
        let buckets = tree
            .buckets()
            .values()
            .filter(|b| self.passes(*b))
            .map(|b| Item::Bucket(b.object_id));
        nodes.chain(buckets)
    }

    fn advance(&mut self) -> StoreResult<Option<NodeRef>> {
        if let Some((parent, tree)) = self.root.take() {
            let frame = self.frame(parent, &tree);
            self.stack.push(frame);
        }
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let Some(item) = frame.items.pop_front() else {
                self.stack.pop();
                continue;
            };
            let node = match item {
                Item::Node(node) => node,
                Item::Bucket(id) => {
                    let bucket_tree = load_tree(self.store.as_ref(), &id)?;
                    let expanded: Vec<Item> = self.items_of(&bucket_tree).collect();
                    if let Some(frame) = self.stack.last_mut() {
                        for item in expanded.into_iter().rev() {
                            frame.items.push_front(item);
                        }
                    }
                    continue;
                }
            };
            let node_ref = frame.parent.child(node);

            if node_ref.node().is_tree() {
                if self.strategy.recursive() {
                    let subtree = load_tree(self.store.as_ref(), &node_ref.object_id())?;
                    let child_frame = self.frame(node_ref.clone(), &subtree);
                    self.stack.push(child_frame);
                }
                if self.strategy.yields_trees() {
                    return Ok(Some(node_ref));
                }
            } else if self.strategy.yields_features() {
                return Ok(Some(node_ref));
            }
        }
    }
}

impl Iterator for DepthTreeIterator {
    type Item = StoreResult<NodeRef>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(next) => next.map(Ok),
            Err(e) => {
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for DepthTreeIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthTreeIterator")
            .field("strategy", &self.strategy)
            .field("bounds", &self.bounds)
            .field("depth", &self.stack.len())
            .finish()
    }
}
