//! Depth-first, pre-order comparison of two trees.
//!
//! The walk is a tree of tasks. Each task compares one pair of tree
//! contents at a bucket depth and either reports events to the consumer or
//! produces child tasks, which the [`WalkExecutor`] runs in order (serial)
//! or forks across its pool.
//!
//! At every level each side is either in leaf form (direct nodes only) or
//! bucketed. Direct nodes of a bucketed or hybrid tree are assigned the
//! bucket they would occupy at that depth, so every level reduces to a
//! per-index comparison of "slots":
//!
//! - only real buckets: a `bucket` event, then the two bucket trees
//! - only direct nodes: a leaf/leaf merge of the two node lists
//! - both: the bucket trees are opened and merged with the direct nodes one
//!   level down, with no `bucket` event

use std::collections::{BTreeMap, HashMap};
use std::iter::Peekable;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use geovcs_store::{
    load_tree, Bucket, CanonicalNodeOrder, Node, NodeRef, NoopListener, ObjectStore, RevTree,
    StoreError,
};
use geovcs_types::ObjectId;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::config::WalkConfig;
use crate::error::DiffResult;
use crate::walk::{BucketIndex, Consumer, WalkExecutor};

/// Pre-order diff walk between two root trees.
///
/// ```text
/// tree(root, root)
///   feature(a, None)            removed
///   tree(layer, layer)
///     bucket(layer, layer, 7)
///       feature(p1, p1)         modified
///     end_bucket(...)
///   end_tree(layer, layer)
/// end_tree(root, root)
/// ```
///
/// No event is produced when both roots have the same id.
pub struct PreOrderDiffWalk {
    left: RevTree,
    right: RevTree,
    left_store: Arc<dyn ObjectStore>,
    right_store: Arc<dyn ObjectStore>,
    left_metadata: ObjectId,
    right_metadata: ObjectId,
    executor: WalkExecutor,
    cancel: Mutex<Option<Arc<AtomicBool>>>,
    finished: Mutex<bool>,
    finished_cv: Condvar,
}

impl PreOrderDiffWalk {
    /// Walk `left` (read from `left_store`) against `right` (read from
    /// `right_store`) on the serial executor. Both handles may point at the
    /// same store.
    pub fn new(
        left: RevTree,
        right: RevTree,
        left_store: Arc<dyn ObjectStore>,
        right_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            left,
            right,
            left_store,
            right_store,
            left_metadata: ObjectId::NULL,
            right_metadata: ObjectId::NULL,
            executor: WalkExecutor::Serial,
            cancel: Mutex::new(None),
            finished: Mutex::new(true),
            finished_cv: Condvar::new(),
        }
    }

    pub fn with_executor(mut self, executor: WalkExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Build a dedicated executor from `config`.
    pub fn with_config(self, config: &WalkConfig) -> DiffResult<Self> {
        let executor = WalkExecutor::from_config(config)?;
        Ok(self.with_executor(executor))
    }

    /// Feature type ids inherited by nodes directly under each root.
    pub fn with_metadata(mut self, left: ObjectId, right: ObjectId) -> Self {
        self.left_metadata = left;
        self.right_metadata = right;
        self
    }

    pub fn left(&self) -> &RevTree {
        &self.left
    }

    pub fn right(&self) -> &RevTree {
        &self.right
    }

    pub fn left_store(&self) -> &Arc<dyn ObjectStore> {
        &self.left_store
    }

    pub fn right_store(&self) -> &Arc<dyn ObjectStore> {
        &self.right_store
    }

    pub fn executor(&self) -> &WalkExecutor {
        &self.executor
    }

    /// Root refs as handed to the first `tree` event.
    pub fn root_refs(&self) -> (NodeRef, NodeRef) {
        (
            NodeRef::root(&self.left, self.left_metadata),
            NodeRef::root(&self.right, self.right_metadata),
        )
    }

    /// Run the walk to completion, feeding `consumer`.
    ///
    /// Store errors propagate, unless one of the stores has been closed in
    /// the meantime: the walk then stops quietly.
    pub fn walk(&self, consumer: &dyn Consumer) -> DiffResult<()> {
        if self.left.id() == self.right.id() {
            trace!(tree = %self.left.id().short_hex(), "trees are equal, nothing to walk");
            return Ok(());
        }

        let cancel = Arc::new(AtomicBool::new(false));
        *self.cancel.lock() = Some(cancel.clone());
        *self.finished.lock() = false;
        let _finished = FinishGuard(self);

        debug!(
            left = %self.left.id().short_hex(),
            right = %self.right.id().short_hex(),
            threads = self.executor.threads(),
            "diff walk started"
        );

        let run = WalkRun {
            consumer,
            left_root: &self.left,
            right_root: &self.right,
            left_store: self.left_store.as_ref(),
            right_store: self.right_store.as_ref(),
            shared_store: std::ptr::addr_eq(
                Arc::as_ptr(&self.left_store),
                Arc::as_ptr(&self.right_store),
            ),
            executor: &self.executor,
            cancel: &cancel,
        };
        let (left, right) = self.root_refs();
        let result = self.executor.install(|| {
            run.run(WalkTask::Tree {
                left: Some(left),
                right: Some(right),
            })
        });

        match result {
            Ok(()) => {
                debug!(cancelled = cancel.load(Ordering::Acquire), "diff walk finished");
                Ok(())
            }
            Err(err) if !self.left_store.is_open() || !self.right_store.is_open() => {
                warn!(error = %err, "object store closed during diff walk, stopping");
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "diff walk failed");
                Err(err)
            }
        }
    }

    /// Ask a running walk to stop. Tasks already running finish their
    /// current step; nothing new is scheduled.
    pub fn abort_traversal(&self) {
        if let Some(cancel) = self.cancel.lock().as_ref() {
            cancel.store(true, Ordering::Release);
        }
    }

    /// Block until the current walk, if any, has finished.
    pub fn await_termination(&self) {
        let mut finished = self.finished.lock();
        while !*finished {
            self.finished_cv.wait(&mut finished);
        }
    }
}

impl std::fmt::Debug for PreOrderDiffWalk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreOrderDiffWalk")
            .field("left", &self.left.id())
            .field("right", &self.right.id())
            .field("executor", &self.executor)
            .finish()
    }
}

struct FinishGuard<'a>(&'a PreOrderDiffWalk);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        *self.0.finished.lock() = true;
        self.0.finished_cv.notify_all();
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Refs of the two trees whose contents a task compares.
struct Parents {
    left: Option<NodeRef>,
    right: Option<NodeRef>,
}

/// Direct nodes (canonical order) and real buckets of one side at one level.
#[derive(Debug, Default)]
struct TreeContents {
    nodes: Vec<Node>,
    buckets: BTreeMap<u32, Bucket>,
}

impl TreeContents {
    fn of(tree: &RevTree) -> Self {
        Self {
            nodes: tree.children(),
            buckets: tree.buckets().clone(),
        }
    }

    /// Direct nodes of a slot merged with the contents of its bucket tree.
    fn merged(mut nodes: Vec<Node>, bucket_tree: Option<RevTree>) -> Self {
        let mut buckets = BTreeMap::new();
        if let Some(tree) = bucket_tree {
            nodes.extend(tree.children());
            buckets = tree.buckets().clone();
        }
        CanonicalNodeOrder::sort(&mut nodes);
        Self { nodes, buckets }
    }

    fn is_bucketed(&self) -> bool {
        !self.buckets.is_empty()
    }
}

/// Everything found at one bucket index on both sides.
#[derive(Default)]
struct Slot {
    left_nodes: Vec<Node>,
    right_nodes: Vec<Node>,
    left_bucket: Option<Bucket>,
    right_bucket: Option<Bucket>,
}

impl Slot {
    fn has_nodes(&self) -> bool {
        !self.left_nodes.is_empty() || !self.right_nodes.is_empty()
    }

    fn has_buckets(&self) -> bool {
        self.left_bucket.is_some() || self.right_bucket.is_some()
    }

    fn is_unchanged(&self) -> bool {
        match (&self.left_bucket, &self.right_bucket) {
            (Some(l), Some(r)) => !self.has_nodes() && l.object_id == r.object_id,
            _ => false,
        }
    }
}

enum WalkTask {
    Tree {
        left: Option<NodeRef>,
        right: Option<NodeRef>,
    },
    Contents {
        parents: Arc<Parents>,
        index: BucketIndex,
        left: TreeContents,
        right: TreeContents,
    },
    LeafLeaf {
        parents: Arc<Parents>,
        left: Vec<Node>,
        right: Vec<Node>,
    },
    Bucket {
        parents: Arc<Parents>,
        index: BucketIndex,
        left: Option<Bucket>,
        right: Option<Bucket>,
        left_tree: RevTree,
        right_tree: RevTree,
    },
}

/// Shared state of one `walk()` call.
struct WalkRun<'a> {
    consumer: &'a dyn Consumer,
    left_root: &'a RevTree,
    right_root: &'a RevTree,
    left_store: &'a dyn ObjectStore,
    right_store: &'a dyn ObjectStore,
    shared_store: bool,
    executor: &'a WalkExecutor,
    cancel: &'a AtomicBool,
}

impl WalkRun<'_> {
    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    fn run(&self, task: WalkTask) -> DiffResult<()> {
        if self.is_cancelled() {
            return Ok(());
        }
        let result = match task {
            WalkTask::Tree { left, right } => self.tree(left, right),
            WalkTask::Contents {
                parents,
                index,
                left,
                right,
            } => self.contents(parents, index, left, right),
            WalkTask::LeafLeaf {
                parents,
                left,
                right,
            } => self.leaf_leaf(&parents, left, right),
            WalkTask::Bucket {
                parents,
                index,
                left,
                right,
                left_tree,
                right_tree,
            } => self.bucket(parents, index, left, right, left_tree, right_tree),
        };
        if result.is_err() {
            self.cancel();
        }
        result
    }

    fn fork(&self, tasks: Vec<WalkTask>) -> DiffResult<()> {
        self.executor.for_each(tasks, |task| self.run(task))
    }

    fn tree(&self, left: Option<NodeRef>, right: Option<NodeRef>) -> DiffResult<()> {
        let mut result = Ok(());
        if self.consumer.tree(left.as_ref(), right.as_ref()) && !self.is_cancelled() {
            result = self.tree_contents(&left, &right);
        }
        self.consumer.end_tree(left.as_ref(), right.as_ref());
        result
    }

    fn tree_contents(&self, left: &Option<NodeRef>, right: &Option<NodeRef>) -> DiffResult<()> {
        // The roots were handed in by the caller and may not be stored.
        let left_tree = match left {
            Some(node) if node.is_root() => self.left_root.clone(),
            Some(node) => load_tree(self.left_store, &node.object_id())?,
            None => RevTree::empty(),
        };
        let right_tree = match right {
            Some(node) if node.is_root() => self.right_root.clone(),
            Some(node) => load_tree(self.right_store, &node.object_id())?,
            None => RevTree::empty(),
        };
        let parents = Arc::new(Parents {
            left: left.clone(),
            right: right.clone(),
        });
        self.contents(
            parents,
            BucketIndex::ROOT,
            TreeContents::of(&left_tree),
            TreeContents::of(&right_tree),
        )
    }

    fn bucket(
        &self,
        parents: Arc<Parents>,
        index: BucketIndex,
        left: Option<Bucket>,
        right: Option<Bucket>,
        left_tree: RevTree,
        right_tree: RevTree,
    ) -> DiffResult<()> {
        let (left_parent, right_parent) = (parents.left.as_ref(), parents.right.as_ref());
        let mut result = Ok(());
        if self
            .consumer
            .bucket(left_parent, right_parent, &index, left.as_ref(), right.as_ref())
            && !self.is_cancelled()
        {
            result = self.contents(
                parents.clone(),
                index.clone(),
                TreeContents::of(&left_tree),
                TreeContents::of(&right_tree),
            );
        }
        self.consumer
            .end_bucket(left_parent, right_parent, &index, left.as_ref(), right.as_ref());
        result
    }

    fn contents(
        &self,
        parents: Arc<Parents>,
        index: BucketIndex,
        left: TreeContents,
        right: TreeContents,
    ) -> DiffResult<()> {
        if self.is_cancelled() {
            return Ok(());
        }
        if !left.is_bucketed() && !right.is_bucketed() {
            return self.leaf_leaf(&parents, left.nodes, right.nodes);
        }

        let depth = index.child_depth();
        let mut slots: BTreeMap<u32, Slot> = BTreeMap::new();
        for node in left.nodes {
            let slot = slots.entry(CanonicalNodeOrder::bucket(&node.name, depth)).or_default();
            slot.left_nodes.push(node);
        }
        for node in right.nodes {
            let slot = slots.entry(CanonicalNodeOrder::bucket(&node.name, depth)).or_default();
            slot.right_nodes.push(node);
        }
        for (i, bucket) in left.buckets {
            slots.entry(i).or_default().left_bucket = Some(bucket);
        }
        for (i, bucket) in right.buckets {
            slots.entry(i).or_default().right_bucket = Some(bucket);
        }
        slots.retain(|_, slot| !slot.is_unchanged());

        let left_ids: Vec<ObjectId> = slots
            .values()
            .filter_map(|s| s.left_bucket.as_ref().map(|b| b.object_id))
            .collect();
        let right_ids: Vec<ObjectId> = slots
            .values()
            .filter_map(|s| s.right_bucket.as_ref().map(|b| b.object_id))
            .collect();
        if self.is_cancelled() {
            return Ok(());
        }
        let mut trees = self.fetch_bucket_trees(&left_ids, &right_ids)?;

        let mut tasks = Vec::with_capacity(slots.len());
        for (i, slot) in slots {
            let child = index.append(i);
            let left_tree = trees.take_left(slot.left_bucket.as_ref());
            let right_tree = trees.take_right(slot.right_bucket.as_ref());
            let task = if !slot.has_nodes() {
                WalkTask::Bucket {
                    parents: parents.clone(),
                    index: child,
                    left: slot.left_bucket,
                    right: slot.right_bucket,
                    left_tree: left_tree.unwrap_or_else(RevTree::empty),
                    right_tree: right_tree.unwrap_or_else(RevTree::empty),
                }
            } else if !slot.has_buckets() {
                WalkTask::LeafLeaf {
                    parents: parents.clone(),
                    left: slot.left_nodes,
                    right: slot.right_nodes,
                }
            } else {
                WalkTask::Contents {
                    parents: parents.clone(),
                    index: child,
                    left: TreeContents::merged(slot.left_nodes, left_tree),
                    right: TreeContents::merged(slot.right_nodes, right_tree),
                }
            };
            tasks.push(task);
        }
        trace!(depth, tasks = tasks.len(), "comparing bucketed contents");
        self.fork(tasks)
    }

    fn leaf_leaf(&self, parents: &Parents, left: Vec<Node>, right: Vec<Node>) -> DiffResult<()> {
        let mut subtrees = Vec::new();
        for (l, r) in MergeJoin::new(left, right) {
            if self.is_cancelled() {
                return Ok(());
            }
            match (l, r) {
                // Same name, different kind: a removal plus an addition.
                (Some(l), Some(r)) if l.node_type != r.node_type => {
                    self.node_pair(parents, Some(l), None, &mut subtrees)?;
                    self.node_pair(parents, None, Some(r), &mut subtrees)?;
                }
                (l, r) => self.node_pair(parents, l, r, &mut subtrees)?,
            }
        }
        self.fork(subtrees)
    }

    /// Report one aligned pair. Tree pairs run inline on the serial executor
    /// and are collected into `subtrees` for forking otherwise.
    fn node_pair(
        &self,
        parents: &Parents,
        left: Option<Node>,
        right: Option<Node>,
        subtrees: &mut Vec<WalkTask>,
    ) -> DiffResult<()> {
        if self.is_cancelled() {
            return Ok(());
        }
        let left = left.map(|node| child_ref(parents.left.as_ref(), node));
        let right = right.map(|node| child_ref(parents.right.as_ref(), node));
        if let (Some(l), Some(r)) = (&left, &right) {
            if l.object_id() == r.object_id() && l.node().metadata_id == r.node().metadata_id {
                return Ok(());
            }
        }
        let is_tree = left
            .as_ref()
            .or(right.as_ref())
            .is_some_and(|n| n.node().is_tree());
        if is_tree {
            let task = WalkTask::Tree { left, right };
            if self.executor.is_serial() {
                self.run(task)?;
            } else {
                subtrees.push(task);
            }
        } else if !self.consumer.feature(left.as_ref(), right.as_ref()) {
            trace!("consumer stopped the diff walk");
            self.cancel();
        }
        Ok(())
    }

    fn fetch_bucket_trees(&self, left_ids: &[ObjectId], right_ids: &[ObjectId]) -> DiffResult<BucketTrees> {
        if left_ids.is_empty() && right_ids.is_empty() {
            return Ok(BucketTrees::default());
        }
        if self.shared_store {
            let ids = left_ids.iter().chain(right_ids).copied().collect();
            Ok(BucketTrees {
                left: fetch_trees(self.left_store, ids)?,
                right: None,
            })
        } else {
            Ok(BucketTrees {
                left: fetch_trees(self.left_store, left_ids.to_vec())?,
                right: Some(fetch_trees(self.right_store, right_ids.to_vec())?),
            })
        }
    }
}

fn child_ref(parent: Option<&NodeRef>, node: Node) -> NodeRef {
    match parent {
        Some(parent) => parent.child(node),
        None => NodeRef::new("", node, ObjectId::NULL),
    }
}

/// Bucket trees fetched for one level. `right` is `None` when both sides
/// read from the same store.
#[derive(Default)]
struct BucketTrees {
    left: HashMap<ObjectId, RevTree>,
    right: Option<HashMap<ObjectId, RevTree>>,
}

impl BucketTrees {
    fn take_left(&mut self, bucket: Option<&Bucket>) -> Option<RevTree> {
        bucket.and_then(|b| self.left.get(&b.object_id).cloned())
    }

    fn take_right(&mut self, bucket: Option<&Bucket>) -> Option<RevTree> {
        let trees = self.right.as_ref().unwrap_or(&self.left);
        bucket.and_then(|b| trees.get(&b.object_id).cloned())
    }
}

/// One batched read of `ids`; every id must resolve to a tree.
fn fetch_trees(store: &dyn ObjectStore, mut ids: Vec<ObjectId>) -> DiffResult<HashMap<ObjectId, RevTree>> {
    ids.sort();
    ids.dedup();
    let mut trees: HashMap<ObjectId, RevTree> = store
        .get_all_trees(&ids, &NoopListener)?
        .into_iter()
        .map(|tree| (tree.id(), tree))
        .collect();
    for id in &ids {
        if !trees.contains_key(id) {
            if *id != RevTree::empty_id() {
                return Err(StoreError::NotFound(*id).into());
            }
            trees.insert(*id, RevTree::empty());
        }
    }
    Ok(trees)
}

/// Aligns two canonically sorted node lists by name.
struct MergeJoin {
    left: Peekable<std::vec::IntoIter<Node>>,
    right: Peekable<std::vec::IntoIter<Node>>,
}

impl MergeJoin {
    fn new(left: Vec<Node>, right: Vec<Node>) -> Self {
        Self {
            left: left.into_iter().peekable(),
            right: right.into_iter().peekable(),
        }
    }
}

impl Iterator for MergeJoin {
    type Item = (Option<Node>, Option<Node>);

    fn next(&mut self) -> Option<Self::Item> {
        let order = match (self.left.peek(), self.right.peek()) {
            (None, None) => return None,
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some(l), Some(r)) => CanonicalNodeOrder::compare_nodes(l, r),
        };
        Some(match order {
            std::cmp::Ordering::Less => (self.left.next(), None),
            std::cmp::Ordering::Greater => (None, self.right.next()),
            std::cmp::Ordering::Equal => (self.left.next(), self.right.next()),
        })
    }
}
