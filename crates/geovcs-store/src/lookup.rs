//! Path resolution inside a (possibly bucketed) tree.

use geovcs_types::ObjectId;

use crate::error::StoreResult;
use crate::node_ref::NodeRef;
use crate::object::{Node, RevTree};
use crate::order::CanonicalNodeOrder;
use crate::traits::ObjectStore;

/// Load a tree, treating the well-known empty tree id as always present.
pub fn load_tree(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<RevTree> {
    if *id == RevTree::empty_id() {
        Ok(RevTree::empty())
    } else {
        store.get_tree(id)
    }
}

/// Resolve a `/`-separated path under `root` to a [`NodeRef`].
///
/// The empty path resolves to the root itself. Metadata ids are inherited
/// along the way, so the returned ref carries the feature type that applies
/// at `path`.
pub fn find_node(store: &dyn ObjectStore, root: &RevTree, path: &str) -> StoreResult<Option<NodeRef>> {
    let mut current = NodeRef::root(root, ObjectId::NULL);
    let mut tree = root.clone();
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();

    while let Some(segment) = segments.next() {
        let Some(node) = find_child(store, &tree, segment)? else {
            return Ok(None);
        };
        let child = current.child(node);
        if segments.peek().is_none() {
            return Ok(Some(child));
        }
        if !child.node().is_tree() {
            return Ok(None);
        }
        tree = load_tree(store, &child.object_id())?;
        current = child;
    }
    Ok(Some(current))
}

/// Find a direct child by name, descending through buckets as needed.
pub fn find_child(store: &dyn ObjectStore, tree: &RevTree, name: &str) -> StoreResult<Option<Node>> {
    let mut depth = 0;
    let mut level = std::borrow::Cow::Borrowed(tree);
    loop {
        if let Some(node) = level.direct_child(name) {
            return Ok(Some(node.clone()));
        }
        let index = CanonicalNodeOrder::bucket(name, depth);
        let Some(bucket) = level.bucket(index) else {
            return Ok(None);
        };
        level = std::borrow::Cow::Owned(load_tree(store, &bucket.object_id)?);
        depth += 1;
    }
}
