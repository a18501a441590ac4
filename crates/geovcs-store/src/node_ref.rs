use geovcs_types::{Envelope, ObjectId};

use crate::object::{Bounded, Node, NodeType, RevTree};

/// A [`Node`] together with the path of its parent tree and its resolved
/// metadata id.
///
/// This is the unit the diff walk hands to consumers. The metadata id is the
/// node's own when it has one, else the one inherited from its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRef {
    node: Node,
    parent_path: String,
    metadata_id: ObjectId,
}

impl NodeRef {
    pub fn new(parent_path: impl Into<String>, node: Node, parent_metadata_id: ObjectId) -> Self {
        let metadata_id = node.metadata_id.unwrap_or(parent_metadata_id);
        Self {
            node,
            parent_path: parent_path.into(),
            metadata_id,
        }
    }

    /// Ref for a root tree: empty name, empty parent path.
    pub fn root(tree: &RevTree, metadata_id: ObjectId) -> Self {
        let node = Node::tree("", tree.id(), metadata_id.non_null()).with_bounds(tree.bounds());
        Self::new("", node, metadata_id)
    }

    /// Ref for a root tree known only by id.
    pub fn root_id(tree_id: ObjectId, metadata_id: ObjectId, bounds: Option<Envelope>) -> Self {
        let node = Node::tree("", tree_id, metadata_id.non_null()).with_bounds(bounds);
        Self::new("", node, metadata_id)
    }

    /// Ref for `node` as a direct child of `self`.
    pub fn child(&self, node: Node) -> NodeRef {
        NodeRef::new(self.path(), node, self.metadata_id)
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn object_id(&self) -> ObjectId {
        self.node.object_id
    }

    pub fn node_type(&self) -> NodeType {
        self.node.node_type
    }

    pub fn metadata_id(&self) -> ObjectId {
        self.metadata_id
    }

    pub fn parent_path(&self) -> &str {
        &self.parent_path
    }

    /// Full `/`-separated path; empty for the root.
    pub fn path(&self) -> String {
        append_child(&self.parent_path, &self.node.name)
    }

    pub fn is_root(&self) -> bool {
        self.parent_path.is_empty() && self.node.name.is_empty()
    }
}

impl Bounded for NodeRef {
    fn bounds(&self) -> Option<Envelope> {
        self.node.bounds
    }
}

/// Join a parent path and a child name.
pub fn append_child(parent_path: &str, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        parent_path.to_string()
    } else {
        format!("{parent_path}/{name}")
    }
}

/// Parent path of `path`; empty for top-level names.
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Last segment of `path`.
pub fn node_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// `true` if `ancestor` is a strict ancestor of `path`. The root (empty
/// path) is an ancestor of every non-empty path.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Name of the direct child of `ancestor` on the way to `path`, if `ancestor`
/// is a strict ancestor of `path`.
pub fn child_towards<'a>(ancestor: &str, path: &'a str) -> Option<&'a str> {
    if !is_ancestor(ancestor, path) {
        return None;
    }
    let rest = if ancestor.is_empty() {
        path
    } else {
        &path[ancestor.len() + 1..]
    };
    rest.split('/').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        assert_eq!(append_child("", "roads"), "roads");
        assert_eq!(append_child("roads", "r1"), "roads/r1");
        assert_eq!(append_child("roads", ""), "roads");
        assert_eq!(parent_path("roads/r1"), "roads");
        assert_eq!(parent_path("roads"), "");
        assert_eq!(node_name("a/b/c"), "c");
        assert_eq!(node_name("c"), "c");
    }

    #[test]
    fn ancestry() {
        assert!(is_ancestor("", "roads"));
        assert!(!is_ancestor("", ""));
        assert!(is_ancestor("roads", "roads/r1"));
        assert!(!is_ancestor("roads", "roads"));
        assert!(!is_ancestor("road", "roads/r1"));
        assert_eq!(child_towards("", "a/b/c"), Some("a"));
        assert_eq!(child_towards("a", "a/b/c"), Some("b"));
        assert_eq!(child_towards("a/b", "a/bc"), None);
    }

    #[test]
    fn metadata_is_inherited_unless_overridden() {
        let md = ObjectId::from_bytes(b"schema");
        let own = ObjectId::from_bytes(b"own");
        let root = NodeRef::root_id(ObjectId::from_bytes(b"root"), ObjectId::NULL, None);
        let layer = root.child(Node::tree("points", ObjectId::from_bytes(b"t"), Some(md)));
        let inherited = layer.child(Node::feature("p1", ObjectId::from_bytes(b"f1"), None));
        let overridden = layer.child(Node::feature("p2", ObjectId::from_bytes(b"f2"), Some(own)));

        assert!(root.is_root());
        assert_eq!(root.path(), "");
        assert_eq!(layer.path(), "points");
        assert_eq!(inherited.path(), "points/p1");
        assert_eq!(inherited.metadata_id(), md);
        assert_eq!(overridden.metadata_id(), own);
    }
}
