use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

use geovcs_crypto::ContentHasher;
use geovcs_types::{Envelope, FieldType, ObjectId, Value};

use crate::order::CanonicalNodeOrder;
use crate::text;

/// The kind of a stored object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Tree,
    Feature,
    FeatureType,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tree => write!(f, "tree"),
            Self::Feature => write!(f, "feature"),
            Self::FeatureType => write!(f, "feature type"),
        }
    }
}

/// Anything that may carry a spatial bounds summary.
pub trait Bounded {
    fn bounds(&self) -> Option<Envelope>;
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// What a [`Node`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Tree,
    Feature,
}

/// A named pointer to a child tree or feature.
///
/// `metadata_id` is the id of the feature type the target conforms to. When
/// absent it is inherited from the closest ancestor that has one.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub object_id: ObjectId,
    pub metadata_id: Option<ObjectId>,
    pub node_type: NodeType,
    pub bounds: Option<Envelope>,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        object_id: ObjectId,
        metadata_id: Option<ObjectId>,
        node_type: NodeType,
        bounds: Option<Envelope>,
    ) -> Self {
        Self {
            name: name.into(),
            object_id,
            metadata_id: metadata_id.and_then(ObjectId::non_null),
            node_type,
            bounds,
        }
    }

    pub fn feature(name: impl Into<String>, object_id: ObjectId, metadata_id: Option<ObjectId>) -> Self {
        Self::new(name, object_id, metadata_id, NodeType::Feature, None)
    }

    pub fn tree(name: impl Into<String>, object_id: ObjectId, metadata_id: Option<ObjectId>) -> Self {
        Self::new(name, object_id, metadata_id, NodeType::Tree, None)
    }

    pub fn with_bounds(mut self, bounds: Option<Envelope>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn is_tree(&self) -> bool {
        self.node_type == NodeType::Tree
    }

    pub fn is_feature(&self) -> bool {
        self.node_type == NodeType::Feature
    }
}

impl Bounded for Node {
    fn bounds(&self) -> Option<Envelope> {
        self.bounds
    }
}

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// One shard of a bucketed tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    pub index: u32,
    pub object_id: ObjectId,
    pub bounds: Option<Envelope>,
}

impl Bucket {
    pub fn new(index: u32, object_id: ObjectId, bounds: Option<Envelope>) -> Self {
        Self {
            index,
            object_id,
            bounds,
        }
    }
}

impl Bounded for Bucket {
    fn bounds(&self) -> Option<Envelope> {
        self.bounds
    }
}

// ---------------------------------------------------------------------------
// RevTree
// ---------------------------------------------------------------------------

/// An immutable, content-addressed tree.
///
/// A tree holds direct children (`trees` and `features`, each kept in
/// canonical order), buckets keyed by index, or both. `size` counts features
/// and `num_trees` counts trees, both recursively.
#[derive(Clone, Debug, PartialEq)]
pub struct RevTree {
    id: ObjectId,
    size: u64,
    num_trees: u64,
    trees: Vec<Node>,
    features: Vec<Node>,
    buckets: BTreeMap<u32, Bucket>,
}

impl RevTree {
    pub fn new(
        size: u64,
        num_trees: u64,
        mut trees: Vec<Node>,
        mut features: Vec<Node>,
        buckets: BTreeMap<u32, Bucket>,
    ) -> Self {
        CanonicalNodeOrder::sort(&mut trees);
        CanonicalNodeOrder::sort(&mut features);
        let id = ContentHasher::TREE.hash_text(&tree_text(size, num_trees, &trees, &features, &buckets));
        Self {
            id,
            size,
            num_trees,
            trees,
            features,
            buckets,
        }
    }

    /// A leaf tree whose features and subtrees are counted from `trees`'
    /// recorded sizes; convenient for trees with feature children only.
    pub fn leaf(trees: Vec<Node>, features: Vec<Node>) -> Self {
        let size = features.len() as u64;
        let num_trees = trees.len() as u64;
        Self::new(size, num_trees, trees, features, BTreeMap::new())
    }

    pub fn empty() -> Self {
        Self::new(0, 0, Vec::new(), Vec::new(), BTreeMap::new())
    }

    /// Id of the empty tree, a well-known constant.
    pub fn empty_id() -> ObjectId {
        static EMPTY_TREE_ID: OnceLock<ObjectId> = OnceLock::new();
        *EMPTY_TREE_ID.get_or_init(|| RevTree::empty().id)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn num_trees(&self) -> u64 {
        self.num_trees
    }

    pub fn trees(&self) -> &[Node] {
        &self.trees
    }

    pub fn features(&self) -> &[Node] {
        &self.features
    }

    pub fn buckets(&self) -> &BTreeMap<u32, Bucket> {
        &self.buckets
    }

    pub fn bucket(&self, index: u32) -> Option<&Bucket> {
        self.buckets.get(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.features.is_empty() && self.buckets.is_empty()
    }

    /// `true` when the tree holds buckets (possibly alongside direct nodes).
    pub fn is_bucketed(&self) -> bool {
        !self.buckets.is_empty()
    }

    /// Direct children, trees and features merged in canonical order.
    pub fn children(&self) -> Vec<Node> {
        let mut all: Vec<Node> = self.trees.iter().chain(&self.features).cloned().collect();
        CanonicalNodeOrder::sort(&mut all);
        all
    }

    /// Direct child lookup by name; does not descend into buckets.
    pub fn direct_child(&self, name: &str) -> Option<&Node> {
        self.trees
            .iter()
            .chain(&self.features)
            .find(|node| node.name == name)
    }
}

impl Bounded for RevTree {
    /// Union of every child and bucket bounds.
    fn bounds(&self) -> Option<Envelope> {
        self.trees
            .iter()
            .chain(&self.features)
            .filter_map(|n| n.bounds.as_ref())
            .chain(self.buckets.values().filter_map(|b| b.bounds.as_ref()))
            .fold(None, |acc, env| Some(Envelope::merge(acc, env)))
    }
}

fn tree_text(
    size: u64,
    num_trees: u64,
    trees: &[Node],
    features: &[Node],
    buckets: &BTreeMap<u32, Bucket>,
) -> String {
    fn bounds_text(bounds: &Option<Envelope>) -> String {
        bounds.map_or_else(String::new, |b| {
            format!("{};{};{};{}", b.min_x, b.min_y, b.max_x, b.max_y)
        })
    }
    let mut out = String::new();
    let _ = writeln!(out, "TREE\t{size}\t{num_trees}");
    for node in trees.iter().chain(features) {
        let kind = match node.node_type {
            NodeType::Tree => 'T',
            NodeType::Feature => 'F',
        };
        let _ = writeln!(
            out,
            "{kind}\t{}\t{}\t{}\t{}",
            node.name,
            node.object_id,
            node.metadata_id.unwrap_or(ObjectId::NULL),
            bounds_text(&node.bounds)
        );
    }
    for bucket in buckets.values() {
        let _ = writeln!(
            out,
            "B\t{}\t{}\t{}",
            bucket.index,
            bucket.object_id,
            bounds_text(&bucket.bounds)
        );
    }
    out
}

// ---------------------------------------------------------------------------
// Features and feature types
// ---------------------------------------------------------------------------

/// A feature record: an ordered list of attribute values.
///
/// The values line up positionally with the descriptors of the feature type
/// referenced by the node that points at the feature.
#[derive(Clone, Debug, PartialEq)]
pub struct RevFeature {
    id: ObjectId,
    values: Vec<Option<Value>>,
}

impl RevFeature {
    pub fn new(values: Vec<Option<Value>>) -> Self {
        let id = ContentHasher::FEATURE.hash_text(&text::feature_text(&values));
        Self { id, values }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// Value at `index`; `None` when absent or out of range.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Bounds of the first geometry value, if any.
    pub fn bounds(&self) -> Option<Envelope> {
        self.values
            .iter()
            .flatten()
            .find_map(Value::as_geometry)
            .and_then(|g| g.envelope())
    }
}

/// One attribute of a feature type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub nillable: bool,
    /// Coordinate reference system code for geometry attributes.
    pub crs: Option<String>,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nillable: true,
            crs: None,
        }
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.nillable = false;
        self
    }
}

/// A feature type (schema): a name and an ordered list of attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct RevFeatureType {
    id: ObjectId,
    name: String,
    descriptors: Vec<AttributeDescriptor>,
}

impl RevFeatureType {
    pub fn new(name: impl Into<String>, descriptors: Vec<AttributeDescriptor>) -> Self {
        let name = name.into();
        let id = ContentHasher::FEATURE_TYPE.hash_text(&text::feature_type_text(&name, &descriptors));
        Self {
            id,
            name,
            descriptors,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptors(&self) -> &[AttributeDescriptor] {
        &self.descriptors
    }

    /// Position of a descriptor equal to `descriptor`.
    pub fn index_of(&self, descriptor: &AttributeDescriptor) -> Option<usize> {
        self.descriptors.iter().position(|d| d == descriptor)
    }

    /// Descriptor and position by attribute name.
    pub fn descriptor(&self, name: &str) -> Option<(usize, &AttributeDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .find(|(_, d)| d.name == name)
    }
}

// ---------------------------------------------------------------------------
// RevObject
// ---------------------------------------------------------------------------

/// Any object the store holds.
#[derive(Clone, Debug, PartialEq)]
pub enum RevObject {
    Tree(RevTree),
    Feature(RevFeature),
    FeatureType(RevFeatureType),
}

impl RevObject {
    pub fn id(&self) -> ObjectId {
        match self {
            RevObject::Tree(t) => t.id(),
            RevObject::Feature(f) => f.id(),
            RevObject::FeatureType(ft) => ft.id(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            RevObject::Tree(_) => ObjectKind::Tree,
            RevObject::Feature(_) => ObjectKind::Feature,
            RevObject::FeatureType(_) => ObjectKind::FeatureType,
        }
    }
}

impl From<RevTree> for RevObject {
    fn from(tree: RevTree) -> Self {
        RevObject::Tree(tree)
    }
}

impl From<RevFeature> for RevObject {
    fn from(feature: RevFeature) -> Self {
        RevObject::Feature(feature)
    }
}

impl From<RevFeatureType> for RevObject {
    fn from(feature_type: RevFeatureType) -> Self {
        RevObject::FeatureType(feature_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geovcs_types::Geometry;

    fn feature_node(name: &str) -> Node {
        Node::feature(name, ObjectId::from_bytes(name.as_bytes()), None)
    }

    // -----------------------------------------------------------------------
    // RevTree
    // -----------------------------------------------------------------------

    #[test]
    fn tree_id_is_independent_of_input_order() {
        let a = RevTree::leaf(vec![], vec![feature_node("a"), feature_node("b")]);
        let b = RevTree::leaf(vec![], vec![feature_node("b"), feature_node("a")]);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.features(), b.features());
    }

    #[test]
    fn tree_id_depends_on_content() {
        let a = RevTree::leaf(vec![], vec![feature_node("a")]);
        let b = RevTree::leaf(vec![], vec![feature_node("b")]);
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), RevTree::empty_id());
    }

    #[test]
    fn empty_tree_is_well_known() {
        let empty = RevTree::empty();
        assert!(empty.is_empty());
        assert!(!empty.is_bucketed());
        assert_eq!(empty.id(), RevTree::empty_id());
        assert_eq!(empty.bounds(), None);
    }

    #[test]
    fn children_merge_trees_and_features_canonically() {
        let tree = RevTree::leaf(
            vec![Node::tree("roads", RevTree::empty_id(), None)],
            vec![feature_node("p1"), feature_node("p2")],
        );
        let names: Vec<String> = tree.children().into_iter().map(|n| n.name).collect();
        let mut expected = vec!["roads".to_string(), "p1".to_string(), "p2".to_string()];
        expected.sort_by(|a, b| CanonicalNodeOrder::compare(a, b));
        assert_eq!(names, expected);
        assert!(tree.direct_child("roads").is_some_and(Node::is_tree));
    }

    #[test]
    fn tree_bounds_union_children_and_buckets() {
        let mut buckets = BTreeMap::new();
        buckets.insert(
            3,
            Bucket::new(3, ObjectId::from_bytes(b"b"), Some(Envelope::new(5.0, 5.0, 6.0, 6.0))),
        );
        let node = feature_node("a").with_bounds(Some(Envelope::of_point(0.0, 0.0)));
        let tree = RevTree::new(1, 0, vec![], vec![node], buckets);
        assert_eq!(tree.bounds(), Some(Envelope::new(0.0, 0.0, 6.0, 6.0)));
    }

    // -----------------------------------------------------------------------
    // Features
    // -----------------------------------------------------------------------

    #[test]
    fn feature_id_follows_values() {
        let a = RevFeature::new(vec![Some(Value::Integer(1)), None]);
        let b = RevFeature::new(vec![Some(Value::Integer(1)), None]);
        let c = RevFeature::new(vec![Some(Value::Integer(2)), None]);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.get(0), Some(&Value::Integer(1)));
        assert_eq!(a.get(1), None);
        assert_eq!(a.get(9), None);
    }

    #[test]
    fn feature_bounds_come_from_first_geometry() {
        let f = RevFeature::new(vec![
            Some(Value::String("x".into())),
            Some(Value::Geometry(Geometry::point(2.0, 3.0))),
        ]);
        assert_eq!(f.bounds(), Some(Envelope::of_point(2.0, 3.0)));
    }

    #[test]
    fn feature_type_lookup() {
        let ft = RevFeatureType::new(
            "Points",
            vec![
                AttributeDescriptor::new("name", FieldType::String),
                AttributeDescriptor::new("geom", FieldType::Point).with_crs("EPSG:4326"),
            ],
        );
        let (index, descriptor) = ft.descriptor("geom").unwrap();
        assert_eq!(index, 1);
        assert_eq!(ft.index_of(descriptor), Some(1));
        assert!(ft.descriptor("missing").is_none());
        assert_eq!(RevObject::from(ft.clone()).kind(), ObjectKind::FeatureType);
        assert_eq!(RevObject::from(ft.clone()).id(), ft.id());
    }
}
