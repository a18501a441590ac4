//! Fixtures shared by the unit tests of this crate.

use std::sync::Arc;

use geovcs_store::{
    AttributeDescriptor, Bucket, CanonicalTreeBuilder, InMemoryObjectStore, Node, NodeRef,
    ObjectStore, RevFeature, RevFeatureType, RevTree,
};
use geovcs_types::{FieldType, Geometry, Value};
use parking_lot::Mutex;

use crate::walk::{BucketIndex, Consumer};

pub(crate) fn points_type() -> RevFeatureType {
    RevFeatureType::new(
        "Points",
        vec![
            AttributeDescriptor::new("name", FieldType::String),
            AttributeDescriptor::new("geom", FieldType::Point).with_crs("EPSG:4326"),
        ],
    )
}

pub(crate) fn point(name: &str, x: f64, y: f64) -> RevFeature {
    RevFeature::new(vec![
        Some(Value::String(name.to_string())),
        Some(Value::Geometry(Geometry::point(x, y))),
    ])
}

/// An in-memory repository with helpers to build layered trees.
pub(crate) struct Fixture {
    pub store: Arc<InMemoryObjectStore>,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryObjectStore::new());
        store.put(points_type().into()).unwrap();
        Self { store }
    }

    pub fn dyn_store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    pub fn feature_node(&self, name: &str, feature: &RevFeature) -> Node {
        self.store.put(feature.clone().into()).unwrap();
        Node::feature(name, feature.id(), None).with_bounds(feature.bounds())
    }

    /// Layer of point features `name -> (x, y)` built with `leaf_limit`.
    pub fn layer(&self, points: &[(&str, f64, f64)], leaf_limit: usize) -> RevTree {
        let mut builder = CanonicalTreeBuilder::new(self.store.as_ref()).with_leaf_limit(leaf_limit);
        for (name, x, y) in points {
            builder.put(self.feature_node(name, &point(name, *x, *y)));
        }
        builder.build().unwrap()
    }

    /// Root tree holding each layer under its name, typed as `Points`.
    pub fn root(&self, layers: &[(&str, &RevTree)]) -> RevTree {
        let md = points_type().id();
        let mut builder = CanonicalTreeBuilder::new(self.store.as_ref());
        for (name, tree) in layers {
            builder.put(Node::tree(*name, tree.id(), Some(md)).with_bounds(tree_bounds(tree)));
        }
        builder.build().unwrap()
    }

    /// Hybrid tree: the given direct features plus the buckets of `bucketed`.
    pub fn hybrid(&self, direct: &[(&str, f64, f64)], bucketed: &RevTree) -> RevTree {
        let nodes: Vec<Node> = direct
            .iter()
            .map(|(name, x, y)| self.feature_node(name, &point(name, *x, *y)))
            .collect();
        let buckets: std::collections::BTreeMap<u32, Bucket> = bucketed.buckets().clone();
        let tree = RevTree::new(
            bucketed.size() + nodes.len() as u64,
            0,
            Vec::new(),
            nodes,
            buckets,
        );
        self.store.put(tree.clone().into()).unwrap();
        tree
    }
}

fn tree_bounds(tree: &RevTree) -> Option<geovcs_types::Envelope> {
    geovcs_store::Bounded::bounds(tree)
}

/// Names of `n` generated points.
pub(crate) fn names(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}{i}")).collect()
}

pub(crate) fn side_path(side: Option<&NodeRef>) -> String {
    side.map_or_else(|| "-".to_string(), NodeRef::path)
}

/// Records every event as a line of text.
#[derive(Default)]
pub(crate) struct RecordingConsumer {
    pub events: Mutex<Vec<String>>,
}

impl RecordingConsumer {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// `(left, right)` path pairs of the feature events, sorted.
    pub fn feature_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .events()
            .iter()
            .filter_map(|e| e.strip_prefix("feature "))
            .filter_map(|rest| rest.split_once(' '))
            .map(|(l, r)| (l.to_string(), r.to_string()))
            .collect();
        pairs.sort();
        pairs
    }
}

impl Consumer for RecordingConsumer {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        self.events
            .lock()
            .push(format!("feature {} {}", side_path(left), side_path(right)));
        true
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        self.events
            .lock()
            .push(format!("tree {} {}", side_path(left), side_path(right)));
        true
    }

    fn end_tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        self.events
            .lock()
            .push(format!("end_tree {} {}", side_path(left), side_path(right)));
    }

    fn bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        _left: Option<&Bucket>,
        _right: Option<&Bucket>,
    ) -> bool {
        let path = side_path(left_parent.or(right_parent));
        self.events.lock().push(format!("bucket {path} {index}"));
        true
    }

    fn end_bucket(
        &self,
        left_parent: Option<&NodeRef>,
        right_parent: Option<&NodeRef>,
        index: &BucketIndex,
        _left: Option<&Bucket>,
        _right: Option<&Bucket>,
    ) {
        let path = side_path(left_parent.or(right_parent));
        self.events.lock().push(format!("end_bucket {path} {index}"));
    }
}

/// Swap-side copy of a `(left, right)` pair list.
pub(crate) fn swapped(pairs: &[(String, String)]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = pairs.iter().map(|(l, r)| (r.clone(), l.clone())).collect();
    out.sort();
    out
}
