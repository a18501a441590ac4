//! Flat records of individual changes.

use std::fmt;

use geovcs_store::NodeRef;
use geovcs_types::ObjectId;
use parking_lot::Mutex;

use crate::walk::Consumer;

/// Kind of change a [`DiffEntry`] records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "ADDED"),
            Self::Removed => write!(f, "REMOVED"),
            Self::Modified => write!(f, "MODIFIED"),
        }
    }
}

/// One changed tree or feature. At least one side is present.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffEntry {
    old: Option<NodeRef>,
    new: Option<NodeRef>,
}

impl DiffEntry {
    /// Returns `None` when both sides are absent.
    pub fn new(old: Option<NodeRef>, new: Option<NodeRef>) -> Option<Self> {
        if old.is_none() && new.is_none() {
            return None;
        }
        Some(Self { old, new })
    }

    pub fn old_object(&self) -> Option<&NodeRef> {
        self.old.as_ref()
    }

    pub fn new_object(&self) -> Option<&NodeRef> {
        self.new.as_ref()
    }

    pub fn change_type(&self) -> ChangeType {
        match (&self.old, &self.new) {
            (None, _) => ChangeType::Added,
            (_, None) => ChangeType::Removed,
            _ => ChangeType::Modified,
        }
    }

    /// Path of the new side, or of the old one for removals.
    pub fn path(&self) -> String {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .map(NodeRef::path)
            .unwrap_or_default()
    }

    pub fn old_object_id(&self) -> ObjectId {
        self.old.as_ref().map_or(ObjectId::NULL, NodeRef::object_id)
    }

    pub fn new_object_id(&self) -> ObjectId {
        self.new.as_ref().map_or(ObjectId::NULL, NodeRef::object_id)
    }

    pub fn is_tree(&self) -> bool {
        self.new.as_ref().or(self.old.as_ref()).is_some_and(|n| n.node().is_tree())
    }

    pub fn reversed(&self) -> Self {
        Self {
            old: self.new.clone(),
            new: self.old.clone(),
        }
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.change_type(),
            self.path(),
            self.old_object_id().short_hex(),
            self.new_object_id().short_hex()
        )
    }
}

/// Gathers a [`DiffEntry`] per changed feature, and per changed non-root
/// tree when `report_trees` is set. Always descends.
#[derive(Debug, Default)]
pub struct DiffEntryCollector {
    entries: Mutex<Vec<DiffEntry>>,
    report_trees: bool,
}

impl DiffEntryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reporting_trees(mut self, report_trees: bool) -> Self {
        self.report_trees = report_trees;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collected entries ordered by path.
    pub fn into_entries(self) -> Vec<DiffEntry> {
        let mut entries = self.entries.into_inner();
        entries.sort_by_key(DiffEntry::path);
        entries
    }

    fn push(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        if let Some(entry) = DiffEntry::new(left.cloned(), right.cloned()) {
            self.entries.lock().push(entry);
        }
    }
}

impl Consumer for DiffEntryCollector {
    fn feature(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        self.push(left, right);
        true
    }

    fn tree(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        let is_root = left.or(right).is_some_and(NodeRef::is_root);
        if self.report_trees && !is_root {
            self.push(left, right);
        }
        true
    }
}
