use std::fmt;

/// Path of bucket indexes from a tree root down to one bucket.
///
/// The empty index addresses the tree itself. Indexes order
/// lexicographically, which matches the canonical order of the buckets they
/// name, so they double as a stable traversal-position key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketIndex(Vec<u32>);

impl BucketIndex {
    pub const ROOT: BucketIndex = BucketIndex(Vec::new());

    pub fn new(indexes: Vec<u32>) -> Self {
        Self(indexes)
    }

    /// Index of the child bucket `index` one level down.
    pub fn append(&self, index: u32) -> BucketIndex {
        let mut path = self.0.clone();
        path.push(index);
        BucketIndex(path)
    }

    /// Depth of the trees this index addresses; children sit one deeper.
    pub fn depth_index(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Depth at which the children of the addressed tree are bucketed.
    pub fn child_depth(&self) -> usize {
        self.0.len()
    }

    pub fn last_index(&self) -> Option<u32> {
        self.0.last().copied()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indexes(&self) -> &[u32] {
        &self.0
    }
}

impl fmt::Display for BucketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for index in &self.0 {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{index}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_builds_paths() {
        let index = BucketIndex::ROOT.append(3).append(17);
        assert_eq!(index.indexes(), &[3, 17]);
        assert_eq!(index.child_depth(), 2);
        assert_eq!(index.depth_index(), 1);
        assert_eq!(index.last_index(), Some(17));
        assert_eq!(index.to_string(), "3/17");
        assert!(BucketIndex::ROOT.is_root());
        assert_eq!(BucketIndex::ROOT.to_string(), "");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = BucketIndex::new(vec![1]);
        let b = BucketIndex::new(vec![1, 0]);
        let c = BucketIndex::new(vec![2]);
        assert!(BucketIndex::ROOT < a);
        assert!(a < b);
        assert!(b < c);
    }
}
