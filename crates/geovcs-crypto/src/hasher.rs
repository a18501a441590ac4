use geovcs_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"geovcs-tree-v1"`) that is
/// prepended to every hash computation, followed by `:`.
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for tree objects.
    pub const TREE: Self = Self {
        domain: "geovcs-tree-v1",
    };
    /// Hasher for feature records (text form).
    pub const FEATURE: Self = Self {
        domain: "geovcs-feature-v1",
    };
    /// Hasher for feature type records (text form).
    pub const FEATURE_TYPE: Self = Self {
        domain: "geovcs-featuretype-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a canonical text form with domain separation.
    pub fn hash_text(&self, text: &str) -> ObjectId {
        self.hash(text.as_bytes())
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let id1 = ContentHasher::FEATURE.hash(b"FEATURE\nINTEGER\t1\n");
        let id2 = ContentHasher::FEATURE.hash(b"FEATURE\nINTEGER\t1\n");
        assert_eq!(id1, id2);
    }

    #[test]
    fn domains_separate_identical_bytes() {
        let data = b"same content";
        let tree = ContentHasher::TREE.hash(data);
        let feature = ContentHasher::FEATURE.hash(data);
        let feature_type = ContentHasher::FEATURE_TYPE.hash(data);
        assert_ne!(tree, feature);
        assert_ne!(feature, feature_type);
        assert_ne!(tree, feature_type);
    }

    #[test]
    fn hash_text_matches_hash_of_bytes() {
        let text = "TREE\nsize\t0\n";
        assert_eq!(
            ContentHasher::TREE.hash_text(text),
            ContentHasher::TREE.hash(text.as_bytes())
        );
        assert!(!ContentHasher::TREE.hash_text(text).is_null());
    }

    #[test]
    fn custom_domain() {
        let hasher = ContentHasher::new("geovcs-test-v1");
        assert_eq!(hasher.domain(), "geovcs-test-v1");
        assert_ne!(hasher.hash(b"data"), ContentHasher::TREE.hash(b"data"));
    }
}
