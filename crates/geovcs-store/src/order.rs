//! Canonical ordering of tree nodes.
//!
//! Every tree, leaf or bucketed, orders its children by the same total order:
//! the node name is hashed with 64-bit FNV-1a, each of the top eight hash
//! bytes selects a bucket at the corresponding depth, and names only break
//! ties. Builders shard with [`CanonicalNodeOrder::bucket`] and the diff walk
//! uses the very same function to place nodes of a leaf tree into the
//! "virtual" bucket they would occupy on the bucketed side.

use std::cmp::Ordering;

use crate::object::Node;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// The canonical node order and bucket function.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalNodeOrder;

impl CanonicalNodeOrder {
    /// Deepest bucket level addressable by the 64-bit name hash.
    pub const MAX_DEPTH: usize = 8;

    /// FNV-1a over the UTF-8 bytes of `name`.
    pub fn hash(name: &str) -> u64 {
        name.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
    }

    /// Number of buckets a tree at `depth` is sharded into.
    pub fn max_buckets_for_level(depth: usize) -> u32 {
        match depth {
            0..=2 => 32,
            3..=4 => 8,
            5..=6 => 4,
            _ => 2,
        }
    }

    /// Largest number of direct children a leaf tree at `depth` holds before
    /// it is split into buckets.
    pub fn normalized_size_limit(depth: usize) -> usize {
        match depth {
            0..=2 => 512,
            _ => 256,
        }
    }

    /// Bucket index of `name` at `depth`. Depths past the last hash byte
    /// reuse the last byte.
    pub fn bucket(name: &str, depth: usize) -> u32 {
        Self::bucket_of_hash(Self::hash(name), depth)
    }

    pub fn bucket_of_hash(hash: u64, depth: usize) -> u32 {
        let depth = depth.min(Self::MAX_DEPTH - 1);
        let byte = ((hash >> (8 * (7 - depth))) & 0xff) as u32;
        (byte * Self::max_buckets_for_level(depth)) / 256
    }

    /// Compare two names in canonical order.
    pub fn compare(a: &str, b: &str) -> Ordering {
        let (ha, hb) = (Self::hash(a), Self::hash(b));
        (0..Self::MAX_DEPTH)
            .map(|depth| Self::bucket_of_hash(ha, depth).cmp(&Self::bucket_of_hash(hb, depth)))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.cmp(b))
    }

    pub fn compare_nodes(a: &Node, b: &Node) -> Ordering {
        Self::compare(&a.name, &b.name)
    }

    /// Sort nodes into canonical order.
    pub fn sort(nodes: &mut [Node]) {
        nodes.sort_by(Self::compare_nodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(CanonicalNodeOrder::hash(""), FNV_OFFSET_BASIS);
        assert_eq!(CanonicalNodeOrder::hash("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(CanonicalNodeOrder::hash("foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn buckets_stay_within_level_bounds() {
        for name in ["a", "b", "points.1", "roads/12", "zzz"] {
            for depth in 0..CanonicalNodeOrder::MAX_DEPTH + 2 {
                let bucket = CanonicalNodeOrder::bucket(name, depth);
                assert!(bucket < CanonicalNodeOrder::max_buckets_for_level(depth.min(7)));
            }
        }
    }

    #[test]
    fn level_sizes() {
        assert_eq!(CanonicalNodeOrder::max_buckets_for_level(0), 32);
        assert_eq!(CanonicalNodeOrder::max_buckets_for_level(4), 8);
        assert_eq!(CanonicalNodeOrder::max_buckets_for_level(6), 4);
        assert_eq!(CanonicalNodeOrder::max_buckets_for_level(7), 2);
        assert_eq!(CanonicalNodeOrder::normalized_size_limit(2), 512);
        assert_eq!(CanonicalNodeOrder::normalized_size_limit(3), 256);
    }

    #[test]
    fn compare_is_a_total_order_consistent_with_buckets() {
        let mut names: Vec<String> = (0..200).map(|i| format!("feature.{i}")).collect();
        names.sort_by(|a, b| CanonicalNodeOrder::compare(a, b));
        for pair in names.windows(2) {
            assert_eq!(CanonicalNodeOrder::compare(&pair[0], &pair[1]), Ordering::Less);
            assert!(
                CanonicalNodeOrder::bucket(&pair[0], 0) <= CanonicalNodeOrder::bucket(&pair[1], 0)
            );
        }
        assert_eq!(CanonicalNodeOrder::compare("x", "x"), Ordering::Equal);
    }
}
