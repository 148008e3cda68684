//! Property tests for hashing, interval arithmetic and routing.

use std::sync::Arc;

use corelib::{
    HashAlgorithm, IdSpace, Identifier, LocalRegistry, Peer, RingConfig, RingNode,
};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn algorithm() -> impl Strategy<Value = HashAlgorithm> {
    prop_oneof![
        Just(HashAlgorithm::Fnv1a),
        Just(HashAlgorithm::Xxh3),
        Just(HashAlgorithm::Sip13),
    ]
}

/// Walks the circle clockwise from `a` to `b` one step at a time.
fn brute_force_open(modulus: u64, x: u64, a: u64, b: u64) -> bool {
    let mut current = (a + 1) % modulus;
    while current != b {
        if current == x {
            return true;
        }
        current = (current + 1) % modulus;
    }
    false
}

proptest! {
    #[test]
    fn prop_hash_deterministic_and_in_range(
        key in ".{0,40}",
        bits in 1u32..=63,
        hasher in algorithm(),
    ) {
        let config = RingConfig { bits, hasher, ..RingConfig::default() };
        let hash = config.identifier_hash().unwrap();
        let first = hash.hash(&key);
        let second = hash.hash(&key);
        prop_assert_eq!(first, second);
        prop_assert!(first.0 < 1u64 << bits);
    }

    #[test]
    fn prop_intervals_match_brute_force(a in 0u64..32, b in 0u64..32, x in 0u64..32) {
        let space = IdSpace::new(5).unwrap();
        let (xi, ai, bi) = (Identifier(x), Identifier(a), Identifier(b));

        let open = if a == b { x != a } else { brute_force_open(32, x, a, b) };
        let open_closed = if a == b { true } else { open || x == b };

        prop_assert_eq!(space.in_open(xi, ai, bi), open);
        prop_assert_eq!(space.in_open_closed(xi, ai, bi), open_closed);
    }

    #[test]
    fn prop_distance_and_wrap(a in 0u64..1024, b in 0u64..1024) {
        let space = IdSpace::new(10).unwrap();
        let d = space.distance(Identifier(a), Identifier(b));
        prop_assert!(d < 1024);
        prop_assert_eq!(space.add(Identifier(a), d), Identifier(b));
        prop_assert_eq!(space.sub(Identifier(b), d), Identifier(a));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_routing_finds_owner(
        ids in prop::collection::btree_set(0u64..256, 1..8)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
        keys in prop::collection::vec(0u64..256, 1..16),
    ) {
        let mut sorted = ids.clone();
        sorted.sort_unstable();

        runtime().block_on(async {
            let registry = LocalRegistry::new();
            let mut nodes: Vec<Arc<RingNode>> = Vec::new();
            for &id in &ids {
                let node = registry
                    .spawn(id, format!("n{}", id), RingConfig::with_bits(8))
                    .unwrap();
                let bootstrap = nodes.first().map(|n| n.node_ref().clone());
                node.join(bootstrap).await.unwrap();
                nodes.push(node);
            }

            for node in &nodes {
                for &key in &keys {
                    let expected = sorted
                        .iter()
                        .copied()
                        .find(|&id| id >= key)
                        .unwrap_or(sorted[0]);
                    let owner = node.find_successor(Identifier(key)).await.unwrap();
                    assert_eq!(owner.id, Identifier(expected), "key {} from {}", key, node.node_ref());
                }
            }
        });
    }
}
