//! Tests for the copyset manager as the write path drives it.
//!
//! # Test Strategy
//!
//! 1. **Config matching**: prepare, staleness, re-prepare
//! 2. **Shuffle policy**: chain vs. fan-out, disabled shuffling, fairness
//! 3. **Selection**: delegation and error propagation
//! 4. **Thread safety**: shared managers, serialized reconfiguration

use corelib::{
    ConfigVersion, Node, NodeConfig, NodeId, NodeSetState, NotAvailableReason, ServerConfig,
    ShardId, StorageSet,
};
use parking_lot::RwLock;
use replication::{
    CopySetManager, CopySetSelector, RandomSelector, SelectionError, SequentialSelector,
    StoreChainLink,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn shard(n: u16) -> ShardId {
    ShardId::new(n, 0)
}

/// Config in which every listed node is a read-write storage node with the
/// given weight.
fn config(version: u64, weights: &[(u16, f64)]) -> ServerConfig {
    weights.iter().fold(ServerConfig::new(ConfigVersion(version)), |cfg, (idx, w)| {
        cfg.with_node(NodeConfig::storage(Node::new(NodeId(*idx), format!("node{}", idx)), *w))
    })
}

fn manager_with(selector: impl CopySetSelector, nodeset: &StorageSet) -> CopySetManager {
    CopySetManager::new(Box::new(selector), Arc::new(NodeSetState::new(nodeset)))
}

fn links(shards: &[ShardId]) -> Vec<StoreChainLink> {
    shards.iter().copied().map(StoreChainLink::from).collect()
}

// ============================================================================
// Config Matching Tests
// ============================================================================

#[test]
fn test_zero_weight_node_scenario() {
    init_tracing();
    let full: StorageSet = vec![shard(1), shard(2), shard(3), shard(4)];
    let cfg = config(1, &[(1, 1.0), (2, 0.0), (3, 1.0), (4, 1.0)]);

    let mut manager = manager_with(SequentialSelector::new(2), &full);
    manager.prepare(full.clone(), &cfg);

    assert_eq!(manager.effective_nodeset(), &[shard(1), shard(3), shard(4)]);
    assert!(manager.matches_config(&cfg));

    // S4 disabled as well
    let cfg2 = config(2, &[(1, 1.0), (2, 0.0), (3, 1.0), (4, 0.0)]);
    assert!(!manager.matches_config(&cfg2));
}

#[test]
fn test_matches_config_ignores_unrelated_changes() {
    let full: StorageSet = vec![shard(1), shard(2)];
    let mut manager = manager_with(SequentialSelector::new(1), &full);
    manager.prepare(full, &config(1, &[(1, 1.0), (2, 1.0)]));

    // Different weights, an extra node and a new version: same eligible set
    let cfg2 = config(7, &[(1, 3.0), (2, 0.5), (9, 1.0)]);
    assert!(manager.matches_config(&cfg2));
}

#[test]
fn test_matches_config_detects_node_coming_back() {
    let full: StorageSet = vec![shard(1), shard(2), shard(3)];
    let mut manager = manager_with(SequentialSelector::new(1), &full);
    manager.prepare(full, &config(1, &[(1, 1.0), (3, 1.0)]));
    assert_eq!(manager.effective_nodeset(), &[shard(1), shard(3)]);

    assert!(!manager.matches_config(&config(2, &[(1, 1.0), (2, 1.0), (3, 1.0)])));
}

#[test]
fn test_reprepare_after_mismatch() {
    let full: StorageSet = vec![shard(1), shard(2), shard(3)];
    let cfg1 = config(1, &[(1, 1.0), (2, 1.0), (3, 1.0)]);
    let cfg2 = config(2, &[(1, 1.0), (2, 1.0), (3, 0.0)]);

    let mut manager = manager_with(SequentialSelector::new(2), &full);
    manager.prepare(full.clone(), &cfg1);
    assert!(!manager.matches_config(&cfg2));

    manager.prepare(full.clone(), &cfg2);
    assert!(manager.matches_config(&cfg2));
    assert!(!manager.matches_config(&cfg1));
    assert_eq!(manager.full_nodeset(), full.as_slice());
}

#[test]
fn test_prepare_is_idempotent() {
    let full: StorageSet = vec![shard(1), shard(2), shard(3)];
    let cfg = config(1, &[(1, 1.0), (2, 0.0), (3, 1.0)]);
    let other = config(2, &[(1, 1.0), (2, 1.0), (3, 1.0)]);

    let mut once = manager_with(SequentialSelector::new(1), &full);
    once.prepare(full.clone(), &cfg);
    let mut twice = manager_with(SequentialSelector::new(1), &full);
    twice.prepare(full.clone(), &cfg);
    twice.prepare(full.clone(), &cfg);

    assert_eq!(once.effective_nodeset(), twice.effective_nodeset());
    assert_eq!(once.matches_config(&cfg), twice.matches_config(&cfg));
    assert_eq!(once.matches_config(&other), twice.matches_config(&other));
}

#[test]
#[should_panic(expected = "never prepared")]
fn test_matches_config_before_prepare_panics() {
    let manager = manager_with(SequentialSelector::new(1), &vec![shard(1)]);
    manager.matches_config(&config(1, &[(1, 1.0)]));
}

#[test]
#[should_panic(expected = "never prepared")]
fn test_matches_config_after_empty_prepare_panics() {
    let mut manager = manager_with(SequentialSelector::new(1), &vec![]);
    manager.prepare(StorageSet::new(), &config(1, &[(1, 1.0)]));
    manager.matches_config(&config(1, &[(1, 1.0)]));
}

#[test]
fn test_config_from_json() -> anyhow::Result<()> {
    let cfg = ServerConfig::from_json(
        r#"{
            "version": 3,
            "nodes": [
                { "id": 1, "name": "a", "storage": "read-write", "storage_weight": 1.0 },
                { "id": 2, "name": "b", "storage": "read-write", "storage_weight": 0.0 },
                { "id": 3, "name": "c", "storage": "read-write", "storage_weight": 2.0 }
            ]
        }"#,
    )?;
    let full: StorageSet = vec![shard(1), shard(2), shard(3)];
    let mut manager = manager_with(SequentialSelector::new(2), &full);
    manager.prepare(full, &cfg);
    assert_eq!(manager.effective_nodeset(), &[shard(1), shard(3)]);
    assert!(manager.matches_config(&cfg));
    Ok(())
}

// ============================================================================
// Shuffle Policy Tests
// ============================================================================

#[test]
fn test_chain_preserves_order() {
    let manager = manager_with(SequentialSelector::new(3), &vec![]);
    let original = links(&[shard(1), shard(2), shard(3)]);

    for _ in 0..100 {
        let mut copyset = original.clone();
        manager.shuffle_copyset(&mut copyset, true);
        assert_eq!(copyset, original);
    }
}

#[test]
fn test_fan_out_is_permutation() {
    let manager = manager_with(SequentialSelector::new(3), &vec![]);
    let original = links(&[shard(1), shard(2), shard(3)]);
    let expected: HashSet<_> = original.iter().copied().collect();

    let mut orderings = HashSet::new();
    for _ in 0..200 {
        let mut copyset = original.clone();
        manager.shuffle_copyset(&mut copyset, false);
        assert_eq!(copyset.len(), 3);
        assert_eq!(copyset.iter().copied().collect::<HashSet<_>>(), expected);
        orderings.insert(copyset);
    }
    // 3! orderings, each with probability 1/6 per trial
    assert_eq!(orderings.len(), 6);
}

#[test]
fn test_disabled_shuffling_preserves_order() {
    let manager = manager_with(SequentialSelector::new(4), &vec![]);
    manager.disable_copyset_shuffling();
    let original = links(&[shard(1), shard(2), shard(3), shard(4)]);

    for chain in [false, true] {
        for _ in 0..50 {
            let mut copyset = original.clone();
            manager.shuffle_copyset(&mut copyset, chain);
            assert_eq!(copyset, original);
        }
    }
}

#[test]
fn test_shuffle_has_no_positional_bias() {
    const N: usize = 4;
    const TRIALS: usize = 40_000;

    let manager = manager_with(SequentialSelector::new(N), &vec![]);
    let original = links(&[shard(1), shard(2), shard(3), shard(4)]);

    // counts[element][position]
    let mut counts = [[0usize; N]; N];
    for _ in 0..TRIALS {
        let mut copyset = original.clone();
        manager.shuffle_copyset(&mut copyset, false);
        for (pos, link) in copyset.iter().enumerate() {
            let elem = original.iter().position(|l| l == link).unwrap();
            counts[elem][pos] += 1;
        }
    }

    // Expected 10_000 per cell, stddev ~87; allow a generous 5%
    let expected = TRIALS / N;
    for row in counts.iter() {
        for &c in row.iter() {
            let diff = (c as isize - expected as isize).unsigned_abs();
            assert!(diff < expected / 20, "positional bias: {:?}", counts);
        }
    }
}

#[test]
fn test_empty_and_single_copyset_shuffle() {
    let manager = manager_with(SequentialSelector::new(1), &vec![]);
    let mut empty: Vec<StoreChainLink> = Vec::new();
    manager.shuffle_copyset(&mut empty, false);
    assert!(empty.is_empty());

    let mut single = links(&[shard(5)]);
    manager.shuffle_copyset(&mut single, false);
    assert_eq!(single, links(&[shard(5)]));
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_select_and_shuffle_chain_keeps_selector_order() {
    let full: StorageSet = (1..=5).map(shard).collect();
    let mut manager = manager_with(SequentialSelector::new(3).with_start(1), &full);
    manager.prepare(full, &config(1, &[(1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0), (5, 1.0)]));

    let copyset = manager.select_and_shuffle(&[shard(3)], true).unwrap();
    assert_eq!(copyset, links(&[shard(2), shard(4), shard(5)]));
}

#[test]
fn test_selection_failure_propagates_unmodified() {
    let full: StorageSet = (1..=3).map(shard).collect();
    let mut manager = manager_with(RandomSelector::new(3), &full);
    manager.prepare(full, &config(1, &[(1, 1.0), (2, 1.0), (3, 0.0)]));

    let err = manager.select_and_shuffle(&[], false).unwrap_err();
    assert_eq!(err, SelectionError::NotEnoughNodes { required: 3, available: 2 });
}

#[test]
fn test_selection_consults_shared_nodeset_state() {
    let full: StorageSet = (1..=4).map(shard).collect();
    let state = Arc::new(NodeSetState::new(&full));
    let mut manager = CopySetManager::new(Box::new(SequentialSelector::new(2)), Arc::clone(&state));
    manager.prepare(full, &config(1, &[(1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0)]));

    // Health tracker holds its own reference
    state.set_not_available_until(
        shard(1),
        Instant::now() + Duration::from_secs(60),
        NotAvailableReason::Overloaded,
    );
    assert!(Arc::ptr_eq(manager.nodeset_state(), &state));
    assert_eq!(Arc::strong_count(&state), 2);

    let copyset = manager.select_copyset(&[]).unwrap();
    assert_eq!(copyset, links(&[shard(2), shard(3)]));
    assert_eq!(manager.selector().name(), "SequentialSelector");
}

// ============================================================================
// Thread Safety Tests
// ============================================================================

#[test]
fn test_concurrent_shuffles_share_manager() {
    let manager = manager_with(SequentialSelector::new(3), &vec![]);
    let original = links(&[shard(1), shard(2), shard(3), shard(4), shard(5)]);
    let expected: HashSet<_> = original.iter().copied().collect();

    crossbeam::scope(|s| {
        for t in 0..8 {
            let manager = &manager;
            let original = &original;
            let expected = &expected;
            s.spawn(move |_| {
                for i in 0..1_000 {
                    let mut copyset = original.clone();
                    let chain = (t + i) % 2 == 0;
                    manager.shuffle_copyset(&mut copyset, chain);
                    if chain {
                        assert_eq!(&copyset, original);
                    } else {
                        assert_eq!(&copyset.iter().copied().collect::<HashSet<_>>(), expected);
                    }
                }
            });
        }
    })
    .unwrap();
}

#[test]
fn test_serialized_reconfiguration() {
    init_tracing();
    let full: StorageSet = (1..=5).map(shard).collect();
    let all = config(1, &[(1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0), (5, 1.0)]);
    let mut manager = manager_with(RandomSelector::new(3), &full);
    manager.prepare(full.clone(), &all);
    let manager = Arc::new(RwLock::new(manager));

    crossbeam::scope(|s| {
        for _ in 0..4 {
            let manager = Arc::clone(&manager);
            s.spawn(move |_| {
                for _ in 0..500 {
                    let guard = manager.read();
                    let copyset = guard.select_and_shuffle(&[], false).unwrap();
                    assert_eq!(copyset.len(), 3);
                    let effective = guard.effective_nodeset();
                    assert!(copyset.iter().all(|l| effective.contains(&l.destination)));
                }
            });
        }

        let manager = Arc::clone(&manager);
        let full = full.clone();
        s.spawn(move |_| {
            for version in 2..50u64 {
                // Alternate node 5 in and out of the writable set
                let weight = if version % 2 == 0 { 0.0 } else { 1.0 };
                let cfg = config(version, &[(1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0), (5, weight)]);
                if !manager.read().matches_config(&cfg) {
                    manager.write().prepare(full.clone(), &cfg);
                }
                assert!(manager.read().matches_config(&cfg));
            }
        });
    })
    .unwrap();
}
