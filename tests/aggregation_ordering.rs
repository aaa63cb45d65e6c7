//! Integration tests for publish-order independence
//!
//! These tests validate the protocol's ordering contract: the final merged
//! index has the same crate set for every publish-order permutation, while
//! each crate's descriptor sequence follows the publish order of that run,
//! and buffering before attach is indistinguishable from delivery after.

use implex::{CrateId, ImplexError, IndexRegistry, IndexShard, MergedIndex};
use parking_lot::Mutex;
use std::sync::Arc;

fn fixture_shards() -> Vec<IndexShard> {
    vec![
        IndexShard::new("std::hash::Hash")
            .with_descriptors("std", ["impl Hash for BTreeMap"])
            .with_descriptors("core", ["impl Hash for u32"]),
        IndexShard::new("core::fmt::Debug")
            .with_descriptors("std", ["impl Debug for String"])
            .with_descriptors("alloc", ["impl Debug for Vec"]),
        IndexShard::new("core::clone::Clone").with_descriptors("std", ["impl Clone for PathBuf"]),
    ]
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn recurse(prefix: &mut Vec<usize>, remaining: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if remaining.is_empty() {
            out.push(prefix.clone());
            return;
        }
        for i in 0..remaining.len() {
            let item = remaining.remove(i);
            prefix.push(item);
            recurse(prefix, remaining, out);
            prefix.pop();
            remaining.insert(i, item);
        }
    }

    let mut out = Vec::new();
    recurse(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}

fn descriptor_strings(index: &MergedIndex, crate_id: &str) -> Vec<String> {
    index
        .descriptors_for(&CrateId::new(crate_id))
        .unwrap_or(&[])
        .iter()
        .map(|d| d.as_str().to_string())
        .collect()
}

/// Expected per-crate sequence for a given publish order: the concatenation of
/// each shard's contribution to that crate, in publish order.
fn expected_sequence(shards: &[IndexShard], order: &[usize], crate_id: &str) -> Vec<String> {
    let id = CrateId::new(crate_id);
    order
        .iter()
        .flat_map(|&i| shards[i].descriptors_for(&id).unwrap_or(&[]))
        .map(|d| d.as_str().to_string())
        .collect()
}

#[test]
fn publish_order_permutations_yield_same_crate_set() -> Result<(), ImplexError> {
    let shards = fixture_shards();
    let mut crate_sets: Vec<Vec<String>> = Vec::new();

    for order in permutations(shards.len()) {
        let registry = IndexRegistry::new();
        for &i in &order {
            registry.publish(shards[i].clone())?;
        }
        registry.attach(|_| {})?;

        let merged = registry.merged()?;
        crate_sets.push(merged.crate_ids().map(|id| id.as_str().to_string()).collect());

        // Within-crate order tracks this run's publish order.
        for crate_id in ["std", "core", "alloc"] {
            assert_eq!(
                descriptor_strings(&merged, crate_id),
                expected_sequence(&shards, &order, crate_id),
                "crate {} out of order for publish order {:?}",
                crate_id,
                order
            );
        }
    }

    for set in &crate_sets {
        assert_eq!(set, &crate_sets[0], "crate set differs across permutations");
    }

    Ok(())
}

#[test]
fn attach_before_and_after_publish_commute() -> Result<(), ImplexError> {
    let shards = fixture_shards();

    let early = IndexRegistry::new();
    early.attach(|_| {})?;
    for shard in shards.clone() {
        early.publish(shard)?;
    }

    let late = IndexRegistry::new();
    for shard in shards {
        late.publish(shard)?;
    }
    late.attach(|_| {})?;

    assert_eq!(early.merged()?, late.merged()?);
    Ok(())
}

#[test]
fn buffered_shards_merge_into_consumer_view() -> Result<(), ImplexError> {
    let registry = IndexRegistry::new();
    registry.publish(IndexShard::new("trait.A").with_descriptors("cratea", ["ImplX"]))?;
    registry.publish(
        IndexShard::new("trait.B")
            .with_descriptors("cratea", ["ImplY"])
            .with_descriptors("crateb", ["ImplZ"]),
    )?;

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delivered);
    registry.attach(move |index| sink.lock().push(index.clone()))?;

    let delivered = delivered.lock();
    assert_eq!(delivered.len(), 1);
    assert_eq!(descriptor_strings(&delivered[0], "cratea"), vec!["ImplX", "ImplY"]);
    assert_eq!(descriptor_strings(&delivered[0], "crateb"), vec!["ImplZ"]);
    Ok(())
}

#[test]
fn attach_first_single_publish_invokes_once() -> Result<(), ImplexError> {
    let registry = IndexRegistry::new();
    let invocations = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&invocations);
    registry.attach(move |index| sink.lock().push(index.clone()))?;

    registry.publish(IndexShard::new("trait.A").with_descriptors("cratea", ["ImplX"]))?;

    let invocations = invocations.lock();
    assert_eq!(invocations.len(), 1, "consumer invoked exactly once");
    assert_eq!(descriptor_strings(&invocations[0], "cratea"), vec!["ImplX"]);
    assert_eq!(invocations[0].crate_count(), 1);
    Ok(())
}

#[test]
fn attach_with_nothing_published_sees_empty_mapping() -> Result<(), ImplexError> {
    let registry = IndexRegistry::new();
    registry.attach(|_| {})?;

    let snapshot = registry.merged()?;
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.descriptor_count(), 0);
    Ok(())
}

#[test]
fn second_attach_rejected_and_first_consumer_kept() -> Result<(), ImplexError> {
    let registry = IndexRegistry::new();
    let first_count = Arc::new(Mutex::new(0usize));
    let second_count = Arc::new(Mutex::new(0usize));

    let sink = Arc::clone(&first_count);
    registry.attach(move |_| *sink.lock() += 1)?;

    let sink = Arc::clone(&second_count);
    let error = registry.attach(move |_| *sink.lock() += 1).unwrap_err();
    assert!(matches!(error, ImplexError::AlreadyAttached { .. }));
    assert!(error.is_contract_violation());

    registry.publish(IndexShard::new("trait.A").with_descriptors("cratea", ["ImplX"]))?;

    assert_eq!(*first_count.lock(), 1);
    assert_eq!(*second_count.lock(), 0, "second consumer is never invoked");
    Ok(())
}

#[test]
fn same_crate_across_shards_concatenates_without_loss() -> Result<(), ImplexError> {
    let registry = IndexRegistry::new();
    registry.attach(|_| {})?;

    registry.publish(IndexShard::new("trait.A").with_descriptors("std", ["A1", "A2"]))?;
    registry.publish(IndexShard::new("trait.B").with_descriptors("std", ["B1"]))?;

    let merged = registry.merged()?;
    assert_eq!(descriptor_strings(&merged, "std"), vec!["A1", "A2", "B1"]);
    assert_eq!(merged.merged_shards(), 2);
    Ok(())
}
