//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check expiry, dirty tracking and persistence properties
//! over generated inputs and operation sequences.

use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::{CachePolicy, PersistentCache};
use crate::clock::ManualClock;
use crate::codec::{Codec, CompressionAlgorithm, JsonCodec};
use crate::persistent::{PersistentKeyValueStore, PersistentStorage, Snapshot};
use crate::storage::testing::RecordingStorage;

// == Test Configuration ==
const TEST_LIFETIME: Duration = Duration::from_secs(300);

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn cache_on(storage: &RecordingStorage, clock: &Arc<ManualClock>) -> PersistentCache<String, String> {
    let durable = PersistentKeyValueStore::new(PersistentStorage::new(storage.clone(), None, JsonCodec));
    PersistentCache::with_clock(durable, TEST_LIFETIME, clock.clone())
}

// == Strategies ==
/// Small key space so operation sequences revisit keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

fn write_policy_strategy() -> impl Strategy<Value = CachePolicy> {
    prop_oneof![
        Just(CachePolicy::OnlyIfCache),
        Just(CachePolicy::IgnoreCache),
        (1u64..600).prop_map(|secs| CachePolicy::MaxAge(Duration::from_secs(secs))),
        Just(CachePolicy::Immutable),
        Just(CachePolicy::OnlyCached),
    ]
}

/// Operations on a persistent cache
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Option<String>, policy: CachePolicy },
    Update { key: String, value: String },
    Get { key: String },
    Advance { secs: u64 },
    Synchronize,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), prop::option::weighted(0.8, value_strategy()), write_policy_strategy())
            .prop_map(|(key, value, policy)| CacheOp::Set { key, value, policy }),
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Update { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        (0u64..400).prop_map(|secs| CacheOp::Advance { secs }),
        Just(CacheOp::Synchronize),
    ]
}

/// Operations on a persistent key-value store
#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: Option<u8> },
    Remove { key: String },
    RemoveAll,
    Synchronize,
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        6 => (key_strategy(), prop::option::of(0u8..4))
            .prop_map(|(key, value)| StoreOp::Set { key, value }),
        2 => key_strategy().prop_map(|key| StoreOp::Remove { key }),
        1 => Just(StoreOp::RemoveAll),
        3 => Just(StoreOp::Synchronize),
    ]
}

fn live_pairs(cache: &mut PersistentCache<String, String>) -> BTreeMap<String, String> {
    cache.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* entry with a non-zero max age, a fresh-only read succeeds until
    // the entry is strictly older than its max age, and the read that finds it
    // expired also evicts it.
    #[test]
    fn prop_ttl_correctness(max_age in 1u64..1000, elapsed in 0u64..2000, value in value_strategy()) {
        let clock = Arc::new(ManualClock::new(epoch()));
        let mut cache = cache_on(&RecordingStorage::new(), &clock);
        cache.set("k".into(), Some(value.clone()), CachePolicy::MaxAge(Duration::from_secs(max_age)));

        clock.advance(Duration::from_secs(elapsed));
        let read = cache.get(&"k".to_string(), CachePolicy::OnlyIfCache).cloned();

        if elapsed <= max_age {
            prop_assert_eq!(read, Some(value));
            prop_assert_eq!(cache.len(), 1);
        } else {
            prop_assert_eq!(read, None);
            prop_assert_eq!(cache.len(), 0);
        }
    }

    // *For any* elapsed time, an immutable entry is still served.
    #[test]
    fn prop_immutable_never_expires(elapsed in 0u64..(100 * 365 * 24 * 3600), value in value_strategy()) {
        let clock = Arc::new(ManualClock::new(epoch()));
        let mut cache = cache_on(&RecordingStorage::new(), &clock);
        cache.set("k".into(), Some(value.clone()), CachePolicy::Immutable);

        clock.advance(Duration::from_secs(elapsed));

        prop_assert_eq!(cache.get(&"k".to_string(), CachePolicy::Immutable), Some(&value));
    }

    // *For any* expired entry, `OnlyCached` still serves it while
    // `OnlyIfCache` reports a miss.
    #[test]
    fn prop_only_cached_bypasses_expiry(max_age in 1u64..1000, overshoot in 1u64..1000) {
        let clock = Arc::new(ManualClock::new(epoch()));
        let mut cache = cache_on(&RecordingStorage::new(), &clock);
        cache.set("k".into(), Some("v".into()), CachePolicy::MaxAge(Duration::from_secs(max_age)));

        clock.advance(Duration::from_secs(max_age + overshoot));

        prop_assert!(cache.get(&"k".to_string(), CachePolicy::OnlyCached).is_some());
        prop_assert!(cache.get(&"k".to_string(), CachePolicy::OnlyIfCache).is_none());
    }

    // *For any* sequence of mutations, the store is dirty exactly when it
    // diverged from the last write, synchronize writes once per divergence,
    // and a reload sees the model's contents.
    #[test]
    fn prop_dirty_flag_correctness(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let storage = RecordingStorage::new();
        let mut store: PersistentKeyValueStore<String, u8> =
            PersistentKeyValueStore::new(PersistentStorage::new(storage.clone(), None, JsonCodec));
        let mut model: HashMap<String, u8> = HashMap::new();
        let mut expect_dirty = false;
        let mut expected_writes = 0;

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    let changed = match value {
                        Some(v) => model.insert(key.clone(), v) != Some(v),
                        None => model.remove(&key).is_some(),
                    };
                    store.set(key, value);
                    expect_dirty |= changed;
                }
                StoreOp::Remove { key } => {
                    expect_dirty |= model.remove(&key).is_some();
                    store.remove(&key);
                }
                StoreOp::RemoveAll => {
                    expect_dirty |= !model.is_empty();
                    model.clear();
                    store.remove_all();
                }
                StoreOp::Synchronize => {
                    if expect_dirty {
                        expected_writes += 1;
                    }
                    prop_assert!(store.synchronize());
                    expect_dirty = false;
                }
            }
            prop_assert_eq!(store.is_dirty(), expect_dirty);
            prop_assert_eq!(storage.writes(), expected_writes);
        }

        store.synchronize();
        let mut reloaded: PersistentKeyValueStore<String, u8> =
            PersistentKeyValueStore::new(PersistentStorage::new(storage.clone(), None, JsonCodec));
        let contents: HashMap<String, u8> = reloaded.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(contents, model);
    }

    // *For any* sequence of cache operations, after synchronize a cache
    // reopened over the same storage at the same moment serves exactly the
    // live entries of the original.
    #[test]
    fn prop_synchronize_mirrors_hot_tier(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let storage = RecordingStorage::new();
        let clock = Arc::new(ManualClock::new(epoch()));
        let mut cache = cache_on(&storage, &clock);

        for op in ops {
            match op {
                CacheOp::Set { key, value, policy } => cache.set(key, value, policy),
                CacheOp::Update { key, value } => cache.update(key, value),
                CacheOp::Get { key } => {
                    cache.get(&key, CachePolicy::OnlyIfCache);
                }
                CacheOp::Advance { secs } => clock.advance(Duration::from_secs(secs)),
                CacheOp::Synchronize => {
                    prop_assert!(cache.synchronize());
                }
            }
        }

        prop_assert!(cache.synchronize());
        let writes = storage.writes();
        prop_assert!(cache.synchronize());
        prop_assert_eq!(storage.writes(), writes, "idle synchronize wrote");

        let mut reopened = cache_on(&storage, &clock);
        prop_assert_eq!(live_pairs(&mut reopened), live_pairs(&mut cache));
    }

    // *For any* byte sequence, including the empty one, decompression
    // inverts compression.
    #[test]
    fn prop_compression_symmetry(bytes in prop::collection::vec(any::<u8>(), 0..4096)) {
        for algo in [CompressionAlgorithm::Lz4, CompressionAlgorithm::Zstd] {
            let compressed = algo.compress(&bytes).unwrap();
            prop_assert!(!compressed.is_empty());
            prop_assert_eq!(algo.decompress(&compressed).unwrap(), bytes.clone());
        }
    }

    // *For any* mapping with structured keys, the JSON snapshot decodes to
    // an equal mapping.
    #[test]
    fn prop_snapshot_codec_roundtrip(
        map in prop::collection::hash_map((any::<u16>(), key_strategy()), value_strategy(), 0..20)
    ) {
        let snapshot = Snapshot::from(map);
        let bytes = JsonCodec.encode(&snapshot).unwrap();
        let decoded: Snapshot<(u16, String), String> = JsonCodec.decode(&bytes).unwrap();
        prop_assert_eq!(decoded.as_map(), snapshot.as_map());
    }
}
