//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check bucket rotation and statistics over arbitrary
//! sequences of cache operations.

use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::WorkerConfig;
use crate::fetch::{Request, Response, ResponseType};
use crate::platform::{CacheStorage, MemoryCacheStorage};

// == Test Configuration ==
const APP: &str = "http://localhost:3000";

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn store_with(storage: Arc<MemoryCacheStorage>) -> CacheStore {
    let config = WorkerConfig {
        manifest: Vec::new(),
        ..WorkerConfig::default()
    };
    CacheStore::new(storage, Arc::new(config))
}

// == Strategies ==
fn path_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_map(|s| format!("/{}.html", s))
}

#[derive(Debug, Clone)]
enum CacheOp {
    Store { path: String, status: u16 },
    Lookup { path: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (path_strategy(), prop_oneof![Just(200u16), Just(404u16), Just(500u16)])
            .prop_map(|(path, status)| CacheOp::Store { path, status }),
        path_strategy().prop_map(|path| CacheOp::Lookup { path }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Property: after activation only the current bucket remains, and every
    // stale bucket is reported deleted exactly once
    #[test]
    fn prop_activation_keeps_only_current_bucket(
        stale in prop::collection::btree_set("security-companion-v0\\.[0-9]\\.[0-9]", 0..8)
    ) {
        let storage = Arc::new(MemoryCacheStorage::new());
        let store = store_with(storage.clone());

        let (keys, deleted) = runtime().block_on(async {
            for name in &stale {
                storage.open(name).await.unwrap();
            }
            storage.open(store.version()).await.unwrap();
            let report = store.activate().await.unwrap();
            (storage.keys().await.unwrap(), report.deleted)
        });

        prop_assert_eq!(keys, vec![store.version().to_string()]);
        let deleted: BTreeSet<String> = deleted.into_iter().collect();
        prop_assert_eq!(deleted, stale);
    }

    // Property: statistics match a model of which URLs were stored
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let store = store_with(Arc::new(MemoryCacheStorage::new()));

        let mut cached: HashSet<String> = HashSet::new();
        let (mut hits, mut misses, mut stores, mut rejected) = (0u64, 0u64, 0u64, 0u64);

        let stats = runtime().block_on(async {
            for op in &ops {
                match op {
                    CacheOp::Store { path, status } => {
                        let url = format!("{}{}", APP, path);
                        let request = Request::get(&url).unwrap();
                        let response = Response::with_status(
                            request.url.clone(),
                            *status,
                            ResponseType::Basic,
                            path.as_bytes().to_vec(),
                        );
                        let stored = store.store(&request, &response).await.unwrap();
                        assert_eq!(stored, *status == 200);
                        if stored {
                            stores += 1;
                            cached.insert(url);
                        } else {
                            rejected += 1;
                        }
                    }
                    CacheOp::Lookup { path } => {
                        let url = format!("{}{}", APP, path);
                        let request = Request::get(&url).unwrap();
                        let found = store.lookup(&request).await.unwrap();
                        assert_eq!(found.is_some(), cached.contains(&url));
                        match found {
                            Some(response) => {
                                hits += 1;
                                assert_eq!(response.body, path.as_bytes().to_vec());
                            }
                            None => misses += 1,
                        }
                    }
                }
            }
            store.stats().await.unwrap()
        });

        prop_assert_eq!(stats.hits, hits);
        prop_assert_eq!(stats.misses, misses);
        prop_assert_eq!(stats.stores, stores);
        prop_assert_eq!(stats.rejected, rejected);
        prop_assert_eq!(stats.total_entries, cached.len());
    }

    // Property: non-GET requests are never stored
    #[test]
    fn prop_non_get_never_cached(
        method in prop_oneof![Just("POST"), Just("PUT"), Just("DELETE"), Just("PATCH")],
        path in path_strategy(),
    ) {
        let store = store_with(Arc::new(MemoryCacheStorage::new()));
        let url = format!("{}{}", APP, path);
        let request = Request::new(method, &url).unwrap();
        let response = Response::ok(request.url.clone(), ResponseType::Basic, "body");

        prop_assert!(!store.is_cacheable(&request, &response));
        let total = runtime().block_on(async {
            store.store(&request, &response).await.unwrap();
            store.stats().await.unwrap().total_entries
        });
        prop_assert_eq!(total, 0);
    }
}
