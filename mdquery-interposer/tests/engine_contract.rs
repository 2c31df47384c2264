// Drives the registry the way a query engine would: notify on creation,
// resolve batching params before the query starts delivering results.

use mdquery_interposer::{
    BatchingParams, BatchingPatch, CreationObserver, HookRegistry, QueryHandle,
};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Stand-in for an engine-owned query object
struct Query {
    predicate: String,
}

/// Minimal engine: owns its defaults and calls both extension points
struct MockEngine<'r> {
    registry: &'r HookRegistry,
    defaults: BatchingParams,
}

impl<'r> MockEngine<'r> {
    fn new(registry: &'r HookRegistry) -> Self {
        Self {
            registry,
            defaults: BatchingParams::new()
                .with_first_batch(50, 200)
                .with_progress_batch(1000, 1000)
                .with_update_batch(100, 1000),
        }
    }

    fn create_query(&self, predicate: &str) -> Box<Query> {
        let query = Box::new(Query {
            predicate: predicate.to_string(),
        });
        self.registry.notify_query_created(QueryHandle::from_ref(&*query));
        query
    }

    fn batching_for(&self, query: &Query) -> BatchingParams {
        self.registry
            .resolve_batching_params(QueryHandle::from_ref(query), self.defaults)
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_no_hooks_is_pass_through() {
    init_logging();
    let registry = HookRegistry::new();
    let engine = MockEngine::new(&registry);

    let query = engine.create_query("kMDItemFSName == '*.rs'");
    assert_eq!(engine.batching_for(&query), engine.defaults);
    assert_eq!(query.predicate, "kMDItemFSName == '*.rs'");
}

#[test]
fn test_observer_logs_handles_in_creation_order() {
    init_logging();
    let registry = HookRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    registry
        .creation()
        .set(move |query: QueryHandle<'_>| sink.lock().unwrap().push(query.addr()));

    let engine = MockEngine::new(&registry);
    let queries = vec![
        engine.create_query("kMDItemContentType == 'public.image'"),
        engine.create_query("kMDItemContentType == 'public.movie'"),
        engine.create_query("kMDItemContentType == 'public.audio'"),
    ];

    let expected: Vec<usize> = queries
        .iter()
        .map(|query| QueryHandle::from_ref(&**query).addr())
        .collect();
    assert_eq!(*log.lock().unwrap(), expected);
}

#[test]
fn test_doubling_batch_size_scenario() {
    init_logging();
    let registry = HookRegistry::new();
    registry
        .batching()
        .set(|_: QueryHandle<'_>, mut params: BatchingParams| {
            params.first_max_num *= 2;
            params
        });

    let query = Query {
        predicate: String::from("*"),
    };
    let resolved = registry.resolve_batching_params(
        QueryHandle::from_ref(&query),
        BatchingParams::new().with_first_batch(50, 200),
    );
    assert_eq!(resolved, BatchingParams::new().with_first_batch(100, 200));
}

#[test]
fn test_patch_override_through_engine() {
    init_logging();
    let registry = HookRegistry::new();
    registry
        .batching()
        .set(BatchingPatch::new().with_progress_max_ms(10));
    let engine = MockEngine::new(&registry);

    let query = engine.create_query("*");
    let mut expected = engine.defaults;
    expected.progress_max_ms = 10;
    assert_eq!(engine.batching_for(&query), expected);
}

#[test]
fn test_unregister_restores_defaults() {
    init_logging();
    let registry = HookRegistry::new();
    let engine = MockEngine::new(&registry);
    registry.batching().set(BatchingPatch::new().with_first_max_num(1));
    let query = engine.create_query("*");
    assert_eq!(engine.batching_for(&query).first_max_num, 1);

    registry.batching().clear();
    registry.batching().clear();
    assert_eq!(engine.batching_for(&query), engine.defaults);
}

struct TaggedObserver {
    tag: usize,
    check: usize,
    seen: Arc<Mutex<Vec<usize>>>,
}

impl TaggedObserver {
    fn new(tag: usize, seen: &Arc<Mutex<Vec<usize>>>) -> Self {
        Self {
            tag,
            check: !tag,
            seen: Arc::clone(seen),
        }
    }
}

impl CreationObserver for TaggedObserver {
    fn query_created(&self, _query: QueryHandle<'_>) {
        assert_eq!(self.check, !self.tag, "observer state is torn");
        self.seen.lock().unwrap().push(self.tag);
    }
}

#[test]
fn test_concurrent_notifies_observe_same_observer() {
    init_logging();
    let registry = HookRegistry::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    registry
        .creation()
        .set(TaggedObserver::new(1, &seen));
    registry
        .creation()
        .set(TaggedObserver::new(2, &seen));

    let queries: Vec<u64> = (0..256).collect();
    queries
        .par_iter()
        .for_each(|query| registry.notify_query_created(QueryHandle::from_ref(query)));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), queries.len());
    assert!(seen.iter().all(|&tag| tag == 2));
}

#[test]
fn test_concurrent_notifies_all_unset() {
    init_logging();
    let registry = HookRegistry::new();
    let defaults = BatchingParams::new().with_first_batch(50, 200);

    let queries: Vec<u64> = (0..256).collect();
    let all_defaults = queries.par_iter().all(|query| {
        let handle = QueryHandle::from_ref(query);
        registry.notify_query_created(handle);
        registry.resolve_batching_params(handle, defaults) == defaults
    });
    assert!(all_defaults);
}

#[test]
fn test_registration_race_never_tears() {
    init_logging();
    let registry = HookRegistry::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let done = AtomicBool::new(false);
    let notifications = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            let mut tag = 0;
            while !done.load(Ordering::Acquire) {
                tag = (tag % 3) + 1;
                if tag == 3 {
                    registry.creation().clear();
                } else {
                    registry.creation().set(TaggedObserver::new(tag, &seen));
                }
            }
        });

        let queries: Vec<u64> = (0..2048).collect();
        queries.par_iter().for_each(|query| {
            registry.notify_query_created(QueryHandle::from_ref(query));
            notifications.fetch_add(1, Ordering::Relaxed);
        });
        done.store(true, Ordering::Release);
    });

    assert_eq!(notifications.load(Ordering::Relaxed), 2048);
    let seen = seen.lock().unwrap();
    assert!(seen.len() <= 2048);
    assert!(seen.iter().all(|&tag| tag == 1 || tag == 2));
}

#[test]
fn test_concurrent_resolves_get_independent_copies() {
    init_logging();
    let registry = HookRegistry::new();
    registry
        .batching()
        .set(|query: QueryHandle<'_>, mut params: BatchingParams| {
            params.update_max_num = (query.addr() % 1_000_000) as i64;
            params
        });

    let defaults = BatchingParams::new().with_update_batch(100, 1000);
    let queries: Vec<u64> = (0..512).collect();
    queries.par_iter().for_each(|query| {
        let handle = QueryHandle::from_ref(query);
        let resolved = registry.resolve_batching_params(handle, defaults);
        assert_eq!(resolved.update_max_num, (handle.addr() % 1_000_000) as i64);
        assert_eq!(resolved.update_max_ms, 1000);
    });
}

#[test]
fn test_concurrent_registrations_leave_newest_generation() {
    init_logging();
    let registry = HookRegistry::new();
    let registrars = 8;
    let per_registrar = 100;

    std::thread::scope(|scope| {
        for _ in 0..registrars {
            scope.spawn(|| {
                for _ in 0..per_registrar {
                    registry.creation().set(|_: QueryHandle<'_>| {});
                    registry
                        .batching()
                        .set(BatchingPatch::new().with_first_max_num(1));
                }
            });
        }
    });

    let total = (registrars * per_registrar) as u64;
    let status = registry.status();
    assert_eq!(status.creation_generation, Some(total));
    assert_eq!(status.batching_generation, Some(total));
}
