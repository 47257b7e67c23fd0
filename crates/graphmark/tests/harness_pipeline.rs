//! End-to-end harness runs against in-memory runners

use graphmark::datasets::ScaleConfig;
use graphmark::queries::Category;
use graphmark::{Backend, BenchmarkHarness, GraphmarkError, MeasurementSettings};
use graphmark_test_harness::{
    batch_size, fast_settings, tiny_scale, Call, CallLog, FailingRunner, FixedProbe, MockRunner,
};
use std::sync::atomic::Ordering;
use std::time::Duration;

fn harness(settings: MeasurementSettings) -> BenchmarkHarness {
    BenchmarkHarness::new(tiny_scale(), batch_size(10), settings).unwrap()
}

fn mock(name: &str, log: &CallLog) -> Backend {
    Backend::new(Box::new(MockRunner::new(name, log)))
}

#[tokio::test]
async fn test_warmup_is_discarded_and_measured_samples_kept() {
    let log = CallLog::new();
    let harness = harness(fast_settings(10, 100));
    let result = harness.run(vec![mock("mock", &log)]).await;

    assert!(result.failures.is_empty());
    let db = result.database("mock").unwrap();
    assert_eq!(db.version, "mock-1.0");
    assert_eq!(db.queries.len(), harness.catalog().len());
    for q in &db.queries {
        let timing = q.timing.as_ref().unwrap();
        assert_eq!(timing.samples, 100, "{}", q.name);
        assert_eq!(q.errors, 0);
        assert!(timing.min_ms <= timing.p50_ms && timing.p50_ms <= timing.max_ms);
    }

    // Cold start + 10 warmup + 100 measured
    let template = harness.catalog().get("user_by_id").unwrap().template;
    assert_eq!(log.executions(template).len(), 111);
}

#[tokio::test]
async fn test_load_phase_batches_every_record() {
    let log = CallLog::new();
    let result = harness(fast_settings(0, 1)).run(vec![mock("mock", &log)]).await;
    let load = result.database("mock").unwrap().load;

    assert_eq!(load.nodes, 60);
    assert_eq!(load.edges, 70);
    // 2 + 1 + 3 node batches, 3 + 3 + 2 edge batches
    assert_eq!(load.batches, 14);
    assert_eq!(result.total_nodes, 60);
    assert_eq!(result.total_edges, 70);

    let load_calls = log.executions("UNWIND $rows");
    assert_eq!(load_calls.len(), 14);
    let rows: usize = load_calls
        .iter()
        .map(|p| match p.get("rows") {
            Some(graphmark::ParamValue::Rows(rows)) => rows.len(),
            other => panic!("unexpected rows param {:?}", other),
        })
        .sum();
    assert_eq!(rows, 130);
}

#[tokio::test]
async fn test_lifecycle_order() {
    let log = CallLog::new();
    harness(fast_settings(0, 1)).run(vec![mock("mock", &log)]).await;
    let calls = log.calls();

    assert_eq!(calls.first(), Some(&Call::Connect));
    assert_eq!(calls.last(), Some(&Call::Disconnect));
    assert_eq!(log.count(&Call::Version), 1);
    // Reconnect for the cold start
    assert_eq!(log.count(&Call::Connect), 2);
    // Before load and at teardown
    assert_eq!(log.count(&Call::Clear), 2);
}

#[tokio::test]
async fn test_failing_clear_does_not_stop_next_backend() {
    let log_a = CallLog::new();
    let log_b = CallLog::new();
    let failing = FailingRunner::new("a", &log_a);
    failing.clear_fail_at.store(1, Ordering::SeqCst);

    let result = harness(fast_settings(1, 3))
        .run(vec![Backend::new(Box::new(failing)), mock("b", &log_b)])
        .await;

    assert!(result.failures.is_empty());
    assert_eq!(result.databases.len(), 2);
    assert_eq!(result.databases[0].database, "a");
    assert_eq!(result.databases[1].database, "b");
    assert_eq!(log_a.count(&Call::Clear), 0);
    assert_eq!(log_b.count(&Call::Clear), 2);
}

#[tokio::test]
async fn test_connection_failure_is_recorded_and_run_continues() {
    let log_a = CallLog::new();
    let log_b = CallLog::new();
    let failing = FailingRunner::new("a", &log_a);
    failing.connect_fail_at.store(1, Ordering::SeqCst);

    let result = harness(fast_settings(0, 2))
        .run(vec![Backend::new(Box::new(failing)), mock("b", &log_b)])
        .await;

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].database, "a");
    assert!(result.failures[0].error.contains("Injected connect failure"));
    assert!(result.database("a").is_none());
    assert!(result.database("b").is_some());
    assert!(log_a.calls().is_empty());
}

#[tokio::test]
async fn test_failed_reconnect_fails_backend_and_tears_down() {
    let log = CallLog::new();
    let failing = FailingRunner::new("a", &log);
    failing.connect_fail_at.store(2, Ordering::SeqCst);

    let result = harness(fast_settings(0, 2))
        .run(vec![Backend::new(Box::new(failing))])
        .await;

    assert_eq!(result.failures.len(), 1);
    assert!(result.databases.is_empty());
    assert_eq!(log.calls().last(), Some(&Call::Disconnect));
}

#[tokio::test]
async fn test_load_failure_fails_only_that_backend() {
    let log_a = CallLog::new();
    let log_b = CallLog::new();
    let failing = FailingRunner::new("a", &log_a).fail_every_nth("UNWIND $rows", 3);

    let result = harness(fast_settings(0, 2))
        .run(vec![Backend::new(Box::new(failing)), mock("b", &log_b)])
        .await;

    assert_eq!(result.failures.len(), 1);
    // Third batch is the first item batch
    assert!(result.failures[0].error.contains("loading items after 0 records"));
    assert_eq!(result.databases.len(), 1);
}

#[tokio::test]
async fn test_partial_execution_failures_are_excluded() {
    let log = CallLog::new();
    let failing = FailingRunner::new("a", &log).fail_every_nth("count(u) AS total", 4);

    let result = harness(fast_settings(0, 8))
        .run(vec![Backend::new(Box::new(failing))])
        .await;

    let q = result.database("a").unwrap().query("count_users").unwrap();
    assert_eq!(q.errors, 2);
    assert_eq!(q.timing.as_ref().unwrap().samples, 6);
    assert!(q.last_error.as_deref().unwrap().contains("Injected"));
}

#[tokio::test]
async fn test_all_iterations_failing_leaves_no_timing() {
    let log = CallLog::new();
    let failing = FailingRunner::new("a", &log).fail_every_nth("avg(i.price)", 1);

    let result = harness(fast_settings(2, 5))
        .run(vec![Backend::new(Box::new(failing))])
        .await;

    let q = result
        .database("a")
        .unwrap()
        .query("avg_price_in_category")
        .unwrap();
    assert!(q.timing.is_none());
    assert_eq!(q.errors, 5);
}

#[tokio::test]
async fn test_categories_run_in_order_and_writes_can_be_skipped() {
    let log = CallLog::new();
    let settings = MeasurementSettings {
        include_writes: false,
        ..fast_settings(0, 1)
    };
    let result = harness(settings).run(vec![mock("mock", &log)]).await;
    let categories: Vec<Category> = result.databases[0]
        .queries
        .iter()
        .map(|q| q.category)
        .collect();

    assert!(!categories.contains(&Category::Write));
    assert!(categories.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(categories.first(), Some(&Category::Lookup));
    assert_eq!(categories.last(), Some(&Category::Traversal));
}

#[tokio::test]
async fn test_backends_see_identical_workloads() {
    let log_a = CallLog::new();
    let log_b = CallLog::new();
    harness(fast_settings(2, 5))
        .run(vec![mock("a", &log_a), mock("b", &log_b)])
        .await;

    assert_eq!(log_a.executions(""), log_b.executions(""));
}

#[tokio::test]
async fn test_probe_snapshots_bracket_measurement() {
    let log = CallLog::new();
    let probe = FixedProbe::new(4096, 100);
    let snapshots = probe.snapshots.clone();
    let backends = vec![
        mock("probed", &log).with_probe(Box::new(probe)),
        mock("plain", &log),
    ];

    let result = harness(fast_settings(0, 1)).run(backends).await;

    let probed = result.database("probed").unwrap();
    assert_eq!(probed.resources_before.unwrap().disk_bytes, 100);
    assert_eq!(probed.resources_after.unwrap().disk_bytes, 200);
    assert_eq!(probed.resources_after.unwrap().ram_bytes, 4096);
    assert_eq!(snapshots.load(Ordering::SeqCst), 2);

    let plain = result.database("plain").unwrap();
    assert!(plain.resources_before.is_none());
    assert!(plain.cold_start_ms.is_some());
}

#[tokio::test]
async fn test_query_timeout_counts_as_execution_error() {
    let log = CallLog::new();
    let runner = MockRunner::new("slow", &log).with_latency(Duration::from_millis(50));
    let settings = MeasurementSettings {
        query_timeout: Some(Duration::from_millis(5)),
        include_writes: false,
        ..fast_settings(0, 2)
    };

    let result = harness(settings)
        .run(vec![Backend::new(Box::new(runner))])
        .await;

    // The deadline only applies to catalog queries, not to loading
    let db = result.database("slow").unwrap();
    for q in &db.queries {
        assert!(q.timing.is_none(), "{}", q.name);
        assert_eq!(q.errors, 2);
        assert!(q.last_error.as_deref().unwrap().contains("timed out"));
    }
}

#[test]
fn test_invalid_scale_is_rejected_before_any_backend_work() {
    let bad = ScaleConfig {
        items: 1,
        ..tiny_scale()
    };
    let err = BenchmarkHarness::new(bad, batch_size(10), fast_settings(0, 1)).unwrap_err();
    assert!(matches!(err, GraphmarkError::Generation { .. }));

    let no_users = ScaleConfig {
        users: 0,
        ..tiny_scale()
    };
    let err = BenchmarkHarness::new(no_users, batch_size(10), fast_settings(0, 1)).unwrap_err();
    assert!(matches!(err, GraphmarkError::Generation { .. }));
}
