//! Persist a run, read it back and compare it

use graphmark::analysis::{compare_databases, compare_files, ChangeClass, Recommendation};
use graphmark::{Backend, BenchmarkHarness, BenchmarkResult, GraphmarkError};
use graphmark_test_harness::{batch_size, fast_settings, tiny_scale, CallLog, MockRunner};
use std::time::Duration;

async fn run_with(backends: Vec<Backend>) -> BenchmarkResult {
    BenchmarkHarness::new(tiny_scale(), batch_size(16), fast_settings(1, 5))
        .unwrap()
        .run(backends)
        .await
}

#[tokio::test]
async fn test_saved_run_compares_against_itself() {
    let log = CallLog::new();
    let result = run_with(vec![Backend::new(Box::new(MockRunner::new("mock", &log)))]).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.json");
    result.save_to(&path).unwrap();
    assert_eq!(BenchmarkResult::load_from(&path).unwrap(), result);

    let comparison = compare_files(&path, &path, "mock").unwrap();
    assert_eq!(comparison.queries.len(), result.databases[0].queries.len());
    assert!(comparison.queries.iter().all(|q| q.class == ChangeClass::Unchanged));
    assert_eq!(comparison.skipped, 0);
    assert_eq!(comparison.recommendation, Recommendation::DiminishingReturns);

    let err = compare_files(&path, &path, "neo4j").unwrap_err();
    assert!(matches!(err, GraphmarkError::Analysis { .. }));
}

#[tokio::test]
async fn test_missing_snapshot_is_analysis_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = compare_files(
        dir.path().join("nope.json"),
        dir.path().join("nope.json"),
        "mock",
    )
    .unwrap_err();
    assert!(matches!(err, GraphmarkError::Analysis { .. }));
}

#[tokio::test]
async fn test_slow_backend_regresses_against_fast_one() {
    let log = CallLog::new();
    let fast = MockRunner::new("fast", &log);
    let slow = MockRunner::new("slow", &log).with_latency(Duration::from_millis(2));
    let result = run_with(vec![
        Backend::new(Box::new(fast)),
        Backend::new(Box::new(slow)),
    ])
    .await;

    let comparison = compare_databases(
        result.database("fast").unwrap(),
        result.database("slow").unwrap(),
    )
    .unwrap();

    assert_eq!(comparison.baseline, "fast");
    assert_eq!(comparison.target, "slow");
    assert_eq!(comparison.regressed, comparison.queries.len());
    assert_eq!(comparison.recommendation, Recommendation::RegressionWarning);
}
