// tests/practice_tests.rs

mod common;

use std::time::Duration;

use common::{PRACTICE_SETUP, create_practice_db, remove_practice_db};
use sqlgrade::{
    EvaluationRequest, Evaluator,
    engine::{EngineError, Fingerprint, PracticeDatabase, fingerprint},
};

async fn open(timeout: Duration) -> (PracticeDatabase, std::path::PathBuf) {
    let path = create_practice_db(PRACTICE_SETUP).await;
    let practice = PracticeDatabase::open(&path, timeout)
        .await
        .expect("Failed to open practice database");
    (practice, path)
}

#[tokio::test]
async fn hash_only_ignores_order_and_aliases() {
    let (practice, path) = open(Duration::from_secs(2)).await;

    let plain = practice.hash_only("SELECT id, name FROM employees").await.unwrap();
    let aliased = practice
        .hash_only("SELECT name AS n, id AS i FROM employees ORDER BY id DESC")
        .await
        .unwrap();
    let filtered = practice
        .hash_only("SELECT id, name FROM employees WHERE id < 3")
        .await
        .unwrap();

    assert_eq!(plain, aliased);
    assert_ne!(plain, filtered);

    remove_practice_db(&path);
}

#[tokio::test]
async fn hash_only_of_empty_result_is_reserved_digest() {
    let (practice, path) = open(Duration::from_secs(2)).await;

    let empty = practice
        .hash_only("SELECT * FROM employees WHERE salary > 1000")
        .await
        .unwrap();

    assert_eq!(empty, Fingerprint::empty());

    remove_practice_db(&path);
}

#[tokio::test]
async fn stored_fingerprint_matches_later_runs() {
    let (practice, path) = open(Duration::from_secs(2)).await;

    let stored = practice
        .hash_only("SELECT title FROM departments")
        .await
        .unwrap();

    assert!(practice.matches("SELECT title AS t FROM departments", &stored).await.unwrap());
    assert!(!practice.matches("SELECT title FROM departments LIMIT 1", &stored).await.unwrap());

    remove_practice_db(&path);
}

#[tokio::test]
async fn practice_and_ephemeral_fingerprints_agree() {
    let (practice, path) = open(Duration::from_secs(2)).await;
    let query = "SELECT name, salary FROM employees";

    let verdict = Evaluator::default()
        .evaluate(&EvaluationRequest::new(PRACTICE_SETUP, query, query))
        .await
        .unwrap();
    let from_verdict = fingerprint(verdict.reference_rows().unwrap());

    assert_eq!(practice.hash_only(query).await.unwrap(), from_verdict);

    remove_practice_db(&path);
}

#[tokio::test]
async fn practice_database_is_never_written() {
    let (practice, path) = open(Duration::from_secs(2)).await;

    let result = practice.hash_only("DELETE FROM employees").await;
    assert!(matches!(result, Err(EngineError::Query(_))), "got {:?}", result);

    let remaining = practice.hash_only("SELECT count(*) FROM employees").await.unwrap();
    let three = practice.hash_only("SELECT 3").await.unwrap();
    assert_eq!(remaining, three);

    remove_practice_db(&path);
}

#[tokio::test]
async fn failing_query_reports_engine_text() {
    let (practice, path) = open(Duration::from_secs(2)).await;

    match practice.hash_only("SELECT * FROM nowhere").await {
        Err(EngineError::Query(detail)) => assert!(detail.contains("nowhere")),
        other => panic!("expected query error, got {:?}", other),
    }

    remove_practice_db(&path);
}

#[tokio::test]
async fn hash_only_runs_on_a_spawned_task() {
    let (practice, path) = open(Duration::from_secs(2)).await;

    let spawned = practice.clone();
    let digest = tokio::spawn(async move { spawned.hash_only("SELECT name FROM employees").await })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(digest, practice.hash_only("SELECT name FROM employees").await.unwrap());

    remove_practice_db(&path);
}

#[tokio::test]
async fn hash_only_rejects_several_statements() {
    let (practice, path) = open(Duration::from_secs(2)).await;

    match practice.hash_only("SELECT 1; SELECT 2").await {
        Err(EngineError::Query(detail)) => assert!(detail.contains("one statement")),
        other => panic!("expected query error, got {:?}", other),
    }
    assert!(practice.hash_only("SELECT 1").await.is_ok());

    remove_practice_db(&path);
}

#[tokio::test]
async fn hash_only_stops_at_the_row_limit() {
    let (practice, path) = open(Duration::from_secs(2)).await;
    let practice = practice.with_max_rows(1);

    let result = practice.hash_only("SELECT id FROM employees").await;
    assert!(matches!(result, Err(EngineError::Query(_))), "got {:?}", result);

    remove_practice_db(&path);
}

#[tokio::test]
async fn runaway_query_times_out() {
    let (practice, path) = open(Duration::from_millis(200)).await;

    let result = practice
        .hash_only("WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT count(*) FROM c")
        .await;
    assert!(matches!(result, Err(EngineError::Timeout(_))), "got {:?}", result);

    // The pooled connection is usable again afterwards.
    assert!(practice.hash_only("SELECT 1").await.is_ok());

    remove_practice_db(&path);
}

#[tokio::test]
async fn schema_lists_create_statements() {
    let (practice, path) = open(Duration::from_secs(2)).await;

    let schema = practice.schema().await.unwrap();

    assert!(schema.contains("CREATE TABLE departments"));
    assert!(schema.contains("CREATE TABLE employees"));
    assert!(schema.find("departments").unwrap() < schema.find("employees").unwrap());

    remove_practice_db(&path);
}

#[tokio::test]
async fn schema_of_empty_database_is_an_error() {
    let path = create_practice_db("CREATE TABLE scratch(a INT); DROP TABLE scratch;").await;
    let practice = PracticeDatabase::open(&path, Duration::from_secs(2)).await.unwrap();

    assert!(matches!(practice.schema().await, Err(EngineError::Query(_))));

    remove_practice_db(&path);
}

#[tokio::test]
async fn missing_file_is_not_created() {
    let path = std::env::temp_dir().join(format!("missing_{}.db", uuid::Uuid::new_v4()));

    let result = PracticeDatabase::open(&path, Duration::from_secs(2)).await;

    assert!(result.is_err());
    assert!(!path.exists());
}
