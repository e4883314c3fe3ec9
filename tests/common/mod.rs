// tests/common/mod.rs

use std::path::{Path, PathBuf};

use sqlx::{ConnectOptions, Connection, sqlite::SqliteConnectOptions};

pub const PRACTICE_SETUP: &str = r#"
    CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT NOT NULL, salary INTEGER);
    CREATE TABLE departments (id INTEGER PRIMARY KEY, title TEXT NOT NULL);
    INSERT INTO employees VALUES (1, 'ann', 100), (2, 'bob', 200), (3, 'cy', 300);
    INSERT INTO departments VALUES (1, 'engineering'), (2, 'sales');
"#;

/// Writes a practice database file populated by `setup` into the temp dir.
/// Returns its path; callers remove it when done.
#[allow(dead_code)]
pub async fn create_practice_db(setup: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("practice_{}.db", uuid::Uuid::new_v4()));

    let mut conn = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .connect()
        .await
        .expect("Failed to create practice database");

    sqlx::raw_sql(setup)
        .execute(&mut conn)
        .await
        .expect("Failed to populate practice database");

    conn.close().await.expect("Failed to close practice database");

    path
}

#[allow(dead_code)]
pub fn remove_practice_db(path: &Path) {
    let _ = std::fs::remove_file(path);
}
