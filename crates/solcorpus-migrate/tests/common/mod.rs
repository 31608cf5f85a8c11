//! SQLite catalog fixtures shared by the integration tests.

#![allow(dead_code)]

use solcorpus_migrate::SqliteCatalog;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use tempfile::TempDir;

const SCHEMA: &str = r#"
CREATE TABLE repo (id INTEGER PRIMARY KEY, full_name TEXT NOT NULL, description TEXT, url TEXT, owner_id INTEGER);
CREATE TABLE file (id INTEGER PRIMARY KEY, name TEXT, path TEXT, sha TEXT, repo_id INTEGER);
CREATE TABLE comit (sha TEXT, message TEXT, size INTEGER, created TEXT, content TEXT, parents TEXT, file_id INTEGER);
"#;

/// A crawler database in a temporary directory.
pub struct CatalogFixture {
    dir: TempDir,
    pool: SqlitePool,
}

impl CatalogFixture {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("catalog.db"))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::raw_sql(SCHEMA).execute(&pool).await.unwrap();
        Self { dir, pool }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("catalog.db")
    }

    pub async fn repo(&self, id: i64, full_name: &str) -> &Self {
        sqlx::query("INSERT INTO repo VALUES (?, ?, ?, ?, ?)")
            .bind(id)
            .bind(full_name)
            .bind(format!("{full_name} contracts"))
            .bind(format!("https://github.com/{full_name}"))
            .bind(100 + id)
            .execute(&self.pool)
            .await
            .unwrap();
        self
    }

    pub async fn file(&self, id: i64, repo_id: i64, path: &str, sha: &str) -> &Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        sqlx::query("INSERT INTO file VALUES (?, ?, ?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(path)
            .bind(sha)
            .bind(repo_id)
            .execute(&self.pool)
            .await
            .unwrap();
        self
    }

    pub async fn version(&self, file_id: i64, sha: &str, created: &str, content: &str) -> &Self {
        sqlx::query("INSERT INTO comit VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(sha)
            .bind(format!("commit {sha}"))
            .bind(content.len() as i64)
            .bind(created)
            .bind(content)
            .bind("")
            .bind(file_id)
            .execute(&self.pool)
            .await
            .unwrap();
        self
    }

    pub async fn open(&self) -> SqliteCatalog {
        SqliteCatalog::open(&self.path()).await.unwrap()
    }
}
