//! Database fixtures for handler tests.
//!
//! Each `TestDb` lives in its own throwaway schema on the server named by
//! `ESCOLAR_TEST_DSN`, so tests can run in parallel against one database.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, Executor, PgPool, Row};
use ulid::Ulid;

const ESCOLAR_SCHEMA_SQL: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

pub(crate) struct TestDb {
    pub pool: PgPool,
    schema: String,
}

impl TestDb {
    /// Creates a fresh schema, applies `sql/schema.sql` to it and returns a pool pinned to it.
    /// Returns an error when `ESCOLAR_TEST_DSN` is unset so callers can skip the test cleanly.
    pub async fn new() -> Result<Self> {
        let dsn = match std::env::var("ESCOLAR_TEST_DSN") {
            Ok(dsn) => dsn,
            Err(err) => {
                eprintln!("Skipping integration test: ESCOLAR_TEST_DSN {err}");
                return Err(err.into());
            }
        };

        let schema = format!("escolar_test_{}", Ulid::new().to_string().to_lowercase());
        let search_path = schema.clone();
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let statement = format!("SET search_path TO {search_path}");
                Box::pin(async move {
                    conn.execute(statement.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&dsn)
            .await
            .context("failed to connect test pool")?;

        pool.execute(format!("CREATE SCHEMA {schema}").as_str())
            .await
            .context("failed to create test schema")?;

        for (index, statement) in split_sql_statements(ESCOLAR_SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
        }

        Ok(Self { pool, schema })
    }

    pub async fn teardown(self) -> Result<()> {
        self.pool
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await
            .context("failed to drop test schema")?;
        self.pool.close().await;
        Ok(())
    }
}

/// Splits the schema file on trailing `;`, dropping comment-only chunks.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

pub(crate) async fn insert_gender(pool: &PgPool, name: &str) -> Result<i64> {
    let row = sqlx::query("INSERT INTO genders (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .context("insert gender")?;
    Ok(row.get("id"))
}

pub(crate) async fn insert_role(pool: &PgPool, name: &str, for_students: bool) -> Result<i64> {
    let row = sqlx::query("INSERT INTO roles (name, for_students) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(for_students)
        .fetch_one(pool)
        .await
        .context("insert role")?;
    Ok(row.get("id"))
}

pub(crate) async fn insert_category(pool: &PgPool, title: &str) -> Result<i64> {
    let row = sqlx::query("INSERT INTO permission_categories (title) VALUES ($1) RETURNING id")
        .bind(title)
        .fetch_one(pool)
        .await
        .context("insert category")?;
    Ok(row.get("id"))
}

pub(crate) async fn insert_permission(pool: &PgPool, title: &str, category_id: i64) -> Result<i64> {
    let row = sqlx::query(
        "INSERT INTO permissions (title, category_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(title)
    .bind(category_id)
    .fetch_one(pool)
    .await
    .context("insert permission")?;
    Ok(row.get("id"))
}

#[cfg(test)]
mod tests {
    use super::split_sql_statements;

    #[test]
    fn split_sql_statements_skips_comments() {
        let sql = "-- header\nCREATE TABLE a (id INT);\n\nCREATE INDEX b ON a (id);\n";
        let statements = split_sql_statements(sql);
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE a (id INT);".to_string(),
                "CREATE INDEX b ON a (id);".to_string()
            ]
        );
    }

    #[test]
    fn bundled_schema_splits_into_statements() {
        let statements = split_sql_statements(super::ESCOLAR_SCHEMA_SQL);
        assert!(statements.iter().any(|s| s.starts_with("CREATE TABLE IF NOT EXISTS sessions")));
        assert!(statements.iter().all(|s| s.ends_with(';')));
    }
}
