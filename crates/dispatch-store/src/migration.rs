//! Schema migration system.
//!
//! Migrations are static SQL strings keyed by version number. The current
//! version is tracked in a `_migrations` table so migrations are
//! idempotent and only run once.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{SqlError, SqlResult};

/// A single migration definition.
struct Migration {
    /// Monotonically increasing version number (1, 2, 3, ...).
    version: u32,
    description: &'static str,
    /// Raw SQL, possibly multiple statements separated by `;`.
    sql: &'static str,
}

/// All migrations in order. Add new migrations to the end of this array.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial schema — jobs, node_queues, node_task_status",
        sql: r#"
            CREATE TABLE jobs (
                id           TEXT PRIMARY KEY,
                window_start TEXT NOT NULL,
                window_end   TEXT NOT NULL,
                provider     TEXT NOT NULL,
                spec         TEXT NOT NULL,
                nodes        TEXT NOT NULL,
                created_at   INTEGER NOT NULL
            );

            CREATE TABLE node_queues (
                node_name    TEXT NOT NULL,
                job_id       TEXT NOT NULL REFERENCES jobs(id),
                window_start TEXT NOT NULL,
                window_end   TEXT NOT NULL,
                provider     TEXT NOT NULL,
                spec         TEXT NOT NULL,
                PRIMARY KEY (node_name, job_id)
            );

            CREATE TABLE node_task_status (
                node_name    TEXT NOT NULL,
                job_id       TEXT NOT NULL,
                status       TEXT NOT NULL CHECK(status IN ('pending','running','expired','failed','success')),
                last_updated TEXT NOT NULL,
                exit_code    INTEGER,
                reason       TEXT,
                PRIMARY KEY (node_name, job_id)
            );
            CREATE INDEX idx_node_task_status_job ON node_task_status(job_id);
        "#,
    },
];

/// Run every migration newer than the database's current version, in order.
pub fn run_all(conn: &Connection) -> SqlResult<()> {
    ensure_migrations_table(conn)?;

    let current = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    if pending.is_empty() {
        debug!(current_version = current, "database schema is up to date");
        return Ok(());
    }

    info!(
        current_version = current,
        pending = pending.len(),
        "running pending migrations"
    );

    for migration in pending {
        apply(conn, migration)?;
    }

    info!(
        new_version = MIGRATIONS.last().map(|m| m.version).unwrap_or(0),
        "all migrations applied"
    );
    Ok(())
}

/// Return the latest applied migration version, or 0 if none.
pub fn current_version(conn: &Connection) -> SqlResult<u32> {
    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| SqlError::Migration {
            version: 0,
            message: format!("failed to read current version: {e}"),
        })?;
    Ok(version)
}

// ── internals ────────────────────────────────────────────────────────

fn ensure_migrations_table(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  INTEGER NOT NULL
        );",
    )
    .map_err(|e| SqlError::Migration {
        version: 0,
        message: format!("failed to create _migrations table: {e}"),
    })?;
    Ok(())
}

/// Apply a single migration inside a transaction.
fn apply(conn: &Connection, migration: &Migration) -> SqlResult<()> {
    info!(
        version = migration.version,
        description = migration.description,
        "applying migration"
    );

    // `conn.transaction()` needs `&mut Connection`, so the transaction is
    // managed manually here.
    conn.execute_batch("BEGIN IMMEDIATE;")
        .map_err(|e| SqlError::Migration {
            version: migration.version,
            message: format!("failed to begin transaction: {e}"),
        })?;

    let result = (|| -> SqlResult<()> {
        conn.execute_batch(migration.sql)
            .map_err(|e| SqlError::Migration {
                version: migration.version,
                message: format!("SQL execution failed: {e}"),
            })?;

        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![migration.version, migration.description, now],
        )
        .map_err(|e| SqlError::Migration {
            version: migration.version,
            message: format!("failed to record migration: {e}"),
        })?;

        Ok(())
    })();

    match &result {
        Ok(()) => {
            conn.execute_batch("COMMIT;")
                .map_err(|e| SqlError::Migration {
                    version: migration.version,
                    message: format!("failed to commit: {e}"),
                })?;
            info!(version = migration.version, "migration applied successfully");
        }
        Err(err) => {
            warn!(version = migration.version, %err, "migration failed, rolling back");
            let _ = conn.execute_batch("ROLLBACK;");
        }
    }

    result
}

// ── tests ────────────────────────────────────────────────────────────
