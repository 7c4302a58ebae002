//! Database schema migrations
//!
//! Versioned, idempotent schema upgrades for databases created by older
//! builds. `CREATE TABLE IF NOT EXISTS` in [`crate::db::init`] always
//! produces the current schema, so each migration first checks whether its
//! change is already present.
//!
//! Never modify an existing migration; add a new one and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

/// Set schema version in database
async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Migration v1: Add closed_at column to modifications
///
/// Early databases recorded only the terminal status. `closed_at` doubles as
/// the close-exactly-once claim taken by the resolver.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: Add closed_at column to modifications");

    if !table_exists(pool, "modifications").await? {
        info!("  modifications table doesn't exist yet - skipping migration");
        return Ok(());
    }

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('modifications') WHERE name = 'closed_at'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  closed_at column already exists - skipping");
        return Ok(());
    }

    match sqlx::query("ALTER TABLE modifications ADD COLUMN closed_at INTEGER")
        .execute(pool)
        .await
    {
        Ok(_) => {
            info!("  ✓ Added closed_at column to modifications table");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            info!("  closed_at column added by concurrent initializer - skipping");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Migration v2: One vote per moderator per modification
///
/// Drops duplicate vote rows (keeping the earliest) and adds a unique index.
/// Tallies are left as recorded; already-closed outcomes are history.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: Enforce unique votes");

    if !table_exists(pool, "votes").await? {
        info!("  votes table doesn't exist yet - skipping migration");
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    let removed = sqlx::query(
        r#"
        DELETE FROM votes
        WHERE id NOT IN (
            SELECT MIN(id) FROM votes GROUP BY moderator_id, modification_id
        )
        "#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if removed > 0 {
        warn!("  Removed {} duplicate vote rows", removed);
    }

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_moderator_modification ON votes(moderator_id, modification_id)",
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("  ✓ Unique vote index in place");
    Ok(())
}
