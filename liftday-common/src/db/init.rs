//! Database initialization
//!
//! Creates the SQLite database on first run and applies the schema.
//! All CREATE statements are idempotent, so init is safe to call on
//! every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pool(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

/// Open an in-memory database with the full schema (test support)
pub async fn init_memory_database() -> Result<SqlitePool> {
    // A single connection keeps every query on the same in-memory db
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    configure_pool(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

async fn configure_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers while a vote or draw is committing
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Apply the full schema (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_competitions_table(pool).await?;
    create_athletes_table(pool).await?;
    create_competition_roles_table(pool).await?;
    create_draw_entries_table(pool).await?;
    create_attempts_table(pool).await?;
    create_votes_table(pool).await?;
    Ok(())
}

async fn create_competitions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS competitions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            location TEXT NOT NULL,
            date TEXT NOT NULL,
            draw_completed INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (draw_completed IN (0, 1))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Verified athlete entries. Written by the external application
/// workflow; this service only reads them.
async fn create_athletes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS athletes (
            id TEXT PRIMARY KEY,
            competition_id TEXT NOT NULL REFERENCES competitions(id) ON DELETE CASCADE,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            gender TEXT NOT NULL CHECK (gender IN ('male', 'female')),
            weight_category TEXT NOT NULL,
            entry_total INTEGER NOT NULL,
            verified INTEGER NOT NULL DEFAULT 0,
            CHECK (entry_total >= 0),
            CHECK (verified IN (0, 1))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_athletes_competition ON athletes(competition_id, verified)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_competition_roles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS competition_roles (
            id TEXT PRIMARY KEY,
            competition_id TEXT NOT NULL REFERENCES competitions(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('secretary', 'judge', 'jury')),
            UNIQUE (competition_id, user_id, role)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_roles_lookup ON competition_roles(competition_id, user_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_draw_entries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS draw_entries (
            id TEXT PRIMARY KEY,
            competition_id TEXT NOT NULL REFERENCES competitions(id) ON DELETE CASCADE,
            athlete_id TEXT NOT NULL REFERENCES athletes(id),
            gender TEXT NOT NULL CHECK (gender IN ('male', 'female')),
            weight_category TEXT NOT NULL,
            group_letter TEXT NOT NULL,
            lot_number INTEGER NOT NULL,
            entry_total INTEGER NOT NULL,
            UNIQUE (competition_id, athlete_id),
            CHECK (lot_number >= 1)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_draw_competition ON draw_entries(competition_id, gender, weight_category, group_letter, lot_number)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attempts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attempts (
            id TEXT PRIMARY KEY,
            competition_id TEXT NOT NULL REFERENCES competitions(id) ON DELETE CASCADE,
            draw_entry_id TEXT NOT NULL REFERENCES draw_entries(id),
            discipline TEXT NOT NULL CHECK (discipline IN ('snatch', 'clean_and_jerk')),
            weight INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'closed')),
            verdict TEXT CHECK (verdict IS NULL OR verdict IN ('passed', 'failed')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (weight > 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One athlete lifts at a time: at most one open attempt per
    // competition, enforced atomically by the insert itself
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_attempts_single_open ON attempts(competition_id) WHERE status = 'open'",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_attempts_competition ON attempts(competition_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            id TEXT PRIMARY KEY,
            attempt_id TEXT NOT NULL REFERENCES attempts(id) ON DELETE CASCADE,
            judge_id TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('judge', 'jury')),
            call INTEGER NOT NULL CHECK (call IN (0, 1)),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (attempt_id, judge_id, role)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_votes_attempt ON votes(attempt_id, role)")
        .execute(pool)
        .await?;

    Ok(())
}
