/// Database migration management
///
/// This module creates and upgrades the SQLite schema, tracking the applied
/// version in a `schema_version` table.

use rusqlite::Connection;
use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// This creates all required tables and indexes if they don't exist.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

/// Get the current database schema version (0 for a fresh database)
fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get::<_, i32>(0)
    });

    match version {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(StorageError::Query(e)),
    }
}

/// Set the database schema version
fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Run database migrations from the current version to the latest
fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration to version 1: the habits table and its indexes
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    // related_id has no ON DELETE action: a referenced habit can't be removed
    conn.execute(
        "CREATE TABLE IF NOT EXISTS habits (
            id TEXT PRIMARY KEY,
            owner_id INTEGER NOT NULL,
            place TEXT NOT NULL,
            time TEXT NOT NULL,
            action TEXT NOT NULL,
            is_nice BOOLEAN NOT NULL DEFAULT FALSE,
            related_id TEXT REFERENCES habits (id),
            prize TEXT,
            periodicity INTEGER NOT NULL,
            duration INTEGER NOT NULL,
            is_public BOOLEAN NOT NULL DEFAULT TRUE,
            sunday BOOLEAN NOT NULL DEFAULT TRUE,
            monday BOOLEAN NOT NULL DEFAULT TRUE,
            tuesday BOOLEAN NOT NULL DEFAULT TRUE,
            wednesday BOOLEAN NOT NULL DEFAULT TRUE,
            thursday BOOLEAN NOT NULL DEFAULT TRUE,
            friday BOOLEAN NOT NULL DEFAULT TRUE,
            saturday BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: Created habits schema");
    Ok(())
}

/// Create database indexes for version 1
fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    // Owner listing, ordered by creation
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habits_owner_created
         ON habits (owner_id, created_at)",
        [],
    )?;

    // Public listing
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habits_public
         ON habits (is_public)",
        [],
    )?;

    // Reverse lookup of related habits
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habits_related
         ON habits (related_id)",
        [],
    )?;

    tracing::info!("Created database indexes for v1");
    Ok(())
}
