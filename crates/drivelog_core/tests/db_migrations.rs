use drivelog_core::db::migrations::latest_version;
use drivelog_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_object_exists(&conn, "table", "journal_entries");
    assert_object_exists(&conn, "index", "idx_journal_entries_visited_at");
    assert_object_exists(&conn, "index", "idx_journal_entries_unsynced");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drivelog.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_object_exists(&conn_second, "table", "journal_entries");
}

#[test]
fn upgrading_from_first_version_applies_remaining_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE journal_entries (
            id TEXT PRIMARY KEY NOT NULL,
            visited_at INTEGER NOT NULL,
            address_country TEXT NOT NULL,
            address_prefecture TEXT NOT NULL,
            address_city TEXT NOT NULL,
            address_detail TEXT,
            place_name TEXT NOT NULL,
            rating INTEGER NOT NULL,
            location_lat REAL,
            location_lng REAL,
            notes TEXT,
            synced_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_object_exists(&conn, "index", "idx_journal_entries_unsynced");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn storage_rejects_half_set_location() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO journal_entries (
            id, visited_at, address_country, address_prefecture, address_city,
            place_name, rating, location_lat, created_at, updated_at
        ) VALUES ('x', 0, 'Japan', 'Tokyo', 'Shibuya', 'a', 3, 35.0, 0, 0);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}

#[test]
fn open_db_creates_missing_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app_data").join("journal").join("drivelog.db");

    let conn = open_db(&path).unwrap();
    assert!(path.exists());
    assert_eq!(schema_version(&conn), latest_version());
}
