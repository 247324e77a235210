use ilm_core::db::migrations::{drop_tables, latest_version, recreate_tables};
use ilm_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "ilms");
    assert_table_exists(&conn, "reviews");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ilm.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "ilms");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
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
fn drop_and_recreate_restore_a_usable_schema() {
    let mut conn = open_db_in_memory().unwrap();

    drop_tables(&conn).unwrap();
    assert_eq!(schema_version(&conn), 0);
    assert!(!table_exists(&conn, "ilms"));

    recreate_tables(&mut conn).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "ilms");
    assert_table_exists(&conn, "reviews");
}

#[test]
fn deleting_an_ilm_cascades_to_its_reviews() {
    let conn = open_db_in_memory().unwrap();

    conn.execute(
        "INSERT INTO ilms (ilm_id, path, created_date, review_date, score, multiplier)
         VALUES ('aa11bb22', '/notes/a.md', '2024-03-01T08:00:00', '2024-03-03', 1.0, 2.0);",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO reviews (ilm_ref, update_date, review_date, reviewed, score, multiplier, next_review_date)
         SELECT id, '2024-03-03T20:00:00', '2024-03-03', 1, 2.0, 2.0, '2024-03-05'
         FROM ilms WHERE ilm_id = 'aa11bb22';",
        [],
    )
    .unwrap();

    conn.execute("DELETE FROM ilms WHERE ilm_id = 'aa11bb22';", [])
        .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM reviews;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn table_exists(conn: &Connection, table_name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert!(
        table_exists(conn, table_name),
        "table {table_name} does not exist"
    );
}
