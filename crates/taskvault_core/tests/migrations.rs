use taskvault_core::db::{migrations, DbError};
use taskvault_core::{RepoError, SqliteQuerier, UserCreationInput, UserStore};

fn registration_input(username: &str) -> UserCreationInput {
    UserCreationInput {
        username: username.to_string(),
        hashed_password: "hashed".to_string(),
        two_factor_secret: "secret".to_string(),
    }
}

#[test]
fn opening_applies_every_migration() {
    let q = SqliteQuerier::open_in_memory().unwrap();

    let version: u32 = q
        .connection()
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, migrations::latest_version());
}

#[test]
fn reopening_a_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskvault.db");

    {
        let q = SqliteQuerier::open(&path).unwrap();
        q.create_user(&registration_input("alice")).unwrap();
    }

    // Second open re-runs the migration check against the persisted
    // version; existing data must survive untouched.
    let q = SqliteQuerier::open(&path).unwrap();
    assert!(q.get_user_by_username("alice").unwrap().is_some());

    let version: u32 = q
        .connection()
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, migrations::latest_version());
}

#[test]
fn migrate_is_a_no_op_once_current() {
    let mut q = SqliteQuerier::open_in_memory().unwrap();

    q.migrate(3).unwrap();
    q.migrate(3).unwrap();

    assert!(q.is_ready(1));
}

#[test]
fn databases_from_newer_binaries_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskvault.db");

    {
        SqliteQuerier::open(&path).unwrap();
    }
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
    }

    let err = SqliteQuerier::open(&path).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Db(DbError::UnsupportedSchemaVersion {
            db_version: 99,
            ..
        })
    ));
}
