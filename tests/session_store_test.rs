use bookmark_store::models::{Key, NewUser, Session, SessionUpdate};

#[macro_use]
mod common;

use common::{TestDatabase, TestDatabaseType};

async fn create_user(db: &TestDatabase, id: &str) -> String {
    db.session_store()
        .set_user(
            &NewUser {
                id: Some(id.to_string()),
            },
            None,
        )
        .await
        .unwrap()
}

fn session(id: &str, user_id: &str, active_expires: i64, idle_expires: i64) -> Session {
    Session {
        id: id.to_string(),
        user_id: user_id.to_string(),
        active_expires,
        idle_expires,
    }
}

async fn tables_test(db: &TestDatabase) {
    let tables = db.session_store().tables();
    assert_eq!(tables.user, "users");
    assert_eq!(tables.session, "sessions");
    assert_eq!(tables.key, "keys");
}

async fn user_with_key_test(db: &TestDatabase) {
    let store = db.session_store();
    let key = Key::new("username", "alice", "").with_hashed_password("$argon2id$hash".into());

    let user_id = store.set_user(&NewUser::default(), Some(&key)).await.unwrap();
    assert_eq!(user_id.len(), 21);

    let user = store.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(user.id, user_id);

    let stored = store.get_key("username:alice").await.unwrap().unwrap();
    assert_eq!(stored.user_id, user_id);
    assert_eq!(stored.hashed_password.as_deref(), Some("$argon2id$hash"));

    let keys = store.get_keys_by_user_id(&user_id).await.unwrap();
    assert_eq!(keys.len(), 1);
}

async fn set_user_is_atomic_test(db: &TestDatabase) {
    let store = db.session_store();
    let key = Key::new("username", "bob", "");
    store
        .set_user(&NewUser { id: Some("u1".into()) }, Some(&key))
        .await
        .unwrap();

    // Same key id again: the key insert fails, so the second user must not exist.
    let err = store
        .set_user(&NewUser { id: Some("u2".into()) }, Some(&key))
        .await
        .unwrap_err();
    assert!(err.is_constraint(), "unexpected error: {err}");
    assert!(store.get_user("u2").await.unwrap().is_none());
    assert!(store.get_user("u1").await.unwrap().is_some());
}

async fn duplicate_user_test(db: &TestDatabase) {
    create_user(db, "u1").await;

    let err = db
        .session_store()
        .set_user(&NewUser { id: Some("u1".into()) }, None)
        .await
        .unwrap_err();
    assert!(err.is_constraint(), "unexpected error: {err}");
}

async fn expiry_fidelity_test(db: &TestDatabase) {
    let store = db.session_store();
    let user_id = create_user(db, "u1").await;

    // Beyond 2^53, where a double would lose precision.
    let active = 9_007_199_254_740_993_i64;
    let idle = i64::MAX;
    store
        .set_session(&session("s1", &user_id, active, idle))
        .await
        .unwrap();

    let stored = store.get_session("s1").await.unwrap().unwrap();
    assert_eq!(stored.active_expires, active);
    assert_eq!(stored.idle_expires, idle);
    assert_eq!(stored.user_id, user_id);
}

async fn session_lifecycle_test(db: &TestDatabase) {
    let store = db.session_store();
    let user_id = create_user(db, "u1").await;

    store
        .set_session(&session("s1", &user_id, 1_700_000_000_000, 1_700_000_600_000))
        .await
        .unwrap();
    store
        .set_session(&session("s2", &user_id, 1_700_000_000_000, 1_700_000_600_000))
        .await
        .unwrap();
    assert_eq!(store.get_sessions_by_user_id(&user_id).await.unwrap().len(), 2);

    let update = SessionUpdate {
        active_expires: Some(1_800_000_000_000),
        idle_expires: Some(1_800_000_600_000),
    };
    let result = store.update_session("s1", &update).await.unwrap();
    assert_eq!(result.rows_affected, 1);
    let renewed = store.get_session("s1").await.unwrap().unwrap();
    assert_eq!(renewed.active_expires, 1_800_000_000_000);
    assert_eq!(renewed.idle_expires, 1_800_000_600_000);

    let result = store
        .update_session("s1", &SessionUpdate::default())
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 0);

    assert_eq!(store.delete_session("s1").await.unwrap().rows_affected, 1);
    assert_eq!(store.delete_session("s1").await.unwrap().rows_affected, 0);
    assert!(store.get_session("s1").await.unwrap().is_none());

    let result = store.delete_sessions_by_user_id(&user_id).await.unwrap();
    assert_eq!(result.rows_affected, 1);
    assert!(store.get_sessions_by_user_id(&user_id).await.unwrap().is_empty());
}

async fn key_lifecycle_test(db: &TestDatabase) {
    let store = db.session_store();
    let user_id = create_user(db, "u1").await;

    store
        .set_key(&Key::new("username", "carol", &user_id).with_hashed_password("h1".into()))
        .await
        .unwrap();
    store
        .set_key(&Key::new("github", "carol", &user_id))
        .await
        .unwrap();

    let result = store.update_key("username:carol", Some("h2")).await.unwrap();
    assert_eq!(result.rows_affected, 1);
    let key = store.get_key("username:carol").await.unwrap().unwrap();
    assert_eq!(key.hashed_password.as_deref(), Some("h2"));

    let github = store.get_key("github:carol").await.unwrap().unwrap();
    assert_eq!(github.hashed_password, None);

    assert_eq!(store.delete_key("github:carol").await.unwrap().rows_affected, 1);
    assert!(store.get_key("github:carol").await.unwrap().is_none());

    let result = store.delete_keys_by_user_id(&user_id).await.unwrap();
    assert_eq!(result.rows_affected, 1);
    assert!(store.get_keys_by_user_id(&user_id).await.unwrap().is_empty());
}

async fn dangling_user_reference_test(db: &TestDatabase) {
    // Foreign keys on a remote libsql stream depend on the server's pragma
    // handling, so only the pooled drivers are asserted here.
    if db.database_type == TestDatabaseType::Libsql {
        return;
    }

    let err = db
        .session_store()
        .set_session(&session("s1", "nobody", 1, 2))
        .await
        .unwrap_err();
    assert!(err.is_constraint(), "unexpected error: {err}");

    let err = db
        .session_store()
        .set_key(&Key::new("username", "ghost", "nobody"))
        .await
        .unwrap_err();
    assert!(err.is_constraint(), "unexpected error: {err}");
}

async fn missing_rows_test(db: &TestDatabase) {
    let store = db.session_store();
    assert!(store.get_user("missing").await.unwrap().is_none());
    assert!(store.get_session("missing").await.unwrap().is_none());
    assert!(store.get_key("missing").await.unwrap().is_none());
    assert_eq!(
        store
            .update_key("missing", None)
            .await
            .unwrap()
            .rows_affected,
        0
    );
}

matrix_test!(test_session_store_tables, tables_test);
matrix_test!(test_set_user_with_key, user_with_key_test);
matrix_test!(test_set_user_atomic, set_user_is_atomic_test);
matrix_test!(test_duplicate_user, duplicate_user_test);
matrix_test!(test_session_expiry_fidelity, expiry_fidelity_test);
matrix_test!(test_session_lifecycle, session_lifecycle_test);
matrix_test!(test_key_lifecycle, key_lifecycle_test);
matrix_test!(test_dangling_user_reference, dangling_user_reference_test);
matrix_test!(test_missing_rows, missing_rows_test);
