use bookmark_store::models::{Bookmark, BookmarkPatch, NewBookmark, Page};
use chrono::{Duration, Utc};
use std::collections::HashSet;

#[macro_use]
mod common;

use common::TestDatabase;

fn find<'a>(bookmarks: &'a [Bookmark], id: &str) -> Option<&'a Bookmark> {
    bookmarks.iter().find(|b| b.id == id)
}

async fn round_trip_test(db: &TestDatabase) {
    let backend = db.backend();

    let data = NewBookmark::new("https://example.com/article")
        .with_tags(["rust", "databases"])
        .with_collection("reading")
        .with_user_id("user-1");
    let inserted = backend.create_bookmark(&data).await.unwrap();
    assert_eq!(inserted.rows_affected, 1);
    assert_eq!(inserted.id.len(), 21);

    let bookmarks = backend.get_all_bookmarks().await.unwrap();
    let stored = find(&bookmarks, &inserted.id).expect("inserted bookmark is listed");
    assert_eq!(stored.url, "https://example.com/article");
    assert_eq!(
        stored.tags,
        Some(vec!["rust".to_string(), "databases".to_string()])
    );
    assert_eq!(stored.collection.as_deref(), Some("reading"));
    assert_eq!(stored.user_id.as_deref(), Some("user-1"));
}

async fn optional_fields_test(db: &TestDatabase) {
    let backend = db.backend();

    let inserted = backend
        .create_bookmark(&NewBookmark::new("https://example.com/bare").with_id("bare"))
        .await
        .unwrap();
    assert_eq!(inserted.id, "bare");

    let bookmarks = backend.get_all_bookmarks().await.unwrap();
    let stored = find(&bookmarks, "bare").unwrap();
    assert_eq!(stored.tags, None);
    assert_eq!(stored.collection, None);
    assert_eq!(stored.user_id, None);
}

async fn update_test(db: &TestDatabase) {
    let backend = db.backend();
    backend
        .create_bookmark(
            &NewBookmark::new("https://example.com/old")
                .with_id("b1")
                .with_tags(["old"])
                .with_collection("inbox"),
        )
        .await
        .unwrap();

    let patch = BookmarkPatch {
        url: Some("https://example.com/new".to_string()),
        tags: Some(Some(vec!["new".to_string(), "shiny".to_string()])),
        ..BookmarkPatch::default()
    };
    let result = backend.update_bookmark("b1", &patch).await.unwrap();
    assert_eq!(result.rows_affected, 1);

    let bookmarks = backend.get_all_bookmarks().await.unwrap();
    let stored = find(&bookmarks, "b1").unwrap();
    assert_eq!(stored.url, "https://example.com/new");
    assert_eq!(
        stored.tags,
        Some(vec!["new".to_string(), "shiny".to_string()])
    );
    // untouched by the patch
    assert_eq!(stored.collection.as_deref(), Some("inbox"));

    let clear = BookmarkPatch {
        collection: Some(None),
        ..BookmarkPatch::default()
    };
    let result = backend.update_bookmark("b1", &clear).await.unwrap();
    assert_eq!(result.rows_affected, 1);

    let bookmarks = backend.get_all_bookmarks().await.unwrap();
    assert_eq!(find(&bookmarks, "b1").unwrap().collection, None);
}

async fn update_missing_id_test(db: &TestDatabase) {
    let backend = db.backend();

    let result = backend
        .update_bookmark("missing", &BookmarkPatch::url("https://example.com"))
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 0);
    assert!(backend.get_all_bookmarks().await.unwrap().is_empty());
}

async fn empty_patch_test(db: &TestDatabase) {
    let backend = db.backend();
    backend
        .create_bookmark(&NewBookmark::new("https://example.com").with_id("b1"))
        .await
        .unwrap();

    let result = backend
        .update_bookmark("b1", &BookmarkPatch::default())
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 0);
    assert_eq!(
        find(&backend.get_all_bookmarks().await.unwrap(), "b1")
            .unwrap()
            .url,
        "https://example.com"
    );
}

async fn delete_is_idempotent_test(db: &TestDatabase) {
    let backend = db.backend();
    backend
        .create_bookmark(&NewBookmark::new("https://example.com").with_id("b1"))
        .await
        .unwrap();

    let first = backend.delete_bookmark("b1").await.unwrap();
    assert_eq!(first.rows_affected, 1);

    let second = backend.delete_bookmark("b1").await.unwrap();
    assert_eq!(second.rows_affected, 0);

    assert!(backend.get_all_bookmarks().await.unwrap().is_empty());
}

async fn missing_url_test(db: &TestDatabase) {
    let backend = db.backend();

    let err = backend
        .create_bookmark(&NewBookmark::default())
        .await
        .unwrap_err();
    assert!(err.is_constraint(), "unexpected error: {err}");

    let err = backend
        .update_bookmark("b1", &BookmarkPatch::url("   "))
        .await
        .unwrap_err();
    assert!(err.is_constraint(), "unexpected error: {err}");

    assert!(backend.get_all_bookmarks().await.unwrap().is_empty());
}

async fn duplicate_id_test(db: &TestDatabase) {
    let backend = db.backend();
    backend
        .create_bookmark(&NewBookmark::new("https://example.com/a").with_id("dup"))
        .await
        .unwrap();

    let err = backend
        .create_bookmark(&NewBookmark::new("https://example.com/b").with_id("dup"))
        .await
        .unwrap_err();
    assert!(err.is_constraint(), "unexpected error: {err}");

    let bookmarks = backend.get_all_bookmarks().await.unwrap();
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].url, "https://example.com/a");
}

async fn generated_ids_are_unique_test(db: &TestDatabase) {
    let backend = db.backend();

    let mut ids = HashSet::new();
    for i in 0..1000 {
        let inserted = backend
            .create_bookmark(&NewBookmark::new(format!("https://example.com/{i}")))
            .await
            .unwrap();
        ids.insert(inserted.id);
    }
    assert_eq!(ids.len(), 1000);
    assert_eq!(backend.get_all_bookmarks().await.unwrap().len(), 1000);
}

async fn pagination_test(db: &TestDatabase) {
    let backend = db.backend();
    for i in 0..5 {
        backend
            .create_bookmark(&NewBookmark::new(format!("https://example.com/{i}")))
            .await
            .unwrap();
    }

    let page = backend
        .get_bookmarks(Some(Page {
            limit: 2,
            offset: 0,
        }))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);

    let tail = backend
        .get_bookmarks(Some(Page {
            limit: 10,
            offset: 4,
        }))
        .await
        .unwrap();
    assert_eq!(tail.len(), 1);

    assert_eq!(backend.get_bookmarks(None).await.unwrap().len(), 5);
}

async fn tags_are_kept_verbatim_test(db: &TestDatabase) {
    let backend = db.backend();
    let tags = vec!["b".to_string(), "a".to_string(), "b".to_string()];
    backend
        .create_bookmark(
            &NewBookmark::new("https://example.com")
                .with_id("b1")
                .with_tags(tags.clone()),
        )
        .await
        .unwrap();

    let bookmarks = backend.get_all_bookmarks().await.unwrap();
    assert_eq!(find(&bookmarks, "b1").unwrap().tags, Some(tags));
}

async fn created_at_is_current_test(db: &TestDatabase) {
    let backend = db.backend();
    let before = Utc::now();
    backend
        .create_bookmark(&NewBookmark::new("https://example.com").with_id("b1"))
        .await
        .unwrap();

    let bookmarks = backend.get_all_bookmarks().await.unwrap();
    let created_at = find(&bookmarks, "b1").unwrap().created_at;
    // Whole seconds on some engines, and server clocks drift a little.
    let slack = Duration::seconds(120);
    assert!(
        created_at > before - slack && created_at < Utc::now() + slack,
        "created_at {created_at} is not close to {before}"
    );
}

matrix_test!(test_bookmark_round_trip, round_trip_test);
matrix_test!(test_bookmark_optional_fields, optional_fields_test);
matrix_test!(test_bookmark_update, update_test);
matrix_test!(test_bookmark_update_missing_id, update_missing_id_test);
matrix_test!(test_bookmark_empty_patch, empty_patch_test);
matrix_test!(test_bookmark_delete_idempotent, delete_is_idempotent_test);
matrix_test!(test_bookmark_missing_url, missing_url_test);
matrix_test!(test_bookmark_duplicate_id, duplicate_id_test);
matrix_test!(test_bookmark_generated_ids_unique, generated_ids_are_unique_test);
matrix_test!(test_bookmark_pagination, pagination_test);
matrix_test!(test_bookmark_tags_verbatim, tags_are_kept_verbatim_test);
matrix_test!(test_bookmark_created_at_is_current, created_at_is_current_test);
