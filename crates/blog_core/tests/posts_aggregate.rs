use blog_core::db::{open_db_in_memory, DbError, ExecContext, Queryable};
use blog_core::repo::bridge::{links_for_post, PostTagLink};
use blog_core::repo::unit_of_work::run_in_transaction;
use blog_core::{
    classify, CategoryRepository, ErrorKind, Post, PostRepository, RepoError, Repository,
    SqlitePostRepository, TagRepository,
};
use rusqlite::Connection;
use std::time::Duration;

fn ctx() -> ExecContext {
    ExecContext::background()
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn create_writes_post_and_deduplicated_associations() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);
    let rust = repo.tags.insert(&ctx(), "Rust").unwrap();
    let sql = repo.tags.insert(&ctx(), "SQL").unwrap();
    let news = repo.categories.insert(&ctx(), "News").unwrap();

    let post = Post::new(7, "Hello", "Body");
    let post_id = repo
        .posts
        .save(&ctx(), &post, &[rust, rust, sql], &[news])
        .unwrap();
    assert!(post_id > 0);

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts_tag;"), 2);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts_category;"), 1);

    let loaded = repo.posts.get_detail(&ctx(), post_id).unwrap();
    assert_eq!(loaded.title, "Hello");
    assert_eq!(loaded.author_id, 7);
    assert_eq!(loaded.tag_ids(), vec![rust, sql]);
    assert_eq!(loaded.category_ids(), vec![news]);
    assert_eq!(loaded.tags[0].title, "Rust");
    assert_eq!(loaded.categories[0].slug, "news");
}

#[test]
fn post_without_associations_has_empty_lists() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);

    let post_id = repo
        .posts
        .save(&ctx(), &Post::new(1, "Bare", "Body"), &[], &[])
        .unwrap();

    let loaded = repo.posts.get_detail(&ctx(), post_id).unwrap();
    assert!(loaded.tags.is_empty());
    assert!(loaded.categories.is_empty());
}

#[test]
fn update_replaces_fields_and_association_sets() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);
    let rust = repo.tags.insert(&ctx(), "Rust").unwrap();
    let go = repo.tags.insert(&ctx(), "Go").unwrap();
    let news = repo.categories.insert(&ctx(), "News").unwrap();

    let post_id = repo
        .posts
        .save(&ctx(), &Post::new(1, "Draft", "v1"), &[rust], &[news])
        .unwrap();

    let mut post = repo.posts.get(&ctx(), post_id).unwrap();
    post.title = "Final".to_string();
    post.content = "v2".to_string();
    let saved_id = repo.posts.save(&ctx(), &post, &[go], &[]).unwrap();
    assert_eq!(saved_id, post_id);

    let loaded = repo.posts.get_detail(&ctx(), post_id).unwrap();
    assert_eq!(loaded.title, "Final");
    assert_eq!(loaded.content, "v2");
    assert_eq!(loaded.tag_ids(), vec![go]);
    assert!(loaded.categories.is_empty());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts_tag;"), 1);
}

#[test]
fn failed_association_write_rolls_back_the_post_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);
    let rust = repo.tags.insert(&ctx(), "Rust").unwrap();

    let err = repo
        .posts
        .save(&ctx(), &Post::new(1, "Doomed", "Body"), &[rust, 999], &[])
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Sqlite(_))));

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts;"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts_tag;"), 0);
    assert!(matches!(
        repo.posts.get(&ctx(), 1),
        Err(RepoError::NotFound {
            entity: "post",
            id: Some(1)
        })
    ));

    let classified = classify(err);
    assert_eq!(classified.kind(), ErrorKind::Internal);
    assert!(classified.sqlite_error().is_some());
}

#[test]
fn updating_missing_post_is_not_found_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);
    let rust = repo.tags.insert(&ctx(), "Rust").unwrap();

    let mut ghost = Post::new(1, "Ghost", "Body");
    ghost.id = 77;
    let err = repo.posts.save(&ctx(), &ghost, &[rust], &[]).unwrap_err();

    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "post",
            id: Some(77)
        }
    ));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts_tag;"), 0);
    assert_eq!(classify(err).status_code(), 404);
}

#[test]
fn aggregate_save_on_a_transaction_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let tx = conn.unchecked_transaction().unwrap();
    let posts = SqlitePostRepository::new(&tx);

    let err = posts
        .save(&ctx(), &Post::new(1, "Nested", "Body"), &[], &[])
        .unwrap_err();
    assert!(matches!(err, RepoError::NestedTransaction));
    drop(tx);

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts;"), 0);
}

#[test]
fn canceled_context_stops_the_save_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);
    let ctx = ExecContext::background();
    ctx.cancel_handle().cancel();

    let err = repo
        .posts
        .save(&ctx, &Post::new(1, "Late", "Body"), &[], &[])
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Canceled)));
    assert_eq!(classify(err).message(), "request was canceled");
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts;"), 0);
}

#[test]
fn expired_deadline_is_reported_as_timeout() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);
    let ctx = ExecContext::with_timeout(Duration::ZERO);

    let err = repo.posts.get(&ctx, 1).unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::DeadlineExceeded)));
    let classified = classify(err);
    assert_eq!(classified.kind(), ErrorKind::Internal);
    assert_eq!(classified.message(), "request timed out");
}

#[test]
fn cancel_during_work_rolls_back_before_commit() {
    let conn = open_db_in_memory().unwrap();
    let ctx = ExecContext::background();
    let handle = ctx.cancel_handle();

    let err = run_in_transaction(&conn, &ctx, |repo| {
        let id = repo.posts.insert(&ctx, &Post::new(1, "Half", "Body"))?;
        handle.cancel();
        Ok(id)
    })
    .unwrap_err();

    assert!(matches!(err, RepoError::Db(DbError::Canceled)));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts;"), 0);
}

#[test]
fn work_spanning_several_repositories_commits_together() {
    let conn = open_db_in_memory().unwrap();

    let (post_id, tag_id) = run_in_transaction(&conn, &ctx(), |repo| {
        let tag_id = repo.tags.insert(&ctx(), "Rust")?;
        let post_id = repo.posts.insert(&ctx(), &Post::new(1, "Joint", "Body"))?;
        let links = links_for_post::<PostTagLink>(post_id, &[tag_id]);
        repo.posts.insert_tags(&ctx(), &links)?;
        Ok((post_id, tag_id))
    })
    .unwrap();

    let repo = Repository::new(&conn);
    let loaded = repo.posts.get_detail(&ctx(), post_id).unwrap();
    assert_eq!(loaded.tag_ids(), vec![tag_id]);
}

#[test]
fn work_error_discards_every_write_of_the_unit() {
    let conn = open_db_in_memory().unwrap();

    let err = run_in_transaction(&conn, &ctx(), |repo| {
        repo.categories.insert(&ctx(), "News")?;
        repo.posts.insert(&ctx(), &Post::new(1, "Gone", "Body"))?;
        Err::<(), _>(RepoError::InvalidData("abort".to_string()))
    })
    .unwrap_err();

    assert!(matches!(err, RepoError::InvalidData(_)));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts;"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM category;"), 0);
}

#[test]
fn soft_deleted_post_is_hidden_and_cannot_be_deleted_twice() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);
    let post_id = repo
        .posts
        .save(&ctx(), &Post::new(1, "Short lived", "Body"), &[], &[])
        .unwrap();

    repo.posts.soft_delete(&ctx(), post_id).unwrap();

    assert!(matches!(
        repo.posts.get(&ctx(), post_id),
        Err(RepoError::NotFound { .. })
    ));
    let err = repo.posts.soft_delete(&ctx(), post_id).unwrap_err();
    assert!(matches!(err, RepoError::RowsNotAffected { .. }));
    assert_eq!(classify(err).status_code(), 418);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts;"), 1);
}

#[test]
fn detail_skips_soft_deleted_tags() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);
    let rust = repo.tags.insert(&ctx(), "Rust").unwrap();
    let old = repo.tags.insert(&ctx(), "Old").unwrap();
    let post_id = repo
        .posts
        .save(&ctx(), &Post::new(1, "Tagged", "Body"), &[rust, old], &[])
        .unwrap();

    repo.tags.soft_delete(&ctx(), old).unwrap();

    let loaded = repo.posts.get_detail(&ctx(), post_id).unwrap();
    assert_eq!(loaded.tag_ids(), vec![rust]);
}

#[test]
fn failed_rollback_reports_work_error_and_rollback_error() {
    let conn = open_db_in_memory().unwrap();

    let err = run_in_transaction(&conn, &ctx(), |repo| {
        repo.posts.insert(&ctx(), &Post::new(1, "Orphan", "Body"))?;
        repo.executor().execute(&ctx(), "ROLLBACK;", &[])?;
        Err::<(), _>(RepoError::InvalidData("abort".to_string()))
    })
    .unwrap_err();

    match &err {
        RepoError::Rollback { source, rollback } => {
            assert!(matches!(source.as_ref(), RepoError::InvalidData(_)));
            assert!(matches!(rollback, DbError::Sqlite(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(err.root(), RepoError::InvalidData(_)));
    let text = err.to_string();
    assert!(text.starts_with("tx err: "));
    assert!(text.contains("rb err: "));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM posts;"), 0);
}

#[test]
fn bulk_insert_reports_rows_written_after_dedup() {
    let conn = open_db_in_memory().unwrap();
    let repo = Repository::new(&conn);
    let rust = repo.tags.insert(&ctx(), "Rust").unwrap();
    let sql = repo.tags.insert(&ctx(), "SQL").unwrap();
    let post_id = repo
        .posts
        .save(&ctx(), &Post::new(1, "Counted", "Body"), &[], &[])
        .unwrap();

    let links = links_for_post::<PostTagLink>(post_id, &[rust, rust, sql]);
    assert_eq!(repo.posts.insert_tags(&ctx(), &links).unwrap(), 2);
    assert_eq!(repo.posts.delete_tags(&ctx(), post_id).unwrap(), 2);
}
