use blog_core::db::{open_db_in_memory, ExecContext};
use blog_core::{
    AppConfig, CategoryService, ErrorKind, NewPostRequest, PostService, SqliteCategoryRepository,
    SqlitePostRepository, SqliteTagRepository, TagService, UpdatePostRequest,
};
use std::io::Write;

#[test]
fn create_post_derives_slug_and_abstract() {
    let conn = open_db_in_memory().unwrap();
    let ctx = ExecContext::background();
    let tags = TagService::new(SqliteTagRepository::new(&conn));
    let posts = PostService::new(SqlitePostRepository::new(&conn));
    let rust = tags.create_tag(&ctx, "Rust").unwrap();

    let id = posts
        .create_post(
            &ctx,
            NewPostRequest {
                author_id: 3,
                title: "Hello, World!".to_string(),
                content: "## Intro\n\nFirst **post** here".to_string(),
                tag_ids: vec![rust, rust],
                ..NewPostRequest::default()
            },
        )
        .unwrap();

    let post = posts.get_post_detail(&ctx, id).unwrap();
    assert_eq!(post.slug, "hello-world");
    assert_eq!(post.r#abstract, "Intro First post here");
    assert_eq!(post.tag_ids(), vec![rust]);
}

#[test]
fn update_post_keeps_blank_title_and_replaces_associations() {
    let conn = open_db_in_memory().unwrap();
    let ctx = ExecContext::background();
    let categories = CategoryService::new(SqliteCategoryRepository::new(&conn));
    let posts = PostService::new(SqlitePostRepository::new(&conn));
    let news = categories.create_category(&ctx, "News").unwrap();
    let tech = categories.create_category(&ctx, "Tech").unwrap();

    let id = posts
        .create_post(
            &ctx,
            NewPostRequest {
                author_id: 1,
                title: "Original".to_string(),
                content: "old body".to_string(),
                category_ids: vec![news],
                ..NewPostRequest::default()
            },
        )
        .unwrap();

    posts
        .update_post(
            &ctx,
            UpdatePostRequest {
                id,
                content: "new body".to_string(),
                slug: "custom-slug".to_string(),
                category_ids: vec![tech],
                ..UpdatePostRequest::default()
            },
        )
        .unwrap();

    let post = posts.get_post_detail(&ctx, id).unwrap();
    assert_eq!(post.title, "Original");
    assert_eq!(post.content, "new body");
    assert_eq!(post.slug, "custom-slug");
    assert_eq!(post.category_ids(), vec![tech]);
}

#[test]
fn service_errors_are_classified() {
    let conn = open_db_in_memory().unwrap();
    let ctx = ExecContext::background();
    let posts = PostService::new(SqlitePostRepository::new(&conn));
    let tags = TagService::new(SqliteTagRepository::new(&conn));

    let missing = posts
        .update_post(
            &ctx,
            UpdatePostRequest {
                id: 9,
                ..UpdatePostRequest::default()
            },
        )
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let empty = posts.list_posts::<&str>(&ctx, 1, 10, &[]).unwrap_err();
    assert_eq!(empty.status_code(), 404);

    let far = posts.list_posts::<&str>(&ctx, i64::MAX, 10, &[]).unwrap_err();
    assert_eq!(far.kind(), ErrorKind::NotFound);

    tags.create_tag(&ctx, "Rust").unwrap();
    let duplicate = tags.create_tag(&ctx, "Rust").unwrap_err();
    assert_eq!(duplicate.status_code(), 409);
    assert_eq!(duplicate.message(), "tag already exists");
}

#[test]
fn list_and_delete_through_the_service() {
    let conn = open_db_in_memory().unwrap();
    let ctx = ExecContext::background();
    let posts = PostService::new(SqlitePostRepository::new(&conn));

    for title in ["a", "b", "c"] {
        posts
            .create_post(
                &ctx,
                NewPostRequest {
                    author_id: 1,
                    title: title.to_string(),
                    content: "body".to_string(),
                    ..NewPostRequest::default()
                },
            )
            .unwrap();
    }

    let page = posts.list_posts(&ctx, 1, 2, &["-title"]).unwrap();
    let titles: Vec<&str> = page.list.iter().map(|post| post.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "b"]);
    assert_eq!(page.meta.last_page, 2);

    let first_id = page.list[0].id;
    posts.delete_post(&ctx, first_id).unwrap();
    let again = posts.delete_post(&ctx, first_id).unwrap_err();
    assert_eq!(again.kind(), ErrorKind::RowsNotAffected);
    assert_eq!(again.status_code(), 418);

    let page = posts.list_posts(&ctx, 1, 10, &["title"]).unwrap();
    assert_eq!(page.meta.total_records, 2);
}

#[test]
fn new_post_request_parses_with_defaults() {
    let req: NewPostRequest =
        serde_json::from_str(r#"{"author_id": 5, "title": "From JSON", "content": "x"}"#).unwrap();
    assert_eq!(req.author_id, 5);
    assert!(req.tag_ids.is_empty());
    assert!(req.category_ids.is_empty());
    assert_eq!(req.cover_id, None);
}

#[test]
fn config_file_drives_store_settings() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"database": {{"source": ":memory:", "busy_timeout_ms": 100}}}}"#
    )
    .unwrap();

    let config = AppConfig::load(file.path()).unwrap();
    assert!(config.database.is_in_memory());
    assert_eq!(config.database.busy_timeout_ms, 100);

    let conn = blog_core::open_store(&config.database).unwrap();
    let posts = PostService::new(SqlitePostRepository::new(&conn));
    let err = posts.get_post(&ExecContext::background(), 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
