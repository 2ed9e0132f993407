use blog_core::db::{open_db_in_memory, ExecContext};
use blog_core::repo::filter::POST_SORT_SAFE_FIELDS;
use blog_core::{
    CategoryId, CategoryRepository, Filters, Post, PostId, PostRepository, RepoError, Repository,
    TagId, TagRepository,
};
use rusqlite::Connection;

struct Fixture {
    conn: Connection,
    rust: TagId,
    sql: TagId,
    news: CategoryId,
    tech: CategoryId,
    posts: Vec<PostId>,
}

/// Five posts; `updated_at` grows with the id so default ordering is stable.
///
/// post 1: tags rust+sql, categories news+tech
/// post 2: tag rust, category news
/// post 3: category news
/// post 4: category tech
/// post 5: nothing
fn fixture() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let ctx = ExecContext::background();
    let (rust, sql, news, tech, posts) = {
        let repo = Repository::new(&conn);
        let rust = repo.tags.insert(&ctx, "Rust").unwrap();
        let sql = repo.tags.insert(&ctx, "SQL").unwrap();
        let news = repo.categories.insert(&ctx, "News").unwrap();
        let tech = repo.categories.insert(&ctx, "Tech").unwrap();

        let layout: Vec<(Vec<TagId>, Vec<CategoryId>)> = vec![
            (vec![rust, sql], vec![news, tech]),
            (vec![rust], vec![news]),
            (vec![], vec![news]),
            (vec![], vec![tech]),
            (vec![], vec![]),
        ];
        let posts = layout
            .iter()
            .enumerate()
            .map(|(index, (tags, categories))| {
                let post = Post::new(1, format!("Post {}", index + 1), "Body");
                repo.posts.save(&ctx, &post, tags, categories).unwrap()
            })
            .collect::<Vec<_>>();
        (rust, sql, news, tech, posts)
    };
    conn.execute_batch("UPDATE posts SET updated_at = id * 1000;")
        .unwrap();

    Fixture {
        conn,
        rust,
        sql,
        news,
        tech,
        posts,
    }
}

fn ids(posts: &[Post]) -> Vec<PostId> {
    posts.iter().map(|post| post.id).collect()
}

fn by_id(page: i64, page_size: i64) -> Filters {
    Filters::new(page, page_size).with_sort(&["id"], POST_SORT_SAFE_FIELDS)
}

#[test]
fn first_page_carries_window_total_and_page_count() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);

    let (posts, meta) = repo
        .posts
        .list(&ExecContext::background(), &by_id(1, 2))
        .unwrap();

    assert_eq!(ids(&posts), fx.posts[..2].to_vec());
    assert_eq!(meta.current_page, 1);
    assert_eq!(meta.page_size, 2);
    assert_eq!(meta.first_page, 1);
    assert_eq!(meta.last_page, 3);
    assert_eq!(meta.total_records, 5);
}

#[test]
fn last_partial_page_and_page_past_the_end() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);
    let ctx = ExecContext::background();

    let (posts, meta) = repo.posts.list(&ctx, &by_id(3, 2)).unwrap();
    assert_eq!(ids(&posts), vec![fx.posts[4]]);
    assert_eq!(meta.current_page, 3);
    assert_eq!(meta.total_records, 5);

    let err = repo.posts.list(&ctx, &by_id(4, 2)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "post",
            id: None
        }
    ));
}

#[test]
fn listed_posts_are_hydrated() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);

    let (posts, _) = repo
        .posts
        .list(&ExecContext::background(), &by_id(1, 10))
        .unwrap();

    assert_eq!(posts[0].tag_ids(), vec![fx.rust, fx.sql]);
    assert_eq!(posts[0].category_ids(), vec![fx.news, fx.tech]);
    assert_eq!(posts[1].tag_ids(), vec![fx.rust]);
    assert!(posts[4].tags.is_empty());
    assert!(posts[4].categories.is_empty());
}

#[test]
fn descending_and_default_sorts() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);
    let ctx = ExecContext::background();

    let filters = Filters::new(1, 2).with_sort(&["-id"], POST_SORT_SAFE_FIELDS);
    let (posts, _) = repo.posts.list(&ctx, &filters).unwrap();
    assert_eq!(ids(&posts), vec![fx.posts[4], fx.posts[3]]);

    let (posts, _) = repo.posts.list(&ctx, &Filters::new(1, 2)).unwrap();
    assert_eq!(ids(&posts), vec![fx.posts[4], fx.posts[3]]);
}

#[test]
fn sort_fields_outside_the_allow_list_are_ignored() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);

    let filters =
        Filters::new(1, 5).with_sort(&["content; DROP TABLE posts", "-id"], POST_SORT_SAFE_FIELDS);
    let (posts, meta) = repo
        .posts
        .list(&ExecContext::background(), &filters)
        .unwrap();

    assert_eq!(ids(&posts), vec![5, 4, 3, 2, 1]);
    assert_eq!(meta.total_records, 5);
}

#[test]
fn category_listing_counts_each_post_once() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);

    let (posts, meta) = repo
        .posts
        .list_by_category(&ExecContext::background(), fx.news, &by_id(1, 10))
        .unwrap();

    assert_eq!(ids(&posts), fx.posts[..3].to_vec());
    assert_eq!(meta.total_records, 3);
    assert_eq!(meta.last_page, 1);
    assert_eq!(posts[0].category_ids(), vec![fx.news, fx.tech]);
}

#[test]
fn tag_listing_keeps_every_tag_of_matching_posts() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);

    let (posts, meta) = repo
        .posts
        .list_by_tag(&ExecContext::background(), fx.sql, &by_id(1, 10))
        .unwrap();

    assert_eq!(ids(&posts), vec![fx.posts[0]]);
    assert_eq!(meta.total_records, 1);
    assert_eq!(posts[0].tag_ids(), vec![fx.rust, fx.sql]);
}

#[test]
fn soft_deleted_posts_leave_lists_and_totals() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);
    let ctx = ExecContext::background();

    repo.posts.soft_delete(&ctx, fx.posts[1]).unwrap();

    let (posts, meta) = repo.posts.list(&ctx, &by_id(1, 10)).unwrap();
    assert!(!ids(&posts).contains(&fx.posts[1]));
    assert_eq!(meta.total_records, 4);

    let (posts, _) = repo.posts.list_by_tag(&ctx, fx.rust, &by_id(1, 10)).unwrap();
    assert_eq!(ids(&posts), vec![fx.posts[0]]);
}

#[test]
fn deleted_category_lists_nothing() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);
    let ctx = ExecContext::background();

    repo.categories.soft_delete(&ctx, fx.tech).unwrap();

    let err = repo
        .posts
        .list_by_category(&ctx, fx.tech, &by_id(1, 10))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));

    let post = repo.posts.get_detail(&ctx, fx.posts[0]).unwrap();
    assert_eq!(post.category_ids(), vec![fx.news]);
}

#[test]
fn metadata_serializes_with_snake_case_keys() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);

    let (_, meta) = repo
        .posts
        .list(&ExecContext::background(), &by_id(2, 2))
        .unwrap();
    let json = serde_json::to_value(meta).unwrap();

    assert_eq!(json["current_page"], 2);
    assert_eq!(json["last_page"], 3);
    assert_eq!(json["total_records"], 5);
}

#[test]
fn out_of_range_page_size_serves_the_default_page() {
    let fx = fixture();
    let repo = Repository::new(&fx.conn);
    let ctx = ExecContext::background();

    for page_size in [-1, 0, 1_000] {
        let filters = Filters::new(1, page_size).with_sort(&["id"], POST_SORT_SAFE_FIELDS);
        let (posts, meta) = repo.posts.list(&ctx, &filters).unwrap();

        assert_eq!(ids(&posts), fx.posts, "page_size={page_size}");
        assert_eq!(meta.page_size, 10);
        assert_eq!(meta.last_page, 1);
        assert_eq!(meta.total_records, 5);
    }
}
