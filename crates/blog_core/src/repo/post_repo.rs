//! Post repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Save a post together with its tag/category associations as one unit of
//!   work (create or update, decided by the id).
//! - Serve paginated list/detail reads with two-phase hydration.
//! - Expose the bridge-table primitives the aggregate save is built from.
//!
//! # Invariants
//! - Bridge writes for a post run on the same transaction as its row write.
//! - Updates replace the association sets wholesale (delete, then insert).
//! - All reads exclude soft-deleted posts.
//! - An empty list page is reported as `NotFound`, not as an empty success.

use super::bridge::{self, PostCategoryLink, PostTagLink};
use super::filter::{calculate_metadata, Filters, Metadata};
use super::hydrate::{attach_associations, dedup_by_post_id};
use super::unit_of_work::run_in_transaction;
use super::{RepoError, RepoResult};
use crate::db::{fetch_optional, ExecContext, Queryable};
use crate::model::post::{Post, PostId, SaveMode};
use crate::model::taxonomy::{CategoryId, TagId};
use log::info;
use rusqlite::types::{ToSql, Value};
use rusqlite::{params, Row};

const POST_COLUMNS_SQL: &str = "posts.id AS id,
    posts.author_id AS author_id,
    posts.title AS title,
    posts.content AS content,
    posts.keyword AS keyword,
    posts.slug AS slug,
    posts.abstract AS abstract,
    posts.cover_image_id AS cover_image_id,
    posts.views AS views,
    posts.likes AS likes,
    posts.comments AS comments,
    posts.created_at AS created_at,
    posts.updated_at AS updated_at,
    posts.deleted_at AS deleted_at";

/// Join/filter fragment narrowing a list to one tag or category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListScope {
    All,
    Category(CategoryId),
    Tag(TagId),
}

impl ListScope {
    fn join_sql(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Category(_) => {
                " INNER JOIN posts_category pc ON pc.posts_id = posts.id
                  INNER JOIN category c ON c.id = pc.category_id AND c.deleted_at IS NULL"
            }
            Self::Tag(_) => {
                " INNER JOIN posts_tag pt ON pt.posts_id = posts.id
                  INNER JOIN tags t ON t.id = pt.tag_id AND t.deleted_at IS NULL"
            }
        }
    }

    fn filter_sql(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Category(_) => " AND pc.category_id = ?",
            Self::Tag(_) => " AND pt.tag_id = ?",
        }
    }

    fn bind_value(self) -> Option<Value> {
        match self {
            Self::All => None,
            Self::Category(id) | Self::Tag(id) => Some(Value::Integer(id)),
        }
    }
}

/// Repository interface for the post aggregate.
pub trait PostRepository {
    /// Creates (`id == 0`) or updates (`id > 0`) a post and replaces its
    /// associations, atomically. Returns the post id.
    fn save(
        &self,
        ctx: &ExecContext,
        post: &Post,
        tag_ids: &[TagId],
        category_ids: &[CategoryId],
    ) -> RepoResult<PostId>;
    /// Inserts the post row only and returns the generated id.
    fn insert(&self, ctx: &ExecContext, post: &Post) -> RepoResult<PostId>;
    /// Updates the mutable columns of an active post row.
    fn update(&self, ctx: &ExecContext, post: &Post) -> RepoResult<()>;
    /// Loads one active post without associations.
    fn get(&self, ctx: &ExecContext, id: PostId) -> RepoResult<Post>;
    /// Loads one active post with tags and categories.
    fn get_detail(&self, ctx: &ExecContext, id: PostId) -> RepoResult<Post>;
    fn list(&self, ctx: &ExecContext, filters: &Filters) -> RepoResult<(Vec<Post>, Metadata)>;
    fn list_by_category(
        &self,
        ctx: &ExecContext,
        category_id: CategoryId,
        filters: &Filters,
    ) -> RepoResult<(Vec<Post>, Metadata)>;
    fn list_by_tag(
        &self,
        ctx: &ExecContext,
        tag_id: TagId,
        filters: &Filters,
    ) -> RepoResult<(Vec<Post>, Metadata)>;
    fn insert_tags(&self, ctx: &ExecContext, links: &[PostTagLink]) -> RepoResult<usize>;
    fn insert_categories(&self, ctx: &ExecContext, links: &[PostCategoryLink])
        -> RepoResult<usize>;
    fn delete_tags(&self, ctx: &ExecContext, post_id: PostId) -> RepoResult<usize>;
    fn delete_categories(&self, ctx: &ExecContext, post_id: PostId) -> RepoResult<usize>;
    /// Marks an active post as deleted.
    fn soft_delete(&self, ctx: &ExecContext, id: PostId) -> RepoResult<()>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'q> {
    db: &'q dyn Queryable,
}

impl<'q> SqlitePostRepository<'q> {
    pub fn new(db: &'q dyn Queryable) -> Self {
        Self { db }
    }

    fn list_scoped(
        &self,
        ctx: &ExecContext,
        scope: ListScope,
        filters: &Filters,
    ) -> RepoResult<(Vec<Post>, Metadata)> {
        let (posts, total_records) = self.list_page(ctx, scope, filters)?;
        let mut posts = match scope {
            ListScope::All => posts,
            ListScope::Category(_) | ListScope::Tag(_) => dedup_by_post_id(posts),
        };
        attach_associations(self.db, ctx, &mut posts)?;

        let metadata =
            calculate_metadata(total_records, filters.page, filters.effective_page_size());
        Ok((posts, metadata))
    }

    /// Phase one: one page of post rows plus the windowed total count.
    fn list_page(
        &self,
        ctx: &ExecContext,
        scope: ListScope,
        filters: &Filters,
    ) -> RepoResult<(Vec<Post>, i64)> {
        let sql = format!(
            "SELECT listed.*, COUNT(*) OVER () AS total_records
             FROM (
                SELECT {POST_COLUMNS_SQL}
                FROM posts{join}
                WHERE posts.deleted_at IS NULL{filter}
             ) AS listed
             ORDER BY {order}, id ASC
             LIMIT ? OFFSET ?;",
            join = scope.join_sql(),
            filter = scope.filter_sql(),
            order = filters.order_by(),
        );

        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(value) = scope.bind_value() {
            bind_values.push(value);
        }
        bind_values.push(Value::Integer(filters.limit()));
        bind_values.push(Value::Integer(filters.offset()));
        let bind_refs: Vec<&dyn ToSql> = bind_values
            .iter()
            .map(|value| value as &dyn ToSql)
            .collect();

        let mut posts = Vec::new();
        let mut total_records = 0_i64;
        self.db.for_each_row(ctx, &sql, &bind_refs, &mut |row| {
            total_records = row.get("total_records")?;
            posts.push(parse_post_row(row)?);
            Ok(())
        })?;

        if posts.is_empty() {
            return Err(RepoError::NotFound {
                entity: "post",
                id: None,
            });
        }

        Ok((posts, total_records))
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn save(
        &self,
        ctx: &ExecContext,
        post: &Post,
        tag_ids: &[TagId],
        category_ids: &[CategoryId],
    ) -> RepoResult<PostId> {
        let mode = post.save_mode();
        let written = run_in_transaction(self.db, ctx, |repo| {
            let post_id = match mode {
                SaveMode::New => repo.posts.insert(ctx, post)?,
                SaveMode::Existing => {
                    repo.posts.update(ctx, post)?;
                    repo.posts.delete_tags(ctx, post.id)?;
                    repo.posts.delete_categories(ctx, post.id)?;
                    post.id
                }
            };

            let tag_links = bridge::links_for_post::<PostTagLink>(post_id, tag_ids);
            let category_links =
                bridge::links_for_post::<PostCategoryLink>(post_id, category_ids);
            let tags_written = repo.posts.insert_tags(ctx, &tag_links)?;
            let categories_written = repo.posts.insert_categories(ctx, &category_links)?;
            Ok((post_id, tags_written, categories_written))
        })?;
        let (post_id, tags_written, categories_written) = written;

        info!(
            "event=post_save module=repo status=ok mode={} post_id={} tags={} categories={}",
            match mode {
                SaveMode::New => "create",
                SaveMode::Existing => "update",
            },
            post_id,
            tags_written,
            categories_written
        );
        Ok(post_id)
    }

    fn insert(&self, ctx: &ExecContext, post: &Post) -> RepoResult<PostId> {
        let outcome = self.db.execute(
            ctx,
            "INSERT INTO posts (
                author_id,
                title,
                content,
                keyword,
                slug,
                abstract,
                cover_image_id,
                views,
                likes,
                comments
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                post.author_id,
                post.title.as_str(),
                post.content.as_str(),
                post.keyword.as_str(),
                post.slug.as_str(),
                post.r#abstract.as_str(),
                post.cover_id,
                post.views,
                post.likes,
                post.comments,
            ],
        )?;

        Ok(outcome.last_insert_id)
    }

    fn update(&self, ctx: &ExecContext, post: &Post) -> RepoResult<()> {
        let outcome = self.db.execute(
            ctx,
            "UPDATE posts
             SET
                title = ?2,
                content = ?3,
                keyword = ?4,
                slug = ?5,
                abstract = ?6,
                cover_image_id = ?7,
                views = ?8,
                likes = ?9,
                comments = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND deleted_at IS NULL;",
            params![
                post.id,
                post.title.as_str(),
                post.content.as_str(),
                post.keyword.as_str(),
                post.slug.as_str(),
                post.r#abstract.as_str(),
                post.cover_id,
                post.views,
                post.likes,
                post.comments,
            ],
        )?;

        if outcome.rows_affected == 0 {
            return Err(RepoError::not_found("post", post.id));
        }

        Ok(())
    }

    fn get(&self, ctx: &ExecContext, id: PostId) -> RepoResult<Post> {
        let sql = format!(
            "SELECT {POST_COLUMNS_SQL}
             FROM posts
             WHERE posts.id = ?1
               AND posts.deleted_at IS NULL;"
        );
        fetch_optional(self.db, ctx, &sql, params![id], parse_post_row)?
            .ok_or_else(|| RepoError::not_found("post", id))
    }

    fn get_detail(&self, ctx: &ExecContext, id: PostId) -> RepoResult<Post> {
        let mut post = self.get(ctx, id)?;
        attach_associations(self.db, ctx, std::slice::from_mut(&mut post))?;
        Ok(post)
    }

    fn list(&self, ctx: &ExecContext, filters: &Filters) -> RepoResult<(Vec<Post>, Metadata)> {
        self.list_scoped(ctx, ListScope::All, filters)
    }

    fn list_by_category(
        &self,
        ctx: &ExecContext,
        category_id: CategoryId,
        filters: &Filters,
    ) -> RepoResult<(Vec<Post>, Metadata)> {
        self.list_scoped(ctx, ListScope::Category(category_id), filters)
    }

    fn list_by_tag(
        &self,
        ctx: &ExecContext,
        tag_id: TagId,
        filters: &Filters,
    ) -> RepoResult<(Vec<Post>, Metadata)> {
        self.list_scoped(ctx, ListScope::Tag(tag_id), filters)
    }

    fn insert_tags(&self, ctx: &ExecContext, links: &[PostTagLink]) -> RepoResult<usize> {
        bridge::bulk_insert(self.db, ctx, links)
    }

    fn insert_categories(
        &self,
        ctx: &ExecContext,
        links: &[PostCategoryLink],
    ) -> RepoResult<usize> {
        bridge::bulk_insert(self.db, ctx, links)
    }

    fn delete_tags(&self, ctx: &ExecContext, post_id: PostId) -> RepoResult<usize> {
        bridge::delete_for_post::<PostTagLink>(self.db, ctx, post_id)
    }

    fn delete_categories(&self, ctx: &ExecContext, post_id: PostId) -> RepoResult<usize> {
        bridge::delete_for_post::<PostCategoryLink>(self.db, ctx, post_id)
    }

    fn soft_delete(&self, ctx: &ExecContext, id: PostId) -> RepoResult<()> {
        let outcome = self.db.execute(
            ctx,
            "UPDATE posts
             SET
                deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND deleted_at IS NULL;",
            params![id],
        )?;

        if outcome.rows_affected == 0 {
            return Err(RepoError::RowsNotAffected { entity: "post", id });
        }

        Ok(())
    }
}

fn parse_post_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get("id")?,
        author_id: row.get("author_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        keyword: row.get("keyword")?,
        slug: row.get("slug")?,
        r#abstract: row.get("abstract")?,
        cover_id: row.get("cover_image_id")?,
        views: row.get("views")?,
        likes: row.get("likes")?,
        comments: row.get("comments")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
        tags: Vec::new(),
        categories: Vec::new(),
    })
}
