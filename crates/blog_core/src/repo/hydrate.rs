//! Tag/category hydration for loaded posts.
//!
//! # Responsibility
//! - Fetch every tag/category row for a page of posts with one LEFT JOIN
//!   query over both bridge tables.
//! - De-duplicate joined rows and attach them to the in-memory posts.
//!
//! # Invariants
//! - A post without associations still appears in the join and ends up with
//!   empty lists, never missing ones.
//! - All-NULL join columns mean "absent" and are never turned into a
//!   zero-valued entity.
//! - Only the first `(post id, entity id)` occurrence is kept.

use super::taxonomy::TaxonomyRecord;
use super::RepoResult;
use crate::db::{ExecContext, Queryable};
use crate::model::post::{Post, PostId};
use crate::model::taxonomy::{Category, Tag};
use rusqlite::types::ToSql;
use rusqlite::Row;
use std::collections::{HashMap, HashSet};

const ASSOCIATION_SELECT_SQL: &str = "SELECT
    p.id AS post_id,
    t.id AS tag_id,
    t.title AS tag_title,
    t.slug AS tag_slug,
    t.created_at AS tag_created_at,
    t.updated_at AS tag_updated_at,
    c.id AS category_id,
    c.title AS category_title,
    c.slug AS category_slug,
    c.created_at AS category_created_at,
    c.updated_at AS category_updated_at
FROM posts p
LEFT JOIN posts_tag pt ON pt.posts_id = p.id
LEFT JOIN tags t ON t.id = pt.tag_id AND t.deleted_at IS NULL
LEFT JOIN posts_category pc ON pc.posts_id = p.id
LEFT JOIN category c ON c.id = pc.category_id AND c.deleted_at IS NULL";

/// Null-capable scan target for one joined side.
#[derive(Debug, Default)]
struct NullableTaxonomy {
    id: Option<i64>,
    title: Option<String>,
    slug: Option<String>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
}

impl NullableTaxonomy {
    fn scan(row: &Row<'_>, prefix: &str) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(format!("{prefix}_id").as_str())?,
            title: row.get(format!("{prefix}_title").as_str())?,
            slug: row.get(format!("{prefix}_slug").as_str())?,
            created_at: row.get(format!("{prefix}_created_at").as_str())?,
            updated_at: row.get(format!("{prefix}_updated_at").as_str())?,
        })
    }

    /// Returns `None` when the join found nothing on this side.
    fn into_record(self) -> Option<TaxonomyRecord> {
        let id = self.id?;
        Some(TaxonomyRecord {
            id,
            title: self.title.unwrap_or_default(),
            slug: self.slug.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or_default(),
            deleted_at: None,
        })
    }
}

#[derive(Debug, Default)]
struct Associations {
    tags: HashMap<PostId, Vec<Tag>>,
    categories: HashMap<PostId, Vec<Category>>,
    seen_tags: HashSet<(PostId, i64)>,
    seen_categories: HashSet<(PostId, i64)>,
}

impl Associations {
    fn absorb(
        &mut self,
        post_id: PostId,
        tag: NullableTaxonomy,
        category: NullableTaxonomy,
    ) {
        if let Some(record) = tag.into_record() {
            if self.seen_tags.insert((post_id, record.id)) {
                self.tags.entry(post_id).or_default().push(record.into());
            }
        }
        if let Some(record) = category.into_record() {
            if self.seen_categories.insert((post_id, record.id)) {
                self.categories
                    .entry(post_id)
                    .or_default()
                    .push(record.into());
            }
        }
    }
}

/// Loads and attaches tags/categories for every post in `posts`.
pub(crate) fn attach_associations(
    db: &dyn Queryable,
    ctx: &ExecContext,
    posts: &mut [Post],
) -> RepoResult<()> {
    if posts.is_empty() {
        return Ok(());
    }

    let post_ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
    let placeholders = vec!["?"; post_ids.len()].join(", ");
    let sql = format!(
        "{ASSOCIATION_SELECT_SQL}
         WHERE p.id IN ({placeholders})
         ORDER BY p.id ASC, t.id ASC, c.id ASC;"
    );
    let bind_refs: Vec<&dyn ToSql> = post_ids.iter().map(|id| id as &dyn ToSql).collect();

    let mut associations = Associations::default();
    db.for_each_row(ctx, &sql, &bind_refs, &mut |row| {
        let post_id: PostId = row.get("post_id")?;
        let tag = NullableTaxonomy::scan(row, "tag")?;
        let category = NullableTaxonomy::scan(row, "category")?;
        associations.absorb(post_id, tag, category);
        Ok(())
    })?;

    for post in posts.iter_mut() {
        post.tags = associations
            .tags
            .get(&post.id)
            .cloned()
            .unwrap_or_default();
        post.categories = associations
            .categories
            .get(&post.id)
            .cloned()
            .unwrap_or_default();
    }

    Ok(())
}

/// Keeps the first occurrence of every post id, preserving order.
pub(crate) fn dedup_by_post_id(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|post| seen.insert(post.id))
        .collect()
}
