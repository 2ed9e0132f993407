//! Post association bridge rows and their bulk writer.
//!
//! # Responsibility
//! - Model `posts_tag` / `posts_category` rows.
//! - Insert many bridge rows with one statement and delete a post's rows.
//!
//! # Invariants
//! - Empty input never touches the store.
//! - Statement text only contains placeholders; ids are always bound.
//! - Bridge rows are owned by the post aggregate and written on the same
//!   executor as the post row.

use super::RepoResult;
use crate::db::{ExecContext, Queryable};
use crate::model::post::PostId;
use crate::model::taxonomy::{CategoryId, TagId};
use rusqlite::params;
use rusqlite::types::ToSql;
use std::collections::BTreeSet;

/// Row shape shared by every post bridge table.
pub trait BridgeLink {
    const TABLE: &'static str;
    const TARGET_COLUMN: &'static str;

    fn new(post_id: PostId, target_id: i64) -> Self;
    fn post_id(&self) -> PostId;
    fn target_id(&self) -> i64;
}

/// One `posts_tag` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PostTagLink {
    pub post_id: PostId,
    pub tag_id: TagId,
}

/// One `posts_category` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PostCategoryLink {
    pub post_id: PostId,
    pub category_id: CategoryId,
}

impl BridgeLink for PostTagLink {
    const TABLE: &'static str = "posts_tag";
    const TARGET_COLUMN: &'static str = "tag_id";

    fn new(post_id: PostId, target_id: i64) -> Self {
        Self {
            post_id,
            tag_id: target_id,
        }
    }

    fn post_id(&self) -> PostId {
        self.post_id
    }

    fn target_id(&self) -> i64 {
        self.tag_id
    }
}

impl BridgeLink for PostCategoryLink {
    const TABLE: &'static str = "posts_category";
    const TARGET_COLUMN: &'static str = "category_id";

    fn new(post_id: PostId, target_id: i64) -> Self {
        Self {
            post_id,
            category_id: target_id,
        }
    }

    fn post_id(&self) -> PostId {
        self.post_id
    }

    fn target_id(&self) -> i64 {
        self.category_id
    }
}

/// Builds de-duplicated bridge rows for one post, ordered by target id.
pub fn links_for_post<L: BridgeLink>(post_id: PostId, target_ids: &[i64]) -> Vec<L> {
    target_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|target_id| L::new(post_id, target_id))
        .collect()
}

/// Inserts all `links` with a single multi-row statement.
///
/// Returns the number of inserted rows; `0` without a round trip when
/// `links` is empty.
pub fn bulk_insert<L: BridgeLink>(
    db: &dyn Queryable,
    ctx: &ExecContext,
    links: &[L],
) -> RepoResult<usize> {
    if links.is_empty() {
        return Ok(0);
    }

    let sql = bulk_insert_sql::<L>(links.len());
    let values: Vec<i64> = links
        .iter()
        .flat_map(|link| [link.post_id(), link.target_id()])
        .collect();
    let bind_refs: Vec<&dyn ToSql> = values.iter().map(|value| value as &dyn ToSql).collect();

    let outcome = db.execute(ctx, &sql, &bind_refs)?;
    Ok(outcome.rows_affected)
}

/// Deletes every bridge row of `post_id` in `L`'s table.
pub fn delete_for_post<L: BridgeLink>(
    db: &dyn Queryable,
    ctx: &ExecContext,
    post_id: PostId,
) -> RepoResult<usize> {
    let sql = format!("DELETE FROM {} WHERE posts_id = ?1;", L::TABLE);
    let outcome = db.execute(ctx, &sql, params![post_id])?;
    Ok(outcome.rows_affected)
}

fn bulk_insert_sql<L: BridgeLink>(rows: usize) -> String {
    let placeholders = vec!["(?, ?)"; rows].join(", ");
    format!(
        "INSERT INTO {} (posts_id, {}) VALUES {};",
        L::TABLE,
        L::TARGET_COLUMN,
        placeholders
    )
}
