//! Tag repository contract and SQLite implementation.
//!
//! # Invariants
//! - `tags.title` is unique; duplicates surface as a constraint failure that
//!   the classifier turns into "tag already exists".
//! - Slugs are derived from titles on every write.

use super::taxonomy::{self, TAGS};
use super::RepoResult;
use crate::db::{ExecContext, Queryable};
use crate::model::taxonomy::{Tag, TagId};

/// Repository interface for tag CRUD operations.
pub trait TagRepository {
    fn insert(&self, ctx: &ExecContext, title: &str) -> RepoResult<TagId>;
    fn update(&self, ctx: &ExecContext, tag: &Tag) -> RepoResult<()>;
    fn get(&self, ctx: &ExecContext, id: TagId) -> RepoResult<Tag>;
    fn list_all(&self, ctx: &ExecContext) -> RepoResult<Vec<Tag>>;
    fn soft_delete(&self, ctx: &ExecContext, id: TagId) -> RepoResult<()>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'q> {
    db: &'q dyn Queryable,
}

impl<'q> SqliteTagRepository<'q> {
    pub fn new(db: &'q dyn Queryable) -> Self {
        Self { db }
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn insert(&self, ctx: &ExecContext, title: &str) -> RepoResult<TagId> {
        taxonomy::insert(self.db, ctx, TAGS, title)
    }

    fn update(&self, ctx: &ExecContext, tag: &Tag) -> RepoResult<()> {
        taxonomy::update(self.db, ctx, TAGS, tag.id, &tag.title)
    }

    fn get(&self, ctx: &ExecContext, id: TagId) -> RepoResult<Tag> {
        taxonomy::get(self.db, ctx, TAGS, id).map(Tag::from)
    }

    fn list_all(&self, ctx: &ExecContext) -> RepoResult<Vec<Tag>> {
        let records = taxonomy::list_all(self.db, ctx, TAGS)?;
        Ok(records.into_iter().map(Tag::from).collect())
    }

    fn soft_delete(&self, ctx: &ExecContext, id: TagId) -> RepoResult<()> {
        taxonomy::soft_delete(self.db, ctx, TAGS, id)
    }
}
