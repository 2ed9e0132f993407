//! Category repository contract and SQLite implementation.
//!
//! Mirrors the tag repository over the `category` table.

use super::taxonomy::{self, CATEGORIES};
use super::RepoResult;
use crate::db::{ExecContext, Queryable};
use crate::model::taxonomy::{Category, CategoryId};

/// Repository interface for category CRUD operations.
pub trait CategoryRepository {
    fn insert(&self, ctx: &ExecContext, title: &str) -> RepoResult<CategoryId>;
    fn update(&self, ctx: &ExecContext, category: &Category) -> RepoResult<()>;
    fn get(&self, ctx: &ExecContext, id: CategoryId) -> RepoResult<Category>;
    fn list_all(&self, ctx: &ExecContext) -> RepoResult<Vec<Category>>;
    fn soft_delete(&self, ctx: &ExecContext, id: CategoryId) -> RepoResult<()>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'q> {
    db: &'q dyn Queryable,
}

impl<'q> SqliteCategoryRepository<'q> {
    pub fn new(db: &'q dyn Queryable) -> Self {
        Self { db }
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn insert(&self, ctx: &ExecContext, title: &str) -> RepoResult<CategoryId> {
        taxonomy::insert(self.db, ctx, CATEGORIES, title)
    }

    fn update(&self, ctx: &ExecContext, category: &Category) -> RepoResult<()> {
        taxonomy::update(self.db, ctx, CATEGORIES, category.id, &category.title)
    }

    fn get(&self, ctx: &ExecContext, id: CategoryId) -> RepoResult<Category> {
        taxonomy::get(self.db, ctx, CATEGORIES, id).map(Category::from)
    }

    fn list_all(&self, ctx: &ExecContext) -> RepoResult<Vec<Category>> {
        let records = taxonomy::list_all(self.db, ctx, CATEGORIES)?;
        Ok(records.into_iter().map(Category::from).collect())
    }

    fn soft_delete(&self, ctx: &ExecContext, id: CategoryId) -> RepoResult<()> {
        taxonomy::soft_delete(self.db, ctx, CATEGORIES, id)
    }
}
