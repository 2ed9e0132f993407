//! Tag and category use-case services.
//!
//! # Responsibility
//! - Expose create/update/delete/list/get for tags and categories.
//! - Classify repository failures, so a duplicate title reaches callers as
//!   "tag already exists" or "category already exists".

use super::post_service::fail;
use crate::db::ExecContext;
use crate::error::AppError;
use crate::model::taxonomy::{Category, CategoryId, Tag, TagId};
use crate::repo::{CategoryRepository, TagRepository};
use log::info;

/// Tag service facade.
pub struct TagService<R: TagRepository> {
    repo: R,
}

impl<R: TagRepository> TagService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_tag(&self, ctx: &ExecContext, title: &str) -> Result<TagId, AppError> {
        let id = self
            .repo
            .insert(ctx, title)
            .map_err(|err| fail("tag_create", err))?;
        info!("event=tag_create module=service status=ok tag_id={id}");
        Ok(id)
    }

    /// Renames a tag; the slug follows the new title.
    pub fn update_tag(&self, ctx: &ExecContext, id: TagId, title: &str) -> Result<(), AppError> {
        let tag = Tag {
            id,
            title: title.to_string(),
            ..Tag::default()
        };
        self.repo
            .update(ctx, &tag)
            .map_err(|err| fail("tag_update", err))
    }

    pub fn get_tag(&self, ctx: &ExecContext, id: TagId) -> Result<Tag, AppError> {
        self.repo.get(ctx, id).map_err(|err| fail("tag_get", err))
    }

    pub fn list_tags(&self, ctx: &ExecContext) -> Result<Vec<Tag>, AppError> {
        self.repo
            .list_all(ctx)
            .map_err(|err| fail("tag_list", err))
    }

    pub fn delete_tag(&self, ctx: &ExecContext, id: TagId) -> Result<(), AppError> {
        self.repo
            .soft_delete(ctx, id)
            .map_err(|err| fail("tag_delete", err))
    }
}

/// Category service facade.
pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_category(&self, ctx: &ExecContext, title: &str) -> Result<CategoryId, AppError> {
        let id = self
            .repo
            .insert(ctx, title)
            .map_err(|err| fail("category_create", err))?;
        info!("event=category_create module=service status=ok category_id={id}");
        Ok(id)
    }

    pub fn update_category(
        &self,
        ctx: &ExecContext,
        id: CategoryId,
        title: &str,
    ) -> Result<(), AppError> {
        let category = Category {
            id,
            title: title.to_string(),
            ..Category::default()
        };
        self.repo
            .update(ctx, &category)
            .map_err(|err| fail("category_update", err))
    }

    pub fn get_category(&self, ctx: &ExecContext, id: CategoryId) -> Result<Category, AppError> {
        self.repo
            .get(ctx, id)
            .map_err(|err| fail("category_get", err))
    }

    pub fn list_categories(&self, ctx: &ExecContext) -> Result<Vec<Category>, AppError> {
        self.repo
            .list_all(ctx)
            .map_err(|err| fail("category_list", err))
    }

    pub fn delete_category(&self, ctx: &ExecContext, id: CategoryId) -> Result<(), AppError> {
        self.repo
            .soft_delete(ctx, id)
            .map_err(|err| fail("category_delete", err))
    }
}
