//! Post use-case service.
//!
//! # Responsibility
//! - Turn create/update requests into post aggregates and save them.
//! - Derive missing slug/abstract values from title/content.
//! - Classify every repository failure before it leaves the core.
//!
//! # Invariants
//! - Update requests replace tag/category sets; omitted ids are removed.
//! - Update keeps the stored title/content when the request leaves them
//!   blank.
//! - Callers only ever see [`AppError`], never raw store errors.

use crate::db::ExecContext;
use crate::error::{classify, AppError};
use crate::model::post::{Post, PostId};
use crate::model::slug::slugify;
use crate::model::taxonomy::{CategoryId, TagId};
use crate::repo::filter::{Filters, Metadata, POST_SORT_SAFE_FIELDS};
use crate::repo::{PostRepository, RepoError};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const ABSTRACT_MAX_CHARS: usize = 120;

static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\*_`#>~\-\[\]\(\)!]+"#).expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Request payload for creating a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewPostRequest {
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub keyword: String,
    pub slug: String,
    pub r#abstract: String,
    pub cover_id: Option<i64>,
    pub tag_ids: Vec<TagId>,
    pub category_ids: Vec<CategoryId>,
}

/// Request payload for updating a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdatePostRequest {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub keyword: String,
    pub slug: String,
    pub r#abstract: String,
    pub cover_id: Option<i64>,
    pub tag_ids: Vec<TagId>,
    pub category_ids: Vec<CategoryId>,
}

/// One page of posts plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPage {
    pub meta: Metadata,
    pub list: Vec<Post>,
}

/// Post service facade over repository implementations.
pub struct PostService<R: PostRepository> {
    repo: R,
}

impl<R: PostRepository> PostService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a post with its tags and categories; returns the new id.
    pub fn create_post(&self, ctx: &ExecContext, req: NewPostRequest) -> Result<PostId, AppError> {
        let mut post = Post::new(req.author_id, req.title, req.content);
        post.keyword = req.keyword;
        post.slug = req.slug;
        post.r#abstract = req.r#abstract;
        post.cover_id = req.cover_id;
        fill_derived_fields(&mut post);

        let post_id = self
            .repo
            .save(ctx, &post, &req.tag_ids, &req.category_ids)
            .map_err(|err| fail("post_create", err))?;
        info!("event=post_create module=service status=ok post_id={post_id}");
        Ok(post_id)
    }

    /// Updates a post and replaces its tags and categories.
    pub fn update_post(&self, ctx: &ExecContext, req: UpdatePostRequest) -> Result<(), AppError> {
        let mut post = self
            .repo
            .get(ctx, req.id)
            .map_err(|err| fail("post_update", err))?;

        if !req.title.trim().is_empty() {
            post.title = req.title;
        }
        if !req.content.trim().is_empty() {
            post.content = req.content;
        }
        post.keyword = req.keyword;
        post.slug = req.slug;
        post.r#abstract = req.r#abstract;
        post.cover_id = req.cover_id;
        fill_derived_fields(&mut post);

        self.repo
            .save(ctx, &post, &req.tag_ids, &req.category_ids)
            .map_err(|err| fail("post_update", err))?;
        info!("event=post_update module=service status=ok post_id={}", post.id);
        Ok(())
    }

    pub fn get_post(&self, ctx: &ExecContext, id: PostId) -> Result<Post, AppError> {
        self.repo.get(ctx, id).map_err(|err| fail("post_get", err))
    }

    /// Gets one post with its tags and categories.
    pub fn get_post_detail(&self, ctx: &ExecContext, id: PostId) -> Result<Post, AppError> {
        self.repo
            .get_detail(ctx, id)
            .map_err(|err| fail("post_detail", err))
    }

    /// Lists posts; `sort` entries outside the post allow-list are ignored.
    pub fn list_posts<S: AsRef<str>>(
        &self,
        ctx: &ExecContext,
        page: i64,
        page_size: i64,
        sort: &[S],
    ) -> Result<PostPage, AppError> {
        let filters = Filters::new(page, page_size).with_sort(sort, POST_SORT_SAFE_FIELDS);
        let (list, meta) = self
            .repo
            .list(ctx, &filters)
            .map_err(|err| fail("post_list", err))?;
        Ok(PostPage { meta, list })
    }

    pub fn list_posts_by_category(
        &self,
        ctx: &ExecContext,
        category_id: CategoryId,
        page: i64,
        page_size: i64,
    ) -> Result<PostPage, AppError> {
        let filters = Filters::new(page, page_size);
        let (list, meta) = self
            .repo
            .list_by_category(ctx, category_id, &filters)
            .map_err(|err| fail("post_list_by_category", err))?;
        Ok(PostPage { meta, list })
    }

    pub fn list_posts_by_tag(
        &self,
        ctx: &ExecContext,
        tag_id: TagId,
        page: i64,
        page_size: i64,
    ) -> Result<PostPage, AppError> {
        let filters = Filters::new(page, page_size);
        let (list, meta) = self
            .repo
            .list_by_tag(ctx, tag_id, &filters)
            .map_err(|err| fail("post_list_by_tag", err))?;
        Ok(PostPage { meta, list })
    }

    /// Soft-deletes a post; its rows stay in storage.
    pub fn delete_post(&self, ctx: &ExecContext, id: PostId) -> Result<(), AppError> {
        self.repo
            .soft_delete(ctx, id)
            .map_err(|err| fail("post_delete", err))
    }
}

/// Derives a plain-text abstract from markdown content.
///
/// Images are dropped, links keep their label, markdown symbols are removed
/// and whitespace is collapsed. At most 120 chars are kept.
pub fn derive_abstract(content: &str) -> String {
    let without_images = MARKDOWN_IMAGE_RE.replace_all(content, " ");
    let without_links = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_links, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_symbols, " ");
    normalized.trim().chars().take(ABSTRACT_MAX_CHARS).collect()
}

fn fill_derived_fields(post: &mut Post) {
    if post.slug.trim().is_empty() {
        post.slug = slugify(&post.title);
    }
    if post.r#abstract.trim().is_empty() {
        post.r#abstract = derive_abstract(&post.content);
    }
}

pub(crate) fn fail(event: &str, err: RepoError) -> AppError {
    let classified = classify(err);
    error!(
        "event={} module=service status=error kind={} error={}",
        event,
        classified.kind(),
        classified
    );
    classified
}
