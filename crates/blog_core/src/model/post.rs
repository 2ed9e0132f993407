//! Post aggregate model.
//!
//! # Responsibility
//! - Define the post row plus its hydrated tag/category lists.
//! - Encode the create-vs-update decision in the id.
//!
//! # Invariants
//! - `id == 0` means "not yet persisted"; a positive id means "update".
//! - `tags`/`categories` are never persisted as columns and, once hydrated,
//!   contain no duplicate entity by id.

use crate::model::taxonomy::{Category, Tag};
use serde::{Deserialize, Serialize};

pub type PostId = i64;

/// Blog post together with its derived associations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: i64,
    pub title: String,
    /// Markdown body.
    pub content: String,
    pub keyword: String,
    pub slug: String,
    pub r#abstract: String,
    /// Asset id of the cover image, if any.
    pub cover_id: Option<i64>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Lifecycle state derived from the post id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// `id == 0`: insert a new row.
    New,
    /// `id > 0`: update the existing row.
    Existing,
}

impl Post {
    /// Unsaved post with the required core fields.
    pub fn new(author_id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author_id,
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn save_mode(&self) -> SaveMode {
        if self.id == 0 {
            SaveMode::New
        } else {
            SaveMode::Existing
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn tag_ids(&self) -> Vec<i64> {
        self.tags.iter().map(|tag| tag.id).collect()
    }

    pub fn category_ids(&self) -> Vec<i64> {
        self.categories.iter().map(|category| category.id).collect()
    }
}
