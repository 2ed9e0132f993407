//! Tag and category entities.
//!
//! Both participate in a many-to-many relationship with posts through
//! dedicated bridge tables and share the same column shape.

use serde::{Deserialize, Serialize};

pub type TagId = i64;
pub type CategoryId = i64;

/// Free-form label attached to posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub title: String,
    pub slug: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
    /// Soft delete tombstone, epoch milliseconds.
    pub deleted_at: Option<i64>,
}

/// Editorial grouping attached to posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl Tag {
    /// Unsaved tag carrying only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

impl Category {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
