//! Shared SQL for the `tags` and `category` tables.
//!
//! Both tables have the same columns, so tag and category repositories
//! delegate here with their table descriptor.

use super::{RepoError, RepoResult};
use crate::db::{fetch_all, fetch_optional, ExecContext, Queryable};
use crate::model::slug::slugify;
use crate::model::taxonomy::{Category, Tag};
use rusqlite::{params, Row};

/// Table descriptor for one taxonomy kind.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TaxonomyTable {
    pub table: &'static str,
    pub entity: &'static str,
}

pub(crate) const TAGS: TaxonomyTable = TaxonomyTable {
    table: "tags",
    entity: "tag",
};

pub(crate) const CATEGORIES: TaxonomyTable = TaxonomyTable {
    table: "category",
    entity: "category",
};

/// Column-for-column row of a taxonomy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaxonomyRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl From<TaxonomyRecord> for Tag {
    fn from(record: TaxonomyRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            slug: record.slug,
            created_at: record.created_at,
            updated_at: record.updated_at,
            deleted_at: record.deleted_at,
        }
    }
}

impl From<TaxonomyRecord> for Category {
    fn from(record: TaxonomyRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            slug: record.slug,
            created_at: record.created_at,
            updated_at: record.updated_at,
            deleted_at: record.deleted_at,
        }
    }
}

pub(crate) fn insert(
    db: &dyn Queryable,
    ctx: &ExecContext,
    kind: TaxonomyTable,
    title: &str,
) -> RepoResult<i64> {
    let title = normalized_title(kind, title)?;
    let sql = format!("INSERT INTO {} (title, slug) VALUES (?1, ?2);", kind.table);
    let outcome = db.execute(ctx, &sql, params![title, slugify(title)])?;
    Ok(outcome.last_insert_id)
}

pub(crate) fn update(
    db: &dyn Queryable,
    ctx: &ExecContext,
    kind: TaxonomyTable,
    id: i64,
    title: &str,
) -> RepoResult<()> {
    let title = normalized_title(kind, title)?;
    let sql = format!(
        "UPDATE {}
         SET
            title = ?2,
            slug = ?3,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND deleted_at IS NULL;",
        kind.table
    );
    let outcome = db.execute(ctx, &sql, params![id, title, slugify(title)])?;
    if outcome.rows_affected == 0 {
        return Err(RepoError::not_found(kind.entity, id));
    }
    Ok(())
}

pub(crate) fn get(
    db: &dyn Queryable,
    ctx: &ExecContext,
    kind: TaxonomyTable,
    id: i64,
) -> RepoResult<TaxonomyRecord> {
    let sql = format!(
        "{} WHERE id = ?1 AND deleted_at IS NULL;",
        select_sql(kind)
    );
    fetch_optional(db, ctx, &sql, params![id], parse_taxonomy_row)?
        .ok_or_else(|| RepoError::not_found(kind.entity, id))
}

pub(crate) fn list_all(
    db: &dyn Queryable,
    ctx: &ExecContext,
    kind: TaxonomyTable,
) -> RepoResult<Vec<TaxonomyRecord>> {
    let sql = format!(
        "{} WHERE deleted_at IS NULL ORDER BY title COLLATE NOCASE ASC, id ASC;",
        select_sql(kind)
    );
    Ok(fetch_all(db, ctx, &sql, params![], parse_taxonomy_row)?)
}

pub(crate) fn soft_delete(
    db: &dyn Queryable,
    ctx: &ExecContext,
    kind: TaxonomyTable,
    id: i64,
) -> RepoResult<()> {
    let sql = format!(
        "UPDATE {}
         SET
            deleted_at = (strftime('%s', 'now') * 1000),
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND deleted_at IS NULL;",
        kind.table
    );
    let outcome = db.execute(ctx, &sql, params![id])?;
    if outcome.rows_affected == 0 {
        return Err(RepoError::RowsNotAffected {
            entity: kind.entity,
            id,
        });
    }
    Ok(())
}

fn select_sql(kind: TaxonomyTable) -> String {
    format!(
        "SELECT
            id,
            title,
            slug,
            created_at,
            updated_at,
            deleted_at
         FROM {}",
        kind.table
    )
}

fn parse_taxonomy_row(row: &Row<'_>) -> rusqlite::Result<TaxonomyRecord> {
    Ok(TaxonomyRecord {
        id: row.get("id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn normalized_title(kind: TaxonomyTable, title: &str) -> RepoResult<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "{} title cannot be empty",
            kind.entity
        )));
    }
    Ok(trimmed)
}
