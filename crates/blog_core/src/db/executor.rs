//! Query executor capability shared by connections and transactions.
//!
//! # Responsibility
//! - Offer parameterized execute, row iteration and single/multi-row fetch.
//! - Make repository code agnostic to whether it runs inside a transaction.
//!
//! # Invariants
//! - `Connection` and `Transaction` expose the identical operation set.
//! - Only a direct connection is transactable; a transaction never nests.
//! - Store errors are returned as-is, never interpreted here.

use super::{DbResult, ExecContext};
use rusqlite::types::ToSql;
use rusqlite::{Connection, Row, Transaction};

/// Result of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: usize,
    /// Rowid of the most recent successful insert on this connection.
    pub last_insert_id: i64,
}

/// Executor capability implemented by both a connection and a transaction.
pub trait Queryable {
    /// Runs one parameterized statement.
    fn execute(&self, ctx: &ExecContext, sql: &str, params: &[&dyn ToSql])
        -> DbResult<ExecOutcome>;

    /// Runs one parameterized query and hands every row to `on_row`.
    fn for_each_row(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: &[&dyn ToSql],
        on_row: &mut dyn FnMut(&Row<'_>) -> rusqlite::Result<()>,
    ) -> DbResult<()>;

    /// Returns the connection a new transaction can be opened on.
    ///
    /// `None` means this executor already is a transaction.
    fn transactable(&self) -> Option<&Connection>;
}

impl Queryable for Connection {
    fn execute(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> DbResult<ExecOutcome> {
        execute_on(self, ctx, sql, params)
    }

    fn for_each_row(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: &[&dyn ToSql],
        on_row: &mut dyn FnMut(&Row<'_>) -> rusqlite::Result<()>,
    ) -> DbResult<()> {
        for_each_row_on(self, ctx, sql, params, on_row)
    }

    fn transactable(&self) -> Option<&Connection> {
        Some(self)
    }
}

impl Queryable for Transaction<'_> {
    fn execute(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> DbResult<ExecOutcome> {
        execute_on(self, ctx, sql, params)
    }

    fn for_each_row(
        &self,
        ctx: &ExecContext,
        sql: &str,
        params: &[&dyn ToSql],
        on_row: &mut dyn FnMut(&Row<'_>) -> rusqlite::Result<()>,
    ) -> DbResult<()> {
        for_each_row_on(self, ctx, sql, params, on_row)
    }

    fn transactable(&self) -> Option<&Connection> {
        None
    }
}

/// Fetches exactly one row; no row is reported as `QueryReturnedNoRows`.
pub fn fetch_one<T>(
    db: &dyn Queryable,
    ctx: &ExecContext,
    sql: &str,
    params: &[&dyn ToSql],
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> DbResult<T> {
    fetch_optional(db, ctx, sql, params, map)?
        .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
}

/// Fetches the first row, if any.
pub fn fetch_optional<T>(
    db: &dyn Queryable,
    ctx: &ExecContext,
    sql: &str,
    params: &[&dyn ToSql],
    mut map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> DbResult<Option<T>> {
    let mut found = None;
    db.for_each_row(ctx, sql, params, &mut |row| {
        if found.is_none() {
            found = Some(map(row)?);
        }
        Ok(())
    })?;
    Ok(found)
}

/// Fetches every row in statement order.
pub fn fetch_all<T>(
    db: &dyn Queryable,
    ctx: &ExecContext,
    sql: &str,
    params: &[&dyn ToSql],
    mut map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> DbResult<Vec<T>> {
    let mut items = Vec::new();
    db.for_each_row(ctx, sql, params, &mut |row| {
        items.push(map(row)?);
        Ok(())
    })?;
    Ok(items)
}

fn execute_on(
    conn: &Connection,
    ctx: &ExecContext,
    sql: &str,
    params: &[&dyn ToSql],
) -> DbResult<ExecOutcome> {
    ctx.check()?;
    let mut stmt = conn.prepare_cached(sql)?;
    let rows_affected = stmt.execute(params)?;
    Ok(ExecOutcome {
        rows_affected,
        last_insert_id: conn.last_insert_rowid(),
    })
}

fn for_each_row_on(
    conn: &Connection,
    ctx: &ExecContext,
    sql: &str,
    params: &[&dyn ToSql],
    on_row: &mut dyn FnMut(&Row<'_>) -> rusqlite::Result<()>,
) -> DbResult<()> {
    ctx.check()?;
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query(params)?;
    while let Some(row) = rows.next()? {
        ctx.check()?;
        on_row(row)?;
    }
    Ok(())
}
