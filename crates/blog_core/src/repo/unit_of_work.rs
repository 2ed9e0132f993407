//! Unit-of-work runner.
//!
//! # Responsibility
//! - Open one transaction, bind a full [`Repository`] set to it, run the
//!   caller's work and commit or roll back atomically.
//!
//! # Invariants
//! - Exactly one transaction is open for the lifetime of a call.
//! - Running on an executor that already is a transaction fails immediately
//!   with `RepoError::NestedTransaction`.
//! - A rollback failure never hides the work error; both are returned.
//! - The context is checked right before `COMMIT`; a committed transaction is
//!   always reported as success.

use super::{RepoError, RepoResult, Repository};
use crate::db::{ExecContext, Queryable};
use log::{debug, warn};
use rusqlite::{Transaction, TransactionBehavior};

/// Runs `work` inside one transaction opened on `db`.
pub fn run_in_transaction<T>(
    db: &dyn Queryable,
    ctx: &ExecContext,
    work: impl FnOnce(&Repository<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let Some(conn) = db.transactable() else {
        return Err(RepoError::NestedTransaction);
    };
    ctx.check()?;

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    debug!("event=tx_begin module=repo status=ok");

    let outcome = {
        let repository = Repository::new(&tx);
        work(&repository).and_then(|value| {
            ctx.check()?;
            Ok(value)
        })
    };

    match outcome {
        Ok(value) => {
            tx.commit()?;
            debug!("event=tx_commit module=repo status=ok");
            Ok(value)
        }
        Err(err) => match tx.rollback() {
            Ok(()) => {
                debug!("event=tx_rollback module=repo status=ok cause={err}");
                Err(err)
            }
            Err(rollback_err) => {
                warn!(
                    "event=tx_rollback module=repo status=error cause={} error={}",
                    err, rollback_err
                );
                Err(RepoError::Rollback {
                    source: Box::new(err),
                    rollback: rollback_err.into(),
                })
            }
        },
    }
}
