//! Batched persistence.
//!
//! A batch is an ordered list of [`BatchCommand`]s. Execution runs in two
//! passes:
//!
//! 1. every command queues its [`Statement`] before anything is sent;
//! 2. the statements are sent back-to-back on one pooled connection, then each
//!    command reads its own result slot, in queue order.
//!
//! The result of [`BatchExecutor::perform`] has exactly one entry per command.
//! A failing statement or a failing decode never stops the remaining commands
//! from reading their slots.
//!
//! No transaction is opened. A constraint violation in one statement does not
//! roll back its siblings, so callers must not rely on atomicity across the
//! commands of one batch.

use std::time::Duration;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use tracing::{debug, warn};

use crate::error::StorageError;

pub type PgQuery = Query<'static, Postgres, PgArguments>;

/// A parameterized statement queued by a command.
pub enum Statement {
    /// Row-returning statement; all rows are collected.
    Fetch(PgQuery),
    /// Statement whose affected-row count is the result.
    Execute(PgQuery),
}

#[derive(Debug)]
pub enum BatchOutput {
    Rows(Vec<PgRow>),
    Affected(u64),
}

impl BatchOutput {
    /// The first returned row.
    ///
    /// Zero rows is reported as [`sqlx::Error::RowNotFound`], which
    /// classifies as not-found.
    pub fn one_row(self) -> Result<PgRow, StorageError> {
        match self {
            BatchOutput::Rows(rows) => rows
                .into_iter()
                .next()
                .ok_or_else(|| sqlx::Error::RowNotFound.into()),
            BatchOutput::Affected(_) => Err(sqlx::Error::RowNotFound.into()),
        }
    }

    pub fn rows(self) -> Vec<PgRow> {
        match self {
            BatchOutput::Rows(rows) => rows,
            BatchOutput::Affected(_) => Vec::new(),
        }
    }

    pub fn affected(&self) -> u64 {
        match self {
            BatchOutput::Rows(rows) => rows.len() as u64,
            BatchOutput::Affected(n) => *n,
        }
    }
}

/// The result slot handed to a command's decode step.
pub type BatchSlot = Result<BatchOutput, StorageError>;

/// One operation of a batch.
pub trait BatchCommand: Send {
    /// Builds the statement this command contributes to the batch.
    fn queue(&self) -> Statement;

    /// Consumes this command's result slot.
    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError>;
}

/// Sends batches over the shared pool under a deadline.
#[derive(Clone, Debug)]
pub struct BatchExecutor {
    pool: PgPool,
    deadline: Duration,
}

impl BatchExecutor {
    pub fn new(pool: PgPool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }

    /// Runs `commands` as one batch.
    ///
    /// When the deadline elapses, or no connection can be acquired in time,
    /// every slot reports [`StorageError::Cancelled`]. Statements that already
    /// reached the server before that may have been applied.
    pub async fn perform(
        &self,
        commands: &mut [&mut dyn BatchCommand],
    ) -> Vec<Result<(), StorageError>> {
        let statements: Vec<Statement> = commands.iter().map(|c| c.queue()).collect();
        let count = statements.len();

        let slots = match tokio::time::timeout(self.deadline, self.send(statements)).await {
            Ok(Ok(slots)) => slots,
            Ok(Err(err)) => {
                let err = StorageError::from(err);
                (0..count).map(|_| Err(err.clone())).collect()
            }
            Err(_) => {
                warn!(
                    statements = count,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Batch deadline elapsed"
                );
                (0..count).map(|_| Err(StorageError::Cancelled)).collect()
            }
        };

        distribute(commands, slots)
    }

    /// Runs a batch of one command.
    pub async fn perform_one(&self, command: &mut dyn BatchCommand) -> Result<(), StorageError> {
        let mut commands = [command];
        self.perform(&mut commands)
            .await
            .into_iter()
            .next()
            .unwrap_or(Err(StorageError::Cancelled))
    }

    async fn send(&self, statements: Vec<Statement>) -> Result<Vec<BatchSlot>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        let mut slots = Vec::with_capacity(statements.len());

        for statement in statements {
            let slot = match statement {
                Statement::Fetch(query) => query.fetch_all(&mut *conn).await.map(BatchOutput::Rows),
                Statement::Execute(query) => query
                    .execute(&mut *conn)
                    .await
                    .map(|done| BatchOutput::Affected(done.rows_affected())),
            };
            slots.push(slot.map_err(StorageError::from));
        }

        debug!(statements = slots.len(), "Batch sent");
        Ok(slots)
    }
}

/// Hands each slot to its command, in order.
///
/// Every command's decode step runs regardless of earlier failures. A command
/// without a matching slot reads [`StorageError::Cancelled`].
pub fn distribute(
    commands: &mut [&mut dyn BatchCommand],
    slots: Vec<BatchSlot>,
) -> Vec<Result<(), StorageError>> {
    let mut slots = slots.into_iter();
    commands
        .iter_mut()
        .map(|command| {
            let slot = slots.next().unwrap_or(Err(StorageError::Cancelled));
            command.read(slot)
        })
        .collect()
}
