//! Reagent instances: physical containers of a reagent placed in a storage
//! cell.
//!
//! Placing or moving an instance is a two-statement batch: a
//! [`TryCreateCell`] making sure the target cell exists, then the instance
//! write resolving that cell by storage and number. When the cell cannot be
//! created the write finds no cell and reports not-found, so callers inspect
//! the slots in order and report the first failure.
//!
//! [`TryCreateCell`]: crate::storages::TryCreateCell

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use crate::batch::{BatchCommand, BatchSlot, Statement};
use crate::error::StorageError;

macro_rules! instance_columns {
    () => {
        "i.id, i.created_at, i.updated_at, i.reagent, i.expires_at, i.used_at, \
         c.storage, s.name AS storage_name, c.number AS cell"
    };
}

macro_rules! instance_joins {
    () => {
        " JOIN storage_cell c ON c.id = i.cell JOIN storage s ON s.id = c.storage"
    };
}

/// An instance together with where it is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ReagentInstance {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reagent: Uuid,
    pub expires_at: NaiveDate,
    pub used_at: Option<DateTime<Utc>>,
    pub storage: Uuid,
    pub storage_name: String,
    pub cell: i16,
}

impl ReagentInstance {
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }
}

fn decode_instance(slot: BatchSlot) -> Result<ReagentInstance, StorageError> {
    let row = slot?.one_row()?;
    Ok(ReagentInstance::from_row(&row)?)
}

/// Places a new instance of `reagent` into cell `cell` of `storage`.
///
/// Not-found when the reagent or the cell does not exist.
#[derive(Debug)]
pub struct CreateInstance {
    reagent: Uuid,
    expires_at: NaiveDate,
    storage: Uuid,
    cell: i16,
    pub instance: Option<ReagentInstance>,
}

impl CreateInstance {
    pub fn new(reagent: Uuid, expires_at: NaiveDate, storage: Uuid, cell: i16) -> Self {
        Self {
            reagent,
            expires_at,
            storage,
            cell,
            instance: None,
        }
    }
}

impl BatchCommand for CreateInstance {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "WITH i AS (",
                "INSERT INTO reagent_instance (reagent, expires_at, cell) ",
                "SELECT r.id, $2, c.id FROM reagent r ",
                "JOIN storage_cell c ON c.storage = $3 AND c.number = $4 ",
                "WHERE r.id = $1 ",
                "RETURNING id, created_at, updated_at, reagent, expires_at, used_at, cell",
                ") SELECT ",
                instance_columns!(),
                " FROM i",
                instance_joins!()
            ))
            .bind(self.reagent)
            .bind(self.expires_at)
            .bind(self.storage)
            .bind(self.cell),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.instance = Some(decode_instance(slot)?);
        Ok(())
    }
}

/// Fetches one instance of a reagent; both ids are cast by the database.
#[derive(Debug, Default)]
pub struct GetInstance {
    reagent: String,
    id: String,
    pub instance: Option<ReagentInstance>,
}

impl GetInstance {
    pub fn new(reagent: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            reagent: reagent.into(),
            id: id.into(),
            instance: None,
        }
    }
}

impl BatchCommand for GetInstance {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "SELECT ",
                instance_columns!(),
                " FROM reagent_instance i",
                instance_joins!(),
                " WHERE i.id = $1::uuid AND i.reagent = $2::uuid"
            ))
            .bind(self.id.clone())
            .bind(self.reagent.clone()),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.instance = Some(decode_instance(slot)?);
        Ok(())
    }
}

/// Every instance of a reagent, soonest expiry first.
#[derive(Debug)]
pub struct InstancesOfReagent {
    reagent: String,
    pub instances: Vec<ReagentInstance>,
}

impl InstancesOfReagent {
    pub fn new(reagent: impl Into<String>) -> Self {
        Self {
            reagent: reagent.into(),
            instances: Vec::new(),
        }
    }
}

impl BatchCommand for InstancesOfReagent {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "SELECT ",
                instance_columns!(),
                " FROM reagent_instance i",
                instance_joins!(),
                " WHERE i.reagent = $1::uuid ORDER BY i.expires_at, i.created_at"
            ))
            .bind(self.reagent.clone()),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.instances = slot?
            .rows()
            .iter()
            .map(ReagentInstance::from_row)
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseOutcome {
    Used(DateTime<Utc>),
    /// The instance had been used up before; carries the original time.
    AlreadyUsed(DateTime<Utc>),
}

/// Marks an instance as used up. Using it twice keeps the first time.
#[derive(Debug)]
pub struct UseInstance {
    reagent: Uuid,
    id: Uuid,
    pub outcome: Option<UseOutcome>,
}

impl UseInstance {
    pub fn new(reagent: Uuid, id: Uuid) -> Self {
        Self {
            reagent,
            id,
            outcome: None,
        }
    }
}

impl BatchCommand for UseInstance {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "WITH target AS (",
                "SELECT id, used_at FROM reagent_instance ",
                "WHERE id = $1 AND reagent = $2 FOR UPDATE",
                "), marked AS (",
                "UPDATE reagent_instance i SET used_at = NOW(), updated_at = NOW() ",
                "FROM target WHERE i.id = target.id AND target.used_at IS NULL ",
                "RETURNING i.used_at",
                ") SELECT target.used_at AS previous, ",
                "(SELECT used_at FROM marked) AS used_at FROM target"
            ))
            .bind(self.id)
            .bind(self.reagent),
        )
    }

    /// # Panics
    ///
    /// Panics if the instance was neither used before nor marked now.
    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        let row = slot?.one_row()?;
        let previous: Option<DateTime<Utc>> = row.try_get("previous")?;
        let used_at: Option<DateTime<Utc>> = row.try_get("used_at")?;

        self.outcome = Some(match (used_at, previous) {
            (Some(at), _) => UseOutcome::Used(at),
            (None, Some(at)) => UseOutcome::AlreadyUsed(at),
            (None, None) => panic!("reagent instance {} was not marked as used", self.id),
        });
        Ok(())
    }
}

/// Moves an instance that is still in use to cell `cell` of `storage`.
///
/// Not-found when the instance is missing or used up, or the cell does not
/// exist.
#[derive(Debug)]
pub struct TransferInstance {
    reagent: Uuid,
    id: Uuid,
    storage: Uuid,
    cell: i16,
}

impl TransferInstance {
    pub fn new(reagent: Uuid, id: Uuid, storage: Uuid, cell: i16) -> Self {
        Self {
            reagent,
            id,
            storage,
            cell,
        }
    }
}

impl BatchCommand for TransferInstance {
    fn queue(&self) -> Statement {
        Statement::Execute(
            sqlx::query(concat!(
                "UPDATE reagent_instance i SET cell = c.id, updated_at = NOW() ",
                "FROM storage_cell c ",
                "WHERE i.id = $1 AND i.reagent = $2 AND i.used_at IS NULL ",
                "AND c.storage = $3 AND c.number = $4"
            ))
            .bind(self.id)
            .bind(self.reagent)
            .bind(self.storage)
            .bind(self.cell),
        )
    }

    /// # Panics
    ///
    /// Panics if more than one row was updated.
    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        match slot?.affected() {
            0 => Err(sqlx::Error::RowNotFound.into()),
            1 => Ok(()),
            n => panic!("transfer of reagent instance {} touched {} rows", self.id, n),
        }
    }
}
