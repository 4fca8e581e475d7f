//! Reagents: the catalogue of substances kept in storage.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use chemstore_core::FieldLabels;

use crate::batch::{BatchCommand, BatchSlot, Statement};
use crate::error::StorageError;
use crate::users::prefix_pattern;

/// Page size of [`ReagentsRange`].
pub const REAGENTS_PAGE_SIZE: i64 = 24;

macro_rules! reagent_columns {
    () => {
        "id, created_at, updated_at, name, formula"
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Reagent {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub formula: String,
}

impl FieldLabels for Reagent {
    fn field_label(field: &str) -> Option<&'static str> {
        match field {
            "Name" => Some("назва"),
            "Formula" => Some("формула"),
            _ => None,
        }
    }
}

fn decode_reagent(slot: BatchSlot) -> Result<Reagent, StorageError> {
    let row = slot?.one_row()?;
    Ok(Reagent::from_row(&row)?)
}

/// Inserts a reagent. A duplicate name is a unique violation.
#[derive(Debug)]
pub struct CreateReagent {
    name: String,
    formula: String,
    pub reagent: Option<Reagent>,
}

impl CreateReagent {
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
            reagent: None,
        }
    }
}

impl BatchCommand for CreateReagent {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "INSERT INTO reagent (name, formula) VALUES ($1, $2) RETURNING ",
                reagent_columns!()
            ))
            .bind(self.name.clone())
            .bind(self.formula.clone()),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.reagent = Some(decode_reagent(slot)?);
        Ok(())
    }
}

/// Fetches a reagent by id, cast by the database.
#[derive(Debug, Default)]
pub struct GetReagent {
    id: String,
    pub reagent: Option<Reagent>,
}

impl GetReagent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reagent: None,
        }
    }
}

impl BatchCommand for GetReagent {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "SELECT ",
                reagent_columns!(),
                " FROM reagent WHERE id = $1::uuid"
            ))
            .bind(self.id.clone()),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.reagent = Some(decode_reagent(slot)?);
        Ok(())
    }
}

/// Renames a reagent or corrects its formula, returning the stored record.
#[derive(Debug)]
pub struct UpdateReagent {
    id: Uuid,
    name: String,
    formula: String,
    pub reagent: Option<Reagent>,
}

impl UpdateReagent {
    pub fn new(id: Uuid, name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            formula: formula.into(),
            reagent: None,
        }
    }
}

impl BatchCommand for UpdateReagent {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "UPDATE reagent SET name = $2, formula = $3, updated_at = NOW() ",
                "WHERE id = $1 RETURNING ",
                reagent_columns!()
            ))
            .bind(self.id)
            .bind(self.name.clone())
            .bind(self.formula.clone()),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.reagent = Some(decode_reagent(slot)?);
        Ok(())
    }
}

/// Up to [`REAGENTS_PAGE_SIZE`] reagents whose name or formula starts with
/// `search`, newest first.
#[derive(Debug)]
pub struct ReagentsRange {
    search: String,
    offset: i64,
    pub reagents: Vec<Reagent>,
}

impl ReagentsRange {
    pub fn new(search: impl Into<String>, offset: i64) -> Self {
        Self {
            search: search.into(),
            offset: offset.max(0),
            reagents: Vec::new(),
        }
    }

    pub fn next_offset(&self) -> Option<i64> {
        (self.reagents.len() as i64 == REAGENTS_PAGE_SIZE).then(|| self.offset + REAGENTS_PAGE_SIZE)
    }
}

impl BatchCommand for ReagentsRange {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "SELECT ",
                reagent_columns!(),
                " FROM reagent WHERE name ILIKE $1 ESCAPE '\\' OR formula ILIKE $1 ESCAPE '\\' ",
                "ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
            ))
            .bind(prefix_pattern(&self.search))
            .bind(REAGENTS_PAGE_SIZE)
            .bind(self.offset),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.reagents = slot?
            .rows()
            .iter()
            .map(Reagent::from_row)
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}
