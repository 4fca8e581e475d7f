//! Storage units: named rooms or cabinets split into a bounded number of cells.
//!
//! Cells are numbered `1..=cells` and created lazily, the first time
//! something is placed in them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use chemstore_core::FieldLabels;

use crate::batch::{BatchCommand, BatchSlot, Statement};
use crate::error::StorageError;
use crate::users::prefix_pattern;

/// Page size of [`StoragesRange`].
pub const STORAGES_PAGE_SIZE: i64 = 20;

macro_rules! storage_columns {
    () => {
        "id, created_at, updated_at, name, cells"
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Storage {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub cells: i16,
}

impl FieldLabels for Storage {
    fn field_label(field: &str) -> Option<&'static str> {
        match field {
            "Name" => Some("назва"),
            "Cells" => Some("відділи"),
            _ => None,
        }
    }
}

fn decode_storage(slot: BatchSlot) -> Result<Storage, StorageError> {
    let row = slot?.one_row()?;
    Ok(Storage::from_row(&row)?)
}

/// Inserts a storage unit.
///
/// The cell count is range-checked by the schema and reported as out of
/// limits; a duplicate name is a unique violation.
#[derive(Debug)]
pub struct CreateStorage {
    name: String,
    cells: i16,
    pub storage: Option<Storage>,
}

impl CreateStorage {
    pub fn new(name: impl Into<String>, cells: i16) -> Self {
        Self {
            name: name.into(),
            cells,
            storage: None,
        }
    }
}

impl BatchCommand for CreateStorage {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "INSERT INTO storage (name, cells) VALUES ($1, $2) RETURNING ",
                storage_columns!()
            ))
            .bind(self.name.clone())
            .bind(self.cells),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.storage = Some(decode_storage(slot)?);
        Ok(())
    }
}

/// Fetches a storage unit by id, cast by the database like [`GetUserById`].
///
/// [`GetUserById`]: crate::users::GetUserById
#[derive(Debug, Default)]
pub struct GetStorage {
    id: String,
    pub storage: Option<Storage>,
}

impl GetStorage {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            storage: None,
        }
    }
}

impl BatchCommand for GetStorage {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "SELECT ",
                storage_columns!(),
                " FROM storage WHERE id = $1::uuid"
            ))
            .bind(self.id.clone()),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.storage = Some(decode_storage(slot)?);
        Ok(())
    }
}

/// Storage units whose name starts with `search`, newest first.
#[derive(Debug)]
pub struct StoragesRange {
    search: String,
    offset: i64,
    limit: i64,
    pub storages: Vec<Storage>,
}

impl StoragesRange {
    pub fn new(search: impl Into<String>, offset: i64) -> Self {
        Self {
            search: search.into(),
            offset: offset.max(0),
            limit: STORAGES_PAGE_SIZE,
            storages: Vec::new(),
        }
    }

    /// Overrides the page size, for pickers listing many units at once.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn next_offset(&self) -> Option<i64> {
        (self.storages.len() as i64 == self.limit).then(|| self.offset + self.limit)
    }
}

impl BatchCommand for StoragesRange {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "SELECT ",
                storage_columns!(),
                " FROM storage WHERE name ILIKE $1 ESCAPE '\\' ",
                "ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
            ))
            .bind(prefix_pattern(&self.search))
            .bind(self.limit)
            .bind(self.offset),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.storages = slot?
            .rows()
            .iter()
            .map(Storage::from_row)
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}

/// A numbered cell of a storage unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct StorageCell {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub storage: Uuid,
    pub number: i16,
}

impl FieldLabels for StorageCell {
    fn field_label(field: &str) -> Option<&'static str> {
        match field {
            "Number" => Some("відділ"),
            _ => None,
        }
    }
}

/// Makes sure cell `number` of `storage` exists.
///
/// An existing cell is left untouched. A number outside the unit's cell
/// count, or a unit that does not exist, is reported as out of limits on
/// `storage_cell.number`.
#[derive(Debug)]
pub struct TryCreateCell {
    storage: Uuid,
    number: i16,
}

impl TryCreateCell {
    pub fn new(storage: Uuid, number: i16) -> Self {
        Self { storage, number }
    }
}

impl BatchCommand for TryCreateCell {
    fn queue(&self) -> Statement {
        Statement::Execute(
            sqlx::query(concat!(
                "INSERT INTO storage_cell (storage, number) VALUES ($1, $2) ",
                "ON CONFLICT ON CONSTRAINT storage_cell_storage_number_key DO NOTHING"
            ))
            .bind(self.storage)
            .bind(self.number),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        slot.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchOutput;
    use crate::error::{ClassifiedError, classify};

    #[test]
    fn test_labels() {
        assert_eq!(Storage::label_or_key("Name"), "назва");
        assert_eq!(Storage::label_or_key("Cells"), "відділи");
    }

    #[test]
    fn test_get_storage_empty_result_is_not_found() {
        let mut get = GetStorage::new("6f1c2e0a-0000-4000-8000-000000000000");
        let err = get.read(Ok(BatchOutput::Rows(Vec::new()))).unwrap_err();
        assert_eq!(classify(&err), ClassifiedError::NotFound);
        assert!(get.storage.is_none());
    }

    #[test]
    fn test_storages_range_limits() {
        let range = StoragesRange::new("", 0).with_limit(0);
        assert_eq!(range.limit, 1);

        let mut range = StoragesRange::new("Cab", 20).with_limit(2);
        assert_eq!(range.next_offset(), None);
        range.storages = vec![sample("Cabinet A"), sample("Cabinet B")];
        assert_eq!(range.next_offset(), Some(22));
    }

    #[test]
    fn test_try_create_cell_ignores_affected_rows() {
        let mut cell = TryCreateCell::new(Uuid::new_v4(), 3);
        assert!(cell.read(Ok(BatchOutput::Affected(0))).is_ok());
        assert!(cell.read(Ok(BatchOutput::Affected(1))).is_ok());
        assert_eq!(StorageCell::label_or_key("Number"), "відділ");
    }

    fn sample(name: &str) -> Storage {
        Storage {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            name: name.to_string(),
            cells: 10,
        }
    }

    #[test]
    fn test_create_storage_passes_failure_through() {
        let mut create = CreateStorage::new("Cabinet A", 5000);
        let err = create.read(Err(StorageError::Cancelled)).unwrap_err();
        assert_eq!(classify(&err), ClassifiedError::OperationCancelled);
    }
}
