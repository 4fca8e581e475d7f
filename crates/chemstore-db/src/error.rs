//! Storage failures and their classification.
//!
//! Every failure coming out of the batch executor is a [`StorageError`].
//! Callers never inspect it directly: [`classify`] turns it into the closed
//! [`ClassifiedError`] set, and the constraint variants render themselves into
//! field-keyed [`LocalizedError`]s through an entity's [`FieldLabels`] table.
//!
//! A database error whose code is not part of the taxonomy panics. The set of
//! codes has to grow together with the schema.

use std::fmt;
use std::sync::Arc;

use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

use chemstore_core::{FieldLabels, LocalizedError, field_key};

pub const UNIQUE_VIOLATION: &str = "23505";
pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";
/// Raised by the schema's range-check triggers.
pub const OUT_OF_LIMITS: &str = "A0001";

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(Arc<sqlx::Error>),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(Arc::new(err))
    }
}

/// A unique constraint on `table.column` rejected a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueViolation {
    pub table: String,
    pub column: String,
}

impl UniqueViolation {
    pub fn localize<T: FieldLabels>(&self) -> LocalizedError {
        let field = field_key(&self.column);
        let label = T::label_or_key(&field);
        LocalizedError::single(
            &field,
            format!("Елемент з даним {} уже існує", label),
            self.to_string(),
        )
    }
}

impl fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with given {} exists", self.table, self.column)
    }
}

/// A range check on `table.column` rejected a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfLimits {
    pub table: String,
    pub column: String,
}

impl OutOfLimits {
    pub fn localize<T: FieldLabels>(&self) -> LocalizedError {
        let field = field_key(&self.column);
        let label = T::label_or_key(&field);
        LocalizedError::single(
            &field,
            format!("{} поза межами", capitalize(&label)),
            self.to_string(),
        )
    }
}

impl fmt::Display for OutOfLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} out of limits for {}", self.column, self.table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifiedError {
    #[error("{0}")]
    UniqueViolation(UniqueViolation),

    #[error("invalid identifier")]
    InvalidIdentifier,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    OutOfLimits(OutOfLimits),

    #[error("operation cancelled")]
    OperationCancelled,
}

/// Maps a storage failure onto the closed error set.
///
/// # Panics
///
/// Panics on any failure outside the taxonomy: unknown SQLSTATE codes,
/// connection I/O errors, decode errors and the like.
pub fn classify(err: &StorageError) -> ClassifiedError {
    let inner = match err {
        StorageError::Cancelled => return ClassifiedError::OperationCancelled,
        StorageError::Database(inner) => inner.as_ref(),
    };

    match inner {
        sqlx::Error::RowNotFound => ClassifiedError::NotFound,
        sqlx::Error::PoolTimedOut => ClassifiedError::OperationCancelled,
        sqlx::Error::Database(db) => {
            let code = db.code().unwrap_or_default();
            let table = db
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(PgDatabaseError::table)
                .unwrap_or_default();
            let constraint = db.constraint().unwrap_or_default();

            classify_code(&code, table, constraint).unwrap_or_else(|| {
                panic!(
                    "unclassified database error {} (table {:?}, constraint {:?}): {}",
                    code,
                    table,
                    constraint,
                    db.message()
                )
            })
        }
        other => panic!("unclassified storage error: {}", other),
    }
}

/// Classifies a SQLSTATE code reported against `table` and `constraint`.
///
/// Returns `None` for codes outside the taxonomy.
pub fn classify_code(code: &str, table: &str, constraint: &str) -> Option<ClassifiedError> {
    let column = || column_from_constraint(table, constraint).unwrap_or_else(|| constraint.to_string());

    match code {
        UNIQUE_VIOLATION => Some(ClassifiedError::UniqueViolation(UniqueViolation {
            table: table.to_string(),
            column: column(),
        })),
        INVALID_TEXT_REPRESENTATION => Some(ClassifiedError::InvalidIdentifier),
        OUT_OF_LIMITS => Some(ClassifiedError::OutOfLimits(OutOfLimits {
            table: table.to_string(),
            column: column(),
        })),
        _ => None,
    }
}

/// Extracts the column from a constraint named `<table>_<column>_<suffix>`.
///
/// `storage_user_name_key` on `storage_user` yields `name`. The column is the
/// run of lowercase ASCII letters after the table prefix and must be followed
/// by at least one more character.
pub fn column_from_constraint(table: &str, constraint: &str) -> Option<String> {
    let rest = constraint.strip_prefix(table)?.strip_prefix('_')?;
    let end = rest
        .find(|c: char| !c.is_ascii_lowercase())
        .unwrap_or(rest.len());

    if end == 0 || end == rest.len() {
        return None;
    }
    Some(rest[..end].to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
