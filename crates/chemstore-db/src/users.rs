//! Storage users and their batch commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use chemstore_core::{FieldLabels, Role};

use crate::batch::{BatchCommand, BatchSlot, Statement};
use crate::error::StorageError;

/// Page size of [`UsersRange`].
pub const USERS_PAGE_SIZE: i64 = 20;

macro_rules! user_columns {
    () => {
        "id, created_at, updated_at, name, role, password, active"
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct StorageUser {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[serde(skip_serializing)]
    pub password: String,
    pub active: bool,
}

impl FieldLabels for StorageUser {
    fn field_label(field: &str) -> Option<&'static str> {
        match field {
            "Name" => Some("логін"),
            "Role" => Some("роль"),
            "Password" => Some("пароль"),
            "Active" => Some("активний"),
            _ => None,
        }
    }
}

fn decode_user(slot: BatchSlot) -> Result<StorageUser, StorageError> {
    let row = slot?.one_row()?;
    Ok(StorageUser::from_row(&row)?)
}

/// Fetches a user by id.
///
/// The id is bound as text and cast by the database, so a malformed id
/// surfaces as an invalid identifier rather than a local parse error.
#[derive(Debug, Default)]
pub struct GetUserById {
    id: String,
    pub user: Option<StorageUser>,
}

impl GetUserById {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user: None,
        }
    }
}

impl BatchCommand for GetUserById {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "SELECT ",
                user_columns!(),
                " FROM storage_user WHERE id = $1::uuid"
            ))
            .bind(self.id.clone()),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.user = Some(decode_user(slot)?);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct GetUserByName {
    name: String,
    pub user: Option<StorageUser>,
}

impl GetUserByName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: None,
        }
    }
}

impl BatchCommand for GetUserByName {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "SELECT ",
                user_columns!(),
                " FROM storage_user WHERE name = $1"
            ))
            .bind(self.name.clone()),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.user = Some(decode_user(slot)?);
        Ok(())
    }
}

/// Sets role and active flag of a user.
#[derive(Debug)]
pub struct UpdateUser {
    id: Uuid,
    role: Role,
    active: bool,
}

impl UpdateUser {
    pub fn new(id: Uuid, role: Role, active: bool) -> Self {
        Self { id, role, active }
    }
}

impl BatchCommand for UpdateUser {
    fn queue(&self) -> Statement {
        Statement::Execute(
            sqlx::query(
                "UPDATE storage_user SET role = $2, active = $3, updated_at = NOW() WHERE id = $1",
            )
            .bind(self.id)
            .bind(self.role.name())
            .bind(self.active),
        )
    }

    /// # Panics
    ///
    /// Panics if more than one row was updated; ids are unique.
    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        match slot?.affected() {
            0 => Err(sqlx::Error::RowNotFound.into()),
            1 => Ok(()),
            n => panic!("update of storage user {} touched {} rows", self.id, n),
        }
    }
}

/// Inserts a user and returns the stored record.
#[derive(Debug)]
pub struct CreateUser {
    name: String,
    role: Role,
    password_hash: String,
    active: bool,
    pub user: Option<StorageUser>,
}

impl CreateUser {
    pub fn new(name: impl Into<String>, role: Role, password_hash: String, active: bool) -> Self {
        Self {
            name: name.into(),
            role,
            password_hash,
            active,
            user: None,
        }
    }
}

impl BatchCommand for CreateUser {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "INSERT INTO storage_user (name, role, password, active) ",
                "VALUES ($1, $2, $3, $4) RETURNING ",
                user_columns!()
            ))
            .bind(self.name.clone())
            .bind(self.role.name())
            .bind(self.password_hash.clone())
            .bind(self.active),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.user = Some(decode_user(slot)?);
        Ok(())
    }
}

/// Up to [`USERS_PAGE_SIZE`] users whose name starts with `search`, ordered
/// by name, excluding `exclude`.
#[derive(Debug)]
pub struct UsersRange {
    exclude: Uuid,
    search: String,
    offset: i64,
    pub users: Vec<StorageUser>,
}

impl UsersRange {
    pub fn new(exclude: Uuid, search: impl Into<String>, offset: i64) -> Self {
        Self {
            exclude,
            search: search.into(),
            offset: offset.max(0),
            users: Vec::new(),
        }
    }

    /// Offset of the following page, if this one was full.
    pub fn next_offset(&self) -> Option<i64> {
        (self.users.len() as i64 == USERS_PAGE_SIZE).then(|| self.offset + USERS_PAGE_SIZE)
    }
}

impl BatchCommand for UsersRange {
    fn queue(&self) -> Statement {
        Statement::Fetch(
            sqlx::query(concat!(
                "SELECT ",
                user_columns!(),
                " FROM storage_user WHERE id <> $1 AND name ILIKE $2 ESCAPE '\\' ",
                "ORDER BY name LIMIT $3 OFFSET $4"
            ))
            .bind(self.exclude)
            .bind(prefix_pattern(&self.search))
            .bind(USERS_PAGE_SIZE)
            .bind(self.offset),
        )
    }

    fn read(&mut self, slot: BatchSlot) -> Result<(), StorageError> {
        self.users = slot?
            .rows()
            .iter()
            .map(StorageUser::from_row)
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}

/// `ILIKE` pattern matching names that start with `search` literally.
pub fn prefix_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 1);
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(StorageUser::field_label("Name"), Some("логін"));
        assert_eq!(StorageUser::field_label("Password"), Some("пароль"));
        assert_eq!(StorageUser::field_label("Role"), Some("роль"));
        assert_eq!(StorageUser::field_label("Nickname"), None);
    }

    #[test]
    fn test_prefix_pattern_escapes_wildcards() {
        assert_eq!(prefix_pattern("adm"), "adm%");
        assert_eq!(prefix_pattern(""), "%");
        assert_eq!(prefix_pattern("50%_a\\b"), "50\\%\\_a\\\\b%");
    }

    #[test]
    fn test_update_user_row_counts() {
        let mut update = UpdateUser::new(Uuid::new_v4(), Role::Lecturer, true);
        assert!(update.read(Ok(crate::batch::BatchOutput::Affected(1))).is_ok());
        let err = update
            .read(Ok(crate::batch::BatchOutput::Affected(0)))
            .unwrap_err();
        assert_eq!(
            crate::error::classify(&err),
            crate::error::ClassifiedError::NotFound
        );
    }

    #[test]
    #[should_panic(expected = "touched 2 rows")]
    fn test_update_user_multiple_rows_panics() {
        let mut update = UpdateUser::new(Uuid::new_v4(), Role::Lecturer, true);
        let _ = update.read(Ok(crate::batch::BatchOutput::Affected(2)));
    }

    fn sample_user(name: &str) -> StorageUser {
        StorageUser {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            name: name.to_string(),
            role: Role::Assistant,
            password: String::new(),
            active: true,
        }
    }

    #[test]
    fn test_users_range_next_offset() {
        let mut range = UsersRange::new(Uuid::new_v4(), "", 40);
        assert_eq!(range.next_offset(), None);

        range.users = (0..USERS_PAGE_SIZE)
            .map(|i| sample_user(&format!("user{}", i)))
            .collect();
        assert_eq!(range.next_offset(), Some(60));

        range.users.pop();
        assert_eq!(range.next_offset(), None);
    }

    #[test]
    fn test_serialize_hides_password() {
        let user = StorageUser {
            id: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            name: "admin".to_string(),
            role: Role::Admin,
            password: "$2b$12$hash".to_string(),
            active: true,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "admin");
    }
}
