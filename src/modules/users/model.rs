use serde::{Deserialize, Serialize};
use validator::Validate;

use chemstore_core::{FieldLabels, Role};
use chemstore_db::users::StorageUser;

use crate::validator::FormInput;

#[derive(Debug, Serialize)]
pub struct UsersPage {
    pub users: Vec<StorageUser>,
    pub caller: StorageUser,
    pub next_offset: Option<i64>,
}

/// The caller's record with its role spelled out for display.
#[derive(Debug, Serialize)]
pub struct CallerResponse {
    pub caller: StorageUser,
    pub role_local: &'static str,
}

impl From<StorageUser> for CallerResponse {
    fn from(caller: StorageUser) -> Self {
        Self {
            role_local: caller.role.name_local(),
            caller,
        }
    }
}

/// A user as seen by an admin, with the anti-forgery token for updating it.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub user: StorageUser,
    pub caller: StorageUser,
    pub put_xsrf: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateUserRequest {
    pub role: Role,
    pub active: bool,
}

impl FieldLabels for UpdateUserRequest {
    fn field_label(field: &str) -> Option<&'static str> {
        StorageUser::field_label(field)
    }
}

impl FormInput for UpdateUserRequest {}
