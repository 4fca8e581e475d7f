use serde::{Deserialize, Serialize};
use validator::Validate;

use chemstore_core::{FieldLabels, Sanitizer};
use chemstore_db::storages::Storage;
use chemstore_db::users::StorageUser;

use crate::validator::FormInput;

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateStorageRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    #[validate(range(min = 1, max = 1000))]
    pub cells: i16,
}

impl FieldLabels for CreateStorageRequest {
    fn field_label(field: &str) -> Option<&'static str> {
        Storage::field_label(field)
    }
}

impl FormInput for CreateStorageRequest {
    fn sanitize(&mut self, sanitizer: &Sanitizer) {
        self.name = sanitizer.sanitize(&self.name);
    }
}

#[derive(Debug, Serialize)]
pub struct StoragesPage {
    pub storages: Vec<Storage>,
    pub caller: StorageUser,
    pub next_offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StorageView {
    pub storage: Storage,
    pub caller: StorageUser,
}

/// Anti-forgery token for submitting a new storage unit.
#[derive(Debug, Serialize)]
pub struct NewStorageForm {
    pub post_xsrf: String,
}
