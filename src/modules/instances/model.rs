use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use chemstore_core::FieldLabels;
use chemstore_db::instances::ReagentInstance;
use chemstore_db::reagents::Reagent;
use chemstore_db::storages::{Storage, StorageCell};
use chemstore_db::users::StorageUser;

use crate::validator::FormInput;

fn not_expired(expires_at: &NaiveDate) -> Result<(), ValidationError> {
    if *expires_at > Utc::now().date_naive() {
        Ok(())
    } else {
        Err(ValidationError::new("expired"))
    }
}

fn instance_label(field: &str) -> Option<&'static str> {
    match field {
        "ExpiresAt" => Some("термін придатності"),
        "Storage" => Some("сховище"),
        "Cell" => Some("відділ"),
        other => StorageCell::field_label(other),
    }
}

/// A new instance of the reagent named in the path.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct NewInstanceRequest {
    #[validate(custom(function = "not_expired"))]
    pub expires_at: NaiveDate,
    pub storage: Uuid,
    #[validate(range(min = 1, max = 1000))]
    pub cell: i16,
}

impl FieldLabels for NewInstanceRequest {
    fn field_label(field: &str) -> Option<&'static str> {
        instance_label(field)
    }
}

impl FormInput for NewInstanceRequest {}

/// Target cell of a transfer.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct TransferRequest {
    pub storage: Uuid,
    #[validate(range(min = 1, max = 1000))]
    pub cell: i16,
}

impl FieldLabels for TransferRequest {
    fn field_label(field: &str) -> Option<&'static str> {
        instance_label(field)
    }
}

impl FormInput for TransferRequest {}

/// An instance with the storage units it can be moved to and the
/// anti-forgery tokens for using it up and for moving it.
#[derive(Debug, Serialize)]
pub struct InstanceView {
    pub instance: ReagentInstance,
    pub storages: Vec<Storage>,
    pub caller: StorageUser,
    pub use_xsrf: String,
    pub transfer_xsrf: String,
}

#[derive(Debug, Serialize)]
pub struct NewInstanceForm {
    pub reagent: Reagent,
    pub storages: Vec<Storage>,
    pub post_xsrf: String,
}

#[derive(Debug, Serialize)]
pub struct UsedResponse {
    pub used_at: DateTime<Utc>,
}
