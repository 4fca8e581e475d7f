//! Responses for classified storage failures and rejected forms.
//!
//! Raw storage errors never reach the client. Constraint violations become
//! field-keyed form feedback echoing the submitted input; everything else
//! maps onto a plain [`AppError`].

use anyhow::anyhow;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use chemstore_core::{AppError, FieldLabels, LocalizedError};
use chemstore_db::{ClassifiedError, StorageError, classify};

/// Field-keyed feedback for a rejected form, rendered as
/// `{"errors": {...}, "input": {...}}` with status 400.
#[derive(Debug)]
pub struct FormError {
    pub errors: LocalizedError,
    pub input: Value,
}

impl FormError {
    pub fn new(errors: LocalizedError, input: &impl Serialize) -> Self {
        Self {
            errors,
            input: serde_json::to_value(input).unwrap_or(Value::Null),
        }
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "errors": self.errors.map(),
            "input": self.input,
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

#[derive(Debug)]
pub enum FormRejection {
    App(AppError),
    Form(FormError),
}

impl From<AppError> for FormRejection {
    fn from(err: AppError) -> Self {
        FormRejection::App(err)
    }
}

impl From<FormError> for FormRejection {
    fn from(err: FormError) -> Self {
        FormRejection::Form(err)
    }
}

impl IntoResponse for FormRejection {
    fn into_response(self) -> Response {
        match self {
            FormRejection::App(err) => err.into_response(),
            FormRejection::Form(err) => err.into_response(),
        }
    }
}

/// Maps a storage failure of a form submission.
///
/// Constraint violations are localized through `T`'s labels and returned as
/// form feedback carrying `input`.
pub fn storage_rejection<T: FieldLabels>(
    err: &StorageError,
    input: &impl Serialize,
) -> FormRejection {
    match classify(err) {
        ClassifiedError::UniqueViolation(violation) => {
            let localized = violation.localize::<T>();
            info!(error = %localized, "Unique violation");
            FormError::new(localized, input).into()
        }
        ClassifiedError::OutOfLimits(limits) => {
            let localized = limits.localize::<T>();
            info!(error = %localized, "Out of limits");
            FormError::new(localized, input).into()
        }
        other => storage_error(other).into(),
    }
}

/// Maps a classified failure outside form handling.
///
/// Missing rows and malformed ids are 404. Cancellation is a benign abort,
/// answered with 408 and logged as a warning.
pub fn storage_error(classified: ClassifiedError) -> AppError {
    match classified {
        ClassifiedError::NotFound | ClassifiedError::InvalidIdentifier => {
            info!("Not found");
            AppError::not_found(anyhow!("Not found"))
        }
        ClassifiedError::OperationCancelled => {
            warn!("Operation cancelled");
            AppError::new(StatusCode::REQUEST_TIMEOUT, anyhow!("Request cancelled"))
        }
        other => {
            error!(error = %other, "Unexpected constraint violation");
            AppError::internal(anyhow!("Internal server error"))
        }
    }
}

/// Parses an id taken from the request path. A malformed id is a miss.
pub fn parse_path_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        info!(id = %raw, "Invalid id in path");
        AppError::not_found(anyhow!("Not found"))
    })
}
