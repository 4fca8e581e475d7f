use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

use chemstore_core::{AppError, FieldLabels, LocalizedError, Sanitizer, field_key};

use crate::feedback::{FormError, FormRejection};
use crate::state::AppState;

/// Struct-level validation rendered into field-keyed localized messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormValidator;

impl FormValidator {
    pub fn validate<T>(&self, input: &T) -> Result<(), LocalizedError>
    where
        T: Validate + FieldLabels,
    {
        input
            .validate()
            .map_err(|errors| localize_validation_errors::<T>(&errors))
    }
}

/// Renders validation failures as `"<Field>Err"` entries labelled through
/// `T`'s label table. Only the first failure of each field is reported.
pub fn localize_validation_errors<T: FieldLabels>(errors: &ValidationErrors) -> LocalizedError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut localized = LocalizedError::new();
    for (field, field_errors) in fields {
        let Some(error) = field_errors.first() else {
            continue;
        };
        let field: &str = field.as_ref();
        let key = field_key(field);
        let label = T::label_or_key(&key);
        let (local, english) = describe(error);

        localized.push(
            &key,
            format!("Поле {} {}", label, local),
            format!("Field {} {}", key, english),
        );
    }
    localized
}

fn describe(error: &ValidationError) -> (String, String) {
    let bound = |name: &str| error.params.get(name).and_then(Value::as_u64);
    let length = error
        .params
        .get("value")
        .and_then(Value::as_str)
        .map(|s| s.chars().count() as u64);

    if error.code != "length" {
        return ("невірне".to_string(), "invalid".to_string());
    }

    match (length, bound("min"), bound("max")) {
        (Some(0), Some(_), _) => ("обов'язкове".to_string(), "is required".to_string()),
        (Some(n), Some(min), _) if n < min => (
            format!("надто коротке ({}), мінімальна довжина - {} символи(ів)", n, min),
            format!("is too short ({}), min length - {}", n, min),
        ),
        (Some(n), _, Some(max)) if n > max => (
            format!("надто довге ({}), максимальна довжина - {} символи(ів)", n, max),
            format!("too long ({}), max length - {}", n, max),
        ),
        _ => ("невірне".to_string(), "invalid".to_string()),
    }
}

/// A JSON request body that can be echoed back in form feedback.
pub trait FormInput: DeserializeOwned + Serialize + Validate + FieldLabels + Send {
    /// Strips markup from free-text fields before validation.
    fn sanitize(&mut self, _sanitizer: &Sanitizer) {}
}

/// Sanitizes then validates `value`, echoing it back on failure.
pub fn check_form<T: FormInput>(
    mut value: T,
    sanitizer: &Sanitizer,
    validator: &FormValidator,
) -> Result<T, FormError> {
    value.sanitize(sanitizer);

    if let Err(errors) = validator.validate(&value) {
        info!(error = %errors, "Form validation failed");
        return Err(FormError::new(errors, &value));
    }

    Ok(value)
}

/// JSON body with free-text fields sanitized, not yet validated.
///
/// For flows that validate a derived value or report failures their own way.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizedJson<T>(pub T);

impl<T> FromRequest<AppState> for SanitizedJson<T>
where
    T: FormInput,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.sanitize(&state.sanitizer);
        Ok(SanitizedJson(value))
    }
}

/// JSON body that has been sanitized and validated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest<AppState> for ValidatedJson<T>
where
    T: FormInput,
{
    type Rejection = FormRejection;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        let value = check_form(value, &state.sanitizer, &state.validator)?;
        Ok(ValidatedJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let error_msg = rejection.body_text();

    if error_msg.contains("missing field") {
        let field = error_msg
            .split("missing field `")
            .nth(1)
            .and_then(|s| s.split('`').next())
            .unwrap_or("unknown");
        return AppError::bad_request(anyhow!("{} is required", field));
    }

    if error_msg.contains("invalid type") {
        return AppError::bad_request(anyhow!("Invalid field type in request"));
    }

    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, max = 10))]
        name: String,
        #[validate(range(min = 1, max = 1000))]
        cells: i16,
    }

    impl FieldLabels for Sample {
        fn field_label(field: &str) -> Option<&'static str> {
            match field {
                "Name" => Some("назва"),
                "Cells" => Some("відділи"),
                _ => None,
            }
        }
    }

    fn sample(name: &str, cells: i16) -> Sample {
        Sample {
            name: name.to_string(),
            cells,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(FormValidator.validate(&sample("Cabinet", 10)).is_ok());
    }

    #[test]
    fn test_empty_is_required() {
        let err = FormValidator.validate(&sample("", 10)).unwrap_err();
        assert_eq!(err.map()["NameErr"], "Поле назва обов'язкове");
        assert_eq!(err.to_string(), "Field Name is required");
    }

    #[test]
    fn test_too_short() {
        let err = FormValidator.validate(&sample("ab", 10)).unwrap_err();
        assert_eq!(
            err.map()["NameErr"],
            "Поле назва надто коротке (2), мінімальна довжина - 3 символи(ів)"
        );
    }

    #[test]
    fn test_too_long_counts_characters() {
        let err = FormValidator.validate(&sample("шафашафашафа", 10)).unwrap_err();
        assert_eq!(
            err.map()["NameErr"],
            "Поле назва надто довге (12), максимальна довжина - 10 символи(ів)"
        );
    }

    #[test]
    fn test_range_is_invalid() {
        let err = FormValidator.validate(&sample("Cabinet", 0)).unwrap_err();
        assert_eq!(err.map().len(), 1);
        assert_eq!(err.map()["CellsErr"], "Поле відділи невірне");
    }

    #[test]
    fn test_multiple_fields() {
        let err = FormValidator.validate(&sample("", 5000)).unwrap_err();
        assert_eq!(err.map().len(), 2);
        assert!(err.map().contains_key("NameErr"));
        assert!(err.map().contains_key("CellsErr"));
        assert_eq!(err.to_string(), "Field Cells invalid\nField Name is required");
    }
}
