//! Field-addressable localized errors.
//!
//! Form feedback is keyed by `"<Field>Err"`, where `<Field>` is the
//! PascalCase form of a column or struct field name. Each entity that can
//! produce such feedback supplies a static [`FieldLabels`] table mapping the
//! same key to its localized label.

use std::collections::BTreeMap;

use serde::Serialize;

/// Static mapping from a field key (`"Name"`, `"Cells"`, ...) to the
/// localized label shown to users.
pub trait FieldLabels {
    fn field_label(field: &str) -> Option<&'static str>;

    /// Label for `field`, falling back to the lowercased key.
    fn label_or_key(field: &str) -> String {
        Self::field_label(field)
            .map(str::to_string)
            .unwrap_or_else(|| field.to_lowercase())
    }
}

/// Converts a snake_case column or field name into its PascalCase key.
///
/// `name` becomes `Name`, `password_confirm` becomes `PasswordConfirm`.
pub fn field_key(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// A localized, field-keyed error map plus a plain diagnostic string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct LocalizedError {
    errors: BTreeMap<String, String>,
    #[serde(skip)]
    message: String,
}

impl LocalizedError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field error. `field` is the PascalCase key without the `Err` suffix.
    pub fn single(field: &str, local: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.push(field, local, message);
        err
    }

    pub fn push(&mut self, field: &str, local: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(format!("{}Err", field), local.into());
        let message = message.into();
        if self.message.is_empty() {
            self.message = message;
        } else {
            self.message = format!("{}\n{}", self.message, message);
        }
    }

    pub fn map(&self) -> &BTreeMap<String, String> {
        &self.errors
    }
}
