use serde::{Deserialize, Serialize};
use validator::Validate;

use chemstore_core::{FieldLabels, Sanitizer};
use chemstore_db::users::StorageUser;

use crate::validator::FormInput;

/// Sign-in form. Credentials are checked as a whole; which part was wrong is
/// never reported.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 3, max = 50))]
    pub name: String,
    #[serde(skip_serializing)]
    #[validate(length(min = 6, max = 20))]
    pub password: String,
}

impl FieldLabels for SignInRequest {
    fn field_label(field: &str) -> Option<&'static str> {
        StorageUser::field_label(field)
    }
}

impl FormInput for SignInRequest {
    fn sanitize(&mut self, sanitizer: &Sanitizer) {
        // Passwords are only hashed or compared, never rendered.
        self.name = sanitizer.sanitize(&self.name);
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SignUpRequest {
    pub name: String,
    #[serde(skip_serializing)]
    pub password_1: String,
    #[serde(skip_serializing)]
    pub password_2: String,
}

impl FieldLabels for SignUpRequest {
    fn field_label(field: &str) -> Option<&'static str> {
        match field {
            "Password1" | "Password2" => Some("пароль"),
            other => StorageUser::field_label(other),
        }
    }
}

impl FormInput for SignUpRequest {
    fn sanitize(&mut self, sanitizer: &Sanitizer) {
        self.name = sanitizer.sanitize(&self.name);
    }
}

/// The account a sign-up would create, validated under the stored field
/// names so feedback is keyed `NameErr` / `PasswordErr`.
#[derive(Debug, Validate)]
pub struct NewUser {
    #[validate(length(min = 3, max = 50))]
    pub name: String,
    #[validate(length(min = 6, max = 20))]
    pub password: String,
}

impl FieldLabels for NewUser {
    fn field_label(field: &str) -> Option<&'static str> {
        StorageUser::field_label(field)
    }
}

impl From<&SignUpRequest> for NewUser {
    fn from(request: &SignUpRequest) -> Self {
        Self {
            name: request.name.clone(),
            password: request.password_1.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignedInResponse {
    pub user: StorageUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passwords_never_echoed() {
        let request = SignUpRequest {
            name: "chemist".to_string(),
            password_1: "secret1".to_string(),
            password_2: "secret2".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"name": "chemist"}));
    }

    #[test]
    fn test_sanitize_keeps_passwords() {
        let sanitizer = Sanitizer::new();
        let mut request = SignUpRequest {
            name: "<b>chemist</b>".to_string(),
            password_1: "p&ss<w>rd1".to_string(),
            password_2: "p&ss<w>rd1".to_string(),
        };
        request.sanitize(&sanitizer);
        assert_eq!(request.name, "chemist");
        assert_eq!(request.password_1, "p&ss<w>rd1");
        assert_eq!(request.password_2, "p&ss<w>rd1");

        let mut sign_in = SignInRequest {
            name: "chemist".to_string(),
            password: "p&ss<w>rd1".to_string(),
        };
        sign_in.sanitize(&sanitizer);
        assert_eq!(sign_in.password, "p&ss<w>rd1");
    }

    #[test]
    fn test_sign_up_labels() {
        assert_eq!(SignUpRequest::label_or_key("Password1"), "пароль");
        assert_eq!(SignUpRequest::label_or_key("Name"), "логін");
    }

    #[test]
    fn test_new_user_validation() {
        let valid = NewUser {
            name: "chemist".to_string(),
            password: "secret1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short = NewUser {
            name: "ch".to_string(),
            password: "s".to_string(),
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("password"));
    }
}
