use serde::{Deserialize, Serialize};

/// Identity token payload.
///
/// All four claims are mandatory and strictly typed; a token missing any of
/// them, or carrying one with the wrong JSON type, does not decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    /// Access right: the role name.
    pub acr: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiration, unix seconds.
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_wire_names() {
        let claims = Claims {
            sub: "user-id".to_string(),
            acr: "assistant".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "sub": "user-id",
                "acr": "assistant",
                "iat": 1_700_000_000,
                "exp": 1_700_003_600,
            })
        );
    }

    #[test]
    fn test_claims_reject_missing_field() {
        let json = r#"{"sub":"user-id","iat":1,"exp":2}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }

    #[test]
    fn test_claims_reject_wrong_type() {
        let json = r#"{"sub":42,"acr":"admin","iat":1,"exp":2}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }
}
