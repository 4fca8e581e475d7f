//! Prefix search with offset paging, shared by the listing endpoints.
//!
//! `GET /api/v1/users?src=al&offset=20` asks for the second page of names
//! starting with `al`. Both parameters are optional; an empty `offset` is the
//! first page.

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use chemstore_core::{FieldLabels, Sanitizer};

use crate::validator::FormInput;

fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct SearchQuery {
    #[validate(length(max = 50))]
    pub src: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[validate(range(min = 0, max = 10000))]
    pub offset: Option<i64>,
}

impl SearchQuery {
    pub fn search(&self) -> &str {
        self.src.as_deref().unwrap_or_default()
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }
}

impl FieldLabels for SearchQuery {
    fn field_label(field: &str) -> Option<&'static str> {
        match field {
            "Src" => Some("пошук"),
            "Offset" => Some("зміщення"),
            _ => None,
        }
    }
}

impl FormInput for SearchQuery {
    fn sanitize(&mut self, sanitizer: &Sanitizer) {
        if let Some(src) = self.src.as_mut() {
            *src = sanitizer.sanitize(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits() {
        let query = SearchQuery {
            src: Some("a".repeat(51)),
            offset: Some(10_001),
        };
        let errors = query.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("src"));
        assert!(errors.field_errors().contains_key("offset"));

        assert!(SearchQuery::default().validate().is_ok());
    }

    #[test]
    fn test_empty_offset_is_first_page() {
        let query: SearchQuery = serde_json::from_str(r#"{"src":"Na","offset":""}"#).unwrap();
        assert_eq!(query.offset, None);
        assert_eq!(query.offset(), 0);
        assert_eq!(query.search(), "Na");

        let query: SearchQuery = serde_json::from_str(r#"{"offset":"40"}"#).unwrap();
        assert_eq!(query.offset(), 40);
        assert_eq!(query.search(), "");

        assert!(serde_json::from_str::<SearchQuery>(r#"{"offset":"x"}"#).is_err());
    }
}
