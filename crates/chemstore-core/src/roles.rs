//! User roles.
//!
//! The role set is fixed. Each role has a machine name, which is what the
//! database and the identity token carry, and a localized display name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Lecturer,
    Assistant,
    Unconfirmed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Storage user role is not valid: {0}")]
pub struct RoleParseError(pub String);

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::Lecturer,
        Role::Assistant,
        Role::Unconfirmed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Lecturer => "lecturer",
            Role::Assistant => "assistant",
            Role::Unconfirmed => "unconfirmed",
        }
    }

    pub fn name_local(&self) -> &'static str {
        match self {
            Role::Admin => "адміністратор",
            Role::Lecturer => "викладач",
            Role::Assistant => "лаборант",
            Role::Unconfirmed => "не підтверджений",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| RoleParseError(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = RoleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
