//! Administrative commands run outside the HTTP surface.

use anyhow::{Context, anyhow};

use chemstore_core::{Role, hash_password};
use chemstore_db::users::{CreateUser, StorageUser};
use chemstore_db::{BatchExecutor, ClassifiedError, classify};

use crate::modules::auth::model::NewUser;
use crate::validator::FormValidator;

/// Creates an active `admin` account. Admins cannot be created over HTTP.
pub async fn create_admin(
    batch: &BatchExecutor,
    name: &str,
    password: &str,
) -> anyhow::Result<StorageUser> {
    let new_user = NewUser {
        name: name.to_string(),
        password: password.to_string(),
    };
    FormValidator.validate(&new_user)?;

    let password_hash = hash_password(&new_user.password)
        .map_err(|e| anyhow!("Failed to hash password: {}", e.error))?;

    let mut create = CreateUser::new(new_user.name, Role::Admin, password_hash, true);
    if let Err(err) = batch.perform_one(&mut create).await {
        return Err(match classify(&err) {
            ClassifiedError::UniqueViolation(violation) => {
                anyhow!("User with this name already exists ({})", violation)
            }
            other => anyhow!("Failed to create admin: {}", other),
        });
    }

    create.user.context("Created admin was not returned")
}
