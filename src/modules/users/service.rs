use tracing::instrument;
use uuid::Uuid;

use chemstore_core::Role;
use chemstore_db::users::{GetUserById, StorageUser, UpdateUser, UsersRange};
use chemstore_db::{BatchCommand, BatchExecutor, StorageError};

pub struct UserService;

impl UserService {
    #[instrument(skip(batch))]
    pub async fn get_user(batch: &BatchExecutor, id: Uuid) -> Result<StorageUser, StorageError> {
        let mut get = GetUserById::new(id.to_string());
        batch.perform_one(&mut get).await?;
        found(get.user)
    }

    /// One page of users other than the caller, fetched in the same batch as
    /// the caller's own record.
    #[instrument(skip(batch))]
    pub async fn list_users(
        batch: &BatchExecutor,
        caller: Uuid,
        search: &str,
        offset: i64,
    ) -> Result<(UsersRange, StorageUser), StorageError> {
        let mut range = UsersRange::new(caller, search, offset);
        let mut me = GetUserById::new(caller.to_string());
        let mut commands: [&mut dyn BatchCommand; 2] = [&mut range, &mut me];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        Ok((range, found(me.user)?))
    }

    /// `user_id` is passed through as text; a malformed id is classified by
    /// the database like any other lookup miss.
    #[instrument(skip(batch))]
    pub async fn view_user(
        batch: &BatchExecutor,
        caller: Uuid,
        user_id: &str,
    ) -> Result<(StorageUser, StorageUser), StorageError> {
        let mut user = GetUserById::new(user_id);
        let mut me = GetUserById::new(caller.to_string());
        let mut commands: [&mut dyn BatchCommand; 2] = [&mut user, &mut me];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        Ok((found(user.user)?, found(me.user)?))
    }

    #[instrument(skip(batch))]
    pub async fn update_user(
        batch: &BatchExecutor,
        id: Uuid,
        role: Role,
        active: bool,
    ) -> Result<(), StorageError> {
        batch.perform_one(&mut UpdateUser::new(id, role, active)).await
    }
}

fn found<T>(value: Option<T>) -> Result<T, StorageError> {
    value.ok_or_else(|| sqlx::Error::RowNotFound.into())
}
