use tracing::instrument;
use uuid::Uuid;

use chemstore_db::storages::{CreateStorage, GetStorage, Storage, StoragesRange};
use chemstore_db::users::{GetUserById, StorageUser};
use chemstore_db::{BatchCommand, BatchExecutor, StorageError};

pub struct StorageService;

impl StorageService {
    #[instrument(skip(batch))]
    pub async fn create_storage(
        batch: &BatchExecutor,
        name: &str,
        cells: i16,
    ) -> Result<Storage, StorageError> {
        let mut create = CreateStorage::new(name, cells);
        batch.perform_one(&mut create).await?;
        create
            .storage
            .ok_or_else(|| sqlx::Error::RowNotFound.into())
    }

    /// One page of storage units, fetched in the same batch as the caller's
    /// own record.
    #[instrument(skip(batch))]
    pub async fn list_storages(
        batch: &BatchExecutor,
        caller: Uuid,
        search: &str,
        offset: i64,
    ) -> Result<(StoragesRange, StorageUser), StorageError> {
        let mut range = StoragesRange::new(search, offset);
        let mut me = GetUserById::new(caller.to_string());
        let mut commands: [&mut dyn BatchCommand; 2] = [&mut range, &mut me];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        let caller = me.user.ok_or(sqlx::Error::RowNotFound)?;
        Ok((range, caller))
    }

    /// A storage unit together with the caller's record, in one batch.
    #[instrument(skip(batch))]
    pub async fn view_storage(
        batch: &BatchExecutor,
        caller: Uuid,
        storage_id: &str,
    ) -> Result<(Storage, StorageUser), StorageError> {
        let mut storage = GetStorage::new(storage_id);
        let mut me = GetUserById::new(caller.to_string());
        let mut commands: [&mut dyn BatchCommand; 2] = [&mut storage, &mut me];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        match (storage.storage, me.user) {
            (Some(storage), Some(caller)) => Ok((storage, caller)),
            _ => Err(sqlx::Error::RowNotFound.into()),
        }
    }
}
