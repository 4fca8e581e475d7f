use chrono::NaiveDate;
use tracing::instrument;
use uuid::Uuid;

use chemstore_db::instances::{
    CreateInstance, GetInstance, ReagentInstance, TransferInstance, UseInstance, UseOutcome,
};
use chemstore_db::reagents::{GetReagent, Reagent};
use chemstore_db::storages::{Storage, StoragesRange, TryCreateCell};
use chemstore_db::users::{GetUserById, StorageUser};
use chemstore_db::{BatchCommand, BatchExecutor, StorageError};

/// Storage units offered when placing or moving an instance.
pub const STORAGE_PICKER_LIMIT: i64 = 40;

pub struct InstanceService;

impl InstanceService {
    /// Creates the target cell if needed and places the instance in it, in
    /// one batch. A cell outside the unit is reported before the placement.
    #[instrument(skip(batch))]
    pub async fn create_instance(
        batch: &BatchExecutor,
        reagent: Uuid,
        expires_at: NaiveDate,
        storage: Uuid,
        cell: i16,
    ) -> Result<ReagentInstance, StorageError> {
        let mut try_cell = TryCreateCell::new(storage, cell);
        let mut create = CreateInstance::new(reagent, expires_at, storage, cell);
        let mut commands: [&mut dyn BatchCommand; 2] = [&mut try_cell, &mut create];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        found(create.instance)
    }

    #[instrument(skip(batch))]
    pub async fn view_instance(
        batch: &BatchExecutor,
        caller: Uuid,
        reagent_id: &str,
        instance_id: &str,
    ) -> Result<(ReagentInstance, Vec<Storage>, StorageUser), StorageError> {
        let mut instance = GetInstance::new(reagent_id, instance_id);
        let mut storages = StoragesRange::new("", 0).with_limit(STORAGE_PICKER_LIMIT);
        let mut me = GetUserById::new(caller.to_string());
        let mut commands: [&mut dyn BatchCommand; 3] = [&mut instance, &mut storages, &mut me];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        Ok((found(instance.instance)?, storages.storages, found(me.user)?))
    }

    /// The reagent a new instance will belong to and the units to place it in.
    #[instrument(skip(batch))]
    pub async fn instance_form(
        batch: &BatchExecutor,
        reagent_id: &str,
    ) -> Result<(Reagent, Vec<Storage>), StorageError> {
        let mut reagent = GetReagent::new(reagent_id);
        let mut storages = StoragesRange::new("", 0).with_limit(STORAGE_PICKER_LIMIT);
        let mut commands: [&mut dyn BatchCommand; 2] = [&mut reagent, &mut storages];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        Ok((found(reagent.reagent)?, storages.storages))
    }

    #[instrument(skip(batch))]
    pub async fn use_instance(
        batch: &BatchExecutor,
        reagent: Uuid,
        id: Uuid,
    ) -> Result<UseOutcome, StorageError> {
        let mut use_instance = UseInstance::new(reagent, id);
        batch.perform_one(&mut use_instance).await?;
        found(use_instance.outcome)
    }

    /// Moves an unused instance and reads it back from its new cell.
    #[instrument(skip(batch))]
    pub async fn transfer_instance(
        batch: &BatchExecutor,
        reagent: Uuid,
        id: Uuid,
        storage: Uuid,
        cell: i16,
    ) -> Result<ReagentInstance, StorageError> {
        let mut try_cell = TryCreateCell::new(storage, cell);
        let mut transfer = TransferInstance::new(reagent, id, storage, cell);
        let mut instance = GetInstance::new(reagent.to_string(), id.to_string());
        let mut commands: [&mut dyn BatchCommand; 3] =
            [&mut try_cell, &mut transfer, &mut instance];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        found(instance.instance)
    }
}

fn found<T>(value: Option<T>) -> Result<T, StorageError> {
    value.ok_or_else(|| sqlx::Error::RowNotFound.into())
}
