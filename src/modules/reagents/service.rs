use tracing::instrument;
use uuid::Uuid;

use chemstore_db::instances::{InstancesOfReagent, ReagentInstance};
use chemstore_db::reagents::{CreateReagent, GetReagent, Reagent, ReagentsRange, UpdateReagent};
use chemstore_db::users::{GetUserById, StorageUser};
use chemstore_db::{BatchCommand, BatchExecutor, StorageError};

pub struct ReagentService;

impl ReagentService {
    #[instrument(skip(batch))]
    pub async fn create_reagent(
        batch: &BatchExecutor,
        name: &str,
        formula: &str,
    ) -> Result<Reagent, StorageError> {
        let mut create = CreateReagent::new(name, formula);
        batch.perform_one(&mut create).await?;
        found(create.reagent)
    }

    /// One page of reagents matching `search` by name or formula, fetched in
    /// the same batch as the caller's own record.
    #[instrument(skip(batch))]
    pub async fn list_reagents(
        batch: &BatchExecutor,
        caller: Uuid,
        search: &str,
        offset: i64,
    ) -> Result<(ReagentsRange, StorageUser), StorageError> {
        let mut range = ReagentsRange::new(search, offset);
        let mut me = GetUserById::new(caller.to_string());
        let mut commands: [&mut dyn BatchCommand; 2] = [&mut range, &mut me];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        Ok((range, found(me.user)?))
    }

    /// The reagent, all of its instances and the caller's record.
    #[instrument(skip(batch))]
    pub async fn view_reagent(
        batch: &BatchExecutor,
        caller: Uuid,
        reagent_id: &str,
    ) -> Result<(Reagent, Vec<ReagentInstance>, StorageUser), StorageError> {
        let mut reagent = GetReagent::new(reagent_id);
        let mut instances = InstancesOfReagent::new(reagent_id);
        let mut me = GetUserById::new(caller.to_string());
        let mut commands: [&mut dyn BatchCommand; 3] = [&mut reagent, &mut instances, &mut me];
        batch
            .perform(&mut commands)
            .await
            .into_iter()
            .collect::<Result<(), _>>()?;

        Ok((found(reagent.reagent)?, instances.instances, found(me.user)?))
    }

    #[instrument(skip(batch))]
    pub async fn update_reagent(
        batch: &BatchExecutor,
        id: Uuid,
        name: &str,
        formula: &str,
    ) -> Result<Reagent, StorageError> {
        let mut update = UpdateReagent::new(id, name, formula);
        batch.perform_one(&mut update).await?;
        found(update.reagent)
    }
}

fn found<T>(value: Option<T>) -> Result<T, StorageError> {
    value.ok_or_else(|| sqlx::Error::RowNotFound.into())
}
