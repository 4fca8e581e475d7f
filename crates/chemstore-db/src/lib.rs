//! # Chemstore DB
//!
//! Persistence for chemstore:
//!
//! - [`batch`]: the batched persistence executor
//! - [`error`]: storage failures and their classification into a closed set
//! - [`users`], [`storages`], [`reagents`] and [`instances`]: entities and
//!   the batch commands over them
//!
//! # Example
//!
//! ```ignore
//! use chemstore_db::{BatchCommand, BatchExecutor, users::GetUserById};
//!
//! let executor = BatchExecutor::new(pool, Duration::from_secs(10));
//! let mut get = GetUserById::new(subject);
//! let results = executor.perform(&mut [&mut get]).await;
//! ```

pub mod batch;
pub mod error;
pub mod instances;
pub mod reagents;
pub mod storages;
pub mod users;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Connects the shared PostgreSQL pool.
///
/// `acquire_timeout` bounds how long a batch may wait for a connection.
///
/// # Errors
///
/// Returns the connection error when the database is unreachable.
pub async fn init_db_pool(database_url: &str, acquire_timeout: Duration) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;
    info!("Database pool connected");
    Ok(pool)
}

// Re-export commonly used types at crate root
pub use batch::{BatchCommand, BatchExecutor, BatchOutput, BatchSlot, Statement};
pub use error::{ClassifiedError, OutOfLimits, StorageError, UniqueViolation, classify};
pub use sqlx::PgPool;
