//! Use cases of the catalog aggregates

pub mod cast_member;
pub mod category;
pub mod genre;
pub mod video;

use catalog_core::{cancellable, AppError};
use catalog_db::UnitOfWork;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run a staging write, then commit. Staged writes are rolled back if either
/// step fails; the original error is returned.
pub(crate) async fn persist<F>(
    uow: &dyn UnitOfWork,
    cancel: &CancellationToken,
    stage: F,
) -> Result<(), AppError>
where
    F: Future<Output = Result<(), AppError>>,
{
    let result = match cancellable(cancel, stage).await {
        Ok(()) => uow.commit(cancel).await,
        Err(e) => Err(e),
    };

    if let Err(ref e) = result {
        if let Err(rollback_err) = uow.rollback().await {
            tracing::warn!(
                error = %rollback_err,
                original_error = %e,
                "Failed to roll back staged writes"
            );
        }
    }
    result
}
