//! Cancellation support for I/O steps that take no token of their own.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::AppError;

/// Run `fut` unless `cancel` fires first.
///
/// A token that is already cancelled short-circuits without polling `fut`.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = fut => result,
    }
}

/// Fail with `AppError::Cancelled` if the token has fired.
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), AppError> {
    if cancel.is_cancelled() {
        Err(AppError::Cancelled)
    } else {
        Ok(())
    }
}
