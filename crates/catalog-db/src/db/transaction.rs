//! Request-scoped transaction shared by the PostgreSQL repositories
//!
//! The first write of a request begins a transaction; every later write from
//! any repository holding the same `PgUnitOfWork` joins it. `commit` makes the
//! writes durable and then publishes the events the written aggregates raised.
//!
//! # Example
//!
//! ```ignore
//! use catalog_db::{PgUnitOfWork, PgVideoRepository, UnitOfWork, VideoRepository};
//!
//! let uow = Arc::new(PgUnitOfWork::new(pool.clone(), publisher));
//! let videos = PgVideoRepository::new(uow.clone());
//! videos.insert(&video).await?;
//! uow.commit(&cancel).await?;
//! ```

use async_trait::async_trait;
use catalog_core::{ensure_not_cancelled, AppError, DomainEvent, DomainEventPublisher};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use super::repositories::UnitOfWork;

pub struct PgUnitOfWork {
    pool: PgPool,
    transaction: Mutex<Option<Transaction<'static, Postgres>>>,
    events: Mutex<Vec<DomainEvent>>,
    publisher: Arc<dyn DomainEventPublisher>,
}

/// Lock on the open transaction returned by [`PgUnitOfWork::transaction`].
///
/// Wraps the `MutexGuard` directly rather than a `MappedMutexGuard`, whose
/// `Send` impl carries a lifetime bound that async-trait futures cannot prove.
pub struct TransactionGuard<'a>(MutexGuard<'a, Option<Transaction<'static, Postgres>>>);

impl std::ops::Deref for TransactionGuard<'_> {
    type Target = Transaction<'static, Postgres>;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref().expect("transaction present while guard is held")
    }
}

impl std::ops::DerefMut for TransactionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut().expect("transaction present while guard is held")
    }
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool, publisher: Arc<dyn DomainEventPublisher>) -> Self {
        Self {
            pool,
            transaction: Mutex::new(None),
            events: Mutex::new(Vec::new()),
            publisher,
        }
    }

    /// Pool for reads, which never see uncommitted writes.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The open transaction, begun on first use.
    ///
    /// The guard must be dropped before the next repository call of the same
    /// request, otherwise that call waits on it.
    pub async fn transaction(&self) -> Result<TransactionGuard<'_>, AppError> {
        let mut slot = self.transaction.lock().await;
        if slot.is_none() {
            let tx = self.pool.begin().await?;
            tracing::debug!("Database transaction started");
            *slot = Some(tx);
        }

        if slot.is_none() {
            return Err(AppError::Internal("Transaction is not available".to_string()));
        }
        Ok(TransactionGuard(slot))
    }

    /// Queue events to publish once the current transaction commits.
    pub async fn record_events(&self, events: &[DomainEvent]) {
        if events.is_empty() {
            return;
        }
        self.events.lock().await.extend_from_slice(events);
    }

    async fn publish_pending(&self) {
        let events = std::mem::take(&mut *self.events.lock().await);
        for event in &events {
            if let Err(e) = self.publisher.publish(event).await {
                tracing::error!(
                    error = %e,
                    event = event.name(),
                    "Failed to publish domain event after commit"
                );
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(&self, cancel: &CancellationToken) -> Result<(), AppError> {
        // Cancellation is honored only before COMMIT is sent; the caller's
        // rollback discards the open transaction.
        if let Err(e) = ensure_not_cancelled(cancel) {
            self.events.lock().await.clear();
            return Err(e);
        }

        let tx = self.transaction.lock().await.take();
        if let Some(tx) = tx {
            if let Err(e) = tx.commit().await {
                tracing::error!(error = %e, "Failed to commit database transaction");
                self.events.lock().await.clear();
                return Err(e.into());
            }
            tracing::debug!("Database transaction committed");
        }

        self.publish_pending().await;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), AppError> {
        self.events.lock().await.clear();
        let tx = self.transaction.lock().await.take();
        if let Some(tx) = tx {
            tx.rollback().await?;
            tracing::debug!("Database transaction rolled back");
        }
        Ok(())
    }
}
